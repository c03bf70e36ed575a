//! Financing domain: application lifecycle, fee calculator, and the
//! installment schedule.
//!
//! The status machines in this module are the only non-trivial invariants in
//! the platform. Pure guard functions validate a transition and return the
//! action to apply; the database layer executes the action inside a
//! transaction with a read-check-write pattern.

mod calculator;
mod error;
mod schedule;
mod types;
mod workflow;

pub use calculator::{FinancingQuote, MAX_PERIOD_MONTHS, calculate_quote};
pub use error::FinancingError;
pub use schedule::{
    InstallmentPlan, PaymentApplication, REMINDER_DAYS, apply_payment, derive_installment_status,
    generate_schedule, sweep_installment_status,
};
pub use types::{Acknowledgments, ApplicationStatus, InstallmentStatus};
pub use workflow::{ApplicationAction, FinancingWorkflow};
