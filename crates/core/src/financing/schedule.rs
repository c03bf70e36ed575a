//! Installment schedule generation and repayment arithmetic.
//!
//! Due dates count 30-day periods from activation. Every installment carries
//! the quantized monthly amount except the last, which absorbs the rounding
//! remainder so the schedule always sums to the principal exactly.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::financing::error::FinancingError;
use crate::financing::types::InstallmentStatus;

/// Days before a due date on which a reminder is sent.
pub const REMINDER_DAYS: [i64; 3] = [7, 3, 1];

/// A single planned installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    /// 1-based position in the schedule.
    pub sequence: u32,
    /// Amount due for this installment.
    pub amount: Decimal,
    /// Calendar due date.
    pub due_date: NaiveDate,
}

/// The outcome of applying a payment to an installment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentApplication {
    /// Total paid against the installment after this payment.
    pub amount_paid: Decimal,
    /// The installment's status after this payment.
    pub status: InstallmentStatus,
    /// True once the installment is fully settled.
    pub settled: bool,
}

/// Generates the repayment schedule for an activated application.
///
/// # Errors
///
/// Returns an error if the amount is not positive or the period is zero.
pub fn generate_schedule(
    amount: Decimal,
    period_months: u32,
    activated_at: DateTime<Utc>,
) -> Result<Vec<InstallmentPlan>, FinancingError> {
    if amount <= Decimal::ZERO {
        return Err(FinancingError::InvalidAmount);
    }
    if period_months == 0 {
        return Err(FinancingError::InvalidPeriod {
            max: super::MAX_PERIOD_MONTHS,
        });
    }

    let monthly = (amount / Decimal::from(period_months))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let start = activated_at.date_naive();

    let mut plans = Vec::with_capacity(period_months as usize);
    let mut allocated = Decimal::ZERO;
    for i in 1..=period_months {
        let installment_amount = if i == period_months {
            amount - allocated
        } else {
            monthly
        };
        allocated += installment_amount;
        plans.push(InstallmentPlan {
            sequence: i,
            amount: installment_amount,
            due_date: start + Duration::days(30 * i64::from(i)),
        });
    }
    Ok(plans)
}

/// Derives an installment's status from its due date and repayment so far.
#[must_use]
pub fn derive_installment_status(
    due_date: NaiveDate,
    amount_due: Decimal,
    amount_paid: Decimal,
    today: NaiveDate,
) -> InstallmentStatus {
    if amount_paid >= amount_due {
        return InstallmentStatus::Paid;
    }
    if today > due_date {
        return InstallmentStatus::Overdue;
    }
    if amount_paid > Decimal::ZERO {
        return InstallmentStatus::PartiallyPaid;
    }
    if today == due_date {
        return InstallmentStatus::Due;
    }
    InstallmentStatus::Upcoming
}

/// Applies a payment to an installment.
///
/// Overpayment is clamped at the amount due; the gateway never charges more
/// than the outstanding balance, so a surplus indicates a replayed webhook.
///
/// # Errors
///
/// Returns an error if the payment amount is not positive.
pub fn apply_payment(
    due_date: NaiveDate,
    amount_due: Decimal,
    amount_paid: Decimal,
    payment: Decimal,
    today: NaiveDate,
) -> Result<PaymentApplication, FinancingError> {
    if payment <= Decimal::ZERO {
        return Err(FinancingError::InvalidAmount);
    }
    let new_paid = (amount_paid + payment).min(amount_due);
    let status = derive_installment_status(due_date, amount_due, new_paid, today);
    Ok(PaymentApplication {
        amount_paid: new_paid,
        status,
        settled: new_paid >= amount_due,
    })
}

/// Recomputes the status of an unsettled installment for the daily sweep.
///
/// Returns `Some(new_status)` when the stored status is stale, `None` when
/// nothing changes. Deferred installments are left alone; their due date was
/// moved by an approved client request and the sweep must not undo that.
#[must_use]
pub fn sweep_installment_status(
    current: InstallmentStatus,
    due_date: NaiveDate,
    amount_due: Decimal,
    amount_paid: Decimal,
    today: NaiveDate,
) -> Option<InstallmentStatus> {
    if matches!(current, InstallmentStatus::Paid | InstallmentStatus::Deferred) {
        return None;
    }
    let derived = derive_installment_status(due_date, amount_due, amount_paid, today);
    (derived != current).then_some(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn activation() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_even_schedule() {
        let plans = generate_schedule(dec!(6000), 12, activation()).unwrap();
        assert_eq!(plans.len(), 12);
        assert!(plans.iter().all(|p| p.amount == dec!(500.00)));
        assert_eq!(plans[0].due_date, date(2025, 1, 31));
        assert_eq!(plans[1].due_date, date(2025, 3, 2));
        assert_eq!(plans[11].due_date, date(2025, 12, 27));
    }

    #[test]
    fn test_last_installment_absorbs_remainder() {
        let plans = generate_schedule(dec!(1000), 3, activation()).unwrap();
        assert_eq!(plans[0].amount, dec!(333.33));
        assert_eq!(plans[1].amount, dec!(333.33));
        assert_eq!(plans[2].amount, dec!(333.34));
        let total: Decimal = plans.iter().map(|p| p.amount).sum();
        assert_eq!(total, dec!(1000));
    }

    #[test]
    fn test_schedule_rejects_bad_inputs() {
        assert!(generate_schedule(Decimal::ZERO, 12, activation()).is_err());
        assert!(generate_schedule(dec!(1000), 0, activation()).is_err());
    }

    #[test]
    fn test_derive_status() {
        let due = date(2025, 6, 15);
        let amount = dec!(500);
        assert_eq!(
            derive_installment_status(due, amount, Decimal::ZERO, date(2025, 6, 1)),
            InstallmentStatus::Upcoming
        );
        assert_eq!(
            derive_installment_status(due, amount, Decimal::ZERO, due),
            InstallmentStatus::Due
        );
        assert_eq!(
            derive_installment_status(due, amount, dec!(100), date(2025, 6, 1)),
            InstallmentStatus::PartiallyPaid
        );
        assert_eq!(
            derive_installment_status(due, amount, dec!(100), date(2025, 6, 16)),
            InstallmentStatus::Overdue
        );
        assert_eq!(
            derive_installment_status(due, amount, dec!(500), date(2025, 7, 1)),
            InstallmentStatus::Paid
        );
    }

    #[test]
    fn test_apply_partial_then_final_payment() {
        let due = date(2025, 6, 15);
        let first = apply_payment(due, dec!(500), Decimal::ZERO, dec!(200), date(2025, 6, 1))
            .unwrap();
        assert_eq!(first.status, InstallmentStatus::PartiallyPaid);
        assert!(!first.settled);

        let second =
            apply_payment(due, dec!(500), first.amount_paid, dec!(300), date(2025, 6, 10))
                .unwrap();
        assert_eq!(second.status, InstallmentStatus::Paid);
        assert!(second.settled);
        assert_eq!(second.amount_paid, dec!(500));
    }

    #[test]
    fn test_overpayment_is_clamped() {
        let due = date(2025, 6, 15);
        let result =
            apply_payment(due, dec!(500), dec!(400), dec!(400), date(2025, 6, 1)).unwrap();
        assert_eq!(result.amount_paid, dec!(500));
        assert!(result.settled);
    }

    #[test]
    fn test_apply_rejects_non_positive_payment() {
        let due = date(2025, 6, 15);
        assert!(apply_payment(due, dec!(500), Decimal::ZERO, Decimal::ZERO, due).is_err());
    }

    #[test]
    fn test_sweep_marks_overdue() {
        let due = date(2025, 6, 15);
        assert_eq!(
            sweep_installment_status(
                InstallmentStatus::Upcoming,
                due,
                dec!(500),
                Decimal::ZERO,
                date(2025, 6, 16)
            ),
            Some(InstallmentStatus::Overdue)
        );
    }

    #[test]
    fn test_sweep_leaves_settled_and_deferred_alone() {
        let due = date(2025, 6, 15);
        for status in [InstallmentStatus::Paid, InstallmentStatus::Deferred] {
            assert_eq!(
                sweep_installment_status(status, due, dec!(500), dec!(500), date(2025, 7, 1)),
                None
            );
        }
    }

    #[test]
    fn test_sweep_noop_when_status_is_current() {
        let due = date(2025, 6, 15);
        assert_eq!(
            sweep_installment_status(
                InstallmentStatus::Upcoming,
                due,
                dec!(500),
                Decimal::ZERO,
                date(2025, 6, 1)
            ),
            None
        );
    }

    proptest! {
        #[test]
        fn prop_schedule_sums_to_principal(
            cents in 1i64..=100_000_000,
            months in 1u32..=120,
        ) {
            let amount = Decimal::new(cents, 2);
            let plans = generate_schedule(amount, months, activation()).unwrap();
            let total: Decimal = plans.iter().map(|p| p.amount).sum();
            prop_assert_eq!(total, amount);
            prop_assert_eq!(plans.len(), months as usize);
        }

        #[test]
        fn prop_payment_never_exceeds_due(
            due_cents in 100i64..=10_000_000,
            paid_cents in 0i64..=10_000_000,
            pay_cents in 1i64..=10_000_000,
        ) {
            let amount_due = Decimal::new(due_cents, 2);
            let amount_paid = Decimal::new(paid_cents, 2).min(amount_due);
            let payment = Decimal::new(pay_cents, 2);
            let result = apply_payment(
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                amount_due,
                amount_paid,
                payment,
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            ).unwrap();
            prop_assert!(result.amount_paid <= amount_due);
            prop_assert_eq!(result.settled, result.amount_paid == amount_due);
            if result.settled {
                prop_assert_eq!(result.status, InstallmentStatus::Paid);
            }
        }
    }
}
