//! Financing application state machine.
//!
//! Guard functions validate a transition against the current status and the
//! relevant preconditions, then return the `ApplicationAction` the database
//! layer applies inside a transaction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::financing::error::FinancingError;
use crate::financing::types::{Acknowledgments, ApplicationStatus};
use crate::kyc::KycStatus;

/// A validated workflow action, carrying the new status and audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationAction {
    /// Submit a draft; the fee becomes payable.
    Submit {
        /// Always `PendingFee`.
        new_status: ApplicationStatus,
        /// When the application was submitted.
        submitted_at: DateTime<Utc>,
    },
    /// Record the confirmed fee payment.
    ConfirmFee {
        /// Always `FeePaid`.
        new_status: ApplicationStatus,
        /// When the gateway confirmed the fee.
        fee_paid_at: DateTime<Utc>,
    },
    /// Put the contract and certificate out for signature.
    BeginSigning {
        /// Always `PendingSignature`.
        new_status: ApplicationStatus,
    },
    /// The last outstanding signature request was signed.
    CompleteSigning {
        /// Always `Signed`.
        new_status: ApplicationStatus,
        /// When signing completed.
        signed_at: DateTime<Utc>,
    },
    /// Stage a signed application for admin review.
    StartReview {
        /// Always `UnderReview`.
        new_status: ApplicationStatus,
    },
    /// Approve the application; callers must immediately activate.
    Approve {
        /// Always `Approved`.
        new_status: ApplicationStatus,
        /// The reviewing admin.
        approved_by: Uuid,
        /// When the approval happened.
        approved_at: DateTime<Utc>,
    },
    /// Activate an approved application; the schedule starts now.
    Activate {
        /// Always `Active`.
        new_status: ApplicationStatus,
        /// Disbursement timestamp; installment due dates count from here.
        activated_at: DateTime<Utc>,
    },
    /// Reject the application with a reason.
    Reject {
        /// Always `Rejected`.
        new_status: ApplicationStatus,
        /// The reviewing admin.
        rejected_by: Uuid,
        /// The stated reason.
        rejection_reason: String,
    },
    /// Mark an active application fully repaid.
    Complete {
        /// Always `Completed`.
        new_status: ApplicationStatus,
        /// When the final installment was settled.
        completed_at: DateTime<Utc>,
    },
    /// Administrative cancellation of any non-terminal application.
    Cancel {
        /// Always `Cancelled`.
        new_status: ApplicationStatus,
        /// The admin who cancelled.
        cancelled_by: Uuid,
    },
}

impl ApplicationAction {
    /// Returns the status this action transitions to.
    #[must_use]
    pub const fn new_status(&self) -> ApplicationStatus {
        match self {
            Self::Submit { new_status, .. }
            | Self::ConfirmFee { new_status, .. }
            | Self::BeginSigning { new_status }
            | Self::CompleteSigning { new_status, .. }
            | Self::StartReview { new_status }
            | Self::Approve { new_status, .. }
            | Self::Activate { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::Complete { new_status, .. }
            | Self::Cancel { new_status, .. } => *new_status,
        }
    }
}

/// Stateless guards for the financing application lifecycle.
pub struct FinancingWorkflow;

impl FinancingWorkflow {
    /// Submit a draft application.
    ///
    /// Requires an approved KYC application and all four acknowledgments.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if not in draft, `KycNotApproved` if the
    /// applicant's KYC is not approved, or `AcknowledgmentsRequired` if any
    /// acknowledgment is missing.
    pub fn submit(
        current_status: ApplicationStatus,
        kyc_status: KycStatus,
        acknowledgments: Acknowledgments,
    ) -> Result<ApplicationAction, FinancingError> {
        if current_status != ApplicationStatus::Draft {
            return Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::PendingFee,
            });
        }
        if kyc_status != KycStatus::Approved {
            return Err(FinancingError::KycNotApproved(kyc_status));
        }
        if !acknowledgments.all_given() {
            return Err(FinancingError::AcknowledgmentsRequired);
        }
        Ok(ApplicationAction::Submit {
            new_status: ApplicationStatus::PendingFee,
            submitted_at: Utc::now(),
        })
    }

    /// Record the confirmed fee payment from a gateway webhook.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not awaiting its fee.
    pub fn confirm_fee(
        current_status: ApplicationStatus,
    ) -> Result<ApplicationAction, FinancingError> {
        match current_status {
            ApplicationStatus::PendingFee => Ok(ApplicationAction::ConfirmFee {
                new_status: ApplicationStatus::FeePaid,
                fee_paid_at: Utc::now(),
            }),
            _ => Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::FeePaid,
            }),
        }
    }

    /// Move a fee-paid application into signing.
    ///
    /// The caller creates the signature requests alongside this transition.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the fee has not been paid.
    pub fn begin_signing(
        current_status: ApplicationStatus,
    ) -> Result<ApplicationAction, FinancingError> {
        match current_status {
            ApplicationStatus::FeePaid => Ok(ApplicationAction::BeginSigning {
                new_status: ApplicationStatus::PendingSignature,
            }),
            _ => Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::PendingSignature,
            }),
        }
    }

    /// Advance to signed once the final outstanding request is signed.
    ///
    /// `remaining_pending` is the count of pending signature requests after
    /// the one just signed. The application only advances when it reaches
    /// zero; otherwise `Ok(None)` signals that nothing changes yet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not out for
    /// signature.
    pub fn complete_signing(
        current_status: ApplicationStatus,
        remaining_pending: u64,
    ) -> Result<Option<ApplicationAction>, FinancingError> {
        if current_status != ApplicationStatus::PendingSignature {
            return Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::Signed,
            });
        }
        if remaining_pending > 0 {
            return Ok(None);
        }
        Ok(Some(ApplicationAction::CompleteSigning {
            new_status: ApplicationStatus::Signed,
            signed_at: Utc::now(),
        }))
    }

    /// Stage a signed application for review.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not signed.
    pub fn start_review(
        current_status: ApplicationStatus,
    ) -> Result<ApplicationAction, FinancingError> {
        match current_status {
            ApplicationStatus::Signed => Ok(ApplicationAction::StartReview {
                new_status: ApplicationStatus::UnderReview,
            }),
            _ => Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::UnderReview,
            }),
        }
    }

    /// Approve a signed or under-review application.
    ///
    /// Approval is transient; callers activate immediately afterwards.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not reviewable.
    pub fn approve(
        current_status: ApplicationStatus,
        approved_by: Uuid,
    ) -> Result<ApplicationAction, FinancingError> {
        if !current_status.is_reviewable() {
            return Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::Approved,
            });
        }
        Ok(ApplicationAction::Approve {
            new_status: ApplicationStatus::Approved,
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Activate an approved application.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not approved.
    pub fn activate(
        current_status: ApplicationStatus,
    ) -> Result<ApplicationAction, FinancingError> {
        match current_status {
            ApplicationStatus::Approved => Ok(ApplicationAction::Activate {
                new_status: ApplicationStatus::Active,
                activated_at: Utc::now(),
            }),
            _ => Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::Active,
            }),
        }
    }

    /// Reject a signed or under-review application.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not reviewable, or
    /// `RejectionReasonRequired` if the reason is blank.
    pub fn reject(
        current_status: ApplicationStatus,
        rejected_by: Uuid,
        rejection_reason: String,
    ) -> Result<ApplicationAction, FinancingError> {
        if rejection_reason.trim().is_empty() {
            return Err(FinancingError::RejectionReasonRequired);
        }
        if !current_status.is_reviewable() {
            return Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::Rejected,
            });
        }
        Ok(ApplicationAction::Reject {
            new_status: ApplicationStatus::Rejected,
            rejected_by,
            rejection_reason,
        })
    }

    /// Mark an active application fully repaid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not active.
    pub fn complete(
        current_status: ApplicationStatus,
    ) -> Result<ApplicationAction, FinancingError> {
        match current_status {
            ApplicationStatus::Active => Ok(ApplicationAction::Complete {
                new_status: ApplicationStatus::Completed,
                completed_at: Utc::now(),
            }),
            _ => Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::Completed,
            }),
        }
    }

    /// Cancel any non-terminal application (administrative override).
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is already terminal.
    pub fn cancel(
        current_status: ApplicationStatus,
        cancelled_by: Uuid,
    ) -> Result<ApplicationAction, FinancingError> {
        if current_status.is_terminal() {
            return Err(FinancingError::InvalidTransition {
                from: current_status,
                to: ApplicationStatus::Cancelled,
            });
        }
        Ok(ApplicationAction::Cancel {
            new_status: ApplicationStatus::Cancelled,
            cancelled_by,
        })
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Draft → PendingFee (submit)
    /// - PendingFee → FeePaid (fee webhook)
    /// - FeePaid → PendingSignature (signing requests created)
    /// - PendingSignature → Signed (last request signed)
    /// - Signed → UnderReview | Approved | Rejected
    /// - UnderReview → Approved | Rejected
    /// - Approved → Active (auto)
    /// - Active → Completed
    /// - any non-terminal → Cancelled
    #[must_use]
    pub fn is_valid_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
        if to == ApplicationStatus::Cancelled {
            return !from.is_terminal();
        }
        matches!(
            (from, to),
            (ApplicationStatus::Draft, ApplicationStatus::PendingFee)
                | (ApplicationStatus::PendingFee, ApplicationStatus::FeePaid)
                | (ApplicationStatus::FeePaid, ApplicationStatus::PendingSignature)
                | (ApplicationStatus::PendingSignature, ApplicationStatus::Signed)
                | (
                    ApplicationStatus::Signed,
                    ApplicationStatus::UnderReview
                        | ApplicationStatus::Approved
                        | ApplicationStatus::Rejected
                )
                | (
                    ApplicationStatus::UnderReview,
                    ApplicationStatus::Approved | ApplicationStatus::Rejected
                )
                | (ApplicationStatus::Approved, ApplicationStatus::Active)
                | (ApplicationStatus::Active, ApplicationStatus::Completed)
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn all_acks() -> Acknowledgments {
        Acknowledgments {
            terms: true,
            fee_non_refundable: true,
            repayment_schedule: true,
            risk_disclosure: true,
        }
    }

    #[test]
    fn test_submit_from_draft_with_approved_kyc() {
        let result = FinancingWorkflow::submit(
            ApplicationStatus::Draft,
            KycStatus::Approved,
            all_acks(),
        );
        assert_eq!(
            result.unwrap().new_status(),
            ApplicationStatus::PendingFee
        );
    }

    #[test]
    fn test_submit_without_kyc_fails() {
        let result = FinancingWorkflow::submit(
            ApplicationStatus::Draft,
            KycStatus::Submitted,
            all_acks(),
        );
        assert!(matches!(result, Err(FinancingError::KycNotApproved(_))));
    }

    #[test]
    fn test_submit_missing_acknowledgment_fails() {
        let result = FinancingWorkflow::submit(
            ApplicationStatus::Draft,
            KycStatus::Approved,
            Acknowledgments {
                risk_disclosure: false,
                ..all_acks()
            },
        );
        assert!(matches!(
            result,
            Err(FinancingError::AcknowledgmentsRequired)
        ));
    }

    #[test]
    fn test_submit_from_non_draft_fails() {
        let result = FinancingWorkflow::submit(
            ApplicationStatus::Active,
            KycStatus::Approved,
            all_acks(),
        );
        assert!(matches!(
            result,
            Err(FinancingError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_confirm_fee_only_from_pending_fee() {
        assert_eq!(
            FinancingWorkflow::confirm_fee(ApplicationStatus::PendingFee)
                .unwrap()
                .new_status(),
            ApplicationStatus::FeePaid
        );
        assert!(FinancingWorkflow::confirm_fee(ApplicationStatus::Draft).is_err());
        // Replayed webhook after the fee is already recorded
        assert!(FinancingWorkflow::confirm_fee(ApplicationStatus::FeePaid).is_err());
    }

    #[test]
    fn test_begin_signing_from_fee_paid() {
        assert_eq!(
            FinancingWorkflow::begin_signing(ApplicationStatus::FeePaid)
                .unwrap()
                .new_status(),
            ApplicationStatus::PendingSignature
        );
        assert!(FinancingWorkflow::begin_signing(ApplicationStatus::PendingFee).is_err());
    }

    #[test]
    fn test_complete_signing_waits_for_all_requests() {
        let held = FinancingWorkflow::complete_signing(ApplicationStatus::PendingSignature, 1);
        assert_eq!(held.unwrap(), None);

        let done = FinancingWorkflow::complete_signing(ApplicationStatus::PendingSignature, 0);
        assert_eq!(
            done.unwrap().unwrap().new_status(),
            ApplicationStatus::Signed
        );
    }

    #[test]
    fn test_complete_signing_from_wrong_status_fails() {
        assert!(FinancingWorkflow::complete_signing(ApplicationStatus::Signed, 0).is_err());
    }

    #[test]
    fn test_approve_from_signed_and_under_review() {
        let admin = Uuid::new_v4();
        assert!(FinancingWorkflow::approve(ApplicationStatus::Signed, admin).is_ok());
        assert!(FinancingWorkflow::approve(ApplicationStatus::UnderReview, admin).is_ok());
        assert!(FinancingWorkflow::approve(ApplicationStatus::Draft, admin).is_err());
    }

    #[test]
    fn test_activate_only_from_approved() {
        assert_eq!(
            FinancingWorkflow::activate(ApplicationStatus::Approved)
                .unwrap()
                .new_status(),
            ApplicationStatus::Active
        );
        assert!(FinancingWorkflow::activate(ApplicationStatus::Signed).is_err());
    }

    #[test]
    fn test_reject_requires_reason() {
        let admin = Uuid::new_v4();
        let result =
            FinancingWorkflow::reject(ApplicationStatus::Signed, admin, "  ".to_string());
        assert!(matches!(
            result,
            Err(FinancingError::RejectionReasonRequired)
        ));

        let result = FinancingWorkflow::reject(
            ApplicationStatus::UnderReview,
            admin,
            "Insufficient income evidence".to_string(),
        );
        assert_eq!(result.unwrap().new_status(), ApplicationStatus::Rejected);
    }

    #[test]
    fn test_complete_only_from_active() {
        assert!(FinancingWorkflow::complete(ApplicationStatus::Active).is_ok());
        assert!(FinancingWorkflow::complete(ApplicationStatus::Signed).is_err());
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        let admin = Uuid::new_v4();
        for status in [
            ApplicationStatus::Draft,
            ApplicationStatus::PendingFee,
            ApplicationStatus::PendingSignature,
            ApplicationStatus::Active,
        ] {
            assert!(FinancingWorkflow::cancel(status, admin).is_ok());
        }
        for status in [
            ApplicationStatus::Completed,
            ApplicationStatus::Rejected,
            ApplicationStatus::Cancelled,
        ] {
            assert!(FinancingWorkflow::cancel(status, admin).is_err());
        }
    }

    #[rstest]
    #[case(ApplicationStatus::Signed, true)]
    #[case(ApplicationStatus::UnderReview, true)]
    #[case(ApplicationStatus::Draft, false)]
    #[case(ApplicationStatus::PendingFee, false)]
    #[case(ApplicationStatus::Active, false)]
    #[case(ApplicationStatus::Rejected, false)]
    fn test_approve_transition_table(#[case] from: ApplicationStatus, #[case] allowed: bool) {
        assert_eq!(
            FinancingWorkflow::approve(from, Uuid::new_v4()).is_ok(),
            allowed
        );
    }

    #[test]
    fn test_is_valid_transition() {
        assert!(FinancingWorkflow::is_valid_transition(
            ApplicationStatus::Draft,
            ApplicationStatus::PendingFee
        ));
        assert!(FinancingWorkflow::is_valid_transition(
            ApplicationStatus::Signed,
            ApplicationStatus::Approved
        ));
        assert!(FinancingWorkflow::is_valid_transition(
            ApplicationStatus::Active,
            ApplicationStatus::Cancelled
        ));

        assert!(!FinancingWorkflow::is_valid_transition(
            ApplicationStatus::Draft,
            ApplicationStatus::Active
        ));
        assert!(!FinancingWorkflow::is_valid_transition(
            ApplicationStatus::Rejected,
            ApplicationStatus::Cancelled
        ));
        assert!(!FinancingWorkflow::is_valid_transition(
            ApplicationStatus::Completed,
            ApplicationStatus::Active
        ));
    }
}
