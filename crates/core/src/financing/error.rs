//! Financing workflow error types.

use thiserror::Error;
use uuid::Uuid;

use crate::financing::types::ApplicationStatus;
use crate::kyc::KycStatus;

/// Errors that can occur during financing workflow operations.
#[derive(Debug, Error)]
pub enum FinancingError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ApplicationStatus,
        /// The attempted target status.
        to: ApplicationStatus,
    },

    /// Submission requires an approved KYC application.
    #[error("KYC must be approved before submitting (current: {0})")]
    KycNotApproved(KycStatus),

    /// Submission requires all acknowledgment checkboxes.
    #[error("All acknowledgments must be given before submitting")]
    AcknowledgmentsRequired,

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Financial terms cannot change once the application leaves draft.
    #[error("Financial terms are locked in {0} status")]
    TermsLocked(ApplicationStatus),

    /// The requested amount is not positive.
    #[error("Financing amount must be positive")]
    InvalidAmount,

    /// The repayment period is out of range.
    #[error("Repayment period must be between 1 and {max} months")]
    InvalidPeriod {
        /// Maximum allowed period.
        max: u32,
    },

    /// The fee percentage is negative or above 100.
    #[error("Fee percentage must be between 0 and 100")]
    InvalidFeePercentage,

    /// Application not found.
    #[error("Financing application {0} not found")]
    ApplicationNotFound(Uuid),

    /// Installment not found.
    #[error("Installment {0} not found")]
    InstallmentNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl FinancingError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount | Self::InvalidPeriod { .. } | Self::InvalidFeePercentage => 400,
            Self::InvalidTransition { .. }
            | Self::AcknowledgmentsRequired
            | Self::RejectionReasonRequired
            | Self::TermsLocked(_) => 422,
            Self::KycNotApproved(_) => 403,
            Self::ApplicationNotFound(_) | Self::InstallmentNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::KycNotApproved(_) => "KYC_NOT_APPROVED",
            Self::AcknowledgmentsRequired => "ACKNOWLEDGMENTS_REQUIRED",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::TermsLocked(_) => "TERMS_LOCKED",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::InvalidFeePercentage => "INVALID_FEE_PERCENTAGE",
            Self::ApplicationNotFound(_) => "APPLICATION_NOT_FOUND",
            Self::InstallmentNotFound(_) => "INSTALLMENT_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = FinancingError::InvalidTransition {
            from: ApplicationStatus::Draft,
            to: ApplicationStatus::Active,
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("draft"));
        assert!(err.to_string().contains("active"));
    }

    #[test]
    fn test_kyc_not_approved_is_forbidden() {
        let err = FinancingError::KycNotApproved(KycStatus::Submitted);
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "KYC_NOT_APPROVED");
    }

    #[test]
    fn test_not_found_errors() {
        assert_eq!(
            FinancingError::ApplicationNotFound(Uuid::nil()).status_code(),
            404
        );
        assert_eq!(
            FinancingError::InstallmentNotFound(Uuid::nil()).status_code(),
            404
        );
    }
}
