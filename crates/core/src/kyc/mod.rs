//! KYC (know-your-customer) application lifecycle.
//!
//! Every client must pass KYC before a financing application can be
//! submitted. The lifecycle mirrors the financing one at a smaller scale:
//! draft → submitted → under_review → approved | rejected, with rejected
//! applications returning to draft on resubmission.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Status of a KYC application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    /// Being filled in; documents can be uploaded.
    Draft,
    /// Submitted for review.
    Submitted,
    /// An admin has picked it up.
    UnderReview,
    /// Verified; financing applications may be submitted.
    Approved,
    /// Rejected with a reason; editing reopens it as draft.
    Rejected,
}

impl KycStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "under_review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the applicant may still edit profile data and
    /// upload documents.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }

    /// Returns true if an admin may approve or reject from this status.
    #[must_use]
    pub const fn is_reviewable(&self) -> bool {
        matches!(self, Self::Submitted | Self::UnderReview)
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Types of identity and financial documents accepted for KYC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycDocumentType {
    /// Passport photo page.
    Passport,
    /// National identity card.
    NationalId,
    /// Driver's license.
    DriversLicense,
    /// Recent bank statement.
    BankStatement,
    /// Proof of address (utility bill etc.).
    AddressProof,
    /// Proof of income.
    IncomeProof,
    /// Selfie holding the identity document.
    Selfie,
}

impl KycDocumentType {
    /// Returns the string representation of the document type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "passport",
            Self::NationalId => "national_id",
            Self::DriversLicense => "drivers_license",
            Self::BankStatement => "bank_statement",
            Self::AddressProof => "address_proof",
            Self::IncomeProof => "income_proof",
            Self::Selfie => "selfie",
        }
    }

    /// Parses a document type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passport" => Some(Self::Passport),
            "national_id" => Some(Self::NationalId),
            "drivers_license" => Some(Self::DriversLicense),
            "bank_statement" => Some(Self::BankStatement),
            "address_proof" => Some(Self::AddressProof),
            "income_proof" => Some(Self::IncomeProof),
            "selfie" => Some(Self::Selfie),
            _ => None,
        }
    }
}

impl fmt::Display for KycDocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during KYC workflow operations.
#[derive(Debug, Error)]
pub enum KycError {
    /// Attempted an invalid status transition.
    #[error("Invalid KYC status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: KycStatus,
        /// The attempted target status.
        to: KycStatus,
    },

    /// Submission requires at least one uploaded document.
    #[error("At least one identity document is required before submitting")]
    DocumentsRequired,

    /// Rejection reason is required.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// The uploaded document type is not recognized.
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    /// KYC application not found.
    #[error("KYC application {0} not found")]
    ApplicationNotFound(Uuid),

    /// The uploaded file failed validation or could not be stored.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl KycError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::DocumentsRequired
            | Self::RejectionReasonRequired => 422,
            Self::UnknownDocumentType(_) => 400,
            Self::ApplicationNotFound(_) => 404,
            Self::Storage(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::DocumentsRequired => "DOCUMENTS_REQUIRED",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::UnknownDocumentType(_) => "UNKNOWN_DOCUMENT_TYPE",
            Self::ApplicationNotFound(_) => "APPLICATION_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Stateless guards for the KYC lifecycle.
pub struct KycWorkflow;

impl KycWorkflow {
    /// Submit a draft (or previously rejected) application for review.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not editable, or
    /// `DocumentsRequired` if no documents were uploaded.
    pub fn submit(current_status: KycStatus, document_count: u64) -> Result<KycStatus, KycError> {
        if !current_status.is_editable() {
            return Err(KycError::InvalidTransition {
                from: current_status,
                to: KycStatus::Submitted,
            });
        }
        if document_count == 0 {
            return Err(KycError::DocumentsRequired);
        }
        Ok(KycStatus::Submitted)
    }

    /// Move a submitted application into review.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application was not submitted.
    pub fn start_review(current_status: KycStatus) -> Result<KycStatus, KycError> {
        match current_status {
            KycStatus::Submitted => Ok(KycStatus::UnderReview),
            _ => Err(KycError::InvalidTransition {
                from: current_status,
                to: KycStatus::UnderReview,
            }),
        }
    }

    /// Approve a submitted or under-review application.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not reviewable.
    pub fn approve(current_status: KycStatus) -> Result<KycStatus, KycError> {
        if !current_status.is_reviewable() {
            return Err(KycError::InvalidTransition {
                from: current_status,
                to: KycStatus::Approved,
            });
        }
        Ok(KycStatus::Approved)
    }

    /// Reject a submitted or under-review application with a reason.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the application is not reviewable, or
    /// `RejectionReasonRequired` if the reason is blank.
    pub fn reject(current_status: KycStatus, reason: &str) -> Result<KycStatus, KycError> {
        if reason.trim().is_empty() {
            return Err(KycError::RejectionReasonRequired);
        }
        if !current_status.is_reviewable() {
            return Err(KycError::InvalidTransition {
                from: current_status,
                to: KycStatus::Rejected,
            });
        }
        Ok(KycStatus::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            KycStatus::Draft,
            KycStatus::Submitted,
            KycStatus::UnderReview,
            KycStatus::Approved,
            KycStatus::Rejected,
        ] {
            assert_eq!(KycStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(KycStatus::parse("bogus"), None);
    }

    #[test]
    fn test_document_type_round_trip() {
        for t in [
            KycDocumentType::Passport,
            KycDocumentType::NationalId,
            KycDocumentType::DriversLicense,
            KycDocumentType::BankStatement,
            KycDocumentType::AddressProof,
            KycDocumentType::IncomeProof,
            KycDocumentType::Selfie,
        ] {
            assert_eq!(KycDocumentType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_submit_requires_documents() {
        assert!(matches!(
            KycWorkflow::submit(KycStatus::Draft, 0),
            Err(KycError::DocumentsRequired)
        ));
        assert_eq!(
            KycWorkflow::submit(KycStatus::Draft, 2).unwrap(),
            KycStatus::Submitted
        );
    }

    #[test]
    fn test_rejected_application_can_resubmit() {
        assert_eq!(
            KycWorkflow::submit(KycStatus::Rejected, 1).unwrap(),
            KycStatus::Submitted
        );
    }

    #[test]
    fn test_submit_from_approved_fails() {
        assert!(matches!(
            KycWorkflow::submit(KycStatus::Approved, 3),
            Err(KycError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_review_path() {
        assert_eq!(
            KycWorkflow::start_review(KycStatus::Submitted).unwrap(),
            KycStatus::UnderReview
        );
        assert_eq!(
            KycWorkflow::approve(KycStatus::UnderReview).unwrap(),
            KycStatus::Approved
        );
        assert_eq!(
            KycWorkflow::approve(KycStatus::Submitted).unwrap(),
            KycStatus::Approved
        );
        assert!(KycWorkflow::approve(KycStatus::Draft).is_err());
    }

    #[test]
    fn test_reject_requires_reason() {
        assert!(matches!(
            KycWorkflow::reject(KycStatus::Submitted, " "),
            Err(KycError::RejectionReasonRequired)
        ));
        assert_eq!(
            KycWorkflow::reject(KycStatus::UnderReview, "ID photo unreadable").unwrap(),
            KycStatus::Rejected
        );
    }

    #[test]
    fn test_unknown_application_maps_to_not_found() {
        let e = KycError::ApplicationNotFound(Uuid::new_v4());
        assert_eq!(e.status_code(), 404);
        assert_eq!(e.error_code(), "APPLICATION_NOT_FOUND");
    }
}
