//! Financing domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a financing application.
///
/// Applications progress through these states from draft to completion:
/// - draft → pending_fee (user submit, requires approved KYC)
/// - pending_fee → fee_paid (confirmed fee payment webhook)
/// - fee_paid → pending_signature (signing requests created)
/// - pending_signature → signed (last outstanding request signed)
/// - signed → under_review (optional admin staging)
/// - signed/under_review → approved → active (approval auto-activates)
/// - signed/under_review → rejected (admin, reason required)
/// - active → completed (every installment paid)
/// - any non-terminal → cancelled (administrative override)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Application is being drafted and can still be edited.
    Draft,
    /// Submitted; waiting for the one-time fee payment.
    PendingFee,
    /// Fee confirmed by the payment gateway.
    FeePaid,
    /// Contract and certificate are out for signature.
    PendingSignature,
    /// All signature requests signed.
    Signed,
    /// Staged for admin review.
    UnderReview,
    /// Approved by an admin; transient, auto-activates.
    Approved,
    /// Disbursed and repaying.
    Active,
    /// Every installment repaid (terminal).
    Completed,
    /// Rejected by an admin (terminal).
    Rejected,
    /// Cancelled by administrative override (terminal).
    Cancelled,
}

impl ApplicationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingFee => "pending_fee",
            Self::FeePaid => "fee_paid",
            Self::PendingSignature => "pending_signature",
            Self::Signed => "signed",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "pending_fee" => Some(Self::PendingFee),
            "fee_paid" => Some(Self::FeePaid),
            "pending_signature" => Some(Self::PendingSignature),
            "signed" => Some(Self::Signed),
            "under_review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the application can still be edited by its owner.
    ///
    /// Once an application leaves draft its financial terms are immutable.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }

    /// Returns true if an admin may approve or reject from this status.
    #[must_use]
    pub const fn is_reviewable(&self) -> bool {
        matches!(self, Self::Signed | Self::UnderReview)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// Due date is in the future.
    Upcoming,
    /// Due today.
    Due,
    /// Fully repaid.
    Paid,
    /// Partially repaid.
    PartiallyPaid,
    /// Past due date and not fully repaid.
    Overdue,
    /// Deferred to a later date by an approved client request.
    Deferred,
}

impl InstallmentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Due => "due",
            Self::Paid => "paid",
            Self::PartiallyPaid => "partially_paid",
            Self::Overdue => "overdue",
            Self::Deferred => "deferred",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(Self::Upcoming),
            "due" => Some(Self::Due),
            "paid" => Some(Self::Paid),
            "partially_paid" => Some(Self::PartiallyPaid),
            "overdue" => Some(Self::Overdue),
            "deferred" => Some(Self::Deferred),
            _ => None,
        }
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Acknowledgment checkboxes required before submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgments {
    /// Platform terms accepted.
    pub terms: bool,
    /// The one-time fee is non-refundable.
    pub fee_non_refundable: bool,
    /// Repayment schedule reviewed.
    pub repayment_schedule: bool,
    /// Risk disclosure reviewed.
    pub risk_disclosure: bool,
}

impl Acknowledgments {
    /// Returns true if every acknowledgment has been given.
    #[must_use]
    pub const fn all_given(&self) -> bool {
        self.terms && self.fee_non_refundable && self.repayment_schedule && self.risk_disclosure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            ApplicationStatus::Draft,
            ApplicationStatus::PendingFee,
            ApplicationStatus::FeePaid,
            ApplicationStatus::PendingSignature,
            ApplicationStatus::Signed,
            ApplicationStatus::UnderReview,
            ApplicationStatus::Approved,
            ApplicationStatus::Active,
            ApplicationStatus::Completed,
            ApplicationStatus::Rejected,
            ApplicationStatus::Cancelled,
        ] {
            assert_eq!(ApplicationStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(ApplicationStatus::parse("nonsense"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ApplicationStatus::Completed.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(ApplicationStatus::Cancelled.is_terminal());
        assert!(!ApplicationStatus::Active.is_terminal());
        assert!(!ApplicationStatus::Draft.is_terminal());
    }

    #[test]
    fn test_only_draft_is_editable() {
        assert!(ApplicationStatus::Draft.is_editable());
        assert!(!ApplicationStatus::PendingFee.is_editable());
        assert!(!ApplicationStatus::Active.is_editable());
    }

    #[test]
    fn test_installment_status_round_trip() {
        for s in [
            InstallmentStatus::Upcoming,
            InstallmentStatus::Due,
            InstallmentStatus::Paid,
            InstallmentStatus::PartiallyPaid,
            InstallmentStatus::Overdue,
            InstallmentStatus::Deferred,
        ] {
            assert_eq!(InstallmentStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_acknowledgments_all_given() {
        let all = Acknowledgments {
            terms: true,
            fee_non_refundable: true,
            repayment_schedule: true,
            risk_disclosure: true,
        };
        assert!(all.all_given());
        assert!(!Acknowledgments::default().all_given());
        assert!(
            !Acknowledgments {
                risk_disclosure: false,
                ..all
            }
            .all_given()
        );
    }
}
