//! Client service requests.
//!
//! Clients raise requests against their account or an active financing
//! (deferrals, early settlement, and similar). Admins review and respond;
//! the response text is what the client sees.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What the client is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRequestType {
    /// Increase the financing amount.
    LoanIncrease,
    /// Settle the outstanding balance early.
    Settlement,
    /// Transfer funds between accounts.
    Transfer,
    /// Defer an upcoming installment.
    Deferral,
}

impl ClientRequestType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LoanIncrease => "loan_increase",
            Self::Settlement => "settlement",
            Self::Transfer => "transfer",
            Self::Deferral => "deferral",
        }
    }

    /// Parses a type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "loan_increase" => Some(Self::LoanIncrease),
            "settlement" => Some(Self::Settlement),
            "transfer" => Some(Self::Transfer),
            "deferral" => Some(Self::Deferral),
            _ => None,
        }
    }
}

impl fmt::Display for ClientRequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review status of a client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRequestStatus {
    /// Awaiting admin attention.
    Pending,
    /// An admin has picked it up.
    UnderReview,
    /// Approved with a response.
    Approved,
    /// Rejected with a response.
    Rejected,
    /// Carried out after approval.
    Completed,
}

impl ClientRequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "under_review" => Some(Self::UnderReview),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Returns true if an admin may still respond.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::UnderReview)
    }
}

impl fmt::Display for ClientRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during client-request operations.
#[derive(Debug, Error)]
pub enum ClientRequestError {
    /// The request type is not recognized.
    #[error("Unknown request type: {0}")]
    UnknownType(String),

    /// The request has already been resolved.
    #[error("Request is already {0}")]
    AlreadyResolved(ClientRequestStatus),

    /// A response text is required when resolving.
    #[error("Response text is required")]
    ResponseRequired,

    /// Request not found.
    #[error("Request {0} not found")]
    RequestNotFound(uuid::Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ClientRequestError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::UnknownType(_) | Self::ResponseRequired => 400,
            Self::AlreadyResolved(_) => 422,
            Self::RequestNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownType(_) => "UNKNOWN_REQUEST_TYPE",
            Self::AlreadyResolved(_) => "REQUEST_ALREADY_RESOLVED",
            Self::ResponseRequired => "RESPONSE_REQUIRED",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Validates an admin resolution of a request.
///
/// # Errors
///
/// Returns `AlreadyResolved` if the request is closed, or
/// `ResponseRequired` if the response text is blank.
pub fn check_resolvable(
    current: ClientRequestStatus,
    response: &str,
) -> Result<(), ClientRequestError> {
    if !current.is_open() {
        return Err(ClientRequestError::AlreadyResolved(current));
    }
    if response.trim().is_empty() {
        return Err(ClientRequestError::ResponseRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_round_trip() {
        for t in [
            ClientRequestType::LoanIncrease,
            ClientRequestType::Settlement,
            ClientRequestType::Transfer,
            ClientRequestType::Deferral,
        ] {
            assert_eq!(ClientRequestType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ClientRequestType::parse("bogus"), None);
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            ClientRequestStatus::Pending,
            ClientRequestStatus::UnderReview,
            ClientRequestStatus::Approved,
            ClientRequestStatus::Rejected,
            ClientRequestStatus::Completed,
        ] {
            assert_eq!(ClientRequestStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_resolution_guard() {
        assert!(check_resolvable(ClientRequestStatus::Pending, "Approved, deferral granted").is_ok());
        assert!(check_resolvable(ClientRequestStatus::UnderReview, "ok").is_ok());
        assert!(matches!(
            check_resolvable(ClientRequestStatus::Approved, "ok"),
            Err(ClientRequestError::AlreadyResolved(_))
        ));
        assert!(matches!(
            check_resolvable(ClientRequestStatus::Pending, "  "),
            Err(ClientRequestError::ResponseRequired)
        ));
    }
}
