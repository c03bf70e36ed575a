//! Electronic signature requests.
//!
//! When an application's fee is confirmed, one signature request is created
//! per generated document. Requests expire seven days after creation; expiry
//! is checked lazily at signing time and swept by the background jobs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// How long a signature request stays open.
pub const SIGNATURE_EXPIRY_DAYS: i64 = 7;

/// Status of a signature request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureRequestStatus {
    /// Awaiting the client's signature.
    Pending,
    /// Signed; consent evidence recorded.
    Signed,
    /// The signing window lapsed.
    Expired,
    /// Cancelled alongside its application.
    Cancelled,
}

impl SignatureRequestStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Signed => "signed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "signed" => Some(Self::Signed),
            "expired" => Some(Self::Expired),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for SignatureRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Consent evidence captured at signing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentEvidence {
    /// The consent text shown to the signer.
    pub consent_text: String,
    /// Client IP address at signing time.
    pub ip_address: String,
    /// Browser user agent at signing time.
    pub user_agent: String,
}

/// Errors that can occur during signature operations.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The request is not pending.
    #[error("Signature request is {0}, not pending")]
    NotPending(SignatureRequestStatus),

    /// The signing window has lapsed.
    #[error("Signature request expired at {0}")]
    Expired(DateTime<Utc>),

    /// Consent text is required.
    #[error("Consent confirmation is required")]
    ConsentRequired,

    /// The signer does not own the request.
    #[error("Signature request belongs to another user")]
    NotOwner,

    /// Signature request not found.
    #[error("Signature request {0} not found")]
    RequestNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SignatureError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotPending(_) | Self::Expired(_) => 422,
            Self::ConsentRequired => 400,
            Self::NotOwner => 403,
            Self::RequestNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotPending(_) => "REQUEST_NOT_PENDING",
            Self::Expired(_) => "REQUEST_EXPIRED",
            Self::ConsentRequired => "CONSENT_REQUIRED",
            Self::NotOwner => "NOT_OWNER",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

/// Computes the expiry timestamp for a request created now.
#[must_use]
pub fn expiry_from(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(SIGNATURE_EXPIRY_DAYS)
}

/// Validates that a pending request can be signed right now.
///
/// Expiry is evaluated lazily here; a request past its window fails even if
/// the background sweep has not flipped its status yet.
///
/// # Errors
///
/// Returns an error if the signer does not own the request, the request is
/// not pending or has expired, or the consent text is blank.
pub fn check_signable(
    status: SignatureRequestStatus,
    expires_at: DateTime<Utc>,
    owner: Uuid,
    signer: Uuid,
    consent_text: &str,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    if owner != signer {
        return Err(SignatureError::NotOwner);
    }
    if status != SignatureRequestStatus::Pending {
        return Err(SignatureError::NotPending(status));
    }
    if now >= expires_at {
        return Err(SignatureError::Expired(expires_at));
    }
    if consent_text.trim().is_empty() {
        return Err(SignatureError::ConsentRequired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_expiry_is_seven_days() {
        let expires = expiry_from(now());
        assert_eq!(expires - now(), Duration::days(7));
    }

    #[test]
    fn test_signable_happy_path() {
        let user = Uuid::new_v4();
        let result = check_signable(
            SignatureRequestStatus::Pending,
            expiry_from(now()),
            user,
            user,
            "I agree to sign electronically",
            now(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_cannot_sign_someone_elses_request() {
        let result = check_signable(
            SignatureRequestStatus::Pending,
            expiry_from(now()),
            Uuid::new_v4(),
            Uuid::new_v4(),
            "I agree",
            now(),
        );
        assert!(matches!(result, Err(SignatureError::NotOwner)));
    }

    #[test]
    fn test_cannot_sign_non_pending_request() {
        let user = Uuid::new_v4();
        for status in [
            SignatureRequestStatus::Signed,
            SignatureRequestStatus::Expired,
            SignatureRequestStatus::Cancelled,
        ] {
            let result = check_signable(
                status,
                expiry_from(now()),
                user,
                user,
                "I agree",
                now(),
            );
            assert!(matches!(result, Err(SignatureError::NotPending(_))));
        }
    }

    #[test]
    fn test_lazy_expiry_check() {
        let user = Uuid::new_v4();
        let expires = expiry_from(now());
        // Status still pending in storage, but the window has lapsed.
        let result = check_signable(
            SignatureRequestStatus::Pending,
            expires,
            user,
            user,
            "I agree",
            expires + Duration::seconds(1),
        );
        assert!(matches!(result, Err(SignatureError::Expired(_))));
    }

    #[test]
    fn test_consent_required() {
        let user = Uuid::new_v4();
        let result = check_signable(
            SignatureRequestStatus::Pending,
            expiry_from(now()),
            user,
            user,
            "   ",
            now(),
        );
        assert!(matches!(result, Err(SignatureError::ConsentRequired)));
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            SignatureRequestStatus::Pending,
            SignatureRequestStatus::Signed,
            SignatureRequestStatus::Expired,
            SignatureRequestStatus::Cancelled,
        ] {
            assert_eq!(SignatureRequestStatus::parse(s.as_str()), Some(s));
        }
    }
}
