//! Payment error types.

use thiserror::Error;
use uuid::Uuid;

use crate::payment::types::PaymentStatus;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Webhook signature verification failed.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// The webhook references a payment we do not know.
    #[error("Payment not found for gateway reference {0}")]
    UnknownGatewayReference(String),

    /// Payment not found.
    #[error("Payment {0} not found")]
    PaymentNotFound(Uuid),

    /// The payment is already settled or closed.
    #[error("Payment is already {0}")]
    AlreadyClosed(PaymentStatus),

    /// The payment amount is not positive.
    #[error("Payment amount must be positive")]
    InvalidAmount,

    /// The gateway call failed.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PaymentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidSignature | Self::InvalidAmount => 400,
            Self::UnknownGatewayReference(_) | Self::PaymentNotFound(_) => 404,
            Self::AlreadyClosed(_) => 409,
            Self::Gateway(_) => 502,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::UnknownGatewayReference(_) => "UNKNOWN_GATEWAY_REFERENCE",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::AlreadyClosed(_) => "PAYMENT_ALREADY_CLOSED",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PaymentError::InvalidSignature.status_code(), 400);
        assert_eq!(
            PaymentError::AlreadyClosed(PaymentStatus::Completed).status_code(),
            409
        );
        assert_eq!(PaymentError::Gateway("timeout".into()).status_code(), 502);
    }
}
