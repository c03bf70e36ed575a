//! Payment domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created; checkout not yet completed.
    Pending,
    /// The gateway is processing (crypto confirmations in flight).
    Processing,
    /// Settled; the payment has been applied.
    Completed,
    /// The gateway reported failure or expiry.
    Failed,
    /// Refunded by an admin through the gateway.
    Refunded,
    /// Cancelled before completion.
    Cancelled,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the payment can still change state.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a payment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// The one-time application fee.
    Fee,
    /// An installment repayment.
    Installment,
}

impl PaymentType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fee => "fee",
            Self::Installment => "installment",
        }
    }

    /// Parses a type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fee" => Some(Self::Fee),
            "installment" => Some(Self::Installment),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a payment is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card checkout through the card gateway.
    Card,
    /// Cryptocurrency through the crypto gateway.
    Crypto,
}

impl PaymentMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Crypto => "crypto",
        }
    }

    /// Parses a method from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(Self::Card),
            "crypto" => Some(Self::Crypto),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Card gateway webhook event types we act on.
///
/// Unknown event types are acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardWebhookEvent {
    /// Checkout session completed; the payment settles.
    CheckoutCompleted,
    /// Payment intent succeeded (idempotent confirmation).
    PaymentSucceeded,
    /// Payment intent failed.
    PaymentFailed,
}

impl CardWebhookEvent {
    /// Parses a gateway event type string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checkout.session.completed" => Some(Self::CheckoutCompleted),
            "payment_intent.succeeded" => Some(Self::PaymentSucceeded),
            "payment_intent.payment_failed" => Some(Self::PaymentFailed),
            _ => None,
        }
    }
}

/// Payment status vocabulary of the crypto gateway's IPN callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoPaymentStatus {
    /// Waiting for the customer to send funds.
    Waiting,
    /// On-chain confirmations in progress.
    Confirming,
    /// Funds being forwarded to the merchant.
    Sending,
    /// Settled.
    Finished,
    /// Failed at the gateway.
    Failed,
    /// The payment window expired.
    Expired,
}

impl CryptoPaymentStatus {
    /// Parses a gateway status string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "confirming" => Some(Self::Confirming),
            "sending" => Some(Self::Sending),
            "finished" => Some(Self::Finished),
            "failed" => Some(Self::Failed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Maps the gateway status onto our payment status.
    #[must_use]
    pub const fn to_payment_status(self) -> PaymentStatus {
        match self {
            Self::Waiting | Self::Confirming | Self::Sending => PaymentStatus::Processing,
            Self::Finished => PaymentStatus::Completed,
            Self::Failed | Self::Expired => PaymentStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_round_trip() {
        for s in [
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
            PaymentStatus::Cancelled,
        ] {
            assert_eq!(PaymentStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(PaymentStatus::Pending.is_open());
        assert!(PaymentStatus::Processing.is_open());
        assert!(!PaymentStatus::Completed.is_open());
        assert!(!PaymentStatus::Refunded.is_open());
    }

    #[test]
    fn test_card_event_parsing() {
        assert_eq!(
            CardWebhookEvent::parse("checkout.session.completed"),
            Some(CardWebhookEvent::CheckoutCompleted)
        );
        assert_eq!(
            CardWebhookEvent::parse("payment_intent.succeeded"),
            Some(CardWebhookEvent::PaymentSucceeded)
        );
        assert_eq!(
            CardWebhookEvent::parse("payment_intent.payment_failed"),
            Some(CardWebhookEvent::PaymentFailed)
        );
        assert_eq!(CardWebhookEvent::parse("charge.refunded"), None);
    }

    #[test]
    fn test_crypto_status_mapping() {
        for (raw, expected) in [
            ("waiting", PaymentStatus::Processing),
            ("confirming", PaymentStatus::Processing),
            ("sending", PaymentStatus::Processing),
            ("finished", PaymentStatus::Completed),
            ("failed", PaymentStatus::Failed),
            ("expired", PaymentStatus::Failed),
        ] {
            let status = CryptoPaymentStatus::parse(raw).unwrap();
            assert_eq!(status.to_payment_status(), expected);
        }
        assert_eq!(CryptoPaymentStatus::parse("partially_paid"), None);
    }
}
