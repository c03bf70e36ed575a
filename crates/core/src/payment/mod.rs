//! Payment domain: statuses, gateway webhook verification, and the status
//! mapping from gateway vocabulary to ours.
//!
//! Gateway HTTP calls live in the database layer's orchestrators; this
//! module is pure so the signature schemes and mappings stay unit-testable.

mod error;
mod types;
mod webhook;

pub use error::PaymentError;
pub use types::{
    CardWebhookEvent, CryptoPaymentStatus, PaymentMethod, PaymentStatus, PaymentType,
};
pub use webhook::{
    CARD_SIGNATURE_TOLERANCE_SECS, card_signature_header, verify_card_signature,
    verify_crypto_signature,
};
