//! Webhook signature verification for both gateways.
//!
//! Card gateway: header `t=<unix_ts>,v1=<hex>` where the signature is
//! HMAC-SHA256 over `"{timestamp}.{raw_body}"`, rejected outside a five
//! minute tolerance window.
//!
//! Crypto gateway: header `x-nowpayments-sig` carrying hex HMAC-SHA512 over
//! the request JSON re-serialized with sorted keys and no whitespace.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};

use crate::payment::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Maximum accepted age (and future skew) of a card webhook signature.
pub const CARD_SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verifies a card gateway webhook signature header.
///
/// # Errors
///
/// Returns `InvalidSignature` for malformed headers, stale timestamps, or
/// digest mismatches.
pub fn verify_card_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now_unix: i64,
) -> Result<(), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<Vec<u8>> = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signature = hex::decode(value).ok(),
            _ => {}
        }
    }
    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(PaymentError::InvalidSignature);
    };

    if (now_unix - timestamp).abs() > CARD_SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::InvalidSignature);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.verify_slice(&signature)
        .map_err(|_| PaymentError::InvalidSignature)
}

/// Computes a card gateway signature header for a payload.
///
/// Used by tests and the local gateway simulator.
///
/// # Errors
///
/// Returns `InvalidSignature` if the secret is unusable as an HMAC key.
pub fn card_signature_header(
    payload: &[u8],
    secret: &str,
    timestamp: i64,
) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},v1={digest}"))
}

/// Verifies a crypto gateway IPN signature.
///
/// The gateway signs the JSON body re-serialized with its keys sorted, so
/// the raw body is parsed and re-serialized before computing the digest.
/// `serde_json` maps preserve sorted order, which matches the gateway's
/// canonical form.
///
/// # Errors
///
/// Returns `InvalidSignature` for non-JSON payloads, non-hex headers, or
/// digest mismatches.
pub fn verify_crypto_signature(
    payload: &[u8],
    signature_hex: &str,
    ipn_secret: &str,
) -> Result<(), PaymentError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|_| PaymentError::InvalidSignature)?;
    let canonical =
        serde_json::to_vec(&value).map_err(|_| PaymentError::InvalidSignature)?;

    let signature = hex::decode(signature_hex).map_err(|_| PaymentError::InvalidSignature)?;

    let mut mac = HmacSha512::new_from_slice(ipn_secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(&canonical);
    mac.verify_slice(&signature)
        .map_err(|_| PaymentError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    #[test]
    fn test_card_signature_round_trip() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = card_signature_header(payload, SECRET, 1_700_000_000).unwrap();
        assert!(verify_card_signature(payload, &header, SECRET, 1_700_000_100).is_ok());
    }

    #[test]
    fn test_card_signature_stale_timestamp() {
        let payload = b"{}";
        let header = card_signature_header(payload, SECRET, 1_700_000_000).unwrap();
        let result = verify_card_signature(payload, &header, SECRET, 1_700_000_301);
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));
    }

    #[test]
    fn test_card_signature_wrong_secret() {
        let payload = b"{}";
        let header = card_signature_header(payload, SECRET, 1_700_000_000).unwrap();
        let result = verify_card_signature(payload, &header, "other_secret", 1_700_000_000);
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));
    }

    #[test]
    fn test_card_signature_tampered_payload() {
        let header = card_signature_header(b"{\"a\":1}", SECRET, 1_700_000_000).unwrap();
        let result = verify_card_signature(b"{\"a\":2}", &header, SECRET, 1_700_000_000);
        assert!(matches!(result, Err(PaymentError::InvalidSignature)));
    }

    #[test]
    fn test_card_signature_malformed_header() {
        for header in ["", "t=abc,v1=00", "v1=00", "t=1700000000"] {
            let result = verify_card_signature(b"{}", header, SECRET, 1_700_000_000);
            assert!(matches!(result, Err(PaymentError::InvalidSignature)));
        }
    }

    fn crypto_sign(payload: &[u8], secret: &str) -> String {
        let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
        let canonical = serde_json::to_vec(&value).unwrap();
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(&canonical);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_crypto_signature_valid() {
        let payload = br#"{"payment_status":"finished","order_id":"PAY-ABC123"}"#;
        let sig = crypto_sign(payload, "ipn_secret");
        assert!(verify_crypto_signature(payload, &sig, "ipn_secret").is_ok());
    }

    #[test]
    fn test_crypto_signature_key_order_is_canonicalized() {
        // Same object, different key order in the raw body.
        let sent = br#"{"order_id":"PAY-ABC123","payment_status":"finished"}"#;
        let signed = br#"{"payment_status":"finished","order_id":"PAY-ABC123"}"#;
        let sig = crypto_sign(signed, "ipn_secret");
        assert!(verify_crypto_signature(sent, &sig, "ipn_secret").is_ok());
    }

    #[test]
    fn test_crypto_signature_rejections() {
        let payload = br#"{"order_id":"PAY-ABC123"}"#;
        let sig = crypto_sign(payload, "ipn_secret");

        assert!(verify_crypto_signature(payload, &sig, "wrong").is_err());
        assert!(verify_crypto_signature(payload, "not-hex!", "ipn_secret").is_err());
        assert!(verify_crypto_signature(b"not json", &sig, "ipn_secret").is_err());
    }
}
