//! Reference number generation.
//!
//! Application numbers, payment references, document numbers, and account
//! numbers all share the `{PREFIX}-{random A-Z0-9}` shape. Each value is
//! assigned exactly once, at first save, and never reused.

use rand::Rng;

const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a reference like `FA-7K2M9QX1`.
#[must_use]
pub fn generate_reference(prefix: &str, length: usize) -> String {
    let mut rng = rand::rng();
    let random_part: String = (0..length)
        .map(|_| {
            let idx = rng.random_range(0..REFERENCE_CHARSET.len());
            REFERENCE_CHARSET[idx] as char
        })
        .collect();
    format!("{prefix}-{random_part}")
}

/// Generates a document number like `CRT-4B8Q1ZM2KX`.
#[must_use]
pub fn generate_document_number(prefix: &str) -> String {
    generate_reference(prefix, 10)
}

/// Generates an account number like `NDF3F9A12C04BE6` (no dash, 12 hex chars).
#[must_use]
pub fn generate_account_number() -> String {
    let mut rng = rand::rng();
    let hex: String = (0..12)
        .map(|_| {
            let idx = rng.random_range(0..16);
            char::from_digit(idx, 16)
                .unwrap_or('0')
                .to_ascii_uppercase()
        })
        .collect();
    format!("NDF{hex}")
}

/// Formats a sequential client id like `NDF-000042`.
#[must_use]
pub fn format_client_id(seq: u64) -> String {
    format!("NDF-{seq:06}")
}

/// Parses the sequence out of a client id produced by [`format_client_id`].
#[must_use]
pub fn parse_client_id(client_id: &str) -> Option<u64> {
    client_id.strip_prefix("NDF-")?.parse().ok()
}

/// Next sequence after the highest issued client id.
///
/// Counting rows would reuse ids after a deletion; advancing past the
/// last issued id never does.
#[must_use]
pub fn next_client_seq(last_issued: Option<&str>) -> u64 {
    last_issued.and_then(parse_client_id).map_or(1, |n| n + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_shape() {
        let r = generate_reference("FA", 8);
        assert!(r.starts_with("FA-"));
        assert_eq!(r.len(), 11);
        assert!(r[3..].bytes().all(|b| REFERENCE_CHARSET.contains(&b)));
    }

    #[test]
    fn test_document_number_shape() {
        let n = generate_document_number("CRT");
        assert!(n.starts_with("CRT-"));
        assert_eq!(n.len(), 14);
    }

    #[test]
    fn test_account_number_shape() {
        let n = generate_account_number();
        assert!(n.starts_with("NDF"));
        assert_eq!(n.len(), 15);
        assert!(n[3..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_client_id_round_trip() {
        assert_eq!(format_client_id(42), "NDF-000042");
        assert_eq!(parse_client_id("NDF-000042"), Some(42));
        assert_eq!(parse_client_id("XYZ-000042"), None);
        assert_eq!(parse_client_id("NDF-abc"), None);
    }

    #[test]
    fn test_next_client_seq_advances_past_last_issued() {
        assert_eq!(next_client_seq(None), 1);
        assert_eq!(next_client_seq(Some("NDF-000041")), 42);
        // Ids outside the client format never feed the sequence.
        assert_eq!(next_client_seq(Some("NF-ADMIN")), 1);
    }

    #[test]
    fn test_references_are_not_repeated() {
        // Not a proof, but two collisions in a row would be alarming.
        let a = generate_reference("PAY", 8);
        let b = generate_reference("PAY", 8);
        assert_ne!(a, b);
    }
}
