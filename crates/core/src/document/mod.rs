//! Document generation and verification.
//!
//! Certificates, contracts, receipts, KYC summaries, and account statements
//! are rendered as branded PDFs. Each document carries a SHA-256 hex digest
//! of its bytes as a public verification code.

mod error;
mod pdf;
mod types;

use sha2::{Digest, Sha256};

pub use error::DocumentError;
pub use pdf::{render_pdf, render_pdf_minimal};
pub use types::{ContentLine, DocumentContent, DocumentType, SignatureBlock};

/// Generates a document number for the given type, e.g. `CRT-4B8Q1ZM2KX`.
#[must_use]
pub fn new_document_number(doc_type: DocumentType) -> String {
    novafin_shared::refs::generate_document_number(doc_type.number_prefix())
}

/// Computes the verification code for a rendered document.
#[must_use]
pub fn verification_code(pdf_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pdf_bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_code_is_sha256_hex() {
        let code = verification_code(b"%PDF-1.4 test");
        assert_eq!(code.len(), 64);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verification_code_is_content_addressed() {
        assert_eq!(verification_code(b"a"), verification_code(b"a"));
        assert_ne!(verification_code(b"a"), verification_code(b"b"));
    }

    #[test]
    fn test_document_numbers_carry_type_prefix() {
        assert!(new_document_number(DocumentType::Certificate).starts_with("CRT-"));
        assert!(new_document_number(DocumentType::Contract).starts_with("CTR-"));
        assert!(new_document_number(DocumentType::Receipt).starts_with("RCP-"));
        assert!(new_document_number(DocumentType::Statement).starts_with("DOC-"));
    }
}
