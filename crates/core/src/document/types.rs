//! Document domain types and the content model fed to the PDF renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Financing certificate.
    Certificate,
    /// Trilateral financing contract.
    Contract,
    /// Payment receipt.
    Receipt,
    /// KYC application summary.
    KycSummary,
    /// Account statement.
    Statement,
}

impl DocumentType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::Contract => "contract",
            Self::Receipt => "receipt",
            Self::KycSummary => "kyc_summary",
            Self::Statement => "statement",
        }
    }

    /// Parses a type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "certificate" => Some(Self::Certificate),
            "contract" => Some(Self::Contract),
            "receipt" => Some(Self::Receipt),
            "kyc_summary" => Some(Self::KycSummary),
            "statement" => Some(Self::Statement),
            _ => None,
        }
    }

    /// Returns the document-number prefix for this type.
    #[must_use]
    pub const fn number_prefix(&self) -> &'static str {
        match self {
            Self::Certificate => "CRT",
            Self::Contract => "CTR",
            Self::Receipt => "RCP",
            Self::KycSummary | Self::Statement => "DOC",
        }
    }

    /// Returns true if this document requires a client signature.
    #[must_use]
    pub const fn requires_signature(&self) -> bool {
        matches!(self, Self::Certificate | Self::Contract)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single line of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentLine {
    /// Bold section heading.
    Heading(String),
    /// Regular body text.
    Text(String),
    /// Horizontal divider.
    Divider,
}

/// The electronic signature block appended to signed documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// The typed full name, rendered as the signature.
    pub signature_text: String,
    /// Name of the signer.
    pub signer_name: String,
    /// When the document was signed.
    pub signed_at: DateTime<Utc>,
}

/// The renderer-agnostic content of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    /// Document title, rendered below the brand header.
    pub title: String,
    /// Body lines in order.
    pub lines: Vec<ContentLine>,
    /// Present once the document has been signed.
    pub signature: Option<SignatureBlock>,
}

impl DocumentContent {
    /// Creates unsigned content with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
            signature: None,
        }
    }

    /// Appends a heading line.
    #[must_use]
    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.lines.push(ContentLine::Heading(text.into()));
        self
    }

    /// Appends a body text line.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.lines.push(ContentLine::Text(text.into()));
        self
    }

    /// Appends a divider.
    #[must_use]
    pub fn divider(mut self) -> Self {
        self.lines.push(ContentLine::Divider);
        self
    }

    /// Attaches the signature block.
    #[must_use]
    pub fn signed(mut self, block: SignatureBlock) -> Self {
        self.signature = Some(block);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_round_trip() {
        for t in [
            DocumentType::Certificate,
            DocumentType::Contract,
            DocumentType::Receipt,
            DocumentType::KycSummary,
            DocumentType::Statement,
        ] {
            assert_eq!(DocumentType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_number_prefixes() {
        assert_eq!(DocumentType::Certificate.number_prefix(), "CRT");
        assert_eq!(DocumentType::Contract.number_prefix(), "CTR");
        assert_eq!(DocumentType::Receipt.number_prefix(), "RCP");
        assert_eq!(DocumentType::KycSummary.number_prefix(), "DOC");
    }

    #[test]
    fn test_only_certificate_and_contract_need_signing() {
        assert!(DocumentType::Certificate.requires_signature());
        assert!(DocumentType::Contract.requires_signature());
        assert!(!DocumentType::Receipt.requires_signature());
        assert!(!DocumentType::Statement.requires_signature());
    }

    #[test]
    fn test_content_builder() {
        let content = DocumentContent::new("Financing Certificate")
            .heading("Parties")
            .text("Client: Jane Doe")
            .divider()
            .text("Amount: 6000.00 USD");
        assert_eq!(content.lines.len(), 4);
        assert!(content.signature.is_none());
    }
}
