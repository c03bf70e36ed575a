//! Document error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The PDF backend failed.
    #[error("Failed to render PDF: {0}")]
    Render(String),

    /// Document not found.
    #[error("Document {0} not found")]
    DocumentNotFound(Uuid),

    /// No document matches the verification code.
    #[error("No document matches the given verification code")]
    VerificationFailed,

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl DocumentError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::DocumentNotFound(_) | Self::VerificationFailed => 404,
            Self::Render(_) | Self::Storage(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Render(_) => "RENDER_ERROR",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}
