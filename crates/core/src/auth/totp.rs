//! TOTP-based multi-factor authentication.
//!
//! Secrets are stored base32-encoded on the user record; the code window is
//! the standard 30 seconds with one step of skew either side.

use thiserror::Error;
use totp_rs::{Algorithm, Secret, TOTP};

const ISSUER: &str = "Novafin";

/// Errors that can occur during MFA operations.
#[derive(Debug, Error)]
pub enum MfaError {
    /// The stored secret is not valid base32.
    #[error("invalid MFA secret")]
    InvalidSecret,

    /// The TOTP parameters were rejected.
    #[error("failed to build TOTP: {0}")]
    Totp(String),

    /// System clock error while checking a code.
    #[error("clock error: {0}")]
    Clock(String),
}

/// Generates a fresh base32-encoded MFA secret.
#[must_use]
pub fn generate_mfa_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

fn build_totp(secret_b32: &str, account_email: &str) -> Result<TOTP, MfaError> {
    let secret = Secret::Encoded(secret_b32.to_string())
        .to_bytes()
        .map_err(|_| MfaError::InvalidSecret)?;

    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret,
        Some(ISSUER.to_string()),
        account_email.to_string(),
    )
    .map_err(|e| MfaError::Totp(e.to_string()))
}

/// Builds the otpauth:// provisioning URL for authenticator apps.
///
/// # Errors
///
/// Returns an error if the secret is malformed.
pub fn otpauth_url(secret_b32: &str, account_email: &str) -> Result<String, MfaError> {
    Ok(build_totp(secret_b32, account_email)?.get_url())
}

/// Checks a six-digit code against the stored secret.
///
/// # Errors
///
/// Returns an error if the secret is malformed or the clock is unavailable.
pub fn verify_mfa_code(secret_b32: &str, account_email: &str, code: &str) -> Result<bool, MfaError> {
    build_totp(secret_b32, account_email)?
        .check_current(code)
        .map_err(|e| MfaError::Clock(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secret_is_usable() {
        let secret = generate_mfa_secret();
        let url = otpauth_url(&secret, "user@example.com").unwrap();
        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("Novafin"));
    }

    #[test]
    fn test_current_code_verifies() {
        let secret = generate_mfa_secret();
        let totp = build_totp(&secret, "user@example.com").unwrap();
        let code = totp.generate_current().unwrap();
        assert!(verify_mfa_code(&secret, "user@example.com", &code).unwrap());
    }

    #[test]
    fn test_wrong_code_is_rejected() {
        let secret = generate_mfa_secret();
        assert!(!verify_mfa_code(&secret, "user@example.com", "000000").unwrap_or(true));
    }

    #[test]
    fn test_malformed_secret_errors() {
        let result = otpauth_url("not base32 at all!!!", "user@example.com");
        assert!(matches!(result, Err(MfaError::InvalidSecret)));
    }
}
