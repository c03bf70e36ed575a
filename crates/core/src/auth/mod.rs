//! Authentication primitives.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - TOTP-based multi-factor authentication
//! - User role definitions

mod password;
mod totp;

pub use password::{PasswordError, hash_password, verify_password};
pub use totp::{MfaError, generate_mfa_secret, otpauth_url, verify_mfa_code};

use serde::{Deserialize, Serialize};

/// Platform user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular platform client.
    Client,
    /// Back-office staff with review and approval powers.
    Admin,
}

impl UserRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Admin => "admin",
        }
    }

    /// Parses a role from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Self::Client),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns true if this role can review KYC and financing applications.
    #[must_use]
    pub const fn can_review(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(UserRole::parse("client"), Some(UserRole::Client));
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("owner"), None);
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.can_review());
        assert!(!UserRole::Client.can_review());
    }
}
