//! Notification categories and delivery channels.
//!
//! An in-app notification row is always written; email delivery is
//! best-effort on top and never fails the triggering operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery channel for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// In-app only.
    InApp,
    /// Email only.
    Email,
    /// In-app plus email.
    Both,
}

impl NotificationChannel {
    /// Returns the string representation of the channel.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Both => "both",
        }
    }

    /// Parses a channel from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_app" => Some(Self::InApp),
            "email" => Some(Self::Email),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    /// Returns true if email delivery should be attempted.
    #[must_use]
    pub const fn includes_email(&self) -> bool {
        matches!(self, Self::Email | Self::Both)
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subject area of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// KYC lifecycle events.
    Kyc,
    /// Financing application lifecycle events.
    Financing,
    /// Payment and installment events.
    Payment,
    /// Generated documents.
    Document,
    /// Signature requests.
    Signature,
    /// Client request responses.
    Request,
    /// Platform announcements.
    System,
}

impl NotificationCategory {
    /// Returns the string representation of the category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kyc => "kyc",
            Self::Financing => "financing",
            Self::Payment => "payment",
            Self::Document => "document",
            Self::Signature => "signature",
            Self::Request => "request",
            Self::System => "system",
        }
    }

    /// Parses a category from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "kyc" => Some(Self::Kyc),
            "financing" => Some(Self::Financing),
            "payment" => Some(Self::Payment),
            "document" => Some(Self::Document),
            "signature" => Some(Self::Signature),
            "request" => Some(Self::Request),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_round_trip() {
        for c in [
            NotificationChannel::InApp,
            NotificationChannel::Email,
            NotificationChannel::Both,
        ] {
            assert_eq!(NotificationChannel::parse(c.as_str()), Some(c));
        }
    }

    #[test]
    fn test_email_inclusion() {
        assert!(!NotificationChannel::InApp.includes_email());
        assert!(NotificationChannel::Email.includes_email());
        assert!(NotificationChannel::Both.includes_email());
    }

    #[test]
    fn test_category_round_trip() {
        for c in [
            NotificationCategory::Kyc,
            NotificationCategory::Financing,
            NotificationCategory::Payment,
            NotificationCategory::Document,
            NotificationCategory::Signature,
            NotificationCategory::Request,
            NotificationCategory::System,
        ] {
            assert_eq!(NotificationCategory::parse(c.as_str()), Some(c));
        }
    }
}
