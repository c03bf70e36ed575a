//! Shared types, errors, and configuration for Novafin.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - JWT token handling and auth payloads
//! - SMTP email delivery
//! - Reference number generation

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod refs;

pub use config::{AppConfig, StorageSettings};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
