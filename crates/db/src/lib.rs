//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access, applying the core status
//!   machines inside database transactions
//! - Database migrations
//! - The notification dispatcher (in-app row + best-effort email)

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    ClientRequestRepository, ContentRepository, DocumentService, FinancingRepository,
    KycRepository, NotificationDispatcher, PaymentRepository, SessionRepository,
    SignatureRepository, SweepRepository, UserRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
