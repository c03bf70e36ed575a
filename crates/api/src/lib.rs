//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Payment gateway clients
//! - Response types

pub mod gateways;
pub mod middleware;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use novafin_core::storage::StorageService;
use novafin_db::{
    ClientRequestRepository, ContentRepository, DocumentService, FinancingRepository,
    KycRepository, NotificationDispatcher, PaymentRepository, SessionRepository,
    SignatureRepository, UserRepository,
};
use novafin_shared::{AppConfig, EmailService, JwtService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Email service; `None` disables outgoing mail.
    pub email_service: Option<EmailService>,
    /// Storage service for generated documents and KYC uploads.
    pub storage: Arc<StorageService>,
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Shared HTTP client for gateway calls.
    pub http: reqwest::Client,
}

impl AppState {
    fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }

    /// Builds the notification dispatcher.
    #[must_use]
    pub fn notifier(&self) -> NotificationDispatcher {
        NotificationDispatcher::new(self.conn(), self.email_service.clone())
    }

    /// Builds the document service.
    #[must_use]
    pub fn documents(&self) -> DocumentService {
        DocumentService::new(self.conn(), Arc::clone(&self.storage))
    }

    /// Builds the financing repository.
    #[must_use]
    pub fn financing(&self) -> FinancingRepository {
        FinancingRepository::new(self.conn(), self.documents(), self.notifier())
    }

    /// Builds the KYC repository.
    #[must_use]
    pub fn kyc(&self) -> KycRepository {
        KycRepository::new(
            self.conn(),
            Arc::clone(&self.storage),
            self.documents(),
            self.notifier(),
        )
    }

    /// Builds the user repository.
    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.conn())
    }

    /// Builds the session repository.
    #[must_use]
    pub fn sessions(&self) -> SessionRepository {
        SessionRepository::new(self.conn())
    }

    /// Builds the payment repository.
    #[must_use]
    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.conn())
    }

    /// Builds the signature repository.
    #[must_use]
    pub fn signatures(&self) -> SignatureRepository {
        SignatureRepository::new(self.conn(), self.documents())
    }

    /// Builds the client request repository.
    #[must_use]
    pub fn client_requests(&self) -> ClientRequestRepository {
        ClientRequestRepository::new(self.conn(), self.notifier())
    }

    /// Builds the content repository.
    #[must_use]
    pub fn content(&self) -> ContentRepository {
        ContentRepository::new(self.conn())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
