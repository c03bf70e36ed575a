//! Novafin API Server
//!
//! Main entry point for the Novafin backend service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use novafin_api::{AppState, create_router};
use novafin_core::storage::{StorageConfig, StorageProvider, StorageService};
use novafin_db::connect;
use novafin_shared::{AppConfig, EmailService, JwtConfig, JwtService, StorageSettings};

fn storage_from_settings(settings: &StorageSettings) -> anyhow::Result<StorageService> {
    let provider = if settings.backend == "s3" {
        StorageProvider::s3(
            settings
                .endpoint
                .clone()
                .context("storage.endpoint is required for the s3 backend")?,
            settings.root.clone(),
            std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default(),
            std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default(),
            settings.region.clone().unwrap_or_else(|| "auto".to_string()),
        )
    } else {
        StorageProvider::local_fs(settings.root.clone())
    };
    StorageService::from_config(StorageConfig::new(provider))
        .context("failed to initialize storage")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "novafin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
        #[allow(clippy::cast_possible_wrap)]
        refresh_token_expires_days: (config.jwt.refresh_token_expiry_secs / 86_400) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Create email service; mail is disabled when no SMTP host is set
    let email_service = if config.email.smtp_host.is_empty() {
        info!("No SMTP host configured, outgoing mail disabled");
        None
    } else {
        info!(
            smtp_host = %config.email.smtp_host,
            smtp_port = %config.email.smtp_port,
            "Email service configured"
        );
        Some(EmailService::new(config.email.clone()))
    };

    // Create document storage
    let storage = storage_from_settings(&config.storage)?;
    info!(backend = %config.storage.backend, "Storage configured");

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        email_service,
        storage: Arc::new(storage),
        config: Arc::new(config.clone()),
        http: reqwest::Client::new(),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
