//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Email (SMTP) configuration.
    pub email: EmailConfig,
    /// Document storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Payment gateway configuration.
    pub gateways: GatewayConfig,
    /// Financing defaults.
    #[serde(default)]
    pub financing: FinancingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> u64 {
    604800 // 7 days
}

/// Email (SMTP) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_username: String,
    /// SMTP password.
    pub smtp_password: String,
    /// From address for outgoing mail.
    pub from_email: String,
    /// Display name for outgoing mail.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Base URL of the frontend, used in email links.
    pub frontend_url: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Novafin".to_string()
}

/// Document storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Storage backend: "fs" or "s3".
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Root path (fs) or bucket name (s3).
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// S3 endpoint URL, when backend = "s3".
    #[serde(default)]
    pub endpoint: Option<String>,
    /// S3 region, when backend = "s3".
    #[serde(default)]
    pub region: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            root: default_storage_root(),
            endpoint: None,
            region: None,
        }
    }
}

fn default_storage_backend() -> String {
    "fs".to_string()
}

fn default_storage_root() -> String {
    "./data/media".to_string()
}

/// Payment gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Card gateway (hosted checkout).
    pub card: CardGatewayConfig,
    /// Crypto gateway (pay-to-address quotes).
    pub crypto: CryptoGatewayConfig,
}

/// Card gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CardGatewayConfig {
    /// API base URL.
    #[serde(default = "default_card_api_url")]
    pub api_url: String,
    /// Secret API key.
    pub secret_key: String,
    /// Webhook signing secret.
    pub webhook_secret: String,
    /// Redirect URL after successful checkout.
    pub success_url: String,
    /// Redirect URL after cancelled checkout.
    pub cancel_url: String,
}

fn default_card_api_url() -> String {
    "https://api.stripe.com/v1".to_string()
}

/// Crypto gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoGatewayConfig {
    /// API base URL.
    #[serde(default = "default_crypto_api_url")]
    pub api_url: String,
    /// API key.
    pub api_key: String,
    /// IPN (webhook) HMAC secret.
    pub ipn_secret: String,
}

fn default_crypto_api_url() -> String {
    "https://api.nowpayments.io/v1".to_string()
}

/// Financing defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct FinancingConfig {
    /// Default one-time fee percentage applied to new applications.
    #[serde(default = "default_fee_percentage")]
    pub default_fee_percentage: String,
}

impl Default for FinancingConfig {
    fn default() -> Self {
        Self {
            default_fee_percentage: default_fee_percentage(),
        }
    }
}

fn default_fee_percentage() -> String {
    "4.00".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("NOVAFIN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
