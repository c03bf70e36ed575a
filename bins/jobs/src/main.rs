//! Scheduled maintenance jobs for Novafin.
//!
//! Runs the daily sweeps: installment status refresh, payment reminders,
//! signature request expiry, and scheduled payment reminders. Pass
//! `--once` to run a single sweep and exit (for external schedulers);
//! without it the process loops on an interval.

use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use novafin_db::{NotificationDispatcher, SweepRepository, connect};
use novafin_shared::{AppConfig, EmailService};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

async fn run_sweeps(sweeps: &SweepRepository) {
    match sweeps.refresh_installment_statuses().await {
        Ok(updated) => info!(updated, "Installment statuses refreshed"),
        Err(e) => error!(error = %e, "Installment status sweep failed"),
    }
    match sweeps.send_payment_reminders().await {
        Ok(sent) => info!(sent, "Payment reminders sent"),
        Err(e) => error!(error = %e, "Payment reminder sweep failed"),
    }
    match sweeps.expire_signature_requests().await {
        Ok(expired) => info!(expired, "Signature requests expired"),
        Err(e) => error!(error = %e, "Signature expiry sweep failed"),
    }
    match sweeps.send_scheduled_payment_reminders().await {
        Ok(sent) => info!(sent, "Scheduled payment reminders sent"),
        Err(e) => error!(error = %e, "Scheduled payment reminder sweep failed"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "novafin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    let email = if config.email.smtp_host.is_empty() {
        None
    } else {
        Some(EmailService::new(config.email.clone()))
    };
    let notifier = NotificationDispatcher::new(db.clone(), email);
    let sweeps = SweepRepository::new(db, notifier);

    let once = std::env::args().any(|a| a == "--once");
    if once {
        run_sweeps(&sweeps).await;
        return Ok(());
    }

    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        info!("Starting sweep cycle");
        run_sweeps(&sweeps).await;
    }
}
