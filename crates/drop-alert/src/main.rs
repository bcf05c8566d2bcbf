use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notification_service::{NotificationConfig, SmtpNotifier};
use yahoo_client::YahooFinanceClient;

mod config;
mod market_hours;
mod runner;
mod store;
mod watchlist;

use config::AlertConfig;
use runner::AlertRunner;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(env_filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    // 2. Configuration
    let config = AlertConfig::from_env().context("Invalid configuration")?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Threshold: {:.2}%", config.threshold_pct);
    tracing::info!("  Timezone: {}", config.timezone);
    tracing::info!("  Watchlist: {}", config.watchlist_path.display());
    tracing::info!("  Alert state: {}", config.state_path.display());
    tracing::info!("  Enforce market hours: {}", config.enforce_market_hours);

    let notification_config = NotificationConfig::from_env();

    // 3. Collaborators
    let provider = Arc::new(
        YahooFinanceClient::new(Duration::from_secs(config.http_timeout_secs))
            .context("Failed to initialize market data client")?,
    );
    let notifier = Arc::new(SmtpNotifier::new(&notification_config));

    // 4. One pass over the watchlist
    let runner = AlertRunner::new(config, provider, notifier);
    let report = runner
        .run()
        .await
        .context("Alert run aborted")?;

    if report.skipped_outside_hours {
        tracing::info!("Skipped: market closed on {}", report.date);
    }

    Ok(())
}
