use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AlertConfig {
    // Alert rule
    pub threshold_pct: f64,      // -5.0 = dropped at least 5%
    pub lookback_days: usize,    // 2 daily closes

    // Clock
    pub timezone: Tz,            // US/Eastern
    pub enforce_market_hours: bool,

    // Files
    pub watchlist_path: PathBuf,
    pub state_path: PathBuf,

    // Market data
    pub http_timeout_secs: u64,
}

impl AlertConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let timezone_name = var("ALERT_TIMEZONE", "US/Eastern");

        let config = Self {
            threshold_pct: var("ALERT_THRESHOLD_PCT", "-5.0")
                .parse()
                .context("ALERT_THRESHOLD_PCT must be a number")?,
            lookback_days: var("LOOKBACK_DAYS", "2")
                .parse()
                .context("LOOKBACK_DAYS must be a positive integer")?,

            timezone: timezone_name
                .parse()
                .map_err(|e| anyhow!("Invalid ALERT_TIMEZONE '{}': {}", timezone_name, e))?,
            enforce_market_hours: var("ENFORCE_MARKET_HOURS", "false")
                .parse()
                .context("ENFORCE_MARKET_HOURS must be true or false")?,

            watchlist_path: var("WATCHLIST_PATH", "watchlist.json").into(),
            state_path: var("ALERT_STATE_PATH", "alert_state.json").into(),

            http_timeout_secs: var("HTTP_TIMEOUT_SECS", "30")
                .parse()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.threshold_pct.is_finite() || self.threshold_pct >= 0.0 {
            bail!(
                "ALERT_THRESHOLD_PCT must be a negative percentage, got {}",
                self.threshold_pct
            );
        }
        if self.lookback_days < 2 {
            bail!("LOOKBACK_DAYS must be at least 2, got {}", self.lookback_days);
        }
        if self.http_timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }
}
