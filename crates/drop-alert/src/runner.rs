use std::sync::Arc;

use alert_core::{AlertError, AlertState, MarketDataProvider, PriceSample};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use notification_service::{Alert, NotificationChannel};

use crate::config::AlertConfig;
use crate::market_hours::MarketHours;
use crate::store::{self, StoreError};
use crate::watchlist::Watchlist;

/// What happened to a single ticker during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    /// Fewer than two closes came back; nothing to compare.
    InsufficientData { points: usize },
    /// Move did not reach the threshold.
    NoAlert { change_pct: f64 },
    /// Threshold met, but an alert already went out today.
    AlreadyAlerted { change_pct: f64 },
    Alerted { change_pct: f64 },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub date: NaiveDate,
    pub market_open: bool,
    /// Run stopped at the market-hours gate; no files were touched.
    pub skipped_outside_hours: bool,
    pub outcomes: Vec<(String, Result<TickerOutcome, String>)>,
    pub state_saved: bool,
}

impl RunReport {
    fn new(date: NaiveDate, market_open: bool) -> Self {
        Self {
            date,
            market_open,
            skipped_outside_hours: false,
            outcomes: Vec::new(),
            state_saved: false,
        }
    }

    pub fn alerted(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| matches!(r, Ok(TickerOutcome::Alerted { .. })))
            .map(|(symbol, _)| symbol.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(symbol, r)| r.as_ref().err().map(|e| (symbol.as_str(), e.as_str())))
            .collect()
    }

    #[cfg(test)]
    pub fn outcome(&self, symbol: &str) -> Option<&Result<TickerOutcome, String>> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, r)| r)
    }
}

/// One pass over the watchlist: fetch, compare, alert, persist.
pub struct AlertRunner {
    config: AlertConfig,
    market_hours: MarketHours,
    provider: Arc<dyn MarketDataProvider>,
    notifier: Arc<dyn NotificationChannel>,
}

impl AlertRunner {
    pub fn new(
        config: AlertConfig,
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            config,
            market_hours: MarketHours::default(),
            provider,
            notifier,
        }
    }

    pub async fn run(&self) -> Result<RunReport, StoreError> {
        self.run_at(Utc::now().with_timezone(&self.config.timezone))
            .await
    }

    /// Run as if the clock read `now`.
    ///
    /// Only file errors escape; per-ticker failures are recorded in the
    /// report and the loop moves on.
    pub async fn run_at(&self, now: DateTime<Tz>) -> Result<RunReport, StoreError> {
        let today = now.date_naive();
        let market_open = self.market_hours.is_open(&now);
        let mut report = RunReport::new(today, market_open);

        if !market_open {
            if self.config.enforce_market_hours {
                tracing::info!("Outside market hours. Exiting.");
                report.skipped_outside_hours = true;
                return Ok(report);
            }
            tracing::info!("Outside market hours, continuing (ENFORCE_MARKET_HOURS=false)");
        }

        let watchlist = Watchlist::load(&self.config.watchlist_path).await?;
        let mut state: AlertState =
            store::load_json(&self.config.state_path, AlertState::new()).await?;

        if watchlist.is_empty() {
            tracing::warn!(
                "Watchlist {} is empty or missing",
                self.config.watchlist_path.display()
            );
        }

        tracing::info!(
            "Checking {} tickers for drops of {:.2}% or worse ({})",
            watchlist.len(),
            self.config.threshold_pct,
            today
        );

        for symbol in watchlist.symbols() {
            let result = self.evaluate(symbol, today, &mut state).await;
            if let Err(e) = &result {
                tracing::error!("Error processing {}: {}", symbol, e);
            }
            report
                .outcomes
                .push((symbol.to_string(), result.map_err(|e| e.to_string())));
        }

        store::save_json(&self.config.state_path, &state).await?;
        report.state_saved = true;

        tracing::info!(
            "Run complete: {} checked, {} alerted, {} failed",
            report.outcomes.len(),
            report.alerted().len(),
            report.failed().len()
        );

        Ok(report)
    }

    /// Evaluate one ticker, sending an alert and updating `state` when it qualifies.
    pub async fn evaluate(
        &self,
        symbol: &str,
        today: NaiveDate,
        state: &mut AlertState,
    ) -> Result<TickerOutcome, AlertError> {
        let bars = self
            .provider
            .daily_bars(symbol, self.config.lookback_days)
            .await?;

        let Some(sample) = PriceSample::from_bars(&bars) else {
            tracing::info!("Not enough data for {}", symbol);
            return Ok(TickerOutcome::InsufficientData { points: bars.len() });
        };

        let change_pct = sample.percent_change()?;
        tracing::info!("{}: {:.2}%", symbol, change_pct);

        if change_pct > self.config.threshold_pct {
            return Ok(TickerOutcome::NoAlert { change_pct });
        }

        if state.already_alerted(symbol, today) {
            tracing::debug!("{} already alerted on {}", symbol, today);
            return Ok(TickerOutcome::AlreadyAlerted { change_pct });
        }

        let alert = Alert::price_drop(
            symbol,
            change_pct,
            sample.previous_close,
            sample.current_close,
            self.config.threshold_pct,
        );
        self.notifier
            .send(&alert)
            .await
            .map_err(|e| AlertError::Notification(e.to_string()))?;

        state.record(symbol, today);
        tracing::info!("Alert sent for {} via {}", symbol, self.notifier.name());

        Ok(TickerOutcome::Alerted { change_pct })
    }
}
