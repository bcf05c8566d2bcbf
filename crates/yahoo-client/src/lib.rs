use alert_core::{AlertError, Bar, MarketDataProvider};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, Url};
use std::time::Duration;

const BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Daily price history from the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self, AlertError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(timeout)
            .build()
            .map_err(|e| AlertError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at a different host (mirrors, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The symbol is encoded as a single path segment.
    fn chart_url(&self, symbol: &str, lookback_days: usize) -> Result<Url, AlertError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AlertError::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| AlertError::Config(format!("Base URL cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("range", &format!("{}d", lookback_days))
            .append_pair("interval", "1d");

        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn daily_bars(&self, symbol: &str, lookback_days: usize) -> Result<Vec<Bar>, AlertError> {
        let url = self.chart_url(symbol, lookback_days)?;
        tracing::debug!("Fetching {} daily bars for {}", lookback_days, symbol);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AlertError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AlertError::Provider(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AlertError::Provider(e.to_string()))?;

        let mut bars = parse_chart(&json)?;
        if bars.len() > lookback_days {
            bars.drain(..bars.len() - lookback_days);
        }

        Ok(bars)
    }

    fn name(&self) -> &str {
        "yahoo-finance"
    }
}

/// Extract oldest-first daily bars from a `/v8/finance/chart` response.
///
/// Sessions without a close (halts, the in-progress candle on some feeds)
/// are dropped. Missing open/high/low fall back to the close.
pub fn parse_chart(json: &serde_json::Value) -> Result<Vec<Bar>, AlertError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| AlertError::Provider("Missing chart object".to_string()))?;

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let description = err
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown chart error");
        return Err(AlertError::Provider(description.to_string()));
    }

    let result = chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AlertError::Provider("No chart data found".to_string()))?;

    // Delisted or brand-new symbols come back without a timestamp array.
    let Some(timestamps) = result.get("timestamp").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let quote = result
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AlertError::Provider("No quote data found".to_string()))?;

    let series = |field: &str| -> Vec<Option<f64>> {
        quote
            .get(field)
            .and_then(|v| v.as_array())
            .map(|values| values.iter().map(|v| v.as_f64()).collect())
            .unwrap_or_default()
    };
    let opens = series("open");
    let highs = series("high");
    let lows = series("low");
    let closes = series("close");
    let volumes = series("volume");

    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(close) = at(&closes, i) else {
            continue;
        };
        let ts = ts
            .as_i64()
            .ok_or_else(|| AlertError::InvalidData(format!("Invalid timestamp at index {}", i)))?;
        let timestamp = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| AlertError::InvalidData(format!("Timestamp out of range: {}", ts)))?;

        bars.push(Bar {
            timestamp,
            open: at(&opens, i).unwrap_or(close),
            high: at(&highs, i).unwrap_or(close),
            low: at(&lows, i).unwrap_or(close),
            close,
            volume: at(&volumes, i).unwrap_or(0.0),
        });
    }

    Ok(bars)
}
