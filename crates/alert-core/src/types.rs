use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::AlertError;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// The two most recent daily closes for a ticker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub previous_close: f64,
    pub current_close: f64,
}

impl PriceSample {
    pub fn new(previous_close: f64, current_close: f64) -> Self {
        Self {
            previous_close,
            current_close,
        }
    }

    /// Build a sample from the last two bars of an oldest-first history.
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        match bars {
            [.., prev, current] => Some(Self::new(prev.close, current.close)),
            _ => None,
        }
    }

    /// Signed percent move from the previous close to the current close.
    pub fn percent_change(&self) -> Result<f64, AlertError> {
        if !self.previous_close.is_finite() || self.previous_close <= 0.0 {
            return Err(AlertError::InvalidData(format!(
                "previous close must be a positive price, got {}",
                self.previous_close
            )));
        }
        if !self.current_close.is_finite() {
            return Err(AlertError::InvalidData(format!(
                "current close is not a finite price: {}",
                self.current_close
            )));
        }

        Ok((self.current_close - self.previous_close) / self.previous_close * 100.0)
    }
}

/// Date of the most recent alert per ticker, used to suppress same-day repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertState {
    last_alerts: BTreeMap<String, NaiveDate>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn already_alerted(&self, symbol: &str, today: NaiveDate) -> bool {
        self.last_alerts.get(symbol) == Some(&today)
    }

    /// Record an alert for `symbol`, replacing any earlier date.
    pub fn record(&mut self, symbol: &str, today: NaiveDate) {
        self.last_alerts.insert(symbol.to_string(), today);
    }

    pub fn last_alert(&self, symbol: &str) -> Option<NaiveDate> {
        self.last_alerts.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.last_alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(close: f64) -> Bar {
        Bar {
            timestamp: Utc::now(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000.0,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_percent_change_drop() {
        let sample = PriceSample::new(100.0, 94.0);
        assert!((sample.percent_change().unwrap() - -6.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_change_matches_formula() {
        for (prev, cur) in [(250.5, 260.25), (12.34, 11.11), (1.0, 0.5)] {
            let expected = (cur - prev) / prev * 100.0;
            let got = PriceSample::new(prev, cur).percent_change().unwrap();
            assert!((got - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_percent_change_rejects_zero_previous_close() {
        let result = PriceSample::new(0.0, 10.0).percent_change();
        assert!(matches!(result, Err(AlertError::InvalidData(_))));
    }

    #[test]
    fn test_percent_change_rejects_nan_current_close() {
        let result = PriceSample::new(10.0, f64::NAN).percent_change();
        assert!(matches!(result, Err(AlertError::InvalidData(_))));
    }

    #[test]
    fn test_from_bars_uses_last_two() {
        let bars = vec![bar(90.0), bar(100.0), bar(94.0)];
        let sample = PriceSample::from_bars(&bars).unwrap();
        assert_eq!(sample, PriceSample::new(100.0, 94.0));
    }

    #[test]
    fn test_from_bars_needs_two_points() {
        assert!(PriceSample::from_bars(&[]).is_none());
        assert!(PriceSample::from_bars(&[bar(100.0)]).is_none());
    }

    #[test]
    fn test_alert_state_same_day_only() {
        let mut state = AlertState::new();
        state.record("XYZ", date("2026-10-16"));

        assert!(state.already_alerted("XYZ", date("2026-10-16")));
        assert!(!state.already_alerted("XYZ", date("2026-10-19")));
        assert!(!state.already_alerted("ABC", date("2026-10-16")));

        state.record("XYZ", date("2026-10-19"));
        assert_eq!(state.last_alert("XYZ"), Some(date("2026-10-19")));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_alert_state_json_shape() {
        let mut state = AlertState::new();
        state.record("XYZ", date("2026-10-19"));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json, serde_json::json!({ "XYZ": "2026-10-19" }));

        let parsed: AlertState = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, state);
    }
}
