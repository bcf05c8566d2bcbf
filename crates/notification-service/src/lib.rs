mod smtp;
mod templates;

pub use smtp::SmtpNotifier;
pub use templates::EmailTemplate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Alert types that trigger notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlertType {
    PriceDrop {
        symbol: String,
        percent_change: f64,
        previous_close: f64,
        current_close: f64,
        threshold_pct: f64,
    },
}

/// A notification alert to be dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(
        alert_type: AlertType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            alert_type,
            timestamp: chrono::Utc::now(),
            title: title.into(),
            message: message.into(),
        }
    }

    /// Daily close dropped through the configured threshold.
    pub fn price_drop(
        symbol: &str,
        percent_change: f64,
        previous_close: f64,
        current_close: f64,
        threshold_pct: f64,
    ) -> Self {
        Self::new(
            AlertType::PriceDrop {
                symbol: symbol.to_string(),
                percent_change,
                previous_close,
                current_close,
                threshold_pct,
            },
            format!("Stock Alert: {} down {:.2}%", symbol, percent_change),
            "Potential buy opportunity",
        )
    }

    pub fn symbol(&self) -> &str {
        match &self.alert_type {
            AlertType::PriceDrop { symbol, .. } => symbol,
        }
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the notification service.
///
/// Credentials are carried as-is; a missing value only fails when a message
/// is actually sent.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_to: Option<String>,
    pub smtp_tls: SmtpTls,
    pub smtp_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SmtpTls {
    /// Implicit TLS (SMTPS, port 465).
    #[default]
    Tls,
    StartTls,
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let sender = non_empty("EMAIL_ADDRESS");

        let smtp_tls = match lookup("SMTP_TLS").unwrap_or_default().as_str() {
            "starttls" => SmtpTls::StartTls,
            _ => SmtpTls::Tls,
        };

        Self {
            smtp_host: non_empty("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: lookup("SMTP_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(465),
            smtp_username: sender.clone(),
            smtp_password: non_empty("EMAIL_PASSWORD"),
            smtp_from: sender,
            smtp_to: non_empty("EMAIL_TO"),
            smtp_tls,
            smtp_timeout_secs: lookup("SMTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults_to_gmail_smtps() {
        let config = NotificationConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 465);
        assert_eq!(config.smtp_tls, SmtpTls::Tls);
        assert!(config.smtp_from.is_none());
        assert!(config.smtp_to.is_none());
    }

    #[test]
    fn test_config_sender_is_login() {
        let config = NotificationConfig::from_lookup(lookup_from(&[
            ("EMAIL_ADDRESS", "alerts@example.com"),
            ("EMAIL_PASSWORD", "app-password"),
            ("EMAIL_TO", "me@example.com"),
            ("SMTP_TLS", "starttls"),
            ("SMTP_PORT", "587"),
        ]));
        assert_eq!(config.smtp_username.as_deref(), Some("alerts@example.com"));
        assert_eq!(config.smtp_from.as_deref(), Some("alerts@example.com"));
        assert_eq!(config.smtp_password.as_deref(), Some("app-password"));
        assert_eq!(config.smtp_to.as_deref(), Some("me@example.com"));
        assert_eq!(config.smtp_tls, SmtpTls::StartTls);
        assert_eq!(config.smtp_port, 587);
    }

    #[test]
    fn test_price_drop_title() {
        let alert = Alert::price_drop("XYZ", -6.0, 100.0, 94.0, -5.0);
        assert_eq!(alert.title, "Stock Alert: XYZ down -6.00%");
        assert_eq!(alert.symbol(), "XYZ");
    }
}
