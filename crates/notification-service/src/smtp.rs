use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use crate::templates::EmailTemplate;
use crate::{Alert, NotificationChannel, NotificationConfig, NotificationError, SmtpTls};

/// Authenticated SMTP delivery to a single recipient.
///
/// A session is opened per message, so a bad credential surfaces on the
/// alert that needed it rather than at startup.
pub struct SmtpNotifier {
    config: NotificationConfig,
}

impl SmtpNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn message(&self, alert: &Alert) -> Result<Message, NotificationError> {
        let from_addr = self
            .config
            .smtp_from
            .as_deref()
            .ok_or_else(|| NotificationError::Config("EMAIL_ADDRESS not set".into()))?;
        let to_addr = self
            .config
            .smtp_to
            .as_deref()
            .ok_or_else(|| NotificationError::Config("EMAIL_TO not set".into()))?;

        let from: Mailbox = from_addr
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid from address: {}", e)))?;
        let to: Mailbox = to_addr
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&alert.title)
            .header(ContentType::TEXT_PLAIN)
            .body(EmailTemplate::render(alert))
            .map_err(|e| NotificationError::Smtp(format!("Failed to build email: {}", e)))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotificationError> {
        let user = self
            .config
            .smtp_username
            .as_deref()
            .ok_or_else(|| NotificationError::Config("EMAIL_ADDRESS not set".into()))?;
        let pass = self
            .config
            .smtp_password
            .as_deref()
            .ok_or_else(|| NotificationError::Config("EMAIL_PASSWORD not set".into()))?;

        let host = self.config.smtp_host.as_str();
        let builder = match self.config.smtp_tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
        }
        .map_err(|e| NotificationError::Smtp(format!("SMTP transport error: {}", e)))?;

        Ok(builder
            .port(self.config.smtp_port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .timeout(Some(Duration::from_secs(self.config.smtp_timeout_secs)))
            .build())
    }
}

#[async_trait]
impl NotificationChannel for SmtpNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let email = self.message(alert)?;
        let transport = self.transport()?;

        transport
            .send(email)
            .await
            .map_err(|e| NotificationError::Smtp(format!("Failed to send email: {}", e)))?;

        tracing::debug!(
            "Sent '{}' via {}:{}",
            alert.title,
            self.config.smtp_host,
            self.config.smtp_port
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NotificationConfig {
        NotificationConfig {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            smtp_username: Some("alerts@example.com".to_string()),
            smtp_password: Some("app-password".to_string()),
            smtp_from: Some("alerts@example.com".to_string()),
            smtp_to: Some("me@example.com".to_string()),
            smtp_tls: SmtpTls::Tls,
            smtp_timeout_secs: 5,
        }
    }

    #[test]
    fn test_message_headers() {
        let notifier = SmtpNotifier::new(&config());
        let alert = Alert::price_drop("XYZ", -6.0, 100.0, 94.0, -5.0);

        let raw = String::from_utf8(notifier.message(&alert).unwrap().formatted()).unwrap();
        assert!(raw.contains("Subject: Stock Alert: XYZ down -6.00%"));
        assert!(raw.contains("me@example.com"));
        assert!(raw.contains("alerts@example.com"));
    }

    #[tokio::test]
    async fn test_missing_recipient_fails_at_send() {
        let mut cfg = config();
        cfg.smtp_to = None;
        let notifier = SmtpNotifier::new(&cfg);

        let result = notifier
            .send(&Alert::price_drop("XYZ", -6.0, 100.0, 94.0, -5.0))
            .await;
        assert!(matches!(result, Err(NotificationError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_password_fails_at_send() {
        let mut cfg = config();
        cfg.smtp_password = None;
        let notifier = SmtpNotifier::new(&cfg);

        let result = notifier
            .send(&Alert::price_drop("XYZ", -6.0, 100.0, 94.0, -5.0))
            .await;
        match result {
            Err(NotificationError::Config(msg)) => assert!(msg.contains("EMAIL_PASSWORD")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore] // Only run with valid credentials
    async fn test_send_live() {
        let notifier = SmtpNotifier::new(&NotificationConfig::from_env());
        notifier
            .send(&Alert::price_drop("TEST", -5.0, 100.0, 95.0, -5.0))
            .await
            .unwrap();
    }
}
