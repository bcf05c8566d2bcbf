use crate::{Alert, AlertType};

pub struct EmailTemplate;

impl EmailTemplate {
    /// Plain-text body for an alert email.
    pub fn render(alert: &Alert) -> String {
        match &alert.alert_type {
            AlertType::PriceDrop {
                symbol,
                percent_change,
                previous_close,
                current_close,
                ..
            } => format!(
                "📉 STOCK ALERT\n\n\
                 {symbol} is down {percent_change:.2}% today\n\
                 Prev close: ${previous_close:.2}\n\
                 Current: ${current_close:.2}\n\n\
                 {msg} 👀",
                msg = alert.message,
            ),
        }
    }
}
