use async_trait::async_trait;
use crate::{AlertError, Bar};

/// Source of daily price history.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars for `symbol`, oldest first, covering at most `lookback_days`
    /// trading sessions. Fewer bars are returned when history is unavailable.
    async fn daily_bars(&self, symbol: &str, lookback_days: usize) -> Result<Vec<Bar>, AlertError>;

    fn name(&self) -> &str;
}
