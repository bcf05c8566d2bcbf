use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::store::{self, StoreError};

/// Tickers to monitor.
///
/// On disk this is a JSON object keyed by symbol; per-symbol metadata is
/// accepted in any shape and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, IgnoredAny>")]
pub struct Watchlist {
    symbols: BTreeSet<String>,
}

impl From<BTreeMap<String, IgnoredAny>> for Watchlist {
    fn from(entries: BTreeMap<String, IgnoredAny>) -> Self {
        Self {
            symbols: entries.into_keys().collect(),
        }
    }
}

impl Watchlist {
    /// Load from `path`; a missing file is an empty watchlist.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        store::load_json(path, Self::default()).await
    }

    /// Symbols in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
