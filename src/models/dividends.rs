use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dividends of one hotkey on one subnet, as read from the ledger.
///
/// Serialized flat with the field names clients of the `/api/v1/tao_dividends`
/// endpoint already consume (`dividends`, `timestamp`, `cached`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    pub netuid: u16,
    pub hotkey: String,
    /// Amount in TAO
    pub dividends: f64,
    /// When the ledger was queried, never the cache read time
    #[serde(rename = "timestamp")]
    pub observed_at: DateTime<Utc>,
    #[serde(rename = "cached", default)]
    pub from_cache: bool,
}

impl DividendRecord {
    /// A record for a value just read from the ledger.
    pub fn fresh(netuid: u16, hotkey: impl Into<String>, dividends: f64) -> Self {
        Self {
            netuid,
            hotkey: hotkey.into(),
            dividends,
            observed_at: Utc::now(),
            from_cache: false,
        }
    }
}

/// Query parameters for GET /api/v1/tao_dividends
#[derive(Debug, Clone, Deserialize)]
pub struct TaoDividendsQuery {
    pub netuid: u16,
    pub hotkey: String,
    /// Trigger sentiment analysis after a fresh read
    #[serde(default)]
    pub trade: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}
