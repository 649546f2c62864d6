use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentAction {
    Stake,
    Unstake,
}

impl SentimentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentAction::Stake => "stake",
            SentimentAction::Unstake => "unstake",
        }
    }
}

/// Outcome of a sentiment analysis run for a hotkey on a subnet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub netuid: u16,
    pub hotkey: String,
    pub sentiment_score: f64,
    pub tweet_count: u32,
    #[serde(rename = "timestamp")]
    pub observed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<SentimentAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_amount: Option<f64>,
}
