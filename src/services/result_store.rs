//! Append-only persistence of dividend reads and sentiment analyses.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set};
use std::sync::Arc;
use thiserror::Error;

use crate::entities::{dividends, prelude::*, sentiment};
use crate::models::{dividends::DividendRecord, sentiment::SentimentRecord};

#[derive(Debug, Error)]
pub enum PersistenceFailure {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn append_dividend(&self, record: &DividendRecord) -> Result<(), PersistenceFailure>;

    async fn append_sentiment(&self, record: &SentimentRecord) -> Result<(), PersistenceFailure>;
}

/// Shares the connection with the process so it can be closed on shutdown.
pub struct SeaOrmResultStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmResultStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultStore for SeaOrmResultStore {
    async fn append_dividend(&self, record: &DividendRecord) -> Result<(), PersistenceFailure> {
        let row = dividends::ActiveModel {
            netuid: Set(record.netuid as i32),
            hotkey: Set(record.hotkey.clone()),
            dividends: Set(record.dividends),
            observed_at: Set(record.observed_at.into()),
            ..Default::default()
        };

        Dividends::insert(row).exec_without_returning(self.db.as_ref()).await?;

        tracing::debug!(
            "Stored dividends for netuid {} hotkey {}",
            record.netuid,
            record.hotkey
        );
        Ok(())
    }

    async fn append_sentiment(&self, record: &SentimentRecord) -> Result<(), PersistenceFailure> {
        let row = sentiment::ActiveModel {
            netuid: Set(record.netuid as i32),
            hotkey: Set(record.hotkey.clone()),
            sentiment_score: Set(record.sentiment_score),
            tweet_count: Set(record.tweet_count as i64),
            observed_at: Set(record.observed_at.into()),
            action_taken: Set(record.action_taken.map(|a| a.as_str().to_string())),
            action_amount: Set(record.action_amount),
            ..Default::default()
        };

        Sentiment::insert(row).exec_without_returning(self.db.as_ref()).await?;

        tracing::debug!(
            "Stored sentiment for netuid {} hotkey {}",
            record.netuid,
            record.hotkey
        );
        Ok(())
    }
}
