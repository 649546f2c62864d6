//! Background consumer of the task queue fed by `QueueDispatcher`.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::sentiment::SentimentRecord;
use crate::services::result_store::ResultStore;
use crate::services::task_dispatcher::{tasks, TaskMessage};

/// Runs queued tasks one at a time until every dispatcher handle is dropped.
pub fn start_task_worker(
    mut rx: mpsc::Receiver<TaskMessage>,
    store: Arc<dyn ResultStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Task worker started");

        while let Some(message) = rx.recv().await {
            let waited = Utc::now().signed_duration_since(message.enqueued_at);
            tracing::debug!(
                "Running task {} (queued {}ms)",
                message.name,
                waited.num_milliseconds()
            );

            if let Err(e) = run_task(&message, store.as_ref()).await {
                tracing::error!("Task {} failed: {}", message.name, e);
            }
        }

        tracing::info!("Task queue closed, task worker stopped");
    })
}

async fn run_task(
    message: &TaskMessage,
    store: &dyn ResultStore,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match message.name.as_str() {
        tasks::ANALYZE_SENTIMENT => {
            let (netuid, hotkey) = parse_subnet_args(&message.args)?;
            let record = analyze_sentiment(netuid, hotkey);
            store.append_sentiment(&record).await?;
            tracing::info!(
                "Sentiment for netuid {} hotkey {}: score {} over {} tweets",
                record.netuid,
                record.hotkey,
                record.sentiment_score,
                record.tweet_count
            );
            Ok(())
        }
        other => Err(format!("Unknown task: {}", other).into()),
    }
}

fn parse_subnet_args(args: &[Value]) -> Result<(u16, &str), String> {
    match args {
        [netuid, Value::String(hotkey)] => {
            let netuid = netuid
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .ok_or_else(|| format!("Invalid netuid argument: {}", netuid))?;
            Ok((netuid, hotkey.as_str()))
        }
        _ => Err(format!("Expected (netuid, hotkey) arguments, got {:?}", args)),
    }
}

/// Tweet retrieval and scoring happen outside this service; until a scorer is
/// wired in, every run records a neutral analysis with no stake action.
fn analyze_sentiment(netuid: u16, hotkey: &str) -> SentimentRecord {
    SentimentRecord {
        netuid,
        hotkey: hotkey.to_string(),
        sentiment_score: 0.0,
        tweet_count: 0,
        observed_at: Utc::now(),
        action_taken: None,
        action_amount: None,
    }
}
