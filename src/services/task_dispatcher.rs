//! Fire-and-forget submission of named background tasks.
//!
//! The dispatcher's job ends once a task is enqueued. Nothing here waits for,
//! or can observe, the task's outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

pub mod tasks {
    pub const ANALYZE_SENTIMENT: &str = "analyze_sentiment";
}

#[derive(Debug, Error)]
pub enum DispatchFailure {
    #[error("task queue is full, dropped {0}")]
    QueueFull(String),

    #[error("task queue is closed, dropped {0}")]
    QueueClosed(String),
}

/// A task handed to the execution substrate: name plus positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskMessage {
    pub name: String,
    pub args: Vec<Value>,
    pub enqueued_at: DateTime<Utc>,
}

#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    async fn dispatch(&self, name: &str, args: Vec<Value>) -> Result<(), DispatchFailure>;
}

/// Enqueues onto a bounded in-process queue drained by `jobs::task_worker`.
#[derive(Clone)]
pub struct QueueDispatcher {
    tx: mpsc::Sender<TaskMessage>,
}

impl QueueDispatcher {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TaskMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl TaskDispatcher for QueueDispatcher {
    async fn dispatch(&self, name: &str, args: Vec<Value>) -> Result<(), DispatchFailure> {
        let message = TaskMessage {
            name: name.to_string(),
            args,
            enqueued_at: Utc::now(),
        };

        // Never waits for queue space
        match self.tx.try_send(message) {
            Ok(()) => {
                tracing::debug!("Enqueued task {}", name);
                Ok(())
            }
            Err(TrySendError::Full(message)) => Err(DispatchFailure::QueueFull(message.name)),
            Err(TrySendError::Closed(message)) => Err(DispatchFailure::QueueClosed(message.name)),
        }
    }
}
