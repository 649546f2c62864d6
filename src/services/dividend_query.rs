//! Read-through dividend lookup
//!
//! cache hit -> return
//! cache miss -> ledger query -> cache write -> store write -> (dispatch) -> return
//!
//! A cache hit short-circuits everything after it, including the analysis
//! dispatch. Only the ledger outcome can fail a request; cache, store and
//! dispatch failures are logged and absorbed. Concurrent misses for the same
//! pair each query the ledger, there is no request coalescing.

use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::models::dividends::DividendRecord;
use crate::services::ledger_client::{LedgerConnector, LedgerQueryFailed};
use crate::services::result_cache::ResultCache;
use crate::services::result_store::ResultStore;
use crate::services::task_dispatcher::{tasks, TaskDispatcher};

#[derive(Debug, Error)]
pub enum DividendQueryError {
    /// The ledger could not be queried (transport, decode or timeout)
    #[error("upstream ledger unavailable: {0}")]
    QueryFailed(#[source] LedgerQueryFailed),

    /// The ledger answered but holds no dividends for the pair
    #[error("No dividend data found")]
    NoData,
}

#[derive(Debug, Clone, Copy)]
pub struct QueryTimeouts {
    pub ledger: Duration,
    /// Cache, store, dispatch and connection close
    pub side_effect: Duration,
}

pub struct DividendQueryService {
    cache: Arc<dyn ResultCache>,
    ledger: Arc<dyn LedgerConnector>,
    store: Arc<dyn ResultStore>,
    dispatcher: Arc<dyn TaskDispatcher>,
    cache_ttl: Duration,
    timeouts: QueryTimeouts,
}

impl DividendQueryService {
    pub fn new(
        cache: Arc<dyn ResultCache>,
        ledger: Arc<dyn LedgerConnector>,
        store: Arc<dyn ResultStore>,
        dispatcher: Arc<dyn TaskDispatcher>,
        cache_ttl: Duration,
        timeouts: QueryTimeouts,
    ) -> Self {
        Self {
            cache,
            ledger,
            store,
            dispatcher,
            cache_ttl,
            timeouts,
        }
    }

    pub async fn handle(
        &self,
        netuid: u16,
        hotkey: &str,
        trigger_analysis: bool,
    ) -> Result<DividendRecord, DividendQueryError> {
        if let Some(cached) = self.cached(netuid, hotkey).await {
            debug!(netuid, hotkey = %hotkey, "Serving dividends from cache");
            return Ok(cached);
        }

        let dividends = self.query_ledger(netuid, hotkey).await?;
        let record = DividendRecord::fresh(netuid, hotkey, dividends);

        info!(
            netuid,
            hotkey = %hotkey,
            dividends = record.dividends,
            "Fetched TAO dividends from ledger"
        );

        self.write_through(&record).await;

        if trigger_analysis {
            self.dispatch_analysis(netuid, hotkey).await;
        }

        Ok(record)
    }

    /// Cache read. Unreachable or slow caches count as a miss.
    async fn cached(&self, netuid: u16, hotkey: &str) -> Option<DividendRecord> {
        match bounded(self.timeouts.side_effect, self.cache.get(netuid, hotkey)).await {
            Ok(Ok(hit)) => hit,
            Ok(Err(e)) => {
                warn!(netuid, hotkey = %hotkey, error = %e, "Cache read failed, treating as miss");
                None
            }
            Err(after) => {
                warn!(netuid, hotkey = %hotkey, "Cache read timed out after {:?}, treating as miss", after);
                None
            }
        }
    }

    /// One ledger query on a client owned by this request. The client is
    /// closed before returning, whatever the outcome.
    async fn query_ledger(&self, netuid: u16, hotkey: &str) -> Result<f64, DividendQueryError> {
        let mut client = self.ledger.client();

        let outcome = match timeout(self.timeouts.ledger, client.query_dividends(netuid, hotkey)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LedgerQueryFailed::timed_out(self.timeouts.ledger)),
        };

        if bounded(self.timeouts.side_effect, client.close()).await.is_err() {
            warn!(netuid, hotkey = %hotkey, "Ledger connection close timed out, dropping it");
        }

        match outcome {
            Ok(Some(dividends)) => Ok(dividends),
            Ok(None) => {
                debug!(netuid, hotkey = %hotkey, "Ledger holds no dividends for pair");
                Err(DividendQueryError::NoData)
            }
            Err(e) => {
                warn!(netuid, hotkey = %hotkey, error = %e, "Ledger query failed");
                Err(DividendQueryError::QueryFailed(e))
            }
        }
    }

    async fn write_through(&self, record: &DividendRecord) {
        let (netuid, hotkey) = (record.netuid, record.hotkey.as_str());

        match bounded(self.timeouts.side_effect, self.cache.put(record, self.cache_ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(netuid, hotkey = %hotkey, error = %e, "Failed to cache dividends"),
            Err(after) => warn!(netuid, hotkey = %hotkey, "Cache write timed out after {:?}", after),
        }

        match bounded(self.timeouts.side_effect, self.store.append_dividend(record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(netuid, hotkey = %hotkey, error = %e, "Failed to store dividends"),
            Err(after) => warn!(netuid, hotkey = %hotkey, "Store write timed out after {:?}", after),
        }
    }

    async fn dispatch_analysis(&self, netuid: u16, hotkey: &str) {
        let args = vec![json!(netuid), json!(hotkey)];

        match bounded(
            self.timeouts.side_effect,
            self.dispatcher.dispatch(tasks::ANALYZE_SENTIMENT, args),
        )
        .await
        {
            Ok(Ok(())) => debug!(netuid, hotkey = %hotkey, "Sentiment analysis dispatched"),
            Ok(Err(e)) => warn!(netuid, hotkey = %hotkey, error = %e, "Failed to dispatch sentiment analysis"),
            Err(after) => warn!(netuid, hotkey = %hotkey, "Sentiment analysis dispatch timed out after {:?}", after),
        }
    }
}

async fn bounded<F: Future>(limit: Duration, fut: F) -> Result<F::Output, Duration> {
    timeout(limit, fut).await.map_err(|_| limit)
}
