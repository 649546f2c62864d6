#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

use tao_dividends_backend::{
    models::{dividends::DividendRecord, sentiment::SentimentRecord},
    services::{
        dividend_query::{DividendQueryService, QueryTimeouts},
        ledger_client::{rao_to_tao, LedgerConnector, LedgerQueryFailed, RemoteLedgerClient},
        result_cache::{CacheUnavailable, MokaResultCache, ResultCache},
        result_store::{PersistenceFailure, ResultStore},
        task_dispatcher::{DispatchFailure, TaskDispatcher},
    },
};

pub const HOTKEY: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

/// What every client handed out by [`FakeLedger`] answers
#[derive(Debug, Clone, Copy)]
pub enum LedgerBehavior {
    Rao(u64),
    Absent,
    Fail,
    Hang,
}

#[derive(Default)]
pub struct LedgerCounters {
    pub clients: AtomicUsize,
    pub queries: AtomicUsize,
    pub closes: AtomicUsize,
}

pub struct FakeLedger {
    behavior: Mutex<LedgerBehavior>,
    barrier: Option<Arc<Barrier>>,
    pub counters: Arc<LedgerCounters>,
}

impl FakeLedger {
    pub fn new(behavior: LedgerBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            barrier: None,
            counters: Arc::new(LedgerCounters::default()),
        })
    }

    /// Queries only answer once `parties` of them are in flight together.
    pub fn gated(behavior: LedgerBehavior, parties: usize) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            barrier: Some(Arc::new(Barrier::new(parties))),
            counters: Arc::new(LedgerCounters::default()),
        })
    }

    pub fn set_behavior(&self, behavior: LedgerBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn queries(&self) -> usize {
        self.counters.queries.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    pub fn clients(&self) -> usize {
        self.counters.clients.load(Ordering::SeqCst)
    }
}

impl LedgerConnector for FakeLedger {
    fn client(&self) -> Box<dyn RemoteLedgerClient> {
        self.counters.clients.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeLedgerClient {
            behavior: *self.behavior.lock().unwrap(),
            barrier: self.barrier.clone(),
            counters: self.counters.clone(),
        })
    }
}

struct FakeLedgerClient {
    behavior: LedgerBehavior,
    barrier: Option<Arc<Barrier>>,
    counters: Arc<LedgerCounters>,
}

#[async_trait]
impl RemoteLedgerClient for FakeLedgerClient {
    async fn query_dividends(
        &mut self,
        _netuid: u16,
        _hotkey: &str,
    ) -> Result<Option<f64>, LedgerQueryFailed> {
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        match self.behavior {
            LedgerBehavior::Rao(rao) => Ok(Some(rao_to_tao(rao))),
            LedgerBehavior::Absent => Ok(None),
            LedgerBehavior::Fail => Err(LedgerQueryFailed::new("malformed response")),
            LedgerBehavior::Hang => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Moka cache that counts reads and writes.
pub struct CountingCache {
    inner: MokaResultCache,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub hang: bool,
}

impl CountingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MokaResultCache::new(1_000),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            hang: false,
        })
    }

    /// Every get and put is counted, then never completes.
    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            inner: MokaResultCache::new(1_000),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            hang: true,
        })
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultCache for CountingCache {
    async fn get(&self, netuid: u16, hotkey: &str) -> Result<Option<DividendRecord>, CacheUnavailable> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.inner.get(netuid, hotkey).await
    }

    async fn put(&self, record: &DividendRecord, ttl: Duration) -> Result<(), CacheUnavailable> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.inner.put(record, ttl).await
    }
}

/// A cache whose backend is never reachable.
pub struct UnreachableCache {
    pub puts: AtomicUsize,
}

impl UnreachableCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            puts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ResultCache for UnreachableCache {
    async fn get(&self, _netuid: u16, _hotkey: &str) -> Result<Option<DividendRecord>, CacheUnavailable> {
        Err(CacheUnavailable("connection refused".to_string()))
    }

    async fn put(&self, _record: &DividendRecord, _ttl: Duration) -> Result<(), CacheUnavailable> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(CacheUnavailable("connection refused".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingStore {
    pub dividends: Mutex<Vec<DividendRecord>>,
    pub sentiment: Mutex<Vec<SentimentRecord>>,
    pub fail: bool,
    pub hang: bool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Default::default()
        })
    }

    pub fn dividend_writes(&self) -> usize {
        self.dividends.lock().unwrap().len()
    }
}

#[async_trait]
impl ResultStore for RecordingStore {
    async fn append_dividend(&self, record: &DividendRecord) -> Result<(), PersistenceFailure> {
        self.dividends.lock().unwrap().push(record.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(sea_orm::DbErr::Custom("disk full".to_string()).into());
        }
        Ok(())
    }

    async fn append_sentiment(&self, record: &SentimentRecord) -> Result<(), PersistenceFailure> {
        self.sentiment.lock().unwrap().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDispatcher {
    pub calls: Mutex<Vec<(String, Vec<Value>)>>,
    pub fail: bool,
    pub hang: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskDispatcher for RecordingDispatcher {
    async fn dispatch(&self, name: &str, args: Vec<Value>) -> Result<(), DispatchFailure> {
        self.calls.lock().unwrap().push((name.to_string(), args));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(DispatchFailure::QueueClosed(name.to_string()));
        }
        Ok(())
    }
}

pub fn test_timeouts() -> QueryTimeouts {
    QueryTimeouts {
        ledger: Duration::from_millis(100),
        side_effect: Duration::from_millis(100),
    }
}

pub struct Harness {
    pub service: Arc<DividendQueryService>,
    pub ledger: Arc<FakeLedger>,
    pub cache: Arc<CountingCache>,
    pub store: Arc<RecordingStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl Harness {
    pub fn new(behavior: LedgerBehavior) -> Self {
        Self::with(FakeLedger::new(behavior), RecordingStore::new(), RecordingDispatcher::new())
    }

    pub fn with(
        ledger: Arc<FakeLedger>,
        store: Arc<RecordingStore>,
        dispatcher: Arc<RecordingDispatcher>,
    ) -> Self {
        let cache = CountingCache::new();
        let service = DividendQueryService::new(
            cache.clone(),
            ledger.clone(),
            store.clone(),
            dispatcher.clone(),
            Duration::from_secs(120),
            test_timeouts(),
        );

        Self {
            service: Arc::new(service),
            ledger,
            cache,
            store,
            dispatcher,
        }
    }
}
