// src/lib.rs

use std::sync::Arc;

use services::dividend_query::DividendQueryService;

#[derive(Clone)]
pub struct AppState {
    pub dividend_query: Arc<DividendQueryService>,
}

pub mod entities {
    pub mod prelude;
    pub mod dividends;
    pub mod sentiment;
}

pub mod services {
    pub mod ledger_client;
    pub mod storage_keys;
    pub mod subtensor;
    pub mod result_cache;
    pub mod result_store;
    pub mod task_dispatcher;
    pub mod dividend_query;
}

pub mod jobs {
    pub mod task_worker;
}

pub mod config;
pub mod models;
pub mod handlers;
