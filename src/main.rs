use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tao_dividends_backend::{
    config::Settings,
    handlers,
    jobs::task_worker::start_task_worker,
    services::{
        dividend_query::{DividendQueryService, QueryTimeouts},
        result_cache::MokaResultCache,
        result_store::SeaOrmResultStore,
        subtensor::SubtensorConnector,
        task_dispatcher::QueueDispatcher,
    },
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tao_dividends_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let settings = Settings::from_env().expect("Invalid configuration");

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&settings.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let db = Arc::new(db);
    let store = Arc::new(SeaOrmResultStore::new(db.clone()));
    let cache = Arc::new(MokaResultCache::new(settings.cache_max_capacity));
    let ledger = Arc::new(SubtensorConnector::new(settings.subtensor_endpoint.clone()));

    let (dispatcher, task_rx) = QueueDispatcher::new(settings.task_queue_capacity);
    let worker = start_task_worker(task_rx, store.clone());

    tracing::info!(
        "Subtensor endpoint {}, cache ttl {}s",
        ledger.endpoint(),
        settings.cache_ttl.as_secs()
    );

    let dividend_query = DividendQueryService::new(
        cache,
        ledger,
        store,
        Arc::new(dispatcher),
        settings.cache_ttl,
        QueryTimeouts {
            ledger: settings.ledger_timeout,
            side_effect: settings.side_effect_timeout,
        },
    );

    let state = AppState {
        dividend_query: Arc::new(dividend_query),
    };
    let app = handlers::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        "Server listening on {}",
        listener.local_addr().expect("Listener has no local address")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // The router (and with it the last dispatcher handle) is gone: let the
    // worker drain what is queued, then release the database
    tracing::info!("Draining task queue...");
    if let Err(e) = worker.await {
        tracing::error!("Task worker panicked: {}", e);
    }

    // Worker and router are gone, so this is the last handle
    match Arc::try_unwrap(db) {
        Ok(db) => {
            if let Err(e) = db.close().await {
                tracing::error!("Failed to close database connection: {}", e);
            }
        }
        Err(_) => tracing::warn!("Database connection still shared at shutdown, dropping it"),
    }
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
