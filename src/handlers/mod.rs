pub mod auth;
pub mod dividends;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dividends::root))
        .route("/api/v1/tao_dividends", get(dividends::get_tao_dividends))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
