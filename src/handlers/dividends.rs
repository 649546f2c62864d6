use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    handlers::auth::CallerIdentity,
    models::{
        dividends::{DividendRecord, TaoDividendsQuery, WelcomeResponse},
        ErrorResponse,
    },
    services::dividend_query::DividendQueryError,
    AppState,
};

/// Handler for GET /
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to Tao Dividends API".to_string(),
    })
}

/// Handler for GET /api/v1/tao_dividends
/// Returns cached dividends when fresh, otherwise queries the ledger
pub async fn get_tao_dividends(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<TaoDividendsQuery>,
) -> Result<Json<DividendRecord>, (StatusCode, Json<ErrorResponse>)> {
    tracing::debug!(
        "Dividends request netuid={} hotkey={} trade={} (caller token {} chars)",
        query.netuid,
        query.hotkey,
        query.trade,
        caller.0.len()
    );

    match state
        .dividend_query
        .handle(query.netuid, &query.hotkey, query.trade)
        .await
    {
        Ok(record) => Ok(Json(record)),
        Err(DividendQueryError::NoData) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No dividend data found".to_string(),
            }),
        )),
        Err(DividendQueryError::QueryFailed(e)) => {
            tracing::error!("Ledger unavailable for netuid {}: {}", query.netuid, e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Upstream ledger unavailable".to_string(),
                }),
            ))
        }
    }
}
