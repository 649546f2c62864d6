mod common;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use tao_dividends_backend::{handlers, AppState};

use crate::common::{Harness, LedgerBehavior, HOTKEY};

fn build_test_router(h: &Harness) -> Router {
    handlers::router(AppState {
        dividend_query: h.service.clone(),
    })
}

fn dividends_request(query: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/v1/tao_dividends?{}", query))
        .header(AUTHORIZATION, "Bearer test_token")
        .body(Body::empty())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_root_endpoint() {
    let h = Harness::new(LedgerBehavior::Absent);

    let (status, json) = send(
        build_test_router(&h),
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Welcome to Tao Dividends API");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let h = Harness::new(LedgerBehavior::Rao(1_000_000_000));

    let request = Request::builder()
        .uri(format!("/api/v1/tao_dividends?netuid=1&hotkey={}", HOTKEY))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(build_test_router(&h), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Not authenticated");
    assert_eq!(h.ledger.queries(), 0);
}

#[tokio::test]
async fn test_fresh_then_cached_response() {
    let h = Harness::new(LedgerBehavior::Rao(1_000_000_000));
    let query = format!("netuid=1&hotkey={}&trade=true", HOTKEY);

    let (status, first) = send(build_test_router(&h), dividends_request(&query)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["netuid"], 1);
    assert_eq!(first["hotkey"], HOTKEY);
    assert_eq!(first["dividends"], 1.0);
    assert_eq!(first["cached"], false);
    assert!(first["timestamp"].is_string());

    let (status, second) = send(build_test_router(&h), dividends_request(&query)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["dividends"], 1.0);
    assert_eq!(second["timestamp"], first["timestamp"]);

    assert_eq!(h.store.dividend_writes(), 1);
    assert_eq!(h.dispatcher.calls().len(), 1);
}

#[tokio::test]
async fn test_no_data_is_not_found() {
    let h = Harness::new(LedgerBehavior::Absent);

    let (status, json) = send(
        build_test_router(&h),
        dividends_request("netuid=1&hotkey=test"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "No dividend data found");
}

#[tokio::test]
async fn test_ledger_failure_is_service_unavailable() {
    let h = Harness::new(LedgerBehavior::Fail);

    let (status, json) = send(
        build_test_router(&h),
        dividends_request(&format!("netuid=1&hotkey={}", HOTKEY)),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(json["error"].is_string());
    assert_eq!(h.ledger.closes(), 1);
}

#[tokio::test]
async fn test_invalid_netuid_is_bad_request() {
    let h = Harness::new(LedgerBehavior::Rao(1));

    let (status, _) = send(
        build_test_router(&h),
        dividends_request(&format!("netuid=-1&hotkey={}", HOTKEY)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(h.ledger.queries(), 0);
}

#[tokio::test]
async fn test_trade_defaults_to_false() {
    let h = Harness::new(LedgerBehavior::Rao(1_000_000_000));

    let (status, _) = send(
        build_test_router(&h),
        dividends_request(&format!("netuid=1&hotkey={}", HOTKEY)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(h.dispatcher.calls().is_empty());
}
