//! In-process scenario tests for wb-daemon HTTP endpoints.
//!
//! The router is driven via `tower::ServiceExt::oneshot` without binding a
//! TCP socket. Data comes from a fixture source; orders go to a dry-run sink.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, NaiveDateTime};
use http_body_util::BodyExt;
use tower::ServiceExt; // oneshot
use wb_daemon::{routes, state::AppState};
use wb_db::{DataResolutionError, DataSource, DatasetRequest, FixtureDataSource};
use wb_schemas::{Dataset, Datasets, Params};
use wb_strategy::{builtin_registry, BidderRegistry, ReferenceClock};
use wb_submit::DryRunSink;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
}

/// Half-hourly samples for delivery day 2023-06-02 09:00 .. 2023-06-03 08:30.
fn stamps() -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2023, 6, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    (0..48)
        .map(|i| start + chrono::Duration::minutes(30 * i))
        .collect()
}

fn full_fixture() -> FixtureDataSource {
    FixtureDataSource::new()
        .with_dataset(
            "power",
            Dataset::from_series("net_power", stamps().into_iter().map(|t| (t, -750.0))),
        )
        .with_dataset(
            "price",
            Dataset::from_series("price", stamps().into_iter().map(|t| (t, 61.5))),
        )
        .with_dataset("energy", Dataset::default())
}

fn make_state(
    registry: BidderRegistry,
    source: Arc<dyn DataSource>,
    sink: Arc<DryRunSink>,
    timeout: Duration,
) -> Arc<AppState> {
    Arc::new(AppState::new(
        registry,
        source,
        sink,
        ReferenceClock::Fixed(reference()),
        timeout,
    ))
}

fn default_state(sink: Arc<DryRunSink>) -> Arc<AppState> {
    make_state(
        builtin_registry().unwrap(),
        Arc::new(full_fixture()),
        sink,
        Duration::from_secs(5),
    )
}

/// Drive the router with a single request and return (status, json).
async fn call(
    router: axum::Router,
    req: Request<axum::body::Body>,
) -> (StatusCode, serde_json::Value) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = serde_json::from_slice(&body).expect("body is not valid JSON");
    (status, json)
}

fn get(uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn post(uri: &str, body: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

/// Never answers within any sane timeout.
struct StalledSource;

#[async_trait::async_trait]
impl DataSource for StalledSource {
    fn source_name(&self) -> &'static str {
        "stalled"
    }

    async fn resolve(
        &self,
        _requests: &[DatasetRequest],
        _params: &Params,
    ) -> Result<Datasets, DataResolutionError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Datasets::new())
    }
}

// ---------------------------------------------------------------------------
// GET /v1/health, /v1/bid/list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let router = routes::build_router(default_state(Arc::new(DryRunSink::new())));
    let (status, json) = call(router, get("/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "wb-daemon");
}

#[tokio::test]
async fn bid_list_reports_registration_order_and_default() {
    let router = routes::build_router(default_state(Arc::new(DryRunSink::new())));
    let (status, json) = call(router, get("/v1/bid/list")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bidders"], serde_json::json!(["net-power", "random"]));
    assert_eq!(json["default"], "net-power");
}

#[tokio::test]
async fn bid_list_without_default_says_none() {
    let st = make_state(
        BidderRegistry::new(),
        Arc::new(FixtureDataSource::new()),
        Arc::new(DryRunSink::new()),
        Duration::from_secs(5),
    );
    let (status, json) = call(routes::build_router(st), get("/v1/bid/list")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bidders"], serde_json::json!([]));
    assert_eq!(json["default"], "none");
}

// ---------------------------------------------------------------------------
// POST /v1/bid/set
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bid_set_empty_body_runs_default_and_submits() {
    let sink = Arc::new(DryRunSink::new());
    let st = default_state(Arc::clone(&sink));

    let (status, json) = call(routes::build_router(Arc::clone(&st)), post("/v1/bid/set", "")).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["bidder"], "net-power");
    assert_eq!(json["fallback"], false);
    assert_eq!(json["orders_submitted"], 24);
    assert_eq!(json["auction_status"], 200);
    assert_eq!(json["auction_response"]["dry_run"], true);

    let submitted = sink.submitted();
    assert_eq!(submitted.len(), 1);
    // Negative net power: every hour buys 750 at 61.5.
    for r in submitted[0].rows() {
        assert_eq!(r.side.as_str(), "BUY");
        assert_eq!(r.volume, 750.0);
        assert_eq!(r.price, 61.5);
    }

    let (_, status_json) = call(routes::build_router(st), get("/v1/status")).await;
    assert_eq!(status_json["invocations"], 1);
    assert_eq!(status_json["last_run"]["outcome"], "OK");
    assert_eq!(status_json["last_run"]["orders_submitted"], 24);
    assert_eq!(status_json["data_source"], "fixture");
    assert_eq!(status_json["order_sink"], "dry-run");
}

#[tokio::test]
async fn bid_set_unknown_name_falls_back_to_default() {
    let sink = Arc::new(DryRunSink::new());
    let router = routes::build_router(default_state(Arc::clone(&sink)));
    let (status, json) = call(router, post("/v1/bid/set", r#"{"bidder":"C"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bidder"], "net-power");
    assert_eq!(json["fallback"], true);
    assert_eq!(sink.submitted().len(), 1);
}

#[tokio::test]
async fn bid_set_named_bidder_with_args() {
    let sink = Arc::new(DryRunSink::new());
    let router = routes::build_router(default_state(Arc::clone(&sink)));
    let (status, json) = call(
        router,
        post("/v1/bid/set", r#"{"bidder":"random","args":{"seed":11}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["bidder"], "random");
    assert_eq!(json["fallback"], false);
    assert_eq!(json["orders_submitted"], 24);
}

#[tokio::test]
async fn bid_set_without_default_is_404() {
    let sink = Arc::new(DryRunSink::new());
    let st = make_state(
        BidderRegistry::new(),
        Arc::new(full_fixture()),
        Arc::clone(&sink),
        Duration::from_secs(5),
    );
    let req = post("/v1/bid/set", r#"{"bidder":"C"}"#);
    let (status, json) = call(routes::build_router(st), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "NO_DEFAULT_BIDDER");
    assert!(sink.submitted().is_empty());
}

#[tokio::test]
async fn bid_set_missing_dataset_is_502_and_submits_nothing() {
    let sink = Arc::new(DryRunSink::new());
    let source = FixtureDataSource::new().with_dataset(
        "power",
        Dataset::from_series("net_power", stamps().into_iter().map(|t| (t, 1.0))),
    );
    let st = make_state(
        builtin_registry().unwrap(),
        Arc::new(source),
        Arc::clone(&sink),
        Duration::from_secs(5),
    );

    let req = post("/v1/bid/set", "{}");
    let (status, json) = call(routes::build_router(Arc::clone(&st)), req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["kind"], "DATA_RESOLUTION");
    assert!(json["error"].as_str().unwrap().contains("price"));
    assert!(sink.submitted().is_empty());

    let (_, status_json) = call(routes::build_router(st), get("/v1/status")).await;
    assert_eq!(status_json["last_run"]["outcome"], "DATA_RESOLUTION");
    assert_eq!(status_json["last_run"]["bidder"], "net-power");
}

#[tokio::test]
async fn bid_set_malformed_body_is_400() {
    let router = routes::build_router(default_state(Arc::new(DryRunSink::new())));
    let (status, json) = call(router, post("/v1/bid/set", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "BAD_REQUEST");

    let router = routes::build_router(default_state(Arc::new(DryRunSink::new())));
    let req = post("/v1/bid/set", r#"{"bidder":"random","extra":1}"#);
    let (status, json) = call(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "BAD_REQUEST");
}

#[tokio::test]
async fn bid_set_unusable_arg_is_400_invalid_argument() {
    let sink = Arc::new(DryRunSink::new());
    let router = routes::build_router(default_state(Arc::clone(&sink)));
    let req = post("/v1/bid/set", r#"{"args":{"start_date":[1,2]}}"#);
    let (status, json) = call(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "INVALID_ARGUMENT");
    assert!(json["error"].as_str().unwrap().contains("start_date"));
    assert!(sink.submitted().is_empty());
}

#[tokio::test]
async fn bid_set_over_timeout_is_504() {
    let sink = Arc::new(DryRunSink::new());
    let st = make_state(
        builtin_registry().unwrap(),
        Arc::new(StalledSource),
        Arc::clone(&sink),
        Duration::from_millis(50),
    );
    let (status, json) = call(routes::build_router(st), post("/v1/bid/set", "")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["kind"], "TIMEOUT");
    assert!(sink.submitted().is_empty());
}

#[tokio::test]
async fn bid_set_delivery_date_at_calendar_end_is_a_strategy_error() {
    let sink = Arc::new(DryRunSink::new());
    let st = default_state(Arc::clone(&sink));
    let body = serde_json::json!({
        "args": { "delivery_date": NaiveDate::MAX.format("%Y-%m-%d").to_string() }
    })
    .to_string();

    let req = post("/v1/bid/set", &body);
    let (status, json) = call(routes::build_router(Arc::clone(&st)), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["kind"], "STRATEGY");
    assert!(json["error"].as_str().unwrap().contains("delivery_date"));
    assert!(sink.submitted().is_empty());

    let (_, status_json) = call(routes::build_router(st), get("/v1/status")).await;
    assert_eq!(status_json["invocations"], 1);
    assert_eq!(status_json["last_run"]["outcome"], "STRATEGY");
}
