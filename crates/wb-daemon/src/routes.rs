//! Axum router and all HTTP handlers for wb-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Tests compose the bare router directly.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;
use wb_strategy::{BidError, RegistryError};

use crate::{
    api_types::{
        BidListResponse, BidSetRequest, BidSetResponse, ErrorResponse, HealthResponse, RunRecord,
        StatusResponse,
    },
    state::{uptime_secs, AppState},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/bid/list", get(bid_list))
        .route("/v1/bid/set", post(bid_set))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let log = st.runs.read().await.clone();
    (
        StatusCode::OK,
        Json(StatusResponse {
            daemon_uptime_secs: uptime_secs(),
            data_source: st.source.source_name().to_string(),
            order_sink: st.sink.sink_name().to_string(),
            invocations: log.invocations,
            last_run: log.last,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/bid/list
// ---------------------------------------------------------------------------

pub(crate) async fn bid_list(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(BidListResponse {
            bidders: st.registry.list().into_iter().map(str::to_string).collect(),
            default: st.registry.default_name().unwrap_or("none").to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/bid/set
// ---------------------------------------------------------------------------

/// Run one bidder end to end.
///
/// The body is optional; an empty body runs the default bidder with no
/// overrides. Nothing is retried. A non-2xx auction answer is still a 200
/// here: the auction's status and body are passed through.
pub(crate) async fn bid_set(State(st): State<Arc<AppState>>, body: Bytes) -> Response {
    let invocation_id = Uuid::new_v4();

    let req = match parse_bid_set(&body) {
        Ok(r) => r,
        Err(msg) => {
            warn!(%invocation_id, error = %msg, "bid/set: malformed body");
            return error_response(StatusCode::BAD_REQUEST, invocation_id, msg, "BAD_REQUEST");
        }
    };

    let mut bidder = None;
    let result = execute_request(&st, invocation_id, &req, &mut bidder).await;

    match result {
        Ok(resp) => {
            info!(
                %invocation_id,
                bidder = %resp.bidder,
                orders = resp.orders_submitted,
                auction_status = resp.auction_status,
                "bid/set done"
            );
            st.record(RunRecord {
                invocation_id,
                bidder: Some(resp.bidder.clone()),
                finished_at: chrono::Utc::now(),
                outcome: "OK".to_string(),
                orders_submitted: resp.orders_submitted,
                auction_status: Some(resp.auction_status),
            })
            .await;
            (StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => {
            warn!(%invocation_id, bidder = ?bidder, kind = e.kind(), error = %e, "bid/set failed");
            st.record(RunRecord {
                invocation_id,
                bidder,
                finished_at: chrono::Utc::now(),
                outcome: e.kind().to_string(),
                orders_submitted: 0,
                auction_status: None,
            })
            .await;
            error_response(status_for(&e), invocation_id, e.to_string(), e.kind())
        }
    }
}

async fn execute_request(
    st: &AppState,
    invocation_id: Uuid,
    req: &BidSetRequest,
    ran: &mut Option<String>,
) -> Result<BidSetResponse, BidError> {
    let found = st.registry.lookup(req.bidder.as_deref())?;
    let bidder = found.bidder;
    *ran = Some(bidder.name().to_string());

    let inv = st.clock.invocation().with_json_overrides(&req.args)?;
    info!(
        %invocation_id,
        bidder = bidder.name(),
        fallback = found.fallback,
        reference_date = %inv.reference_date,
        "bid/set"
    );

    let secs = st.invocation_timeout.as_secs();
    let exec = tokio::time::timeout(
        st.invocation_timeout,
        bidder.execute(st.source.as_ref(), st.sink.as_ref(), &inv),
    )
    .await
    .map_err(|_| BidError::Timeout { secs })??;

    Ok(BidSetResponse {
        invocation_id,
        bidder: exec.bidder,
        fallback: found.fallback,
        orders_submitted: exec.orders.len(),
        auction_status: exec.response.status,
        auction_response: exec.response.body,
    })
}

/// Empty body and JSON `null` both mean "no request fields".
fn parse_bid_set(body: &[u8]) -> Result<BidSetRequest, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BidSetRequest::default());
    }
    let v: Value = serde_json::from_slice(body).map_err(|e| format!("invalid JSON body: {e}"))?;
    if v.is_null() {
        return Ok(BidSetRequest::default());
    }
    serde_json::from_value(v).map_err(|e| format!("invalid request: {e}"))
}

fn status_for(e: &BidError) -> StatusCode {
    match e {
        BidError::Registry(RegistryError::NoDefaultBidder { .. }) => StatusCode::NOT_FOUND,
        BidError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        BidError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
        BidError::DataResolution(_) | BidError::Submission(_) => StatusCode::BAD_GATEWAY,
        BidError::Strategy { .. } | BidError::SchemaValidation(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        BidError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn error_response(status: StatusCode, invocation_id: Uuid, error: String, kind: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            invocation_id: Some(invocation_id),
            error,
            kind: kind.to_string(),
        }),
    )
        .into_response()
}
