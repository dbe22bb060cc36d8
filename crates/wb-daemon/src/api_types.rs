//! Request and response types for the wb-daemon HTTP endpoints.
//!
//! No business logic lives here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /v1/bid/list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidListResponse {
    /// Registration order.
    pub bidders: Vec<String>,
    /// Default bidder name, or `"none"`.
    pub default: String,
}

// ---------------------------------------------------------------------------
// /v1/bid/set
// ---------------------------------------------------------------------------

/// Body of `POST /v1/bid/set`. The whole body is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BidSetRequest {
    /// Omitted, empty, or `"default"` selects the default bidder.
    #[serde(default)]
    pub bidder: Option<String>,
    /// Parameter overrides; win over static args and built-ins.
    #[serde(default)]
    pub args: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidSetResponse {
    pub invocation_id: Uuid,
    pub bidder: String,
    /// True when the requested name was not registered and the default ran.
    pub fallback: bool,
    pub orders_submitted: usize,
    /// HTTP status the auction answered with (passed through, even non-2xx).
    pub auction_status: u16,
    pub auction_response: Value,
}

/// Structured failure body. `kind` is a stable code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<Uuid>,
    pub error: String,
    pub kind: String,
}

// ---------------------------------------------------------------------------
// /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub daemon_uptime_secs: u64,
    pub data_source: String,
    pub order_sink: String,
    pub invocations: u64,
    pub last_run: Option<RunRecord>,
}

/// Outcome of the most recent `POST /v1/bid/set`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub invocation_id: Uuid,
    pub bidder: Option<String>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    /// `"OK"` or the failure kind.
    pub outcome: String,
    pub orders_submitted: usize,
    pub auction_status: Option<u16>,
}
