//! Shared runtime state for wb-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The registry is built
//! before the router and never mutated afterwards; only the run log is
//! written at request time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use wb_db::DataSource;
use wb_strategy::{BidderRegistry, ReferenceClock};
use wb_submit::OrderSink;

use crate::api_types::RunRecord;

/// Static build metadata included in health responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Clone, Debug, Default)]
pub struct RunLog {
    pub invocations: u64,
    pub last: Option<RunRecord>,
}

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub registry: Arc<BidderRegistry>,
    pub source: Arc<dyn DataSource>,
    pub sink: Arc<dyn OrderSink>,
    /// Supplies the reference date for each invocation.
    pub clock: ReferenceClock,
    /// Upper bound on one `POST /v1/bid/set` execution.
    pub invocation_timeout: Duration,
    pub runs: Arc<RwLock<RunLog>>,
}

impl AppState {
    pub fn new(
        registry: BidderRegistry,
        source: Arc<dyn DataSource>,
        sink: Arc<dyn OrderSink>,
        clock: ReferenceClock,
        invocation_timeout: Duration,
    ) -> Self {
        Self {
            build: BuildInfo {
                service: "wb-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            registry: Arc::new(registry),
            source,
            sink,
            clock,
            invocation_timeout,
            runs: Arc::new(RwLock::new(RunLog::default())),
        }
    }

    pub async fn record(&self, run: RunRecord) {
        let mut log = self.runs.write().await;
        log.invocations += 1;
        log.last = Some(run);
    }
}

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}
