//! wb-submit
//!
//! Order Submitter: serializes a validated [`OrderSet`] and hands it to the
//! auction. The response is passed through untouched; a non-2xx status is
//! data for the caller, not an error. Only transport failures are errors.

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wb_schemas::OrderSet;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("auction request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("http client setup failed: {message}")]
    Client { message: String },
}

/// What the auction answered. `body` is the parsed JSON when the response was
/// JSON, otherwise the raw text as a JSON string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub status: u16,
    pub body: Value,
}

impl SubmissionResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request body of the auction endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionPayload {
    pub key: String,
    pub orders: OrderSet,
}

impl std::fmt::Debug for AuctionPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctionPayload")
            .field("key", &"<REDACTED>")
            .field("orders", &self.orders)
            .finish()
    }
}

/// Final pipeline stage. One call, one attempt: no retries.
#[async_trait::async_trait]
pub trait OrderSink: Send + Sync {
    fn sink_name(&self) -> &'static str;

    async fn submit(&self, orders: &OrderSet) -> Result<SubmissionResponse, SubmissionError>;
}

/// POSTs `{key, orders}` to the auction service.
#[derive(Clone)]
pub struct AuctionSubmitter {
    http: reqwest::Client,
    endpoint: String,
    key: String,
}

impl std::fmt::Debug for AuctionSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctionSubmitter")
            .field("endpoint", &self.endpoint)
            .field("key", &"<REDACTED>")
            .finish()
    }
}

impl AuctionSubmitter {
    pub fn new(
        endpoint: impl Into<String>,
        key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SubmissionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmissionError::Client {
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            key: key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl OrderSink for AuctionSubmitter {
    fn sink_name(&self) -> &'static str {
        "auction"
    }

    async fn submit(&self, orders: &OrderSet) -> Result<SubmissionResponse, SubmissionError> {
        let payload = AuctionPayload {
            key: self.key.clone(),
            orders: orders.clone(),
        };
        let transport = |e: reqwest::Error| SubmissionError::Transport {
            endpoint: self.endpoint.clone(),
            message: e.to_string(),
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(transport)?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        tracing::info!(
            endpoint = %self.endpoint,
            orders = orders.len(),
            status,
            "orders submitted"
        );
        if !(200..300).contains(&status) {
            tracing::warn!(status, "auction answered with a non-success status");
        }

        Ok(SubmissionResponse { status, body })
    }
}

/// Sink that never touches the network. Keeps every order set it is given.
#[derive(Debug, Default)]
pub struct DryRunSink {
    submitted: Mutex<Vec<OrderSet>>,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<OrderSet> {
        match self.submitted.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait::async_trait]
impl OrderSink for DryRunSink {
    fn sink_name(&self) -> &'static str {
        "dry-run"
    }

    async fn submit(&self, orders: &OrderSet) -> Result<SubmissionResponse, SubmissionError> {
        match self.submitted.lock() {
            Ok(mut g) => g.push(orders.clone()),
            Err(poisoned) => poisoned.into_inner().push(orders.clone()),
        }
        tracing::info!(orders = orders.len(), "dry run: orders not sent");
        Ok(SubmissionResponse {
            status: 200,
            body: serde_json::json!({ "dry_run": true, "orders": orders.len() }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_debug_redacts_key() {
        let p = AuctionPayload {
            key: "hunter2-auction-key".to_string(),
            orders: OrderSet::default(),
        };
        let s = format!("{p:?}");
        assert!(!s.contains("hunter2"), "{s}");
        assert!(s.contains("REDACTED"));
    }

    #[test]
    fn submitter_debug_redacts_key() {
        let s = AuctionSubmitter::new(
            "http://x/auction",
            "hunter2-auction-key",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!format!("{s:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn dry_run_sink_records_and_acknowledges() {
        let sink = DryRunSink::new();
        let resp = sink.submit(&OrderSet::default()).await.unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.body["dry_run"], true);
        assert_eq!(sink.submitted().len(), 1);
    }
}
