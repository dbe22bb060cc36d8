use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Env var that overrides `daemon.addr` at runtime.
pub const ENV_DAEMON_ADDR: &str = "WB_DAEMON_ADDR";

/// Typed view over the merged config document.
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BidSettings {
    pub daemon: DaemonSettings,
    pub database: DatabaseSettings,
    pub auction: AuctionSettings,
    pub bidding: BiddingSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    pub addr: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8899".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// NAME of the env var holding the Postgres URL.
    pub url_env: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url_env: "WB_DATABASE_URL".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionSettings {
    /// Scheme + host (+ port) of the auction service.
    pub base_url: String,
    pub path: String,
    /// NAME of the env var holding the auction API key.
    pub key_env: String,
    pub request_timeout_secs: u64,
    /// Build and validate orders but never POST them.
    pub dry_run: bool,
}

impl Default for AuctionSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            path: "/auction/bidding/set".to_string(),
            key_env: "WB_AUCTION_KEY".to_string(),
            request_timeout_secs: 30,
            dry_run: false,
        }
    }
}

impl AuctionSettings {
    /// Full submission URL. Tolerates a trailing slash on `base_url` and a
    /// missing leading slash on `path`.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiddingSettings {
    /// Upper bound on resolve + strategy + validate + submit for one call.
    pub invocation_timeout_secs: u64,
    /// IANA zone used to decide "today" for the reference date.
    pub timezone: String,
}

impl Default for BiddingSettings {
    fn default() -> Self {
        Self {
            invocation_timeout_secs: 60,
            timezone: "Europe/London".to_string(),
        }
    }
}

impl BidSettings {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: settings shape mismatch")
    }

    /// Daemon bind address, honouring [`ENV_DAEMON_ADDR`] when set.
    pub fn daemon_addr(&self) -> String {
        match std::env::var(ENV_DAEMON_ADDR) {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => self.daemon.addr.clone(),
        }
    }
}
