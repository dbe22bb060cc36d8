//! Runtime secret resolution.
//!
//! Config YAML stores only env var NAMES (`auction.key_env`,
//! `database.url_env`). Binaries call [`resolve_secrets`] once at startup and
//! pass the result into constructors. `Debug` redacts values and error
//! messages name the variable, never its contents.

use anyhow::{bail, Result};

use crate::BidSettings;

/// Secrets for one process. Values are redacted in `Debug` output.
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Auction API key. `None` if the named env var was absent or empty.
    pub auction_key: Option<String>,
    /// Postgres connection URL. `None` if the named env var was absent or empty.
    pub database_url: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("auction_key", &self.auction_key.as_ref().map(|_| "<REDACTED>"))
            .field("database_url", &self.database_url.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Returns `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve secrets named by `settings`.
///
/// With `require_auction_key` (i.e. a live submission path) a missing key is an
/// error naming `auction.key_env`. The database URL is resolved but not
/// required here; callers that open a pool bail at startup when it is absent.
pub fn resolve_secrets(
    settings: &BidSettings,
    require_auction_key: bool,
) -> Result<ResolvedSecrets> {
    let key_var = settings.auction.key_env.trim();
    let auction_key = resolve_env(key_var);

    if require_auction_key && auction_key.is_none() {
        bail!(
            "SECRETS_MISSING: required env var '{}' (auction key) is not set or empty",
            key_var
        );
    }

    Ok(ResolvedSecrets {
        auction_key,
        database_url: resolve_env(settings.database.url_env.trim()),
    })
}
