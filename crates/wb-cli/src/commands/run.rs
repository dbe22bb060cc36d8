//! `wb run`: one live execution against Postgres and the auction endpoint.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use wb_config::{resolve_secrets, UnusedKeyPolicy};
use wb_db::PgDataSource;
use wb_strategy::{BidError, Invocation, ReferenceClock};
use wb_submit::{AuctionSubmitter, DryRunSink, OrderSink};

use super::{bid_failure, load_settings, parse_date, registry, select};

pub struct RunArgs {
    pub bidder: Option<String>,
    pub args: Vec<String>,
    pub reference_date: Option<String>,
    pub dry_run: bool,
    pub config_paths: Vec<String>,
}

pub async fn run_bidder(a: RunArgs) -> Result<()> {
    // Unused config keys are fatal only when orders would really be sent.
    let policy = if a.dry_run {
        UnusedKeyPolicy::Warn
    } else {
        UnusedKeyPolicy::Fail
    };
    let settings = load_settings(&a.config_paths, policy)?;
    let dry_run = a.dry_run || settings.auction.dry_run;
    let secrets = resolve_secrets(&settings, !dry_run)?;

    let db_url = secrets.database_url.as_deref().with_context(|| {
        format!(
            "SECRETS_MISSING: required env var '{}' (database url) is not set or empty",
            settings.database.url_env
        )
    })?;
    let source = PgDataSource::connect_lazy(db_url, settings.database.max_connections)?;

    let sink: Arc<dyn OrderSink> = match secrets.auction_key.as_deref() {
        Some(key) if !dry_run => Arc::new(
            AuctionSubmitter::new(
                settings.auction.endpoint(),
                key,
                Duration::from_secs(settings.auction.request_timeout_secs),
            )
            .context("build auction client")?,
        ),
        _ => Arc::new(DryRunSink::new()),
    };

    let reference = match a.reference_date.as_deref() {
        Some(raw) => parse_date("reference-date", raw)?,
        None => ReferenceClock::in_zone(&settings.bidding.timezone)?.today(),
    };
    let inv = Invocation::new(reference)
        .with_text_overrides(a.args.iter().map(String::as_str))
        .map_err(bid_failure)?;

    let reg = registry()?;
    let bidder = select(&reg, a.bidder.as_deref())?;

    let timeout = Duration::from_secs(settings.bidding.invocation_timeout_secs);
    let exec = tokio::time::timeout(timeout, bidder.execute(&source, sink.as_ref(), &inv))
        .await
        .map_err(|_| BidError::Timeout {
            secs: timeout.as_secs(),
        })
        .and_then(|r| r)
        .map_err(bid_failure)?;

    println!("bidder={}", exec.bidder);
    println!("reference_date={}", inv.reference_date);
    println!("dry_run={}", dry_run);
    println!("orders_submitted={}", exec.orders.len());
    println!("auction_status={}", exec.response.status);
    println!("auction_response={}", exec.response.body);
    if dry_run {
        println!("{}", serde_json::to_string_pretty(&exec.orders)?);
    }
    if !exec.response.is_success() {
        eprintln!(
            "WARN: auction answered HTTP {}; orders may not have been accepted",
            exec.response.status
        );
    }
    Ok(())
}
