//! Command handler modules for wb-cli.
//!
//! Shared helpers and the small read-only commands live here.

pub mod quote;
pub mod run;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use wb_config::{load_layered_yaml, report_unused_keys, BidSettings, UnusedKeyPolicy};
use wb_schemas::order_template;
use wb_strategy::{builtin_registry, BidError, Bidder, BidderRegistry};

pub fn parse_date(flag: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --{flag} '{raw}'. expected YYYY-MM-DD"))
}

/// Settings from layered config. No paths means all defaults.
pub fn load_settings(config_paths: &[String], policy: UnusedKeyPolicy) -> Result<BidSettings> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;

    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        eprintln!(
            "WARN: CONFIG_UNUSED_KEYS unused_leaf_keys={}",
            report.unused_leaf_pointers.len()
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            eprintln!("  unused={}", p);
        }
    }
    tracing::debug!(config_hash = %loaded.config_hash, "config loaded");
    loaded.settings()
}

pub fn registry() -> Result<BidderRegistry> {
    builtin_registry().context("register built-in bidders")
}

/// Lookup with the fallback made visible to the operator.
pub fn select<'a>(reg: &'a BidderRegistry, name: Option<&str>) -> Result<&'a Bidder> {
    let found = reg.lookup(name).map_err(|e| bid_failure(e.into()))?;
    if found.fallback {
        eprintln!(
            "WARN: bidder '{}' not registered; using default '{}'",
            name.unwrap_or_default(),
            found.bidder.name()
        );
    }
    Ok(found.bidder)
}

/// Surface a pipeline failure with its stable code first.
pub fn bid_failure(e: BidError) -> anyhow::Error {
    anyhow::anyhow!("{}: {}", e.kind(), e)
}

// ---------------------------------------------------------------------------
// wb list
// ---------------------------------------------------------------------------

pub fn list() -> Result<()> {
    let reg = registry()?;
    for b in reg.bidders() {
        let datasets: Vec<&str> = b.data_requirements().iter().map(|r| r.name.as_str()).collect();
        println!(
            "bidder={} default={} datasets={} description={}",
            b.name(),
            b.is_default(),
            datasets.join(","),
            b.description()
        );
    }
    println!("default={}", reg.default_name().unwrap_or("none"));
    Ok(())
}

// ---------------------------------------------------------------------------
// wb template
// ---------------------------------------------------------------------------

pub fn template(date: &str) -> Result<()> {
    let dt = parse_date("date", date)?;
    let rows = order_template(dt).with_context(|| format!("--date {dt} is out of range"))?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
