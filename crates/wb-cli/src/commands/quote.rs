//! `wb quote`: run a bidder offline over forecast CSV exports and print the
//! signed quantity and price per hour. Nothing is submitted.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Days;
use wb_db::{load_csv_dataset, FixtureDataSource};
use wb_schemas::Dataset;
use wb_strategy::forecast::net_power_from_forecasts;
use wb_strategy::Invocation;

use super::{bid_failure, parse_date, registry, select};

pub struct QuoteArgs {
    pub date: String,
    pub solar: String,
    pub wind: String,
    pub demand: String,
    pub price: String,
    pub bidder: Option<String>,
    pub args: Vec<String>,
}

pub async fn quote(a: QuoteArgs) -> Result<()> {
    let delivery = parse_date("date", &a.date)?;
    let reference = delivery
        .checked_sub_days(Days::new(1))
        .context("--date out of range")?;

    let solar = load_csv_dataset(Path::new(&a.solar))?;
    let wind = load_csv_dataset(Path::new(&a.wind))?;
    let demand = load_csv_dataset(Path::new(&a.demand))?;
    let price = load_csv_dataset(Path::new(&a.price))?;

    let power = net_power_from_forecasts(&solar, &wind, &demand)
        .map_err(|e| anyhow::anyhow!("STRATEGY: forecast files: {e}"))?;

    // Every dataset a built-in bidder may declare; the random bidder's
    // `energy` table has no offline counterpart.
    let source = FixtureDataSource::new()
        .with_dataset("power", power)
        .with_dataset("price", price)
        .with_dataset("energy", Dataset::default());

    let inv = Invocation::new(reference)
        .with_text_overrides(a.args.iter().map(String::as_str))
        .map_err(bid_failure)?;

    let reg = registry()?;
    let bidder = select(&reg, a.bidder.as_deref())?;
    let prepared = bidder.prepare(&source, &inv).await.map_err(bid_failure)?;

    println!("hour_ID,quantity,price");
    for q in prepared.orders.quotes() {
        println!("{},{},{}", q.hour_id, q.quantity, q.price);
    }
    Ok(())
}
