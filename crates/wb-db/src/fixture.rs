//! In-memory data source and CSV dataset loading.
//!
//! Serves pre-built datasets by name. Templates are still compiled against the
//! invocation parameters, so undefined or malformed placeholders fail exactly
//! as they would against Postgres, and every compiled query is recorded.
//!
//! ## CSV contract
//!
//! | Column   | Example               | Notes                                   |
//! |----------|-----------------------|-----------------------------------------|
//! | `time`   | `2023-06-01 09:30:00` | Required. See [`parse_timestamp`].      |
//! | any other| `1234.5`              | Parsed as f64; empty cell is a null.    |

use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use wb_schemas::{Dataset, Datasets, Params, TIME_COLUMN};

use crate::{compile, BoundQuery, DataResolutionError, DataSource, DatasetRequest};

#[derive(Debug, Default)]
pub struct FixtureDataSource {
    datasets: Datasets,
    seen: Mutex<Vec<(String, BoundQuery)>>,
}

impl FixtureDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, name: impl Into<String>, dataset: Dataset) -> Self {
        self.insert(name, dataset);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) {
        self.datasets.insert(name.into(), dataset);
    }

    /// `(dataset, compiled query)` for every request served so far.
    pub fn seen_queries(&self) -> Vec<(String, BoundQuery)> {
        match self.seen.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait::async_trait]
impl DataSource for FixtureDataSource {
    fn source_name(&self) -> &'static str {
        "fixture"
    }

    async fn resolve(
        &self,
        requests: &[DatasetRequest],
        params: &Params,
    ) -> Result<Datasets, DataResolutionError> {
        let mut out = Datasets::new();
        for req in requests {
            let bound = compile(&req.template, params)
                .map_err(|e| DataResolutionError::from_template(&req.name, e))?;

            match self.seen.lock() {
                Ok(mut g) => g.push((req.name.clone(), bound)),
                Err(poisoned) => poisoned.into_inner().push((req.name.clone(), bound)),
            }

            let ds = self
                .datasets
                .get(&req.name)
                .cloned()
                .ok_or_else(|| DataResolutionError::MissingDataset {
                    dataset: req.name.clone(),
                })?;
            out.insert(req.name.clone(), ds);
        }
        Ok(out)
    }
}

/// Load a dataset from a CSV file with a `time` column.
pub fn load_csv_dataset(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("open csv path failed: {}", path.display()))?;
    read_csv_dataset(file).with_context(|| format!("parse csv failed: {}", path.display()))
}

pub fn read_csv_dataset<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().context("csv header read failed")?.clone();

    let time_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(TIME_COLUMN))
        .ok_or_else(|| anyhow!("csv missing required header column: '{TIME_COLUMN}'"))?;

    let value_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut ds = Dataset::new(value_cols.iter().map(|(_, name)| name.clone()));
    for (n, rec) in rdr.records().enumerate() {
        // +2: header line, then 1-based numbering.
        let line = n + 2;
        let rec = rec.with_context(|| format!("csv line {line}: unreadable record"))?;

        let raw_time = rec.get(time_idx).unwrap_or_default();
        let time = parse_timestamp(raw_time)
            .ok_or_else(|| anyhow!("csv line {line}: cannot parse time from '{raw_time}'"))?;

        let mut values = Vec::with_capacity(value_cols.len());
        for (i, name) in &value_cols {
            let raw = rec.get(*i).unwrap_or_default().trim();
            if raw.is_empty() {
                values.push(None);
                continue;
            }
            match raw.parse::<f64>() {
                Ok(v) => values.push(Some(v)),
                Err(_) => bail!("csv line {line}: column '{name}' is not numeric: '{raw}'"),
            }
        }
        ds.push_row(time, values);
    }
    ds.sort_by_time();
    Ok(ds)
}

/// Accepts `YYYY-MM-DD HH:MM[:SS]`, the `T`-separated forms, RFC 3339
/// (converted to UTC) and bare dates (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let t = s.trim();
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
