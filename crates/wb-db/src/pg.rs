use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo};
use wb_schemas::{Dataset, Datasets, ParamValue, Params, TIME_COLUMN};

use crate::{compile, parse_timestamp, BoundQuery, DataResolutionError, DataSource, DatasetRequest};

pub const ENV_DB_URL: &str = "WB_DATABASE_URL";

/// Query Resolver backed by the forecast tables in Postgres.
#[derive(Debug, Clone)]
pub struct PgDataSource {
    pool: PgPool,
}

impl PgDataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool without connecting. The first invocation opens the first
    /// connection, so a process can start while the database is down.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy(url)
            .context("invalid Postgres connection url")?;
        Ok(Self { pool })
    }
}

/// Connect to Postgres using WB_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

#[async_trait::async_trait]
impl DataSource for PgDataSource {
    fn source_name(&self) -> &'static str {
        "postgres"
    }

    async fn resolve(
        &self,
        requests: &[DatasetRequest],
        params: &Params,
    ) -> Result<Datasets, DataResolutionError> {
        // Compile everything first: a bad template should not cost a connection.
        let mut compiled: Vec<(&str, BoundQuery)> = Vec::with_capacity(requests.len());
        for req in requests {
            let bound = compile(&req.template, params)
                .map_err(|e| DataResolutionError::from_template(&req.name, e))?;
            compiled.push((req.name.as_str(), bound));
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| DataResolutionError::Connection {
                message: e.to_string(),
            })?;

        let mut out = Datasets::new();
        for (name, bound) in compiled {
            let mut q = sqlx::query(&bound.sql);
            for v in &bound.binds {
                q = match v {
                    ParamValue::Date(d) => q.bind(*d),
                    ParamValue::DateTime(t) => q.bind(*t),
                    ParamValue::Text(s) => q.bind(s.as_str()),
                    ParamValue::Int(i) => q.bind(*i),
                    ParamValue::Float(f) => q.bind(*f),
                    ParamValue::Bool(b) => q.bind(*b),
                };
            }

            let rows = q
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| DataResolutionError::Query {
                    dataset: name.to_string(),
                    message: e.to_string(),
                })?;

            let ds = decode_rows(name, &rows)?;
            tracing::debug!(dataset = name, rows = ds.len(), "dataset resolved");
            out.insert(name.to_string(), ds);
        }

        Ok(out)
    }
}

fn decode_rows(dataset: &str, rows: &[PgRow]) -> Result<Dataset, DataResolutionError> {
    let Some(first) = rows.first() else {
        return Ok(Dataset::default());
    };

    let columns = first.columns();
    let time_idx = columns
        .iter()
        .position(|c| c.name() == TIME_COLUMN)
        .ok_or_else(|| decode_err(dataset, TIME_COLUMN, "result has no time column"))?;

    let value_cols: Vec<(usize, String, String)> = columns
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(i, c)| (i, c.name().to_string(), c.type_info().name().to_string()))
        .collect();
    let time_type = columns[time_idx].type_info().name().to_string();

    let mut ds = Dataset::new(value_cols.iter().map(|(_, name, _)| name.clone()));
    for row in rows {
        let time = decode_time(dataset, row, time_idx, &time_type)?;
        let mut values = Vec::with_capacity(value_cols.len());
        for (i, name, ty) in &value_cols {
            values.push(decode_number(dataset, row, *i, name, ty)?);
        }
        ds.push_row(time, values);
    }
    ds.sort_by_time();
    Ok(ds)
}

fn decode_time(
    dataset: &str,
    row: &PgRow,
    idx: usize,
    ty: &str,
) -> Result<NaiveDateTime, DataResolutionError> {
    let err = |m: String| decode_err(dataset, TIME_COLUMN, &m);
    let t = match ty {
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)
            .map_err(|e| err(e.to_string()))?,
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)
            .map_err(|e| err(e.to_string()))?
            .map(|t| t.naive_utc()),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)
            .map_err(|e| err(e.to_string()))?
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        "TEXT" | "VARCHAR" | "BPCHAR" => {
            let raw = row
                .try_get::<Option<String>, _>(idx)
                .map_err(|e| err(e.to_string()))?;
            match raw {
                Some(s) => Some(
                    parse_timestamp(&s)
                        .ok_or_else(|| err(format!("unparseable timestamp '{s}'")))?,
                ),
                None => None,
            }
        }
        other => return Err(err(format!("unsupported type {other}"))),
    };
    t.ok_or_else(|| err("null time".to_string()))
}

fn decode_number(
    dataset: &str,
    row: &PgRow,
    idx: usize,
    column: &str,
    ty: &str,
) -> Result<Option<f64>, DataResolutionError> {
    let err = |m: String| decode_err(dataset, column, &m);
    let v = match ty {
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)
            .map_err(|e| err(e.to_string()))?,
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)
            .map_err(|e| err(e.to_string()))?
            .map(f64::from),
        "INT8" => row
            .try_get::<Option<i64>, _>(idx)
            .map_err(|e| err(e.to_string()))?
            .map(|v| v as f64),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)
            .map_err(|e| err(e.to_string()))?
            .map(f64::from),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)
            .map_err(|e| err(e.to_string()))?
            .map(f64::from),
        "TEXT" | "VARCHAR" => match row
            .try_get::<Option<String>, _>(idx)
            .map_err(|e| err(e.to_string()))?
        {
            Some(s) => Some(
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| err(format!("not numeric: '{s}'")))?,
            ),
            None => None,
        },
        "NUMERIC" => {
            return Err(err(
                "NUMERIC is not decoded; cast to float8 or text in the query".to_string(),
            ));
        }
        other => return Err(err(format!("unsupported type {other}"))),
    };
    Ok(v)
}

fn decode_err(dataset: &str, column: &str, message: &str) -> DataResolutionError {
    DataResolutionError::Decode {
        dataset: dataset.to_string(),
        column: column.to_string(),
        message: message.to_string(),
    }
}
