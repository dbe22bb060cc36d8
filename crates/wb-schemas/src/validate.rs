use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::{OrderFrame, OrderRow, OrderSet, OrderSide, HOURS_PER_DAY, ORDER_COLUMNS};

/// Strategy output does not satisfy the order row contract.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("missing column: {column}")]
    MissingColumn { column: String },
    #[error("invalid value in column '{column}' at row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },
    #[error("order set has {rows} rows; at most {max} allowed")]
    TooManyRows { rows: usize, max: usize },
}

/// Check `frame` against the order row schema and convert it to an [`OrderSet`].
///
/// Order of checks: declared columns (first missing wins, in wire order),
/// row count, then each row's cells. Extra columns are ignored.
pub fn validate_order_frame(frame: &OrderFrame) -> Result<OrderSet, SchemaValidationError> {
    for col in ORDER_COLUMNS {
        if !frame.has_column(col) {
            return Err(SchemaValidationError::MissingColumn {
                column: col.to_string(),
            });
        }
    }

    if frame.len() > HOURS_PER_DAY {
        return Err(SchemaValidationError::TooManyRows {
            rows: frame.len(),
            max: HOURS_PER_DAY,
        });
    }

    let mut seen: HashSet<(NaiveDate, u8)> = HashSet::with_capacity(frame.len());
    let mut rows = Vec::with_capacity(frame.len());

    for (i, rec) in frame.rows().iter().enumerate() {
        let hour_id = cell(rec, "hour_ID", i)?
            .as_u64()
            .filter(|h| (1..=24).contains(h))
            .ok_or_else(|| invalid("hour_ID", i, "expected an integer in 1..=24"))?
            as u8;

        let applying_date = cell(rec, "applying_date", i)?
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| invalid("applying_date", i, "expected an ISO-8601 date (YYYY-MM-DD)"))?;

        let volume = cell(rec, "volume", i)?
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| invalid("volume", i, "expected a finite number >= 0"))?;

        let price = cell(rec, "price", i)?
            .as_f64()
            .filter(|p| p.is_finite())
            .ok_or_else(|| invalid("price", i, "expected a finite number"))?;

        let side = cell(rec, "type", i)?
            .as_str()
            .and_then(OrderSide::parse)
            .ok_or_else(|| invalid("type", i, "expected BUY or SELL"))?;

        if !seen.insert((applying_date, hour_id)) {
            return Err(invalid(
                "hour_ID",
                i,
                &format!("duplicate order for hour {hour_id} on {applying_date}"),
            ));
        }

        rows.push(OrderRow::new(hour_id, applying_date, volume, price, side));
    }

    Ok(OrderSet::from_validated(rows))
}

fn cell<'a>(
    rec: &'a Map<String, Value>,
    column: &str,
    row: usize,
) -> Result<&'a Value, SchemaValidationError> {
    rec.get(column)
        .filter(|v| !v.is_null())
        .ok_or_else(|| invalid(column, row, "value is missing"))
}

fn invalid(column: &str, row: usize, reason: &str) -> SchemaValidationError {
    SchemaValidationError::InvalidValue {
        column: column.to_string(),
        row,
        reason: reason.to_string(),
    }
}
