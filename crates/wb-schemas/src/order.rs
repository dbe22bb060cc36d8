use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{validate_order_frame, OrderFrame, SchemaValidationError};

/// Column names every order row must carry, in wire order.
pub const ORDER_COLUMNS: [&str; 5] = ["hour_ID", "applying_date", "volume", "price", "type"];

/// Maximum rows in one trading day's order set.
pub const HOURS_PER_DAY: usize = 24;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(OrderSide::Buy),
            "SELL" => Some(OrderSide::Sell),
            _ => None,
        }
    }

    /// Side implied by a net-power reading: exporting sells, importing buys.
    pub fn from_net_power(net_power_w: f64) -> Self {
        if net_power_w < 0.0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hourly order as the auction endpoint expects it.
///
/// Field order here is the wire order; serde serializes structs in declaration
/// order so the JSON payload keeps `hour_ID, applying_date, volume, price, type`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    /// 1..=24
    #[serde(rename = "hour_ID")]
    pub hour_id: u8,
    /// ISO-8601 date (`YYYY-MM-DD`) the hour belongs to.
    pub applying_date: NaiveDate,
    /// Energy volume, always >= 0. Direction is carried by `side`.
    pub volume: f64,
    pub price: f64,
    #[serde(rename = "type")]
    pub side: OrderSide,
}

impl OrderRow {
    pub fn new(
        hour_id: u8,
        applying_date: NaiveDate,
        volume: f64,
        price: f64,
        side: OrderSide,
    ) -> Self {
        debug_assert!((1..=24).contains(&hour_id), "hour_id must be 1..=24");
        Self {
            hour_id,
            applying_date,
            volume,
            price,
            side,
        }
    }

    /// Signed quantity: positive exports (SELL), negative imports (BUY).
    pub fn signed_quantity(&self) -> f64 {
        match self.side {
            OrderSide::Sell => self.volume,
            OrderSide::Buy => -self.volume,
        }
    }
}

/// Price/quantity view of one order, keyed by hour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourQuote {
    #[serde(rename = "hour_ID")]
    pub hour_id: u8,
    pub quantity: f64,
    pub price: f64,
}

/// Validated orders for one trading day (at most 24 rows, template order).
///
/// Serializes as a plain array of rows. Deserializing runs the same checks as
/// [`crate::validate_order_frame`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<OrderRow>", try_from = "Vec<OrderRow>")]
pub struct OrderSet {
    rows: Vec<OrderRow>,
}

impl TryFrom<Vec<OrderRow>> for OrderSet {
    type Error = SchemaValidationError;

    fn try_from(rows: Vec<OrderRow>) -> Result<Self, Self::Error> {
        validate_order_frame(&OrderFrame::from_rows(&rows))
    }
}

impl From<OrderSet> for Vec<OrderRow> {
    fn from(set: OrderSet) -> Self {
        set.rows
    }
}

impl OrderSet {
    /// Build an order set from rows that already passed validation.
    /// Use [`crate::validate_order_frame`] for untrusted strategy output.
    pub fn from_validated(rows: Vec<OrderRow>) -> Self {
        debug_assert!(rows.len() <= HOURS_PER_DAY);
        Self { rows }
    }

    pub fn rows(&self) -> &[OrderRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn quotes(&self) -> Vec<HourQuote> {
        self.rows
            .iter()
            .map(|r| HourQuote {
                hour_id: r.hour_id,
                quantity: r.signed_quantity(),
                price: r.price,
            })
            .collect()
    }
}
