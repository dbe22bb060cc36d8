//! Invocation parameters.
//!
//! Parameters feed two places: query-template placeholders and the strategy
//! function. Values are typed so query binding never goes through string
//! formatting.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Built-in parameter: the date bids are placed on.
pub const PARAM_REFERENCE_DATE: &str = "reference_date";
/// Built-in parameter: the date handed to the order template.
pub const PARAM_DELIVERY_DATE: &str = "delivery_date";

/// Resolved parameter set for one invocation, keyed by name.
pub type Params = BTreeMap<String, ParamValue>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ParamValue::Date(d) => Some(*d),
            ParamValue::DateTime(t) => Some(t.date()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a caller-supplied JSON override.
    ///
    /// Strings that parse as ISO dates / date-times become typed values;
    /// anything else stays text. Arrays, objects and null are rejected.
    pub fn from_json(v: &Value) -> Option<Self> {
        match v {
            Value::Bool(b) => Some(ParamValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(ParamValue::Int(i)),
                None => n.as_f64().map(ParamValue::Float),
            },
            Value::String(s) => Some(Self::parse_text(s)),
            _ => None,
        }
    }

    /// Interpret a raw string (CLI `key=value`, JSON string) as the most
    /// specific parameter type it matches.
    pub fn parse_text(s: &str) -> Self {
        let t = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
            return ParamValue::Date(d);
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
                return ParamValue::DateTime(dt);
            }
        }
        ParamValue::Text(s.to_string())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ParamValue::DateTime(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S")),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A static argument declared at registration time.
///
/// Relative dates are resolved per invocation so a long-running process does
/// not freeze "today" at startup.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Fixed(ParamValue),
    /// `reference_date + n` days (n may be negative).
    DaysFromReference(i64),
}

impl ArgValue {
    pub fn resolve(&self, reference: NaiveDate) -> Option<ParamValue> {
        match self {
            ArgValue::Fixed(v) => Some(v.clone()),
            ArgValue::DaysFromReference(n) => {
                let shifted = if *n >= 0 {
                    reference.checked_add_days(Days::new(n.unsigned_abs()))
                } else {
                    reference.checked_sub_days(Days::new(n.unsigned_abs()))
                };
                shifted.map(ParamValue::Date)
            }
        }
    }
}

impl From<ParamValue> for ArgValue {
    fn from(v: ParamValue) -> Self {
        ArgValue::Fixed(v)
    }
}
