use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};
use wb_schemas::{ParamValue, Params};

use crate::BidError;

/// One call's inputs: the reference date relative static args are resolved
/// against, and caller overrides (which win over everything else).
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    pub reference_date: NaiveDate,
    pub overrides: Params,
}

impl Invocation {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            overrides: Params::new(),
        }
    }

    pub fn with_override(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.overrides.insert(name.into(), value);
        self
    }

    /// Convert JSON overrides (HTTP body `args`). Null, arrays and objects are
    /// rejected with the offending name.
    pub fn with_json_overrides(mut self, args: &Map<String, Value>) -> Result<Self, BidError> {
        for (name, v) in args {
            let value = ParamValue::from_json(v).ok_or_else(|| BidError::InvalidArgument {
                name: name.clone(),
                reason: "expected a string, number or boolean".to_string(),
            })?;
            self.overrides.insert(name.clone(), value);
        }
        Ok(self)
    }

    /// Parse CLI-style `key=value` pairs.
    pub fn with_text_overrides<'a, I>(mut self, pairs: I) -> Result<Self, BidError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for pair in pairs {
            let (k, v) = pair.split_once('=').ok_or_else(|| BidError::InvalidArgument {
                name: pair.to_string(),
                reason: "expected key=value".to_string(),
            })?;
            let k = k.trim();
            if k.is_empty() {
                return Err(BidError::InvalidArgument {
                    name: pair.to_string(),
                    reason: "empty key".to_string(),
                });
            }
            self.overrides.insert(k.to_string(), parse_cli_value(v));
        }
        Ok(self)
    }
}

/// Command-line values carry no type, so numbers and booleans are sniffed
/// before falling back to date/text parsing.
fn parse_cli_value(raw: &str) -> ParamValue {
    let t = raw.trim();
    if let Ok(i) = t.parse::<i64>() {
        return ParamValue::Int(i);
    }
    if let Ok(f) = t.parse::<f64>() {
        if f.is_finite() {
            return ParamValue::Float(f);
        }
    }
    match t {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        _ => ParamValue::parse_text(raw),
    }
}

/// Where "today" comes from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReferenceClock {
    /// Current date in a market time zone.
    Zone(Tz),
    /// Pinned date (tests, replays).
    Fixed(NaiveDate),
}

impl ReferenceClock {
    pub fn in_zone(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Tz>()
            .map(ReferenceClock::Zone)
            .map_err(|_| anyhow!("CONFIG_INVALID: unknown timezone '{name}'"))
    }

    pub fn today(&self) -> NaiveDate {
        match self {
            ReferenceClock::Zone(tz) => Utc::now().with_timezone(tz).date_naive(),
            ReferenceClock::Fixed(d) => *d,
        }
    }

    pub fn invocation(&self) -> Invocation {
        Invocation::new(self.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
    }

    #[test]
    fn json_overrides_are_typed_and_bad_values_named() {
        let args = json!({"start_date": "2023-05-01", "seed": 7});
        let inv = Invocation::new(d())
            .with_json_overrides(args.as_object().unwrap())
            .unwrap();
        assert_eq!(
            inv.overrides["start_date"],
            ParamValue::Date(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap())
        );
        assert_eq!(inv.overrides["seed"], ParamValue::Int(7));

        let bad = json!({"window": [1, 2]});
        let err = Invocation::new(d())
            .with_json_overrides(bad.as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, BidError::InvalidArgument { ref name, .. } if name == "window"));
    }

    #[test]
    fn text_overrides_split_on_first_equals() {
        let inv = Invocation::new(d())
            .with_text_overrides([
                "note=a=b",
                "seed=3",
                "scale=0.5",
                "live=false",
                "day=2023-06-02",
            ])
            .unwrap();
        assert_eq!(inv.overrides["note"], ParamValue::Text("a=b".to_string()));
        assert_eq!(inv.overrides["seed"], ParamValue::Int(3));
        assert_eq!(inv.overrides["scale"], ParamValue::Float(0.5));
        assert_eq!(inv.overrides["live"], ParamValue::Bool(false));
        assert_eq!(
            inv.overrides["day"],
            ParamValue::Date(NaiveDate::from_ymd_opt(2023, 6, 2).unwrap())
        );

        assert!(Invocation::new(d()).with_text_overrides(["novalue"]).is_err());
        assert!(Invocation::new(d()).with_text_overrides(["=1"]).is_err());
    }

    #[test]
    fn clock_zones() {
        assert!(ReferenceClock::in_zone("Europe/London").is_ok());
        assert!(ReferenceClock::in_zone("Mars/Olympus").is_err());
        assert_eq!(ReferenceClock::Fixed(d()).invocation().reference_date, d());
    }
}
