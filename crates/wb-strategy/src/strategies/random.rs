//! Random bidder: uniform volume and price, coin-flip side.
//!
//! Used for smoke-testing the auction link. Pass `seed` (integer) to make a
//! run reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wb_schemas::{ArgValue, OrderFrame, OrderRow, OrderSide, ParamValue};

use crate::{BidInput, BidderDescriptor, StrategyError};

pub const NAME: &str = "random";

pub const ENERGY_QUERY: &str =
    r#"SELECT time FROM energy_onsite WHERE time > "{start_date}" AND time < "{end_date}""#;

const VOLUME_RANGE: std::ops::Range<f64> = 50.0..150.0;
const PRICE_RANGE: std::ops::Range<f64> = 50.0..150.0;

pub fn descriptor() -> BidderDescriptor {
    BidderDescriptor::new(NAME, random_strategy)
        .describe("uniform random volume and price per hour")
        .arg("start_date", ArgValue::DaysFromReference(-1))
        .arg("end_date", ArgValue::DaysFromReference(1))
        .data("energy", ENERGY_QUERY)
}

pub fn random_strategy(input: &BidInput) -> Result<OrderFrame, StrategyError> {
    let skeleton = input.template()?;
    let seed = match input.param("seed") {
        None => rand::random::<u64>(),
        Some(v) => seed_from_param(v)?,
    };
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(OrderFrame::from_rows(&random_orders(&skeleton, &mut rng)))
}

pub fn random_orders<R: Rng>(skeleton: &[OrderRow], rng: &mut R) -> Vec<OrderRow> {
    skeleton
        .iter()
        .map(|slot| {
            let side = if rng.random_bool(0.5) {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            };
            OrderRow::new(
                slot.hour_id,
                slot.applying_date,
                rng.random_range(VOLUME_RANGE),
                rng.random_range(PRICE_RANGE),
                side,
            )
        })
        .collect()
}

fn seed_from_param(v: &ParamValue) -> Result<u64, StrategyError> {
    let parsed = match v {
        ParamValue::Int(i) => Some(*i),
        ParamValue::Text(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(|i| i as u64)
        .ok_or_else(|| StrategyError::InvalidParameter {
            name: "seed".to_string(),
            reason: format!("expected an integer, got '{v}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wb_schemas::{validate_order_frame, Params, PARAM_DELIVERY_DATE};

    fn input(seed: Option<ParamValue>) -> BidInput {
        let mut params = Params::new();
        params.insert(
            PARAM_DELIVERY_DATE.to_string(),
            ParamValue::Date(NaiveDate::from_ymd_opt(2023, 6, 2).unwrap()),
        );
        if let Some(s) = seed {
            params.insert("seed".to_string(), s);
        }
        BidInput::new(Default::default(), params)
    }

    #[test]
    fn full_day_within_ranges() {
        let frame = random_strategy(&input(None)).unwrap();
        let orders = validate_order_frame(&frame).unwrap();
        assert_eq!(orders.len(), 24);
        for r in orders.rows() {
            assert!(VOLUME_RANGE.contains(&r.volume));
            assert!(PRICE_RANGE.contains(&r.price));
        }
    }

    #[test]
    fn same_seed_same_orders() {
        let a = random_strategy(&input(Some(ParamValue::Int(42)))).unwrap();
        let b = random_strategy(&input(Some(ParamValue::Text("42".into())))).unwrap();
        assert_eq!(a, b);

        let c = random_strategy(&input(Some(ParamValue::Int(43)))).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn non_integer_seed_rejected() {
        let err = random_strategy(&input(Some(ParamValue::Bool(true)))).unwrap_err();
        assert!(matches!(err, StrategyError::InvalidParameter { ref name, .. } if name == "seed"));
    }
}
