//! Default strategy: bid the forecast net power of each delivery hour.
//!
//! For the hour starting at `t`, both the `t:00` and `t:30` samples must exist
//! in both `power` and `price`. Otherwise the hour is left out of the order
//! set; nothing is interpolated or zero-filled.

use chrono::{Duration, NaiveDateTime};
use wb_schemas::{ArgValue, OrderFrame, OrderRow, OrderSide, Series};

use crate::{BidInput, BidderDescriptor, StrategyError};

pub const NAME: &str = "net-power";

pub const POWER_QUERY: &str = r#"SELECT time, (wind_power + solar_power - hq_power_demand) * 1000 AS net_power FROM power_prediction WHERE time > "{start_date}" AND time < "{end_date}""#;
pub const PRICE_QUERY: &str =
    r#"SELECT time, price FROM price_prediction WHERE time > "{start_date}" AND time < "{end_date}""#;

pub fn descriptor() -> BidderDescriptor {
    BidderDescriptor::new(NAME, net_power_strategy)
        .describe("net generation minus demand per delivery hour, priced at the forecast")
        // The delivery day runs to 08:30 on reference + 2, and dates bind as
        // midnight, so the exclusive upper bound has to be reference + 3.
        .arg("start_date", ArgValue::DaysFromReference(-1))
        .arg("end_date", ArgValue::DaysFromReference(3))
        .data("power", POWER_QUERY)
        .data("price", PRICE_QUERY)
        .default_bidder()
}

pub fn net_power_strategy(input: &BidInput) -> Result<OrderFrame, StrategyError> {
    let skeleton = input.template()?;
    let power = input.series("power", "net_power")?;
    let price = input.series("price", "price")?;

    let rows = net_power_orders(&skeleton, &power, &price);
    let dropped = skeleton.len() - rows.len();
    if dropped > 0 {
        tracing::debug!(dropped, "hours without complete half-hour samples left out");
    }
    Ok(OrderFrame::from_rows(&rows))
}

/// One order per skeleton row that has complete data, in skeleton order.
pub fn net_power_orders(skeleton: &[OrderRow], power: &Series, price: &Series) -> Vec<OrderRow> {
    skeleton
        .iter()
        .filter_map(|slot| {
            let start = hour_start(slot)?;
            let half = start + Duration::minutes(30);

            let p = (power.get(&start)? + power.get(&half)?) / 2.0;
            let c = (price.get(&start)? + price.get(&half)?) / 2.0;

            Some(OrderRow::new(
                slot.hour_id,
                slot.applying_date,
                p.abs(),
                c,
                OrderSide::from_net_power(p),
            ))
        })
        .collect()
}

fn hour_start(slot: &OrderRow) -> Option<NaiveDateTime> {
    slot.applying_date
        .and_hms_opt(u32::from(slot.hour_id).checked_sub(1)?, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wb_schemas::order_template;

    fn skeleton() -> Vec<OrderRow> {
        order_template(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()).unwrap()
    }

    /// All 48 half-hour samples the skeleton needs, with `f(start of hour, minute)`.
    fn full_series(f: impl Fn(&OrderRow, u32) -> f64) -> Series {
        let mut s = Series::new();
        for slot in skeleton() {
            let t = hour_start(&slot).unwrap();
            s.insert(t, f(&slot, 0));
            s.insert(t + Duration::minutes(30), f(&slot, 30));
        }
        s
    }

    #[test]
    fn averages_half_hours_and_signs_side() {
        // Odd hours import, even hours export.
        let power = full_series(|slot, m| {
            let base = if slot.hour_id % 2 == 1 { -100.0 } else { 100.0 };
            base + m as f64
        });
        let price = full_series(|_, m| 40.0 + m as f64 / 10.0);

        let rows = net_power_orders(&skeleton(), &power, &price);
        assert_eq!(rows.len(), 24);
        for r in &rows {
            assert!(r.volume >= 0.0);
            assert!((r.price - 41.5).abs() < 1e-9);
            if r.hour_id % 2 == 1 {
                assert_eq!(r.side, OrderSide::Buy);
                assert!((r.volume - 85.0).abs() < 1e-9);
            } else {
                assert_eq!(r.side, OrderSide::Sell);
                assert!((r.volume - 115.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn zero_average_sells() {
        let power = full_series(|_, m| if m == 0 { -5.0 } else { 5.0 });
        let price = full_series(|_, _| 1.0);
        let rows = net_power_orders(&skeleton(), &power, &price);
        assert!(rows.iter().all(|r| r.side == OrderSide::Sell && r.volume == 0.0));
    }

    #[test]
    fn missing_half_hour_drops_only_that_hour() {
        let power = full_series(|_, _| 10.0);
        let mut price = full_series(|_, _| 50.0);
        // hour_ID 1 on 2023-06-02 starts at 00:00.
        let gone = NaiveDate::from_ymd_opt(2023, 6, 2)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap();
        assert!(price.remove(&gone).is_some());

        let rows = net_power_orders(&skeleton(), &power, &price);
        assert_eq!(rows.len(), 23);
        assert!(rows.iter().all(|r| r.hour_id != 1));
        assert!(rows.iter().all(|r| r.volume == 10.0 && r.price == 50.0));
    }

    #[test]
    fn missing_power_sample_drops_hour() {
        let mut power = full_series(|_, _| 10.0);
        let price = full_series(|_, _| 50.0);
        let t = NaiveDate::from_ymd_opt(2023, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        power.remove(&t);

        let rows = net_power_orders(&skeleton(), &power, &price);
        assert_eq!(rows.len(), 23);
        assert!(rows.iter().all(|r| r.hour_id != 10));
    }

    #[test]
    fn no_data_means_no_orders() {
        let rows = net_power_orders(&skeleton(), &Series::new(), &Series::new());
        assert!(rows.is_empty());
    }

    #[test]
    fn query_window_covers_every_delivery_half_hour() {
        let reference = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let d = descriptor();
        let bound = |name: &str| {
            d.static_args[name]
                .resolve(reference)
                .and_then(|v| v.as_date())
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .unwrap()
        };
        let (start, end) = (bound("start_date"), bound("end_date"));

        for slot in skeleton() {
            let t = hour_start(&slot).unwrap();
            for sample in [t, t + Duration::minutes(30)] {
                assert!(start < sample && sample < end, "{sample} outside {start}..{end}");
            }
        }
    }

    #[test]
    fn descriptor_declares_default_and_relative_window() {
        let d = descriptor();
        assert!(d.is_default);
        assert_eq!(d.static_args["start_date"], ArgValue::DaysFromReference(-1));
        assert_eq!(d.static_args["end_date"], ArgValue::DaysFromReference(3));
        let names: Vec<&str> = d.data_requirements.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["power", "price"]);
    }
}
