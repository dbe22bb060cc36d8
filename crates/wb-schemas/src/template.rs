//! Order template skeleton for one trading day.
//!
//! The market accepts bids for the 24 hours starting 09:00 on the delivery
//! date and running to 09:00 the next morning. Bids are placed the day before
//! the delivery date, so orders always apply at least one full day ahead.

use chrono::{Days, NaiveDate};

use crate::{OrderRow, OrderSide, HOURS_PER_DAY};

/// First hour-of-day slot covered by the template.
const FIRST_SLOT: u32 = 9;

/// Delivery date for bids placed on `reference`. `None` past the end of the
/// calendar.
pub fn delivery_date_for(reference: NaiveDate) -> Option<NaiveDate> {
    reference.checked_add_days(Days::new(1))
}

/// Build the empty 24-row skeleton for delivery date `dt`.
///
/// Slots 9..=32 map to `hour_ID = (slot % 24) + 1`; slots past 23 wrap into
/// the next calendar day. Every row starts at volume 0, price 0, side BUY.
/// `None` when the wrapped hours would fall past the end of the calendar.
pub fn order_template(dt: NaiveDate) -> Option<Vec<OrderRow>> {
    let next_day = delivery_date_for(dt)?;
    let rows = (FIRST_SLOT..FIRST_SLOT + HOURS_PER_DAY as u32)
        .map(|slot| {
            let applying_date = if slot > 23 { next_day } else { dt };
            let hour_id = (slot % 24) as u8 + 1;
            OrderRow::new(hour_id, applying_date, 0.0, 0.0, OrderSide::Buy)
        })
        .collect();
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn template_has_24_rows_covering_each_hour_once() {
        let rows = order_template(d("2023-06-01")).unwrap();
        assert_eq!(rows.len(), 24);
        let hours: BTreeSet<u8> = rows.iter().map(|r| r.hour_id).collect();
        assert_eq!(hours, (1..=24).collect::<BTreeSet<u8>>());
    }

    #[test]
    fn template_wraps_early_hours_into_next_day() {
        let rows = order_template(d("2023-06-01")).unwrap();

        let h10 = rows.iter().find(|r| r.hour_id == 10).unwrap();
        assert_eq!(h10.applying_date, d("2023-06-01"));

        let h1 = rows.iter().find(|r| r.hour_id == 1).unwrap();
        assert_eq!(h1.applying_date, d("2023-06-02"));

        for r in &rows {
            let expect = if r.hour_id >= 10 { d("2023-06-01") } else { d("2023-06-02") };
            assert_eq!(r.applying_date, expect, "hour_ID {}", r.hour_id);
        }
    }

    #[test]
    fn template_starts_at_hour_10_and_ends_at_hour_9() {
        let rows = order_template(d("2024-02-28")).unwrap();
        assert_eq!(rows.first().unwrap().hour_id, 10);
        assert_eq!(rows.last().unwrap().hour_id, 9);
        assert_eq!(rows.last().unwrap().applying_date, d("2024-02-29"));
    }

    #[test]
    fn template_rows_are_zeroed_buys() {
        for r in order_template(d("2023-12-31")).unwrap() {
            assert_eq!(r.volume, 0.0);
            assert_eq!(r.price, 0.0);
            assert_eq!(r.side, OrderSide::Buy);
        }
    }

    #[test]
    fn template_at_end_of_calendar_is_none() {
        assert_eq!(order_template(NaiveDate::MAX), None);
        assert_eq!(delivery_date_for(NaiveDate::MAX), None);
        assert!(order_template(NaiveDate::MAX.pred_opt().unwrap()).is_some());
    }

    #[test]
    fn delivery_date_is_day_after_reference() {
        assert_eq!(delivery_date_for(d("2023-12-31")), Some(d("2024-01-01")));
    }
}
