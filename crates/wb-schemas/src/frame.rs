use serde_json::{Map, Value};

use crate::{OrderRow, ORDER_COLUMNS};

/// Row-extensible table returned by strategy functions.
///
/// Cells are JSON values so a strategy can produce anything; nothing is
/// trusted until [`crate::validate_order_frame`] turns the frame into an
/// [`crate::OrderSet`]. Declared columns are what validation checks for,
/// independent of which keys individual rows happen to carry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderFrame {
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

impl OrderFrame {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::default();
        for c in columns {
            out.add_column(c);
        }
        out
    }

    /// Frame with the standard order columns and one record per row.
    pub fn from_rows(rows: &[OrderRow]) -> Self {
        let mut frame = Self::new(ORDER_COLUMNS);
        for r in rows {
            let mut rec = Map::new();
            rec.insert("hour_ID".to_string(), Value::from(r.hour_id));
            rec.insert(
                "applying_date".to_string(),
                Value::from(r.applying_date.format("%Y-%m-%d").to_string()),
            );
            rec.insert("volume".to_string(), Value::from(r.volume));
            rec.insert("price".to_string(), Value::from(r.price));
            rec.insert("type".to_string(), Value::from(r.side.as_str()));
            frame.rows.push(rec);
        }
        frame
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Declare a column. Existing rows are left without a value for it.
    pub fn add_column(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_column(&name) {
            self.columns.push(name);
        }
    }

    /// Remove a column declaration and its cells.
    pub fn drop_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
        for r in &mut self.rows {
            r.remove(name);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn push_record(&mut self, record: Map<String, Value>) {
        self.rows.push(record);
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row)?.get(column)
    }

    /// Set a cell. Returns `false` when `row` is out of range.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<Value>) -> bool {
        match self.rows.get_mut(row) {
            Some(r) => {
                r.insert(column.to_string(), value.into());
                true
            }
            None => false,
        }
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Map<String, Value>) -> bool,
    {
        self.rows.retain(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{order_template, OrderSide};
    use chrono::NaiveDate;

    #[test]
    fn from_rows_declares_all_order_columns() {
        let dt = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let frame = OrderFrame::from_rows(&order_template(dt).unwrap());
        assert_eq!(frame.len(), 24);
        for c in ORDER_COLUMNS {
            assert!(frame.has_column(c), "missing {c}");
        }
        assert_eq!(frame.get(0, "applying_date").unwrap(), "2023-06-01");
        assert_eq!(frame.get(0, "type").unwrap(), OrderSide::Buy.as_str());
    }

    #[test]
    fn drop_column_removes_declaration_and_cells() {
        let dt = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let mut frame = OrderFrame::from_rows(&order_template(dt).unwrap());
        frame.drop_column("price");
        assert!(!frame.has_column("price"));
        assert!(frame.get(3, "price").is_none());
    }

    #[test]
    fn set_out_of_range_is_rejected() {
        let mut frame = OrderFrame::new(["volume"]);
        assert!(!frame.set(0, "volume", 1.0));
        frame.push_record(Map::new());
        assert!(frame.set(0, "volume", 1.0));
        assert_eq!(frame.get(0, "volume").unwrap(), 1.0);
    }
}
