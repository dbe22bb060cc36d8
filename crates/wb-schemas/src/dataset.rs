use std::collections::BTreeMap;

use chrono::NaiveDateTime;

/// Name of the time index column every dataset carries.
pub const TIME_COLUMN: &str = "time";

/// Time-indexed numeric series.
pub type Series = BTreeMap<NaiveDateTime, f64>;

/// Resolved datasets for one invocation, keyed by requirement name.
pub type Datasets = BTreeMap<String, Dataset>;

#[derive(Clone, Debug, PartialEq)]
pub struct DatasetRow {
    pub time: NaiveDateTime,
    /// One cell per value column; `None` for SQL NULL / empty CSV cell.
    pub values: Vec<Option<f64>>,
}

/// Tabular query result: a time index plus named numeric columns.
///
/// Rows are kept ordered by time (stable for equal timestamps).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<DatasetRow>,
}

impl Dataset {
    /// `columns` names the value columns; the time index is implicit.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Single-column dataset from `(time, value)` pairs.
    pub fn from_series<I>(column: &str, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDateTime, f64)>,
    {
        let mut ds = Self::new([column]);
        for (t, v) in points {
            ds.rows.push(DatasetRow {
                time: t,
                values: vec![Some(v)],
            });
        }
        ds.sort_by_time();
        ds
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. Short rows are padded with `None`, long rows truncated.
    pub fn push_row(&mut self, time: NaiveDateTime, mut values: Vec<Option<f64>>) {
        values.resize(self.columns.len(), None);
        self.rows.push(DatasetRow { time, values });
    }

    pub fn sort_by_time(&mut self) {
        self.rows.sort_by_key(|r| r.time);
    }

    /// Non-null values of one column keyed by time. `None` if the column
    /// does not exist. On duplicate timestamps the later row wins.
    pub fn series(&self, column: &str) -> Option<Series> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .filter_map(|r| r.values.get(idx).copied().flatten().map(|v| (r.time, v)))
                .collect(),
        )
    }
}
