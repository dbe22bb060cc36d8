use chrono::NaiveDate;
use wb_schemas::{
    order_template, Dataset, Datasets, OrderRow, ParamValue, Params, Series, PARAM_DELIVERY_DATE,
};

use crate::StrategyError;

/// Everything a strategy function receives: the resolved datasets plus the
/// merged parameter set (built-ins, static args, overrides).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BidInput {
    pub datasets: Datasets,
    pub params: Params,
}

impl BidInput {
    pub fn new(datasets: Datasets, params: Params) -> Self {
        Self { datasets, params }
    }

    pub fn dataset(&self, name: &str) -> Result<&Dataset, StrategyError> {
        self.datasets
            .get(name)
            .ok_or_else(|| StrategyError::MissingDataset(name.to_string()))
    }

    /// One column of a dataset as a time series.
    ///
    /// An empty result set has no column metadata, so it yields an empty
    /// series rather than an error.
    pub fn series(&self, dataset: &str, column: &str) -> Result<Series, StrategyError> {
        let ds = self.dataset(dataset)?;
        match ds.series(column) {
            Some(s) => Ok(s),
            None if ds.is_empty() => Ok(Series::new()),
            None => Err(StrategyError::MissingColumn {
                dataset: dataset.to_string(),
                column: column.to_string(),
            }),
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn delivery_date(&self) -> Result<NaiveDate, StrategyError> {
        self.param(PARAM_DELIVERY_DATE)
            .and_then(ParamValue::as_date)
            .ok_or_else(|| StrategyError::InvalidParameter {
                name: PARAM_DELIVERY_DATE.to_string(),
                reason: "expected a date".to_string(),
            })
    }

    /// Empty order skeleton for the delivery date.
    pub fn template(&self) -> Result<Vec<OrderRow>, StrategyError> {
        let date = self.delivery_date()?;
        order_template(date).ok_or_else(|| StrategyError::InvalidParameter {
            name: PARAM_DELIVERY_DATE.to_string(),
            reason: format!("{date} is too close to the end of the calendar"),
        })
    }
}
