//! Strategy wrapper: one bidder and its execution protocol.
//!
//! `execute` runs, in order and stopping at the first failure:
//! 1. merge parameters (built-ins, static args, overrides)
//! 2. resolve every declared dataset through the [`DataSource`]
//! 3. call the strategy function
//! 4. validate the returned frame into an [`OrderSet`]
//! 5. hand the order set to the [`OrderSink`]
//!
//! Nothing is retried. Steps 1-4 have no side effects, so re-running a
//! failed invocation is always safe.

use std::collections::BTreeMap;

use wb_db::{DataSource, DatasetRequest};
use wb_schemas::{
    delivery_date_for, validate_order_frame, ArgValue, OrderSet, ParamValue, Params, HOURS_PER_DAY,
    PARAM_DELIVERY_DATE, PARAM_REFERENCE_DATE,
};
use wb_submit::{OrderSink, SubmissionResponse};

use crate::{BidError, BidInput, BidderDescriptor, Invocation, StrategyFn};

/// A registered bidder. Created by the registry from a [`BidderDescriptor`].
#[derive(Clone)]
pub struct Bidder {
    name: String,
    description: String,
    static_args: BTreeMap<String, ArgValue>,
    data_requirements: Vec<DatasetRequest>,
    is_default: bool,
    strategy: StrategyFn,
}

/// Outcome of steps 1-4.
#[derive(Clone, Debug, PartialEq)]
pub struct Prepared {
    pub params: Params,
    pub orders: OrderSet,
}

/// Outcome of a full execution.
#[derive(Clone, Debug, PartialEq)]
pub struct Execution {
    pub bidder: String,
    pub orders: OrderSet,
    pub response: SubmissionResponse,
}

impl std::fmt::Debug for Bidder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bidder")
            .field("name", &self.name)
            .field("is_default", &self.is_default)
            .field("data_requirements", &self.data_requirements)
            .finish_non_exhaustive()
    }
}

impl Bidder {
    pub(crate) fn from_descriptor(d: BidderDescriptor) -> Self {
        Self {
            name: d.name,
            description: d.description,
            static_args: d.static_args,
            data_requirements: d.data_requirements,
            is_default: d.is_default,
            strategy: d.strategy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn data_requirements(&self) -> &[DatasetRequest] {
        &self.data_requirements
    }

    pub fn static_args(&self) -> &BTreeMap<String, ArgValue> {
        &self.static_args
    }

    /// Step 1. Later layers win: built-ins, then static args, then overrides.
    pub fn parameters(&self, inv: &Invocation) -> Result<Params, BidError> {
        let reference = inv.reference_date;
        let delivery = delivery_date_for(reference).ok_or_else(|| BidError::InvalidArgument {
            name: PARAM_REFERENCE_DATE.to_string(),
            reason: "date out of range".to_string(),
        })?;

        let mut params = Params::new();
        params.insert(PARAM_REFERENCE_DATE.to_string(), ParamValue::Date(reference));
        params.insert(PARAM_DELIVERY_DATE.to_string(), ParamValue::Date(delivery));

        for (name, arg) in &self.static_args {
            let value = arg.resolve(reference).ok_or_else(|| BidError::InvalidArgument {
                name: name.clone(),
                reason: "relative date out of range".to_string(),
            })?;
            params.insert(name.clone(), value);
        }
        for (name, value) in &inv.overrides {
            params.insert(name.clone(), value.clone());
        }
        Ok(params)
    }

    /// Steps 1-4: everything except submission.
    pub async fn prepare(
        &self,
        source: &dyn DataSource,
        inv: &Invocation,
    ) -> Result<Prepared, BidError> {
        let params = self.parameters(inv)?;

        let datasets = source.resolve(&self.data_requirements, &params).await?;
        for (name, ds) in &datasets {
            tracing::info!(
                bidder = %self.name,
                dataset = %name,
                rows = ds.len(),
                "dataset resolved"
            );
        }

        let input = BidInput::new(datasets, params);
        let frame = (self.strategy)(&input).map_err(|source| BidError::Strategy {
            bidder: self.name.clone(),
            source,
        })?;
        tracing::info!(
            bidder = %self.name,
            rows = frame.len(),
            dropped = HOURS_PER_DAY.saturating_sub(frame.len()),
            "strategy produced orders"
        );

        let orders = validate_order_frame(&frame).map_err(|e| {
            tracing::warn!(bidder = %self.name, error = %e, "strategy output failed validation");
            e
        })?;

        Ok(Prepared {
            params: input.params,
            orders,
        })
    }

    /// Steps 1-5. Partial order sets are never submitted: any earlier failure
    /// returns before the sink is touched.
    pub async fn execute(
        &self,
        source: &dyn DataSource,
        sink: &dyn OrderSink,
        inv: &Invocation,
    ) -> Result<Execution, BidError> {
        let prepared = self.prepare(source, inv).await?;
        let response = sink.submit(&prepared.orders).await?;

        Ok(Execution {
            bidder: self.name.clone(),
            orders: prepared.orders,
            response,
        })
    }
}
