use wb_db::DataResolutionError;
use wb_schemas::SchemaValidationError;
use wb_submit::SubmissionError;

use crate::RegistryError;

/// A strategy function could not produce an order frame.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StrategyError {
    #[error("dataset '{0}' was not resolved")]
    MissingDataset(String),
    #[error("dataset '{dataset}' has no column '{column}'")]
    MissingColumn { dataset: String, column: String },
    #[error("parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("{0}")]
    Failed(String),
}

/// Why one invocation stopped. Every stage error is carried by value; nothing
/// after the failing stage ran, and no orders were submitted unless the
/// failure is the submission itself.
#[derive(Debug, thiserror::Error)]
pub enum BidError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error(transparent)]
    DataResolution(#[from] DataResolutionError),
    #[error("strategy '{bidder}' failed: {source}")]
    Strategy {
        bidder: String,
        #[source]
        source: StrategyError,
    },
    #[error(transparent)]
    SchemaValidation(#[from] SchemaValidationError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("invocation exceeded {secs}s")]
    Timeout { secs: u64 },
}

impl BidError {
    /// Stable code for structured failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            BidError::Registry(RegistryError::NoDefaultBidder { .. }) => "NO_DEFAULT_BIDDER",
            BidError::Registry(_) => "REGISTRY",
            BidError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            BidError::DataResolution(_) => "DATA_RESOLUTION",
            BidError::Strategy { .. } => "STRATEGY",
            BidError::SchemaValidation(_) => "SCHEMA_VALIDATION",
            BidError::Submission(_) => "SUBMISSION",
            BidError::Timeout { .. } => "TIMEOUT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable_codes() {
        let e = BidError::from(RegistryError::NoDefaultBidder {
            requested: Some("C".to_string()),
        });
        assert_eq!(e.kind(), "NO_DEFAULT_BIDDER");
        assert_eq!(
            BidError::from(SchemaValidationError::MissingColumn {
                column: "price".to_string()
            })
            .kind(),
            "SCHEMA_VALIDATION"
        );
        assert_eq!(BidError::Timeout { secs: 1 }.kind(), "TIMEOUT");
    }

    #[test]
    fn strategy_error_message_names_bidder() {
        let e = BidError::Strategy {
            bidder: "net-power".to_string(),
            source: StrategyError::MissingDataset("power".to_string()),
        };
        assert_eq!(e.to_string(), "strategy 'net-power' failed: dataset 'power' was not resolved");
    }
}
