use crate::TemplateError;

/// A declared dataset could not be produced for this invocation.
#[derive(Debug, thiserror::Error)]
pub enum DataResolutionError {
    #[error("dataset '{dataset}': undefined parameter '{name}'")]
    UndefinedParameter { dataset: String, name: String },
    #[error("dataset '{dataset}': malformed query template: {reason}")]
    MalformedTemplate { dataset: String, reason: String },
    #[error("data source connection failed: {message}")]
    Connection { message: String },
    #[error("dataset '{dataset}': query failed: {message}")]
    Query { dataset: String, message: String },
    #[error("dataset '{dataset}': cannot decode column '{column}': {message}")]
    Decode {
        dataset: String,
        column: String,
        message: String,
    },
    #[error("dataset '{dataset}' is not available from this source")]
    MissingDataset { dataset: String },
}

impl DataResolutionError {
    pub(crate) fn from_template(dataset: &str, err: TemplateError) -> Self {
        match err {
            TemplateError::UndefinedParameter { name } => DataResolutionError::UndefinedParameter {
                dataset: dataset.to_string(),
                name,
            },
            TemplateError::Malformed { reason } => DataResolutionError::MalformedTemplate {
                dataset: dataset.to_string(),
                reason,
            },
        }
    }

    /// Dataset the failure belongs to, when there is one.
    pub fn dataset(&self) -> Option<&str> {
        match self {
            DataResolutionError::UndefinedParameter { dataset, .. }
            | DataResolutionError::MalformedTemplate { dataset, .. }
            | DataResolutionError::Query { dataset, .. }
            | DataResolutionError::Decode { dataset, .. }
            | DataResolutionError::MissingDataset { dataset } => Some(dataset.as_str()),
            DataResolutionError::Connection { .. } => None,
        }
    }
}
