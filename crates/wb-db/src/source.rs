use wb_schemas::{Datasets, Params};

use crate::DataResolutionError;

/// One declared data requirement: the dataset name the strategy receives and
/// the query template that produces it.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetRequest {
    pub name: String,
    pub template: String,
}

impl DatasetRequest {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }
}

/// Backing store the Query Resolver runs templates against.
///
/// One call resolves every dataset of one invocation. Implementations must not
/// hold connections past the return of `resolve`.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn resolve(
        &self,
        requests: &[DatasetRequest],
        params: &Params,
    ) -> Result<Datasets, DataResolutionError>;
}
