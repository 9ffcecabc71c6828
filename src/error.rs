use crate::analysis::error::AnalysisError;
use crate::config::ConfigError;
use crate::loading::error::DataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnsoError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<polars::error::PolarsError> for EnsoError {
    fn from(e: polars::error::PolarsError) -> Self {
        EnsoError::Analysis(AnalysisError::from(e))
    }
}
