use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("At least two variables are needed for a correlation matrix, got {selected}")]
    InsufficientVariables { selected: usize },

    #[error("Not enough complete observations: found {found}, need at least {required}")]
    InsufficientObservations { found: usize, required: usize },

    #[error("Column '{0}' does not exist in the table")]
    UnknownColumn(String),

    #[error("Nothing selected: {0}")]
    EmptySelection(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
