use crate::types::dataset::DatasetKind;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data file not found or unreadable: '{0}'")]
    DataUnavailable(PathBuf),

    #[error("Dataset '{0}' is stored per station, but no station was given")]
    StationRequired(DatasetKind),

    #[error("Failed to open spreadsheet '{path}'")]
    SheetRead {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Spreadsheet '{0}' contains no worksheet with data")]
    EmptyWorkbook(PathBuf),

    #[error("Failed to read CSV file '{path}'")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Missing required column '{column}' in {dataset} ('{path}')")]
    MissingColumn {
        dataset: DatasetKind,
        column: String,
        path: PathBuf,
    },

    #[error("Failed to read boundary file '{path}'")]
    BoundaryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Boundary file '{path}' is not valid GeoJSON")]
    BoundaryParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
