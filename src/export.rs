use crate::analysis::error::AnalysisError;
use polars::prelude::*;

/// Serializes a table as CSV with a header row, ready to be offered as a
/// download.
pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>, AnalysisError> {
    let mut df = df.clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)?;
    Ok(buf)
}
