//! Reads a spreadsheet resource into a raw `DataFrame`, headers taken from the
//! first non-empty row.
//!
//! Workbooks (`xlsx`, `xlsm`, `xls`, `ods`) are read with calamine; only the first
//! worksheet is used. CSV files go through the Polars CSV reader.

use crate::loading::error::DataError;
use calamine::{open_workbook_auto, Data, Reader};
use log::debug;
use polars::prelude::*;
use std::path::Path;

/// Extensions tried, in order, when resolving a dataset file.
pub(crate) const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods", "csv"];

static EMPTY_CELL: Data = Data::Empty;

pub(crate) fn read_sheet(path: &Path) -> Result<DataFrame, DataError> {
    if !path.is_file() {
        return Err(DataError::DataUnavailable(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let df = match extension.as_str() {
        "csv" => read_csv(path)?,
        _ => read_workbook(path)?,
    };
    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn read_csv(path: &Path) -> Result<DataFrame, DataError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| DataError::CsvRead {
            path: path.to_path_buf(),
            source: e,
        })
}

/// How a spreadsheet column is materialized.
enum CellKind {
    Numeric,
    Text,
}

fn read_workbook(path: &Path) -> Result<DataFrame, DataError> {
    let sheet_error = |e| DataError::SheetRead {
        path: path.to_path_buf(),
        source: e,
    };
    let mut workbook = open_workbook_auto(path).map_err(sheet_error)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DataError::EmptyWorkbook(path.to_path_buf()))?;
    let range = workbook.worksheet_range(&sheet_name).map_err(sheet_error)?;

    let rows: Vec<&[Data]> = range.rows().collect();
    let header_idx = rows
        .iter()
        .position(|r| r.iter().any(|c| !matches!(c, Data::Empty)))
        .ok_or_else(|| DataError::EmptyWorkbook(path.to_path_buf()))?;
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);

    let headers: Vec<String> = (0..width)
        .map(|i| {
            let name = rows[header_idx]
                .get(i)
                .and_then(cell_text)
                .unwrap_or_default();
            if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name
            }
        })
        .collect();

    let body = &rows[header_idx + 1..];
    let mut columns = Vec::with_capacity(width);
    for (i, name) in headers.iter().enumerate() {
        let cells: Vec<&Data> = body
            .iter()
            .map(|r| r.get(i).unwrap_or(&EMPTY_CELL))
            .collect();
        let column = match column_kind(&cells) {
            CellKind::Numeric => {
                let values: Vec<Option<f64>> = cells.iter().map(|c| cell_number(c)).collect();
                Column::new(name.as_str().into(), values)
            }
            CellKind::Text => {
                let values: Vec<Option<String>> = cells.iter().map(|c| cell_text(c)).collect();
                Column::new(name.as_str().into(), values)
            }
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

/// A column is numeric when every non-empty, non-error cell holds a number.
/// Date cells force text so the loader can parse them uniformly.
fn column_kind(cells: &[&Data]) -> CellKind {
    let numeric = cells.iter().all(|c| {
        matches!(
            c,
            Data::Int(_) | Data::Float(_) | Data::Empty | Data::Error(_)
        )
    });
    let any_value = cells
        .iter()
        .any(|c| matches!(c, Data::Int(_) | Data::Float(_)));
    if numeric && any_value {
        CellKind::Numeric
    } else {
        CellKind::Text
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(v) => Some(*v as f64),
        Data::Float(v) => Some(*v),
        _ => None,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Float(v) => Some(v.to_string()),
        Data::Int(v) => Some(v.to_string()),
        Data::Bool(v) => Some(v.to_string()),
        Data::DateTime(v) => v
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_csv_with_header() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("SPI.csv");
        fs::write(&path, "FECHA,SPI\n1992-01-01,0.5\n1992-02-01,-1.2\n")?;

        let df = read_sheet(&path)?;
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.column("SPI")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("FECHA")?.dtype(), &DataType::String);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let result = read_sheet(Path::new("/definitely/not/here.xlsx"));
        assert!(matches!(result, Err(DataError::DataUnavailable(_))));
    }

    #[test]
    fn test_corrupt_workbook_is_sheet_read_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.xlsx");
        fs::write(&path, b"this is not a zip archive")?;

        let result = read_sheet(&path);
        assert!(matches!(result, Err(DataError::SheetRead { .. })));
        Ok(())
    }

    #[test]
    fn test_column_kind_detection() {
        let numbers = [Data::Float(1.0), Data::Empty, Data::Int(3)];
        let refs: Vec<&Data> = numbers.iter().collect();
        assert!(matches!(column_kind(&refs), CellKind::Numeric));

        let mixed = [Data::Float(1.0), Data::String("Niño".to_string())];
        let refs: Vec<&Data> = mixed.iter().collect();
        assert!(matches!(column_kind(&refs), CellKind::Text));

        let empty = [Data::Empty, Data::Empty];
        let refs: Vec<&Data> = empty.iter().collect();
        assert!(matches!(column_kind(&refs), CellKind::Text));
    }
}
