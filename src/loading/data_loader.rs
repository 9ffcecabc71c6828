use crate::loading::dates::{month_name, parse_date_column, spanish_month_number, to_epoch_days};
use crate::loading::error::DataError;
use crate::loading::sheet_reader::{read_sheet, SUPPORTED_EXTENSIONS};
use crate::types::columns::{
    DATE, ENSO_PHASE, MONTH, NDVI_ANNUAL, PRECIPITATION, SPI, SPI_MEAN, SPI_MIN, YEAR,
};
use crate::types::dataset::DatasetKind;
use crate::types::enso_phase::EnsoPhase;
use crate::types::station::Station;
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Directory holding the shared NDVI series.
const NDVI_DIR: &str = "NDVI";

/// Columns cast to `Float64` whenever present.
const FLOAT_COLUMNS: &[&str] = &[PRECIPITATION, SPI, NDVI_ANNUAL, SPI_MEAN, SPI_MIN];

/// Reads dataset files from a data directory and normalizes them into tables with
/// canonical column names.
///
/// The expected layout is `<data_dir>/Estacion N/<dataset>.xlsx` for station data and
/// `<data_dir>/NDVI/NDVI anual.xlsx` for the shared NDVI series. A `.csv` file with
/// the same stem is accepted in place of the workbook.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    data_dir: PathBuf,
}

impl DatasetLoader {
    pub fn new(data_dir: &Path) -> DatasetLoader {
        DatasetLoader {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Finds the file backing a dataset, trying each supported extension in turn.
    pub fn resolve(&self, station: Option<Station>, kind: DatasetKind) -> Result<PathBuf, DataError> {
        let dir = if kind.is_shared() {
            self.data_dir.join(NDVI_DIR)
        } else {
            let station = station.ok_or(DataError::StationRequired(kind))?;
            self.data_dir.join(station.label())
        };

        SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", kind.file_stem(), ext)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| DataError::DataUnavailable(dir.join(format!("{}.xlsx", kind.file_stem()))))
    }

    /// Loads and normalizes one dataset. `station` is ignored for shared datasets.
    pub fn load(&self, station: Option<Station>, kind: DatasetKind) -> Result<DataFrame, DataError> {
        let path = self.resolve(station, kind)?;
        info!("Loading {} from {}", kind, path.display());
        let raw = read_sheet(&path)?;
        normalize(raw, kind, &path)
    }
}

/// Renames source headers, checks required columns, parses dates and derives
/// the year and month columns.
pub(crate) fn normalize(
    mut df: DataFrame,
    kind: DatasetKind,
    path: &Path,
) -> Result<DataFrame, DataError> {
    for (source, canonical) in kind.renames() {
        if df.get_column_index(source).is_some() && df.get_column_index(canonical).is_none() {
            df.rename(source, (*canonical).into())?;
        }
    }

    if kind == DatasetKind::Correlation && df.get_column_index(DATE).is_none() {
        synthesize_dates(&mut df)?;
    }

    for column in kind.required_columns() {
        if df.get_column_index(column).is_none() {
            return Err(DataError::MissingColumn {
                dataset: kind,
                column: column.to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    for column in FLOAT_COLUMNS {
        if df.get_column_index(column).is_some() {
            let cast = df.column(column)?.cast(&DataType::Float64)?;
            df.with_column(cast)?;
        }
    }
    canonicalize_phases(&mut df)?;

    match kind {
        DatasetKind::Ndvi => normalize_ndvi(df),
        DatasetKind::AnnualSummary => normalize_annual_summary(df),
        _ if df.get_column_index(DATE).is_some() => derive_calendar_columns(df, kind.is_dated()),
        _ => Ok(df),
    }
}

/// Rewrites recognised ENSO phase spellings ("El Niño", "nina", "Neutral", ...)
/// to their canonical label. Unrecognised values are kept, trimmed.
fn canonicalize_phases(df: &mut DataFrame) -> Result<(), DataError> {
    if df.get_column_index(ENSO_PHASE).is_none() {
        return Ok(());
    }
    let raw = df.column(ENSO_PHASE)?.cast(&DataType::String)?;
    let labels: Vec<Option<String>> = raw
        .str()?
        .into_iter()
        .map(|value| {
            value.map(|v| match EnsoPhase::from_label(v) {
                Some(phase) => phase.label().to_string(),
                None => v.trim().to_string(),
            })
        })
        .collect();
    df.with_column(Column::new(ENSO_PHASE.into(), labels))?;
    Ok(())
}

/// Parses the date column, optionally dropping rows whose date could not be
/// parsed, then derives year and month and sorts by date.
fn derive_calendar_columns(df: DataFrame, drop_invalid: bool) -> Result<DataFrame, DataError> {
    let parsed = parse_date_column(df.column(DATE)?);
    let invalid = parsed.iter().filter(|d| d.is_none()).count();

    let (mut df, dates) = if drop_invalid && invalid > 0 {
        debug!("Dropping {} rows with unparseable dates", invalid);
        let keep: Vec<bool> = parsed.iter().map(Option::is_some).collect();
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let dates: Vec<Option<NaiveDate>> = parsed.into_iter().filter(Option::is_some).collect();
        (df.filter(&mask)?, dates)
    } else {
        (df, parsed)
    };

    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(to_epoch_days)).collect();
    let years: Vec<Option<i32>> = dates.iter().map(|d| d.map(|d| d.year())).collect();
    let months: Vec<Option<&str>> = dates.iter().map(|d| d.map(month_name)).collect();

    df.with_column(Column::new(DATE.into(), days).cast(&DataType::Date)?)?;
    df.with_column(Column::new(YEAR.into(), years))?;
    df.with_column(Column::new(MONTH.into(), months))?;

    Ok(df.sort(
        [DATE],
        SortMultipleOptions::default()
            .with_maintain_order(true)
            .with_nulls_last(true),
    )?)
}

/// Correlation tables sometimes carry a year and a Spanish month name instead of
/// a date; build a first-of-month date from them.
fn synthesize_dates(df: &mut DataFrame) -> Result<(), DataError> {
    if df.get_column_index(YEAR).is_none() || df.get_column_index(MONTH).is_none() {
        return Ok(());
    }
    let years = df.column(YEAR)?.cast(&DataType::Int32)?;
    let months = df.column(MONTH)?.cast(&DataType::String)?;
    let dates: Vec<Option<String>> = years
        .i32()?
        .into_iter()
        .zip(months.str()?.into_iter())
        .map(|(year, month)| {
            let month = spanish_month_number(month?)?;
            NaiveDate::from_ymd_opt(year?, month, 1).map(|d| d.format("%Y-%m-%d").to_string())
        })
        .collect();
    df.with_column(Column::new(DATE.into(), dates))?;
    Ok(())
}

fn normalize_ndvi(df: DataFrame) -> Result<DataFrame, DataError> {
    Ok(df
        .select([YEAR, NDVI_ANNUAL])?
        .lazy()
        .with_columns([
            col(YEAR).cast(DataType::Int32),
            col(NDVI_ANNUAL).cast(DataType::Float64),
        ])
        .drop_nulls(None)
        .sort([YEAR], SortMultipleOptions::default())
        .collect()?)
}

fn normalize_annual_summary(df: DataFrame) -> Result<DataFrame, DataError> {
    Ok(df
        .lazy()
        .with_column(col(YEAR).cast(DataType::Int32))
        .sort([YEAR], SortMultipleOptions::default())
        .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::{FilterSet, InclusionFilter};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn station_dir(root: &TempDir, station: u8) -> PathBuf {
        let dir = root.path().join(format!("Estacion {}", station));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_precipitation_table_is_normalized() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let dir = station_dir(&root, 1);
        fs::write(
            dir.join("Boxplot precipitacion y spi.csv"),
            "FECHA,Precipitacion (mm),SPI,Fase_ENSO\n\
             1992-03-01,120.5,0.4,Niño\n\
             1992-01-01,80,-0.2,Niña\n\
             sin fecha,10,0.1,Neutro\n\
             1992-02-01,95.25,0.0,Neutro\n",
        )?;

        let loader = DatasetLoader::new(root.path());
        let df = loader.load(Station::new(1), DatasetKind::Precipitation)?;

        // unparseable date dropped
        assert_eq!(df.height(), 3);
        for column in [DATE, YEAR, MONTH, PRECIPITATION, SPI, ENSO_PHASE] {
            assert!(df.get_column_index(column).is_some(), "missing {}", column);
        }
        assert_eq!(df.column(DATE)?.dtype(), &DataType::Date);
        assert_eq!(df.column(PRECIPITATION)?.dtype(), &DataType::Float64);

        // sorted ascending
        let months: Vec<Option<&str>> = df.column(MONTH)?.str()?.into_iter().collect();
        assert_eq!(
            months,
            vec![Some("January"), Some("February"), Some("March")]
        );
        let years: Vec<Option<i32>> = df.column(YEAR)?.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(1992); 3]);
        Ok(())
    }

    #[test]
    fn test_phase_spellings_are_canonical() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let dir = station_dir(&root, 5);
        fs::write(
            dir.join("Boxplot precipitacion y spi.csv"),
            "FECHA,Precipitacion (mm),SPI,Fase_ENSO\n\
             1997-01-01,300,1.2,El Niño\n\
             1997-02-01,280,1.0, nino \n\
             1998-01-01,90,-0.8,La Nina\n\
             1998-02-01,100,0.0,Neutral\n\
             1998-03-01,110,0.1,Transición\n",
        )?;

        let loader = DatasetLoader::new(root.path());
        let df = loader.load(Station::new(5), DatasetKind::Precipitation)?;
        let phases: Vec<Option<&str>> = df.column(ENSO_PHASE)?.str()?.into_iter().collect();
        assert_eq!(
            phases,
            vec![Some("Niño"), Some("Niño"), Some("Niña"), Some("Neutro"), Some("Transición")]
        );

        // the phase filter sees every spelling of El Niño
        let nino = FilterSet::new()
            .with(InclusionFilter::phases([EnsoPhase::Nino]))
            .apply(&df)?;
        assert_eq!(nino.height(), 2);
        Ok(())
    }

    #[test]
    fn test_missing_file_reports_data_unavailable() {
        let root = tempdir().unwrap();
        let loader = DatasetLoader::new(root.path());
        let result = loader.load(Station::new(4), DatasetKind::Spi);
        match result {
            Err(DataError::DataUnavailable(path)) => {
                assert!(path.ends_with("Estacion 4/SPI.xlsx"), "{:?}", path)
            }
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_station_required_for_station_datasets() {
        let loader = DatasetLoader::new(Path::new("data"));
        let result = loader.resolve(None, DatasetKind::Wavelet);
        assert!(matches!(result, Err(DataError::StationRequired(DatasetKind::Wavelet))));
    }

    #[test]
    fn test_missing_required_column() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let dir = station_dir(&root, 2);
        fs::write(dir.join("SPI.csv"), "FECHA,Valor\n1992-01-01,1.0\n")?;

        let loader = DatasetLoader::new(root.path());
        let result = loader.load(Station::new(2), DatasetKind::Spi);
        match result {
            Err(DataError::MissingColumn { column, .. }) => assert_eq!(column, SPI),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_ndvi_table_drops_incomplete_rows() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let dir = root.path().join("NDVI");
        fs::create_dir_all(&dir)?;
        fs::write(
            dir.join("NDVI anual.csv"),
            "Año,NDVI Anual,Fuente\n1994,0.61,L5\n1992,0.55,L5\n1993,,L5\n",
        )?;

        let loader = DatasetLoader::new(root.path());
        let df = loader.load(None, DatasetKind::Ndvi)?;
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec![YEAR, NDVI_ANNUAL]);
        let years: Vec<Option<i32>> = df.column(YEAR)?.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(1992), Some(1994)]);
        Ok(())
    }

    #[test]
    fn test_correlation_dates_from_year_and_spanish_month() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let dir = station_dir(&root, 3);
        fs::write(
            dir.join("Heatmap de correlación.csv"),
            "Año,Mes,SPI,Humedad (%)\n2001,Febrero,0.3,80\n2001,Enero,0.1,82\n2002,Marzo,-0.4,79\n",
        )?;

        let loader = DatasetLoader::new(root.path());
        let df = loader.load(Station::new(3), DatasetKind::Correlation)?;
        assert_eq!(df.height(), 3);
        let months: Vec<Option<&str>> = df.column(MONTH)?.str()?.into_iter().collect();
        assert_eq!(months, vec![Some("January"), Some("February"), Some("March")]);
        let years: Vec<Option<i32>> = df.column(YEAR)?.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(2001), Some(2001), Some(2002)]);
        Ok(())
    }

    #[test]
    fn test_annual_summary_sorted_by_year() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        let dir = station_dir(&root, 5);
        fs::write(
            dir.join("Resumen_Anual.csv"),
            "Año,Precipitación,SPI promedio,SPI mínimo\n1993,2100,0.1,-1.0\n1992,1800,-0.3,-1.9\n",
        )?;

        let loader = DatasetLoader::new(root.path());
        let df = loader.load(Station::new(5), DatasetKind::AnnualSummary)?;
        let years: Vec<Option<i32>> = df.column(YEAR)?.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(1992), Some(1993)]);
        assert_eq!(df.column(PRECIPITATION)?.dtype(), &DataType::Float64);
        Ok(())
    }
}
