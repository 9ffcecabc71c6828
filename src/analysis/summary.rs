//! Descriptive summaries shown as tables and KPI cards: per-station statistics,
//! the climate panel of one station, and per-phase medians.

use crate::analysis::aggregate::{annual_accumulation, group_statistic, Statistic};
use crate::analysis::error::AnalysisError;
use crate::types::columns::{ENSO_PHASE, PRECIPITATION, SPI, STATION, YEAR};
use crate::types::enso_phase::EnsoPhase;
use crate::utils::{ensure_column, f64_values, i32_values, median, min_max, present_f64_values, string_values};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Drought/wetness class of a station from its median SPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClimateClass {
    Dry,
    Normal,
    Wet,
}

impl ClimateClass {
    /// Median SPI ≤ −1 is dry, ≥ 1 is wet.
    pub fn from_spi_median(median: f64) -> ClimateClass {
        if median <= -1.0 {
            ClimateClass::Dry
        } else if median < 1.0 {
            ClimateClass::Normal
        } else {
            ClimateClass::Wet
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClimateClass::Dry => "Seca",
            ClimateClass::Normal => "Normal",
            ClimateClass::Wet => "Húmeda",
        }
    }
}

impl fmt::Display for ClimateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// KPI panel of a precipitation/SPI table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimatePanel {
    pub spi_median: f64,
    pub spi_min: f64,
    pub spi_max: f64,
    pub total_precipitation: f64,
    pub distinct_years: usize,
    pub climate_class: ClimateClass,
    /// Precipitation summed per year, ascending by year.
    pub annual_precipitation: Vec<(i32, f64)>,
}

/// Builds the climate panel. Fails with `InsufficientObservations` when the
/// table holds no SPI value.
pub fn climate_panel(df: &DataFrame) -> Result<ClimatePanel, AnalysisError> {
    let spi = present_f64_values(df, SPI)?;
    let precipitation = present_f64_values(df, PRECIPITATION)?;
    let (spi_min, spi_max) = min_max(&spi).ok_or(AnalysisError::InsufficientObservations {
        found: 0,
        required: 1,
    })?;
    let spi_median = median(&spi).unwrap_or_default();

    let distinct_years = i32_values(df, YEAR)?
        .into_iter()
        .flatten()
        .collect::<BTreeSet<_>>()
        .len();

    let annual = annual_accumulation(df, PRECIPITATION, None)?;
    let annual_precipitation = i32_values(&annual, YEAR)?
        .into_iter()
        .zip(f64_values(&annual, PRECIPITATION)?)
        .filter_map(|(year, sum)| Some((year?, sum.unwrap_or_default())))
        .collect();

    Ok(ClimatePanel {
        spi_median,
        spi_min,
        spi_max,
        total_precipitation: precipitation.iter().sum(),
        distinct_years,
        climate_class: ClimateClass::from_spi_median(spi_median),
        annual_precipitation,
    })
}

/// Statistics of one station over the filtered comparison window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummaryRow {
    pub station: String,
    pub spi_median: Option<f64>,
    pub spi_min: Option<f64>,
    pub spi_max: Option<f64>,
    pub precipitation_mean: Option<f64>,
    pub precipitation_median: Option<f64>,
    pub precipitation_min: Option<f64>,
    pub precipitation_max: Option<f64>,
}

/// Which stations stand out in a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryHighlights {
    /// Highest mean precipitation.
    pub wettest: String,
    /// Highest maximum SPI.
    pub highest_spi: String,
    /// Lowest minimum SPI.
    pub lowest_spi: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub rows: Vec<StationSummaryRow>,
    /// `None` when no station has the values to compare.
    pub highlights: Option<SummaryHighlights>,
}

const SUMMARY_COLUMNS: [(&str, &str, Statistic); 7] = [
    ("SPI_median", SPI, Statistic::Median),
    ("SPI_min", SPI, Statistic::Min),
    ("SPI_max", SPI, Statistic::Max),
    ("Precipitación_mean", PRECIPITATION, Statistic::Mean),
    ("Precipitación_median", PRECIPITATION, Statistic::Median),
    ("Precipitación_min", PRECIPITATION, Statistic::Min),
    ("Precipitación_max", PRECIPITATION, Statistic::Max),
];

/// Table of per-station statistics, one row per station, columns
/// `Estación, SPI_median, SPI_min, SPI_max, Precipitación_mean, ...`.
pub fn station_summary_frame(combined: &DataFrame) -> Result<DataFrame, AnalysisError> {
    for column in [STATION, SPI, PRECIPITATION] {
        ensure_column(combined, column)?;
    }
    let aggs: Vec<Expr> = SUMMARY_COLUMNS
        .iter()
        .map(|(name, source, stat)| stat.expr(source).round(2).alias(*name))
        .collect();
    Ok(combined
        .clone()
        .lazy()
        .group_by([col(STATION)])
        .agg(aggs)
        .sort([STATION], SortMultipleOptions::default())
        .collect()?)
}

/// Per-station statistics of a combined table plus the stations that stand out.
pub fn station_summary(combined: &DataFrame) -> Result<StationSummary, AnalysisError> {
    let frame = station_summary_frame(combined)?;
    let stations = string_values(&frame, STATION)?;
    let stat = |name: &str| f64_values(&frame, name);
    let (spi_median, spi_min, spi_max) = (stat("SPI_median")?, stat("SPI_min")?, stat("SPI_max")?);
    let (p_mean, p_median, p_min, p_max) = (
        stat("Precipitación_mean")?,
        stat("Precipitación_median")?,
        stat("Precipitación_min")?,
        stat("Precipitación_max")?,
    );

    let rows: Vec<StationSummaryRow> = (0..frame.height())
        .map(|i| StationSummaryRow {
            station: stations[i].clone().unwrap_or_default(),
            spi_median: spi_median[i],
            spi_min: spi_min[i],
            spi_max: spi_max[i],
            precipitation_mean: p_mean[i],
            precipitation_median: p_median[i],
            precipitation_min: p_min[i],
            precipitation_max: p_max[i],
        })
        .collect();

    let highlights = highlights(&rows);
    Ok(StationSummary { rows, highlights })
}

fn highlights(rows: &[StationSummaryRow]) -> Option<SummaryHighlights> {
    // first station wins ties
    fn pick(
        rows: &[StationSummaryRow],
        value: impl Fn(&StationSummaryRow) -> Option<f64>,
        better: impl Fn(f64, f64) -> bool,
    ) -> Option<String> {
        let mut best: Option<(&str, f64)> = None;
        for row in rows {
            if let Some(v) = value(row) {
                if best.map_or(true, |(_, b)| better(v, b)) {
                    best = Some((row.station.as_str(), v));
                }
            }
        }
        best.map(|(s, _)| s.to_string())
    }

    Some(SummaryHighlights {
        wettest: pick(rows, |r| r.precipitation_mean, |a, b| a > b)?,
        highest_spi: pick(rows, |r| r.spi_max, |a, b| a > b)?,
        lowest_spi: pick(rows, |r| r.spi_min, |a, b| a < b)?,
    })
}

/// Median precipitation and SPI of one ENSO phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseMedians {
    pub phase: EnsoPhase,
    /// `None` when the filtered table has no row in this phase.
    pub precipitation: Option<f64>,
    pub spi: Option<f64>,
}

/// Medians for each of the three phases, in phase order.
pub fn phase_medians(df: &DataFrame) -> Result<Vec<PhaseMedians>, AnalysisError> {
    let precipitation = group_statistic(df, &[ENSO_PHASE], PRECIPITATION, Statistic::Median)?;
    let spi = group_statistic(df, &[ENSO_PHASE], SPI, Statistic::Median)?;

    let lookup = |table: &DataFrame, column: &str, phase: EnsoPhase| -> Result<Option<f64>, AnalysisError> {
        let keys = string_values(table, ENSO_PHASE)?;
        let values = f64_values(table, column)?;
        Ok(keys
            .iter()
            .zip(values)
            .find(|(k, _)| k.as_deref().and_then(EnsoPhase::from_label) == Some(phase))
            .and_then(|(_, v)| v))
    };

    EnsoPhase::ALL
        .iter()
        .map(|&phase| {
            Ok(PhaseMedians {
                phase,
                precipitation: lookup(&precipitation, PRECIPITATION, phase)?,
                spi: lookup(&spi, SPI, phase)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combined() -> DataFrame {
        df!(
            STATION => &["Estacion 1", "Estacion 1", "Estacion 2", "Estacion 2", "Estacion 2"],
            SPI => &[0.5, -1.5, 2.1, 0.0, -0.3],
            PRECIPITATION => &[100.0, 50.0, 300.0, 200.0, 250.0],
            YEAR => &[2000i32, 2000, 2000, 2001, 2001],
        )
        .unwrap()
    }

    #[test]
    fn test_station_summary_rows() -> Result<(), Box<dyn std::error::Error>> {
        let summary = station_summary(&combined())?;
        assert_eq!(summary.rows.len(), 2);
        let first = &summary.rows[0];
        assert_eq!(first.station, "Estacion 1");
        assert_eq!(first.spi_median, Some(-0.5));
        assert_eq!(first.precipitation_mean, Some(75.0));
        let second = &summary.rows[1];
        assert_eq!(second.spi_max, Some(2.1));
        assert_eq!(second.precipitation_min, Some(200.0));

        let highlights = summary.highlights.unwrap();
        assert_eq!(highlights.wettest, "Estacion 2");
        assert_eq!(highlights.highest_spi, "Estacion 2");
        assert_eq!(highlights.lowest_spi, "Estacion 1");
        Ok(())
    }

    #[test]
    fn test_summary_frame_columns() -> Result<(), Box<dyn std::error::Error>> {
        let frame = station_summary_frame(&combined())?;
        assert_eq!(frame.shape(), (2, 8));
        assert!(frame.get_column_index("Precipitación_median").is_some());
        Ok(())
    }

    #[test]
    fn test_climate_panel() -> Result<(), Box<dyn std::error::Error>> {
        let panel = climate_panel(&combined())?;
        assert_eq!(panel.spi_median, 0.0);
        assert_eq!(panel.spi_min, -1.5);
        assert_eq!(panel.spi_max, 2.1);
        assert_eq!(panel.total_precipitation, 900.0);
        assert_eq!(panel.distinct_years, 2);
        assert_eq!(panel.climate_class, ClimateClass::Normal);
        assert_eq!(panel.annual_precipitation, vec![(2000, 450.0), (2001, 450.0)]);
        Ok(())
    }

    #[test]
    fn test_climate_panel_without_spi() {
        let df = df!(
            SPI => &[None::<f64>],
            PRECIPITATION => &[1.0],
            YEAR => &[2000i32],
        )
        .unwrap();
        assert!(matches!(
            climate_panel(&df),
            Err(AnalysisError::InsufficientObservations { .. })
        ));
    }

    #[test]
    fn test_climate_class_thresholds() {
        assert_eq!(ClimateClass::from_spi_median(-1.0), ClimateClass::Dry);
        assert_eq!(ClimateClass::from_spi_median(-0.99), ClimateClass::Normal);
        assert_eq!(ClimateClass::from_spi_median(1.0), ClimateClass::Wet);
    }

    #[test]
    fn test_phase_medians() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!(
            ENSO_PHASE => &["Niño", "Niño", "Niño", "Niña", "Niña", "Neutro"],
            PRECIPITATION => &[10.0, 20.0, 30.0, 40.0, 50.0, 5.0],
            SPI => &[-0.4, 0.0, 0.2, 1.0, 1.5, 0.1],
        )?;
        let medians = phase_medians(&df)?;
        let precipitation: Vec<(EnsoPhase, Option<f64>)> =
            medians.iter().map(|m| (m.phase, m.precipitation)).collect();
        assert_eq!(
            precipitation,
            vec![
                (EnsoPhase::Nino, Some(20.0)),
                (EnsoPhase::Nina, Some(45.0)),
                (EnsoPhase::Neutral, Some(5.0)),
            ]
        );
        assert_eq!(medians[1].spi, Some(1.25));

        let nino_only = df.head(Some(3));
        let medians = phase_medians(&nino_only)?;
        assert_eq!(medians[1].precipitation, None);
        Ok(())
    }
}
