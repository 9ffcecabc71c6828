use crate::analysis::error::AnalysisError;
use crate::types::columns::{NDVI_ANNUAL, YEAR};
use crate::utils::{f64_values, i32_values, mean, negligible_spread};
use ordered_float::OrderedFloat;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;

/// Ordinary least squares line `y = slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination; `None` when `y` is constant.
    pub r_squared: Option<f64>,
}

impl Trendline {
    /// Fits the line through `(x, y)` pairs. Needs two points with distinct `x`.
    pub fn fit(points: &[(f64, f64)]) -> Option<Trendline> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
        let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
        if negligible_spread(sxx, mean_x, points.len()) {
            return None;
        }
        let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let ss_tot: f64 = points.iter().map(|p| (p.1 - mean_y).powi(2)).sum();
        let ss_res: f64 = points
            .iter()
            .map(|p| (p.1 - (slope * p.0 + intercept)).powi(2))
            .sum();
        let r_squared = (!negligible_spread(ss_tot, mean_y, points.len())).then(|| 1.0 - ss_res / ss_tot);

        Some(Trendline {
            slope,
            intercept,
            r_squared,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Direction of a series from its first to its last value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Ascending,
    Descending,
}

impl TrendDirection {
    /// Ascending when the last value is greater than the first, otherwise
    /// descending. `None` for an empty series.
    pub fn of(values: &[f64]) -> Option<TrendDirection> {
        let (first, last) = (values.first()?, values.last()?);
        Some(if last > first {
            TrendDirection::Ascending
        } else {
            TrendDirection::Descending
        })
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendDirection::Ascending => "Ascendente",
            TrendDirection::Descending => "Descendente",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Counts values into `bins` equal-width bins spanning `[min, max]`. The last
/// bin includes its upper edge. Empty input gives no bins.
pub fn histogram(values: &[f64], bins: usize) -> Result<Vec<HistogramBin>, AnalysisError> {
    if bins == 0 {
        return Err(AnalysisError::InvalidParameter(
            "histogram needs at least one bin".to_string(),
        ));
    }
    let mut sorted: Vec<OrderedFloat<f64>> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| OrderedFloat(*v))
        .collect();
    sorted.sort();
    let (Some(lo), Some(hi)) = (sorted.first(), sorted.last()) else {
        return Ok(Vec::new());
    };
    let (lo, hi) = (lo.0, hi.0);
    // a constant series still gets a bin of unit width
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let width = (hi - lo) / bins as f64;

    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for value in sorted {
        let idx = (((value.0 - lo) / width).floor() as usize).min(bins - 1);
        result[idx].count += 1;
    }
    Ok(result)
}

/// Mean NDVI over an inclusive year range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodMean {
    pub start_year: i32,
    pub end_year: i32,
    /// `None` when no year of the range has a value.
    pub mean: Option<f64>,
}

/// Mean of the annual NDVI values for years in `[start_year, end_year]`.
pub fn period_mean(ndvi: &DataFrame, start_year: i32, end_year: i32) -> Result<PeriodMean, AnalysisError> {
    if start_year > end_year {
        return Err(AnalysisError::InvalidParameter(format!(
            "period starts after it ends ({} > {})",
            start_year, end_year
        )));
    }
    let years = i32_values(ndvi, YEAR)?;
    let values = f64_values(ndvi, NDVI_ANNUAL)?;
    let selected: Vec<f64> = years
        .into_iter()
        .zip(values)
        .filter_map(|(year, value)| {
            let year = year?;
            (start_year..=end_year).contains(&year).then_some(value).flatten()
        })
        .collect();
    Ok(PeriodMean {
        start_year,
        end_year,
        mean: mean(&selected),
    })
}

/// Vegetation health reading of a mean NDVI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NdviConclusion {
    /// Below 0.4: possible degradation or vegetation loss.
    Low,
    Moderate,
    /// Above 0.6: healthy vegetation.
    High,
}

impl NdviConclusion {
    pub fn from_mean(mean: f64) -> NdviConclusion {
        if mean < 0.4 {
            NdviConclusion::Low
        } else if mean > 0.6 {
            NdviConclusion::High
        } else {
            NdviConclusion::Moderate
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            NdviConclusion::Low => {
                "El NDVI promedio es bajo. Posible degradación o pérdida de vegetación."
            }
            NdviConclusion::Moderate => {
                "NDVI en nivel moderado. Sin cambios extremos, pero debe mantenerse vigilancia."
            }
            NdviConclusion::High => {
                "El NDVI promedio es alto. Vegetación saludable en el periodo analizado."
            }
        }
    }
}
