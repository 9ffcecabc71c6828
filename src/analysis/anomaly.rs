use crate::analysis::error::AnalysisError;
use crate::types::columns::ANOMALY;
use crate::utils::{f64_values, mean, sample_std};
use polars::prelude::{Column, DataFrame};
use serde::Serialize;
use std::fmt;

/// Position of a value relative to the mean ± one standard deviation band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AnomalyLabel {
    Low,
    Normal,
    High,
}

impl AnomalyLabel {
    pub fn label(self) -> &'static str {
        match self {
            AnomalyLabel::Low => "low",
            AnomalyLabel::Normal => "normal",
            AnomalyLabel::High => "high",
        }
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mean and sample standard deviation of the window a value is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyBand {
    pub mean: f64,
    /// `None` for a single-value window.
    pub std: Option<f64>,
}

impl AnomalyBand {
    pub fn from_values(values: &[f64]) -> Option<AnomalyBand> {
        Some(AnomalyBand {
            mean: mean(values)?,
            std: sample_std(values),
        })
    }

    /// Values exactly on `mean ± std` are normal.
    pub fn classify(&self, value: f64) -> AnomalyLabel {
        let Some(std) = self.std else {
            return AnomalyLabel::Normal;
        };
        if value < self.mean - std {
            AnomalyLabel::Low
        } else if value > self.mean + std {
            AnomalyLabel::High
        } else {
            AnomalyLabel::Normal
        }
    }
}

/// Labels every value against the band of the values themselves. Empty input
/// yields no labels.
pub fn classify(values: &[f64]) -> Vec<AnomalyLabel> {
    match AnomalyBand::from_values(values) {
        Some(band) => values.iter().map(|v| band.classify(*v)).collect(),
        None => Vec::new(),
    }
}

/// Adds an anomaly column for `column`, computed over the rows of `df`. Rows
/// without a value get a null label.
pub fn label_frame(df: &DataFrame, column: &str) -> Result<DataFrame, AnalysisError> {
    let values = f64_values(df, column)?;
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let band = AnomalyBand::from_values(&present);

    let labels: Vec<Option<&str>> = values
        .iter()
        .map(|v| Some(band?.classify((*v)?).label()))
        .collect();
    let mut labelled = df.clone();
    labelled.with_column(Column::new(ANOMALY.into(), labels))?;
    Ok(labelled)
}
