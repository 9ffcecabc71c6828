use crate::analysis::error::AnalysisError;
use crate::types::columns::YEAR;
use crate::utils::ensure_column;
use polars::prelude::*;
use std::fmt;
use std::str::FromStr;

/// A reduction applied to each group of a [`group_statistic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    Median,
    Mean,
    Min,
    Max,
    Sum,
    /// Sample standard deviation (one delta degree of freedom).
    Std,
}

impl Statistic {
    pub(crate) fn expr(self, column: &str) -> Expr {
        let c = col(column).cast(DataType::Float64);
        match self {
            Statistic::Median => c.median(),
            Statistic::Mean => c.mean(),
            Statistic::Min => c.min(),
            Statistic::Max => c.max(),
            Statistic::Sum => c.sum(),
            Statistic::Std => c.std(1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Statistic::Median => "median",
            Statistic::Mean => "mean",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Sum => "sum",
            Statistic::Std => "std",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "median" => Ok(Statistic::Median),
            "mean" => Ok(Statistic::Mean),
            "min" => Ok(Statistic::Min),
            "max" => Ok(Statistic::Max),
            "sum" => Ok(Statistic::Sum),
            "std" => Ok(Statistic::Std),
            other => Err(AnalysisError::InvalidParameter(format!(
                "unknown statistic '{}'",
                other
            ))),
        }
    }
}

fn check_columns(df: &DataFrame, keys: &[&str], target: &str) -> Result<(), AnalysisError> {
    if keys.is_empty() {
        return Err(AnalysisError::EmptySelection("no grouping key".to_string()));
    }
    for key in keys {
        ensure_column(df, key)?;
    }
    ensure_column(df, target)
}

/// One row per distinct key, sorted by key, with `statistic` of `target` rounded
/// to two decimals and stored under the target's name.
///
/// Rows with a null key form their own group.
pub fn group_statistic(
    df: &DataFrame,
    keys: &[&str],
    target: &str,
    statistic: Statistic,
) -> Result<DataFrame, AnalysisError> {
    check_columns(df, keys, target)?;
    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    Ok(df
        .clone()
        .lazy()
        .group_by(key_exprs)
        .agg([statistic.expr(target).round(2).alias(target)])
        .sort(keys.to_vec(), SortMultipleOptions::default())
        .collect()?)
}

/// Sums `target` per year, or per (year, `tag`) when a tag column is given.
///
/// Sums are not rounded, so the group sums add up to the column total.
pub fn annual_accumulation(
    df: &DataFrame,
    target: &str,
    tag: Option<&str>,
) -> Result<DataFrame, AnalysisError> {
    let mut keys = vec![YEAR];
    keys.extend(tag);
    check_columns(df, &keys, target)?;
    let key_exprs: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    Ok(df
        .clone()
        .lazy()
        .group_by(key_exprs)
        .agg([col(target).cast(DataType::Float64).sum().alias(target)])
        .sort(keys, SortMultipleOptions::default())
        .collect()?)
}
