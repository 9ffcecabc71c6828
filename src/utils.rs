use crate::analysis::error::AnalysisError;
use crate::types::columns::YEAR;
use polars::prelude::{DataFrame, DataType};

/// Rounds to two decimals, the precision every displayed statistic uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn ensure_column(df: &DataFrame, column: &str) -> Result<(), AnalysisError> {
    match df.get_column_index(column) {
        Some(_) => Ok(()),
        None => Err(AnalysisError::UnknownColumn(column.to_string())),
    }
}

/// Values of a column as `f64`, with nulls (and NaN) as `None`.
pub(crate) fn f64_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, AnalysisError> {
    ensure_column(df, column)?;
    let cast = df.column(column)?.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Non-null values of a column as `f64`.
pub(crate) fn present_f64_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, AnalysisError> {
    Ok(f64_values(df, column)?.into_iter().flatten().collect())
}

pub(crate) fn i32_values(df: &DataFrame, column: &str) -> Result<Vec<Option<i32>>, AnalysisError> {
    ensure_column(df, column)?;
    let cast = df.column(column)?.cast(&DataType::Int32)?;
    Ok(cast.i32()?.into_iter().collect())
}

pub(crate) fn string_values(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, AnalysisError> {
    ensure_column(df, column)?;
    let cast = df.column(column)?.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Names of the numeric columns of a table, in table order. The derived year
/// column is a key rather than a measured variable and is left out.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric() && c.name().as_str() != YEAR)
        .map(|c| c.name().to_string())
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (one delta degree of freedom).
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// True when a sum of squared deviations is only rounding noise for values of
/// magnitude `mean`. Exactly zero spread is always negligible.
pub(crate) fn negligible_spread(sum_sq: f64, mean: f64, n: usize) -> bool {
    sum_sq <= f64::EPSILON * n as f64 * mean * mean
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub(crate) fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::{mean, median};
    use polars::prelude::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.12345), 0.12);
        assert_eq!(round2(-1.005), -1.0);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn test_descriptive_helpers() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(mean(&values), Some(2.5));
        assert_eq!(median(&values), Some(2.5));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(min_max(&values), Some((1.0, 4.0)));
        let std = sample_std(&values).unwrap();
        assert!((std - 1.2909944).abs() < 1e-6);
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_negligible_spread_scales_with_magnitude() {
        assert!(negligible_spread(0.0, 0.0, 3));
        // three copies of 0.1 leave a residue far below their magnitude
        let values = [0.1, 0.1, 0.1];
        let mu = mean(&values).unwrap();
        let ss: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
        assert!(negligible_spread(ss, mu, values.len()));
        // tiny values with real spread
        assert!(!negligible_spread(2e-18, 2e-9, 3));
        assert!(!negligible_spread(2.0, 0.0, 2));
    }

    #[test]
    fn test_numeric_columns_skip_year_and_text() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!(
            "Año" => &[2001i32, 2002],
            "Mes" => &["Enero", "Febrero"],
            "SPI" => &[0.1, 0.2],
            "Humedad (%)" => &[80i64, 81],
        )?;
        assert_eq!(numeric_columns(&df), vec!["SPI", "Humedad (%)"]);
        Ok(())
    }

    #[test]
    fn test_f64_values_treats_nan_as_missing() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!("SPI" => &[Some(1.0), None, Some(f64::NAN)])?;
        assert_eq!(f64_values(&df, "SPI")?, vec![Some(1.0), None, None]);
        assert!(matches!(
            f64_values(&df, "NDVI"),
            Err(AnalysisError::UnknownColumn(_))
        ));
        Ok(())
    }
}
