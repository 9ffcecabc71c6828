use crate::analysis::error::AnalysisError;
use crate::utils::{f64_values, negligible_spread, round2};
use polars::prelude::{Column, DataFrame};
use serde::Serialize;

/// Name of the row-label column in [`CorrelationMatrix::to_frame`].
pub const VARIABLE: &str = "Variable";

/// Pairwise Pearson coefficients over a set of variables, rounded to two
/// decimals. Rows and columns follow the order of [`CorrelationMatrix::variables`].
///
/// A cell is `None` when the coefficient is undefined because one of the two
/// variables is constant over the rows used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    variables: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
    observations: usize,
}

impl CorrelationMatrix {
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn values(&self) -> &[Vec<Option<f64>>] {
        &self.values
    }

    /// Number of complete rows the coefficients were computed from.
    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.variables.iter().position(|v| v == a)?;
        let j = self.variables.iter().position(|v| v == b)?;
        self.values[i][j]
    }

    /// Square table with a leading `Variable` column holding the row labels.
    pub fn to_frame(&self) -> Result<DataFrame, AnalysisError> {
        let mut columns = Vec::with_capacity(self.variables.len() + 1);
        columns.push(Column::new(VARIABLE.into(), self.variables.clone()));
        for (j, name) in self.variables.iter().enumerate() {
            let column: Vec<Option<f64>> = self.values.iter().map(|row| row[j]).collect();
            columns.push(Column::new(name.as_str().into(), column));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Computes the correlation matrix of `variables` over the rows of `df` where
/// every selected variable has a value.
///
/// Fails with `InsufficientVariables` for fewer than two distinct variables and
/// with `InsufficientObservations` when fewer than two complete rows remain.
pub fn correlation_matrix(
    df: &DataFrame,
    variables: &[&str],
) -> Result<CorrelationMatrix, AnalysisError> {
    let mut names: Vec<String> = Vec::with_capacity(variables.len());
    for v in variables {
        if !names.iter().any(|n| n == v) {
            names.push(v.to_string());
        }
    }
    if names.len() < 2 {
        return Err(AnalysisError::InsufficientVariables {
            selected: names.len(),
        });
    }

    let columns = names
        .iter()
        .map(|name| f64_values(df, name))
        .collect::<Result<Vec<_>, _>>()?;

    // keep complete rows only
    let mut series: Vec<Vec<f64>> = vec![Vec::with_capacity(df.height()); names.len()];
    for row in 0..df.height() {
        let values: Option<Vec<f64>> = columns.iter().map(|c| c[row]).collect();
        if let Some(values) = values {
            for (target, value) in series.iter_mut().zip(values) {
                target.push(value);
            }
        }
    }

    let observations = series[0].len();
    if observations < 2 {
        return Err(AnalysisError::InsufficientObservations {
            found: observations,
            required: 2,
        });
    }

    let n = names.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        values[i][i] = pearson(&series[i], &series[i]).map(|_| 1.0);
        for j in (i + 1)..n {
            let r = pearson(&series[i], &series[j]).map(round2);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        variables: names,
        values,
        observations,
    })
}

/// Pearson correlation coefficient, or `None` when either series is constant.
pub(crate) fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for k in 0..n {
        let dx = x[k] - mean_x;
        let dy = y[k] - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if negligible_spread(sxx, mean_x, n) || negligible_spread(syy, mean_y, n) {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}
