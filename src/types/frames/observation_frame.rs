//! Contains the `ObservationLazyFrame` structure for lazy operations on station
//! precipitation/SPI tables.

use crate::filtering::{EnsoFrameFilterExt, FilterSet, InclusionFilter};
use crate::types::enso_phase::EnsoPhase;
use polars::prelude::{Expr, LazyFrame};

/// A wrapper around a Polars `LazyFrame` holding a normalized observation table
/// (`Fecha`, `Año`, `Mes`, `Precipitación`, `SPI`, `Fase_ENSO`, and `Estación`
/// when several stations are combined).
///
/// Instances are typically obtained via [`crate::Dashboard::observations`] or
/// [`crate::Dashboard::compare`].
///
/// # Errors
///
/// Operations that trigger computation on the underlying `LazyFrame` (e.g.,
/// calling `.collect()`) can return a [`polars::prelude::PolarsError`].
#[derive(Clone)]
pub struct ObservationLazyFrame {
    /// The underlying Polars LazyFrame.
    pub frame: LazyFrame,
}

impl ObservationLazyFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Filters the observations with an arbitrary Polars predicate.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use enso_andino::{Dashboard, Station};
    /// use polars::prelude::{col, lit};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let dashboard = Dashboard::from_data_dir("data");
    /// let station = Station::new(1).unwrap();
    /// let observations = dashboard.observations().station(station).call().await?;
    ///
    /// // Months with more than 300 mm of rain
    /// let wet = observations.filter(col("Precipitación").gt(lit(300.0))).frame.collect()?;
    /// println!("{}", wet);
    /// # Ok(())
    /// # }
    /// ```
    pub fn filter(&self, predicate: Expr) -> ObservationLazyFrame {
        ObservationLazyFrame::new(self.frame.clone().filter(predicate))
    }

    /// Applies a filter set (years, months, phases, stations).
    pub fn apply(&self, filters: &FilterSet) -> ObservationLazyFrame {
        ObservationLazyFrame::new(self.frame.clone().filter_set(filters))
    }

    /// Keeps observations from `start_year` through `end_year`.
    pub fn get_years(&self, start_year: i32, end_year: i32) -> ObservationLazyFrame {
        ObservationLazyFrame::new(self.frame.clone().filter_years(start_year, end_year))
    }

    /// Keeps observations recorded during one ENSO phase.
    pub fn get_phase(&self, phase: EnsoPhase) -> ObservationLazyFrame {
        self.filter(InclusionFilter::phases([phase]).to_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::columns::{ENSO_PHASE, PRECIPITATION, YEAR};
    use polars::prelude::*;

    fn frame() -> ObservationLazyFrame {
        let df = df!(
            YEAR => &[1997i32, 1998, 1999, 2000],
            ENSO_PHASE => &["Niño", "Niña", "Niño", "Neutro"],
            PRECIPITATION => &[310.0, 120.0, 95.0, 80.0],
        )
        .unwrap();
        ObservationLazyFrame::new(df.lazy())
    }

    #[test]
    fn test_chained_filters() -> Result<(), Box<dyn std::error::Error>> {
        let df = frame()
            .get_years(1997, 1999)
            .get_phase(EnsoPhase::Nino)
            .frame
            .collect()?;
        let years: Vec<Option<i32>> = df.column(YEAR)?.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(1997), Some(1999)]);
        Ok(())
    }

    #[test]
    fn test_predicate_filter() -> Result<(), Box<dyn std::error::Error>> {
        let df = frame()
            .filter(col(PRECIPITATION).gt(lit(100.0)))
            .frame
            .collect()?;
        assert_eq!(df.height(), 2);
        Ok(())
    }
}
