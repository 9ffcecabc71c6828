//! Contains the `NdviLazyFrame` structure for the annual NDVI series.

use crate::filtering::{EnsoFrameFilterExt, RangeFilter};
use crate::types::columns::NDVI_ANNUAL;
use polars::prelude::LazyFrame;

/// A wrapper around a Polars `LazyFrame` holding the annual NDVI series
/// (`Año`, `NDVI Anual`), one row per year.
///
/// Instances are typically obtained via [`crate::Dashboard::ndvi`].
#[derive(Clone)]
pub struct NdviLazyFrame {
    pub frame: LazyFrame,
}

impl NdviLazyFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Keeps the years from `start_year` through `end_year`.
    pub fn get_range(&self, start_year: i32, end_year: i32) -> NdviLazyFrame {
        NdviLazyFrame::new(self.frame.clone().filter_years(start_year, end_year))
    }

    /// Keeps the years whose NDVI lies in `[min, max]`.
    pub fn within(&self, min: f64, max: f64) -> NdviLazyFrame {
        NdviLazyFrame::new(self.frame.clone().filter_range(RangeFilter {
            column: NDVI_ANNUAL,
            min,
            max,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::columns::YEAR;
    use polars::prelude::*;

    #[test]
    fn test_range_and_threshold() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!(
            YEAR => &[1992i32, 1993, 1994, 1995, 1996],
            NDVI_ANNUAL => &[0.15, 0.45, 0.85, 0.62, 0.7],
        )?;
        let filtered = NdviLazyFrame::new(df.lazy())
            .get_range(1993, 1996)
            .within(0.2, 0.8)
            .frame
            .collect()?;
        let years: Vec<Option<i32>> = filtered.column(YEAR)?.i32()?.into_iter().collect();
        assert_eq!(years, vec![Some(1993), Some(1995), Some(1996)]);
        Ok(())
    }
}
