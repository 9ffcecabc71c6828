//! Defines the dataset categories the loader knows how to read and the
//! per-category rules (file name, column renames, required columns).

use crate::types::columns::{
    DATE, ENSO_PHASE, NDVI_ANNUAL, PRECIPITATION, RAW_DATE, RAW_PRECIPITATION, SPI, YEAR,
};
use std::fmt;

/// A category of spreadsheet backing one or more dashboard views.
///
/// Every category except [`DatasetKind::Ndvi`] lives in a station directory; the
/// NDVI series is shared by the whole study area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    /// Monthly precipitation, SPI and ENSO phase (boxplots, series, comparisons).
    Precipitation,
    /// Monthly SPI series.
    Spi,
    /// Input series for the wavelet transform.
    Wavelet,
    /// Climate variables used for correlation heatmaps.
    Correlation,
    /// One row per year with precipitation and SPI statistics (map layer).
    AnnualSummary,
    /// Annual NDVI for the study area.
    Ndvi,
}

impl DatasetKind {
    /// File name without extension.
    pub(crate) fn file_stem(&self) -> &'static str {
        match self {
            DatasetKind::Precipitation => "Boxplot precipitacion y spi",
            DatasetKind::Spi => "SPI",
            DatasetKind::Wavelet => "wavelet 1",
            DatasetKind::Correlation => "Heatmap de correlación",
            DatasetKind::AnnualSummary => "Resumen_Anual",
            DatasetKind::Ndvi => "NDVI anual",
        }
    }

    /// Whether the dataset lives outside the station directories.
    pub(crate) fn is_shared(&self) -> bool {
        matches!(self, DatasetKind::Ndvi)
    }

    /// Source header → canonical header.
    pub(crate) fn renames(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            DatasetKind::Precipitation => &[(RAW_PRECIPITATION, PRECIPITATION), (RAW_DATE, DATE)],
            DatasetKind::Spi | DatasetKind::Wavelet | DatasetKind::Correlation => {
                &[(RAW_DATE, DATE)]
            }
            DatasetKind::AnnualSummary | DatasetKind::Ndvi => &[],
        }
    }

    /// Columns that must exist after renaming.
    pub(crate) fn required_columns(&self) -> &'static [&'static str] {
        match self {
            DatasetKind::Precipitation => &[DATE, PRECIPITATION, SPI, ENSO_PHASE],
            DatasetKind::Spi => &[DATE, SPI],
            DatasetKind::Wavelet => &[DATE],
            DatasetKind::Correlation => &[],
            DatasetKind::AnnualSummary => &[YEAR],
            DatasetKind::Ndvi => &[YEAR, NDVI_ANNUAL],
        }
    }

    /// Whether rows must carry a parseable date. Correlation tables may instead be
    /// keyed by year and Spanish month name, or carry no date at all.
    pub(crate) fn is_dated(&self) -> bool {
        matches!(
            self,
            DatasetKind::Precipitation | DatasetKind::Spi | DatasetKind::Wavelet
        )
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}
