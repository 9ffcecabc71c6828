//! Canonical column names shared by every table the loader produces.
//!
//! Source spreadsheets use a handful of spellings for the same quantity; the loader
//! renames them to these labels so filters and aggregations never deal with the
//! raw variants.

/// Observation date, stored as a Polars `Date`.
pub const DATE: &str = "Fecha";
/// Calendar year derived from [`DATE`] (`Int32`).
pub const YEAR: &str = "Año";
/// English month name derived from [`DATE`] (e.g. "January").
pub const MONTH: &str = "Mes";
/// Monthly precipitation in millimetres.
pub const PRECIPITATION: &str = "Precipitación";
/// Standardized Precipitation Index.
pub const SPI: &str = "SPI";
/// ENSO phase tag (`Niño`, `Niña`, `Neutro`).
pub const ENSO_PHASE: &str = "Fase_ENSO";
/// Station label added by the multi-station combiner.
pub const STATION: &str = "Estación";
/// Annual NDVI value in the shared NDVI table.
pub const NDVI_ANNUAL: &str = "NDVI Anual";
/// Anomaly label appended by the anomaly classifier.
pub const ANOMALY: &str = "Anomalía";
/// Annual summary: mean SPI of the year.
pub const SPI_MEAN: &str = "SPI promedio";
/// Annual summary: minimum SPI of the year.
pub const SPI_MIN: &str = "SPI mínimo";

/// Raw header used for precipitation in the station spreadsheets.
pub(crate) const RAW_PRECIPITATION: &str = "Precipitacion (mm)";
/// Raw header used for dates in the station spreadsheets.
pub(crate) const RAW_DATE: &str = "FECHA";
