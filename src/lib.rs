//! Data pipeline behind an ENSO and precipitation dashboard for six weather
//! stations of the Chocó Andino region.
//!
//! Station tables (CSV or Excel) are loaded from a data directory, normalized
//! and cached by a [`Dashboard`], which answers one [`SectionRequest`] per
//! sidebar section with a [`SectionResponse`] holding the computed view and any
//! user-facing [`Notice`]s.

pub mod analysis;
pub mod animation;
pub mod combine;
pub mod config;
mod dashboard;
mod error;
pub mod export;
pub mod filtering;
pub mod loading;
pub mod map;
pub mod sections;
mod types;
mod utils;

pub use dashboard::Dashboard;
pub use error::EnsoError;

pub use config::{ConfigError, DashboardConfig, NdviSettings, WaveletSettings};
pub use loading::error::DataError;
pub use analysis::error::AnalysisError;

pub use types::columns;
pub use types::dataset::DatasetKind;
pub use types::enso_phase::EnsoPhase;
pub use types::station::*;

pub use types::frames::ndvi_frame::NdviLazyFrame;
pub use types::frames::observation_frame::ObservationLazyFrame;

pub use filtering::{FilterOptions, FilterSet, InclusionFilter, RangeFilter};
pub use sections::{Notice, NoticeLevel, SectionKind, SectionRequest, SectionResponse, SectionView};
