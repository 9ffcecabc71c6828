//! The entry point of the crate: loads station tables on demand and answers
//! section requests.

use crate::animation::YearAnimation;
use crate::combine::{load_stations, StationFailure};
use crate::config::DashboardConfig;
use crate::error::EnsoError;
use crate::filtering::{FilterOptions, FilterSet};
use crate::loading::frame_fetcher::FrameFetcher;
use crate::map::MapLayer;
use crate::sections::{dispatch, SectionContext, SectionRequest, SectionResponse};
use crate::types::dataset::DatasetKind;
use crate::types::frames::ndvi_frame::NdviLazyFrame;
use crate::types::frames::observation_frame::ObservationLazyFrame;
use crate::types::station::Station;
use crate::utils::numeric_columns;
use bon::bon;
use log::info;
use polars::prelude::{DataFrame, IntoLazy};
use std::path::Path;

/// Dashboard over one data directory.
///
/// Tables are read the first time they are needed and, unless caching is
/// disabled in the [`DashboardConfig`], kept for later requests.
///
/// # Examples
///
/// ```no_run
/// use enso_andino::{Dashboard, SectionRequest};
///
/// # #[tokio::main]
/// # async fn main() {
/// let dashboard = Dashboard::from_data_dir("data");
/// let response = dashboard.handle(SectionRequest::Introduction).await;
/// for notice in &response.notices {
///     println!("{:?}: {}", notice.level, notice.message);
/// }
/// # }
/// ```
pub struct Dashboard {
    fetcher: FrameFetcher,
    config: DashboardConfig,
}

#[bon]
impl Dashboard {
    /// Dashboard over a configuration built in code.
    ///
    /// # Errors
    ///
    /// Returns [`EnsoError::Config`] when a setting is out of range, for
    /// instance a negative or NaN animation delay.
    pub fn new(config: DashboardConfig) -> Result<Self, EnsoError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    /// Dashboard with default settings over `data_dir`.
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::with_valid_config(DashboardConfig::with_data_dir(data_dir.as_ref()))
    }

    /// Dashboard configured by a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EnsoError::Config`] when the file cannot be read, parsed or
    /// holds out-of-range values.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, EnsoError> {
        Self::new(DashboardConfig::from_file(path.as_ref())?)
    }

    fn with_valid_config(config: DashboardConfig) -> Self {
        info!("Dashboard over {}", config.data_dir.display());
        Self {
            fetcher: FrameFetcher::new(&config.data_dir, config.use_cache),
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Builds the view of a sidebar section. Failures are reported as notices
    /// in the response.
    pub async fn handle(&self, request: SectionRequest) -> SectionResponse {
        let ctx = SectionContext {
            fetcher: &self.fetcher,
            config: &self.config,
        };
        dispatch(ctx, request).await
    }

    /// Precipitation, SPI and ENSO phase of one station, optionally filtered.
    ///
    /// ```no_run
    /// # use enso_andino::{Dashboard, EnsoPhase, Station};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let dashboard = Dashboard::from_data_dir("data");
    /// let nino = dashboard
    ///     .observations()
    ///     .station(Station::new(2).unwrap())
    ///     .call()
    ///     .await?
    ///     .get_phase(EnsoPhase::Nino)
    ///     .frame
    ///     .collect()?;
    /// println!("{}", nino);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn observations(
        &self,
        station: Station,
        filters: Option<FilterSet>,
    ) -> Result<ObservationLazyFrame, EnsoError> {
        let table = self
            .fetcher
            .get_frame(Some(station), DatasetKind::Precipitation)
            .await?;
        let frame = ObservationLazyFrame::new(table.lazy());
        Ok(match filters {
            Some(filters) => frame.apply(&filters),
            None => frame,
        })
    }

    /// Observations of several stations stacked with an `Estación` column.
    /// Stations that fail to load are returned alongside instead of failing the
    /// call.
    ///
    /// # Errors
    ///
    /// Fails when `stations` is empty.
    #[builder]
    pub async fn compare(
        &self,
        stations: Vec<Station>,
        filters: Option<FilterSet>,
    ) -> Result<(ObservationLazyFrame, Vec<StationFailure>), EnsoError> {
        let combined = load_stations(&self.fetcher, &stations, DatasetKind::Precipitation).await?;
        let frame = ObservationLazyFrame::new(combined.frame.lazy());
        let frame = match filters {
            Some(filters) if !combined.loaded.is_empty() => frame.apply(&filters),
            _ => frame,
        };
        Ok((frame, combined.failures))
    }

    /// The annual NDVI series of the study area.
    #[builder]
    pub async fn ndvi(&self, years: Option<(i32, i32)>) -> Result<NdviLazyFrame, EnsoError> {
        let table = self.fetcher.get_frame(None, DatasetKind::Ndvi).await?;
        let frame = NdviLazyFrame::new(table.lazy());
        Ok(match years {
            Some((start, end)) => frame.get_range(start, end),
            None => frame,
        })
    }

    /// Year-by-year correlations of a station, ready to be played with
    /// [`YearAnimation::play`] at [`DashboardConfig::animation_delay`].
    #[builder]
    pub async fn correlation_animation(
        &self,
        station: Station,
        variables: Option<Vec<String>>,
    ) -> Result<YearAnimation, EnsoError> {
        let table = self
            .fetcher
            .get_frame(Some(station), DatasetKind::Correlation)
            .await?;
        let variables = variables.unwrap_or_else(|| numeric_columns(&table));
        let variables: Vec<&str> = variables.iter().map(String::as_str).collect();
        Ok(YearAnimation::new(table, &variables)?)
    }

    /// Years, months and phases present in a station's observations.
    pub async fn filter_options(&self, station: Station) -> Result<FilterOptions, EnsoError> {
        let table = self
            .fetcher
            .get_frame(Some(station), DatasetKind::Precipitation)
            .await?;
        Ok(FilterOptions::from_frame(&table)?)
    }

    /// Any normalized table, for callers that need the raw rows.
    pub async fn table(&self, station: Option<Station>, kind: DatasetKind) -> Result<DataFrame, EnsoError> {
        Ok(self.fetcher.get_frame(station, kind).await?)
    }

    pub async fn map_layer(&self) -> MapLayer {
        MapLayer::load(&self.fetcher).await
    }

    /// Forgets every loaded table so that the next request reads the files again.
    pub async fn clear_cache(&self) {
        self.fetcher.clear().await;
    }
}
