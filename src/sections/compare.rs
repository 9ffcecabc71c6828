//! Side-by-side statistics of several stations over a shared filter.

use crate::analysis::aggregate::{group_statistic, Statistic};
use crate::analysis::summary::{climate_panel, station_summary, station_summary_frame, ClimateClass, StationSummary};
use crate::combine::load_stations;
use crate::error::EnsoError;
use crate::filtering::{select_variables, FilterSet, InclusionFilter};
use crate::sections::{FilterSelection, Notice, SectionContext, SectionKind, SectionResponse, SectionView};
use crate::types::columns::{PRECIPITATION, SPI, STATION, YEAR};
use crate::types::dataset::DatasetKind;
use crate::types::station::Station;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    SummaryTable,
    Boxplots,
    YearlyMeanSpi,
    AnnualPrecipitation,
    Panel,
    Heatmap,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompareRequest {
    /// `None` uses the configured default stations.
    #[serde(default)]
    pub stations: Option<Vec<Station>>,
    pub comparison: Comparison,
    #[serde(default)]
    pub filters: FilterSelection,
}

/// Headline figures of one station in the comparison panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationPanel {
    pub station: Station,
    pub spi_median: f64,
    pub total_precipitation: f64,
    pub climate_class: ClimateClass,
}

#[derive(Debug, Clone)]
pub enum CompareView {
    SummaryTable {
        table: DataFrame,
        summary: StationSummary,
    },
    /// `Estación`, `SPI`, `Precipitación` rows for per-station boxplots.
    Boxplots { table: DataFrame },
    /// Mean SPI per (`Año`, `Estación`).
    YearlyMeanSpi { table: DataFrame },
    /// Precipitation summed per (`Año`, `Estación`).
    AnnualPrecipitation { table: DataFrame },
    Panel { panels: Vec<StationPanel> },
    /// The summary table, one row per station, for a heatmap.
    Heatmap { table: DataFrame },
}

pub(crate) async fn render(ctx: SectionContext<'_>, request: CompareRequest) -> Result<SectionResponse, EnsoError> {
    let kind = SectionKind::CompareStations;
    let stations = request
        .stations
        .unwrap_or_else(|| ctx.config.default_stations.clone());
    if stations.is_empty() {
        return Ok(SectionResponse::empty(kind).notice(Notice::warning(
            "Debes seleccionar al menos una estación.",
        )));
    }

    let combined = load_stations(ctx.fetcher, &stations, DatasetKind::Precipitation).await?;
    let mut notices: Vec<Notice> = combined.failures.iter().map(Notice::station_failure).collect();
    if combined.is_empty() {
        return Ok(SectionResponse::empty(kind).notices(notices));
    }

    let filtered = request.filters.filter_set().apply(&combined.frame)?;
    let view = match request.comparison {
        Comparison::SummaryTable => {
            let summary = station_summary(&filtered)?;
            notices.push(match &summary.highlights {
                Some(h) => Notice::success(format!(
                    "La estación con mayor precipitación promedio es {}. El SPI más alto fue registrado en {}. El SPI más bajo se encuentra en {}.",
                    h.wettest, h.highest_spi, h.lowest_spi
                )),
                None => Notice::info("No se pudo generar interpretación automática."),
            });
            CompareView::SummaryTable {
                table: station_summary_frame(&filtered)?,
                summary,
            }
        }
        Comparison::Boxplots => CompareView::Boxplots {
            table: select_variables(&filtered, &[STATION, SPI, PRECIPITATION])?,
        },
        Comparison::YearlyMeanSpi => CompareView::YearlyMeanSpi {
            table: group_statistic(&filtered, &[YEAR, STATION], SPI, Statistic::Mean)?,
        },
        Comparison::AnnualPrecipitation => CompareView::AnnualPrecipitation {
            table: group_statistic(&filtered, &[YEAR, STATION], PRECIPITATION, Statistic::Sum)?,
        },
        Comparison::Panel => {
            let mut panels = Vec::new();
            for station in &combined.loaded {
                let rows = FilterSet::new()
                    .with(InclusionFilter::stations([*station]))
                    .apply(&filtered)?;
                match climate_panel(&rows) {
                    Ok(panel) => panels.push(StationPanel {
                        station: *station,
                        spi_median: panel.spi_median,
                        total_precipitation: panel.total_precipitation,
                        climate_class: panel.climate_class,
                    }),
                    Err(e) => notices.push(Notice::warning(format!(
                        "Sin datos suficientes para {}: {}",
                        station.label(),
                        e
                    ))),
                }
            }
            CompareView::Panel { panels }
        }
        Comparison::Heatmap => CompareView::Heatmap {
            table: station_summary_frame(&filtered)?,
        },
    };

    Ok(SectionResponse::new(kind, SectionView::CompareStations(view)).notices(notices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::loading::frame_fetcher::FrameFetcher;
    use crate::sections::test_data::{sample_rows, write_precipitation};
    use crate::sections::NoticeLevel;
    use tempfile::tempdir;

    async fn run(root: &std::path::Path, request: CompareRequest) -> SectionResponse {
        let config = DashboardConfig::with_data_dir(root);
        let fetcher = FrameFetcher::new(root, true);
        let ctx = SectionContext { fetcher: &fetcher, config: &config };
        render(ctx, request).await.unwrap()
    }

    fn request(stations: Option<Vec<u8>>, comparison: Comparison) -> CompareRequest {
        CompareRequest {
            stations: stations.map(|s| s.into_iter().filter_map(Station::new).collect()),
            comparison,
            filters: FilterSelection::default(),
        }
    }

    #[tokio::test]
    async fn test_summary_with_one_failing_station() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        write_precipitation(root.path(), 1, &sample_rows());
        write_precipitation(root.path(), 3, &[("2000-01-01", 500.0, 2.0, "Niña")]);

        let response = run(root.path(), request(Some(vec![1, 2, 3]), Comparison::SummaryTable)).await;
        let errors: Vec<&Notice> = response
            .notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Estacion 2"));

        let Some(SectionView::CompareStations(CompareView::SummaryTable { table, summary })) = response.view else {
            panic!("expected the summary table");
        };
        assert_eq!(table.height(), 2);
        let highlights = summary.highlights.unwrap();
        assert_eq!(highlights.wettest, "Estacion 3");
        assert_eq!(highlights.lowest_spi, "Estacion 1");
        Ok(())
    }

    #[tokio::test]
    async fn test_default_stations_and_panel() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        write_precipitation(root.path(), 1, &sample_rows());
        write_precipitation(root.path(), 2, &sample_rows());

        let response = run(root.path(), request(None, Comparison::Panel)).await;
        let Some(SectionView::CompareStations(CompareView::Panel { panels })) = response.view else {
            panic!("expected the panel");
        };
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].total_precipitation, 135.0);
        assert_eq!(panels[0].climate_class, ClimateClass::Normal);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_station_selected() {
        let root = tempdir().unwrap();
        let response = run(root.path(), request(Some(Vec::new()), Comparison::Boxplots)).await;
        assert!(response.view.is_none());
        assert_eq!(response.notices[0].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_all_stations_failing_shows_only_errors() {
        let root = tempdir().unwrap();
        let response = run(root.path(), request(Some(vec![4, 5]), Comparison::Heatmap)).await;
        assert!(response.view.is_none());
        assert_eq!(response.notices.len(), 2);
        assert!(response.has_errors());
    }
}
