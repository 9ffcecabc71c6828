//! Per-station charts of precipitation and SPI against the ENSO phase.

use crate::analysis::aggregate::annual_accumulation;
use crate::analysis::error::AnalysisError;
use crate::analysis::summary::{climate_panel, phase_medians, ClimatePanel, PhaseMedians};
use crate::analysis::trend::Trendline;
use crate::error::EnsoError;
use crate::filtering::{select_variables, FilterSet, InclusionFilter};
use crate::sections::{FilterSelection, Notice, SectionContext, SectionKind, SectionResponse, SectionView};
use crate::types::columns::{DATE, ENSO_PHASE, MONTH, PRECIPITATION, SPI, YEAR};
use crate::types::dataset::DatasetKind;
use crate::types::enso_phase::EnsoPhase;
use crate::types::station::Station;
use crate::utils::{f64_values, string_values};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Columns the custom visualizer offers on the x axis.
pub const CUSTOM_X: [&str; 5] = [DATE, YEAR, MONTH, SPI, PRECIPITATION];
/// Columns the custom visualizer offers on the y axis.
pub const CUSTOM_Y: [&str; 2] = [SPI, PRECIPITATION];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Line,
    Scatter,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum GraphicalAnalysis {
    Boxplots,
    TimeSeries,
    ScatterAndAnnual,
    /// Computed over the whole station table; filters do not apply.
    ClimatePanel,
    Custom {
        x: String,
        y: Vec<String>,
        chart: ChartKind,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphicalRequest {
    pub station: Station,
    pub analysis: GraphicalAnalysis,
    #[serde(default)]
    pub filters: FilterSelection,
}

/// OLS fit of precipitation on SPI within one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTrend {
    pub phase: EnsoPhase,
    /// `None` with fewer than two points or a constant SPI.
    pub trendline: Option<Trendline>,
}

#[derive(Debug, Clone)]
pub enum GraphicalView {
    Boxplots {
        table: DataFrame,
        medians: Vec<PhaseMedians>,
    },
    TimeSeries {
        /// `Fecha`, `SPI` from the SPI table, filtered by year only.
        spi: DataFrame,
        /// `Fecha`, `Precipitación`, `Fase_ENSO`.
        precipitation: DataFrame,
    },
    ScatterAndAnnual {
        /// Precipitation summed per (`Año`, `Fase_ENSO`).
        annual: DataFrame,
        scatter: DataFrame,
        trendlines: Vec<PhaseTrend>,
    },
    ClimatePanel {
        panel: ClimatePanel,
        spi_series: DataFrame,
    },
    Custom {
        table: DataFrame,
        x: String,
        y: Vec<String>,
        chart: ChartKind,
    },
}

pub(crate) async fn render(ctx: SectionContext<'_>, request: GraphicalRequest) -> Result<SectionResponse, EnsoError> {
    let station = request.station;
    let table = ctx.fetcher.get_frame(Some(station), DatasetKind::Precipitation).await?;
    let filters = request.filters.filter_set();
    let mut notices = Vec::new();

    let view = match request.analysis {
        GraphicalAnalysis::Boxplots => {
            let filtered = filtered(&table, &filters, &mut notices)?;
            let medians = phase_medians(&filtered)?;
            notices.push(Notice::info(medians_message(&medians)));
            GraphicalView::Boxplots {
                table: select_variables(&filtered, &[ENSO_PHASE, PRECIPITATION, SPI])?,
                medians,
            }
        }
        GraphicalAnalysis::TimeSeries => {
            let spi_table = ctx.fetcher.get_frame(Some(station), DatasetKind::Spi).await?;
            let mut year_filter = FilterSet::new();
            if let Some(years) = &request.filters.years {
                year_filter = year_filter.with(InclusionFilter::years(years.iter().copied()));
            }
            let spi = select_variables(&year_filter.apply(&spi_table)?, &[DATE, SPI])?;
            let filtered = filtered(&table, &filters, &mut notices)?;
            GraphicalView::TimeSeries {
                spi,
                precipitation: select_variables(&filtered, &[DATE, PRECIPITATION, ENSO_PHASE])?,
            }
        }
        GraphicalAnalysis::ScatterAndAnnual => {
            let filtered = filtered(&table, &filters, &mut notices)?;
            GraphicalView::ScatterAndAnnual {
                annual: annual_accumulation(&filtered, PRECIPITATION, Some(ENSO_PHASE))?,
                trendlines: phase_trends(&filtered)?,
                scatter: select_variables(&filtered, &[SPI, PRECIPITATION, ENSO_PHASE])?,
            }
        }
        GraphicalAnalysis::ClimatePanel => GraphicalView::ClimatePanel {
            panel: climate_panel(&table)?,
            spi_series: select_variables(&table, &[DATE, SPI])?,
        },
        GraphicalAnalysis::Custom { x, y, chart } => {
            let filtered = filtered(&table, &filters, &mut notices)?;
            let table = select_variables(&filtered, &custom_columns(&x, &y)?)?;
            GraphicalView::Custom {
                table,
                x,
                y,
                chart,
            }
        }
    };

    Ok(
        SectionResponse::new(SectionKind::GraphicalAnalysis, SectionView::GraphicalAnalysis(view))
            .notices(notices),
    )
}

fn filtered(table: &DataFrame, filters: &FilterSet, notices: &mut Vec<Notice>) -> Result<DataFrame, AnalysisError> {
    let filtered = filters.apply(table)?;
    if filtered.height() == 0 {
        notices.push(Notice::warning("No hay datos para los filtros seleccionados."));
    }
    Ok(filtered)
}

fn medians_message(medians: &[PhaseMedians]) -> String {
    let parts: Vec<String> = medians
        .iter()
        .map(|m| match m.precipitation {
            Some(value) => format!("{} = {:.1} mm", m.phase, value),
            None => format!("{} = sin datos", m.phase),
        })
        .collect();
    format!("Medianas: {}.", parts.join(", "))
}

fn phase_trends(df: &DataFrame) -> Result<Vec<PhaseTrend>, AnalysisError> {
    let phases = string_values(df, ENSO_PHASE)?;
    let spi = f64_values(df, SPI)?;
    let precipitation = f64_values(df, PRECIPITATION)?;

    Ok(EnsoPhase::ALL
        .iter()
        .map(|&phase| {
            let points: Vec<(f64, f64)> = phases
                .iter()
                .zip(spi.iter().zip(&precipitation))
                .filter(|(label, _)| label.as_deref().and_then(EnsoPhase::from_label) == Some(phase))
                .filter_map(|(_, (x, y))| Some(((*x)?, (*y)?)))
                .collect();
            PhaseTrend {
                phase,
                trendline: Trendline::fit(&points),
            }
        })
        .collect())
}

fn custom_columns<'a>(x: &'a str, y: &'a [String]) -> Result<Vec<&'a str>, AnalysisError> {
    if !CUSTOM_X.contains(&x) {
        return Err(AnalysisError::UnknownColumn(x.to_string()));
    }
    if y.is_empty() {
        return Err(AnalysisError::EmptySelection("no y-axis variable selected".to_string()));
    }
    let mut columns = vec![x];
    for name in y {
        if !CUSTOM_Y.contains(&name.as_str()) {
            return Err(AnalysisError::UnknownColumn(name.clone()));
        }
        if !columns.contains(&name.as_str()) {
            columns.push(name.as_str());
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::loading::frame_fetcher::FrameFetcher;
    use crate::sections::test_data::{sample_rows, write_csv, write_precipitation};
    use crate::sections::NoticeLevel;
    use tempfile::tempdir;

    async fn run(root: &std::path::Path, analysis: GraphicalAnalysis, filters: FilterSelection) -> SectionResponse {
        let config = DashboardConfig::with_data_dir(root);
        let fetcher = FrameFetcher::new(root, true);
        let ctx = SectionContext { fetcher: &fetcher, config: &config };
        let request = GraphicalRequest {
            station: Station::new(1).unwrap(),
            analysis,
            filters,
        };
        render(ctx, request).await.unwrap()
    }

    #[tokio::test]
    async fn test_boxplots_report_phase_medians() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        write_precipitation(root.path(), 1, &sample_rows());

        let response = run(root.path(), GraphicalAnalysis::Boxplots, FilterSelection::default()).await;
        let Some(SectionView::GraphicalAnalysis(GraphicalView::Boxplots { table, medians })) = response.view else {
            panic!("expected boxplots");
        };
        assert_eq!(table.height(), 5);
        assert_eq!(medians[0].precipitation, Some(20.0));
        assert_eq!(medians[1].precipitation, Some(45.0));
        assert_eq!(medians[2].precipitation, Some(5.0));
        assert_eq!(
            response.notices[0].message,
            "Medianas: Niño = 20.0 mm, Niña = 45.0 mm, Neutro = 5.0 mm."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_filter_warns() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        write_precipitation(root.path(), 1, &sample_rows());
        let filters = FilterSelection {
            years: Some(Vec::new()),
            ..Default::default()
        };
        let response = run(root.path(), GraphicalAnalysis::ScatterAndAnnual, filters).await;
        assert!(response.view.is_some());
        assert_eq!(response.notices[0].level, NoticeLevel::Warning);
        Ok(())
    }

    #[tokio::test]
    async fn test_scatter_trendlines_per_phase() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        write_precipitation(root.path(), 1, &sample_rows());
        let response = run(root.path(), GraphicalAnalysis::ScatterAndAnnual, FilterSelection::default()).await;
        let Some(SectionView::GraphicalAnalysis(GraphicalView::ScatterAndAnnual { annual, trendlines, .. })) =
            response.view
        else {
            panic!("expected scatter view");
        };
        assert_eq!(annual.height(), 3);
        assert!(trendlines[0].trendline.is_some());
        assert!(trendlines[2].trendline.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_time_series_uses_spi_table() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        write_precipitation(root.path(), 1, &sample_rows());
        write_csv(root.path(), "Estacion 1", "SPI", "FECHA,SPI\n1997-01-01,0.1\n1998-01-01,0.2\n");
        let filters = FilterSelection {
            years: Some(vec![1998]),
            ..Default::default()
        };
        let response = run(root.path(), GraphicalAnalysis::TimeSeries, filters).await;
        let Some(SectionView::GraphicalAnalysis(GraphicalView::TimeSeries { spi, precipitation })) = response.view
        else {
            panic!("expected time series");
        };
        assert_eq!(spi.height(), 1);
        assert_eq!(precipitation.height(), 2);
        Ok(())
    }

    #[test]
    fn test_custom_columns() {
        let y = vec![SPI.to_string(), SPI.to_string()];
        assert_eq!(custom_columns(DATE, &y).unwrap(), vec![DATE, SPI]);
        assert!(matches!(custom_columns(DATE, &[]), Err(AnalysisError::EmptySelection(_))));
        assert!(custom_columns("Humedad", &y).is_err());
    }
}
