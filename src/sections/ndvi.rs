//! Annual NDVI of the study area: indicators, trend, anomalies and a comparison
//! of two periods.

use crate::analysis::anomaly::{label_frame, AnomalyBand, AnomalyLabel};
use crate::analysis::trend::{histogram, period_mean, HistogramBin, NdviConclusion, PeriodMean, TrendDirection, Trendline};
use crate::error::EnsoError;
use crate::sections::{Notice, SectionContext, SectionKind, SectionResponse, SectionView};
use crate::types::columns::{NDVI_ANNUAL, YEAR};
use crate::types::dataset::DatasetKind;
use crate::types::frames::ndvi_frame::NdviLazyFrame;
use crate::utils::{f64_values, i32_values, mean, min_max, sample_std};
use polars::prelude::{DataFrame, IntoLazy};
use serde::{Deserialize, Serialize};

const DEFAULT_PERIOD_A: (i32, i32) = (1992, 2005);
const DEFAULT_PERIOD_B: (i32, i32) = (2006, 2022);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NdviRequest {
    /// Inclusive year range; `None` keeps every year.
    pub years: Option<(i32, i32)>,
    /// Inclusive NDVI range; `None` uses the configured default.
    pub ndvi_range: Option<(f64, f64)>,
    pub period_a: Option<(i32, i32)>,
    pub period_b: Option<(i32, i32)>,
    pub histogram_bins: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NdviKpis {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: Option<f64>,
    pub trend: Option<TrendDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NdviAnomaly {
    pub year: i32,
    pub value: f64,
    pub label: AnomalyLabel,
}

#[derive(Debug, Clone)]
pub struct NdviView {
    /// Filtered years with an `Anomalía` column.
    pub table: DataFrame,
    /// `None` when no year is left after filtering.
    pub kpis: Option<NdviKpis>,
    /// NDVI against year.
    pub trendline: Option<Trendline>,
    pub histogram: Vec<HistogramBin>,
    /// One animation frame per filtered year.
    pub frames: Vec<(i32, f64)>,
    pub anomalies: Vec<NdviAnomaly>,
    /// Period means, computed over the unfiltered series.
    pub periods: [PeriodMean; 2],
    pub conclusion: Option<NdviConclusion>,
}

pub(crate) async fn render(ctx: SectionContext<'_>, request: NdviRequest) -> Result<SectionResponse, EnsoError> {
    let series = ctx.fetcher.get_frame(None, DatasetKind::Ndvi).await?;
    let settings = &ctx.config.ndvi;
    let mut notices = Vec::new();

    let mut frame = NdviLazyFrame::new(series.clone().lazy());
    if let Some((start, end)) = request.years {
        frame = frame.get_range(start, end);
    }
    let (min, max) = request.ndvi_range.unwrap_or((settings.min, settings.max));
    let filtered = frame.within(min, max).frame.collect()?;

    let years = i32_values(&filtered, YEAR)?;
    let values = f64_values(&filtered, NDVI_ANNUAL)?;
    let points: Vec<(i32, f64)> = years
        .into_iter()
        .zip(values)
        .filter_map(|(year, value)| Some((year?, value?)))
        .collect();
    let ndvi: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

    let kpis = match (mean(&ndvi), min_max(&ndvi)) {
        (Some(mean), Some((min, max))) => Some(NdviKpis {
            mean,
            min,
            max,
            std: sample_std(&ndvi),
            trend: TrendDirection::of(&ndvi),
        }),
        _ => {
            notices.push(Notice::warning("No hay años con NDVI en el rango seleccionado."));
            None
        }
    };

    let anomalies = match AnomalyBand::from_values(&ndvi) {
        Some(band) => points
            .iter()
            .map(|&(year, value)| NdviAnomaly {
                year,
                value,
                label: band.classify(value),
            })
            .collect(),
        None => Vec::new(),
    };

    let (a, b) = (
        request.period_a.unwrap_or(DEFAULT_PERIOD_A),
        request.period_b.unwrap_or(DEFAULT_PERIOD_B),
    );
    let periods = [period_mean(&series, a.0, a.1)?, period_mean(&series, b.0, b.1)?];

    let conclusion = kpis.map(|k| NdviConclusion::from_mean(k.mean));
    if let Some(conclusion) = conclusion {
        notices.push(match conclusion {
            NdviConclusion::Low => Notice::warning(conclusion.message()),
            NdviConclusion::Moderate => Notice::info(conclusion.message()),
            NdviConclusion::High => Notice::success(conclusion.message()),
        });
    }

    let trend_points: Vec<(f64, f64)> = points.iter().map(|&(y, v)| (y as f64, v)).collect();
    let view = NdviView {
        table: label_frame(&filtered, NDVI_ANNUAL)?,
        kpis,
        trendline: Trendline::fit(&trend_points),
        histogram: histogram(&ndvi, request.histogram_bins.unwrap_or(settings.histogram_bins))?,
        frames: points,
        anomalies,
        periods,
        conclusion,
    };
    Ok(SectionResponse::new(SectionKind::NdviAnnual, SectionView::NdviAnnual(Box::new(view))).notices(notices))
}
