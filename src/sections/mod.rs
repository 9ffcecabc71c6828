//! One request type and one view type per sidebar section. A request is turned
//! into a view by [`dispatch`]; anything that goes wrong on the way becomes a
//! [`Notice`] for the user rather than an error.

pub mod compare;
pub mod correlations;
pub mod graphical;
pub mod interactive_map;
pub mod introduction;
pub mod ndvi;
pub mod wavelet;

use crate::combine::StationFailure;
use crate::config::DashboardConfig;
use crate::error::EnsoError;
use crate::filtering::{FilterSet, InclusionFilter};
use crate::loading::frame_fetcher::FrameFetcher;
use crate::types::enso_phase::EnsoPhase;
use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use compare::{CompareRequest, CompareView, Comparison};
pub use correlations::{CorrelationRequest, CorrelationView};
pub use graphical::{GraphicalAnalysis, GraphicalRequest, GraphicalView};
pub use interactive_map::{MapRequest, MapView};
pub use introduction::IntroductionView;
pub use ndvi::{NdviRequest, NdviView};
pub use wavelet::{WaveletRequest, WaveletView};

/// The sidebar entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Introduction,
    GraphicalAnalysis,
    CompareStations,
    NdviAnnual,
    Correlations,
    Wavelet,
    InteractiveMap,
}

impl SectionKind {
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Introduction,
        SectionKind::GraphicalAnalysis,
        SectionKind::CompareStations,
        SectionKind::NdviAnnual,
        SectionKind::Correlations,
        SectionKind::Wavelet,
        SectionKind::InteractiveMap,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Introduction => "Introducción",
            SectionKind::GraphicalAnalysis => "Análisis Gráfico",
            SectionKind::CompareStations => "Comparar Estaciones",
            SectionKind::NdviAnnual => "NDVI - Análisis Anual",
            SectionKind::Correlations => "Correlaciones",
            SectionKind::Wavelet => "Wavelet",
            SectionKind::InteractiveMap => "Mapa Interactivo",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message shown next to (or instead of) a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Notice {
        Notice { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Notice {
        Notice { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Notice {
        Notice { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Notice {
        Notice { level: NoticeLevel::Error, message: message.into() }
    }

    pub(crate) fn station_failure(failure: &StationFailure) -> Notice {
        Notice::error(format!("Error al cargar datos de {}", failure.message))
    }
}

/// Year, month and phase selections of a filter panel. `None` keeps every
/// value, which is what the panel starts with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub years: Option<Vec<i32>>,
    pub months: Option<Vec<String>>,
    pub phases: Option<Vec<EnsoPhase>>,
}

impl FilterSelection {
    pub fn filter_set(&self) -> FilterSet {
        let mut set = FilterSet::new();
        if let Some(years) = &self.years {
            set = set.with(InclusionFilter::years(years.iter().copied()));
        }
        if let Some(months) = &self.months {
            set = set.with(InclusionFilter::months(months.iter().cloned()));
        }
        if let Some(phases) = &self.phases {
            set = set.with(InclusionFilter::phases(phases.iter().copied()));
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "section", content = "request", rename_all = "snake_case")]
pub enum SectionRequest {
    Introduction,
    GraphicalAnalysis(GraphicalRequest),
    CompareStations(CompareRequest),
    NdviAnnual(NdviRequest),
    Correlations(CorrelationRequest),
    Wavelet(WaveletRequest),
    InteractiveMap(MapRequest),
}

impl SectionRequest {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionRequest::Introduction => SectionKind::Introduction,
            SectionRequest::GraphicalAnalysis(_) => SectionKind::GraphicalAnalysis,
            SectionRequest::CompareStations(_) => SectionKind::CompareStations,
            SectionRequest::NdviAnnual(_) => SectionKind::NdviAnnual,
            SectionRequest::Correlations(_) => SectionKind::Correlations,
            SectionRequest::Wavelet(_) => SectionKind::Wavelet,
            SectionRequest::InteractiveMap(_) => SectionKind::InteractiveMap,
        }
    }

    /// What the user is looking at, named in error notices.
    fn subject(&self) -> String {
        match self {
            SectionRequest::GraphicalAnalysis(r) => r.station.label(),
            SectionRequest::Wavelet(r) => r.station.label(),
            SectionRequest::Correlations(r) => r.subject(),
            SectionRequest::NdviAnnual(_) => "NDVI anual".to_string(),
            SectionRequest::CompareStations(_) => "la comparación".to_string(),
            SectionRequest::InteractiveMap(_) => "el mapa".to_string(),
            SectionRequest::Introduction => "la introducción".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SectionView {
    Introduction(IntroductionView),
    GraphicalAnalysis(GraphicalView),
    CompareStations(CompareView),
    NdviAnnual(Box<NdviView>),
    Correlations(CorrelationView),
    Wavelet(WaveletView),
    InteractiveMap(MapView),
}

/// A view, when one could be built, and the notices to show with it.
#[derive(Debug, Clone)]
pub struct SectionResponse {
    pub kind: SectionKind,
    pub view: Option<SectionView>,
    pub notices: Vec<Notice>,
}

impl SectionResponse {
    pub(crate) fn new(kind: SectionKind, view: SectionView) -> SectionResponse {
        SectionResponse {
            kind,
            view: Some(view),
            notices: Vec::new(),
        }
    }

    /// A response with notices only.
    pub(crate) fn empty(kind: SectionKind) -> SectionResponse {
        SectionResponse {
            kind,
            view: None,
            notices: Vec::new(),
        }
    }

    pub(crate) fn notice(mut self, notice: Notice) -> SectionResponse {
        self.notices.push(notice);
        self
    }

    pub(crate) fn notices(mut self, notices: impl IntoIterator<Item = Notice>) -> SectionResponse {
        self.notices.extend(notices);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }
}

/// What a section needs to build its view.
#[derive(Clone, Copy)]
pub struct SectionContext<'a> {
    pub fetcher: &'a FrameFetcher,
    pub config: &'a DashboardConfig,
}

/// Builds the view for `request`. Never fails: errors are reported as notices
/// naming the station or dataset involved.
pub async fn dispatch(ctx: SectionContext<'_>, request: SectionRequest) -> SectionResponse {
    let kind = request.kind();
    let subject = request.subject();
    let result: Result<SectionResponse, EnsoError> = match request {
        SectionRequest::Introduction => Ok(introduction::render()),
        SectionRequest::GraphicalAnalysis(r) => graphical::render(ctx, r).await,
        SectionRequest::CompareStations(r) => compare::render(ctx, r).await,
        SectionRequest::NdviAnnual(r) => ndvi::render(ctx, r).await,
        SectionRequest::Correlations(r) => correlations::render(ctx, r).await,
        SectionRequest::Wavelet(r) => wavelet::render(ctx, r).await,
        SectionRequest::InteractiveMap(r) => interactive_map::render(ctx, r).await,
    };
    result.unwrap_or_else(|e| {
        error!("{} failed for {}: {}", kind, subject, e);
        SectionResponse::empty(kind).notice(Notice::error(format!(
            "Error al cargar datos de {}: {}",
            subject, e
        )))
    })
}

#[cfg(test)]
pub(crate) mod test_data {
    use std::fs;
    use std::path::Path;

    /// Writes a small precipitation table for `station` under `root`.
    pub(crate) fn write_precipitation(root: &Path, station: u8, rows: &[(&str, f64, f64, &str)]) {
        let dir = root.join(format!("Estacion {}", station));
        fs::create_dir_all(&dir).unwrap();
        let mut csv = String::from("FECHA,Precipitacion (mm),SPI,Fase_ENSO\n");
        for (date, precipitation, spi, phase) in rows {
            csv.push_str(&format!("{},{},{},{}\n", date, precipitation, spi, phase));
        }
        fs::write(dir.join("Boxplot precipitacion y spi.csv"), csv).unwrap();
    }

    pub(crate) fn write_csv(root: &Path, dir: &str, stem: &str, content: &str) {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.csv", stem)), content).unwrap();
    }

    pub(crate) fn sample_rows() -> Vec<(&'static str, f64, f64, &'static str)> {
        vec![
            ("1997-01-01", 10.0, -0.5, "Niño"),
            ("1997-02-01", 30.0, 0.2, "Niño"),
            ("1998-01-01", 40.0, 1.1, "Niña"),
            ("1998-02-01", 50.0, 1.5, "Niña"),
            ("1999-01-01", 5.0, -1.2, "Neutro"),
        ]
    }
}
