use crate::sections::{Notice, SectionKind, SectionResponse, SectionView};
use crate::types::station::{LatLon, Station};
use serde::Serialize;

pub const FIRST_YEAR: i32 = 1992;
pub const LAST_YEAR: i32 = 2022;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntroductionView {
    pub title: &'static str,
    pub summary: &'static str,
    pub period: (i32, i32),
    pub stations: Vec<(Station, LatLon)>,
    /// Sections reachable from the sidebar.
    pub sections: Vec<SectionKind>,
}

pub(crate) fn render() -> SectionResponse {
    let view = IntroductionView {
        title: "ENSO y Precipitación en el Chocó Andino",
        summary: "Relación entre los eventos ENSO (El Niño, La Niña y Neutro) y la \
                  precipitación en seis estaciones del Chocó Andino.",
        period: (FIRST_YEAR, LAST_YEAR),
        stations: Station::all().into_iter().map(|s| (s, s.location())).collect(),
        sections: SectionKind::ALL.to_vec(),
    };
    SectionResponse::new(SectionKind::Introduction, SectionView::Introduction(view)).notice(
        Notice::success("Usa el panel lateral para navegar entre las secciones del proyecto."),
    )
}
