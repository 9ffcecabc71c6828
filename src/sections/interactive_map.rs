use crate::error::EnsoError;
use crate::map::{BoundingBox, MapLayer, MapSnapshot, MapVariable};
use crate::sections::{Notice, SectionContext, SectionKind, SectionResponse, SectionView};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapRequest {
    pub variable: MapVariable,
    /// `None` shows the first available year.
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Slider range: every year with a summary in any station.
    pub years: Vec<i32>,
    pub snapshot: MapSnapshot,
    /// `None` when the boundary file is absent or unreadable.
    pub boundary: Option<BoundingBox>,
}

pub(crate) async fn render(ctx: SectionContext<'_>, request: MapRequest) -> Result<SectionResponse, EnsoError> {
    let kind = SectionKind::InteractiveMap;
    let layer = MapLayer::load(ctx.fetcher).await;
    // stations without a summary are simply left off the map
    let mut notices: Vec<Notice> = layer
        .failures
        .iter()
        .map(|f| Notice::info(format!("Sin resumen anual para {}", f.station.label())))
        .collect();

    let boundary = match BoundingBox::from_file(&ctx.config.boundary_path()) {
        Ok(boundary) => boundary,
        Err(e) => {
            warn!("Ignoring boundary: {}", e);
            notices.push(Notice::warning(format!("No se pudo leer el límite del Chocó Andino: {}", e)));
            None
        }
    };

    let years = layer.available_years()?;
    let Some(first_year) = years.first().copied() else {
        return Ok(SectionResponse::empty(kind)
            .notices(notices)
            .notice(Notice::warning("No hay datos anuales para ninguna estación.")));
    };
    let year = request.year.unwrap_or(first_year);
    let snapshot = layer.snapshot(year, request.variable)?;
    if !snapshot.markers.is_empty() {
        notices.push(Notice::success(
            "Cambia el año y observa cómo los colores del mapa reflejan las diferencias de valor entre estaciones.",
        ));
    }

    let view = MapView {
        years,
        snapshot,
        boundary,
    };
    Ok(SectionResponse::new(kind, SectionView::InteractiveMap(view)).notices(notices))
}
