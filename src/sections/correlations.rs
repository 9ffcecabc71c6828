//! Correlation heatmaps of one station, two stations side by side, or one
//! station year by year.

use crate::analysis::correlation::{correlation_matrix, CorrelationMatrix};
use crate::animation::{AnimationFrame, Direction, FrameContent, YearAnimation};
use crate::error::EnsoError;
use crate::sections::{Notice, SectionContext, SectionKind, SectionResponse, SectionView};
use crate::types::dataset::DatasetKind;
use crate::types::station::Station;
use crate::utils::numeric_columns;
use log::warn;
use polars::prelude::DataFrame;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum CorrelationRequest {
    Single {
        station: Station,
        /// `None` selects every numeric variable.
        #[serde(default)]
        variables: Option<Vec<String>>,
    },
    Pair {
        first: Station,
        second: Station,
        /// `None` selects every numeric variable of the first station.
        #[serde(default)]
        variables: Option<Vec<String>>,
    },
    Animated {
        station: Station,
        #[serde(default)]
        variables: Option<Vec<String>>,
        /// `None` starts from the first year.
        #[serde(default)]
        start_year: Option<i32>,
        #[serde(default)]
        direction: Direction,
    },
}

impl CorrelationRequest {
    pub(crate) fn subject(&self) -> String {
        match self {
            CorrelationRequest::Single { station, .. } | CorrelationRequest::Animated { station, .. } => {
                station.label()
            }
            CorrelationRequest::Pair { first, second, .. } => {
                format!("{} y {}", first.label(), second.label())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum CorrelationView {
    Single {
        station: Station,
        /// Numeric variables offered for selection.
        available: Vec<String>,
        matrix: CorrelationMatrix,
    },
    /// Matrices of the stations that could be computed, in request order.
    Pair {
        variables: Vec<String>,
        matrices: Vec<(Station, CorrelationMatrix)>,
    },
    Animated {
        station: Station,
        years: Vec<i32>,
        start_year: i32,
        direction: Direction,
        frames: Vec<AnimationFrame>,
        /// Pause between frames when playing them back.
        delay: Duration,
    },
}

pub(crate) async fn render(ctx: SectionContext<'_>, request: CorrelationRequest) -> Result<SectionResponse, EnsoError> {
    let kind = SectionKind::Correlations;
    let mut notices = Vec::new();

    let view = match request {
        CorrelationRequest::Single { station, variables } => {
            let table = ctx.fetcher.get_frame(Some(station), DatasetKind::Correlation).await?;
            let available = numeric_columns(&table);
            let selected = variables.unwrap_or_else(|| available.clone());
            CorrelationView::Single {
                station,
                matrix: correlation_matrix(&table, &as_strs(&selected))?,
                available,
            }
        }
        CorrelationRequest::Pair {
            first,
            second,
            variables,
        } => {
            let mut tables: Vec<(Station, DataFrame)> = Vec::new();
            for station in [first, second] {
                match ctx.fetcher.get_frame(Some(station), DatasetKind::Correlation).await {
                    Ok(table) => tables.push((station, table)),
                    Err(e) => {
                        warn!("Correlation table of {} unavailable: {}", station, e);
                        notices.push(Notice::error(format!(
                            "Error al cargar la correlación de {}: {}",
                            station.label(),
                            e
                        )));
                    }
                }
            }
            let variables = match variables {
                Some(variables) => variables,
                None => match tables.iter().find(|(station, _)| *station == first) {
                    Some((_, table)) => numeric_columns(table),
                    None => {
                        notices.push(Notice::warning(
                            "No se pudieron cargar las variables disponibles.",
                        ));
                        tables.first().map(|(_, t)| numeric_columns(t)).unwrap_or_default()
                    }
                },
            };

            let mut matrices = Vec::new();
            for (station, table) in &tables {
                match correlation_matrix(table, &as_strs(&variables)) {
                    Ok(matrix) => matrices.push((*station, matrix)),
                    Err(e) => notices.push(Notice::warning(format!("{}: {}", station.label(), e))),
                }
            }
            if matrices.is_empty() {
                return Ok(SectionResponse::empty(kind).notices(notices));
            }
            CorrelationView::Pair { variables, matrices }
        }
        CorrelationRequest::Animated {
            station,
            variables,
            start_year,
            direction,
        } => {
            let table = ctx.fetcher.get_frame(Some(station), DatasetKind::Correlation).await?;
            let selected = variables.unwrap_or_else(|| numeric_columns(&table));
            let animation = YearAnimation::new(table, &as_strs(&selected))?;
            let Some(first_year) = animation.years().first().copied() else {
                return Ok(SectionResponse::empty(kind).notice(Notice::warning(format!(
                    "No hay años con datos para {}.",
                    station.label()
                ))));
            };
            let start_year = start_year.unwrap_or(first_year);
            let frames = animation.frames(start_year, direction)?;
            notices.extend(frames.iter().filter_map(|frame| match &frame.content {
                FrameContent::Warning { message } => Some(Notice::warning(message.clone())),
                FrameContent::Matrix(_) => None,
            }));
            CorrelationView::Animated {
                station,
                years: animation.years().to_vec(),
                start_year,
                direction,
                frames,
                delay: ctx.config.animation_delay()?,
            }
        }
    };

    Ok(SectionResponse::new(kind, SectionView::Correlations(view)).notices(notices))
}

fn as_strs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}
