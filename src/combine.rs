//! Multi-station tables: per-station frames tagged with an `Estación` column and
//! stacked into one.

use crate::analysis::error::AnalysisError;
use crate::error::EnsoError;
use crate::loading::frame_fetcher::FrameFetcher;
use crate::types::columns::STATION;
use crate::types::dataset::DatasetKind;
use crate::types::station::Station;
use log::{info, warn};
use polars::prelude::*;
use serde::Serialize;

/// A station that could not be loaded, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationFailure {
    pub station: Station,
    pub message: String,
}

/// Result of loading the same dataset for several stations.
#[derive(Debug, Clone)]
pub struct CombinedFrame {
    /// Tagged rows of every loaded station; empty when nothing loaded.
    pub frame: DataFrame,
    pub loaded: Vec<Station>,
    pub failures: Vec<StationFailure>,
}

impl CombinedFrame {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// Adds an `Estación` column holding the station label.
pub fn tag_station(df: DataFrame, station: Station) -> LazyFrame {
    df.lazy().with_column(lit(station.label()).alias(STATION))
}

/// Stacks per-station tables in the given order. Columns absent in some
/// stations are filled with nulls; no row is deduplicated.
pub fn combine(frames: Vec<(Station, DataFrame)>) -> Result<DataFrame, AnalysisError> {
    if frames.is_empty() {
        return Err(AnalysisError::EmptySelection("no station selected".to_string()));
    }
    let tagged: Vec<LazyFrame> = frames
        .into_iter()
        .map(|(station, df)| tag_station(df, station))
        .collect();
    let args = UnionArgs {
        to_supertypes: true,
        ..Default::default()
    };
    Ok(concat_lf_diagonal(tagged, args)?.collect()?)
}

/// Loads `kind` for every requested station and combines what loaded. A station
/// that fails is reported in [`CombinedFrame::failures`] instead of failing the
/// whole request.
pub async fn load_stations(
    fetcher: &FrameFetcher,
    stations: &[Station],
    kind: DatasetKind,
) -> Result<CombinedFrame, EnsoError> {
    if stations.is_empty() {
        return Err(AnalysisError::EmptySelection("no station selected".to_string()).into());
    }

    let mut frames = Vec::with_capacity(stations.len());
    let mut failures = Vec::new();
    for &station in stations {
        match fetcher.get_frame(Some(station), kind).await {
            Ok(df) => frames.push((station, df)),
            Err(e) => {
                warn!("Skipping {} for {}: {}", station, kind, e);
                failures.push(StationFailure {
                    station,
                    message: format!("{}: {}", station.label(), e),
                });
            }
        }
    }

    let loaded: Vec<Station> = frames.iter().map(|(station, _)| *station).collect();
    let frame = if frames.is_empty() {
        DataFrame::empty()
    } else {
        combine(frames)?
    };
    info!(
        "Combined {} for {} station(s), {} rows",
        kind,
        loaded.len(),
        frame.height()
    );
    Ok(CombinedFrame {
        frame,
        loaded,
        failures,
    })
}
