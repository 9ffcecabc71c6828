//! Data behind the interactive map: station markers coloured by one annual
//! summary variable, and the study-area boundary.

use crate::analysis::error::AnalysisError;
use crate::combine::StationFailure;
use crate::loading::error::DataError;
use crate::loading::frame_fetcher::FrameFetcher;
use crate::types::columns::{PRECIPITATION, SPI_MEAN, SPI_MIN, YEAR};
use crate::types::dataset::DatasetKind;
use crate::types::station::{LatLon, Station};
use crate::utils::{f64_values, i32_values, round2};
use log::{debug, warn};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const PRECIPITATION_PALETTE: [&str; 4] = ["#c6dbef", "#6baed6", "#2171b5", "#08306b"];
const SPI_PALETTE: [&str; 4] = ["#6aacd0", "#f7f7f7", "#e58267", "#67001f"];

/// Annual summary variable shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MapVariable {
    #[default]
    Precipitation,
    SpiMean,
    SpiMin,
}

impl MapVariable {
    pub const ALL: [MapVariable; 3] = [
        MapVariable::Precipitation,
        MapVariable::SpiMean,
        MapVariable::SpiMin,
    ];

    pub fn column(self) -> &'static str {
        match self {
            MapVariable::Precipitation => PRECIPITATION,
            MapVariable::SpiMean => SPI_MEAN,
            MapVariable::SpiMin => SPI_MIN,
        }
    }

    fn palette(self) -> &'static [&'static str] {
        match self {
            MapVariable::Precipitation => &PRECIPITATION_PALETTE,
            MapVariable::SpiMean | MapVariable::SpiMin => &SPI_PALETTE,
        }
    }
}

impl fmt::Display for MapVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for MapVariable {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MapVariable::ALL
            .into_iter()
            .find(|v| v.column() == s)
            .ok_or_else(|| AnalysisError::UnknownColumn(s.to_string()))
    }
}

/// Range of the colour scale for the values on screen. No value gives `[0, 1]`;
/// a single distinct value is widened by 0.5 on both sides.
pub fn value_range(values: &[f64]) -> (f64, f64) {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let Some(first) = finite.next() else {
        return (0.0, 1.0);
    };
    let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

/// Linear colour map over a palette of evenly spaced `#rrggbb` stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
    pub stops: Vec<String>,
}

impl ColorScale {
    pub fn new(variable: MapVariable, (min, max): (f64, f64)) -> ColorScale {
        ColorScale {
            min,
            max,
            stops: variable.palette().iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Colour of `value`, clamped to the ends of the scale.
    pub fn color(&self, value: f64) -> String {
        let rgb: Vec<[u8; 3]> = self.stops.iter().filter_map(|s| parse_hex(s)).collect();
        match rgb.len() {
            0 => return "#000000".to_string(),
            1 => return to_hex(rgb[0]),
            _ => {}
        }
        let span = self.max - self.min;
        let t = if span > 0.0 {
            ((value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let position = t * (rgb.len() - 1) as f64;
        let lower = (position.floor() as usize).min(rgb.len() - 2);
        let frac = position - lower as f64;
        let (a, b) = (rgb[lower], rgb[lower + 1]);
        let mut mixed = [0u8; 3];
        for i in 0..3 {
            mixed[i] = (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
        }
        to_hex(mixed)
    }
}

fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Extent of the study-area boundary in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Reads the boundary file. A missing file means there is no boundary to
    /// draw and yields `Ok(None)`.
    pub fn from_file(path: &Path) -> Result<Option<BoundingBox>, DataError> {
        if !path.exists() {
            debug!("No boundary file at {}", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| DataError::BoundaryRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let geojson: Value = serde_json::from_str(&content).map_err(|e| DataError::BoundaryParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(BoundingBox::of_geojson(&geojson))
    }

    /// Box around every position of every geometry; `None` when the document
    /// holds no coordinates.
    pub fn of_geojson(geojson: &Value) -> Option<BoundingBox> {
        let mut positions = Vec::new();
        collect_positions(geojson, &mut positions);
        let (&(lon, lat), rest) = positions.split_first()?;
        Some(rest.iter().fold(
            BoundingBox {
                min_lon: lon,
                min_lat: lat,
                max_lon: lon,
                max_lat: lat,
            },
            |b, &(lon, lat)| BoundingBox {
                min_lon: b.min_lon.min(lon),
                min_lat: b.min_lat.min(lat),
                max_lon: b.max_lon.max(lon),
                max_lat: b.max_lat.max(lat),
            },
        ))
    }
}

fn collect_positions(value: &Value, out: &mut Vec<(f64, f64)>) {
    match value {
        Value::Array(items) => {
            let numbers: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if numbers.len() >= 2 && numbers.len() == items.len() {
                out.push((numbers[0], numbers[1]));
            } else {
                items.iter().for_each(|item| collect_positions(item, out));
            }
        }
        Value::Object(map) => {
            for key in ["features", "geometry", "geometries", "coordinates"] {
                if let Some(inner) = map.get(key) {
                    collect_positions(inner, out);
                }
            }
        }
        _ => {}
    }
}

/// A station drawn on the map for the selected year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMarker {
    pub station: Station,
    pub location: LatLon,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub year: i32,
    pub variable: MapVariable,
    pub scale: ColorScale,
    pub markers: Vec<StationMarker>,
}

/// Annual summaries of the stations that could be loaded.
#[derive(Debug, Clone)]
pub struct MapLayer {
    summaries: Vec<(Station, DataFrame)>,
    pub failures: Vec<StationFailure>,
}

impl MapLayer {
    pub fn new(summaries: Vec<(Station, DataFrame)>) -> MapLayer {
        MapLayer {
            summaries,
            failures: Vec::new(),
        }
    }

    /// Loads the annual summary of every station; stations without one are
    /// left off the map.
    pub async fn load(fetcher: &FrameFetcher) -> MapLayer {
        let mut summaries = Vec::new();
        let mut failures = Vec::new();
        for station in Station::all() {
            match fetcher.get_frame(Some(station), DatasetKind::AnnualSummary).await {
                Ok(df) => summaries.push((station, df)),
                Err(e) => {
                    warn!("No annual summary for {}: {}", station, e);
                    failures.push(StationFailure {
                        station,
                        message: format!("{}: {}", station.label(), e),
                    });
                }
            }
        }
        MapLayer { summaries, failures }
    }

    pub fn stations(&self) -> Vec<Station> {
        self.summaries.iter().map(|(station, _)| *station).collect()
    }

    /// Sorted union of the years of every loaded station.
    pub fn available_years(&self) -> Result<Vec<i32>, AnalysisError> {
        let mut years = BTreeSet::new();
        for (_, df) in &self.summaries {
            years.extend(i32_values(df, YEAR)?.into_iter().flatten());
        }
        Ok(years.into_iter().collect())
    }

    /// Markers for `year`. Stations without a row for the year, or with a null
    /// value, are not drawn and do not count toward the colour range.
    pub fn snapshot(&self, year: i32, variable: MapVariable) -> Result<MapSnapshot, AnalysisError> {
        let mut values = Vec::new();
        for (station, df) in &self.summaries {
            let years = i32_values(df, YEAR)?;
            let Some(row) = years.iter().position(|y| *y == Some(year)) else {
                continue;
            };
            if let Some(value) = f64_values(df, variable.column())?[row] {
                values.push((*station, value));
            }
        }

        let range = value_range(&values.iter().map(|(_, v)| *v).collect::<Vec<_>>());
        let scale = ColorScale::new(variable, range);
        let markers = values
            .into_iter()
            .map(|(station, value)| StationMarker {
                station,
                location: station.location(),
                value: round2(value),
                color: scale.color(value),
            })
            .collect();
        Ok(MapSnapshot {
            year,
            variable,
            scale,
            markers,
        })
    }
}
