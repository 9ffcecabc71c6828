//! Dashboard settings, read from a TOML file or built in code.
//!
//! ```toml
//! data_dir = "data"
//! boundary_file = "choco_andino_export.geojson"
//! use_cache = true
//! animation_delay_secs = 1.0
//! default_stations = [1, 2]
//!
//! [wavelet]
//! kind = "mexh"
//! num_scales = 128
//!
//! [ndvi]
//! min = 0.2
//! max = 0.8
//! histogram_bins = 10
//! ```

use crate::analysis::wavelet::{self, WaveletKind};
use crate::types::station::Station;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const MIN_ANIMATION_DELAY_SECS: f64 = 0.3;
pub const MAX_ANIMATION_DELAY_SECS: f64 = 2.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaveletSettings {
    pub kind: WaveletKind,
    pub num_scales: usize,
}

impl Default for WaveletSettings {
    fn default() -> Self {
        Self {
            kind: WaveletKind::MexicanHat,
            num_scales: wavelet::DEFAULT_SCALES,
        }
    }
}

/// Defaults of the NDVI section sliders.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NdviSettings {
    pub min: f64,
    pub max: f64,
    pub histogram_bins: usize,
}

impl Default for NdviSettings {
    fn default() -> Self {
        Self {
            min: 0.2,
            max: 0.8,
            histogram_bins: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Root holding `Estacion N/` directories and `NDVI/`.
    pub data_dir: PathBuf,
    /// Boundary GeoJSON, relative to `data_dir` unless absolute.
    pub boundary_file: PathBuf,
    /// Memoize loaded tables per (station, dataset).
    pub use_cache: bool,
    /// Pause between animation frames.
    pub animation_delay_secs: f64,
    /// Stations preselected when comparing.
    pub default_stations: Vec<Station>,
    pub wavelet: WaveletSettings,
    pub ndvi: NdviSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            boundary_file: PathBuf::from("choco_andino_export.geojson"),
            use_cache: true,
            animation_delay_secs: 1.0,
            default_stations: Station::all().into_iter().take(2).collect(),
            wavelet: WaveletSettings::default(),
            ndvi: NdviSettings::default(),
        }
    }
}

impl DashboardConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.animation_delay()?;
        wavelet::scales(self.wavelet.num_scales).map_err(|e| ConfigError::Invalid {
            field: "wavelet.num_scales",
            reason: e.to_string(),
        })?;
        if self.ndvi.min > self.ndvi.max {
            return Err(ConfigError::Invalid {
                field: "ndvi",
                reason: "min is greater than max".to_string(),
            });
        }
        if self.ndvi.histogram_bins == 0 {
            return Err(ConfigError::Invalid {
                field: "ndvi.histogram_bins",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Pause between animation frames. Fails for NaN or a value outside
    /// [`MIN_ANIMATION_DELAY_SECS`]..=[`MAX_ANIMATION_DELAY_SECS`].
    pub fn animation_delay(&self) -> Result<Duration, ConfigError> {
        if !(MIN_ANIMATION_DELAY_SECS..=MAX_ANIMATION_DELAY_SECS).contains(&self.animation_delay_secs) {
            return Err(ConfigError::Invalid {
                field: "animation_delay_secs",
                reason: format!(
                    "must be between {} and {} seconds, got {}",
                    MIN_ANIMATION_DELAY_SECS, MAX_ANIMATION_DELAY_SECS, self.animation_delay_secs
                ),
            });
        }
        Ok(Duration::from_secs_f64(self.animation_delay_secs))
    }

    pub fn boundary_path(&self) -> PathBuf {
        self.data_dir.join(&self.boundary_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.boundary_path(), Path::new("data/choco_andino_export.geojson"));
        assert_eq!(config.default_stations.len(), 2);
        assert_eq!(config.animation_delay().ok(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let config = DashboardConfig::from_toml_str(
            r#"
            data_dir = "/srv/enso"
            default_stations = [3, 5, 6]

            [wavelet]
            kind = "morl"
            "#,
        )?;
        assert_eq!(config.data_dir, PathBuf::from("/srv/enso"));
        assert_eq!(config.default_stations, vec![
            Station::new(3).unwrap(),
            Station::new(5).unwrap(),
            Station::new(6).unwrap()
        ]);
        assert_eq!(config.wavelet.kind, WaveletKind::Morlet);
        assert_eq!(config.wavelet.num_scales, wavelet::DEFAULT_SCALES);
        assert!(config.use_cache);
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = DashboardConfig::from_toml_str("animation_delay_secs = 5.0");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "animation_delay_secs", .. })
        ));
        let result = DashboardConfig::from_toml_str("default_stations = [9]");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        let result = DashboardConfig::from_toml_str("[wavelet]\nnum_scales = 100");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_delay_built_in_code_is_checked() {
        for delay in [-1.0, f64::NAN, 0.1, f64::INFINITY] {
            let config = DashboardConfig {
                animation_delay_secs: delay,
                ..DashboardConfig::default()
            };
            assert!(matches!(
                config.animation_delay(),
                Err(ConfigError::Invalid { field: "animation_delay_secs", .. })
            ));
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_missing_file() {
        let result = DashboardConfig::from_file(Path::new("/no/such/enso.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
