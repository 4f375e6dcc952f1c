//! Visualizer configuration loaded from JSON.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::audio::{AnalysisConfig, AnalyzerError};
use crate::capture::CaptureConfig;
use crate::color::{ThemeCatalog, ThemeError};
use crate::engine::DEFAULT_REFRESH_RATE;
use crate::modes::{ParameterError, RenderParameters};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),
    #[error("invalid analysis settings: {0}")]
    Analysis(#[from] AnalyzerError),
    #[error("invalid theme: {0}")]
    Theme(#[from] ThemeError),
    #[error("surface size must be non-zero, got {width}x{height}")]
    SurfaceSize { width: u32, height: u32 },
}

/// Everything needed to build a [`Visualizer`](super::Visualizer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Live and capture surface size in pixels.
    pub width: u32,
    pub height: u32,
    /// Display refresh rate driving the live loop.
    pub refresh_rate: u32,
    /// Seed for every randomized mode.
    pub seed: u64,
    pub render: RenderParameters,
    pub analysis: AnalysisConfig,
    pub capture: CaptureConfig,
    /// Extra themes as `name -> [hex, ...]`, merged over the built-ins.
    pub themes: BTreeMap<String, Vec<String>>,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            refresh_rate: DEFAULT_REFRESH_RATE,
            seed: 0,
            render: RenderParameters::default(),
            analysis: AnalysisConfig::default(),
            capture: CaptureConfig::default(),
            themes: BTreeMap::new(),
        }
    }
}

impl VisualizerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("loading config from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::SurfaceSize {
                width: self.width,
                height: self.height,
            });
        }
        self.render.validate()?;
        self.analysis.validate()?;
        Ok(())
    }

    /// Built-in themes with the configured ones merged over them.
    pub fn theme_catalog(&self) -> Result<ThemeCatalog, ConfigError> {
        let mut catalog = ThemeCatalog::builtin();
        for (name, hexes) in &self.themes {
            catalog.insert_hex(name, hexes)?;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::ModeKind;

    #[test]
    fn test_empty_json_is_the_default() {
        let config = VisualizerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, VisualizerConfig::default());
        assert_eq!((config.width, config.height), (1280, 720));
    }

    #[test]
    fn test_nested_sections() {
        let config = VisualizerConfig::from_json_str(
            r##"{
                "seed": 42,
                "render": {"mode": "galaxyspiral", "sensitivity": 1.5},
                "analysis": {"fft_size": 1024},
                "capture": {"share_mode_state_during_capture": true},
                "themes": {"mine": ["#000000", "#ffffff"]}
            }"##,
        )
        .unwrap();
        assert_eq!(config.render.mode, ModeKind::GalaxySpiral);
        assert_eq!(config.analysis.fft_size, 1024);
        assert!(config.capture.share_mode_state_during_capture);

        let catalog = config.theme_catalog().unwrap();
        assert!(catalog.contains("mine"));
        assert!(catalog.contains("neon"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            VisualizerConfig::from_json_str(r#"{"render": {"smoothing": 2.0}}"#),
            Err(ConfigError::InvalidParameter(_))
        ));
        assert!(matches!(
            VisualizerConfig::from_json_str(r#"{"render": {"mode": "nope"}}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            VisualizerConfig::from_json_str(r#"{"width": 0}"#),
            Err(ConfigError::SurfaceSize { .. })
        ));

        let config = VisualizerConfig {
            themes: BTreeMap::from([("bad".to_string(), vec!["#zzzzzz".to_string()])]),
            ..Default::default()
        };
        assert!(matches!(config.theme_catalog(), Err(ConfigError::Theme(_))));
    }
}
