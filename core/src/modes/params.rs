//! Render parameters read on every tick.

use serde::{Deserialize, Serialize};

use super::ModeKind;
use crate::color::{Rgb, DEFAULT_THEME};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParameterError {
    #[error("{name} out of range: {value}")]
    OutOfRange { name: &'static str, value: f32 },
}

/// How the background is painted before each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    /// Cleared to full transparency every tick.
    #[default]
    Transparent,
    Black,
    White,
    /// The accent color; accepts the legacy `"green"` identifier.
    #[serde(alias = "green")]
    Accent,
    Custom,
}

/// User-facing configuration snapshot.
///
/// Mutations take effect on the next tick; a tick always sees one
/// consistent snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderParameters {
    pub mode: ModeKind,
    /// Theme key; unknown keys resolve to the default theme.
    pub color_theme: String,
    pub line_width: f32,
    /// Multiplier applied to every magnitude.
    pub sensitivity: f32,
    /// Forwarded to the analysis source, never used by modes.
    pub smoothing: f32,
    #[serde(alias = "background")]
    pub background_type: BackgroundType,
    pub custom_background_color: Rgb,
    pub accent_color: Rgb,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            mode: ModeKind::Bar,
            color_theme: DEFAULT_THEME.to_string(),
            line_width: 2.0,
            sensitivity: 1.0,
            smoothing: 0.8,
            background_type: BackgroundType::Transparent,
            custom_background_color: Rgb::BLACK,
            accent_color: Rgb::new(0, 255, 0),
        }
    }
}

impl RenderParameters {
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(self.line_width > 0.0 && self.line_width.is_finite()) {
            return Err(ParameterError::OutOfRange {
                name: "lineWidth",
                value: self.line_width,
            });
        }
        if !(self.sensitivity >= 0.0 && self.sensitivity.is_finite()) {
            return Err(ParameterError::OutOfRange {
                name: "sensitivity",
                value: self.sensitivity,
            });
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(ParameterError::OutOfRange {
                name: "smoothing",
                value: self.smoothing,
            });
        }
        Ok(())
    }

    /// Solid color painted for the current background, if any.
    pub fn background_color(&self) -> Option<Rgb> {
        match self.background_type {
            BackgroundType::Transparent => None,
            BackgroundType::Black => Some(Rgb::BLACK),
            BackgroundType::White => Some(Rgb::WHITE),
            BackgroundType::Accent => Some(self.accent_color),
            BackgroundType::Custom => Some(self.custom_background_color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let params = RenderParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.color_theme, "neon");
        assert_eq!(params.background_color(), None);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let params = RenderParameters {
            line_width: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::OutOfRange { name: "lineWidth", .. })
        ));

        let params = RenderParameters {
            smoothing: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = RenderParameters {
            sensitivity: f32::NAN,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let params: RenderParameters = serde_json::from_str(
            r##"{"mode": "flock", "backgroundType": "green", "customBackgroundColor": "#102030"}"##,
        )
        .unwrap();
        assert_eq!(params.mode, ModeKind::Flock);
        assert_eq!(params.background_type, BackgroundType::Accent);
        assert_eq!(params.background_color(), Some(Rgb::new(0, 255, 0)));
        assert_eq!(params.custom_background_color, Rgb::new(0x10, 0x20, 0x30));
        assert_eq!(params.line_width, 2.0);
    }
}
