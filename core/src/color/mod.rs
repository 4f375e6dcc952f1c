//! Colors and color themes.
//!
//! - `Rgb` / `Rgba` value types with the channel adjustments modes apply locally
//! - Hex parsing for palette definitions and custom backgrounds
//! - `ThemeCatalog`: named, ordered palettes with interpolated lookup

mod themes;

pub use themes::{Palette, ThemeCatalog, ThemeError, DEFAULT_THEME};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (leading `#` optional, case-insensitive).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Per-channel linear interpolation, `t` in `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |a: u8, b: u8| -> u8 {
            let v = a as f32 + (b as f32 - a as f32) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// Additive brightening, saturating at 255.
    pub fn lighten(self, amount: u8) -> Rgb {
        Rgb::new(
            self.r.saturating_add(amount),
            self.g.saturating_add(amount),
            self.b.saturating_add(amount),
        )
    }

    /// Multiplicative dimming (`factor` below 1 darkens).
    pub fn scale(self, factor: f32) -> Rgb {
        let f = |c: u8| (c as f32 * factor).floor().clamp(0.0, 255.0) as u8;
        Rgb::new(f(self.r), f(self.g), f(self.b))
    }

    pub fn with_alpha(self, alpha: f32) -> Rgba {
        Rgba::new(self.r, self.g, self.b, alpha)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color: {s}")))
    }
}

/// RGB with a floating-point alpha in `[0, 1]`.
///
/// Alpha is not clamped on construction: modes routinely compute alpha from
/// unclamped intensities, and the surface clamps when compositing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Alpha clamped into the compositing range.
    pub fn alpha(self) -> f32 {
        if self.a.is_nan() {
            0.0
        } else {
            self.a.clamp(0.0, 1.0)
        }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let rgb = self.rgb().lerp(other.rgb(), t);
        let a = self.alpha() + (other.alpha() - self.alpha()) * t;
        rgb.with_alpha(a)
    }
}

impl From<Rgb> for Rgba {
    fn from(c: Rgb) -> Self {
        c.with_alpha(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::from_hex("#ff006e"), Some(Rgb::new(255, 0, 110)));
        assert_eq!(Rgb::from_hex("8338EC"), Some(Rgb::new(0x83, 0x38, 0xec)));
        assert_eq!(Rgb::from_hex("#fff"), None);
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
        assert_eq!(Rgb::new(58, 134, 255).to_hex(), "#3a86ff");
    }

    #[test]
    fn test_adjustments_saturate() {
        let c = Rgb::new(200, 10, 100);
        assert_eq!(c.lighten(100), Rgb::new(255, 110, 200));
        assert_eq!(c.scale(0.5), Rgb::new(100, 5, 50));
        assert_eq!(c.scale(2.0), Rgb::new(255, 20, 200));
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(100, 200, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(50, 150, 100));
    }

    #[test]
    fn test_alpha_clamped_for_compositing() {
        assert_eq!(Rgba::new(0, 0, 0, 1.7).alpha(), 1.0);
        assert_eq!(Rgba::new(0, 0, 0, -0.2).alpha(), 0.0);
        assert_eq!(Rgba::new(0, 0, 0, f32::NAN).alpha(), 0.0);
    }

    #[test]
    fn test_serde_hex_roundtrip() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        assert!(serde_json::from_str::<Rgb>("\"nope\"").is_err());
    }
}
