//! Named color themes and the interpolation model.

use std::collections::BTreeMap;

use super::Rgb;

/// Theme used whenever a requested key is missing from the catalog.
pub const DEFAULT_THEME: &str = "neon";

const BUILTIN_THEMES: &[(&str, &[&str])] = &[
    ("neon", &["#ff006e", "#8338ec", "#3a86ff"]),
    ("sunset", &["#ff9500", "#ff5722", "#e91e63"]),
    ("ocean", &["#00bcd4", "#2196f3", "#3f51b5"]),
    ("forest", &["#4caf50", "#8bc34a", "#cddc39"]),
    ("aurora", &["#e91e63", "#9c27b0", "#673ab7"]),
    ("fire", &["#ff5722", "#ff9800", "#ffc107"]),
    ("cyber", &["#00ff41", "#00d4ff", "#ff00d4"]),
    ("galaxy", &["#667eea", "#764ba2", "#f093fb"]),
    ("rainbow", &["#ff0000", "#ff8000", "#ffff00", "#00ff00", "#0080ff", "#8000ff"]),
    ("matrix", &["#003300", "#00ff00", "#00cc00"]),
    ("gold", &["#ffd700", "#ffb347", "#ff6b35"]),
    ("ice", &["#a8edea", "#fed6e3", "#d299c2"]),
    ("lava", &["#ff0000", "#ff4500", "#ff8c00"]),
    ("space", &["#0f0f23", "#2d1b69", "#11998e"]),
    ("tropical", &["#ff6b6b", "#feca57", "#48dbfb"]),
    ("midnight", &["#2c3e50", "#34495e", "#7f8c8d"]),
    ("emerald", &["#00c9ff", "#92fe9d", "#00b09b"]),
    ("ruby", &["#cc2b5e", "#753a88", "#8e44ad"]),
    ("sapphire", &["#1e3c72", "#2a5298", "#74b9ff"]),
    ("monochrome", &["#000000", "#434343", "#ffffff"]),
    ("vintage", &["#ddd6f3", "#faaca8", "#f093fb"]),
    ("pastel", &["#ffecd2", "#fcb69f", "#a8edea"]),
    ("neon2", &["#ff0080", "#00ff80", "#8000ff"]),
    ("toxic", &["#8360c3", "#2ebf91", "#f093fb"]),
    ("crystal", &["#667eea", "#764ba2", "#f093fb"]),
    ("cherry", &["#eb3349", "#f45c43", "#ff6b35"]),
    ("electric", &["#00d2ff", "#3a7bd5", "#00d4aa"]),
    ("cosmic", &["#667db6", "#0082c8", "#0078ff"]),
    ("volcano", &["#ff416c", "#ff4b2b", "#ff5722"]),
    ("dream", &["#a8caba", "#5d4e75", "#667db6"]),
    ("neon3", &["#ff0099", "#493240", "#f093fb"]),
    ("gradient", &["#667eea", "#764ba2", "#a8edea", "#fed6e3"]),
    ("royal", &["#667db6", "#0082c8", "#667eea"]),
];

/// Errors raised while registering custom themes.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("theme '{0}' has no colors")]
    Empty(String),
    #[error("theme '{theme}' has an invalid color: {color}")]
    InvalidColor { theme: String, color: String },
}

/// An ordered palette. Index 0 is the low end, the last index the high end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Build a palette. Returns `None` for an empty color list.
    pub fn new(colors: Vec<Rgb>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self { colors })
        }
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Interpolated lookup: `t` is mapped linearly onto the palette knots.
    ///
    /// `t` is clamped to `[0, 1]` (NaN reads as 0), so oversaturated
    /// intensities land on the high end instead of leaving the palette.
    pub fn interpolate(&self, t: f32) -> Rgb {
        let last = self.colors.len() - 1;
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let k = t * last as f32;
        let i = (k.floor() as usize).min(last);
        let frac = k - i as f32;
        let next = (i + 1).min(last);
        self.colors[i].lerp(self.colors[next], frac)
    }

    /// Unweighted per-layer color, periodic in the palette length.
    pub fn layer(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }
}

/// Catalog of named palettes with a guaranteed default.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: BTreeMap<String, Palette>,
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ThemeCatalog {
    /// The built-in catalog of 33 themes.
    pub fn builtin() -> Self {
        let themes = BUILTIN_THEMES
            .iter()
            .map(|(name, hexes)| {
                let colors = hexes.iter().filter_map(|h| Rgb::from_hex(h)).collect();
                (name.to_string(), Palette { colors })
            })
            .collect();
        Self { themes }
    }

    /// Add or replace a theme from hex strings.
    pub fn insert_hex<S: AsRef<str>>(&mut self, name: &str, hexes: &[S]) -> Result<(), ThemeError> {
        let colors = hexes
            .iter()
            .map(|h| {
                Rgb::from_hex(h.as_ref()).ok_or_else(|| ThemeError::InvalidColor {
                    theme: name.to_string(),
                    color: h.as_ref().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let palette = Palette::new(colors).ok_or_else(|| ThemeError::Empty(name.to_string()))?;
        self.themes.insert(name.to_string(), palette);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.themes.contains_key(key)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Palette for `key`, falling back to the default theme.
    pub fn palette(&self, key: &str) -> &Palette {
        self.themes
            .get(key)
            .or_else(|| self.themes.get(DEFAULT_THEME))
            .unwrap_or_else(|| fallback_palette())
    }

    /// Intensity-driven color lookup.
    pub fn resolve(&self, key: &str, t: f32) -> Rgb {
        self.palette(key).interpolate(t)
    }

    /// Position/layer-driven color lookup.
    pub fn resolve_layer(&self, key: &str, layer: usize) -> Rgb {
        self.palette(key).layer(layer)
    }
}

// Only reachable if a caller removed "neon" by replacing the catalog contents.
fn fallback_palette() -> &'static Palette {
    use std::sync::OnceLock;
    static FALLBACK: OnceLock<Palette> = OnceLock::new();
    FALLBACK.get_or_init(|| Palette {
        colors: vec![Rgb::new(0xff, 0x00, 0x6e), Rgb::new(0x83, 0x38, 0xec), Rgb::new(0x3a, 0x86, 0xff)],
    })
}
