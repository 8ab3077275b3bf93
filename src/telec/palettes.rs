//! Palette registry and the discrete significance-code color scale
//!
//! Palettes are embedded at compile time from palettes.json and looked up
//! by name, case-insensitively. Two kinds exist:
//! - `categorical`: discrete colors for distinct codes (wrap around when
//!   the index exceeds the list)
//! - `sequential`: a gradient sampled or interpolated over a value range

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

/// Embedded palettes.json content
const PALETTES_JSON: &str = include_str!("../../palettes.json");

/// Global palette registry, initialized lazily on first access
pub static PALETTE_REGISTRY: Lazy<PaletteRegistry> = Lazy::new(|| {
    PaletteRegistry::from_json(PALETTES_JSON).unwrap_or_else(|e| {
        tracing::error!("failed to load embedded palettes.json: {e}");
        PaletteRegistry::default()
    })
});

/// Default palette for the quadmesh code scale
pub const DEFAULT_SEQUENTIAL_PALETTE: &str = "Rainbow";

/// Default palette for categorical point codes
pub const DEFAULT_CATEGORICAL_PALETTE: &str = "Set1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteType {
    Categorical,
    Sequential,
}

/// A single palette definition from palettes.json
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub palette_type: PaletteType,
    pub colors: Vec<String>,
}

impl PaletteDefinition {
    /// Color by index, wrapping around for categorical use
    pub fn get_color(&self, index: usize) -> [u8; 3] {
        if self.colors.is_empty() {
            return [128, 128, 128];
        }
        let idx = index % self.colors.len();
        parse_hex_color(&self.colors[idx]).unwrap_or([128, 128, 128])
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Interpolate at position t in [0, 1]; t=0 is the first color,
    /// t=1 the last, linear in between.
    pub fn interpolate(&self, t: f64) -> [u8; 3] {
        if self.colors.is_empty() {
            return [128, 128, 128];
        }

        let t = t.clamp(0.0, 1.0);
        let n = self.colors.len();
        if n == 1 {
            return self.get_color(0);
        }

        let pos = t * (n - 1) as f64;
        let idx_low = pos.floor() as usize;
        let idx_high = (idx_low + 1).min(n - 1);
        let frac = pos - idx_low as f64;

        let lo = self.get_color(idx_low);
        let hi = self.get_color(idx_high);
        [
            (lo[0] as f64 * (1.0 - frac) + hi[0] as f64 * frac) as u8,
            (lo[1] as f64 * (1.0 - frac) + hi[1] as f64 * frac) as u8,
            (lo[2] as f64 * (1.0 - frac) + hi[2] as f64 * frac) as u8,
        ]
    }
}

/// Registry of all available palettes
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    /// All palettes, lowercase keys for case-insensitive lookup
    palettes: HashMap<String, PaletteDefinition>,
}

impl PaletteRegistry {
    pub fn from_json(json: &str) -> Result<Self, String> {
        let definitions: Vec<PaletteDefinition> =
            serde_json::from_str(json).map_err(|e| format!("palette JSON: {e}"))?;

        let mut registry = Self::default();
        for def in definitions {
            registry.palettes.insert(def.name.to_lowercase(), def);
        }
        Ok(registry)
    }

    /// Get a palette by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&PaletteDefinition> {
        self.palettes.get(&name.to_lowercase())
    }
}

/// A discrete color scale over a closed integer code range.
///
/// Each code in [min, max] gets one color sampled from a sequential
/// palette. Values outside the closed range, or with no defined cell, map
/// to no color at all; they are never clamped to an endpoint.
#[derive(Debug, Clone)]
pub struct CodeScale {
    colors: Vec<[u8; 3]>,
    min: i64,
    max: i64,
}

impl CodeScale {
    pub fn from_palette(palette: &PaletteDefinition, min: i64, max: i64) -> CodeScale {
        let span = (max - min).max(0) as usize;
        let colors = (0..=span)
            .map(|step| {
                let t = if span == 0 {
                    0.0
                } else {
                    step as f64 / span as f64
                };
                palette.interpolate(t)
            })
            .collect();
        CodeScale { colors, min, max }
    }

    pub fn range(&self) -> (i64, i64) {
        (self.min, self.max)
    }

    /// Color for a value, `None` when the value lies outside the range
    pub fn color_for(&self, value: f64) -> Option<[u8; 3]> {
        if !value.is_finite() {
            return None;
        }
        let code = value.round() as i64;
        if code < self.min || code > self.max {
            return None;
        }
        self.colors.get((code - self.min) as usize).copied()
    }

    /// (code, color) pairs for legend rendering, ascending
    pub fn entries(&self) -> impl Iterator<Item = (i64, [u8; 3])> + '_ {
        self.colors
            .iter()
            .enumerate()
            .map(|(step, &color)| (self.min + step as i64, color))
    }
}

/// Categorical color for a non-stationarity result code (1-based)
pub fn point_code_color(palette: &PaletteDefinition, code: u8) -> [u8; 3] {
    palette.get_color((code as usize).saturating_sub(1))
}

/// Parse `#RRGGBB` / `#RRGGBBAA` (alpha ignored), with or without `#`
fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Format an RGB triple as a `#rrggbb` attribute value
pub fn hex_string(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
