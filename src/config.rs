//! Dashboard configuration
//!
//! Configuration is a JSON file deserialized over compiled-in defaults; the
//! defaults alone describe the standard run (lag-0 correlation view plus the
//! four non-stationarity panels). Every layer the composer can draw appears
//! here as a declarative entry that can be toggled without touching code.

use crate::telec::boundaries::NATURAL_EARTH_50M_COUNTRIES_URL;
use crate::telec::error::{Result, TelecError};
use crate::telec::grid::DuplicatePolicy;
use crate::telec::projection::RotatedPole;
use crate::telec::schema::{self, TestVariant};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory the input CSV files live in
    pub data_dir: PathBuf,
    /// Correlation table file name, relative to `data_dir`
    pub correlation_file: String,
    /// Non-stationarity table file name, relative to `data_dir`
    pub nonstationarity_file: String,

    /// Bind address and port of the HTTP service
    pub bind: String,
    pub port: u16,

    /// What to do with repeated (rlon, rlat) pairs in the correlation table
    pub duplicate_policy: DuplicatePolicy,

    pub pole: PoleConfig,
    pub window: WindowConfig,
    pub boundaries: BoundariesConfig,
    pub figure: FigureConfig,
    pub views: Vec<ViewConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_dir: PathBuf::from("data"),
            correlation_file: "amax_pp_telec.csv".to_string(),
            nonstationarity_file: "amax_pp_nonstat.csv".to_string(),
            bind: "127.0.0.1".to_string(),
            port: 8605,
            duplicate_policy: DuplicatePolicy::default(),
            pole: PoleConfig::default(),
            window: WindowConfig::default(),
            boundaries: BoundariesConfig::default(),
            figure: FigureConfig::default(),
            views: default_views(),
        }
    }
}

impl DashboardConfig {
    /// Load from a JSON file, or fall back to the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<DashboardConfig> {
        let config = match path {
            Some(path) => {
                let bytes = std::fs::read(path).map_err(|source| TelecError::Io {
                    path: path.to_string_lossy().into_owned(),
                    source,
                })?;
                serde_json::from_slice(&bytes)
                    .map_err(|e| TelecError::Config(format!("{}: {e}", path.display())))?
            }
            None => DashboardConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn correlation_path(&self) -> PathBuf {
        self.data_dir.join(&self.correlation_file)
    }

    pub fn nonstationarity_path(&self) -> PathBuf {
        self.data_dir.join(&self.nonstationarity_file)
    }

    fn validate(&self) -> Result<()> {
        if self.views.is_empty() {
            return Err(TelecError::Config("no views configured".into()));
        }
        for view in &self.views {
            if !view.route.starts_with('/') {
                return Err(TelecError::Config(format!(
                    "view '{}': route '{}' must start with '/'",
                    view.name, view.route
                )));
            }
            for panel in &view.panels {
                for layer in &panel.layers {
                    layer.validate(&view.name, &panel.title)?;
                }
            }
        }
        if self.window.rlon_min >= self.window.rlon_max
            || self.window.rlat_min >= self.window.rlat_max
        {
            return Err(TelecError::Config("viewport window is empty".into()));
        }
        Ok(())
    }
}

/// Rotated-pole parameters of the analysis grid
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PoleConfig {
    pub lon: f64,
    pub lat: f64,
}

impl Default for PoleConfig {
    fn default() -> Self {
        PoleConfig {
            lon: -186.0,
            lat: 49.5,
        }
    }
}

impl PoleConfig {
    pub fn rotated_pole(&self) -> RotatedPole {
        RotatedPole::new(self.lon, self.lat)
    }
}

/// Fixed rendering window, in rotated-grid coordinates
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub rlon_min: f64,
    pub rlon_max: f64,
    pub rlat_min: f64,
    pub rlat_max: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            rlon_min: -3.0,
            rlon_max: 8.0,
            rlat_min: -4.0,
            rlat_max: 3.0,
        }
    }
}

impl WindowConfig {
    pub fn contains(&self, rlon: f64, rlat: f64) -> bool {
        (self.rlon_min..=self.rlon_max).contains(&rlon)
            && (self.rlat_min..=self.rlat_max).contains(&rlat)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoundariesConfig {
    /// Disable to skip the outline fetch entirely
    pub enabled: bool,
    pub url: String,
    /// Local GeoJSON override, takes precedence over the URL
    pub local_path: Option<PathBuf>,
}

impl Default for BoundariesConfig {
    fn default() -> Self {
        BoundariesConfig {
            enabled: true,
            url: NATURAL_EARTH_50M_COUNTRIES_URL.to_string(),
            local_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    /// Sub-figure frame size in pixels
    pub frame_width: u32,
    pub frame_height: u32,
    /// Sequential palette for the significance-code scale
    pub quadmesh_palette: String,
    /// Categorical palette for the test-result point codes
    pub point_palette: String,
    /// Point marker opacity, so overlapping layers stay distinguishable
    pub point_opacity: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        FigureConfig {
            frame_width: 400,
            frame_height: 400,
            quadmesh_palette: "Rainbow".to_string(),
            point_palette: "Set1".to_string(),
            point_opacity: 0.6,
        }
    }
}

/// One dashboard page
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    pub route: String,
    pub title: String,
    pub panels: Vec<PanelConfig>,
}

/// One sub-figure: a stack of layer entries over a shared viewport
#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    pub title: String,
    pub layers: Vec<LayerEntry>,
}

impl PanelConfig {
    /// A panel renders when at least one data-bearing entry is enabled
    pub fn is_active(&self) -> bool {
        self.layers
            .iter()
            .any(|l| l.enabled && l.kind != LayerKind::Outline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    /// Country-outline reference layer, always stacked beneath data layers
    Outline,
    /// Gridded significance-code mesh from the correlation table
    Quadmesh,
    /// Test-result point overlay from the non-stationarity table
    Points,
    /// Auxiliary local geometry (catchments, rivers), stroke-only
    Overlay,
}

/// Declarative layer entry the composer iterates
#[derive(Debug, Clone, Deserialize)]
pub struct LayerEntry {
    pub kind: LayerKind,
    /// Source column: a correlation layer for `quadmesh`, a result column
    /// for `points`; unused otherwise
    #[serde(default)]
    pub column: Option<String>,
    /// Local GeoJSON path for `overlay` entries
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl LayerEntry {
    fn outline() -> LayerEntry {
        LayerEntry {
            kind: LayerKind::Outline,
            column: None,
            path: None,
            enabled: true,
        }
    }

    fn quadmesh(column: &str, enabled: bool) -> LayerEntry {
        LayerEntry {
            kind: LayerKind::Quadmesh,
            column: Some(column.to_string()),
            path: None,
            enabled,
        }
    }

    fn points(variant: TestVariant) -> LayerEntry {
        LayerEntry {
            kind: LayerKind::Points,
            column: Some(variant.column().to_string()),
            path: None,
            enabled: true,
        }
    }

    fn validate(&self, view: &str, panel: &str) -> Result<()> {
        match self.kind {
            LayerKind::Quadmesh | LayerKind::Points if self.column.is_none() => {
                Err(TelecError::Config(format!(
                    "view '{view}', panel '{panel}': layer needs a source column"
                )))
            }
            LayerKind::Overlay if self.path.is_none() => Err(TelecError::Config(format!(
                "view '{view}', panel '{panel}': overlay needs a path"
            ))),
            _ => Ok(()),
        }
    }
}

fn default_true() -> bool {
    true
}

/// The two stock views: lag-0 correlations, and the four test variants
fn default_views() -> Vec<ViewConfig> {
    let lag_panel = |title: &str, column: &str, enabled: bool| PanelConfig {
        title: title.to_string(),
        layers: vec![LayerEntry::outline(), LayerEntry::quadmesh(column, enabled)],
    };

    let correlation_view = ViewConfig {
        name: "correlations".to_string(),
        route: "/".to_string(),
        title: "Significant correlations".to_string(),
        panels: vec![
            lag_panel("Lag-0", schema::LAG0_CODE, true),
            lag_panel("Lag-1", "pearson_xcorr_sig_lag1_aft", false),
            lag_panel("Lag-2", "pearson_xcorr_sig_lag2_aft", false),
        ],
    };

    let nonstat_view = ViewConfig {
        name: "nonstationarity".to_string(),
        route: "/nonstationarity".to_string(),
        title: "Non-stationarity tests".to_string(),
        panels: TestVariant::ALL
            .iter()
            .map(|variant| PanelConfig {
                title: variant.label().to_string(),
                layers: vec![LayerEntry::outline(), LayerEntry::points(*variant)],
            })
            .collect(),
    };

    vec![correlation_view, nonstat_view]
}
