//! Map composition: declarative layer entries to composite figures
//!
//! Each active panel becomes one figure: reference outlines at the bottom,
//! data layers stacked above in declaration order. Grid cells and points are
//! carried in display (geographic) coordinates; the rotated-pole transform
//! happens here, once, so the renderer only deals with lon/lat.

use crate::config::{FigureConfig, LayerKind, PanelConfig, ViewConfig, WindowConfig};
use crate::telec::boundaries::{self, OutlineSet};
use crate::telec::error::{Result, TelecError};
use crate::telec::grid::CorrelationGrid;
use crate::telec::loader::NonStationarityTable;
use crate::telec::palettes::{self, CodeScale, PaletteDefinition, PALETTE_REGISTRY};
use crate::telec::points::PointSet;
use crate::telec::projection::RotatedPole;
use crate::telec::schema::{self, TestVariant};
use tracing::warn;

/// Color-scale caption on the quadmesh legend
const SCALE_LABEL: &str = "Teleconnection code";

/// Display-coordinate bounding box of a figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

/// One grid cell as a projected quadrilateral with its hover attributes
#[derive(Debug, Clone)]
pub struct CellPatch {
    pub corners: [(f64, f64); 4],
    pub value: f64,
    pub color: [u8; 3],
    pub attrs: Vec<(String, String)>,
}

/// Rendered form of one grid value layer
#[derive(Debug, Clone)]
pub struct QuadmeshLayer {
    pub name: String,
    pub scale: CodeScale,
    pub scale_label: String,
    pub patches: Vec<CellPatch>,
}

/// One test-result location with its hover attributes
#[derive(Debug, Clone)]
pub struct Marker {
    pub lon: f64,
    pub lat: f64,
    pub code: u8,
    pub color: [u8; 3],
    pub attrs: Vec<(String, String)>,
}

/// Rendered form of one point subset
#[derive(Debug, Clone)]
pub struct PointLayer {
    pub name: String,
    pub opacity: f64,
    pub markers: Vec<Marker>,
    /// (code, color, label) legend entries, only for codes present
    pub legend: Vec<(u8, [u8; 3], &'static str)>,
}

/// Stroke-only reference geometry
#[derive(Debug, Clone)]
pub struct OutlineLayer {
    pub rings: Vec<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone)]
pub enum DataLayer {
    Quadmesh(QuadmeshLayer),
    Points(PointLayer),
}

/// One composed sub-figure
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub viewport: Viewport,
    /// Always rendered beneath the data layers
    pub outlines: Vec<OutlineLayer>,
    pub layers: Vec<DataLayer>,
}

/// Builds figures from the loaded data and the configured layer entries
#[derive(Debug)]
pub struct Composer<'a> {
    grid: &'a CorrelationGrid,
    nonstat: &'a NonStationarityTable,
    countries: &'a OutlineSet,
    pole: RotatedPole,
    window: WindowConfig,
    viewport: Viewport,
    quadmesh_palette: &'static PaletteDefinition,
    point_palette: &'static PaletteDefinition,
    point_opacity: f64,
}

impl<'a> Composer<'a> {
    pub fn new(
        grid: &'a CorrelationGrid,
        nonstat: &'a NonStationarityTable,
        countries: &'a OutlineSet,
        pole: RotatedPole,
        window: WindowConfig,
        figure: &FigureConfig,
    ) -> Result<Composer<'a>> {
        let quadmesh_palette = lookup_palette(&figure.quadmesh_palette)?;
        let point_palette = lookup_palette(&figure.point_palette)?;

        Ok(Composer {
            grid,
            nonstat,
            countries,
            pole,
            window,
            viewport: project_window(&window, &pole),
            quadmesh_palette,
            point_palette,
            point_opacity: figure.point_opacity,
        })
    }

    /// Compose the active panels of one view, in declaration order
    pub fn compose_view(&self, view: &ViewConfig) -> Result<Vec<Figure>> {
        view.panels
            .iter()
            .filter(|panel| panel.is_active())
            .map(|panel| self.compose_panel(panel))
            .collect()
    }

    fn compose_panel(&self, panel: &PanelConfig) -> Result<Figure> {
        let mut outlines = Vec::new();
        let mut layers = Vec::new();

        for entry in panel.layers.iter().filter(|e| e.enabled) {
            match entry.kind {
                LayerKind::Outline => outlines.push(OutlineLayer {
                    rings: self.countries.rings.clone(),
                }),
                LayerKind::Overlay => {
                    // Aux geometry degrades like the country source does
                    let path = entry.path.as_deref().ok_or_else(|| {
                        TelecError::Config("overlay entry without a path".into())
                    })?;
                    match boundaries::load_local(path) {
                        Ok(set) => outlines.push(OutlineLayer { rings: set.rings }),
                        Err(e) => warn!("overlay {} skipped: {e}", path.display()),
                    }
                }
                LayerKind::Quadmesh => {
                    let column = required_column(entry.column.as_deref())?;
                    layers.push(DataLayer::Quadmesh(self.quadmesh_layer(column)?));
                }
                LayerKind::Points => {
                    let column = required_column(entry.column.as_deref())?;
                    layers.push(DataLayer::Points(self.point_layer(column)?));
                }
            }
        }

        Ok(Figure {
            title: panel.title.clone(),
            viewport: self.viewport,
            outlines,
            layers,
        })
    }

    /// Build the gridded mesh layer for one correlation value column.
    ///
    /// The column must exist in the loaded table; composition cannot
    /// proceed without it. Cells outside the window, undefined cells and
    /// codes outside [1, 15] contribute nothing.
    fn quadmesh_layer(&self, column: &str) -> Result<QuadmeshLayer> {
        if !self.grid.has_layer(column) {
            return Err(TelecError::MissingColumn {
                table: "correlation".to_string(),
                column: column.to_string(),
            });
        }

        let scale =
            CodeScale::from_palette(self.quadmesh_palette, schema::CODE_MIN, schema::CODE_MAX);

        let mut patches = Vec::new();
        for (i, j, value) in self.grid.defined_cells(column) {
            let rlon = self.grid.rlon_axis[i];
            let rlat = self.grid.rlat_axis[j];
            if !self.window.contains(rlon, rlat) {
                continue;
            }
            let Some(color) = scale.color_for(value) else {
                continue;
            };

            let (x0, x1, y0, y1) = self.grid.cell_bounds(i, j);
            let corners = [
                self.pole.to_geographic(x0, y0),
                self.pole.to_geographic(x1, y0),
                self.pole.to_geographic(x1, y1),
                self.pole.to_geographic(x0, y1),
            ];

            patches.push(CellPatch {
                corners,
                value,
                color,
                attrs: self.cell_attrs(i, j, rlon, rlat),
            });
        }

        Ok(QuadmeshLayer {
            name: column.to_string(),
            scale,
            scale_label: SCALE_LABEL.to_string(),
            patches,
        })
    }

    /// Hover rows for one cell: coordinates in both systems, then every
    /// value layer defined at that cell.
    fn cell_attrs(&self, i: usize, j: usize, rlon: f64, rlat: f64) -> Vec<(String, String)> {
        let (lon, lat) = self.pole.to_geographic(rlon, rlat);
        let mut attrs = vec![
            (schema::RLON.to_string(), fmt_value(rlon)),
            (schema::RLAT.to_string(), fmt_value(rlat)),
            (schema::LON.to_string(), format!("{lon:.4}")),
            (schema::LAT.to_string(), format!("{lat:.4}")),
        ];
        for (name, value) in self.grid.values_at(i, j) {
            if let Some(value) = value {
                attrs.push((name.to_string(), fmt_value(value)));
            }
        }
        attrs
    }

    /// Build the point overlay for one test-result column
    fn point_layer(&self, column: &str) -> Result<PointLayer> {
        let variant = TestVariant::from_column(column).ok_or_else(|| TelecError::MissingColumn {
            table: "nonstationarity".to_string(),
            column: column.to_string(),
        })?;

        let subset = PointSet::filter(self.nonstat, variant);
        let mut markers = Vec::new();
        let mut seen_codes = [false; 4];
        for point in &subset.points {
            if !self.window.contains(point.rlon, point.rlat) {
                continue;
            }
            // Codes outside the legend set are absorbed, not drawn
            let Some(label) = schema::nonstat_label(point.code) else {
                continue;
            };
            seen_codes[point.code as usize] = true;

            markers.push(Marker {
                lon: point.lon,
                lat: point.lat,
                code: point.code,
                color: palettes::point_code_color(self.point_palette, point.code),
                attrs: vec![
                    (schema::LON.to_string(), format!("{:.4}", point.lon)),
                    (schema::LAT.to_string(), format!("{:.4}", point.lat)),
                    (schema::RLON.to_string(), fmt_value(point.rlon)),
                    (schema::RLAT.to_string(), fmt_value(point.rlat)),
                    (column.to_string(), point.code.to_string()),
                    ("result".to_string(), label.to_string()),
                ],
            });
        }

        let legend = (1u8..=3)
            .filter(|&code| seen_codes[code as usize])
            .filter_map(|code| {
                schema::nonstat_label(code).map(|label| {
                    (
                        code,
                        palettes::point_code_color(self.point_palette, code),
                        label,
                    )
                })
            })
            .collect();

        Ok(PointLayer {
            name: variant.label().to_string(),
            opacity: self.point_opacity,
            markers,
            legend,
        })
    }
}

fn required_column(column: Option<&str>) -> Result<&str> {
    column.ok_or_else(|| TelecError::Config("layer entry without a source column".into()))
}

fn lookup_palette(name: &str) -> Result<&'static PaletteDefinition> {
    PALETTE_REGISTRY
        .get(name)
        .ok_or_else(|| TelecError::Config(format!("unknown palette '{name}'")))
}

/// Display bounding box of the rotated window, from sampling its boundary
fn project_window(window: &WindowConfig, pole: &RotatedPole) -> Viewport {
    const EDGE_SAMPLES: usize = 24;

    let mut lon_min = f64::INFINITY;
    let mut lon_max = f64::NEG_INFINITY;
    let mut lat_min = f64::INFINITY;
    let mut lat_max = f64::NEG_INFINITY;

    let mut visit = |rlon: f64, rlat: f64| {
        let (lon, lat) = pole.to_geographic(rlon, rlat);
        lon_min = lon_min.min(lon);
        lon_max = lon_max.max(lon);
        lat_min = lat_min.min(lat);
        lat_max = lat_max.max(lat);
    };

    for step in 0..=EDGE_SAMPLES {
        let t = step as f64 / EDGE_SAMPLES as f64;
        let rlon = window.rlon_min + t * (window.rlon_max - window.rlon_min);
        let rlat = window.rlat_min + t * (window.rlat_max - window.rlat_min);
        visit(rlon, window.rlat_min);
        visit(rlon, window.rlat_max);
        visit(window.rlon_min, rlat);
        visit(window.rlon_max, rlat);
    }

    Viewport {
        lon_min,
        lon_max,
        lat_min,
        lat_max,
    }
}

/// Integer-valued cells print without a trailing fraction
fn fmt_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e12 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
