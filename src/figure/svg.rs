//! SVG rendering of composite figures
//!
//! The figure arrives fully composed in display coordinates, so rendering
//! is a linear walk: outlines, quadmesh cell polygons, point markers, then
//! frame, axes, title and legends. Every data mark carries a `<title>`
//! element listing its attributes, which browsers surface as a hover
//! tooltip without any scripting.

use super::compose::{DataLayer, Figure, Viewport};
use crate::config::FigureConfig;
use crate::telec::palettes::hex_string;
use crate::telec::schema;
use std::fmt::Write;

const MARGIN_LEFT: f64 = 54.0;
const MARGIN_TOP: f64 = 34.0;
const MARGIN_BOTTOM: f64 = 42.0;
/// Room for the color bar and categorical legend
const MARGIN_RIGHT: f64 = 150.0;

const AXIS_TICKS: usize = 5;
const MARKER_RADIUS: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub frame_width: f64,
    pub frame_height: f64,
}

impl From<&FigureConfig> for RenderOptions {
    fn from(figure: &FigureConfig) -> Self {
        RenderOptions {
            frame_width: figure.frame_width as f64,
            frame_height: figure.frame_height as f64,
        }
    }
}

/// Linear mapping from display coordinates to pixel positions
struct Frame {
    viewport: Viewport,
    width: f64,
    height: f64,
}

impl Frame {
    fn x(&self, lon: f64) -> f64 {
        let span = self.viewport.lon_max - self.viewport.lon_min;
        MARGIN_LEFT + (lon - self.viewport.lon_min) / span * self.width
    }

    /// SVG y grows downward; latitude grows upward
    fn y(&self, lat: f64) -> f64 {
        let span = self.viewport.lat_max - self.viewport.lat_min;
        MARGIN_TOP + (self.viewport.lat_max - lat) / span * self.height
    }
}

/// Render one figure to a standalone SVG element.
///
/// `figure_id` keeps clip-path ids unique when several figures share a page.
pub fn render_figure(figure: &Figure, figure_id: usize, opts: &RenderOptions) -> String {
    let frame = Frame {
        viewport: figure.viewport,
        width: opts.frame_width,
        height: opts.frame_height,
    };
    let total_width = MARGIN_LEFT + opts.frame_width + MARGIN_RIGHT;
    let total_height = MARGIN_TOP + opts.frame_height + MARGIN_BOTTOM;
    let clip_id = format!("plot-clip-{figure_id}");

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{total_width}" height="{total_height}" viewBox="0 0 {total_width} {total_height}" font-family="sans-serif">"#
    );
    let _ = write!(
        svg,
        r#"<defs><clipPath id="{clip_id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath></defs>"#,
        MARGIN_LEFT, MARGIN_TOP, opts.frame_width, opts.frame_height
    );

    // plot background
    let _ = write!(
        svg,
        r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#ffffff" stroke="none"/>"##,
        MARGIN_LEFT, MARGIN_TOP, opts.frame_width, opts.frame_height
    );

    let _ = write!(svg, r#"<g clip-path="url(#{clip_id})">"#);
    render_outlines(&mut svg, figure, &frame);
    for layer in &figure.layers {
        match layer {
            DataLayer::Quadmesh(mesh) => render_quadmesh(&mut svg, mesh, &frame),
            DataLayer::Points(points) => render_points(&mut svg, points, &frame),
        }
    }
    svg.push_str("</g>");

    render_axes(&mut svg, &frame);
    render_title(&mut svg, &figure.title, opts);
    render_legends(&mut svg, figure, opts);

    svg.push_str("</svg>");
    svg
}

fn render_outlines(svg: &mut String, figure: &Figure, frame: &Frame) {
    for outline in &figure.outlines {
        for ring in &outline.rings {
            if ring.len() < 2 {
                continue;
            }
            let mut path = String::new();
            for (k, &(lon, lat)) in ring.iter().enumerate() {
                let cmd = if k == 0 { 'M' } else { 'L' };
                let _ = write!(path, "{cmd}{:.2} {:.2}", frame.x(lon), frame.y(lat));
            }
            let _ = write!(
                svg,
                r##"<path d="{path}" fill="none" stroke="#555555" stroke-width="0.7"/>"##
            );
        }
    }
}

fn render_quadmesh(svg: &mut String, mesh: &super::compose::QuadmeshLayer, frame: &Frame) {
    for patch in &mesh.patches {
        let points = patch
            .corners
            .iter()
            .map(|&(lon, lat)| format!("{:.2},{:.2}", frame.x(lon), frame.y(lat)))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(
            svg,
            r#"<polygon points="{points}" fill="{}" stroke="none">{}</polygon>"#,
            hex_string(patch.color),
            tooltip(&patch.attrs)
        );
    }
}

fn render_points(svg: &mut String, layer: &super::compose::PointLayer, frame: &Frame) {
    for marker in &layer.markers {
        let _ = write!(
            svg,
            r##"<circle cx="{:.2}" cy="{:.2}" r="{MARKER_RADIUS}" fill="{}" fill-opacity="{}" stroke="#222222" stroke-width="0.4">{}</circle>"##,
            frame.x(marker.lon),
            frame.y(marker.lat),
            hex_string(marker.color),
            layer.opacity,
            tooltip(&marker.attrs)
        );
    }
}

fn render_axes(svg: &mut String, frame: &Frame) {
    let x0 = MARGIN_LEFT;
    let y0 = MARGIN_TOP;
    let x1 = MARGIN_LEFT + frame.width;
    let y1 = MARGIN_TOP + frame.height;

    let _ = write!(
        svg,
        r##"<rect x="{x0}" y="{y0}" width="{}" height="{}" fill="none" stroke="#333333" stroke-width="1"/>"##,
        frame.width, frame.height
    );

    for tick in 0..=AXIS_TICKS {
        let t = tick as f64 / AXIS_TICKS as f64;

        let lon = frame.viewport.lon_min + t * (frame.viewport.lon_max - frame.viewport.lon_min);
        let x = frame.x(lon);
        let _ = write!(
            svg,
            r##"<line x1="{x:.2}" y1="{y1}" x2="{x:.2}" y2="{}" stroke="#333333" stroke-width="1"/>"##,
            y1 + 4.0
        );
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{}" font-size="10" text-anchor="middle">{lon:.1}&#176;</text>"#,
            y1 + 16.0
        );

        let lat = frame.viewport.lat_min + t * (frame.viewport.lat_max - frame.viewport.lat_min);
        let y = frame.y(lat);
        let _ = write!(
            svg,
            r##"<line x1="{}" y1="{y:.2}" x2="{x0}" y2="{y:.2}" stroke="#333333" stroke-width="1"/>"##,
            x0 - 4.0
        );
        let _ = write!(
            svg,
            r#"<text x="{}" y="{:.2}" font-size="10" text-anchor="end">{lat:.1}&#176;</text>"#,
            x0 - 7.0,
            y + 3.5
        );
    }

    let _ = write!(
        svg,
        r#"<text x="{:.2}" y="{}" font-size="11" text-anchor="middle">Longitude</text>"#,
        (x0 + x1) / 2.0,
        y1 + 32.0
    );
    let _ = write!(
        svg,
        r#"<text x="14" y="{:.2}" font-size="11" text-anchor="middle" transform="rotate(-90 14 {:.2})">Latitude</text>"#,
        (y0 + y1) / 2.0,
        (y0 + y1) / 2.0
    );
}

fn render_title(svg: &mut String, title: &str, opts: &RenderOptions) {
    let _ = write!(
        svg,
        r#"<text x="{:.2}" y="22" font-size="14" font-weight="bold" text-anchor="middle">{}</text>"#,
        MARGIN_LEFT + opts.frame_width / 2.0,
        escape(title)
    );
}

/// Color-bar for the first quadmesh layer, categorical legend for the
/// first point layer; both sit in the right margin.
fn render_legends(svg: &mut String, figure: &Figure, opts: &RenderOptions) {
    let legend_x = MARGIN_LEFT + opts.frame_width + 18.0;
    let mut cursor_y = MARGIN_TOP;

    if let Some(mesh) = figure.layers.iter().find_map(|l| match l {
        DataLayer::Quadmesh(mesh) => Some(mesh),
        _ => None,
    }) {
        let _ = write!(
            svg,
            r#"<text x="{legend_x}" y="{:.2}" font-size="10">{}</text>"#,
            cursor_y + 4.0,
            escape(&mesh.scale_label)
        );
        cursor_y += 10.0;

        let entries: Vec<_> = mesh.scale.entries().collect();
        let swatch = (opts.frame_height - 24.0) / entries.len() as f64;
        let swatch = swatch.min(14.0);
        // codes descend top to bottom, matching a vertical color bar
        for (row, &(code, color)) in entries.iter().rev().enumerate() {
            let y = cursor_y + row as f64 * swatch;
            let label = schema::significance_label(code).unwrap_or_default();
            let _ = write!(
                svg,
                r#"<rect x="{legend_x}" y="{y:.2}" width="14" height="{swatch:.2}" fill="{}"><title>{code}: {}</title></rect>"#,
                hex_string(color),
                escape(&label)
            );
            let _ = write!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" font-size="8">{code}</text>"#,
                legend_x + 18.0,
                y + swatch / 2.0 + 2.5
            );
        }
        cursor_y += entries.len() as f64 * swatch + 16.0;
    }

    for layer in &figure.layers {
        let DataLayer::Points(points) = layer else {
            continue;
        };
        if points.legend.is_empty() {
            continue;
        }
        let _ = write!(
            svg,
            r#"<text x="{legend_x}" y="{:.2}" font-size="10">{}</text>"#,
            cursor_y + 4.0,
            escape(&points.name)
        );
        cursor_y += 12.0;
        for &(_, color, label) in &points.legend {
            let _ = write!(
                svg,
                r#"<rect x="{legend_x}" y="{:.2}" width="9" height="9" fill="{}" fill-opacity="{}"/>"#,
                cursor_y,
                hex_string(color),
                points.opacity
            );
            let _ = write!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" font-size="9">{}</text>"#,
                legend_x + 13.0,
                cursor_y + 8.0,
                escape(label)
            );
            cursor_y += 13.0;
        }
        cursor_y += 8.0;
    }
}

/// Hover tooltip: one `key: value` line per attribute
fn tooltip(attrs: &[(String, String)]) -> String {
    let body = attrs
        .iter()
        .map(|(key, value)| format!("{}: {}", escape(key), escape(value)))
        .collect::<Vec<_>>()
        .join("&#10;");
    format!("<title>{body}</title>")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
