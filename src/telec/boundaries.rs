//! Country-boundary reference geometry
//!
//! The reference layer is the Natural Earth 50m admin-0 countries dataset,
//! fetched from its public mirror and reduced to outline rings. A local
//! GeoJSON file can stand in for the download (offline runs, or auxiliary
//! overlays such as catchments and rivers).
//!
//! Failure anywhere on this path degrades to an empty outline set with a
//! logged warning; the map then renders without reference outlines.

use super::error::{Result, TelecError};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Natural Earth 50m cultural vectors, admin-0 countries, GeoJSON build
pub const NATURAL_EARTH_50M_COUNTRIES_URL: &str =
    "https://raw.githubusercontent.com/nvkelso/natural-earth-vector/master/geojson/ne_50m_admin_0_countries.geojson";

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Outline rings in geographic lon/lat, stroke-only rendering
#[derive(Debug, Clone, Default)]
pub struct OutlineSet {
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl OutlineSet {
    pub fn empty() -> OutlineSet {
        OutlineSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Extract outline rings from a GeoJSON document.
    ///
    /// Accepts a FeatureCollection, a single Feature, or a bare geometry;
    /// Polygon and MultiPolygon geometries contribute their rings,
    /// LineString and MultiLineString contribute as-is, anything else is
    /// skipped.
    pub fn from_geojson(doc: &Value) -> Result<OutlineSet> {
        let mut rings = Vec::new();

        match doc.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => {
                let features = doc
                    .get("features")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        TelecError::Other("FeatureCollection without features array".into())
                    })?;
                for feature in features {
                    if let Some(geometry) = feature.get("geometry") {
                        collect_rings(geometry, &mut rings);
                    }
                }
            }
            Some("Feature") => {
                if let Some(geometry) = doc.get("geometry") {
                    collect_rings(geometry, &mut rings);
                }
            }
            Some(_) => collect_rings(doc, &mut rings),
            None => return Err(TelecError::Other("GeoJSON document without type".into())),
        }

        Ok(OutlineSet { rings })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<OutlineSet> {
        let doc: Value = serde_json::from_slice(bytes)
            .map_err(|e| TelecError::Other(format!("GeoJSON parse: {e}")))?;
        Self::from_geojson(&doc)
    }
}

fn collect_rings(geometry: &Value, rings: &mut Vec<Vec<(f64, f64)>>) {
    let coordinates = geometry.get("coordinates");
    match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") | Some("MultiLineString") => {
            if let Some(polygon) = coordinates {
                push_ring_array(polygon, rings);
            }
        }
        Some("MultiPolygon") => {
            if let Some(polygons) = coordinates.and_then(Value::as_array) {
                for polygon in polygons {
                    push_ring_array(polygon, rings);
                }
            }
        }
        Some("LineString") => {
            if let Some(line) = coordinates {
                if let Some(ring) = parse_ring(line) {
                    rings.push(ring);
                }
            }
        }
        _ => {}
    }
}

fn push_ring_array(polygon: &Value, rings: &mut Vec<Vec<(f64, f64)>>) {
    if let Some(array) = polygon.as_array() {
        for ring in array {
            if let Some(ring) = parse_ring(ring) {
                rings.push(ring);
            }
        }
    }
}

fn parse_ring(ring: &Value) -> Option<Vec<(f64, f64)>> {
    let positions = ring.as_array()?;
    let mut out = Vec::with_capacity(positions.len());
    for position in positions {
        let coords = position.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        out.push((lon, lat));
    }
    (!out.is_empty()).then_some(out)
}

/// Load outlines from a local GeoJSON file
pub fn load_local(path: &Path) -> Result<OutlineSet> {
    let bytes = std::fs::read(path).map_err(|source| TelecError::Io {
        path: path.to_string_lossy().into_owned(),
        source,
    })?;
    OutlineSet::from_slice(&bytes)
}

async fn fetch(url: &str) -> Result<OutlineSet> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| TelecError::Other(format!("HTTP client: {e}")))?;
    let bytes = client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| TelecError::Other(format!("fetch {url}: {e}")))?
        .bytes()
        .await
        .map_err(|e| TelecError::Other(format!("fetch {url}: {e}")))?;
    OutlineSet::from_slice(&bytes)
}

/// Resolve the reference outlines, degrading to an empty set on any failure.
///
/// A local file takes precedence over the download when given.
pub async fn resolve(local: Option<&Path>, url: &str) -> OutlineSet {
    if let Some(path) = local {
        match load_local(path) {
            Ok(set) => return set,
            Err(e) => {
                warn!("local boundary file unusable, map renders without outlines: {e}");
                return OutlineSet::empty();
            }
        }
    }

    match fetch(url).await {
        Ok(set) => set,
        Err(e) => {
            warn!("boundary fetch failed, map renders without outlines: {e}");
            OutlineSet::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURE_COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"NAME": "Esparta"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"NAME": "Atlantis"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]],
                        [[[4.0, 4.0], [5.0, 4.0], [5.0, 5.0], [4.0, 4.0]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn feature_collection_rings_are_collected() {
        let set = OutlineSet::from_slice(FEATURE_COLLECTION.as_bytes()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.rings[0][1], (1.0, 0.0));
    }

    #[test]
    fn empty_collection_is_valid_and_empty() {
        let set =
            OutlineSet::from_slice(br#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(OutlineSet::from_slice(b"not json").is_err());
        assert!(OutlineSet::from_slice(br#"{"no": "type"}"#).is_err());
    }

    #[test]
    fn non_polygon_geometries_are_skipped() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}},
                {"type": "Feature", "geometry": {"type": "LineString",
                 "coordinates": [[0.0, 0.0], [1.0, 1.0]]}}
            ]
        }"#;
        let set = OutlineSet::from_slice(doc.as_bytes()).unwrap();
        // the point contributes nothing, the line contributes one ring
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn unresolvable_sources_degrade_to_empty() {
        let set = resolve(Some(Path::new("/nonexistent/outlines.geojson")), "").await;
        assert!(set.is_empty());

        let set = resolve(None, "http://127.0.0.1:1/never-there.geojson").await;
        assert!(set.is_empty());
    }
}
