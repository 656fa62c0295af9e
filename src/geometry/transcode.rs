//! Conversion between canonical multi-polygons and GeoJSON wire geometry.

use geo::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use geojson::{PolygonType, Value};
use tracing::debug;

use super::simplify::simplify_multi_polygon;
use super::{ingest_geometry, IngestedGeometry};
use crate::config::IngestConfig;
use crate::error::IngestResult;

/// Emit a `Polygon` for a single part, `MultiPolygon` otherwise.
pub fn to_wire(geometry: &MultiPolygon<f64>) -> geojson::Geometry {
    let value = match geometry.0.as_slice() {
        [single] => Value::from(single),
        _ => Value::from(geometry),
    };
    geojson::Geometry::new(value)
}

/// Collect every polygon of a geometry, descending into collections.
pub fn flatten_polygons(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    fn collect(geometry: &Geometry<f64>, out: &mut Vec<Polygon<f64>>) {
        match geometry {
            Geometry::Polygon(p) => out.push(p.clone()),
            Geometry::MultiPolygon(mp) => out.extend(mp.0.iter().cloned()),
            Geometry::GeometryCollection(gc) => {
                for member in gc.iter() {
                    collect(member, out);
                }
            }
            _ => {}
        }
    }

    let mut polygons = Vec::new();
    collect(geometry, &mut polygons);
    MultiPolygon::new(polygons)
}

/// Wire form of an arbitrary repair result; non-areal members are dropped.
pub fn geometry_to_wire(geometry: &Geometry<f64>) -> geojson::Geometry {
    to_wire(&flatten_polygons(geometry))
}

/// Wire to canonical, through ring construction and repair.
pub fn from_wire(
    geometry: &geojson::Geometry,
    config: &IngestConfig,
) -> IngestResult<IngestedGeometry> {
    ingest_geometry(&geometry.value, config)
}

fn ring_from_positions(ring: &[Vec<f64>]) -> Option<LineString<f64>> {
    let coords = ring
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect::<Option<Vec<Coord<f64>>>>()?;
    if coords.is_empty() {
        return None;
    }
    // Polygon::new closes the ring
    Some(LineString::new(coords))
}

fn polygon_from_rings(rings: &PolygonType) -> Option<Polygon<f64>> {
    let (exterior, holes) = rings.split_first()?;
    let exterior = ring_from_positions(exterior)?;
    let holes = holes
        .iter()
        .map(|h| ring_from_positions(h))
        .collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, holes))
}

fn stored_to_multi_polygon(stored: &serde_json::Value) -> Option<MultiPolygon<f64>> {
    let geometry: geojson::Geometry = serde_json::from_value(stored.clone()).ok()?;
    let polygons = match &geometry.value {
        Value::Polygon(rings) => vec![polygon_from_rings(rings)?],
        Value::MultiPolygon(parts) => parts
            .iter()
            .map(polygon_from_rings)
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    Some(MultiPolygon::new(polygons))
}

/// Simplify a stored GeoJSON geometry object for display.
///
/// Anything that is not a well-formed `Polygon`/`MultiPolygon` is returned
/// unchanged, so one corrupt record cannot break a listing.
pub fn simplify_for_display(stored: &serde_json::Value, tolerance: f64) -> serde_json::Value {
    let Some(geometry) = stored_to_multi_polygon(stored) else {
        debug!("Passing through unrecognized stored geometry");
        return stored.clone();
    };

    let simplified = simplify_multi_polygon(&geometry, tolerance);
    serde_json::to_value(to_wire(&simplified)).unwrap_or_else(|_| stored.clone())
}
