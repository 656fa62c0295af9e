//! Bounding box and marker centroid from raw wire coordinates.
//!
//! Both are computed from the input geometry before repair or
//! simplification, so they describe the extent of what was submitted.
//! Coordinates are rounded with the same precision ring construction uses,
//! so every stored vertex lies inside the box.

use geojson::{PolygonType, Position, Value};

use super::ring::round_to_precision;
use crate::models::{BBox, Centroid};

fn polygons(value: &Value) -> &[PolygonType] {
    match value {
        Value::Polygon(rings) => std::slice::from_ref(rings),
        Value::MultiPolygon(polygons) => polygons,
        _ => &[],
    }
}

fn lon_lat(position: &Position, precision: Option<u32>) -> Option<(f64, f64)> {
    match position.as_slice() {
        [lon, lat, ..] => Some((
            round_to_precision(*lon, precision),
            round_to_precision(*lat, precision),
        )),
        _ => None,
    }
}

/// Min/max over every coordinate of every ring, holes included.
///
/// Returns `None` when the geometry has no coordinates or is not a
/// polygon type.
pub fn compute_bbox(value: &Value, precision: Option<u32>) -> Option<BBox> {
    let mut bbox: Option<BBox> = None;

    for (lon, lat) in polygons(value)
        .iter()
        .flatten()
        .flatten()
        .filter_map(|p| lon_lat(p, precision))
    {
        bbox = Some(match bbox {
            None => BBox::new(lon, lat, lon, lat),
            Some(b) => BBox::new(
                b.min_lon.min(lon),
                b.min_lat.min(lat),
                b.max_lon.max(lon),
                b.max_lat.max(lat),
            ),
        });
    }

    bbox
}

/// Arithmetic mean of exterior-ring vertices across all polygons.
///
/// The closing vertex is counted like any other vertex.
pub fn compute_centroid(value: &Value, precision: Option<u32>) -> Option<Centroid> {
    let (mut sum_lon, mut sum_lat, mut count) = (0.0, 0.0, 0usize);

    for (lon, lat) in polygons(value)
        .iter()
        .filter_map(|rings| rings.first())
        .flatten()
        .filter_map(|p| lon_lat(p, precision))
    {
        sum_lon += lon;
        sum_lat += lat;
        count += 1;
    }

    if count == 0 {
        return None;
    }
    Some(Centroid {
        lon: sum_lon / count as f64,
        lat: sum_lat / count as f64,
    })
}

pub fn compute_bbox_centroid(
    value: &Value,
    precision: Option<u32>,
) -> (Option<BBox>, Option<Centroid>) {
    (compute_bbox(value, precision), compute_centroid(value, precision))
}
