//! Douglas-Peucker vertex reduction for polygon rings.
//!
//! Each ring (exterior and holes) is simplified on its own with
//! `geo::Simplify`, which keeps both endpoints, so the output stays closed. A ring that would
//! collapse below 4 points keeps its original vertices rather than being
//! dropped; boundaries are never discarded by simplification.
//!
//! The same routine backs ingestion (fixed tolerance from `IngestConfig`)
//! and display rendering (caller-supplied tolerance).

use geo::{LineString, MultiPolygon, Polygon, Simplify};

use super::ring::MIN_RING_POINTS;

/// Default ingestion tolerance in decimal degrees (~5.5 m at the equator)
pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 0.00005;

/// Simplify one ring, falling back to the input when it would degenerate.
pub fn simplify_ring(ring: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    let simplified = ring.simplify(tolerance);
    if simplified.0.len() < MIN_RING_POINTS || simplified.0.first() != simplified.0.last() {
        return ring.clone();
    }
    simplified
}

pub fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let exterior = simplify_ring(polygon.exterior(), tolerance);
    let interiors = polygon
        .interiors()
        .iter()
        .map(|hole| simplify_ring(hole, tolerance))
        .collect();
    Polygon::new(exterior, interiors)
}

/// Simplify every polygon of a multi-polygon.
///
/// Non-positive or non-finite tolerances leave the geometry untouched, as
/// does a result without any polygon.
pub fn simplify_multi_polygon(geometry: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return geometry.clone();
    }

    let simplified = MultiPolygon::new(
        geometry
            .0
            .iter()
            .map(|polygon| simplify_polygon(polygon, tolerance))
            .collect(),
    );

    if simplified.0.is_empty() {
        return geometry.clone();
    }
    simplified
}
