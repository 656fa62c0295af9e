//! Polygon validity checks and self-intersection repair.
//!
//! Validity follows the simple-feature rules that matter for containment
//! queries: rings are closed with at least 4 finite points, no ring crosses
//! itself, rings of a polygon do not cross each other, holes lie inside the
//! exterior, and polygons of a multi-polygon do not cross each other.
//! Touching at isolated vertices is allowed.
//!
//! Repair is a zero-distance buffer: rings are re-oriented and outlined by
//! the overlay engine, which splits self-intersecting rings into simple
//! polygons and drops holes that lie outside their shell.

use geo::{
    line_intersection::{line_intersection, LineIntersection},
    Area, BoundingRect, Buffer, Contains, Coord, Line, LineString, MultiPolygon, Point,
    Polygon, Rect,
};
use geojson::PolygonType;
use tracing::{debug, warn};

use super::ring::{build_ring, MIN_RING_POINTS};
use super::simplify::simplify_multi_polygon;
use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};

/// A single validity violation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    TooFewPoints { ring: String, points: usize },
    NotClosed { ring: String },
    NonFinite { ring: String },
    SelfIntersection { ring: String },
    RingsCross { first: String, second: String },
    HoleOutsideShell { hole: usize },
    ZeroArea,
    PolygonsCross { first: usize, second: usize },
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::TooFewPoints { ring, points } => {
                write!(f, "{} has {} points", ring, points)
            }
            InvalidReason::NotClosed { ring } => write!(f, "{} is not closed", ring),
            InvalidReason::NonFinite { ring } => write!(f, "{} has a non-finite coordinate", ring),
            InvalidReason::SelfIntersection { ring } => {
                write!(f, "{} has a self-intersection", ring)
            }
            InvalidReason::RingsCross { first, second } => write!(f, "{} crosses {}", first, second),
            InvalidReason::HoleOutsideShell { hole } => {
                write!(f, "interior ring {} lies outside the exterior", hole)
            }
            InvalidReason::ZeroArea => write!(f, "polygon has zero area"),
            InvalidReason::PolygonsCross { first, second } => {
                write!(f, "polygon {} crosses polygon {}", first, second)
            }
        }
    }
}

fn ring_name(index: usize) -> String {
    if index == 0 {
        "exterior ring".to_string()
    } else {
        format!("interior ring {}", index - 1)
    }
}

fn edges(ring: &LineString<f64>) -> impl Iterator<Item = Line<f64>> + '_ {
    ring.0.windows(2).map(|w| Line::new(w[0], w[1]))
}

/// A vertex that appears twice at non-adjacent positions (a spike or pinch).
fn has_repeated_vertex(ring: &LineString<f64>) -> bool {
    let coords = &ring.0;
    // Closing vertex excluded
    let check_len = coords.len().saturating_sub(1);
    for i in 0..check_len {
        for j in (i + 1)..check_len {
            if coords[i] == coords[j] {
                return true;
            }
        }
    }
    false
}

/// Any pair of non-adjacent edges that meet.
fn has_self_intersection(ring: &LineString<f64>) -> bool {
    let lines: Vec<Line<f64>> = edges(ring).collect();
    let n = lines.len();

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(lines[i], lines[j]) {
                None => {}
                Some(LineIntersection::Collinear { .. }) => return true,
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    if !adjacent {
                        return true;
                    }
                    // Adjacent edges may only share their common vertex
                    let shared = if j == i + 1 {
                        lines[i].end
                    } else {
                        lines[i].start
                    };
                    if intersection != shared {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Two distinct rings cross or overlap along an edge. Touching at a vertex is allowed.
fn rings_cross(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    let (Some(rect_a), Some(rect_b)) = (a.bounding_rect(), b.bounding_rect()) else {
        return false;
    };
    if !rects_overlap(&rect_a, &rect_b) {
        return false;
    }

    for ea in edges(a) {
        for eb in edges(b) {
            match line_intersection(ea, eb) {
                None => {}
                Some(LineIntersection::Collinear { .. }) => return true,
                Some(LineIntersection::SinglePoint { is_proper, .. }) => {
                    if is_proper {
                        return true;
                    }
                }
            }
        }
    }
    false
}

fn rects_overlap(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x && a.min().y <= b.max().y && b.min().y <= a.max().y
}

fn validate_ring(ring: &LineString<f64>, name: String) -> Option<InvalidReason> {
    let coords = &ring.0;
    if coords.len() < MIN_RING_POINTS {
        return Some(InvalidReason::TooFewPoints {
            ring: name,
            points: coords.len(),
        });
    }
    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Some(InvalidReason::NonFinite { ring: name });
    }
    if coords.first() != coords.last() {
        return Some(InvalidReason::NotClosed { ring: name });
    }
    if has_repeated_vertex(ring) || has_self_intersection(ring) {
        return Some(InvalidReason::SelfIntersection { ring: name });
    }
    None
}

/// Collect the validity violations of a polygon.
pub fn validate_polygon(polygon: &Polygon<f64>) -> Vec<InvalidReason> {
    let rings: Vec<&LineString<f64>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .collect();

    let mut errors: Vec<InvalidReason> = rings
        .iter()
        .enumerate()
        .filter_map(|(i, ring)| validate_ring(ring, ring_name(i)))
        .collect();
    if !errors.is_empty() {
        return errors;
    }

    if polygon.unsigned_area() == 0.0 {
        errors.push(InvalidReason::ZeroArea);
        return errors;
    }

    for i in 0..rings.len() {
        for j in (i + 1)..rings.len() {
            if rings_cross(rings[i], rings[j]) {
                errors.push(InvalidReason::RingsCross {
                    first: ring_name(i),
                    second: ring_name(j),
                });
            }
        }
    }

    let shell = Polygon::new(polygon.exterior().clone(), vec![]);
    for (hole_idx, hole) in polygon.interiors().iter().enumerate() {
        // A hole that does not cross the shell is inside iff any vertex is strictly inside
        let inside = hole
            .0
            .iter()
            .any(|c: &Coord<f64>| shell.contains(&Point::from(*c)));
        if !inside {
            errors.push(InvalidReason::HoleOutsideShell { hole: hole_idx });
        }
    }

    errors
}

/// Collect the validity violations of a multi-polygon.
pub fn validate_multi_polygon(geometry: &MultiPolygon<f64>) -> Vec<InvalidReason> {
    let mut errors: Vec<InvalidReason> = geometry.0.iter().flat_map(validate_polygon).collect();

    for i in 0..geometry.0.len() {
        for j in (i + 1)..geometry.0.len() {
            if rings_cross(geometry.0[i].exterior(), geometry.0[j].exterior()) {
                errors.push(InvalidReason::PolygonsCross {
                    first: i,
                    second: j,
                });
            }
        }
    }

    errors
}

pub fn is_valid(geometry: &MultiPolygon<f64>) -> bool {
    !geometry.0.is_empty() && validate_multi_polygon(geometry).is_empty()
}

/// Rebuild a geometry with a zero-distance buffer.
///
/// The result is a multi-polygon of simple polygons; it is empty when
/// nothing with positive area survives.
pub fn repair(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let repaired = geometry.buffer(0.0);
    MultiPolygon::new(
        repaired
            .0
            .into_iter()
            .filter(|p| p.exterior().0.len() >= MIN_RING_POINTS)
            .collect(),
    )
}

/// Build, repair and simplify one polygon entry of a wire geometry.
///
/// The first ring is the exterior and must pass ring construction; holes
/// that fail it are dropped individually. Repair runs at most twice: once
/// before simplification when the input is invalid, and once after
/// simplification when that introduced invalidity. Output of the second
/// repair is accepted as-is.
pub fn repair_polygon_entry(
    rings: &PolygonType,
    config: &IngestConfig,
) -> IngestResult<MultiPolygon<f64>> {
    repair_polygon_entry_with(rings, config, repair)
}

fn repair_polygon_entry_with<F>(
    rings: &PolygonType,
    config: &IngestConfig,
    mut repair_fn: F,
) -> IngestResult<MultiPolygon<f64>>
where
    F: FnMut(&MultiPolygon<f64>) -> MultiPolygon<f64>,
{
    let (exterior, holes) = rings
        .split_first()
        .ok_or(IngestError::RingTooShort { points: 0 })?;

    let exterior = build_ring(exterior, config.coordinate_precision)?;
    let holes: Vec<LineString<f64>> = holes
        .iter()
        .enumerate()
        .filter_map(|(i, hole)| match build_ring(hole, config.coordinate_precision) {
            Ok(ring) => Some(ring),
            Err(e) => {
                debug!("Dropping interior ring {}: {}", i, e);
                None
            }
        })
        .collect();

    let mut geometry = MultiPolygon::new(vec![Polygon::new(exterior, holes)]);

    let errors = validate_multi_polygon(&geometry);
    if !errors.is_empty() {
        debug!("Repairing invalid polygon: {}", errors[0]);
        geometry = repair_fn(&geometry);
        if geometry.0.is_empty() {
            return Err(IngestError::NoValidPolygon);
        }
    }

    let simplified = simplify_multi_polygon(&geometry, config.simplify_tolerance);
    if is_valid(&simplified) {
        return Ok(simplified);
    }

    debug!("Simplification left an invalid polygon, repairing once more");
    let repaired = repair_fn(&simplified);
    if repaired.0.is_empty() {
        return Err(IngestError::NoValidPolygon);
    }
    let remaining = validate_multi_polygon(&repaired);
    if !remaining.is_empty() {
        warn!(
            "Accepting polygon that is still invalid after repair: {}",
            remaining[0]
        );
    }
    Ok(repaired)
}
