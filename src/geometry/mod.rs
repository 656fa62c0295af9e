//! Boundary geometry pipeline.
//!
//! Import path: wire rings -> [`ring`] -> [`repair`] (validate, repair,
//! [`simplify`], re-validate) -> canonical `MultiPolygon`. [`bounds`] works
//! on the raw wire geometry alongside, and [`transcode`] converts back out.

pub mod bounds;
pub mod repair;
pub mod ring;
pub mod simplify;
pub mod transcode;

use geo::MultiPolygon;
use geojson::Value;
use tracing::warn;

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};

pub use bounds::compute_bbox_centroid;
pub use repair::{is_valid, repair_polygon_entry};
pub use simplify::DEFAULT_SIMPLIFY_TOLERANCE;
pub use transcode::{simplify_for_display, to_wire};

/// A polygon entry of a `MultiPolygon` that could not be ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: IngestError,
}

/// Canonical geometry plus the entries dropped while building it.
#[derive(Debug, Clone)]
pub struct IngestedGeometry {
    pub geometry: MultiPolygon<f64>,
    pub skipped_entries: Vec<SkippedEntry>,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Build the canonical geometry for a wire `Polygon` or `MultiPolygon`.
///
/// A `Polygon` fails with its entry's error. For a `MultiPolygon` failing
/// entries are skipped and reported; the whole geometry fails with
/// [`IngestError::NoValidPolygon`] only when no entry survives.
pub fn ingest_geometry(value: &Value, config: &IngestConfig) -> IngestResult<IngestedGeometry> {
    match value {
        Value::Polygon(rings) => Ok(IngestedGeometry {
            geometry: repair_polygon_entry(rings, config)?,
            skipped_entries: Vec::new(),
        }),
        Value::MultiPolygon(entries) => {
            let mut polygons = Vec::new();
            let mut skipped_entries = Vec::new();

            for (index, rings) in entries.iter().enumerate() {
                match repair_polygon_entry(rings, config) {
                    Ok(part) => polygons.extend(part.0),
                    Err(reason) => {
                        warn!("Skipping polygon entry {}: {}", index, reason);
                        skipped_entries.push(SkippedEntry { index, reason });
                    }
                }
            }

            if polygons.is_empty() {
                return Err(IngestError::NoValidPolygon);
            }
            Ok(IngestedGeometry {
                geometry: MultiPolygon::new(polygons),
                skipped_entries,
            })
        }
        other => Err(IngestError::UnsupportedGeometryType(
            type_name(other).to_string(),
        )),
    }
}
