//! Error types for geometry ingestion and region storage.

use thiserror::Error;

/// Reasons a feature or a single polygon entry cannot be ingested.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// A ring has fewer than 4 points after de-duplication and closing
    #[error("ring has {points} points after closing, at least 4 are required")]
    RingTooShort { points: usize },

    /// Repair left nothing usable for a polygon entry (or for every entry of a feature)
    #[error("no valid polygon could be built from the geometry")]
    NoValidPolygon,

    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),

    #[error("feature has no geometry")]
    MissingGeometry,

    #[error("unknown region type: {0}")]
    UnknownRegionType(String),

    #[error("malformed feature: {0}")]
    MalformedFeature(String),
}

/// Failures of the region store snapshot persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
