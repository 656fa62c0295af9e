//! regionpip - administrative boundary ingestion and point-to-region lookup
//!
//! This library provides shared types and modules for the ingest and query binaries.

pub mod config;
pub mod error;
pub mod geometry;
pub mod import;
pub mod models;
pub mod pip;

pub use config::{Config, IngestConfig, ResolveConfig};
pub use error::{IngestError, StoreError};
pub use geometry::{compute_bbox_centroid, ingest_geometry, simplify_for_display};
pub use import::{ImportOptions, ImportReport, RegionImporter};
pub use models::{Region, RegionHierarchy, RegionRef, RegionType};
pub use pip::{ContainmentResolver, HierarchyResolver, MemoryRegionStore, RegionStore};
