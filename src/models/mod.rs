//! Core data models for region lookup.

pub mod hierarchy;
pub mod region;

pub use hierarchy::RegionHierarchy;
pub use region::{BBox, Centroid, Region, RegionRef, RegionType};
