//! Point-in-polygon region lookup.
//!
//! Regions live in a [`RegionStore`]; [`ContainmentResolver`] ranks the
//! regions covering a point and [`HierarchyResolver`] turns that into a
//! per-tier hierarchy by climbing parent references.

mod containment;
mod service;
mod store;

pub use containment::ContainmentResolver;
pub use service::HierarchyResolver;
pub use store::{MemoryRegionStore, RegionStore};
