//! Point containment with smallest-region-first ordering.

use std::sync::Arc;
use tracing::debug;

use super::RegionStore;
use crate::models::{Region, RegionRef, RegionType};

/// Finds regions covering a point, ranked by approximate area.
pub struct ContainmentResolver<'a, S: RegionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RegionStore + ?Sized> ContainmentResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Regions intersecting the point, smallest bbox area first.
    ///
    /// Regions without a bbox sort after all others. The sort is stable, so
    /// ties keep the store's default order; for [`super::MemoryRegionStore`]
    /// that is insertion order, other stores make no promise.
    pub fn resolve_containing(
        &self,
        lon: f64,
        lat: f64,
        type_filter: Option<RegionType>,
    ) -> Vec<Arc<Region>> {
        let mut matches = self.store.find_intersecting(lon, lat, type_filter);
        matches.sort_by(|a, b| a.approx_area().total_cmp(&b.approx_area()));

        debug!(
            "Containment at ({}, {}) filter {:?}: {} matches",
            lon,
            lat,
            type_filter,
            matches.len()
        );
        matches
    }

    pub fn resolve_containing_refs(
        &self,
        lon: f64,
        lat: f64,
        type_filter: Option<RegionType>,
    ) -> Vec<RegionRef> {
        self.resolve_containing(lon, lat, type_filter)
            .iter()
            .map(|r| r.reference())
            .collect()
    }

    /// Smallest region of a tier covering the point
    pub fn smallest(&self, lon: f64, lat: f64, tier: RegionType) -> Option<Arc<Region>> {
        self.resolve_containing(lon, lat, Some(tier)).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BBox;
    use crate::pip::MemoryRegionStore;
    use geo::{polygon, MultiPolygon};

    fn region(name: &str, region_type: RegionType, x0: f64, y0: f64, size: f64, bbox: bool) -> Region {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]]);
        let mut region = Region::new(name, region_type, geometry);
        if bbox {
            region.bbox = Some(BBox::new(x0, y0, x0 + size, y0 + size));
        }
        region
    }

    #[test]
    fn test_smallest_first() {
        let mut store = MemoryRegionStore::new();
        // Larger region inserted first so order is not an accident of insertion
        store.save(region("District", RegionType::District, 0.0, 0.0, 10.0, true));
        store.save(region("Ward", RegionType::Ward, 4.0, 4.0, 1.0, true));

        let resolver = ContainmentResolver::new(&store);
        let names: Vec<String> = resolver
            .resolve_containing(4.5, 4.5, None)
            .iter()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["Ward", "District"]);

        let wards = resolver.resolve_containing(4.5, 4.5, Some(RegionType::Ward));
        assert_eq!(wards.len(), 1);
        assert_eq!(wards[0].name, "Ward");
    }

    #[test]
    fn test_missing_bbox_sorts_last() {
        let mut store = MemoryRegionStore::new();
        store.save(region("No bbox", RegionType::Ward, 4.0, 4.0, 1.0, false));
        store.save(region("Huge", RegionType::State, -50.0, -50.0, 100.0, true));

        let resolver = ContainmentResolver::new(&store);
        let refs = resolver.resolve_containing_refs(4.5, 4.5, None);
        assert_eq!(refs[0].name, "Huge");
        assert_eq!(refs[1].name, "No bbox");
    }

    #[test]
    fn test_ties_keep_store_order() {
        let mut store = MemoryRegionStore::new();
        store.save(region("First", RegionType::Ward, 0.0, 0.0, 1.0, true));
        store.save(region("Second", RegionType::Ward, 0.0, 0.0, 1.0, true));
        store.save(region("Third", RegionType::Ward, 0.0, 0.0, 1.0, false));
        store.save(region("Fourth", RegionType::Ward, 0.0, 0.0, 1.0, false));

        let resolver = ContainmentResolver::new(&store);
        let names: Vec<String> = resolver
            .resolve_containing(0.5, 0.5, None)
            .iter()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third", "Fourth"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let store = MemoryRegionStore::new();
        let resolver = ContainmentResolver::new(&store);
        assert!(resolver.resolve_containing(0.0, 0.0, None).is_empty());
        assert!(resolver.smallest(0.0, 0.0, RegionType::Ward).is_none());
    }
}
