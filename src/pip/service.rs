//! Hierarchy resolution for a point.

use hashbrown::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ContainmentResolver, RegionStore};
use crate::config::ResolveConfig;
use crate::models::{Region, RegionHierarchy, RegionType};

/// Resolves the administrative hierarchy covering a point
pub struct HierarchyResolver<'a, S: RegionStore + ?Sized> {
    store: &'a S,
    max_ancestor_depth: usize,
}

impl<'a, S: RegionStore + ?Sized> HierarchyResolver<'a, S> {
    pub fn new(store: &'a S, config: &ResolveConfig) -> Self {
        Self {
            store,
            max_ancestor_depth: config.max_ancestor_depth,
        }
    }

    /// Build the hierarchy for a point.
    ///
    /// Tiers are tried in precedence order and only the first tier with a
    /// match is used. A ward match fills the coarser tiers by climbing its
    /// parent chain once per tier; a match at any other tier sets that tier
    /// alone.
    pub fn resolve_hierarchy(&self, lon: f64, lat: f64) -> RegionHierarchy {
        let mut hierarchy = RegionHierarchy::default();
        let containment = ContainmentResolver::new(self.store);

        let matched = RegionType::precedence()
            .iter()
            .find_map(|tier| containment.smallest(lon, lat, *tier));

        let Some(region) = matched else {
            debug!("No region covers ({}, {})", lon, lat);
            return hierarchy;
        };

        hierarchy.set(region.region_type, Some(region.reference()));

        if region.region_type == RegionType::Ward {
            for tier in [
                RegionType::Pc,
                RegionType::Ac,
                RegionType::District,
                RegionType::State,
            ] {
                let ancestor = self.find_ancestor(&region, tier);
                hierarchy.set(tier, ancestor.map(|a| a.reference()));
            }
        }

        hierarchy
    }

    /// Follow parent references from `start` until a region of `target` tier.
    ///
    /// Stops at a missing parent, a revisited identifier or after
    /// `max_ancestor_depth` lookups.
    pub fn find_ancestor(&self, start: &Region, target: RegionType) -> Option<Arc<Region>> {
        if start.region_type == target {
            return self.store.find_by_id(&start.id);
        }

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.id.clone());
        let mut next = start.parent_id.clone();

        for _ in 0..self.max_ancestor_depth {
            let id = next?;
            if !visited.insert(id.clone()) {
                warn!("Parent cycle at region {} while looking for {}", id, target);
                return None;
            }
            let parent = self.store.find_by_id(&id)?;
            if parent.region_type == target {
                return Some(parent);
            }
            next = parent.parent_id.clone();
        }

        debug!(
            "Gave up looking for {} above {} after {} hops",
            target, start.id, self.max_ancestor_depth
        );
        None
    }
}
