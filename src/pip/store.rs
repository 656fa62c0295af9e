//! Region storage with an R-tree over geometry envelopes.

use chrono::Utc;
use geo::{BoundingRect, Point};
use hashbrown::HashMap;
use regex::{Regex, RegexBuilder};
use rstar::{RTree, RTreeObject, AABB};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Region, RegionType};

/// Operations the resolvers and the importer need from a region store.
///
/// Every listing returns regions in the store's default order.
pub trait RegionStore {
    /// Insert or wholesale replace a region, returning the stored record
    fn save(&mut self, region: Region) -> Arc<Region>;

    fn find_by_id(&self, id: &str) -> Option<Arc<Region>>;

    fn find_by_type(&self, region_type: RegionType) -> Vec<Arc<Region>>;

    fn find_by_type_and_state(&self, region_type: RegionType, state: &str) -> Vec<Arc<Region>>;

    /// Case-insensitive exact name match within a tier
    fn find_by_type_and_name(&self, region_type: RegionType, name: &str) -> Vec<Arc<Region>>;

    /// Case-insensitive substring match on the name after stripping
    /// everything but ASCII letters, digits and spaces from the query
    fn search_by_name(&self, query: &str) -> Vec<Arc<Region>>;

    /// Regions whose geometry intersects the point (boundary included)
    fn find_intersecting(
        &self,
        lon: f64,
        lat: f64,
        region_type: Option<RegionType>,
    ) -> Vec<Arc<Region>>;

    fn all(&self) -> Vec<Arc<Region>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// R-tree entry pointing back at a region by identifier
#[derive(Debug, Clone, PartialEq)]
struct IndexedRegion {
    id: String,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRegion {
    fn new(region: &Region) -> Option<Self> {
        let rect = region.geometry.bounding_rect()?;
        Some(Self {
            id: region.id.clone(),
            envelope: AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
        })
    }
}

/// In-memory store; default order is insertion order.
#[derive(Default)]
pub struct MemoryRegionStore {
    regions: HashMap<String, Arc<Region>>,
    /// Insertion position of each identifier
    positions: HashMap<String, usize>,
    order: Vec<String>,
    tree: RTree<IndexedRegion>,
}

fn name_pattern(query: &str) -> Option<Regex> {
    let cleaned = Regex::new(r"[^A-Za-z0-9 ]")
        .ok()?
        .replace_all(query, "")
        .into_owned();
    RegexBuilder::new(&regex::escape(&cleaned))
        .case_insensitive(true)
        .build()
        .ok()
}

impl MemoryRegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ordered<'a>(&'a self) -> impl Iterator<Item = &'a Arc<Region>> + 'a {
        self.order.iter().filter_map(|id| self.regions.get(id))
    }

    fn filtered<F>(&self, predicate: F) -> Vec<Arc<Region>>
    where
        F: Fn(&Region) -> bool,
    {
        self.ordered()
            .filter(|r| predicate(r))
            .map(Arc::clone)
            .collect()
    }

    /// Load a JSON snapshot written by [`MemoryRegionStore::save_to_file`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        let regions: Vec<Region> = serde_json::from_str(&content)?;

        let mut store = Self::new();
        for region in regions {
            store.save(region);
        }
        info!("Loaded {} regions from snapshot", store.len());
        Ok(store)
    }

    /// Write every region, in default order, as a JSON array.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let regions: Vec<&Region> = self.ordered().map(|r| r.as_ref()).collect();
        let json = serde_json::to_vec(&regions)?;
        fs::write(path, json)?;
        info!("Wrote snapshot with {} regions", regions.len());
        Ok(())
    }
}

impl RegionStore for MemoryRegionStore {
    fn save(&mut self, mut region: Region) -> Arc<Region> {
        if region.id.is_empty() {
            region.id = Uuid::new_v4().to_string();
        }
        if region.created_at.is_none() {
            region.created_at = Some(Utc::now());
        }

        if let Some(previous) = self.regions.get(&region.id) {
            debug!("Replacing region {}", region.id);
            if let Some(indexed) = IndexedRegion::new(previous) {
                self.tree.remove(&indexed);
            }
        } else {
            self.positions.insert(region.id.clone(), self.order.len());
            self.order.push(region.id.clone());
        }

        if let Some(indexed) = IndexedRegion::new(&region) {
            self.tree.insert(indexed);
        }

        let region = Arc::new(region);
        self.regions.insert(region.id.clone(), Arc::clone(&region));
        region
    }

    fn find_by_id(&self, id: &str) -> Option<Arc<Region>> {
        self.regions.get(id).map(Arc::clone)
    }

    fn find_by_type(&self, region_type: RegionType) -> Vec<Arc<Region>> {
        self.filtered(|r| r.region_type == region_type)
    }

    fn find_by_type_and_state(&self, region_type: RegionType, state: &str) -> Vec<Arc<Region>> {
        self.filtered(|r| r.region_type == region_type && r.state.as_deref() == Some(state))
    }

    fn find_by_type_and_name(&self, region_type: RegionType, name: &str) -> Vec<Arc<Region>> {
        let name = name.to_lowercase();
        self.filtered(|r| r.region_type == region_type && r.name.to_lowercase() == name)
    }

    fn search_by_name(&self, query: &str) -> Vec<Arc<Region>> {
        match name_pattern(query) {
            Some(pattern) => self.filtered(|r| pattern.is_match(&r.name)),
            None => Vec::new(),
        }
    }

    fn find_intersecting(
        &self,
        lon: f64,
        lat: f64,
        region_type: Option<RegionType>,
    ) -> Vec<Arc<Region>> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        // Envelope candidates, then exact test; the tree yields no stable order
        let mut matches: Vec<(usize, Arc<Region>)> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter_map(|ir| self.regions.get(&ir.id))
            .filter(|r| region_type.map_or(true, |t| r.region_type == t))
            .filter(|r| r.covers(&point))
            .filter_map(|r| self.positions.get(&r.id).map(|pos| (*pos, Arc::clone(r))))
            .collect();

        matches.sort_by_key(|(pos, _)| *pos);
        matches.into_iter().map(|(_, r)| r).collect()
    }

    fn all(&self) -> Vec<Arc<Region>> {
        self.ordered().map(Arc::clone).collect()
    }

    fn len(&self) -> usize {
        self.regions.len()
    }
}
