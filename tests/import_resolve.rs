use regionpip::{
    compute_bbox_centroid, simplify_for_display, ContainmentResolver, HierarchyResolver,
    ImportOptions, IngestConfig, IngestError, MemoryRegionStore, RegionImporter, RegionStore,
    RegionType, ResolveConfig,
};
use serde_json::{json, Value};

fn square(x0: f64, y0: f64, size: f64) -> Value {
    json!([[
        [x0, y0],
        [x0 + size, y0],
        [x0 + size, y0 + size],
        [x0, y0 + size],
        [x0, y0]
    ]])
}

fn feature(properties: Value, coordinates: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": {"type": "Polygon", "coordinates": coordinates}
    })
}

/// Nested tiers around (77.55, 12.55), linked by parent ids
fn karnataka() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            feature(json!({"name": "Karnataka", "type": "state", "parent_id": null}), square(77.0, 12.0, 1.0)),
            feature(json!({"name": "Bengaluru Urban", "type": "district", "parent_id": "karnataka"}), square(77.4, 12.4, 0.3)),
            feature(json!({"name": "Bangalore South", "type": "pc", "parent_id": "bengaluru-urban"}), square(77.5, 12.5, 0.1)),
            feature(json!({"name": "Jayanagar", "type": "ac", "parent_id": "bangalore-south"}), square(77.53, 12.53, 0.04)),
            feature(json!({"name": "Ward 168", "type": "ward", "parent_id": "jayanagar"}), square(77.54, 12.54, 0.02)),
            // A district with no finer coverage
            feature(json!({"name": "Mysuru", "type": "district", "parent_id": "karnataka"}), square(77.0, 12.0, 0.2)),
        ]
    })
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Import, then re-key every region by the slug of its name so parent ids resolve
fn load_store() -> MemoryRegionStore {
    let options = ImportOptions {
        source: Some("2011".to_string()),
        default_type: RegionType::District,
    };
    let config = IngestConfig::default();
    let mut imported = MemoryRegionStore::new();
    let report = RegionImporter::new(&options, &config)
        .import_value(&karnataka(), &mut imported)
        .unwrap();
    assert_eq!(report.imported, 6);
    assert!(report.skipped.is_empty());

    let mut store = MemoryRegionStore::new();
    for region in imported.all() {
        let mut region = (*region).clone();
        region.id = slug(&region.name);
        store.save(region);
    }
    store
}

#[test]
fn test_ward_point_resolves_full_hierarchy() {
    let store = load_store();
    let hierarchy =
        HierarchyResolver::new(&store, &ResolveConfig::default()).resolve_hierarchy(77.55, 12.55);

    assert_eq!(hierarchy.id(RegionType::Ward), Some("ward-168"));
    assert_eq!(hierarchy.id(RegionType::Ac), Some("jayanagar"));
    assert_eq!(hierarchy.id(RegionType::Pc), Some("bangalore-south"));
    assert_eq!(hierarchy.id(RegionType::District), Some("bengaluru-urban"));
    assert_eq!(hierarchy.id(RegionType::State), Some("karnataka"));
}

#[test]
fn test_containment_is_smallest_first() {
    let store = load_store();
    let names: Vec<String> = ContainmentResolver::new(&store)
        .resolve_containing(77.55, 12.55, None)
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(
        names,
        vec![
            "Ward 168",
            "Jayanagar",
            "Bangalore South",
            "Bengaluru Urban",
            "Karnataka"
        ]
    );
}

#[test]
fn test_district_only_point() {
    let store = load_store();
    let hierarchy =
        HierarchyResolver::new(&store, &ResolveConfig::default()).resolve_hierarchy(77.1, 12.1);

    assert_eq!(hierarchy.id(RegionType::District), Some("mysuru"));
    assert!(hierarchy.ward.is_none());
    assert!(hierarchy.ac.is_none());
    assert!(hierarchy.pc.is_none());
    assert!(hierarchy.state.is_none());
}

#[test]
fn test_point_outside_everything() {
    let store = load_store();
    let hierarchy =
        HierarchyResolver::new(&store, &ResolveConfig::default()).resolve_hierarchy(10.0, 10.0);
    assert!(hierarchy.is_empty());
}

#[test]
fn test_snapshot_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("regions.json");
    load_store().save_to_file(&path).unwrap();

    let store = MemoryRegionStore::load_from_file(&path).unwrap();
    assert_eq!(store.len(), 6);
    let ward = store.find_by_id("ward-168").unwrap();
    assert_eq!(ward.source_year, Some(2011));
    assert_eq!(ward.parent_id.as_deref(), Some("jayanagar"));

    let hierarchy =
        HierarchyResolver::new(&store, &ResolveConfig::default()).resolve_hierarchy(77.55, 12.55);
    assert_eq!(hierarchy.id(RegionType::State), Some("karnataka"));
}

#[test]
fn test_import_isolates_bad_features() {
    let collection = json!({
        "type": "FeatureCollection",
        "features": [
            feature(json!({"name": "A"}), square(0.0, 0.0, 1.0)),
            feature(json!({"name": "B"}), json!([[[0.0, 0.0], [1.0, 0.0]]])),
            feature(json!({"name": "C"}), square(2.0, 0.0, 1.0)),
            feature(json!({"name": "D"}), json!([[[5.0, 5.0], [5.0, 5.0], [6.0, 6.0]]])),
            feature(json!({"name": "E"}), square(4.0, 0.0, 1.0)),
        ]
    });

    let options = ImportOptions::default();
    let config = IngestConfig::default();
    let mut store = MemoryRegionStore::new();
    let report = RegionImporter::new(&options, &config)
        .import_str(&collection.to_string(), &mut store)
        .unwrap();

    assert_eq!(report.imported, 3);
    assert_eq!(report.skipped.len(), 2);
    assert!(report
        .skipped
        .iter()
        .all(|s| matches!(s.reason, IngestError::RingTooShort { .. })));
    let indices: Vec<usize> = report.skipped.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 3]);
}

#[test]
fn test_bowtie_feature_is_repaired_and_indexed() {
    let collection = json!({
        "type": "FeatureCollection",
        "features": [feature(
            json!({"name": "Bowtie", "type": "ward"}),
            json!([[[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]]])
        )]
    });

    let options = ImportOptions::default();
    let config = IngestConfig::default();
    let mut store = MemoryRegionStore::new();
    let report = RegionImporter::new(&options, &config)
        .import_value(&collection, &mut store)
        .unwrap();
    assert_eq!(report.imported, 1);

    // The repaired boundary keeps at least one lobe of the bowtie
    let resolver = ContainmentResolver::new(&store);
    let hits: Vec<String> = [(0.2, 1.0), (1.8, 1.0)]
        .iter()
        .flat_map(|&(lon, lat)| resolver.resolve_containing(lon, lat, Some(RegionType::Ward)))
        .map(|r| r.name.clone())
        .collect();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|name| name == "Bowtie"));
}

#[test]
fn test_square_bbox_and_display_round_trip() {
    let value: geojson::Value = serde_json::from_value(json!({
        "type": "Polygon",
        "coordinates": square(77.1, 12.1, 0.1)
    }))
    .map(|g: geojson::Geometry| g.value)
    .unwrap();

    let (bbox, centroid) = compute_bbox_centroid(&value, None);
    let bbox = bbox.unwrap();
    assert!((bbox.min_lon - 77.1).abs() < 1e-9);
    assert!((bbox.max_lat - 12.2).abs() < 1e-9);
    let centroid = centroid.unwrap();
    assert!((centroid.lon - 77.15).abs() < 0.02);
    assert!((centroid.lat - 12.15).abs() < 0.02);

    let stored = json!({"type": "Polygon", "coordinates": square(77.1, 12.1, 0.1)});
    let rendered = simplify_for_display(&stored, 0.001);
    assert_eq!(rendered["type"], "Polygon");
    assert_eq!(rendered["coordinates"][0].as_array().unwrap().len(), 5);
}
