//! GeoJSON FeatureCollection import into a region store.
//!
//! Features are processed one at a time and failures are isolated: a bad
//! feature is recorded in the [`ImportReport`] and the batch continues.

use geojson::Feature;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::geometry::{compute_bbox_centroid, ingest_geometry};
use crate::models::{Region, RegionType};
use crate::pip::RegionStore;

/// Property keys tried in order for the region name
const NAME_KEYS: &[&str] = &["name", "NAME", "Name", "DISTRICT"];
const UNKNOWN_NAME: &str = "unknown";

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Dataset label stored on every region; a four-digit value also sets `source_year`
    pub source: Option<String>,
    /// Tier used when a feature has no `type` property
    pub default_type: RegionType,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            source: None,
            default_type: RegionType::District,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFeature {
    /// Position of the feature in the input collection
    pub index: usize,
    pub reason: IngestError,
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<SkippedFeature>,
    /// Polygon entries dropped inside features that were imported
    pub skipped_entries: usize,
    pub region_ids: Vec<String>,
}

impl ImportReport {
    /// Fold one feature outcome into the report
    pub fn record(&mut self, index: usize, outcome: IngestResult<ImportedFeature>) {
        match outcome {
            Ok(feature) => {
                self.imported += 1;
                self.skipped_entries += feature.skipped_entries;
                self.region_ids.push(feature.id);
            }
            Err(reason) => {
                warn!("Skipping feature {}: {}", index, reason);
                self.skipped.push(SkippedFeature { index, reason });
            }
        }
    }
}

/// Outcome of a single imported feature
#[derive(Debug, Clone)]
pub struct ImportedFeature {
    pub id: String,
    pub skipped_entries: usize,
}

/// Extract the feature objects of a `FeatureCollection` (or a lone `Feature`).
pub fn feature_values(root: &Value) -> IngestResult<Vec<&Value>> {
    if let Some(features) = root.get("features") {
        return features
            .as_array()
            .map(|f| f.iter().collect())
            .ok_or_else(|| IngestError::MalformedFeature("`features` is not an array".to_string()));
    }
    match root.get("type").and_then(Value::as_str) {
        Some("Feature") => Ok(vec![root]),
        _ => Err(IngestError::MalformedFeature(
            "expected a GeoJSON FeatureCollection".to_string(),
        )),
    }
}

fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse a four-digit source label as a year
fn source_year(source: &str) -> Option<i32> {
    if source.len() == 4 && source.bytes().all(|b| b.is_ascii_digit()) {
        source.parse().ok()
    } else {
        None
    }
}

/// Builds [`Region`] records from GeoJSON features and saves them.
pub struct RegionImporter<'a> {
    options: &'a ImportOptions,
    config: &'a IngestConfig,
}

impl<'a> RegionImporter<'a> {
    pub fn new(options: &'a ImportOptions, config: &'a IngestConfig) -> Self {
        Self { options, config }
    }

    /// Map one feature to a region, without touching any store.
    pub fn build_region(&self, feature: &Value) -> IngestResult<(Region, usize)> {
        let feature: Feature = serde_json::from_value(feature.clone())
            .map_err(|e| IngestError::MalformedFeature(e.to_string()))?;
        let geometry = feature.geometry.as_ref().ok_or(IngestError::MissingGeometry)?;
        let mut properties = feature.properties.unwrap_or_default();

        let name = NAME_KEYS
            .iter()
            .find_map(|key| {
                properties
                    .get(*key)
                    .and_then(property_text)
                    .map(|name| (*key, name))
            })
            .map(|(key, name)| {
                properties.remove(key);
                name
            })
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        let mut take = |key: &str| properties.remove(key).as_ref().and_then(property_text);

        let region_type = match take("type") {
            Some(t) => t.parse::<RegionType>()?,
            None => self.options.default_type,
        };
        let state = take("state");
        let district = take("district");
        let code = take("code");
        let parent_id = take("parent_id").or_else(|| take("parentId"));

        let verified = properties
            .remove("verified")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let ingested = ingest_geometry(&geometry.value, self.config)?;
        let (bbox, centroid) =
            compute_bbox_centroid(&geometry.value, self.config.coordinate_precision);

        let mut region = Region::new(name, region_type, ingested.geometry);
        region.state = state;
        region.district = district;
        region.code = code;
        region.parent_id = parent_id;
        region.verified = verified;
        region.bbox = bbox;
        region.centroid = centroid;
        region.meta = properties;
        region.source = self.options.source.clone();
        region.source_year = self.options.source.as_deref().and_then(source_year);

        Ok((region, ingested.skipped_entries.len()))
    }

    /// Build and save one feature.
    pub fn import_feature<S: RegionStore + ?Sized>(
        &self,
        feature: &Value,
        store: &mut S,
    ) -> IngestResult<ImportedFeature> {
        let (region, skipped_entries) = self.build_region(feature)?;
        let saved = store.save(region);
        debug!("Imported {} {} as {}", saved.region_type, saved.name, saved.id);
        Ok(ImportedFeature {
            id: saved.id.clone(),
            skipped_entries,
        })
    }

    /// Import every feature of a parsed document.
    ///
    /// Only a document that is not a feature collection fails as a whole;
    /// per-feature failures end up in [`ImportReport::skipped`].
    pub fn import_value<S: RegionStore + ?Sized>(
        &self,
        root: &Value,
        store: &mut S,
    ) -> IngestResult<ImportReport> {
        let features = feature_values(root)?;
        let mut report = ImportReport::default();
        for (index, feature) in features.into_iter().enumerate() {
            report.record(index, self.import_feature(feature, store));
        }
        info!(
            "Imported {} features, skipped {}",
            report.imported,
            report.skipped.len()
        );
        Ok(report)
    }

    pub fn import_str<S: RegionStore + ?Sized>(
        &self,
        text: &str,
        store: &mut S,
    ) -> IngestResult<ImportReport> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| IngestError::MalformedFeature(e.to_string()))?;
        self.import_value(&root, store)
    }
}
