//! Region record and its value types.

use chrono::{DateTime, Utc};
use geo::{Intersects, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IngestError;

/// Administrative tier of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    /// State / union territory
    State,
    /// District
    District,
    /// Parliamentary constituency
    Pc,
    /// Assembly constituency
    Ac,
    /// Municipal ward
    Ward,
}

impl RegionType {
    /// Tiers in lookup precedence order, most specific first
    pub fn precedence() -> &'static [RegionType] {
        &[
            RegionType::Ward,
            RegionType::Ac,
            RegionType::Pc,
            RegionType::District,
            RegionType::State,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionType::State => "state",
            RegionType::District => "district",
            RegionType::Pc => "pc",
            RegionType::Ac => "ac",
            RegionType::Ward => "ward",
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionType {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(RegionType::State),
            "district" => Ok(RegionType::District),
            "pc" => Ok(RegionType::Pc),
            "ac" => Ok(RegionType::Ac),
            "ward" => Ok(RegionType::Ward),
            _ => Err(IngestError::UnknownRegionType(s.to_string())),
        }
    }
}

/// Axis-aligned bounding box, serialized as `[minLon, minLat, maxLon, maxLat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Planar width * height in squared degrees
    pub fn approx_area(&self) -> f64 {
        ((self.max_lon - self.min_lon) * (self.max_lat - self.min_lat)).abs()
    }

    /// Inclusive containment test
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.min_lon, b.min_lat, b.max_lon, b.max_lat]
    }
}

/// Vertex-average marker point, serialized as `[lon, lat]`.
///
/// This is not an area-weighted centroid and should only be used as a coarse
/// label position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Centroid {
    pub lon: f64,
    pub lat: f64,
}

impl From<[f64; 2]> for Centroid {
    fn from(v: [f64; 2]) -> Self {
        Centroid { lon: v[0], lat: v[1] }
    }
}

impl From<Centroid> for [f64; 2] {
    fn from(c: Centroid) -> Self {
        [c.lon, c.lat]
    }
}

/// An administrative unit with its canonical boundary.
///
/// `parent_id` is a weak reference: it is resolved through the region store,
/// never followed as an in-memory link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    /// Store identifier; empty until the store assigns one
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub region_type: RegionType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    /// Repaired and simplified boundary
    pub geometry: MultiPolygon<f64>,

    /// Extent of the raw input coordinates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Centroid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Feature properties not mapped onto a dedicated field
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_year: Option<i32>,

    #[serde(default)]
    pub verified: bool,
}

impl Region {
    pub fn new(name: impl Into<String>, region_type: RegionType, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            region_type,
            code: None,
            state: None,
            district: None,
            geometry,
            bbox: None,
            centroid: None,
            parent_id: None,
            meta: serde_json::Map::new(),
            created_at: None,
            source: None,
            source_year: None,
            verified: false,
        }
    }

    /// Area estimate used to rank overlapping candidates.
    ///
    /// Regions without a bbox get `f64::MAX` so they sort after every region that has one.
    pub fn approx_area(&self) -> f64 {
        self.bbox.map(|b| b.approx_area()).unwrap_or(f64::MAX)
    }

    /// Point-in-polygon test where the boundary counts as inside
    pub fn covers(&self, point: &Point<f64>) -> bool {
        self.geometry.intersects(point)
    }

    pub fn reference(&self) -> RegionRef {
        RegionRef {
            id: self.id.clone(),
            name: self.name.clone(),
            region_type: self.region_type,
        }
    }
}

/// Lightweight handle to a stored region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub region_type: RegionType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_type_parse() {
        assert_eq!("Ward".parse::<RegionType>().unwrap(), RegionType::Ward);
        assert_eq!(" pc ".parse::<RegionType>().unwrap(), RegionType::Pc);
        assert_eq!(
            "county".parse::<RegionType>(),
            Err(IngestError::UnknownRegionType("county".to_string()))
        );
    }

    #[test]
    fn test_precedence_order() {
        let names: Vec<&str> = RegionType::precedence().iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["ward", "ac", "pc", "district", "state"]);
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let bbox = BBox::new(77.1, 12.1, 77.2, 12.2);
        let json = serde_json::to_value(bbox).unwrap();
        assert_eq!(json, serde_json::json!([77.1, 12.1, 77.2, 12.2]));
        let back: BBox = serde_json::from_value(json).unwrap();
        assert_eq!(back, bbox);
    }

    #[test]
    fn test_missing_bbox_sorts_last() {
        let mut with_bbox = Region::new("a", RegionType::Ward, MultiPolygon::new(vec![]));
        with_bbox.bbox = Some(BBox::new(0.0, 0.0, 1000.0, 1000.0));
        let without = Region::new("b", RegionType::Ward, MultiPolygon::new(vec![]));
        assert!(with_bbox.approx_area() < without.approx_area());
    }
}
