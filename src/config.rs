use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::geometry::DEFAULT_SIMPLIFY_TOLERANCE;

/// Decimals beyond this exceed f64 resolution and overflow the rounding factor
pub const MAX_COORDINATE_PRECISION: u32 = 15;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub resolve: ResolveConfig,
}

/// Geometry settings handed to the ingestion entry point.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Douglas-Peucker tolerance in decimal degrees
    pub simplify_tolerance: f64,
    /// Round wire coordinates to this many decimals before ring construction
    pub coordinate_precision: Option<u32>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: DEFAULT_SIMPLIFY_TOLERANCE,
            coordinate_precision: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ResolveConfig {
    /// Upper bound on parent hops per ancestor climb
    pub max_ancestor_depth: usize,
    /// Default tolerance for display simplification
    pub display_tolerance: f64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: 16,
            display_tolerance: 0.001,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(precision) = self.ingest.coordinate_precision {
            anyhow::ensure!(
                precision <= MAX_COORDINATE_PRECISION,
                "ingest.coordinate_precision must be at most {}, got {}",
                MAX_COORDINATE_PRECISION,
                precision
            );
        }
        Ok(())
    }
}
