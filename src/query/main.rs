//! Region lookups against a store snapshot.
//!
//! Resolves a point to its covering regions and administrative hierarchy,
//! searches regions by name, or renders one region's boundary as GeoJSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use regionpip::geometry::{simplify_for_display, to_wire};
use regionpip::{
    Config, ContainmentResolver, HierarchyResolver, MemoryRegionStore, Region, RegionHierarchy,
    RegionStore, RegionType,
};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Point-to-region lookups")]
struct Args {
    /// Region store snapshot written by `ingest`
    #[arg(long, default_value = "regions.json")]
    store: PathBuf,

    /// Latitude of the query point
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the query point
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Only list covering regions of this tier
    #[arg(long = "type")]
    region_type: Option<RegionType>,

    /// Render the boundary of the region with this id
    #[arg(long, conflicts_with_all = ["lat", "search"])]
    render: Option<String>,

    /// Display simplification tolerance for --render
    #[arg(long)]
    tolerance: Option<f64>,

    /// Search regions by name
    #[arg(long, conflicts_with = "lat")]
    search: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct Candidate {
    id: String,
    name: String,
    #[serde(rename = "type")]
    region_type: RegionType,
    approx_area: Option<f64>,
}

impl From<&Region> for Candidate {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id.clone(),
            name: region.name.clone(),
            region_type: region.region_type,
            approx_area: region.bbox.map(|b| b.approx_area()),
        }
    }
}

#[derive(Serialize)]
struct PointResponse {
    lat: f64,
    lon: f64,
    containing: Vec<Candidate>,
    hierarchy: RegionHierarchy,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    let store = MemoryRegionStore::load_from_file(&args.store)
        .with_context(|| format!("Failed to load store {}", args.store.display()))?;
    info!("Loaded {} regions", store.len());

    let output = if let Some(id) = &args.render {
        let tolerance = args.tolerance.unwrap_or(config.resolve.display_tolerance);
        render(&store, id, tolerance)?
    } else if let Some(query) = &args.search {
        let matches: Vec<Candidate> = store
            .search_by_name(query)
            .iter()
            .map(|r| Candidate::from(r.as_ref()))
            .collect();
        serde_json::to_value(matches)?
    } else if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        serde_json::to_value(resolve_point(&store, &config, lat, lon, args.region_type))?
    } else {
        anyhow::bail!("Nothing to do: pass --lat/--lon, --search or --render");
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn resolve_point(
    store: &MemoryRegionStore,
    config: &Config,
    lat: f64,
    lon: f64,
    region_type: Option<RegionType>,
) -> PointResponse {
    let containing = ContainmentResolver::new(store)
        .resolve_containing(lon, lat, region_type)
        .iter()
        .map(|r| Candidate::from(r.as_ref()))
        .collect();
    let hierarchy = HierarchyResolver::new(store, &config.resolve).resolve_hierarchy(lon, lat);

    PointResponse {
        lat,
        lon,
        containing,
        hierarchy,
    }
}

/// One region as a GeoJSON Feature with a display-simplified geometry
fn render(store: &MemoryRegionStore, id: &str, tolerance: f64) -> Result<serde_json::Value> {
    let region = store
        .find_by_id(id)
        .with_context(|| format!("No region with id {}", id))?;

    let stored = serde_json::to_value(to_wire(&region.geometry))?;
    let geometry = simplify_for_display(&stored, tolerance);
    debug!("Rendered {} at tolerance {}", region.name, tolerance);

    Ok(json!({
        "type": "Feature",
        "id": region.id,
        "properties": {
            "name": region.name,
            "type": region.region_type,
            "state": region.state,
            "code": region.code,
            "parentId": region.parent_id,
            "bbox": region.bbox,
            "centroid": region.centroid,
        },
        "geometry": geometry,
    }))
}
