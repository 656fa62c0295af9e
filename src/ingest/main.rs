//! GeoJSON boundary ingest.
//!
//! Reads a FeatureCollection, repairs and simplifies every boundary, and
//! writes the regions into a JSON store snapshot.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use regionpip::import::{feature_values, ImportOptions, ImportReport, RegionImporter};
use regionpip::config::MAX_COORDINATE_PRECISION;
use regionpip::{Config, MemoryRegionStore, RegionStore, RegionType};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Import administrative boundaries from GeoJSON")]
struct Args {
    /// GeoJSON FeatureCollection to import
    #[arg(short, long)]
    file: PathBuf,

    /// Region store snapshot, created if missing
    #[arg(long, default_value = "regions.json")]
    store: PathBuf,

    /// Dataset label; a four-digit value is also recorded as the source year
    #[arg(long)]
    source: Option<String>,

    /// Tier for features without a `type` property
    #[arg(long = "type", default_value = "district")]
    region_type: RegionType,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the simplification tolerance (decimal degrees)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Round input coordinates to this many decimals (at most 15)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_COORDINATE_PRECISION as i64))]
    precision: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(tolerance) = args.tolerance {
        config.ingest.simplify_tolerance = tolerance;
    }
    if args.precision.is_some() {
        config.ingest.coordinate_precision = args.precision;
    }
    config.validate()?;

    info!("Region ingest");
    info!("File: {}", args.file.display());
    info!(
        "Simplify tolerance: {}, default type: {}",
        config.ingest.simplify_tolerance, args.region_type
    );

    let mut store = if args.store.exists() {
        MemoryRegionStore::load_from_file(&args.store)
            .with_context(|| format!("Failed to load store {}", args.store.display()))?
    } else {
        info!("Starting a new store at {}", args.store.display());
        MemoryRegionStore::new()
    };

    let content = fs::read_to_string(&args.file).context("Failed to read GeoJSON file")?;
    let root: serde_json::Value =
        serde_json::from_str(&content).context("Failed to parse GeoJSON file")?;
    let features = feature_values(&root).context("Invalid GeoJSON FeatureCollection")?;

    let options = ImportOptions {
        source: args.source.clone(),
        default_type: args.region_type,
    };
    let importer = RegionImporter::new(&options, &config.ingest);

    // Create progress bar
    let pb = ProgressBar::new(features.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut report = ImportReport::default();
    for (index, feature) in features.into_iter().enumerate() {
        report.record(index, importer.import_feature(feature, &mut store));
        pb.inc(1);
    }
    pb.finish_with_message("Import complete");

    store
        .save_to_file(&args.store)
        .with_context(|| format!("Failed to write store {}", args.store.display()))?;

    info!(
        "Imported {} features ({} skipped, {} polygon entries dropped); store now holds {} regions",
        report.imported,
        report.skipped.len(),
        report.skipped_entries,
        store.len()
    );

    println!("imported: {}", report.imported);
    println!("skipped: {}", report.skipped.len());
    for skipped in &report.skipped {
        println!("  [{}] {}", skipped.index, skipped.reason);
    }

    Ok(())
}
