//! Operator CLI for KMZ/KML import runs.
//!
//! Accepts either per-kind survey exports or a single merged export that
//! goes through the heuristic classifier, and reports per-kind
//! created/updated/skipped counts when the run finishes.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fiberplant_core::classify::AssetKind;
use fiberplant_core::geo::BoundingBox;
use fiberplant_pipeline::{run_import, ImportOptions, ImportReport, ImportSource};

#[derive(Debug, Parser)]
#[command(
    name = "fiberplant-import",
    about = "Import KMZ/KML survey exports into the fiber-plant inventory"
)]
struct Args {
    /// KMZ/KML file of FDH cabinet placemarks.
    #[arg(long, value_name = "FILE")]
    cabinets: Option<PathBuf>,

    /// KMZ/KML file of splice closure placemarks.
    #[arg(long, value_name = "FILE")]
    closures: Option<PathBuf>,

    /// KMZ/KML file of fiber segment placemarks.
    #[arg(long, value_name = "FILE")]
    segments: Option<PathBuf>,

    /// KMZ/KML file of access point placemarks.
    #[arg(long, value_name = "FILE")]
    access_points: Option<PathBuf>,

    /// KMZ/KML file of OLT device placemarks.
    #[arg(long, value_name = "FILE")]
    olt_devices: Option<PathBuf>,

    /// KMZ/KML file of service building placemarks.
    #[arg(long, value_name = "FILE")]
    buildings: Option<PathBuf>,

    /// A single merged export; placemarks are classified heuristically.
    #[arg(long, value_name = "FILE")]
    merged: Option<PathBuf>,

    /// Segment type applied to every imported segment row.
    #[arg(long, default_value = "distribution")]
    segment_type: String,

    /// Cable type applied to every imported segment row.
    #[arg(long)]
    cable_type: Option<String>,

    /// Parse and report, but commit nothing.
    #[arg(long)]
    dry_run: bool,

    /// Overwrite rows that match by code or name.
    #[arg(long)]
    upsert: bool,

    /// Delete all existing plant rows (children first) before importing.
    #[arg(long)]
    purge: bool,

    /// Cap each classified bucket at N placemarks.
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Keep only placemarks starting inside min_lat,min_lon,max_lat,max_lon.
    #[arg(long, value_name = "BOUNDS", value_parser = parse_region)]
    region: Option<BoundingBox>,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

impl Args {
    fn sources(&self) -> Vec<ImportSource> {
        let typed = [
            (AssetKind::FdhCabinet, &self.cabinets),
            (AssetKind::SpliceClosure, &self.closures),
            (AssetKind::FiberSegment, &self.segments),
            (AssetKind::AccessPoint, &self.access_points),
            (AssetKind::OltDevice, &self.olt_devices),
            (AssetKind::ServiceBuilding, &self.buildings),
        ];
        let mut sources: Vec<ImportSource> = typed
            .into_iter()
            .filter_map(|(kind, path)| {
                path.as_ref().map(|p| ImportSource {
                    kind: Some(kind),
                    path: p.clone(),
                })
            })
            .collect();
        if let Some(path) = &self.merged {
            sources.push(ImportSource {
                kind: None,
                path: path.clone(),
            });
        }
        sources
    }
}

/// Parse `min_lat,min_lon,max_lat,max_lon` into a bounding box.
fn parse_region(s: &str) -> Result<BoundingBox, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("bad region value: {e}"))?;
    let [min_lat, min_lon, max_lat, max_lon] = parts[..] else {
        return Err("region needs exactly min_lat,min_lon,max_lat,max_lon".to_string());
    };
    BoundingBox::new(min_lat, min_lon, max_lat, max_lon).map_err(|e| e.to_string())
}

fn print_report(report: &ImportReport, dry_run: bool) {
    println!(
        "{:<18} {:>8} {:>8} {:>8}",
        "asset kind", "created", "updated", "skipped"
    );
    for (kind, counts) in &report.counts {
        println!(
            "{:<18} {:>8} {:>8} {:>8}",
            kind.to_string(),
            counts.created,
            counts.updated,
            counts.skipped
        );
    }
    println!("classifier skipped : {}", report.classifier_skipped);
    println!("duplicates dropped : {}", report.duplicates);
    println!("geometry discarded : {}", report.discarded);
    if report.out_of_region > 0 {
        println!("outside region     : {}", report.out_of_region);
    }
    if dry_run {
        println!("dry run — nothing was committed");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fiberplant=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let sources = args.sources();
    if sources.is_empty() {
        anyhow::bail!("no input files; pass --merged or at least one per-kind file");
    }

    let pool = fiberplant_db::create_pool(&args.database_url).await?;
    tracing::info!(files = sources.len(), dry_run = args.dry_run, "starting import run");

    let opts = ImportOptions {
        sources,
        segment_type: args.segment_type.clone(),
        cable_type: args.cable_type.clone(),
        dry_run: args.dry_run,
        upsert: args.upsert,
        purge: args.purge,
        limit: args.limit,
        region: args.region,
    };
    let report = run_import(&pool, &opts).await?;
    print_report(&report, args.dry_run);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_parses_four_bounds() {
        let bbox = parse_region("8.0, 6.0, 10.0, 8.0").unwrap();
        assert_eq!(bbox.min_lat, 8.0);
        assert_eq!(bbox.min_lon, 6.0);
        assert_eq!(bbox.max_lat, 10.0);
        assert_eq!(bbox.max_lon, 8.0);
    }

    #[test]
    fn region_rejects_wrong_arity_and_order() {
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("10.0,6.0,8.0,8.0").is_err(), "min_lat above max_lat");
        assert!(parse_region("a,b,c,d").is_err());
    }

    #[test]
    fn sources_collects_typed_then_merged() {
        let args = Args::parse_from([
            "fiberplant-import",
            "--cabinets",
            "cab.kmz",
            "--merged",
            "all.kmz",
            "--database-url",
            "postgres://unused/db",
        ]);
        let sources = args.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].kind, Some(AssetKind::FdhCabinet));
        assert_eq!(sources[1].kind, None);
    }
}
