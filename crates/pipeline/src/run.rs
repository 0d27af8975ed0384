//! Import run orchestration.
//!
//! One run is a single-flight, sequential job: read every source archive,
//! geo-filter, deduplicate run-wide, classify, then import bucket by
//! bucket inside one transaction. Nothing is committed until the very end,
//! so killing the process mid-run is safe, and a dry run simply rolls the
//! transaction back.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use sqlx::PgPool;

use fiberplant_core::classify::{classify, AssetKind, Classification};
use fiberplant_core::dedupe::identity_key;
use fiberplant_core::geo::{in_region, BoundingBox};
use fiberplant_core::placemark::Placemark;

use fiberplant_db::repositories::PlantRepo;

use crate::error::ImportError;
use crate::import::{BatchImporter, ImportCounts};
use crate::kmz::read_placemarks;

/// One input file for a run. A `kind` of `None` marks a merged export whose
/// placemarks go through the classifier; a concrete kind buckets the file's
/// placemarks directly (the operator has already asserted their type).
#[derive(Debug, Clone)]
pub struct ImportSource {
    pub kind: Option<AssetKind>,
    pub path: PathBuf,
}

/// Options for one import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub sources: Vec<ImportSource>,
    /// Segment type applied to every segment row created or updated.
    pub segment_type: String,
    pub cable_type: Option<String>,
    /// Parse and report, but roll back instead of committing.
    pub dry_run: bool,
    /// Allow overwriting rows that match by code or name.
    pub upsert: bool,
    /// Delete all existing plant rows (children first) before importing.
    pub purge: bool,
    /// Cap each classified bucket at this many placemarks.
    pub limit: Option<usize>,
    /// Keep only placemarks starting inside this bound.
    pub region: Option<BoundingBox>,
}

/// Outcome of one import run.
#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    /// Per-kind created/updated/skipped counts.
    pub counts: BTreeMap<AssetKind, ImportCounts>,
    /// Placemarks the classifier decided were survey noise.
    pub classifier_skipped: u32,
    /// Placemarks dropped for missing or unparseable geometry.
    pub discarded: u32,
    /// Placemarks outside the configured region.
    pub out_of_region: u32,
    /// Placemarks collapsed by identity deduplication.
    pub duplicates: u32,
}

/// Execute one import run. Fails before any write on archive or XML
/// format errors; commits everything together at the end (or nothing, on
/// dry run).
pub async fn run_import(pool: &PgPool, opts: &ImportOptions) -> Result<ImportReport, ImportError> {
    let mut report = ImportReport::default();

    // Read and parse every source up front: a format error in any file
    // aborts the run before the transaction even opens.
    let mut staged: Vec<(Option<AssetKind>, Placemark)> = Vec::new();
    for source in &opts.sources {
        let doc = read_placemarks(&source.path)?;
        report.discarded += doc.discarded;
        tracing::info!(
            path = %source.path.display(),
            placemarks = doc.placemarks.len(),
            "parsed source"
        );
        staged.extend(doc.placemarks.into_iter().map(|p| (source.kind, p)));
    }

    // Geographic filter, then run-wide dedup (first occurrence wins),
    // then classification into per-kind buckets.
    if let Some(bbox) = &opts.region {
        let before = staged.len();
        staged.retain(|(_, p)| in_region(&p.coords, bbox));
        report.out_of_region = (before - staged.len()) as u32;
    }

    let mut seen = HashSet::new();
    let before = staged.len();
    staged.retain(|(_, p)| match identity_key(p) {
        Some(key) => seen.insert(key),
        None => false,
    });
    report.duplicates = (before - staged.len()) as u32;

    let mut buckets: BTreeMap<AssetKind, Vec<Placemark>> = BTreeMap::new();
    for (forced, placemark) in staged {
        let kind = match forced {
            Some(kind) => kind,
            None => match classify(&placemark.name, placemark.geometry) {
                Classification::Asset(kind) => kind,
                Classification::Skip => {
                    report.classifier_skipped += 1;
                    continue;
                }
            },
        };
        buckets.entry(kind).or_default().push(placemark);
    }

    if let Some(limit) = opts.limit {
        for bucket in buckets.values_mut() {
            bucket.truncate(limit);
        }
    }

    // Every write below rides this one transaction.
    let mut tx = pool.begin().await?;

    if opts.purge {
        tracing::warn!("purging all existing plant rows before import");
        PlantRepo::purge_plant(&mut tx).await?;
    }

    let mut importer = BatchImporter::new(
        opts.upsert,
        opts.segment_type.clone(),
        opts.cable_type.clone(),
    );
    for (kind, bucket) in &buckets {
        let counts = importer.import_bucket(&mut tx, *kind, bucket).await?;
        report.counts.insert(*kind, counts);
    }

    if opts.dry_run {
        tx.rollback().await?;
        tracing::info!("dry run: transaction rolled back, nothing persisted");
    } else {
        tx.commit().await?;
    }

    Ok(report)
}
