//! End-to-end import pipeline tests against a real database.
//!
//! Each test writes a KMZ archive to a temp path, runs a full import, and
//! asserts on the persisted rows and the returned report.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use sqlx::PgPool;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use fiberplant_core::classify::AssetKind;
use fiberplant_core::geo::BoundingBox;
use fiberplant_db::repositories::PlantRepo;
use fiberplant_pipeline::{run_import, ImportOptions, ImportSource};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pm_point(name: &str, lon: f64, lat: f64) -> String {
    format!(
        "<Placemark><name>{name}</name>\
         <Point><coordinates>{lon},{lat},0</coordinates></Point></Placemark>"
    )
}

fn pm_point_with_code(name: &str, code: &str, lon: f64, lat: f64) -> String {
    format!(
        "<Placemark><name>{name}</name>\
         <ExtendedData><Data name=\"code\"><value>{code}</value></Data></ExtendedData>\
         <Point><coordinates>{lon},{lat},0</coordinates></Point></Placemark>"
    )
}

fn pm_line(name: &str, coords: &[(f64, f64)]) -> String {
    let text = coords
        .iter()
        .map(|(lon, lat)| format!("{lon},{lat},0"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<Placemark><name>{name}</name>\
         <LineString><coordinates>{text}</coordinates></LineString></Placemark>"
    )
}

fn pm_polygon(name: &str, ring: &[(f64, f64)]) -> String {
    let text = ring
        .iter()
        .map(|(lon, lat)| format!("{lon},{lat},0"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "<Placemark><name>{name}</name>\
         <Polygon><outerBoundaryIs><LinearRing>\
         <coordinates>{text}</coordinates>\
         </LinearRing></outerBoundaryIs></Polygon></Placemark>"
    )
}

fn wrap_kml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document>{body}</Document></kml>"
    )
}

fn write_kmz(tag: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("fiberplant_import_{tag}.kmz"));
    let file = File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);
    writer
        .start_file("doc.kml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(wrap_kml(body).as_bytes()).unwrap();
    writer.finish().unwrap();
    path
}

fn merged_options(path: PathBuf) -> ImportOptions {
    ImportOptions {
        sources: vec![ImportSource { kind: None, path }],
        segment_type: "distribution".to_string(),
        cable_type: Some("24-core".to_string()),
        dry_run: false,
        upsert: false,
        purge: false,
        limit: None,
        region: None,
    }
}

async fn active_count(pool: &PgPool, kind: AssetKind) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    PlantRepo::count_active(&mut conn, kind).await.unwrap()
}

// ---------------------------------------------------------------------------
// Test: a merged export classifies into every bucket
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_merged_import_classifies_and_persists(pool: PgPool) {
    let body = [
        pm_point("FDH Cabinet 3", 7.49, 9.05),
        pm_point("Joint Closure JC-4", 7.48, 9.04),
        pm_point("FAT-1", 7.47, 9.03),
        pm_point("OLT Site", 7.46, 9.02),
        pm_polygon(
            "Plot 9",
            &[(7.0, 9.0), (7.001, 9.0), (7.001, 9.001), (7.0, 9.001), (7.0, 9.0)],
        ),
        pm_line("Path Measure", &[(7.49, 9.05), (7.50, 9.06)]),
        pm_point("Untitled Placemark", 7.40, 9.00),
    ]
    .join("");
    let path = write_kmz("classifies", &body);

    let report = run_import(&pool, &merged_options(path.clone()))
        .await
        .unwrap();
    std::fs::remove_file(&path).ok();

    for kind in [
        AssetKind::FdhCabinet,
        AssetKind::SpliceClosure,
        AssetKind::AccessPoint,
        AssetKind::OltDevice,
        AssetKind::ServiceBuilding,
        AssetKind::FiberSegment,
    ] {
        assert_eq!(
            report.counts.get(&kind).map(|c| c.created),
            Some(1),
            "one {kind} row expected"
        );
        assert_eq!(active_count(&pool, kind).await, 1);
    }
    assert_eq!(report.classifier_skipped, 1);
    assert_eq!(report.duplicates, 0);

    // The generic trace name was replaced by a synthesized one and the
    // run-level segment type applied.
    let mut conn = pool.acquire().await.unwrap();
    let segment_id = PlantRepo::find_id_by_name(
        &mut conn,
        AssetKind::FiberSegment,
        "Segment 9.05000,7.49000 - 9.06000,7.50000",
    )
    .await
    .unwrap()
    .expect("synthesized segment name");
    let segment = PlantRepo::find_segment_by_id(&mut conn, segment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(segment.segment_type, "distribution");
    assert_eq!(segment.cable_type.as_deref(), Some("24-core"));
    assert!(segment.length_m > 1000.0, "got {}", segment.length_m);
}

// ---------------------------------------------------------------------------
// Test: dedup collapses within rounding, disambiguation separates names
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_dedup_and_generic_name_disambiguation(pool: PgPool) {
    // Two cabinets inside the same 5-decimal bucket collapse; the third,
    // elsewhere, survives with a distinct disambiguated name.
    let body = [
        pm_point("Cabinet", 7.100001, 9.0),
        pm_point("Cabinet", 7.100004, 9.0),
        pm_point("Cabinet", 7.5, 9.0),
    ]
    .join("");
    let path = write_kmz("dedup", &body);

    let report = run_import(&pool, &merged_options(path.clone()))
        .await
        .unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(report.duplicates, 1);
    assert_eq!(
        report.counts.get(&AssetKind::FdhCabinet).map(|c| c.created),
        Some(2)
    );

    let mut conn = pool.acquire().await.unwrap();
    let mut names = PlantRepo::active_names(&mut conn, AssetKind::FdhCabinet)
        .await
        .unwrap();
    names.sort();
    assert_eq!(
        names,
        vec![
            "Cabinet (9.00000, 7.10000)".to_string(),
            "Cabinet (9.00000, 7.50000)".to_string(),
        ]
    );
}

// ---------------------------------------------------------------------------
// Test: re-import is an upsert, not duplicate creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_reimport_with_upsert_updates_in_place(pool: PgPool) {
    let body = [
        pm_point("FDH Cabinet 3", 7.49, 9.05),
        pm_line("Feeder A", &[(7.49, 9.05), (7.50, 9.06)]),
    ]
    .join("");
    let path = write_kmz("reimport", &body);

    let first = run_import(&pool, &merged_options(path.clone()))
        .await
        .unwrap();
    assert_eq!(
        first.counts.get(&AssetKind::FdhCabinet).map(|c| c.created),
        Some(1)
    );

    // Without upsert the placemarks match existing rows and are skipped.
    let skipped = run_import(&pool, &merged_options(path.clone()))
        .await
        .unwrap();
    assert_eq!(
        skipped.counts.get(&AssetKind::FdhCabinet).map(|c| c.skipped),
        Some(1)
    );

    // With upsert they update in place; row counts stay flat.
    let mut opts = merged_options(path.clone());
    opts.upsert = true;
    let second = run_import(&pool, &opts).await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        second.counts.get(&AssetKind::FdhCabinet).map(|c| c.updated),
        Some(1)
    );
    assert_eq!(
        second
            .counts
            .get(&AssetKind::FiberSegment)
            .map(|c| c.updated),
        Some(1)
    );
    assert_eq!(active_count(&pool, AssetKind::FdhCabinet).await, 1);
    assert_eq!(active_count(&pool, AssetKind::FiberSegment).await, 1);
}

// ---------------------------------------------------------------------------
// Test: identity resolves by external code before name
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_code_identity_wins_over_name(pool: PgPool) {
    let path = write_kmz(
        "code_v1",
        &pm_point_with_code("Cabinet Old Name", "CAB-77", 7.49, 9.05),
    );
    run_import(&pool, &merged_options(path.clone())).await.unwrap();
    std::fs::remove_file(&path).ok();

    // Same code, new name: the row is renamed, not duplicated.
    let path = write_kmz(
        "code_v2",
        &pm_point_with_code("Cabinet New Name", "CAB-77", 7.49, 9.05),
    );
    let mut opts = merged_options(path.clone());
    opts.upsert = true;
    let report = run_import(&pool, &opts).await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        report.counts.get(&AssetKind::FdhCabinet).map(|c| c.updated),
        Some(1)
    );
    assert_eq!(active_count(&pool, AssetKind::FdhCabinet).await, 1);

    let mut conn = pool.acquire().await.unwrap();
    let id = PlantRepo::find_by_code(&mut conn, AssetKind::FdhCabinet, "CAB-77")
        .await
        .unwrap()
        .map(|(id, _)| id)
        .unwrap();
    let row = PlantRepo::find_point_by_id(&mut conn, AssetKind::FdhCabinet, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.name, "Cabinet New Name");
}

// ---------------------------------------------------------------------------
// Test: dry run parses and reports but persists nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_dry_run_persists_nothing(pool: PgPool) {
    let path = write_kmz("dry_run", &pm_point("FDH Cabinet 3", 7.49, 9.05));
    let mut opts = merged_options(path.clone());
    opts.dry_run = true;

    let report = run_import(&pool, &opts).await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        report.counts.get(&AssetKind::FdhCabinet).map(|c| c.created),
        Some(1),
        "dry run still reports what would happen"
    );
    assert_eq!(active_count(&pool, AssetKind::FdhCabinet).await, 0);
}

// ---------------------------------------------------------------------------
// Test: purge clears old plant, typed sources bypass the classifier
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_purge_and_typed_source(pool: PgPool) {
    let path = write_kmz("purge_seed", &pm_point("FDH Cabinet 3", 7.49, 9.05));
    run_import(&pool, &merged_options(path.clone())).await.unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(active_count(&pool, AssetKind::FdhCabinet).await, 1);

    // A typed closures file: the name would classify as a building under
    // the heuristics, but the operator asserted the kind.
    let path = write_kmz("purge_typed", &pm_point("Mrs. Okafor corner", 7.40, 9.01));
    let mut opts = merged_options(path.clone());
    opts.sources = vec![ImportSource {
        kind: Some(AssetKind::SpliceClosure),
        path: path.clone(),
    }];
    opts.purge = true;
    let report = run_import(&pool, &opts).await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        report.counts.get(&AssetKind::SpliceClosure).map(|c| c.created),
        Some(1)
    );
    assert_eq!(active_count(&pool, AssetKind::FdhCabinet).await, 0, "purged");
    assert_eq!(active_count(&pool, AssetKind::SpliceClosure).await, 1);
}

// ---------------------------------------------------------------------------
// Test: region filter and per-bucket limit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_region_filter_and_bucket_limit(pool: PgPool) {
    let body = [
        pm_point("FDH Cabinet 1", 7.10, 9.00),
        pm_point("FDH Cabinet 2", 7.20, 9.10),
        pm_point("FDH Cabinet 3", 7.30, 9.20),
        pm_point("FDH Cabinet far away", 50.0, 50.0),
    ]
    .join("");
    let path = write_kmz("region", &body);

    let mut opts = merged_options(path.clone());
    opts.region = Some(BoundingBox {
        min_lat: 8.0,
        max_lat: 10.0,
        min_lon: 6.0,
        max_lon: 8.0,
    });
    opts.limit = Some(2);
    let report = run_import(&pool, &opts).await.unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(report.out_of_region, 1);
    assert_eq!(
        report.counts.get(&AssetKind::FdhCabinet).map(|c| c.created),
        Some(2),
        "bucket capped at the limit"
    );
    assert_eq!(active_count(&pool, AssetKind::FdhCabinet).await, 2);
}
