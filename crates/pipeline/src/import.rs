//! The batch importer: upserts classified placemarks into the asset tables.
//!
//! Identity resolves by external `code` property first, then by the
//! prepared (possibly disambiguated) name. Uniqueness checks run against a
//! snapshot of stored names **plus** an in-batch seen-name set, so rows
//! created earlier in the same still-uncommitted transaction collide here
//! rather than in storage.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sqlx::PgConnection;

use fiberplant_core::classify::AssetKind;
use fiberplant_core::geo::{line_length_m, polygon_centroid};
use fiberplant_core::naming::{disambiguate, is_generic_name, segment_name, unique_name};
use fiberplant_core::placemark::{GeometryKind, Placemark};
use fiberplant_core::types::DbId;

use fiberplant_db::models::plant::{NewFiberSegment, NewPointAsset, NewServiceBuilding};
use fiberplant_db::repositories::PlantRepo;

use crate::error::ImportError;

/// Per-kind upsert outcome counts for one import run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportCounts {
    pub created: u32,
    pub updated: u32,
    pub skipped: u32,
}

/// Fallback base name for placemarks imported into a forced bucket with no
/// name of their own. All of these are generic, so they pick up the rounded
/// position suffix.
fn default_name(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::FdhCabinet => "cabinet",
        AssetKind::SpliceClosure => "closure",
        AssetKind::FiberSegment => "route",
        AssetKind::AccessPoint => "access point",
        AssetKind::OltDevice => "site",
        AssetKind::ServiceBuilding => "building",
    }
}

/// Imports classified placemark buckets against one shared transaction.
pub struct BatchImporter {
    upsert: bool,
    segment_type: String,
    cable_type: Option<String>,
    /// Names taken per kind: stored names plus same-batch additions.
    seen_names: HashMap<AssetKind, HashSet<String>>,
}

impl BatchImporter {
    pub fn new(upsert: bool, segment_type: String, cable_type: Option<String>) -> Self {
        Self {
            upsert,
            segment_type,
            cable_type,
            seen_names: HashMap::new(),
        }
    }

    /// Upsert one classified bucket. All statements run on `conn`, which
    /// the caller keeps inside the run-wide transaction.
    pub async fn import_bucket(
        &mut self,
        conn: &mut PgConnection,
        kind: AssetKind,
        placemarks: &[Placemark],
    ) -> Result<ImportCounts, ImportError> {
        let mut counts = ImportCounts::default();
        if placemarks.is_empty() {
            return Ok(counts);
        }

        // Seed the taken-name set from storage once per kind; same-batch
        // creations keep extending it.
        if !self.seen_names.contains_key(&kind) {
            let stored = PlantRepo::active_names(conn, kind).await?;
            self.seen_names.insert(kind, stored.into_iter().collect());
        }

        for placemark in placemarks {
            if placemark.coords.is_empty() {
                continue;
            }
            match kind {
                AssetKind::FiberSegment => {
                    self.upsert_segment(conn, placemark, &mut counts).await?;
                }
                AssetKind::ServiceBuilding => {
                    self.upsert_building(conn, placemark, &mut counts).await?;
                }
                _ => {
                    self.upsert_point(conn, kind, placemark, &mut counts)
                        .await?;
                }
            }
        }

        tracing::debug!(
            kind = %kind,
            created = counts.created,
            updated = counts.updated,
            skipped = counts.skipped,
            "bucket imported"
        );
        Ok(counts)
    }

    // -----------------------------------------------------------------------
    // Per-shape upserts
    // -----------------------------------------------------------------------

    async fn upsert_point(
        &mut self,
        conn: &mut PgConnection,
        kind: AssetKind,
        placemark: &Placemark,
        counts: &mut ImportCounts,
    ) -> Result<(), ImportError> {
        let (lat, lon) = representative_position(placemark);
        let prepared = self.prepare_name(kind, placemark, lat, lon);
        let code = external_code(placemark);

        match self.resolve(conn, kind, code.as_deref(), &prepared).await? {
            Resolution::Skip => counts.skipped += 1,
            Resolution::Update { id, name } => {
                let input = NewPointAsset {
                    name,
                    code,
                    latitude: Some(lat),
                    longitude: Some(lon),
                    notes: notes_json(placemark)?,
                };
                PlantRepo::update_point(conn, kind, id, &input).await?;
                counts.updated += 1;
            }
            Resolution::Create { name } => {
                let input = NewPointAsset {
                    name,
                    code,
                    latitude: Some(lat),
                    longitude: Some(lon),
                    notes: notes_json(placemark)?,
                };
                PlantRepo::insert_point(conn, kind, &input).await?;
                counts.created += 1;
            }
        }
        Ok(())
    }

    async fn upsert_segment(
        &mut self,
        conn: &mut PgConnection,
        placemark: &Placemark,
        counts: &mut ImportCounts,
    ) -> Result<(), ImportError> {
        let kind = AssetKind::FiberSegment;
        let (lat, lon) = representative_position(placemark);
        let prepared = self.prepare_name(kind, placemark, lat, lon);
        let code = external_code(placemark);

        let path = serde_json::to_value(
            placemark
                .coords
                .iter()
                .map(|(x, y)| vec![*x, *y])
                .collect::<Vec<_>>(),
        )
        .map_err(|e| ImportError::Internal(e.to_string()))?;

        match self.resolve(conn, kind, code.as_deref(), &prepared).await? {
            Resolution::Skip => counts.skipped += 1,
            Resolution::Update { id, name } => {
                let input = NewFiberSegment {
                    name,
                    code,
                    segment_type: self.segment_type.clone(),
                    cable_type: self.cable_type.clone(),
                    length_m: line_length_m(&placemark.coords),
                    path,
                    latitude: Some(lat),
                    longitude: Some(lon),
                    notes: notes_json(placemark)?,
                };
                PlantRepo::update_segment(conn, id, &input).await?;
                counts.updated += 1;
            }
            Resolution::Create { name } => {
                let input = NewFiberSegment {
                    name,
                    code,
                    segment_type: self.segment_type.clone(),
                    cable_type: self.cable_type.clone(),
                    length_m: line_length_m(&placemark.coords),
                    path,
                    latitude: Some(lat),
                    longitude: Some(lon),
                    notes: notes_json(placemark)?,
                };
                PlantRepo::insert_segment(conn, &input).await?;
                counts.created += 1;
            }
        }
        Ok(())
    }

    async fn upsert_building(
        &mut self,
        conn: &mut PgConnection,
        placemark: &Placemark,
        counts: &mut ImportCounts,
    ) -> Result<(), ImportError> {
        let kind = AssetKind::ServiceBuilding;
        let (lat, lon) = representative_position(placemark);
        let prepared = self.prepare_name(kind, placemark, lat, lon);
        let code = external_code(placemark);

        let footprint = if placemark.geometry == GeometryKind::Polygon {
            Some(
                serde_json::to_value(
                    placemark
                        .coords
                        .iter()
                        .map(|(x, y)| vec![*x, *y])
                        .collect::<Vec<_>>(),
                )
                .map_err(|e| ImportError::Internal(e.to_string()))?,
            )
        } else {
            None
        };

        match self.resolve(conn, kind, code.as_deref(), &prepared).await? {
            Resolution::Skip => counts.skipped += 1,
            Resolution::Update { id, name } => {
                let input = NewServiceBuilding {
                    name,
                    code,
                    latitude: Some(lat),
                    longitude: Some(lon),
                    footprint,
                    notes: notes_json(placemark)?,
                };
                PlantRepo::update_building(conn, id, &input).await?;
                counts.updated += 1;
            }
            Resolution::Create { name } => {
                let input = NewServiceBuilding {
                    name,
                    code,
                    latitude: Some(lat),
                    longitude: Some(lon),
                    footprint,
                    notes: notes_json(placemark)?,
                };
                PlantRepo::insert_building(conn, &input).await?;
                counts.created += 1;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Naming and identity
    // -----------------------------------------------------------------------

    /// Disambiguate a generic name. Generic segment names are replaced
    /// wholesale by a synthesized start/end name; generic point names get
    /// the rounded position appended.
    fn prepare_name(
        &self,
        kind: AssetKind,
        placemark: &Placemark,
        lat: f64,
        lon: f64,
    ) -> String {
        let raw = placemark.name.trim();
        let base = if raw.is_empty() {
            default_name(kind)
        } else {
            raw
        };

        if kind == AssetKind::FiberSegment {
            if is_generic_name(kind, base) {
                // coords is non-empty; both ends exist.
                if let (Some(start), Some(end)) = (placemark.start(), placemark.end()) {
                    return segment_name(start, end);
                }
            }
            return base.to_string();
        }

        if is_generic_name(kind, base) {
            disambiguate(base, lat, lon)
        } else {
            base.to_string()
        }
    }

    /// Resolve a placemark against storage: code first, then name.
    async fn resolve(
        &mut self,
        conn: &mut PgConnection,
        kind: AssetKind,
        code: Option<&str>,
        prepared: &str,
    ) -> Result<Resolution, ImportError> {
        let taken = self.seen_names.entry(kind).or_default();

        let matched: Option<(DbId, String)> = match code {
            Some(code) => PlantRepo::find_by_code(conn, kind, code).await?,
            None => PlantRepo::find_id_by_name(conn, kind, prepared)
                .await?
                .map(|id| (id, prepared.to_string())),
        };

        match matched {
            Some(_) if !self.upsert => Ok(Resolution::Skip),
            Some((id, current_name)) => {
                // Keep the row's current name when the prepared one is
                // identical; otherwise the rename must not collide with
                // anything but the row itself.
                let name = if current_name == prepared {
                    current_name
                } else {
                    taken.remove(&current_name);
                    unique_name(prepared, |n| taken.contains(n))
                };
                taken.insert(name.clone());
                Ok(Resolution::Update { id, name })
            }
            None => {
                let name = unique_name(prepared, |n| taken.contains(n));
                taken.insert(name.clone());
                Ok(Resolution::Create { name })
            }
        }
    }
}

/// How one placemark resolves against existing rows.
enum Resolution {
    Skip,
    Update { id: DbId, name: String },
    Create { name: String },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Representative `(lat, lon)` for a placemark: centroid for polygons,
/// first coordinate otherwise.
fn representative_position(placemark: &Placemark) -> (f64, f64) {
    let (lon, lat) = match placemark.geometry {
        GeometryKind::Polygon => {
            polygon_centroid(&placemark.coords).unwrap_or((0.0, 0.0))
        }
        _ => placemark.start().unwrap_or((0.0, 0.0)),
    };
    (lat, lon)
}

/// Non-empty external `code` property, if the survey carried one.
fn external_code(placemark: &Placemark) -> Option<String> {
    placemark
        .properties
        .get("code")
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(String::from)
}

/// Serialize the original survey properties for the notes column.
fn notes_json(placemark: &Placemark) -> Result<serde_json::Value, ImportError> {
    serde_json::to_value(&placemark.properties).map_err(|e| ImportError::Internal(e.to_string()))
}
