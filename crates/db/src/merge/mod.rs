//! The asset merge engine.
//!
//! Consolidates two duplicate persisted assets of the same kind into one:
//! resolves chosen fields from the source onto the target, migrates every
//! registered child relation and polymorphic reference, soft-deletes the
//! source, and appends one merge log row — all inside a single transaction.
//! Any failure at any step rolls back everything; there is no partial
//! result and no undo path.

pub mod fields;
pub mod registry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use fiberplant_core::classify::AssetKind;
use fiberplant_core::types::DbId;

use crate::models::merge_log::CreateMergeLog;
use crate::models::plant::{FiberSegment, PointAsset, ServiceBuilding};
use crate::repositories::MergeLogRepo;

pub use fields::{FieldCopier, MergeRow};
pub use registry::{ChildRelation, MergeRegistry, MergeSpec, PolymorphicRef};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Rejected before any mutation: unknown kind or field, source equals
    /// target, or a row is missing or already inactive.
    #[error("Merge validation failed: {0}")]
    Validation(String),

    /// A child-relation migration hit a uniqueness constraint. The whole
    /// operation is rolled back.
    #[error("Merge conflict migrating relation '{relation}': {message}")]
    Conflict { relation: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Request / result shapes
// ---------------------------------------------------------------------------

/// Which side supplies a field's value on the merged row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldChoice {
    Source,
    /// Keep the target's existing value (same as omitting the field).
    Target,
}

/// Outcome of a committed merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeResult {
    pub merge_log_id: DbId,
    pub target_id: DbId,
    /// Relation name -> migrated row count.
    pub children_migrated: BTreeMap<String, i64>,
}

/// Read-only preview of an asset used to construct a merge request.
#[derive(Debug, Clone, Serialize)]
pub struct AssetDetails {
    pub kind: AssetKind,
    /// Every column of the row, as JSON.
    pub fields: serde_json::Value,
    /// Relation name -> referencing row count.
    pub child_counts: BTreeMap<String, i64>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Merge `source_id` into `target_id`, consolidating every reference.
///
/// The target keeps its id; the source is soft-deleted and never
/// reactivated. On success exactly one merge log row exists for the
/// operation; on any error the database is untouched.
pub async fn merge(
    pool: &PgPool,
    registry: &MergeRegistry,
    kind: AssetKind,
    source_id: DbId,
    target_id: DbId,
    field_choices: &BTreeMap<String, FieldChoice>,
    merged_by: DbId,
) -> Result<MergeResult, MergeError> {
    let spec = registry
        .spec(kind)
        .ok_or_else(|| MergeError::Validation(format!("asset kind '{kind}' is not mergeable")))?;

    if source_id == target_id {
        return Err(MergeError::Validation(
            "source and target must be different assets".to_string(),
        ));
    }
    for field in field_choices.keys() {
        if !spec.fields.contains(&field.as_str()) {
            return Err(MergeError::Validation(format!(
                "field '{field}' is not mergeable for kind '{kind}'"
            )));
        }
    }

    let mut tx = pool.begin().await?;
    let result = match kind {
        AssetKind::FiberSegment => {
            merge_rows::<FiberSegment>(&mut tx, spec, source_id, target_id, field_choices, merged_by)
                .await?
        }
        AssetKind::ServiceBuilding => {
            merge_rows::<ServiceBuilding>(
                &mut tx,
                spec,
                source_id,
                target_id,
                field_choices,
                merged_by,
            )
            .await?
        }
        _ => {
            merge_rows::<PointAsset>(&mut tx, spec, source_id, target_id, field_choices, merged_by)
                .await?
        }
    };
    tx.commit().await?;

    tracing::info!(
        kind = %kind,
        source_id,
        target_id,
        merge_log_id = result.merge_log_id,
        "merged asset"
    );
    Ok(result)
}

/// Fetch an asset's columns and per-relation reference counts.
pub async fn get_asset_details(
    pool: &PgPool,
    registry: &MergeRegistry,
    kind: AssetKind,
    id: DbId,
) -> Result<AssetDetails, MergeError> {
    let spec = registry
        .spec(kind)
        .ok_or_else(|| MergeError::Validation(format!("asset kind '{kind}' is not mergeable")))?;

    let mut conn = pool.acquire().await?;
    let fields = match kind {
        AssetKind::FiberSegment => load_fields::<FiberSegment>(&mut conn, spec, id).await?,
        AssetKind::ServiceBuilding => load_fields::<ServiceBuilding>(&mut conn, spec, id).await?,
        _ => load_fields::<PointAsset>(&mut conn, spec, id).await?,
    };

    let mut child_counts = BTreeMap::new();
    for child in spec.children {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            child.table, child.fk_column
        );
        let count: (i64,) = sqlx::query_as(&query)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        child_counts.insert(child.relation.to_string(), count.0);
    }
    for poly in spec.polymorphic {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            poly.table, poly.column
        );
        let count: (i64,) = sqlx::query_as(&query)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        child_counts.insert(poly.relation(), count.0);
    }

    Ok(AssetDetails {
        kind,
        fields,
        child_counts,
    })
}

// ---------------------------------------------------------------------------
// Typed internals
// ---------------------------------------------------------------------------

async fn load_fields<R: MergeRow>(
    conn: &mut PgConnection,
    spec: &MergeSpec,
    id: DbId,
) -> Result<serde_json::Value, MergeError> {
    let query = format!(
        "SELECT {} FROM {} WHERE id = $1",
        R::SELECT_COLUMNS,
        spec.table
    );
    let row: R = sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| MergeError::Validation(format!("{} {id} not found", spec.table)))?;
    serde_json::to_value(&row).map_err(|e| MergeError::Internal(e.to_string()))
}

async fn merge_rows<R: MergeRow + 'static>(
    conn: &mut PgConnection,
    spec: &MergeSpec,
    source_id: DbId,
    target_id: DbId,
    field_choices: &BTreeMap<String, FieldChoice>,
    merged_by: DbId,
) -> Result<MergeResult, MergeError> {
    // Lock both rows in one statement. ANY($1) acquires the locks in index
    // order, so two concurrent merges of the same pair serialize instead
    // of deadlocking.
    let select = format!(
        "SELECT {} FROM {} WHERE id = ANY($1) FOR UPDATE",
        R::SELECT_COLUMNS,
        spec.table
    );
    let rows: Vec<R> = sqlx::query_as(&select)
        .bind(vec![source_id, target_id])
        .fetch_all(&mut *conn)
        .await?;

    let source = find_active(&rows, source_id, "source", spec)?;
    let mut target = find_active(&rows, target_id, "target", spec)?;

    // Full column snapshot of the source before anything changes.
    let snapshot =
        serde_json::to_value(&source).map_err(|e| MergeError::Internal(e.to_string()))?;

    // Resolve chosen fields from the source onto the in-memory target.
    for (field, choice) in field_choices {
        if *choice != FieldChoice::Source {
            continue;
        }
        let copier = R::copiers()
            .iter()
            .find(|c| c.name == field.as_str())
            .ok_or_else(|| {
                MergeError::Validation(format!("field '{field}' has no accessor"))
            })?;
        (copier.apply)(&source, &mut target);
    }

    // Re-point owned children. A unique violation here means source and
    // target own identically keyed children; the operator must resolve
    // that before merging.
    let mut migrated: BTreeMap<String, i64> = BTreeMap::new();
    for child in spec.children {
        let update = format!(
            "UPDATE {} SET {} = $1, updated_at = NOW() WHERE {} = $2",
            child.table, child.fk_column, child.fk_column
        );
        let done = sqlx::query(&update)
            .bind(target_id)
            .bind(source_id)
            .execute(&mut *conn)
            .await;
        match done {
            Ok(done) => {
                migrated.insert(child.relation.to_string(), done.rows_affected() as i64);
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(MergeError::Conflict {
                    relation: child.relation.to_string(),
                    message: db.message().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Re-point polymorphic references. No unique constraints exist on
    // these columns, so they cannot conflict.
    for poly in spec.polymorphic {
        let update = format!(
            "UPDATE {} SET {} = $1, updated_at = NOW() WHERE {} = $2",
            poly.table, poly.column, poly.column
        );
        let done = sqlx::query(&update)
            .bind(target_id)
            .bind(source_id)
            .execute(&mut *conn)
            .await?;
        migrated.insert(poly.relation(), done.rows_affected() as i64);
    }

    // Deactivate the source before persisting the target: a code resolved
    // from the source would otherwise trip the partial unique index while
    // both rows are still active.
    let deactivate = format!(
        "UPDATE {} SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        spec.table
    );
    sqlx::query(&deactivate)
        .bind(source_id)
        .execute(&mut *conn)
        .await?;

    let update_sql = R::update_sql(spec.table);
    target
        .bind_update(sqlx::query(&update_sql))
        .execute(&mut *conn)
        .await?;

    let log = MergeLogRepo::insert(
        conn,
        &CreateMergeLog {
            asset_kind: spec.kind.as_str().to_string(),
            source_asset_id: source_id,
            target_asset_id: target_id,
            merged_by,
            source_snapshot: snapshot,
            field_choices: serde_json::to_value(field_choices)
                .map_err(|e| MergeError::Internal(e.to_string()))?,
            children_migrated: serde_json::to_value(&migrated)
                .map_err(|e| MergeError::Internal(e.to_string()))?,
        },
    )
    .await?;

    Ok(MergeResult {
        merge_log_id: log.id,
        target_id,
        children_migrated: migrated,
    })
}

fn find_active<R: MergeRow>(
    rows: &[R],
    id: DbId,
    role: &str,
    spec: &MergeSpec,
) -> Result<R, MergeError> {
    let row = rows
        .iter()
        .find(|r| r.id() == id)
        .ok_or_else(|| MergeError::Validation(format!("{role} {} {id} not found", spec.table)))?;
    if !row.is_active() {
        return Err(MergeError::Validation(format!(
            "{role} {} {id} is inactive (already merged away)",
            spec.table
        )));
    }
    Ok(row.clone())
}
