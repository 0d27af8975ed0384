//! Repository for the `merge_logs` table.
//!
//! Insert and read only — the table is append-only and rows are never
//! updated or deleted.

use sqlx::PgConnection;

use fiberplant_core::types::DbId;

use crate::models::merge_log::{CreateMergeLog, MergeLog};

/// Column list for `merge_logs` queries.
const COLUMNS: &str = "\
    id, asset_kind, source_asset_id, target_asset_id, merged_by, \
    source_snapshot, field_choices, children_migrated, created_at";

/// Provides append and query operations for merge logs.
pub struct MergeLogRepo;

impl MergeLogRepo {
    /// Append a merge log entry, returning the created row.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &CreateMergeLog,
    ) -> Result<MergeLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO merge_logs \
                (asset_kind, source_asset_id, target_asset_id, merged_by, \
                 source_snapshot, field_choices, children_migrated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MergeLog>(&query)
            .bind(&input.asset_kind)
            .bind(input.source_asset_id)
            .bind(input.target_asset_id)
            .bind(input.merged_by)
            .bind(&input.source_snapshot)
            .bind(&input.field_choices)
            .bind(&input.children_migrated)
            .fetch_one(&mut *conn)
            .await
    }

    /// Find a merge log entry by id.
    pub async fn find_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<MergeLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM merge_logs WHERE id = $1");
        sqlx::query_as::<_, MergeLog>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List merges where the given asset was source or target, newest first.
    pub async fn list_by_asset(
        conn: &mut PgConnection,
        asset_kind: &str,
        asset_id: DbId,
    ) -> Result<Vec<MergeLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM merge_logs \
             WHERE asset_kind = $1 \
               AND (source_asset_id = $2 OR target_asset_id = $2) \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, MergeLog>(&query)
            .bind(asset_kind)
            .bind(asset_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Count all merge log rows.
    pub async fn count(conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM merge_logs")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count.0)
    }
}
