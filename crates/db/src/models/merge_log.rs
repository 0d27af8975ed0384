//! Merge audit trail models.
//!
//! Merge logs are append-only and immutable once written (no `updated_at`).
//! A log row exists if and only if a merge fully committed.

use fiberplant_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single merge log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MergeLog {
    pub id: DbId,
    pub asset_kind: String,
    pub source_asset_id: DbId,
    pub target_asset_id: DbId,
    pub merged_by: DbId,
    /// Every column of the source row at merge time.
    pub source_snapshot: serde_json::Value,
    /// The field-choice map the caller supplied.
    pub field_choices: serde_json::Value,
    /// Child relation name -> migrated row count.
    pub children_migrated: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for inserting a merge log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMergeLog {
    pub asset_kind: String,
    pub source_asset_id: DbId,
    pub target_asset_id: DbId,
    pub merged_by: DbId,
    pub source_snapshot: serde_json::Value,
    pub field_choices: serde_json::Value,
    pub children_migrated: serde_json::Value,
}
