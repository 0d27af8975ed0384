//! Typed field access for merge-eligible columns.
//!
//! Field copying during a merge is driven by per-row-type accessor tables
//! (`FieldCopier`) instead of runtime reflection: a field name the table
//! does not list simply cannot be copied, and adding a column without
//! deciding its merge behaviour fails here first.

use serde::Serialize;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{FromRow, Postgres};

use fiberplant_core::types::DbId;

use crate::models::plant::{FiberSegment, PointAsset, ServiceBuilding};

/// A named, typed copy operation from a source row onto a target row.
pub struct FieldCopier<R> {
    pub name: &'static str,
    pub apply: fn(&R, &mut R),
}

/// A row type the merge engine can operate on.
pub trait MergeRow:
    Sized + Clone + Serialize + Send + Unpin + for<'r> FromRow<'r, PgRow>
{
    /// SELECT column list matching `FromRow`.
    const SELECT_COLUMNS: &'static str;

    fn id(&self) -> DbId;
    fn is_active(&self) -> bool;

    /// The accessor table for this row type.
    fn copiers() -> &'static [FieldCopier<Self>];

    /// UPDATE statement persisting every merge-eligible column; `$1` is
    /// the row id.
    fn update_sql(table: &str) -> String;

    /// Bind the id and every merge-eligible column, in `update_sql` order.
    fn bind_update<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments>;
}

// ---------------------------------------------------------------------------
// Point-shaped assets
// ---------------------------------------------------------------------------

const POINT_COPIERS: &[FieldCopier<PointAsset>] = &[
    FieldCopier {
        name: "name",
        apply: |s, t| t.name = s.name.clone(),
    },
    FieldCopier {
        name: "code",
        apply: |s, t| t.code = s.code.clone(),
    },
    FieldCopier {
        name: "latitude",
        apply: |s, t| t.latitude = s.latitude,
    },
    FieldCopier {
        name: "longitude",
        apply: |s, t| t.longitude = s.longitude,
    },
    FieldCopier {
        name: "notes",
        apply: |s, t| t.notes = s.notes.clone(),
    },
];

impl MergeRow for PointAsset {
    const SELECT_COLUMNS: &'static str = "\
        id, name, code, latitude, longitude, notes, \
        is_active, created_at, updated_at";

    fn id(&self) -> DbId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn copiers() -> &'static [FieldCopier<Self>] {
        POINT_COPIERS
    }

    fn update_sql(table: &str) -> String {
        format!(
            "UPDATE {table} SET \
                name = $2, code = $3, latitude = $4, longitude = $5, \
                notes = $6, updated_at = NOW() \
             WHERE id = $1"
        )
    }

    fn bind_update<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.id)
            .bind(&self.name)
            .bind(self.code.as_deref())
            .bind(self.latitude)
            .bind(self.longitude)
            .bind(&self.notes)
    }
}

// ---------------------------------------------------------------------------
// Fiber segments
// ---------------------------------------------------------------------------

const SEGMENT_COPIERS: &[FieldCopier<FiberSegment>] = &[
    FieldCopier {
        name: "name",
        apply: |s, t| t.name = s.name.clone(),
    },
    FieldCopier {
        name: "code",
        apply: |s, t| t.code = s.code.clone(),
    },
    FieldCopier {
        name: "segment_type",
        apply: |s, t| t.segment_type = s.segment_type.clone(),
    },
    FieldCopier {
        name: "cable_type",
        apply: |s, t| t.cable_type = s.cable_type.clone(),
    },
    FieldCopier {
        name: "length_m",
        apply: |s, t| t.length_m = s.length_m,
    },
    FieldCopier {
        name: "path",
        apply: |s, t| t.path = s.path.clone(),
    },
    FieldCopier {
        name: "latitude",
        apply: |s, t| t.latitude = s.latitude,
    },
    FieldCopier {
        name: "longitude",
        apply: |s, t| t.longitude = s.longitude,
    },
    FieldCopier {
        name: "notes",
        apply: |s, t| t.notes = s.notes.clone(),
    },
];

impl MergeRow for FiberSegment {
    const SELECT_COLUMNS: &'static str = "\
        id, name, code, segment_type, cable_type, length_m, path, \
        latitude, longitude, notes, is_active, created_at, updated_at";

    fn id(&self) -> DbId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn copiers() -> &'static [FieldCopier<Self>] {
        SEGMENT_COPIERS
    }

    fn update_sql(table: &str) -> String {
        format!(
            "UPDATE {table} SET \
                name = $2, code = $3, segment_type = $4, cable_type = $5, \
                length_m = $6, path = $7, latitude = $8, longitude = $9, \
                notes = $10, updated_at = NOW() \
             WHERE id = $1"
        )
    }

    fn bind_update<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.id)
            .bind(&self.name)
            .bind(self.code.as_deref())
            .bind(&self.segment_type)
            .bind(self.cable_type.as_deref())
            .bind(self.length_m)
            .bind(&self.path)
            .bind(self.latitude)
            .bind(self.longitude)
            .bind(&self.notes)
    }
}

// ---------------------------------------------------------------------------
// Service buildings
// ---------------------------------------------------------------------------

const BUILDING_COPIERS: &[FieldCopier<ServiceBuilding>] = &[
    FieldCopier {
        name: "name",
        apply: |s, t| t.name = s.name.clone(),
    },
    FieldCopier {
        name: "code",
        apply: |s, t| t.code = s.code.clone(),
    },
    FieldCopier {
        name: "latitude",
        apply: |s, t| t.latitude = s.latitude,
    },
    FieldCopier {
        name: "longitude",
        apply: |s, t| t.longitude = s.longitude,
    },
    FieldCopier {
        name: "footprint",
        apply: |s, t| t.footprint = s.footprint.clone(),
    },
    FieldCopier {
        name: "notes",
        apply: |s, t| t.notes = s.notes.clone(),
    },
];

impl MergeRow for ServiceBuilding {
    const SELECT_COLUMNS: &'static str = "\
        id, name, code, latitude, longitude, footprint, notes, \
        is_active, created_at, updated_at";

    fn id(&self) -> DbId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn copiers() -> &'static [FieldCopier<Self>] {
        BUILDING_COPIERS
    }

    fn update_sql(table: &str) -> String {
        format!(
            "UPDATE {table} SET \
                name = $2, code = $3, latitude = $4, longitude = $5, \
                footprint = $6, notes = $7, updated_at = NOW() \
             WHERE id = $1"
        )
    }

    fn bind_update<'q>(
        &'q self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        query
            .bind(self.id)
            .bind(&self.name)
            .bind(self.code.as_deref())
            .bind(self.latitude)
            .bind(self.longitude)
            .bind(self.footprint.as_ref())
            .bind(&self.notes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
