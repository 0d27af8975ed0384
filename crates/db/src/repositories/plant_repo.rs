//! Repository for the six network asset tables.
//!
//! Methods take `&mut PgConnection` rather than a pool so the importer can
//! run an entire batch — lookups included — inside one transaction and the
//! uniqueness it checks holds at commit time.

use sqlx::PgConnection;

use fiberplant_core::classify::AssetKind;
use fiberplant_core::types::DbId;

use crate::models::plant::{
    table_for, FiberSegment, NewFiberSegment, NewPointAsset, NewServiceBuilding, PointAsset,
    ServiceBuilding,
};

/// Column list for point-shaped asset queries.
const POINT_COLUMNS: &str = "\
    id, name, code, latitude, longitude, notes, \
    is_active, created_at, updated_at";

/// Column list for `fiber_segments` queries.
const SEGMENT_COLUMNS: &str = "\
    id, name, code, segment_type, cable_type, length_m, path, \
    latitude, longitude, notes, is_active, created_at, updated_at";

/// Column list for `service_buildings` queries.
const BUILDING_COLUMNS: &str = "\
    id, name, code, latitude, longitude, footprint, notes, \
    is_active, created_at, updated_at";

/// Purge order: children before parents so foreign keys never dangle.
const PURGE_ORDER: &[&str] = &[
    "drop_lines",
    "olt_ports",
    "splitters",
    "splice_trays",
    "fiber_strands",
    "fiber_segments",
    "access_points",
    "olt_devices",
    "splice_closures",
    "fdh_cabinets",
    "service_buildings",
];

/// Provides lookup, upsert, and purge operations for plant assets.
pub struct PlantRepo;

impl PlantRepo {
    // -----------------------------------------------------------------------
    // Identity lookups (active rows only)
    // -----------------------------------------------------------------------

    /// Find an active row of `kind` by its external code, returning its id
    /// and current name.
    pub async fn find_by_code(
        conn: &mut PgConnection,
        kind: AssetKind,
        code: &str,
    ) -> Result<Option<(DbId, String)>, sqlx::Error> {
        let query = format!(
            "SELECT id, name FROM {} WHERE code = $1 AND is_active",
            table_for(kind)
        );
        sqlx::query_as(&query)
            .bind(code)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find an active row of `kind` by name.
    pub async fn find_id_by_name(
        conn: &mut PgConnection,
        kind: AssetKind,
        name: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let query = format!(
            "SELECT id FROM {} WHERE name = $1 AND is_active ORDER BY id LIMIT 1",
            table_for(kind)
        );
        let row: Option<(DbId,)> = sqlx::query_as(&query)
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// All names currently held by active rows of `kind`.
    ///
    /// The importer snapshots these once per bucket so uniqueness checks
    /// stay synchronous against its in-batch seen-name set.
    pub async fn active_names(
        conn: &mut PgConnection,
        kind: AssetKind,
    ) -> Result<Vec<String>, sqlx::Error> {
        let query = format!("SELECT name FROM {} WHERE is_active", table_for(kind));
        let rows: Vec<(String,)> = sqlx::query_as(&query).fetch_all(&mut *conn).await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Count active rows of `kind`.
    pub async fn count_active(
        conn: &mut PgConnection,
        kind: AssetKind,
    ) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM {} WHERE is_active", table_for(kind));
        let count: (i64,) = sqlx::query_as(&query).fetch_one(&mut *conn).await?;
        Ok(count.0)
    }

    // -----------------------------------------------------------------------
    // Point-shaped assets (cabinets, closures, access points, OLT devices)
    // -----------------------------------------------------------------------

    /// Find a point-shaped asset row by id, active or not.
    pub async fn find_point_by_id(
        conn: &mut PgConnection,
        kind: AssetKind,
        id: DbId,
    ) -> Result<Option<PointAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {POINT_COLUMNS} FROM {} WHERE id = $1",
            table_for(kind)
        );
        sqlx::query_as::<_, PointAsset>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Insert a new point-shaped asset row, returning its id.
    pub async fn insert_point(
        conn: &mut PgConnection,
        kind: AssetKind,
        input: &NewPointAsset,
    ) -> Result<DbId, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (name, code, latitude, longitude, notes) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
            table_for(kind)
        );
        let row: (DbId,) = sqlx::query_as(&query)
            .bind(&input.name)
            .bind(input.code.as_deref())
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.notes)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.0)
    }

    /// Overwrite the mutable fields of an existing point-shaped asset row.
    pub async fn update_point(
        conn: &mut PgConnection,
        kind: AssetKind,
        id: DbId,
        input: &NewPointAsset,
    ) -> Result<(), sqlx::Error> {
        let query = format!(
            "UPDATE {} SET \
                name = $2, code = $3, latitude = $4, longitude = $5, \
                notes = $6, updated_at = NOW() \
             WHERE id = $1",
            table_for(kind)
        );
        sqlx::query(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.code.as_deref())
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.notes)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Fiber segments
    // -----------------------------------------------------------------------

    /// Find a fiber segment row by id, active or not.
    pub async fn find_segment_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<FiberSegment>, sqlx::Error> {
        let query = format!("SELECT {SEGMENT_COLUMNS} FROM fiber_segments WHERE id = $1");
        sqlx::query_as::<_, FiberSegment>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Insert a new fiber segment row, returning its id.
    pub async fn insert_segment(
        conn: &mut PgConnection,
        input: &NewFiberSegment,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO fiber_segments \
                (name, code, segment_type, cable_type, length_m, path, \
                 latitude, longitude, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(&input.name)
        .bind(input.code.as_deref())
        .bind(&input.segment_type)
        .bind(input.cable_type.as_deref())
        .bind(input.length_m)
        .bind(&input.path)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.notes)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.0)
    }

    /// Overwrite the mutable fields of an existing fiber segment row.
    pub async fn update_segment(
        conn: &mut PgConnection,
        id: DbId,
        input: &NewFiberSegment,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE fiber_segments SET \
                name = $2, code = $3, segment_type = $4, cable_type = $5, \
                length_m = $6, path = $7, latitude = $8, longitude = $9, \
                notes = $10, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.code.as_deref())
        .bind(&input.segment_type)
        .bind(input.cable_type.as_deref())
        .bind(input.length_m)
        .bind(&input.path)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.notes)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Service buildings
    // -----------------------------------------------------------------------

    /// Find a service building row by id, active or not.
    pub async fn find_building_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ServiceBuilding>, sqlx::Error> {
        let query = format!("SELECT {BUILDING_COLUMNS} FROM service_buildings WHERE id = $1");
        sqlx::query_as::<_, ServiceBuilding>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Insert a new service building row, returning its id.
    pub async fn insert_building(
        conn: &mut PgConnection,
        input: &NewServiceBuilding,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO service_buildings \
                (name, code, latitude, longitude, footprint, notes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&input.name)
        .bind(input.code.as_deref())
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.footprint.as_ref())
        .bind(&input.notes)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.0)
    }

    /// Overwrite the mutable fields of an existing service building row.
    pub async fn update_building(
        conn: &mut PgConnection,
        id: DbId,
        input: &NewServiceBuilding,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE service_buildings SET \
                name = $2, code = $3, latitude = $4, longitude = $5, \
                footprint = $6, notes = $7, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.code.as_deref())
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.footprint.as_ref())
        .bind(&input.notes)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Purge
    // -----------------------------------------------------------------------

    /// Delete every plant row, children before parents. Merge logs are
    /// retained — they have no foreign keys and must outlive their subjects.
    pub async fn purge_plant(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        for table in PURGE_ORDER {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }
}
