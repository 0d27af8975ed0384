//! Repository for the child tables (splitters, trays, strands, ports,
//! drop lines). Child rows are created by the admin surface, not by the
//! importer; the merge engine migrates them wholesale by foreign key.

use sqlx::PgConnection;

use fiberplant_core::types::DbId;

use crate::models::children::{DropLine, FiberStrand, OltPort, SpliceTray, Splitter};

/// Column list for `splitters` queries.
const SPLITTER_COLUMNS: &str = "id, fdh_cabinet_id, name, port_count, created_at, updated_at";

/// Column list for `fiber_strands` queries.
const STRAND_COLUMNS: &str = "\
    id, fiber_segment_id, strand_no, upstream_id, downstream_id, \
    created_at, updated_at";

/// Provides create and lookup operations for asset children.
pub struct ChildrenRepo;

impl ChildrenRepo {
    /// Insert a splitter into an FDH cabinet.
    pub async fn create_splitter(
        conn: &mut PgConnection,
        fdh_cabinet_id: DbId,
        name: &str,
        port_count: i32,
    ) -> Result<Splitter, sqlx::Error> {
        let query = format!(
            "INSERT INTO splitters (fdh_cabinet_id, name, port_count) \
             VALUES ($1, $2, $3) \
             RETURNING {SPLITTER_COLUMNS}"
        );
        sqlx::query_as::<_, Splitter>(&query)
            .bind(fdh_cabinet_id)
            .bind(name)
            .bind(port_count)
            .fetch_one(&mut *conn)
            .await
    }

    /// List splitters owned by a cabinet, by name.
    pub async fn splitters_by_cabinet(
        conn: &mut PgConnection,
        fdh_cabinet_id: DbId,
    ) -> Result<Vec<Splitter>, sqlx::Error> {
        let query = format!(
            "SELECT {SPLITTER_COLUMNS} FROM splitters \
             WHERE fdh_cabinet_id = $1 ORDER BY name"
        );
        sqlx::query_as::<_, Splitter>(&query)
            .bind(fdh_cabinet_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Insert a splice tray into a closure.
    pub async fn create_splice_tray(
        conn: &mut PgConnection,
        splice_closure_id: DbId,
        tray_no: i32,
        capacity: i32,
    ) -> Result<SpliceTray, sqlx::Error> {
        sqlx::query_as::<_, SpliceTray>(
            "INSERT INTO splice_trays (splice_closure_id, tray_no, capacity) \
             VALUES ($1, $2, $3) \
             RETURNING id, splice_closure_id, tray_no, capacity, created_at, updated_at",
        )
        .bind(splice_closure_id)
        .bind(tray_no)
        .bind(capacity)
        .fetch_one(&mut *conn)
        .await
    }

    /// Insert a strand into a segment, optionally terminated on assets.
    pub async fn create_strand(
        conn: &mut PgConnection,
        fiber_segment_id: DbId,
        strand_no: i32,
        upstream_id: Option<DbId>,
        downstream_id: Option<DbId>,
    ) -> Result<FiberStrand, sqlx::Error> {
        let query = format!(
            "INSERT INTO fiber_strands \
                (fiber_segment_id, strand_no, upstream_id, downstream_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {STRAND_COLUMNS}"
        );
        sqlx::query_as::<_, FiberStrand>(&query)
            .bind(fiber_segment_id)
            .bind(strand_no)
            .bind(upstream_id)
            .bind(downstream_id)
            .fetch_one(&mut *conn)
            .await
    }

    /// List strands owned by a segment, by strand number.
    pub async fn strands_by_segment(
        conn: &mut PgConnection,
        fiber_segment_id: DbId,
    ) -> Result<Vec<FiberStrand>, sqlx::Error> {
        let query = format!(
            "SELECT {STRAND_COLUMNS} FROM fiber_strands \
             WHERE fiber_segment_id = $1 ORDER BY strand_no"
        );
        sqlx::query_as::<_, FiberStrand>(&query)
            .bind(fiber_segment_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// List strands terminated on an asset, upstream or downstream.
    pub async fn strands_terminating_on(
        conn: &mut PgConnection,
        asset_id: DbId,
    ) -> Result<Vec<FiberStrand>, sqlx::Error> {
        let query = format!(
            "SELECT {STRAND_COLUMNS} FROM fiber_strands \
             WHERE upstream_id = $1 OR downstream_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, FiberStrand>(&query)
            .bind(asset_id)
            .fetch_all(&mut *conn)
            .await
    }

    /// Insert an OLT port.
    pub async fn create_olt_port(
        conn: &mut PgConnection,
        olt_device_id: DbId,
        port_no: i32,
    ) -> Result<OltPort, sqlx::Error> {
        sqlx::query_as::<_, OltPort>(
            "INSERT INTO olt_ports (olt_device_id, port_no) \
             VALUES ($1, $2) \
             RETURNING id, olt_device_id, port_no, created_at, updated_at",
        )
        .bind(olt_device_id)
        .bind(port_no)
        .fetch_one(&mut *conn)
        .await
    }

    /// Insert a drop line from an access point to a building.
    pub async fn create_drop_line(
        conn: &mut PgConnection,
        access_point_id: DbId,
        service_building_id: Option<DbId>,
        length_m: f64,
    ) -> Result<DropLine, sqlx::Error> {
        sqlx::query_as::<_, DropLine>(
            "INSERT INTO drop_lines (access_point_id, service_building_id, length_m) \
             VALUES ($1, $2, $3) \
             RETURNING id, access_point_id, service_building_id, length_m, \
                       created_at, updated_at",
        )
        .bind(access_point_id)
        .bind(service_building_id)
        .bind(length_m)
        .fetch_one(&mut *conn)
        .await
    }
}
