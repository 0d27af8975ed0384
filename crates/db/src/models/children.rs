//! Child entity models: equipment and links owned by the asset rows.

use fiberplant_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `splitters` table, owned by an FDH cabinet.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Splitter {
    pub id: DbId,
    pub fdh_cabinet_id: DbId,
    pub name: String,
    pub port_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `splice_trays` table, owned by a splice closure.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SpliceTray {
    pub id: DbId,
    pub splice_closure_id: DbId,
    pub tray_no: i32,
    pub capacity: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `fiber_strands` table, owned by a fiber segment.
///
/// `upstream_id` and `downstream_id` are bare asset identifiers with no
/// foreign key — a strand may terminate on a cabinet, closure, OLT device,
/// or access point.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FiberStrand {
    pub id: DbId,
    pub fiber_segment_id: DbId,
    pub strand_no: i32,
    pub upstream_id: Option<DbId>,
    pub downstream_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `olt_ports` table, owned by an OLT device.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OltPort {
    pub id: DbId,
    pub olt_device_id: DbId,
    pub port_no: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `drop_lines` table, owned by an access point.
///
/// `service_building_id` is a nullable bare identifier (no foreign key)
/// linking the drop to the premises it serves.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DropLine {
    pub id: DbId,
    pub access_point_id: DbId,
    pub service_building_id: Option<DbId>,
    pub length_m: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
