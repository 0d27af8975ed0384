//! Network asset entity models and importer DTOs.
//!
//! The four point-shaped tables (cabinets, closures, access points, OLT
//! devices) share one row struct; segments and buildings carry extra
//! columns and get their own.

use fiberplant_core::classify::AssetKind;
use fiberplant_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Table name for an asset kind.
pub fn table_for(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::FdhCabinet => "fdh_cabinets",
        AssetKind::SpliceClosure => "splice_closures",
        AssetKind::FiberSegment => "fiber_segments",
        AssetKind::AccessPoint => "access_points",
        AssetKind::OltDevice => "olt_devices",
        AssetKind::ServiceBuilding => "service_buildings",
    }
}

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// A row from one of the point-shaped asset tables (`fdh_cabinets`,
/// `splice_closures`, `access_points`, `olt_devices`).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PointAsset {
    pub id: DbId,
    pub name: String,
    pub code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `fiber_segments` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FiberSegment {
    pub id: DbId,
    pub name: String,
    pub code: Option<String>,
    pub segment_type: String,
    pub cable_type: Option<String>,
    pub length_m: f64,
    /// Ordered `[lon, lat]` pairs of the routed path.
    pub path: serde_json::Value,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `service_buildings` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ServiceBuilding {
    pub id: DbId,
    pub name: String,
    pub code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Outer-ring `[lon, lat]` pairs when imported from a polygon.
    pub footprint: Option<serde_json::Value>,
    pub notes: serde_json::Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// DTOs (importer payloads)
// ---------------------------------------------------------------------------

/// DTO for inserting or overwriting a point-shaped asset row.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPointAsset {
    pub name: String,
    pub code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: serde_json::Value,
}

/// DTO for inserting or overwriting a fiber segment row.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFiberSegment {
    pub name: String,
    pub code: Option<String>,
    pub segment_type: String,
    pub cable_type: Option<String>,
    pub length_m: f64,
    pub path: serde_json::Value,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: serde_json::Value,
}

/// DTO for inserting or overwriting a service building row.
#[derive(Debug, Clone, Deserialize)]
pub struct NewServiceBuilding {
    pub name: String,
    pub code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub footprint: Option<serde_json::Value>,
    pub notes: serde_json::Value,
}
