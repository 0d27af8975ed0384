//! The mergeable-asset registry.
//!
//! One `MergeSpec` per asset kind: its table, the child relations it owns,
//! the polymorphic reference columns that may carry its id, and the field
//! names eligible for source/target resolution. The registry is a plain
//! value constructed once at process start and passed by reference into
//! the engine — there is no module-level registration.

use fiberplant_core::classify::AssetKind;

/// A child relation owned through a real foreign key.
#[derive(Debug, Clone, Copy)]
pub struct ChildRelation {
    /// Name reported in merge results and logs.
    pub relation: &'static str,
    pub table: &'static str,
    pub fk_column: &'static str,
}

/// A bare-identifier column with no database-level foreign key that may
/// store an id of this asset kind.
#[derive(Debug, Clone, Copy)]
pub struct PolymorphicRef {
    pub table: &'static str,
    pub column: &'static str,
}

impl PolymorphicRef {
    /// Name reported in merge results and logs.
    pub fn relation(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

/// Everything the engine needs to merge one asset kind.
#[derive(Debug, Clone, Copy)]
pub struct MergeSpec {
    pub kind: AssetKind,
    pub table: &'static str,
    pub children: &'static [ChildRelation],
    pub polymorphic: &'static [PolymorphicRef],
    /// Field names the caller may resolve from the source row.
    pub fields: &'static [&'static str],
}

/// Strand endpoints may reference a cabinet, closure, OLT device, or
/// access point.
const STRAND_ENDPOINTS: &[PolymorphicRef] = &[
    PolymorphicRef {
        table: "fiber_strands",
        column: "upstream_id",
    },
    PolymorphicRef {
        table: "fiber_strands",
        column: "downstream_id",
    },
];

const POINT_FIELDS: &[&str] = &["name", "code", "latitude", "longitude", "notes"];

const SEGMENT_FIELDS: &[&str] = &[
    "name",
    "code",
    "segment_type",
    "cable_type",
    "length_m",
    "path",
    "latitude",
    "longitude",
    "notes",
];

const BUILDING_FIELDS: &[&str] = &[
    "name",
    "code",
    "latitude",
    "longitude",
    "footprint",
    "notes",
];

/// The mergeable-asset registry.
#[derive(Debug, Clone)]
pub struct MergeRegistry {
    specs: Vec<MergeSpec>,
}

impl MergeRegistry {
    /// The standard registry covering all six asset kinds.
    pub fn standard() -> Self {
        Self {
            specs: vec![
                MergeSpec {
                    kind: AssetKind::FdhCabinet,
                    table: "fdh_cabinets",
                    children: &[ChildRelation {
                        relation: "splitters",
                        table: "splitters",
                        fk_column: "fdh_cabinet_id",
                    }],
                    polymorphic: STRAND_ENDPOINTS,
                    fields: POINT_FIELDS,
                },
                MergeSpec {
                    kind: AssetKind::SpliceClosure,
                    table: "splice_closures",
                    children: &[ChildRelation {
                        relation: "splice_trays",
                        table: "splice_trays",
                        fk_column: "splice_closure_id",
                    }],
                    polymorphic: STRAND_ENDPOINTS,
                    fields: POINT_FIELDS,
                },
                MergeSpec {
                    kind: AssetKind::FiberSegment,
                    table: "fiber_segments",
                    children: &[ChildRelation {
                        relation: "fiber_strands",
                        table: "fiber_strands",
                        fk_column: "fiber_segment_id",
                    }],
                    polymorphic: &[],
                    fields: SEGMENT_FIELDS,
                },
                MergeSpec {
                    kind: AssetKind::AccessPoint,
                    table: "access_points",
                    children: &[ChildRelation {
                        relation: "drop_lines",
                        table: "drop_lines",
                        fk_column: "access_point_id",
                    }],
                    polymorphic: STRAND_ENDPOINTS,
                    fields: POINT_FIELDS,
                },
                MergeSpec {
                    kind: AssetKind::OltDevice,
                    table: "olt_devices",
                    children: &[ChildRelation {
                        relation: "olt_ports",
                        table: "olt_ports",
                        fk_column: "olt_device_id",
                    }],
                    polymorphic: STRAND_ENDPOINTS,
                    fields: POINT_FIELDS,
                },
                MergeSpec {
                    kind: AssetKind::ServiceBuilding,
                    table: "service_buildings",
                    children: &[],
                    polymorphic: &[PolymorphicRef {
                        table: "drop_lines",
                        column: "service_building_id",
                    }],
                    fields: BUILDING_FIELDS,
                },
            ],
        }
    }

    /// Look up the spec for an asset kind.
    pub fn spec(&self, kind: AssetKind) -> Option<&MergeSpec> {
        self.specs.iter().find(|s| s.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
