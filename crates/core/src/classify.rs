//! Heuristic placemark classification.
//!
//! Maps a `(name, geometry kind)` pair to a network asset kind using an
//! ordered rule list, first match wins. The function is pure and total:
//! the geometry fallback guarantees every input yields a decision, so
//! there is no "unclassifiable" error path. Ambiguous names that match
//! more than one vocabulary (e.g. "BTS Cabinet") resolve by rule order;
//! the order is a product decision and must not be rearranged casually.

use crate::placemark::GeometryKind;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Asset kinds
// ---------------------------------------------------------------------------

/// The six persisted network asset types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    FdhCabinet,
    SpliceClosure,
    FiberSegment,
    AccessPoint,
    OltDevice,
    ServiceBuilding,
}

impl AssetKind {
    /// Return the kind tag as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FdhCabinet => "fdh_cabinet",
            Self::SpliceClosure => "splice_closure",
            Self::FiberSegment => "fiber_segment",
            Self::AccessPoint => "access_point",
            Self::OltDevice => "olt_device",
            Self::ServiceBuilding => "service_building",
        }
    }

    /// Parse a kind tag. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fdh_cabinet" => Some(Self::FdhCabinet),
            "splice_closure" => Some(Self::SpliceClosure),
            "fiber_segment" => Some(Self::FiberSegment),
            "access_point" => Some(Self::AccessPoint),
            "olt_device" => Some(Self::OltDevice),
            "service_building" => Some(Self::ServiceBuilding),
            _ => None,
        }
    }

    /// All valid kind tags.
    pub const ALL: &'static [AssetKind] = &[
        Self::FdhCabinet,
        Self::SpliceClosure,
        Self::FiberSegment,
        Self::AccessPoint,
        Self::OltDevice,
        Self::ServiceBuilding,
    ];
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying a placemark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Asset(AssetKind),
    /// The placemark is survey noise and is not imported.
    Skip,
}

// ---------------------------------------------------------------------------
// Vocabularies
// ---------------------------------------------------------------------------

/// Names that identify survey noise rather than plant.
pub const JUNK_NAMES: &[&str] = &[
    "untitled placemark",
    "untitled path",
    "untitled polygon",
    "sightseeing",
    "new placemark",
];

/// Generic measurement traces drawn by survey tools. As names they are
/// junk, but a LineString so named is still a real cable route.
pub const MEASURE_TRACE_NAMES: &[&str] = &["path measure", "line measure"];

/// Civil infrastructure vocabulary (rule 2).
pub const CIVIL_WORDS: &[&str] = &[
    "manhole", "handhole", "duct", "trench", "trenching", "drainage", "culvert",
];

/// Cabinet vocabulary (rule 3).
pub const CABINET_WORDS: &[&str] = &["cabinet", "fdh", "distribution point"];

/// Splice closure vocabulary (rule 4).
pub const CLOSURE_WORDS: &[&str] = &["closure", "splice", "joint"];

/// Access point vocabulary (rule 5).
pub const ACCESS_POINT_WORDS: &[&str] = &["access point", "fat", "fdt", "nap", "tap"];

/// OLT / site vocabulary (rule 6).
pub const OLT_WORDS: &[&str] = &["olt", "bts", "pop", "exchange", "central office"];

fn matches_any(name: &str, words: &[&str]) -> bool {
    words.iter().any(|w| name.contains(w))
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a placemark name and geometry kind into an asset kind.
pub fn classify(name: &str, geometry: GeometryKind) -> Classification {
    let name = name.trim().to_lowercase();
    let is_line = geometry == GeometryKind::LineString;

    // Rule 1: junk names. A LineString named exactly after a measurement
    // trace is the surveyor tracing a cable route and is kept.
    if name.is_empty() || JUNK_NAMES.contains(&name.as_str()) {
        return Classification::Skip;
    }
    if MEASURE_TRACE_NAMES.contains(&name.as_str()) {
        return if is_line {
            Classification::Asset(AssetKind::FiberSegment)
        } else {
            Classification::Skip
        };
    }

    // Rule 2: civil infrastructure. A manhole point is where strands get
    // spliced; everything else is routed plant or a served structure.
    if matches_any(&name, CIVIL_WORDS) {
        if name.contains("manhole") && geometry == GeometryKind::Point {
            return Classification::Asset(AssetKind::SpliceClosure);
        }
        return Classification::Asset(if is_line {
            AssetKind::FiberSegment
        } else {
            AssetKind::ServiceBuilding
        });
    }

    // Rules 3-6: equipment vocabularies. A LineString always wins as a
    // segment regardless of the matched vocabulary.
    if matches_any(&name, CABINET_WORDS) {
        return Classification::Asset(if is_line {
            AssetKind::FiberSegment
        } else {
            AssetKind::FdhCabinet
        });
    }
    if matches_any(&name, CLOSURE_WORDS) {
        return Classification::Asset(if is_line {
            AssetKind::FiberSegment
        } else {
            AssetKind::SpliceClosure
        });
    }
    if matches_any(&name, ACCESS_POINT_WORDS) {
        return Classification::Asset(if is_line {
            AssetKind::FiberSegment
        } else {
            AssetKind::AccessPoint
        });
    }
    if matches_any(&name, OLT_WORDS) {
        return Classification::Asset(if is_line {
            AssetKind::FiberSegment
        } else {
            AssetKind::OltDevice
        });
    }

    // Rule 7: fall back on geometry alone. An unrecognised point or
    // polygon defaults to a customer/subscriber premises.
    Classification::Asset(match geometry {
        GeometryKind::LineString => AssetKind::FiberSegment,
        GeometryKind::Polygon | GeometryKind::Point => AssetKind::ServiceBuilding,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use GeometryKind::{LineString, Point, Polygon};

    fn assert_kind(name: &str, geom: GeometryKind, expected: AssetKind) {
        assert_eq!(
            classify(name, geom),
            Classification::Asset(expected),
            "name: {name:?}, geometry: {geom}"
        );
    }

    // -- rule 1: junk --------------------------------------------------------

    #[test]
    fn empty_name_is_skipped() {
        assert_eq!(classify("", Point), Classification::Skip);
        assert_eq!(classify("   ", Point), Classification::Skip);
    }

    #[test]
    fn junk_names_are_skipped() {
        assert_eq!(classify("Untitled Placemark", Point), Classification::Skip);
        assert_eq!(classify("sightseeing", Polygon), Classification::Skip);
    }

    #[test]
    fn measure_trace_linestring_is_a_segment() {
        assert_kind("Path Measure", LineString, AssetKind::FiberSegment);
        assert_kind("line measure", LineString, AssetKind::FiberSegment);
    }

    #[test]
    fn measure_trace_point_is_skipped() {
        assert_eq!(classify("path measure", Point), Classification::Skip);
    }

    // -- rule 2: civil infrastructure ---------------------------------------

    #[test]
    fn manhole_point_is_a_splice_closure() {
        assert_kind("Manhole 12", Point, AssetKind::SpliceClosure);
    }

    #[test]
    fn manhole_line_is_a_segment() {
        assert_kind("manhole run", LineString, AssetKind::FiberSegment);
    }

    #[test]
    fn trenching_line_is_a_segment() {
        assert_kind("Trenching phase 2", LineString, AssetKind::FiberSegment);
    }

    #[test]
    fn drainage_polygon_is_a_building() {
        assert_kind("drainage area", Polygon, AssetKind::ServiceBuilding);
    }

    // -- rules 3-6: equipment ------------------------------------------------

    #[test]
    fn cabinet_point_is_a_cabinet() {
        assert_kind("FDH Cabinet 3", Point, AssetKind::FdhCabinet);
        assert_kind("cabinet", Point, AssetKind::FdhCabinet);
    }

    #[test]
    fn cabinet_line_is_a_segment() {
        assert_kind("cabinet feed", LineString, AssetKind::FiberSegment);
    }

    #[test]
    fn closure_point_is_a_closure() {
        assert_kind("Joint Closure JC-4", Point, AssetKind::SpliceClosure);
        assert_kind("splice 7", Point, AssetKind::SpliceClosure);
    }

    #[test]
    fn access_point_vocab() {
        assert_kind("FAT-12", Point, AssetKind::AccessPoint);
        assert_kind("NAP 3", Point, AssetKind::AccessPoint);
    }

    #[test]
    fn olt_vocab() {
        assert_kind("OLT Site", Point, AssetKind::OltDevice);
        assert_kind("BTS hill", Point, AssetKind::OltDevice);
    }

    // Overlapping vocabularies resolve by rule order: "cabinet" is
    // checked before "bts", so "BTS Cabinet" lands as a cabinet.
    #[test]
    fn overlapping_vocab_resolves_by_rule_order() {
        assert_kind("BTS Cabinet", Point, AssetKind::FdhCabinet);
        assert_kind("splice cabinet", Point, AssetKind::FdhCabinet);
    }

    // -- rule 7: fallback ----------------------------------------------------

    #[test]
    fn unknown_line_is_a_segment() {
        assert_kind("Mr. Adeyemi's street", LineString, AssetKind::FiberSegment);
    }

    #[test]
    fn unknown_polygon_is_a_building() {
        assert_kind("Plot 44", Polygon, AssetKind::ServiceBuilding);
    }

    #[test]
    fn unknown_point_defaults_to_building() {
        assert_kind("Mrs. Okafor", Point, AssetKind::ServiceBuilding);
    }

    // -- totality / purity ---------------------------------------------------

    #[test]
    fn classify_is_deterministic() {
        for geom in [Point, LineString, Polygon] {
            for name in ["", "cabinet", "BTS Cabinet", "random", "manhole"] {
                assert_eq!(classify(name, geom), classify(name, geom));
            }
        }
    }

    // -- kind tags -----------------------------------------------------------

    #[test]
    fn kind_tags_round_trip() {
        for kind in AssetKind::ALL {
            assert_eq!(AssetKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(AssetKind::parse("splitter"), None);
    }
}
