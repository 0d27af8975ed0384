//! Asset naming rules for imported placemarks.
//!
//! Survey exports are full of generic labels ("Cabinet", "client", "path
//! measure") that would collide as row names. Generic point-asset names get
//! the rounded coordinates appended; generic segment names are replaced by
//! a synthesized name built from the rounded start and end coordinates.
//! Exact collisions that survive disambiguation get an incrementing ` #N`
//! suffix.

use crate::classify::AssetKind;

// ---------------------------------------------------------------------------
// Generic-name vocabularies
// ---------------------------------------------------------------------------

const GENERIC_CABINET_NAMES: &[&str] = &["cabinet", "fdh", "new cabinet", "dp"];
const GENERIC_CLOSURE_NAMES: &[&str] = &["closure", "splice", "joint", "manhole", "new closure"];
const GENERIC_ACCESS_POINT_NAMES: &[&str] = &["fat", "fdt", "nap", "tap", "access point"];
const GENERIC_OLT_NAMES: &[&str] = &["olt", "bts", "pop", "site", "exchange"];
const GENERIC_BUILDING_NAMES: &[&str] = &[
    "client", "customer", "subscriber", "house", "home", "building", "premises", "shop",
];

/// Segment labels that carry no identity of their own.
pub const GENERIC_SEGMENT_NAMES: &[&str] = &[
    "path measure",
    "line measure",
    "trenching",
    "trench",
    "route",
    "path",
    "duct",
    "cable",
];

/// True if `name` is one of the generic labels for `kind`.
///
/// Matching is exact on the trimmed, lowercased name: "Cabinet 14" is a
/// real name, bare "Cabinet" is not.
pub fn is_generic_name(kind: AssetKind, name: &str) -> bool {
    let name = name.trim().to_lowercase();
    let set = match kind {
        AssetKind::FdhCabinet => GENERIC_CABINET_NAMES,
        AssetKind::SpliceClosure => GENERIC_CLOSURE_NAMES,
        AssetKind::FiberSegment => GENERIC_SEGMENT_NAMES,
        AssetKind::AccessPoint => GENERIC_ACCESS_POINT_NAMES,
        AssetKind::OltDevice => GENERIC_OLT_NAMES,
        AssetKind::ServiceBuilding => GENERIC_BUILDING_NAMES,
    };
    set.contains(&name.as_str())
}

// ---------------------------------------------------------------------------
// Disambiguation
// ---------------------------------------------------------------------------

/// Append the rounded position to a generic point-asset name.
///
/// `"Cabinet"` at (9.05123456, 7.49876543) becomes
/// `"Cabinet (9.05123, 7.49877)"`.
pub fn disambiguate(name: &str, lat: f64, lon: f64) -> String {
    format!("{} ({lat:.5}, {lon:.5})", name.trim())
}

/// Synthesize a segment name from its start and end coordinates.
///
/// Coordinates are `(lon, lat)` pairs as stored on the placemark.
pub fn segment_name(start: (f64, f64), end: (f64, f64)) -> String {
    format!(
        "Segment {:.5},{:.5} - {:.5},{:.5}",
        start.1, start.0, end.1, end.0
    )
}

/// Append an incrementing ` #N` suffix until `name` is not in `taken`.
///
/// `taken` is the caller's view of names already in use — rows in storage
/// plus rows created earlier in the same batch. Returns `name` unchanged
/// when it is free.
pub fn unique_name<F>(name: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !taken(name) {
        return name.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{name} #{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generic_names_match_exactly() {
        assert!(is_generic_name(AssetKind::FdhCabinet, "Cabinet"));
        assert!(is_generic_name(AssetKind::FdhCabinet, "  FDH "));
        assert!(!is_generic_name(AssetKind::FdhCabinet, "Cabinet 14"));
        assert!(is_generic_name(AssetKind::ServiceBuilding, "client"));
        assert!(!is_generic_name(AssetKind::ServiceBuilding, "Chukwu residence"));
    }

    #[test]
    fn generic_segment_names() {
        assert!(is_generic_name(AssetKind::FiberSegment, "Path Measure"));
        assert!(is_generic_name(AssetKind::FiberSegment, "route"));
        assert!(!is_generic_name(AssetKind::FiberSegment, "Adetokunbo feeder"));
    }

    #[test]
    fn disambiguate_appends_rounded_position() {
        assert_eq!(
            disambiguate("Cabinet", 9.051234, 7.498765),
            "Cabinet (9.05123, 7.49877)"
        );
    }

    #[test]
    fn segment_name_encodes_both_ends() {
        let name = segment_name((7.1, 9.0), (7.2, 9.1));
        assert_eq!(name, "Segment 9.00000,7.10000 - 9.10000,7.20000");
    }

    #[test]
    fn unique_name_leaves_free_names_alone() {
        let taken: HashSet<&str> = HashSet::new();
        assert_eq!(unique_name("Cabinet (9.0, 7.1)", |n| taken.contains(n)), "Cabinet (9.0, 7.1)");
    }

    #[test]
    fn unique_name_increments_until_free() {
        let taken: HashSet<String> = ["Seg".to_string(), "Seg #2".to_string()].into();
        assert_eq!(unique_name("Seg", |n| taken.contains(n)), "Seg #3");
    }
}
