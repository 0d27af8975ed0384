//! Identity-based placemark deduplication.
//!
//! Survey exports routinely contain the same pole, cabinet, or trace twice
//! (re-uploaded layers, copy-pasted folders). Two placemarks are considered
//! the same asset when their normalized name, geometry kind, and start/end
//! coordinates rounded to 5 decimal places (~1.1 m at the equator) all
//! agree. The first occurrence in input order survives.

use crate::placemark::{GeometryKind, Placemark};
use std::collections::HashSet;

/// Rounding scale: 5 decimal places.
const COORD_SCALE: f64 = 100_000.0;

/// The identity of a placemark for deduplication purposes.
///
/// Coordinates are stored as scaled integers so the key is `Eq + Hash`
/// without floating-point comparison traps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    name: String,
    geometry: GeometryKind,
    start_lon: i64,
    start_lat: i64,
    end_lon: i64,
    end_lat: i64,
}

/// Round a coordinate to 5 decimals, scaled to an integer.
fn round5(v: f64) -> i64 {
    (v * COORD_SCALE).round() as i64
}

/// Compute the identity key for a placemark.
///
/// For single-point geometries the end coordinate equals the start.
/// Returns `None` for a placemark with no coordinates — such records are
/// discarded upstream and have no identity.
pub fn identity_key(placemark: &Placemark) -> Option<IdentityKey> {
    let (start_lon, start_lat) = placemark.start()?;
    let (end_lon, end_lat) = placemark.end()?;
    Some(IdentityKey {
        name: placemark.name.trim().to_lowercase(),
        geometry: placemark.geometry,
        start_lon: round5(start_lon),
        start_lat: round5(start_lat),
        end_lon: round5(end_lon),
        end_lat: round5(end_lat),
    })
}

/// Collapse placemarks with equal identity keys, keeping the first
/// occurrence of each. Placemarks without coordinates are dropped.
///
/// Idempotent: applying it to its own output changes nothing.
pub fn dedupe(placemarks: Vec<Placemark>) -> Vec<Placemark> {
    let mut seen: HashSet<IdentityKey> = HashSet::new();
    placemarks
        .into_iter()
        .filter(|p| match identity_key(p) {
            Some(key) => seen.insert(key),
            None => false,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
