//! Geometry utilities for WGS84 coordinate data.
//!
//! Coordinates are `(longitude, latitude)` pairs in degrees, matching the
//! order KML uses. No database access — pure numeric logic.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Mean Earth radius in meters, as used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Below this absolute shoelace area a ring is treated as degenerate.
const DEGENERATE_AREA: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Coordinate parsing
// ---------------------------------------------------------------------------

/// Parse a KML `<coordinates>` text block into `(lon, lat)` pairs.
///
/// Tokens are whitespace-separated; each token is comma-separated with the
/// first two fields being longitude and latitude (an optional third altitude
/// field is ignored). Tokens that do not yield two parseable floats are
/// skipped rather than failing the whole block.
pub fn parse_coordinates(text: &str) -> Vec<(f64, f64)> {
    text.split_whitespace()
        .filter_map(|token| {
            let mut fields = token.split(',');
            let lon = fields.next()?.trim().parse::<f64>().ok()?;
            let lat = fields.next()?.trim().parse::<f64>().ok()?;
            Some((lon, lat))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Centroid
// ---------------------------------------------------------------------------

/// Area-weighted centroid of a polygon ring via the shoelace formula.
///
/// The ring is closed if the input does not already end on its first
/// vertex. A degenerate ring (near-zero area, e.g. collinear vertices)
/// falls back to the arithmetic mean of the vertices. Returns `None` for
/// an empty input.
pub fn polygon_centroid(coords: &[(f64, f64)]) -> Option<(f64, f64)> {
    if coords.is_empty() {
        return None;
    }
    if coords.len() < 3 {
        return Some(vertex_mean(coords));
    }

    let mut ring: Vec<(f64, f64)> = coords.to_vec();
    if ring.first() != ring.last() {
        ring.push(ring[0]);
    }

    let mut area = 0.0_f64;
    let mut cx = 0.0_f64;
    let mut cy = 0.0_f64;
    for pair in ring.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let cross = x0 * y1 - x1 * y0;
        area += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    area /= 2.0;

    if area.abs() < DEGENERATE_AREA {
        return Some(vertex_mean(coords));
    }

    Some((cx / (6.0 * area), cy / (6.0 * area)))
}

fn vertex_mean(coords: &[(f64, f64)]) -> (f64, f64) {
    let n = coords.len() as f64;
    let (sx, sy) = coords
        .iter()
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    (sx / n, sy / n)
}

// ---------------------------------------------------------------------------
// Distance
// ---------------------------------------------------------------------------

/// Great-circle distance in meters between two `(lon, lat)` points.
pub fn haversine_m(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Total length in meters of a polyline, summed over consecutive pairs.
pub fn line_length_m(coords: &[(f64, f64)]) -> f64 {
    coords
        .windows(2)
        .map(|pair| haversine_m(pair[0].0, pair[0].1, pair[1].0, pair[1].1))
        .sum()
}

// ---------------------------------------------------------------------------
// Bounding box
// ---------------------------------------------------------------------------

/// A rectangular geographic bound used to filter placemarks to a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Build a bounding box, rejecting inverted bounds.
    pub fn new(
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Result<Self, CoreError> {
        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(CoreError::Validation(format!(
                "region min values must be below max values, \
                 got ({min_lat}, {min_lon}) to ({max_lat}, {max_lon})"
            )));
        }
        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// True if the first coordinate of `coords` falls within `bbox`.
///
/// Geometries are filtered by their starting point only; a line that exits
/// the region mid-way is still kept.
pub fn in_region(coords: &[(f64, f64)], bbox: &BoundingBox) -> bool {
    coords
        .first()
        .is_some_and(|(lon, lat)| bbox.contains(*lat, *lon))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- parse_coordinates ---------------------------------------------------

    #[test]
    fn parse_coordinates_basic() {
        let coords = parse_coordinates("7.1,9.0,0 7.2,9.1,0");
        assert_eq!(coords, vec![(7.1, 9.0), (7.2, 9.1)]);
    }

    #[test]
    fn parse_coordinates_without_altitude() {
        let coords = parse_coordinates("7.1,9.0 7.2,9.1");
        assert_eq!(coords, vec![(7.1, 9.0), (7.2, 9.1)]);
    }

    #[test]
    fn parse_coordinates_skips_bad_tokens() {
        let coords = parse_coordinates("7.1,9.0 garbage 7.2,abc 7.3,9.3");
        assert_eq!(coords, vec![(7.1, 9.0), (7.3, 9.3)]);
    }

    #[test]
    fn parse_coordinates_handles_newlines_and_tabs() {
        let coords = parse_coordinates("7.1,9.0\n\t7.2,9.1  \n7.3,9.2");
        assert_eq!(coords.len(), 3);
    }

    #[test]
    fn parse_coordinates_empty_input() {
        assert!(parse_coordinates("").is_empty());
        assert!(parse_coordinates("   \n ").is_empty());
    }

    // -- polygon_centroid ----------------------------------------------------

    #[test]
    fn centroid_of_unit_square() {
        let square = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let (cx, cy) = polygon_centroid(&square).unwrap();
        assert!((cx - 0.5).abs() < 1e-9);
        assert!((cy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_closed_ring_matches_open_ring() {
        let open = vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        let mut closed = open.clone();
        closed.push(open[0]);
        assert_eq!(polygon_centroid(&open), polygon_centroid(&closed));
    }

    #[test]
    fn centroid_lies_within_bounding_box() {
        let poly = vec![(7.10, 9.00), (7.14, 9.01), (7.13, 9.05), (7.09, 9.03)];
        let (cx, cy) = polygon_centroid(&poly).unwrap();
        assert!(cx >= 7.09 && cx <= 7.14);
        assert!(cy >= 9.00 && cy <= 9.05);
    }

    #[test]
    fn centroid_degenerate_ring_falls_back_to_mean() {
        // Collinear points: shoelace area is zero.
        let line = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)];
        let (cx, cy) = polygon_centroid(&line).unwrap();
        assert!((cx - 1.0).abs() < 1e-9);
        assert!((cy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_empty_input_is_none() {
        assert!(polygon_centroid(&[]).is_none());
    }

    // -- haversine_m ---------------------------------------------------------

    #[test]
    fn haversine_same_point_is_zero() {
        assert_eq!(haversine_m(7.1, 9.0, 7.1, 9.0), 0.0);
    }

    #[test]
    fn haversine_is_symmetric() {
        let d1 = haversine_m(7.1, 9.0, 3.4, 6.5);
        let d2 = haversine_m(3.4, 6.5, 7.1, 9.0);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        // One degree of latitude is ~111.2 km on a 6371 km sphere.
        let d = haversine_m(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    // -- line_length_m -------------------------------------------------------

    #[test]
    fn line_length_is_additive() {
        let a = (7.10, 9.00);
        let b = (7.20, 9.05);
        let c = (7.25, 9.20);
        let whole = line_length_m(&[a, b, c]);
        let parts = line_length_m(&[a, b]) + line_length_m(&[b, c]);
        assert!((whole - parts).abs() < 1e-9);
    }

    #[test]
    fn line_length_of_single_point_is_zero() {
        assert_eq!(line_length_m(&[(7.1, 9.0)]), 0.0);
        assert_eq!(line_length_m(&[]), 0.0);
    }

    // -- bounding box --------------------------------------------------------

    #[test]
    fn in_region_checks_first_coordinate() {
        let bbox = BoundingBox {
            min_lat: 8.0,
            max_lat: 10.0,
            min_lon: 6.0,
            max_lon: 8.0,
        };
        // Starts inside, leaves the box: kept.
        assert!(in_region(&[(7.1, 9.0), (50.0, 50.0)], &bbox));
        // Starts outside: dropped.
        assert!(!in_region(&[(50.0, 50.0), (7.1, 9.0)], &bbox));
        assert!(!in_region(&[], &bbox));
    }

    #[test]
    fn bounding_box_contains_edges() {
        let bbox = BoundingBox {
            min_lat: 8.0,
            max_lat: 10.0,
            min_lon: 6.0,
            max_lon: 8.0,
        };
        assert!(bbox.contains(8.0, 6.0));
        assert!(bbox.contains(10.0, 8.0));
        assert!(!bbox.contains(10.1, 7.0));
    }

    #[test]
    fn bounding_box_rejects_inverted_bounds() {
        assert!(BoundingBox::new(8.0, 6.0, 10.0, 8.0).is_ok());
        assert!(BoundingBox::new(10.0, 6.0, 8.0, 8.0).is_err());
        assert!(BoundingBox::new(8.0, 8.0, 10.0, 6.0).is_err());
    }
}
