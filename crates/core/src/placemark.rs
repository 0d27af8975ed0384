//! Transient placemark records produced by the KML reader.
//!
//! A placemark only lives for the duration of an import run; it is never
//! persisted as-is. Its property map is serialized to JSON and stored on
//! the asset row it becomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The geometry carried by a placemark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

impl GeometryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::LineString => "line_string",
            Self::Polygon => "polygon",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, geometry-bearing record extracted from a KML document.
///
/// `coords` is ordered `(longitude, latitude)`; for polygons it holds the
/// outer ring only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placemark {
    pub name: String,
    /// Extended-data properties, key -> value. Keys are unique.
    pub properties: BTreeMap<String, String>,
    pub geometry: GeometryKind,
    pub coords: Vec<(f64, f64)>,
}

impl Placemark {
    /// First coordinate of the geometry, if any.
    pub fn start(&self) -> Option<(f64, f64)> {
        self.coords.first().copied()
    }

    /// Last coordinate of the geometry; equals `start()` for points.
    pub fn end(&self) -> Option<(f64, f64)> {
        self.coords.last().copied()
    }
}
