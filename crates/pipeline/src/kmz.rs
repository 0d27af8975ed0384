//! KMZ container handling.
//!
//! A `.kmz` file is a zip archive containing one `.kml` document (plus
//! icons and overlays we do not care about). The reader takes the first
//! entry whose name ends in `.kml` case-insensitively; an archive without
//! one is a format error. Plain `.kml` files are accepted directly.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::error::ImportError;
use crate::kml::{parse_placemarks, KmlDocument};

/// Read the KML text out of a `.kmz` archive or a bare `.kml` file.
pub fn read_kml_text(path: &Path) -> Result<String, ImportError> {
    let is_plain_kml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("kml"));
    if is_plain_kml {
        return Ok(std::fs::read_to_string(path)?);
    }

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let mut kml_name: Option<String> = None;
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_file() && entry.name().to_ascii_lowercase().ends_with(".kml") {
            kml_name = Some(entry.name().to_string());
            break;
        }
    }
    let name = kml_name.ok_or_else(|| {
        ImportError::Format(format!(
            "archive {} contains no .kml document",
            path.display()
        ))
    })?;

    let mut entry = archive.by_name(&name)?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}

/// Open a survey export and parse every placemark out of it.
pub fn read_placemarks(path: &Path) -> Result<KmlDocument, ImportError> {
    let text = read_kml_text(path)?;
    parse_placemarks(&text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
