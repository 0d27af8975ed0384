//! KMZ/KML ingestion pipeline: archive reading, placemark parsing, and the
//! batch importer that turns classified placemarks into persisted assets.

pub mod error;
pub mod import;
pub mod kml;
pub mod kmz;
pub mod run;

pub use error::ImportError;
pub use import::{BatchImporter, ImportCounts};
pub use run::{run_import, ImportOptions, ImportReport, ImportSource};
