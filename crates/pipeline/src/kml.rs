//! Streaming KML 2.2 placemark parser.
//!
//! Walks the document with a `quick_xml::Reader` and a local-name element
//! stack, so the default KML namespace and prefixed variants (`<kml:...>`)
//! parse identically. Per `<Placemark>` it captures the name, extended
//! attributes from both `<Data name="k"><value>` and `<SimpleData name="k">`
//! forms, and the first geometry element in document order among `<Point>`,
//! `<LineString>`, and `<Polygon>` (outer ring only).
//!
//! Malformed coordinate tokens are dropped by `parse_coordinates`; a
//! placemark left without usable geometry is discarded and counted, not an
//! error. A document that is not well-formed XML fails the whole run.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use fiberplant_core::geo::parse_coordinates;
use fiberplant_core::placemark::{GeometryKind, Placemark};

use crate::error::ImportError;

/// A parsed KML document: surviving placemarks plus the count of
/// placemarks dropped for missing or empty geometry.
#[derive(Debug, Default)]
pub struct KmlDocument {
    pub placemarks: Vec<Placemark>,
    pub discarded: u32,
}

/// Accumulator for the placemark currently being parsed.
#[derive(Debug, Default)]
struct PendingPlacemark {
    name: String,
    properties: BTreeMap<String, String>,
    geometry: Option<(GeometryKind, Vec<(f64, f64)>)>,
}

/// Parse every placemark out of a KML document.
pub fn parse_placemarks(xml: &str) -> Result<KmlDocument, ImportError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut doc = KmlDocument::default();
    let mut stack: Vec<String> = Vec::new();
    let mut pending: Option<PendingPlacemark> = None;
    let mut data_key: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match local.as_str() {
                    "Placemark" => pending = Some(PendingPlacemark::default()),
                    "Data" | "SimpleData" if pending.is_some() => {
                        data_key = e
                            .try_get_attribute("name")
                            .map_err(|err| {
                                ImportError::Format(format!("bad attribute in <{local}>: {err}"))
                            })?
                            .and_then(|attr| attr.unescape_value().ok())
                            .map(|v| v.into_owned());
                    }
                    _ => {}
                }
                stack.push(local);
            }
            Event::Empty(_) => {
                // Self-closing elements carry neither text nor geometry.
            }
            Event::End(_) => {
                let closed = stack.pop();
                match closed.as_deref() {
                    Some("Placemark") => {
                        if let Some(done) = pending.take() {
                            match done.geometry {
                                Some((geometry, coords)) if !coords.is_empty() => {
                                    doc.placemarks.push(Placemark {
                                        name: done.name.trim().to_string(),
                                        properties: done.properties,
                                        geometry,
                                        coords,
                                    });
                                }
                                _ => doc.discarded += 1,
                            }
                        }
                    }
                    Some("Data") | Some("SimpleData") => data_key = None,
                    _ => {}
                }
            }
            Event::Text(t) => {
                let text = t.unescape()?.into_owned();
                handle_text(&stack, &mut pending, &data_key, &text);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                handle_text(&stack, &mut pending, &data_key, &text);
            }
            _ => {}
        }
    }

    Ok(doc)
}

/// Route a text node to the right accumulator slot based on where in the
/// element tree it appeared.
fn handle_text(
    stack: &[String],
    pending: &mut Option<PendingPlacemark>,
    data_key: &Option<String>,
    text: &str,
) {
    let Some(current) = pending.as_mut() else {
        return;
    };
    let Some(last) = stack.last() else {
        return;
    };

    match last.as_str() {
        // Only the placemark's own <name>, not the document's or folder's.
        "name" if stack_parent_is(stack, "Placemark") => current.name.push_str(text),
        "value" if stack_has(stack, "Data") => {
            if let Some(key) = data_key {
                current.properties.insert(key.clone(), text.to_string());
            }
        }
        "SimpleData" => {
            if let Some(key) = data_key {
                current.properties.insert(key.clone(), text.to_string());
            }
        }
        "coordinates" => {
            // First geometry element in document order wins.
            if current.geometry.is_some() {
                return;
            }
            let Some(kind) = enclosing_geometry(stack) else {
                return;
            };
            // For polygons only the outer ring is taken.
            if kind == GeometryKind::Polygon && !stack_has(stack, "outerBoundaryIs") {
                return;
            }
            current.geometry = Some((kind, parse_coordinates(text)));
        }
        _ => {}
    }
}

fn stack_has(stack: &[String], name: &str) -> bool {
    stack.iter().any(|e| e == name)
}

fn stack_parent_is(stack: &[String], name: &str) -> bool {
    stack.len() >= 2 && stack[stack.len() - 2] == name
}

/// Innermost geometry element on the stack.
fn enclosing_geometry(stack: &[String]) -> Option<GeometryKind> {
    stack.iter().rev().find_map(|e| match e.as_str() {
        "Point" => Some(GeometryKind::Point),
        "LineString" => Some(GeometryKind::LineString),
        "Polygon" => Some(GeometryKind::Polygon),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
