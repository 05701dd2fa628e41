//! Embedded image extraction from the xlsx container.
//!
//! The spreadsheet cell layer knows nothing about pictures; they live in
//! `xl/drawings/drawing*.xml` parts whose anchors reference zero-based grid
//! coordinates, with the actual bytes under `xl/media/` reachable through
//! the drawing's relationship part. We only need the top-left anchor row
//! and the blip relationship id per picture.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// One embedded image with its resolved anchor position.
#[derive(Debug, Clone)]
pub(crate) struct AnchoredImage {
    /// One-based sheet row the image is anchored to (drawing row + 1).
    pub sheet_row: u32,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub extension: String,
}

/// Collects all anchored images in the workbook, sorted by drawing part.
pub(crate) fn extract_anchored_images(bytes: &[u8]) -> Result<Vec<AnchoredImage>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Parse(format!("not a spreadsheet container: {e}")))?;
    let mut drawing_parts: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/drawings/drawing") && n.ends_with(".xml"))
        .map(String::from)
        .collect();
    drawing_parts.sort();

    let mut images = Vec::new();
    for part in drawing_parts {
        let Some(xml) = read_entry(&mut archive, &part)? else {
            continue;
        };
        let anchors = parse_drawing(&xml)?;
        if anchors.is_empty() {
            continue;
        }
        let rels = match read_entry(&mut archive, &rels_part(&part))? {
            Some(xml) => parse_rels(&xml)?,
            None => continue,
        };
        for (anchor_row, rel_id) in anchors {
            let Some(target) = rels.get(&rel_id) else {
                continue;
            };
            let media_part = resolve_target(target);
            let Some(data) = read_entry(&mut archive, &media_part)? else {
                continue;
            };
            let extension = media_part
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            images.push(AnchoredImage {
                sheet_row: anchor_row.round() as u32 + 1,
                bytes: data,
                mime: mime_for(&extension),
                extension,
            });
        }
    }
    Ok(images)
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            Ok(Some(data))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(Error::Parse(format!("cannot read {name}: {e}"))),
    }
}

/// Extracts `(anchor row, blip relationship id)` pairs from a drawing part.
fn parse_drawing(xml: &[u8]) -> Result<Vec<(f64, String)>> {
    let mut reader = Reader::from_reader(Cursor::new(xml));
    reader.config_mut().trim_text(true);

    let mut anchors = Vec::new();
    let mut buf = Vec::new();
    let mut in_from = false;
    let mut in_row = false;
    let mut current_row: Option<f64> = None;
    let mut current_embed: Option<String> = None;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::Parse(format!("invalid drawing XML: {e}")))?
        {
            Event::Start(e) => match e.local_name().as_ref() {
                b"from" => in_from = true,
                b"row" if in_from => in_row = true,
                b"blip" => current_embed = embed_attribute(&e)?,
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"blip" {
                    current_embed = embed_attribute(&e)?;
                }
            }
            Event::Text(e) => {
                if in_row {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Parse(format!("invalid drawing XML: {e}")))?;
                    current_row = text.trim().parse::<f64>().ok();
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"from" => in_from = false,
                b"row" => in_row = false,
                b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => {
                    if let (Some(row), Some(embed)) = (current_row.take(), current_embed.take()) {
                        anchors.push((row, embed));
                    }
                    current_row = None;
                    current_embed = None;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(anchors)
}

fn embed_attribute(e: &quick_xml::events::BytesStart<'_>) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Parse(format!("invalid drawing XML: {e}")))?;
        if attr.key.local_name().as_ref() == b"embed" {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(format!("invalid drawing XML: {e}")))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Maps relationship ids to their targets from a `.rels` part.
fn parse_rels(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(Cursor::new(xml));
    reader.config_mut().trim_text(true);

    let mut rels = HashMap::new();
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::Parse(format!("invalid relationships XML: {e}")))?
        {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| {
                            Error::Parse(format!("invalid relationships XML: {e}"))
                        })?;
                        let value = attr
                            .unescape_value()
                            .map_err(|e| {
                                Error::Parse(format!("invalid relationships XML: {e}"))
                            })?
                            .into_owned();
                        match attr.key.local_name().as_ref() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            _ => {}
                        }
                    }
                    if let (Some(id), Some(target)) = (id, target) {
                        rels.insert(id, target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

fn rels_part(drawing_part: &str) -> String {
    match drawing_part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{drawing_part}.rels"),
    }
}

/// Resolves a relationship target (relative to `xl/drawings/`) to a
/// container path.
fn resolve_target(target: &str) -> String {
    if let Some(stripped) = target.strip_prefix("../") {
        format!("xl/{stripped}")
    } else if let Some(stripped) = target.strip_prefix('/') {
        stripped.to_string()
    } else {
        format!("xl/drawings/{target}")
    }
}

fn mime_for(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
