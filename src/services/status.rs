//! Status manifest parsing.
//!
//! The manifest is an XML document listing mods as
//! `<mod id="steam-123456" active="true"/>`. Everything up to and including the first
//! `-` of the id is a source tag; the remainder is the mod's directory name.
//!
//! A manifest that cannot be read or parsed yields an empty map, so every mod is then
//! considered enabled.

use crate::state::{ScanEvent, ScanObserver, emit};
use anyhow::{Context, Result, anyhow};
use camino::Utf8Path;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fs;

/// Mod directory name → enabled.
pub type StatusMap = HashMap<String, bool>;

/// Separator between the source tag and the directory name in a manifest id.
pub const ID_SEPARATOR: char = '-';

/// Directory name encoded in a manifest id, or `None` when the id has no separator.
pub fn dir_name_from_id(id: &str) -> Option<&str> {
    id.split_once(ID_SEPARATOR).map(|(_, dir)| dir)
}

/// Read `id` and `active` from a `<mod>` element.
fn mod_attributes(element: &BytesStart<'_>) -> Result<(Option<String>, bool)> {
    let mut id = None;
    let mut active = false;

    for attr in element.attributes() {
        let attr = attr.context("Malformed attribute on <mod>")?;
        let value = attr
            .unescape_value()
            .context("Malformed attribute value on <mod>")?;
        match attr.key.as_ref() {
            b"id" => id = Some(value.into_owned()),
            b"active" => active = value.trim().eq_ignore_ascii_case("true"),
            _ => {}
        }
    }

    Ok((id, active))
}

/// Parse manifest XML text. Any syntax error fails the whole document.
pub fn parse_manifest_str(xml: &str) -> Result<StatusMap> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut statuses = StatusMap::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| anyhow!("XML error at byte {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(ref element) | Event::Empty(ref element)
                if element.name().as_ref() == b"mod" =>
            {
                let (id, active) = mod_attributes(element)?;
                let Some(id) = id else {
                    tracing::warn!("Manifest <mod> entry without an id, skipping");
                    continue;
                };

                match dir_name_from_id(&id) {
                    Some(dir) if !dir.is_empty() => {
                        statuses.insert(dir.to_string(), active);
                    }
                    _ => {
                        tracing::warn!(
                            "Manifest id '{}' has no '{}' separator, cannot match it to a directory",
                            id,
                            ID_SEPARATOR
                        );
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(statuses)
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Utf8Path) -> Result<StatusMap> {
    let xml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read status manifest: {}", path))?;
    parse_manifest_str(&xml).with_context(|| format!("Failed to parse status manifest: {}", path))
}

/// Load the manifest, degrading to an empty map (all mods enabled) on any failure.
pub fn resolve_statuses(path: Option<&Utf8Path>, observer: &dyn ScanObserver) -> StatusMap {
    let Some(path) = path else {
        return StatusMap::new();
    };

    match load_manifest(path) {
        Ok(statuses) => {
            tracing::info!("Loaded {} mod states from {}", statuses.len(), path);
            statuses
        }
        Err(e) => {
            emit(
                observer,
                ScanEvent::ManifestFailed {
                    path: path.to_path_buf(),
                    error: format!("{:#}", e),
                },
            );
            StatusMap::new()
        }
    }
}
