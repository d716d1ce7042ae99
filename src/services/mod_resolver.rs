//! Mod directory resolution.
//!
//! A scan root is either a single mod or a container whose immediate subdirectories
//! are mods. The decision looks exactly two levels deep: nested containers are not
//! recursed into.
//!
//! # Display names
//!
//! A mod's display name comes from, in order:
//! 1. a `name:` / `title:` / `mod_name:` line in `info.txt` (`=` also accepted)
//! 2. the first non-empty line of a readme-like file, minus a markdown heading marker
//! 3. the directory's own name

use super::classifier::{is_metadata_file, is_readme, should_scan};
use super::status::StatusMap;
use crate::models::ModRecord;
use crate::state::{ScanEvent, ScanObserver, emit};
use camino::{Utf8Path, Utf8PathBuf};
use encoding_rs::Encoding;
use regex::Regex;
use std::fs;
use std::sync::LazyLock;
use walkdir::WalkDir;

static NAME_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:name|title|mod_name)\s*[:=]\s*(.+)$")
        .expect("name field regex is valid")
});

/// Names of the regular files directly inside `dir`, sorted.
fn file_names(dir: &Utf8Path) -> Vec<String> {
    let Ok(entries) = dir.read_dir_utf8() else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| {
            entry
                .map_err(|e| tracing::debug!("Ignoring entry in {}: {}", dir, e))
                .ok()
        })
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
        .map(|entry| entry.file_name().to_string())
        .collect();
    names.sort();
    names
}

/// Immediate subdirectories of `dir`, sorted by path.
///
/// Subdirectories whose names are not valid UTF-8 are returned separately, as lossy
/// paths, so the caller can report them.
fn subdirectories(dir: &Utf8Path) -> (Vec<Utf8PathBuf>, Vec<Utf8PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Error listing {}: {}", dir, e);
            return (Vec::new(), Vec::new());
        }
    };

    let mut dirs = Vec::new();
    let mut unnamed = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error listing {}: {}", dir, e);
                continue;
            }
        };
        if !entry.file_type().is_ok_and(|ft| ft.is_dir()) {
            continue;
        }
        match Utf8PathBuf::from_path_buf(entry.path()) {
            Ok(path) => dirs.push(path),
            Err(path) => unnamed.push(Utf8PathBuf::from(path.to_string_lossy().into_owned())),
        }
    }
    dirs.sort();
    unnamed.sort();
    (dirs, unnamed)
}

/// True if `dir` looks like a mod: it directly holds `info.txt` or a readme, or
/// anything below it would be picked up by the scanner.
pub fn has_mod_files(dir: &Utf8Path) -> bool {
    if file_names(dir)
        .iter()
        .any(|name| is_metadata_file(name) || is_readme(name))
    {
        return true;
    }

    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| entry.file_name().to_str().is_some_and(should_scan))
}

/// Turn scan roots into the list of mod directories to scan.
///
/// Roots with qualifying subdirectories are containers and contribute those
/// subdirectories; otherwise a qualifying root is a mod on its own. Anything else is
/// reported to the observer and skipped.
pub fn resolve_mod_dirs(roots: &[Utf8PathBuf], observer: &dyn ScanObserver) -> Vec<Utf8PathBuf> {
    let mut mod_dirs = Vec::new();

    for root in roots {
        if !root.is_dir() {
            emit(
                observer,
                ScanEvent::DirectorySkipped {
                    path: root.clone(),
                    reason: "directory does not exist".to_string(),
                },
            );
            continue;
        }

        let (subdirs, unnamed) = subdirectories(root);
        let (children, others): (Vec<Utf8PathBuf>, Vec<Utf8PathBuf>) =
            subdirs.into_iter().partition(|child| has_mod_files(child));

        if !children.is_empty() {
            tracing::info!(
                "Treating {} as a mod container with {} mods",
                root,
                children.len()
            );
            for path in others {
                emit(
                    observer,
                    ScanEvent::DirectorySkipped {
                        path,
                        reason: "no recognizable mod files".to_string(),
                    },
                );
            }
            for path in unnamed {
                emit(
                    observer,
                    ScanEvent::DirectorySkipped {
                        path,
                        reason: "directory name is not valid UTF-8".to_string(),
                    },
                );
            }
            mod_dirs.extend(children);
        } else if has_mod_files(root) {
            tracing::info!("Treating {} as a single mod", root);
            mod_dirs.push(root.clone());
        } else {
            emit(
                observer,
                ScanEvent::DirectorySkipped {
                    path: root.clone(),
                    reason: "no recognizable mod files".to_string(),
                },
            );
        }
    }

    mod_dirs
}

/// Read a small text file with the scan encoding. Malformed bytes are replaced
/// rather than failing the lookup.
fn read_text(path: &Utf8Path, encoding: &'static Encoding) -> Option<String> {
    let bytes = fs::read(path)
        .map_err(|e| tracing::warn!("Error reading {}: {}", path, e))
        .ok()?;

    if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(&bytes) {
        return Some(text.into_owned());
    }

    tracing::warn!(
        "{} is not valid {}, replacing malformed bytes",
        path,
        encoding.name()
    );
    Some(encoding.decode_without_bom_handling(&bytes).0.into_owned())
}

/// Markdown heading text of `line`, or `line` itself when it is not a heading.
fn strip_heading(line: &str) -> &str {
    let rest = line.trim_start_matches('#');
    if rest.len() < line.len() && rest.starts_with(char::is_whitespace) {
        rest.trim()
    } else {
        line
    }
}

/// Name from `info.txt`, if the file exists and has a name field.
fn name_from_metadata(
    dir: &Utf8Path,
    names: &[String],
    encoding: &'static Encoding,
) -> Option<String> {
    let file = names.iter().find(|name| is_metadata_file(name))?;
    let text = read_text(&dir.join(file), encoding)?;

    text.lines().find_map(|line| {
        let value = NAME_FIELD.captures(line)?.get(1)?.as_str().trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Name from the first non-empty line of the first readme that has one.
fn name_from_readme(
    dir: &Utf8Path,
    names: &[String],
    encoding: &'static Encoding,
) -> Option<String> {
    names.iter().filter(|name| is_readme(name)).find_map(|name| {
        let text = read_text(&dir.join(name), encoding)?;
        let first = text.lines().map(str::trim).find(|line| !line.is_empty())?;
        let title = strip_heading(first);
        (!title.is_empty()).then(|| title.to_string())
    })
}

/// Resolve a human-readable name for a mod directory, reading metadata files with
/// `encoding`. Never fails.
pub fn extract_display_name(dir: &Utf8Path, encoding: &'static Encoding) -> String {
    let names = file_names(dir);

    name_from_metadata(dir, &names, encoding)
        .or_else(|| name_from_readme(dir, &names, encoding))
        .unwrap_or_else(|| {
            dir.file_name()
                .map(str::to_string)
                .unwrap_or_else(|| dir.to_string())
        })
}

/// Key used to correlate a mod directory with the status manifest.
pub fn manifest_key(dir: &Utf8Path) -> &str {
    dir.file_name().unwrap_or(dir.as_str())
}

/// Build the [`ModRecord`] for a resolved directory. Mods missing from the manifest
/// are enabled.
pub fn build_mod_record(
    dir: &Utf8Path,
    statuses: &StatusMap,
    encoding: &'static Encoding,
) -> ModRecord {
    let enabled = statuses.get(manifest_key(dir)).copied().unwrap_or(true);

    ModRecord {
        path: dir.to_path_buf(),
        display_name: extract_display_name(dir, encoding),
        enabled,
    }
}
