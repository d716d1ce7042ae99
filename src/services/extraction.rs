//! Extraction engine: turns the eligible files of a mod into [`RawMatch`] records.
//!
//! Every file is gated by the classifier before it is read, decoded with the
//! configured encoding and matched line by line. Failures stay local to the file:
//! they are reported to the observer and the file contributes no matches.

use super::classifier::{FileVerdict, classify, should_scan};
use super::error::ConfigurationError;
use super::patterns::PatternSet;
use crate::models::{ModRecord, RawMatch};
use crate::state::{ScanContext, ScanEvent, ScanObserver, emit};
use camino::{Utf8Path, Utf8PathBuf};
use encoding_rs::Encoding;
use rayon::prelude::*;
use std::fs;
use std::time::Instant;
use walkdir::WalkDir;

/// Characters of context kept on each side of a match.
pub const CONTEXT_RADIUS: usize = 50;

/// Look up an encoding by its WHATWG label (`utf-8`, `latin1`, `windows-1252`, ...).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ConfigurationError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ConfigurationError::UnknownEncoding(label.to_string()))
}

/// What happened to one candidate file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Scanned(Vec<RawMatch>),
    Skipped(String),
    Failed(String),
}

impl FileOutcome {
    pub fn into_matches(self) -> Vec<RawMatch> {
        match self {
            FileOutcome::Scanned(matches) => matches,
            _ => Vec::new(),
        }
    }
}

/// Trimmed slice of `line` spanning [`CONTEXT_RADIUS`] characters either side of the
/// byte range `start..end`, clipped to the line.
pub fn context_around(line: &str, start: usize, end: usize) -> String {
    let from = line[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_RADIUS - 1)
        .map_or(0, |(i, _)| i);
    let to = line[end..]
        .char_indices()
        .nth(CONTEXT_RADIUS)
        .map_or(line.len(), |(i, _)| end + i);

    line[from..to].trim().to_string()
}

/// Lines of `text`, ending at `\r\n`, `\n` or a lone `\r`.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let body = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix(['\n', '\r']))
        .unwrap_or(text);
    let mut rest = (!text.is_empty()).then_some(body);

    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(i) => {
                let skip = if current[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[i + skip..]);
                Some(&current[..i])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Match every line of `text` against every pattern.
///
/// Matches come out in line order, then pattern order, then left to right. The mod
/// fields are left empty.
pub fn extract_matches(file_path: &str, text: &str, patterns: &PatternSet) -> Vec<RawMatch> {
    let mut matches = Vec::new();

    for (index, line) in split_lines(text).enumerate() {
        for pattern in patterns.iter() {
            for hit in pattern.find_in(line) {
                matches.push(RawMatch {
                    file_path: file_path.to_string(),
                    line_number: index + 1,
                    key_name: hit.key_name.to_string(),
                    context: context_around(line, hit.start, hit.end),
                    matched_text: hit.matched_text.to_string(),
                    mod_name: String::new(),
                    mod_enabled: true,
                });
            }
        }
    }

    matches
}

fn decode(bytes: &[u8], encoding: &'static Encoding) -> Result<String, String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| format!("content is not valid {}", encoding.name()))
}

/// Scan one file. Never fails: gating and read errors are folded into the outcome.
pub fn scan_file(
    path: &Utf8Path,
    patterns: &PatternSet,
    max_size: u64,
    encoding: &'static Encoding,
) -> FileOutcome {
    match classify(path, max_size) {
        FileVerdict::Scan => {}
        FileVerdict::TooLarge { size, max } => {
            return FileOutcome::Skipped(format!("file too large ({} > {} bytes)", size, max));
        }
        FileVerdict::NotText => return FileOutcome::Skipped("not a text file".to_string()),
        FileVerdict::Unreadable(e) => return FileOutcome::Failed(e),
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return FileOutcome::Failed(e.to_string()),
    };

    match decode(&bytes, encoding) {
        Ok(text) => FileOutcome::Scanned(extract_matches(path.as_str(), &text, patterns)),
        Err(e) => FileOutcome::Failed(e),
    }
}

/// Files below `dir` that pass [`should_scan`], in sorted walk order.
///
/// Eligible files whose path is not valid UTF-8 are reported as skipped.
pub fn candidate_files(dir: &Utf8Path, observer: &dyn ScanObserver) -> Vec<Utf8PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Error walking {}: {}", dir, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| should_scan(&entry.file_name().to_string_lossy()))
        .filter_map(|entry| match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(path) => Some(path),
            Err(path) => {
                emit(
                    observer,
                    ScanEvent::FileSkipped {
                        path: Utf8PathBuf::from(path.to_string_lossy().into_owned()),
                        reason: "path is not valid UTF-8".to_string(),
                    },
                );
                None
            }
        })
        .collect()
}

/// Scans mods with a fixed pattern set and read policy.
pub struct Extractor {
    patterns: PatternSet,
    max_size: u64,
    encoding: &'static Encoding,
    pool: Option<rayon::ThreadPool>,
}

impl Extractor {
    /// `concurrency > 1` scans the files of each mod on a pool of that many threads.
    pub fn new(
        patterns: PatternSet,
        max_size: u64,
        encoding: &'static Encoding,
        concurrency: usize,
    ) -> Self {
        let pool = if concurrency > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(concurrency)
                .thread_name(|i| format!("keyscan-worker-{}", i))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    tracing::warn!("Could not start worker pool, scanning sequentially: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            patterns,
            max_size,
            encoding,
            pool,
        }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    fn scan_one(&self, path: &Utf8Path, ctx: &ScanContext<'_>) -> Vec<RawMatch> {
        if ctx.is_cancelled() {
            return Vec::new();
        }

        match scan_file(path, &self.patterns, self.max_size, self.encoding) {
            FileOutcome::Scanned(matches) => {
                emit(
                    ctx,
                    ScanEvent::FileScanned {
                        path: path.to_path_buf(),
                        matches: matches.len(),
                    },
                );
                matches
            }
            FileOutcome::Skipped(reason) => {
                emit(
                    ctx,
                    ScanEvent::FileSkipped {
                        path: path.to_path_buf(),
                        reason,
                    },
                );
                Vec::new()
            }
            FileOutcome::Failed(error) => {
                emit(
                    ctx,
                    ScanEvent::FileFailed {
                        path: path.to_path_buf(),
                        error,
                    },
                );
                Vec::new()
            }
        }
    }

    /// Scan every eligible file of a mod and stamp the matches with the mod's name
    /// and status.
    ///
    /// Output order is the walk order whether or not the pool is used.
    pub fn scan_mod(&self, record: &ModRecord, ctx: &ScanContext<'_>) -> Vec<RawMatch> {
        let started = Instant::now();
        let files = candidate_files(&record.path, ctx);
        tracing::debug!("{}: {} candidate files", record.display_name, files.len());

        let per_file: Vec<Vec<RawMatch>> = match &self.pool {
            Some(pool) => pool.install(|| {
                files
                    .par_iter()
                    .map(|path| self.scan_one(path, ctx))
                    .collect()
            }),
            None => files.iter().map(|path| self.scan_one(path, ctx)).collect(),
        };

        ctx.metrics().record_extraction_time(started.elapsed());

        per_file
            .into_iter()
            .flatten()
            .map(|raw| raw.with_mod(record))
            .collect()
    }
}
