//! File classification: which files belong to a mod's scan set, and which of those
//! are safe to read as text.
//!
//! Name matching is case-insensitive. Content sniffing fails closed: anything that
//! cannot be read is treated as binary.

use camino::Utf8Path;
use mime_guess::mime;
use std::fs::File;
use std::io::Read;

/// Extension of Teardown's script files.
pub const SCRIPT_EXTENSION: &str = "lua";

/// Per-mod metadata file.
pub const METADATA_FILE: &str = "info.txt";

/// Number of leading bytes inspected for NUL bytes.
pub const SNIFF_LEN: usize = 1024;

/// Application subtypes that are still plain text.
const TEXTUAL_APPLICATION_SUBTYPES: &[&str] = &[
    "json",
    "xml",
    "javascript",
    "x-javascript",
    "x-sh",
    "x-lua",
    "toml",
    "x-toml",
    "yaml",
    "x-yaml",
];

/// Outcome of gating a candidate file before it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileVerdict {
    Scan,
    TooLarge { size: u64, max: u64 },
    NotText,
    Unreadable(String),
}

/// True for `main.lua`, `options.lua`, `info.txt` and any name starting with `readme`.
pub fn should_scan(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower == format!("main.{}", SCRIPT_EXTENSION)
        || lower == format!("options.{}", SCRIPT_EXTENSION)
        || lower == METADATA_FILE
        || is_readme(&lower)
}

/// True for readme-like files (`README`, `readme.md`, `ReadMe.txt`, ...).
pub fn is_readme(file_name: &str) -> bool {
    file_name
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("readme"))
}

pub fn is_metadata_file(file_name: &str) -> bool {
    file_name.eq_ignore_ascii_case(METADATA_FILE)
}

/// True when the extension maps to a MIME type that is clearly not text.
///
/// Unknown extensions and files without one are left to content sniffing.
pub fn is_known_binary_type(path: &Utf8Path) -> bool {
    match mime_guess::from_path(path.as_std_path()).first() {
        Some(guess) => !is_textual_mime(&guess),
        None => false,
    }
}

fn is_textual_mime(guess: &mime::Mime) -> bool {
    if guess.type_() == mime::TEXT {
        return true;
    }
    if guess.type_() != mime::APPLICATION {
        return false;
    }
    if matches!(guess.suffix(), Some(suffix) if suffix == mime::JSON || suffix == mime::XML) {
        return true;
    }
    TEXTUAL_APPLICATION_SUBTYPES.contains(&guess.subtype().as_str())
}

/// Decide whether `path` holds text: MIME guess first, then a NUL-byte sniff of the
/// first [`SNIFF_LEN`] bytes. Read errors count as binary.
pub fn is_text(path: &Utf8Path) -> bool {
    if is_known_binary_type(path) {
        return false;
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("Cannot open {} for sniffing: {}", path, e);
            return false;
        }
    };

    let mut head = Vec::with_capacity(SNIFF_LEN);
    if let Err(e) = file.take(SNIFF_LEN as u64).read_to_end(&mut head) {
        tracing::debug!("Cannot sniff {}: {}", path, e);
        return false;
    }

    !head.contains(&0)
}

/// Apply the size gate and the text gate, in that order.
pub fn classify(path: &Utf8Path, max_size: u64) -> FileVerdict {
    let size = match path.metadata() {
        Ok(metadata) => metadata.len(),
        Err(e) => return FileVerdict::Unreadable(e.to_string()),
    };

    if size > max_size {
        return FileVerdict::TooLarge {
            size,
            max: max_size,
        };
    }

    if !is_text(path) {
        return FileVerdict::NotText;
    }

    FileVerdict::Scan
}
