use camino::Utf8PathBuf;
use thiserror::Error;

/// Problems with the scan configuration, reported before any scanning starts.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Extraction pattern #{index} `{pattern}` is not a valid regular expression: {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(
        "Extraction pattern #{index} `{pattern}` must have exactly one capture group for the key name (found {found})"
    )]
    WrongCaptureGroupCount {
        index: usize,
        pattern: String,
        found: usize,
    },

    #[error("Unsupported output format: {0} (expected json or csv)")]
    UnsupportedFormat(String),

    #[error("No output formats selected")]
    NoFormats,

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),
}

/// Failures while writing results. The computed scan result stays valid.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),
}
