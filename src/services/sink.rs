//! Result sink: writes a [`ScanResult`] as `keybinds.json` and/or `keybinds.csv`.

use super::error::{ConfigurationError, SinkError};
use crate::models::{RAW_MATCH_FIELDS, ScanResult};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::str::FromStr;

pub const JSON_FILE_NAME: &str = "keybinds.json";
pub const CSV_FILE_NAME: &str = "keybinds.csv";

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            OutputFormat::Json => JSON_FILE_NAME,
            OutputFormat::Csv => CSV_FILE_NAME,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(ConfigurationError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a list of format names, dropping duplicates. An empty list is an error.
pub fn parse_formats<S: AsRef<str>>(names: &[S]) -> Result<Vec<OutputFormat>, ConfigurationError> {
    let mut formats = Vec::new();
    for name in names {
        let format: OutputFormat = name.as_ref().parse()?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }

    if formats.is_empty() {
        return Err(ConfigurationError::NoFormats);
    }
    Ok(formats)
}

fn create_file(path: &Utf8Path) -> Result<BufWriter<File>, SinkError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| SinkError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the whole result as pretty-printed JSON.
pub fn write_json(result: &ScanResult, path: &Utf8Path) -> Result<(), SinkError> {
    let mut writer = create_file(path)?;
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush().map_err(|source| SinkError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write one row per raw match. With no matches the file holds only the header.
pub fn write_csv(result: &ScanResult, path: &Utf8Path) -> Result<(), SinkError> {
    let mut writer = csv::Writer::from_writer(create_file(path)?);

    if result.raw_matches.is_empty() {
        writer.write_record(RAW_MATCH_FIELDS)?;
    } else {
        for raw in &result.raw_matches {
            writer.serialize(raw)?;
        }
    }

    writer.flush().map_err(|source| SinkError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `result` into `output_dir` in every requested format, creating the
/// directory if needed. Returns the written paths in format order.
pub fn write_results(
    result: &ScanResult,
    output_dir: &Utf8Path,
    formats: &[OutputFormat],
) -> Result<Vec<Utf8PathBuf>, SinkError> {
    fs::create_dir_all(output_dir).map_err(|source| SinkError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = output_dir.join(format.file_name());
        match format {
            OutputFormat::Json => write_json(result, &path)?,
            OutputFormat::Csv => write_csv(result, &path)?,
        }
        tracing::info!("Saved {} results to {}", format, path);
        written.push(path);
    }

    Ok(written)
}
