//! Data models for the keybind scanner.
//!
//! - [`RawMatch`]: one lexical occurrence of a keybind call in a file
//! - [`MergedRecord`]: all occurrences of one key inside one mod, folded together
//! - [`ModRecord`]: a resolved mod directory with its display name and status
//! - [`ScanResult`]: the aggregate artifact written by the result sink
//! - [`ScannerConfig`]: settings loaded from `Scanner Config.yaml`
//!
//! Scan models serialize with the exact field names of `keybinds.json`.

pub mod config;
pub mod scan;

pub use config::{DEFAULT_MAX_FILE_SIZE, OutputSettings, ScanSettings, ScannerConfig};
pub use scan::{
    Aggregated, CONTEXT_SEPARATOR, JOIN_SEPARATOR, KeyConflict, LineNumbers, MergedRecord,
    ModRecord, ModSummary, RAW_MATCH_FIELDS, RawMatch, ScanResult, distinct_mods,
};
