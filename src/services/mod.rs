//! Services module - the scan-and-aggregate pipeline.
//!
//! Everything here is plain synchronous business logic with no knowledge of any
//! front-end. Progress and diagnostics leave the pipeline only through a
//! [`ScanObserver`](crate::state::ScanObserver).
//!
//! # Components
//!
//! In dependency order:
//!
//! - [`patterns`]: compiles the extraction rules (built-in or user supplied)
//! - [`classifier`]: picks files by name and rejects oversized or binary content
//! - [`mod_resolver`]: turns scan roots into mod directories and display names
//! - [`status`]: reads the enablement manifest
//! - [`extraction`]: walks a mod and produces [`RawMatch`](crate::models::RawMatch)es
//! - [`aggregator`]: merges matches per mod, then groups them per key
//! - [`sink`]: writes `keybinds.json` / `keybinds.csv`
//! - [`scanner`]: [`KeybindScanner`] ties the stages together
//!
//! # Usage Example
//!
//! ```ignore
//! use keyscan::services::{KeybindScanner, OutputFormat, write_results};
//! use keyscan::state::NullObserver;
//!
//! let scanner = KeybindScanner::new(&settings)?;
//! let result = scanner.scan_directories(&roots, &NullObserver, None);
//!
//! for conflict in result.conflicts() {
//!     println!("{}: {}", conflict.key_name, conflict.mods.join(", "));
//! }
//!
//! write_results(&result, "output".into(), &[OutputFormat::Json])?;
//! ```
//!
//! # Errors
//!
//! Only [`ConfigurationError`] (before a scan) and [`SinkError`] (while saving) are
//! returned to the caller. File, directory and manifest problems are logged, reported
//! to the observer and otherwise absorbed.

pub mod aggregator;
pub mod classifier;
pub mod error;
pub mod extraction;
pub mod mod_resolver;
pub mod patterns;
pub mod scanner;
pub mod sink;
pub mod status;

pub use aggregator::{aggregate, is_conflict, merge_by_mod};
pub use classifier::{is_text, should_scan};
pub use error::{ConfigurationError, SinkError};
pub use extraction::{FileOutcome, resolve_encoding, scan_file};
pub use mod_resolver::{extract_display_name, resolve_mod_dirs};
pub use patterns::{DEFAULT_PATTERNS, ExtractionPattern, PatternSet};
pub use scanner::KeybindScanner;
pub use sink::{OutputFormat, parse_formats, write_results};
pub use status::{StatusMap, load_manifest, resolve_statuses};
