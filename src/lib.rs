// KeyScan - keybind conflict scanner for Teardown mod collections
//
// This is the library crate containing the scan pipeline and data structures.
// The binary crate (main.rs) provides the batch command-line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{MergedRecord, ModRecord, RawMatch, ScanResult, ScanSettings, ScannerConfig};
pub use services::{ConfigurationError, KeybindScanner, OutputFormat, SinkError};
pub use state::{NullObserver, ScanEvent, ScanObserver, ScanStateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
