use serde::{Deserialize, Serialize};

/// Default cap on the size of a scanned file (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Scanner configuration from `Scanner Config.yaml`
///
/// Every field carries a serde default so partially written files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Write log files as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan: ScanSettings::default(),
            output: OutputSettings::default(),
            debug_mode: false,
            log_dir: default_log_dir(),
            log_json: false,
        }
    }
}

/// Options that drive discovery and extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Root directories; each is either a mod or a container of mods
    #[serde(default)]
    pub roots: Vec<String>,

    /// Custom extraction patterns; `None` selects the built-in input calls
    #[serde(default)]
    pub patterns: Option<Vec<String>>,

    #[serde(default)]
    pub case_insensitive: bool,

    #[serde(default)]
    pub whole_word: bool,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Mods XML with `<mod id=".." active=".."/>` entries
    #[serde(default)]
    pub status_manifest: Option<String>,

    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            patterns: None,
            case_insensitive: false,
            whole_word: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            concurrency: default_concurrency(),
            encoding: default_encoding(),
            status_manifest: None,
            dry_run: false,
        }
    }
}

/// Where and how results are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_dir")]
    pub directory: String,

    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            formats: default_formats(),
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_concurrency() -> usize {
    4
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_formats() -> Vec<String> {
    vec!["json".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_settings_defaults() {
        let settings = ScanSettings::default();
        assert_eq!(settings.max_file_size, 10 * 1024 * 1024);
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.encoding, "utf-8");
        assert!(settings.patterns.is_none());
        assert!(!settings.case_insensitive);
        assert!(!settings.whole_word);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "scan:\n  roots: [\"mods\"]\n  whole_word: true\n";
        let config: ScannerConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(config.scan.roots, vec!["mods".to_string()]);
        assert!(config.scan.whole_word);
        assert_eq!(config.scan.encoding, "utf-8");
        assert_eq!(config.output.formats, vec!["json".to_string()]);
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config: ScannerConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config, ScannerConfig::default());
        assert_eq!(config.log_dir, "logs");
    }
}
