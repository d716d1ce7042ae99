//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Defaults for missing files and missing fields
//! - Loaded settings driving a scanner
//! - Configuration errors surfacing before any scan

use camino::Utf8PathBuf;
use keyscan::config::CONFIG_FILE_NAME;
use keyscan::models::DEFAULT_MAX_FILE_SIZE;
use keyscan::services::{OutputFormat, parse_formats};
use keyscan::{ConfigManager, ConfigurationError, KeybindScanner, ScannerConfig};
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(manager.config_path(), config_path.join(CONFIG_FILE_NAME));
}

#[test]
fn test_load_default_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = manager.load_config().unwrap();

    assert!(config.scan.roots.is_empty());
    assert!(config.scan.patterns.is_none());
    assert_eq!(config.scan.max_file_size, DEFAULT_MAX_FILE_SIZE);
    assert_eq!(config.scan.concurrency, 4);
    assert_eq!(config.output.directory, "output");
    assert_eq!(config.output.formats, vec!["json".to_string()]);
    assert_eq!(config.log_dir, "logs");
    assert!(!config.debug_mode);
}

#[test]
fn test_hand_written_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    fs::write(
        config_path.join(CONFIG_FILE_NAME),
        r#"
scan:
  roots:
    - "C:/Games/Teardown/mods"
  patterns:
    - 'InputPressed\("(\w+)"\)'
  case_insensitive: true
  max_file_size: 4096
  encoding: windows-1252
  status_manifest: "C:/Users/me/Documents/Teardown/mods.xml"
output:
  formats: [json, csv]
debug_mode: true
"#,
    )
    .unwrap();

    let manager = ConfigManager::new(&config_path).unwrap();
    let config = manager.load_config().unwrap();

    assert_eq!(config.scan.roots.len(), 1);
    assert!(config.scan.case_insensitive);
    assert!(!config.scan.whole_word);
    assert_eq!(config.scan.max_file_size, 4096);
    assert_eq!(config.scan.encoding, "windows-1252");
    assert!(config.scan.status_manifest.is_some());
    assert_eq!(config.output.directory, "output");
    assert!(config.debug_mode);

    let formats = parse_formats(&config.output.formats).unwrap();
    assert_eq!(formats, vec![OutputFormat::Json, OutputFormat::Csv]);

    let scanner = KeybindScanner::new(&config.scan).unwrap();
    assert_eq!(scanner.patterns().len(), 1);
}

#[test]
fn test_save_and_reload() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = ScannerConfig::default();
    config.scan.roots = vec!["mods".to_string(), "more mods".to_string()];
    config.scan.dry_run = true;
    config.log_json = true;
    manager.save_config(&config).unwrap();

    let reloaded = ConfigManager::new(&config_path).unwrap().load_config().unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn test_invalid_settings_are_configuration_errors() {
    let mut config = ScannerConfig::default();
    config.scan.patterns = Some(vec!["Input(Pressed|Down)\\(\"(\\w+)\"\\)".to_string()]);
    assert!(matches!(
        KeybindScanner::new(&config.scan),
        Err(ConfigurationError::WrongCaptureGroupCount { found: 2, .. })
    ));

    config.output.formats = vec!["json".to_string(), "yaml".to_string()];
    let err = parse_formats(&config.output.formats).unwrap_err();
    assert!(err.to_string().contains("yaml"));
}

#[test]
fn test_malformed_config_file_is_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    fs::write(config_path.join(CONFIG_FILE_NAME), "scan:\n  max_file_size: lots\n").unwrap();

    let manager = ConfigManager::new(&config_path).unwrap();
    assert!(manager.load_config().is_err());
}
