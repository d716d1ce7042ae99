use crate::models::ScannerConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Directory holding the scanner's configuration when none is given.
pub const DEFAULT_CONFIG_DIR: &str = "KeyScan Data";

/// File name of the scanner configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "Scanner Config.yaml";

/// Configuration manager for loading and saving the YAML scanner configuration.
///
/// Manages a single file, `Scanner Config.yaml`, holding scan settings, output
/// settings and logging options.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing the configuration file (e.g., "KeyScan Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the scanner configuration.
    ///
    /// # Returns
    /// The loaded ScannerConfig, or default if the file doesn't exist
    pub fn load_config(&self) -> Result<ScannerConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Scanner config file not found at {}, using defaults",
                self.config_path
            );
            return Ok(ScannerConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read scanner config: {}", self.config_path))?;

        let config: ScannerConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse scanner config: {}", self.config_path))?;

        tracing::info!("Loaded scanner config from {}", self.config_path);
        Ok(config)
    }

    /// Save the scanner configuration.
    pub fn save_config(&self, config: &ScannerConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize scanner config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write scanner config: {}", self.config_path))?;

        tracing::info!("Saved scanner config to {}", self.config_path);
        Ok(())
    }

    /// Whether the configuration file exists on disk.
    pub fn config_exists(&self) -> bool {
        self.config_path.is_file()
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
