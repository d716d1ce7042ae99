//! KeyScan - keybind conflict scanner for Teardown mod collections
//!
//! Main entry point for the batch scanner.
//!
//! # Execution Flow
//!
//! 1. Parse the command line and load `KeyScan Data/Scanner Config.yaml`
//! 2. Apply command-line overrides on top of the loaded settings
//! 3. Initialize logging → logs/keyscan.<date>
//! 4. Validate patterns, encoding and output formats (fails before any scanning)
//! 5. Run the scan on a blocking thread; Ctrl-C cancels it between files
//! 6. Write `keybinds.json` / `keybinds.csv` and print the summary
//!
//! Command-line roots and flags take precedence over the configuration file.
//! `--save-config` writes the merged settings back for the next run.

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use keyscan::config::DEFAULT_CONFIG_DIR;
use keyscan::models::{ScanResult, ScannerConfig};
use keyscan::services::{KeybindScanner, parse_formats, write_results};
use keyscan::state::ScanStateManager;
use keyscan::{APP_NAME, ConfigManager, VERSION, logging};
use tokio::sync::watch;

/// Scan Teardown mods for keybinds and report keys claimed by more than one mod.
#[derive(Parser, Debug)]
#[command(name = "keyscan", version, about)]
struct Args {
    /// Mod directories or folders of mods to scan
    roots: Vec<Utf8PathBuf>,

    /// Directory holding Scanner Config.yaml
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: Utf8PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// Output formats (json, csv); repeat the flag or separate with commas
    #[arg(short, long = "format", value_name = "FORMAT", value_delimiter = ',')]
    formats: Vec<String>,

    /// Custom extraction pattern with one capture group for the key name (repeatable)
    #[arg(short, long = "pattern", value_name = "REGEX")]
    patterns: Vec<String>,

    /// Case-insensitive matching
    #[arg(short = 'i', long)]
    case_insensitive: bool,

    /// Whole-word matching
    #[arg(short, long)]
    whole_word: bool,

    /// Maximum file size in bytes
    #[arg(short = 's', long)]
    max_file_size: Option<u64>,

    /// Worker threads for file scanning
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Text encoding of mod files
    #[arg(short, long)]
    encoding: Option<String>,

    /// Mod status manifest (XML)
    #[arg(short, long)]
    manifest: Option<Utf8PathBuf>,

    /// Resolve mods without scanning files or writing output
    #[arg(short, long)]
    dry_run: bool,

    /// Debug-level logging, echoed to the console
    #[arg(short, long)]
    verbose: bool,

    /// Save the effective settings to the config file
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn apply_to(&self, config: &mut ScannerConfig) {
        let scan = &mut config.scan;
        if !self.roots.is_empty() {
            scan.roots = self.roots.iter().map(|p| p.to_string()).collect();
        }
        if !self.patterns.is_empty() {
            scan.patterns = Some(self.patterns.clone());
        }
        scan.case_insensitive |= self.case_insensitive;
        scan.whole_word |= self.whole_word;
        scan.dry_run |= self.dry_run;
        if let Some(max_file_size) = self.max_file_size {
            scan.max_file_size = max_file_size;
        }
        if let Some(concurrency) = self.concurrency {
            scan.concurrency = concurrency;
        }
        if let Some(encoding) = &self.encoding {
            scan.encoding = encoding.clone();
        }
        if let Some(manifest) = &self.manifest {
            scan.status_manifest = Some(manifest.to_string());
        }

        if let Some(output) = &self.output {
            config.output.directory = output.to_string();
        }
        if !self.formats.is_empty() {
            config.output.formats = self.formats.clone();
        }
        config.debug_mode |= self.verbose;
    }
}

fn print_mods(result: &ScanResult) {
    println!("Resolved {} mods:", result.mod_info.len());
    for (path, summary) in &result.mod_info {
        let status = if summary.enabled { "enabled" } else { "disabled" };
        println!("  {} ({}) - {}", summary.name, status, path);
    }
}

async fn run(args: Args, config_manager: ConfigManager, config: ScannerConfig) -> Result<()> {
    let formats = parse_formats(&config.output.formats)?;
    let scanner = KeybindScanner::new(&config.scan)?;

    let roots: Vec<Utf8PathBuf> = config.scan.roots.iter().map(Utf8PathBuf::from).collect();
    if roots.is_empty() {
        bail!(
            "No directories to scan: pass them on the command line or set scan.roots in {}",
            config_manager.config_path()
        );
    }

    if args.save_config {
        config_manager.save_config(&config)?;
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current file");
            let _ = cancel_tx.send(true);
        }
    });

    let state = ScanStateManager::new();
    let observer = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        scanner.scan_directories(&roots, &observer, Some(&cancel_rx))
    })
    .await
    .context("Scan task failed")?;

    let progress = state.snapshot();
    if config.scan.dry_run {
        print_mods(&result);
    } else {
        let output_dir = Utf8PathBuf::from(&config.output.directory);
        for path in write_results(&result, &output_dir, &formats)? {
            println!("Wrote {}", path);
        }
    }

    print!("{}", result.summary());
    if progress.files_skipped > 0 || progress.files_failed > 0 {
        println!(
            "Skipped {} files, {} could not be read (see the log for details)",
            progress.files_skipped, progress.files_failed
        );
    }
    if let Some(error) = progress.manifest_error {
        println!("Status manifest ignored: {}", error);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = ConfigManager::new(&args.config_dir)?;
    let mut config = config_manager.load_config()?;
    args.apply_to(&mut config);

    let _guard = logging::setup_logging_with_console(
        &config.log_dir,
        APP_NAME,
        config.debug_mode,
        args.verbose,
        config.log_json,
    )?;

    // Config was loaded before the subscriber was installed
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if config_manager.config_exists() {
        tracing::info!("Loaded scanner config from {}", config_manager.config_path());
    } else {
        tracing::warn!(
            "Scanner config file not found at {}, using defaults",
            config_manager.config_path()
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("keyscan-runtime")
        .build()
        .context("Failed to start the async runtime")?;

    let result = runtime.block_on(run(args, config_manager, config));
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));
    tracing::info!("Shutdown complete");

    result
}
