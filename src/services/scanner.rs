//! [`KeybindScanner`]: runs the pipeline from scan roots to a [`ScanResult`].
//!
//! All configuration is validated in [`KeybindScanner::new`], so a scanner that exists
//! can always run. The scan itself is synchronous; callers that need responsiveness
//! run it on a blocking thread and cancel through a `watch` channel.

use super::aggregator::aggregate;
use super::error::ConfigurationError;
use super::extraction::{Extractor, resolve_encoding};
use super::mod_resolver::{build_mod_record, resolve_mod_dirs};
use super::patterns::PatternSet;
use super::status::resolve_statuses;
use crate::metrics::ScanMetrics;
use crate::models::{ModRecord, RawMatch, ScanResult, ScanSettings};
use crate::state::{ScanContext, ScanEvent, ScanObserver, emit};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use tokio::sync::watch;

pub struct KeybindScanner {
    settings: ScanSettings,
    extractor: Extractor,
}

impl KeybindScanner {
    /// Compile the patterns and resolve the encoding.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] naming the first invalid pattern, or the
    /// unknown encoding label.
    pub fn new(settings: &ScanSettings) -> Result<Self, ConfigurationError> {
        let patterns = PatternSet::compile(
            settings.patterns.as_deref(),
            settings.case_insensitive,
            settings.whole_word,
        )?;
        let encoding = resolve_encoding(&settings.encoding)?;

        tracing::debug!(
            "Scanner ready: {} patterns, encoding {}, max file size {} bytes, concurrency {}",
            patterns.len(),
            encoding.name(),
            settings.max_file_size,
            settings.concurrency
        );

        Ok(Self {
            settings: settings.clone(),
            extractor: Extractor::new(
                patterns,
                settings.max_file_size,
                encoding,
                settings.concurrency,
            ),
        })
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn patterns(&self) -> &PatternSet {
        self.extractor.patterns()
    }

    /// Resolve mod directories and their names and statuses without scanning.
    pub fn resolve_mods(&self, roots: &[Utf8PathBuf], observer: &dyn ScanObserver) -> Vec<ModRecord> {
        let manifest = self.settings.status_manifest.as_deref().map(Utf8Path::new);
        let statuses = resolve_statuses(manifest, observer);

        let encoding = self.extractor.encoding();

        resolve_mod_dirs(roots, observer)
            .iter()
            .map(|dir| {
                let record = build_mod_record(dir, &statuses, encoding);
                emit(
                    observer,
                    ScanEvent::ModResolved {
                        path: record.path.clone(),
                        name: record.display_name.clone(),
                        enabled: record.enabled,
                    },
                );
                record
            })
            .collect()
    }

    /// Scan `roots` and aggregate the findings.
    ///
    /// Per-file and per-directory problems are reported to `observer` and never abort
    /// the scan. When `cancel` flips to `true` the scan stops between files and the
    /// result covers what was scanned so far. With `dry_run` set, mods are resolved
    /// and listed in `mod_info` but no file is read.
    pub fn scan_directories(
        &self,
        roots: &[Utf8PathBuf],
        observer: &dyn ScanObserver,
        cancel: Option<&watch::Receiver<bool>>,
    ) -> ScanResult {
        let metrics = ScanMetrics::new();
        let ctx = ScanContext::new(observer, &metrics, cancel);

        emit(
            &ctx,
            ScanEvent::ScanStarted {
                roots: roots.to_vec(),
            },
        );

        let mods = self.resolve_mods(roots, &ctx);
        let mod_info = mods
            .iter()
            .map(|record| (record.path.to_string(), record.summary()))
            .collect();

        let mut raw_matches: Vec<RawMatch> = Vec::new();
        if self.settings.dry_run {
            tracing::info!("Dry run: {} mods resolved, skipping extraction", mods.len());
        } else {
            for record in &mods {
                if ctx.is_cancelled() {
                    break;
                }
                tracing::info!("Scanning mod '{}' at {}", record.display_name, record.path);
                raw_matches.extend(self.extractor.scan_mod(record, &ctx));
            }
        }

        let aggregated = aggregate(&raw_matches);
        let total_files_scanned = raw_matches
            .iter()
            .map(|raw| raw.file_path.as_str())
            .collect::<HashSet<_>>()
            .len();

        let result = ScanResult {
            total_matches: raw_matches.len(),
            total_files_scanned,
            raw_matches,
            aggregated,
            mod_info,
        };

        if ctx.is_cancelled() {
            emit(&ctx, ScanEvent::ScanCancelled);
        } else {
            emit(
                &ctx,
                ScanEvent::ScanFinished {
                    files: result.total_files_scanned,
                    matches: result.total_matches,
                    unique_keys: result.unique_keybinds(),
                },
            );
        }
        metrics.log_summary();

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NullObserver;
    use mockall::mock;
    use std::fs;
    use tempfile::TempDir;

    mock! {
        pub Observer {}

        impl ScanObserver for Observer {
            fn on_event(&self, event: &ScanEvent);
        }
    }

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, root)
    }

    fn write_mod(root: &Utf8Path, name: &str, script: &str) -> Utf8PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.lua"), script).unwrap();
        dir
    }

    #[test]
    fn test_invalid_configuration_fails_before_scanning() {
        let settings = ScanSettings {
            patterns: Some(vec!["(unclosed".to_string()]),
            ..ScanSettings::default()
        };
        assert!(matches!(
            KeybindScanner::new(&settings),
            Err(ConfigurationError::InvalidPattern { index: 0, .. })
        ));

        let settings = ScanSettings {
            encoding: "no-such-encoding".to_string(),
            ..ScanSettings::default()
        };
        assert!(matches!(
            KeybindScanner::new(&settings),
            Err(ConfigurationError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_zero_mods_is_empty_result() {
        let (_tmp, root) = temp_root();
        let scanner = KeybindScanner::new(&ScanSettings::default()).unwrap();
        let result = scanner.scan_directories(&[root], &NullObserver, None);
        assert_eq!(result, ScanResult::default());
    }

    #[test]
    fn test_observer_sees_lifecycle() {
        let (_tmp, root) = temp_root();
        write_mod(&root, "ModA", "InputPressed(\"a\")\n");
        write_mod(&root, "ModB", "InputDown(\"b\")\n");

        let mut observer = MockObserver::new();
        observer
            .expect_on_event()
            .withf(|e| matches!(e, ScanEvent::ScanStarted { roots } if roots.len() == 1))
            .times(1)
            .return_const(());
        observer
            .expect_on_event()
            .withf(|e| matches!(e, ScanEvent::ModResolved { enabled: true, .. }))
            .times(2)
            .return_const(());
        observer
            .expect_on_event()
            .withf(|e| matches!(e, ScanEvent::FileScanned { matches: 1, .. }))
            .times(2)
            .return_const(());
        observer
            .expect_on_event()
            .withf(|e| {
                matches!(
                    e,
                    ScanEvent::ScanFinished {
                        files: 2,
                        matches: 2,
                        unique_keys: 2
                    }
                )
            })
            .times(1)
            .return_const(());

        let scanner = KeybindScanner::new(&ScanSettings::default()).unwrap();
        scanner.scan_directories(&[root], &observer, None);
    }

    #[test]
    fn test_dry_run_resolves_without_reading() {
        let (_tmp, root) = temp_root();
        let dir = write_mod(&root, "ModA", "InputPressed(\"a\")\n");

        let settings = ScanSettings {
            dry_run: true,
            ..ScanSettings::default()
        };
        let scanner = KeybindScanner::new(&settings).unwrap();
        let result = scanner.scan_directories(&[root], &NullObserver, None);

        assert!(result.raw_matches.is_empty());
        assert_eq!(result.mod_info.len(), 1);
        assert_eq!(result.mod_info[dir.as_str()].name, "ModA");
    }

    #[test]
    fn test_cancelled_scan_is_partial() {
        let (_tmp, root) = temp_root();
        write_mod(&root, "ModA", "InputPressed(\"a\")\n");

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let mut observer = MockObserver::new();
        observer
            .expect_on_event()
            .withf(|e| matches!(e, ScanEvent::ScanCancelled))
            .times(1)
            .return_const(());
        observer
            .expect_on_event()
            .withf(|e| {
                !matches!(
                    e,
                    ScanEvent::ScanCancelled
                        | ScanEvent::ScanFinished { .. }
                        | ScanEvent::FileScanned { .. }
                )
            })
            .return_const(());

        let scanner = KeybindScanner::new(&ScanSettings::default()).unwrap();
        let result = scanner.scan_directories(&[root], &observer, Some(&rx));

        assert_eq!(result.total_matches, 0);
        assert_eq!(result.mod_info.len(), 1);
    }
}
