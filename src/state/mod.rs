// Scan state and diagnostics
//
// The pipeline reports everything it does as a ScanEvent. Every event is logged
// through tracing and then handed to a ScanObserver supplied by the caller, so a
// front-end can follow progress without the core knowing anything about it.

use crate::metrics::ScanMetrics;
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, watch};

/// Diagnostic and progress events emitted during a scan.
#[derive(Clone, Debug, PartialEq)]
pub enum ScanEvent {
    /// A scan has started over these roots
    ScanStarted { roots: Vec<Utf8PathBuf> },

    /// A mod directory was resolved
    ModResolved {
        path: Utf8PathBuf,
        name: String,
        enabled: bool,
    },

    /// A root or subdirectory was not scanned
    DirectorySkipped { path: Utf8PathBuf, reason: String },

    /// A file was scanned successfully
    FileScanned { path: Utf8PathBuf, matches: usize },

    /// A file was passed over (too large, not text)
    FileSkipped { path: Utf8PathBuf, reason: String },

    /// A file could not be read or decoded
    FileFailed { path: Utf8PathBuf, error: String },

    /// The status manifest could not be used; all mods count as enabled
    ManifestFailed { path: Utf8PathBuf, error: String },

    /// The scan completed
    ScanFinished {
        files: usize,
        matches: usize,
        unique_keys: usize,
    },

    /// The scan stopped early on request
    ScanCancelled,
}

/// Receives scan events. Implemented by front-ends; the core never installs one.
pub trait ScanObserver: Send + Sync {
    fn on_event(&self, event: &ScanEvent);
}

impl<T: ScanObserver + ?Sized> ScanObserver for Arc<T> {
    fn on_event(&self, event: &ScanEvent) {
        (**self).on_event(event)
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ScanObserver for NullObserver {
    fn on_event(&self, _event: &ScanEvent) {}
}

/// Log an event at the level matching its severity.
pub fn log_event(event: &ScanEvent) {
    match event {
        ScanEvent::ScanStarted { roots } => {
            tracing::info!("Scanning {} root directories", roots.len());
        }
        ScanEvent::ModResolved {
            path,
            name,
            enabled,
        } => {
            tracing::info!(
                "Resolved mod '{}' at {} ({})",
                name,
                path,
                if *enabled { "enabled" } else { "disabled" }
            );
        }
        ScanEvent::DirectorySkipped { path, reason } => {
            tracing::warn!("Skipping directory {}: {}", path, reason);
        }
        ScanEvent::FileScanned { path, matches } => {
            tracing::debug!("Scanned {}: {} matches", path, matches);
        }
        ScanEvent::FileSkipped { path, reason } => {
            tracing::warn!("Skipping {}: {}", path, reason);
        }
        ScanEvent::FileFailed { path, error } => {
            tracing::error!("Error scanning {}: {}", path, error);
        }
        ScanEvent::ManifestFailed { path, error } => {
            tracing::error!(
                "Status manifest {} unusable, treating all mods as enabled: {}",
                path,
                error
            );
        }
        ScanEvent::ScanFinished {
            files,
            matches,
            unique_keys,
        } => {
            tracing::info!(
                "Scan finished: {} files, {} matches, {} unique keybinds",
                files,
                matches,
                unique_keys
            );
        }
        ScanEvent::ScanCancelled => {
            tracing::warn!("Scan cancelled, results are partial");
        }
    }
}

/// Log an event, then pass it to the observer.
pub fn emit(observer: &dyn ScanObserver, event: ScanEvent) {
    log_event(&event);
    observer.on_event(&event);
}

/// Everything a running scan reports to: the caller's observer, the scan metrics and
/// an optional cancellation signal.
///
/// `ScanContext` is itself an observer, so pipeline stages only ever see one
/// `&dyn ScanObserver`.
pub struct ScanContext<'a> {
    observer: &'a dyn ScanObserver,
    metrics: &'a ScanMetrics,
    cancel: Option<&'a watch::Receiver<bool>>,
}

impl<'a> ScanContext<'a> {
    pub fn new(
        observer: &'a dyn ScanObserver,
        metrics: &'a ScanMetrics,
        cancel: Option<&'a watch::Receiver<bool>>,
    ) -> Self {
        Self {
            observer,
            metrics,
            cancel,
        }
    }

    pub fn metrics(&self) -> &ScanMetrics {
        self.metrics
    }

    /// True once the caller has sent `true` on the cancellation channel.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|rx| *rx.borrow())
    }
}

impl ScanObserver for ScanContext<'_> {
    fn on_event(&self, event: &ScanEvent) {
        self.metrics.record_event(event);
        self.observer.on_event(event);
    }
}

/// Phase of the current scan
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanPhase {
    #[default]
    Idle,
    Scanning,
    Finished,
    Cancelled,
}

/// Snapshot of scan progress kept by [`ScanStateManager`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanState {
    pub phase: ScanPhase,
    pub roots: Vec<Utf8PathBuf>,
    pub mods: Vec<String>,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub matches_found: usize,
    pub directories_skipped: usize,
    pub manifest_error: Option<String>,
}

impl ScanState {
    fn apply(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::ScanStarted { roots } => {
                *self = ScanState {
                    phase: ScanPhase::Scanning,
                    roots: roots.clone(),
                    ..ScanState::default()
                };
            }
            ScanEvent::ModResolved { name, .. } => self.mods.push(name.clone()),
            ScanEvent::DirectorySkipped { .. } => self.directories_skipped += 1,
            ScanEvent::FileScanned { matches, .. } => {
                self.files_scanned += 1;
                self.matches_found += matches;
            }
            ScanEvent::FileSkipped { .. } => self.files_skipped += 1,
            ScanEvent::FileFailed { .. } => self.files_failed += 1,
            ScanEvent::ManifestFailed { error, .. } => {
                self.manifest_error = Some(error.clone());
            }
            ScanEvent::ScanFinished { .. } => self.phase = ScanPhase::Finished,
            ScanEvent::ScanCancelled => self.phase = ScanPhase::Cancelled,
        }
    }
}

/// Thread-safe scan progress tracker that re-broadcasts events.
///
/// Front-ends register this as the scan observer, then either poll
/// [`snapshot()`](Self::snapshot) or [`subscribe()`](Self::subscribe) to the event
/// stream. Sends on the broadcast channel never block; lagging receivers lose the
/// oldest events.
#[derive(Clone)]
pub struct ScanStateManager {
    state: Arc<RwLock<ScanState>>,
    event_tx: broadcast::Sender<ScanEvent>,
}

impl ScanStateManager {
    /// Create a manager with a broadcast buffer of 100 events
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(ScanState::default())),
            event_tx,
        }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> ScanState {
        self.read(|state| state.clone())
    }

    /// Run `f` with read access to the state.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ScanState) -> R,
    {
        let state = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&state)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for ScanStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanObserver for ScanStateManager {
    fn on_event(&self, event: &ScanEvent) {
        {
            let mut state = self
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state.apply(event);
        }

        // No subscribers is fine
        let _ = self.event_tx.send(event.clone());
    }
}
