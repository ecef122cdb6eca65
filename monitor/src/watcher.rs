//! Sentinel file watcher.
//!
//! A sentinel is a file whose modification, not its content, signals that
//! something happened on the assistant's side. [`SentinelWatcher`] turns the
//! raw, bursty notification stream for one sentinel into at most one
//! [`WatchEvent`] per burst.
//!
//! # Architecture
//!
//! ```text
//! notify thread ──filter by name──▶ Debouncer ──quiet period──▶ dispatch task ──▶ handler
//! ```
//!
//! - The parent directory is observed, not the file itself. Writers that
//!   replace the file through a rename are missed by some backends when the
//!   leaf is watched directly.
//! - The notify callback only does a non-blocking send into the debouncer.
//! - The dispatch task reads the sentinel and invokes the handler on the
//!   blocking pool, so a slow or panicking handler never stalls or kills the
//!   watcher.
//!
//! The same type serves every [`SentinelKind`]; only the path, debounce and
//! kind differ between instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use cursor_helper::types::{SentinelKind, WatchEvent};
//! use cursor_helper::watcher::{SentinelWatcher, WatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WatchConfig::new("~/.cursor-notify.flag", Duration::from_millis(500));
//!     let mut watcher = SentinelWatcher::new(SentinelKind::Task, config, |event: WatchEvent| {
//!         println!("{} at {}", event.source, event.timestamp);
//!     });
//!
//!     watcher.start()?;
//!     tokio::signal::ctrl_c().await?;
//!     watcher.stop();
//!     Ok(())
//! }
//! ```

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::Map;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::types::{parse_payload, SentinelKind, WatchEvent};
use crate::utils::debounce::{DebounceInput, Debouncer};
use crate::utils::path::normalize_path;

/// Capacity of the channel between the debouncer and the dispatch task.
const FIRE_CAPACITY: usize = 16;

/// Errors that can occur while starting a sentinel watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to initialize or attach the file system watcher.
    #[error("failed to create watcher: {0}")]
    WatcherInit(#[from] notify::Error),

    /// Failed to create the sentinel file or its parent directory.
    #[error("failed to prepare {}: {source}", .path.display())]
    Prepare {
        /// The path that could not be created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The sentinel path has no file name or no parent directory.
    #[error("invalid sentinel path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// `start` was called outside a Tokio runtime.
    #[error("sentinel watcher must be started inside a Tokio runtime")]
    NoRuntime,
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Receives debounced sentinel activity.
///
/// Implemented for any `Fn(WatchEvent) + Send + Sync`. The handler runs on
/// Tokio's blocking pool, one event at a time per watcher.
pub trait ActivityHandler: Send + Sync + 'static {
    /// Called once per debounce window.
    fn on_activity(&self, event: WatchEvent);
}

impl<F> ActivityHandler for F
where
    F: Fn(WatchEvent) + Send + Sync + 'static,
{
    fn on_activity(&self, event: WatchEvent) {
        self(event)
    }
}

/// Identifies one monitored sentinel file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    /// Absolute, normalized sentinel path.
    pub path: PathBuf,
    /// Trailing-edge quiet period.
    pub debounce: Duration,
}

impl WatchConfig {
    /// Creates a config, expanding `~` and normalizing the path.
    #[must_use]
    pub fn new(path: &str, debounce: Duration) -> Self {
        Self {
            path: normalize_path(path),
            debounce,
        }
    }

    /// Creates a config from a path that is already absolute and normalized.
    #[must_use]
    pub fn from_path(path: PathBuf, debounce: Duration) -> Self {
        Self { path, debounce }
    }
}

/// Resources that exist only while the watcher is active.
///
/// Dropping it ends the dispatch task, releases the notify watch and discards
/// a pending debounce window.
struct ActiveWatch {
    _watcher: RecommendedWatcher,
    _debouncer: Debouncer<()>,
    dispatch: JoinHandle<()>,
}

impl Drop for ActiveWatch {
    fn drop(&mut self) {
        self.dispatch.abort();
    }
}

/// Watches one sentinel file and reports debounced activity.
///
/// Two states: stopped (no observation, no pending timer) and active. The
/// watcher starts stopped.
pub struct SentinelWatcher {
    kind: SentinelKind,
    config: WatchConfig,
    handler: Arc<dyn ActivityHandler>,
    active: Option<ActiveWatch>,
}

impl fmt::Debug for SentinelWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentinelWatcher")
            .field("kind", &self.kind)
            .field("config", &self.config)
            .field("active", &self.active.is_some())
            .finish()
    }
}

impl SentinelWatcher {
    /// Creates a stopped watcher.
    pub fn new<H>(kind: SentinelKind, config: WatchConfig, handler: H) -> Self
    where
        H: ActivityHandler,
    {
        Self::with_shared_handler(kind, config, Arc::new(handler))
    }

    /// Creates a stopped watcher that shares its handler with other watchers.
    #[must_use]
    pub fn with_shared_handler(
        kind: SentinelKind,
        config: WatchConfig,
        handler: Arc<dyn ActivityHandler>,
    ) -> Self {
        Self {
            kind,
            config,
            handler,
            active: None,
        }
    }

    /// Which sentinel this watcher reports on.
    #[must_use]
    pub fn kind(&self) -> SentinelKind {
        self.kind
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Whether the watcher is observing its sentinel.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Starts observing the sentinel.
    ///
    /// Creates the parent directory and the sentinel file if they are
    /// missing, then observes the parent directory. Calling this on an
    /// active watcher logs a warning and does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::NoRuntime`] when called outside a Tokio
    /// runtime, or an error if the sentinel or its directory cannot be
    /// created or the directory cannot be observed. The watcher stays stopped.
    pub fn start(&mut self) -> Result<()> {
        if self.active.is_some() {
            warn!(kind = %self.kind, "Sentinel watcher already active");
            return Ok(());
        }

        if tokio::runtime::Handle::try_current().is_err() {
            return Err(WatcherError::NoRuntime);
        }

        let path = self.config.path.clone();
        let (parent, file_name) = split_sentinel_path(&path)?;

        ensure_sentinel_file(&path, parent)?;

        info!(
            kind = %self.kind,
            path = %path.display(),
            debounce_ms = self.config.debounce.as_millis(),
            "Starting sentinel watcher"
        );
        debug!(dir = %parent.display(), file = ?file_name, "Watching parent directory");

        let (fire_tx, fire_rx) = mpsc::channel::<()>(FIRE_CAPACITY);
        let debouncer = Debouncer::new(self.config.debounce, fire_tx);

        let watcher = create_watcher(parent, file_name, debouncer.input())?;

        let kind = self.kind;
        let handler = Arc::clone(&self.handler);
        let dispatch = tokio::spawn(async move {
            run_dispatch(kind, path, fire_rx, handler).await;
        });

        self.active = Some(ActiveWatch {
            _watcher: watcher,
            _debouncer: debouncer,
            dispatch,
        });

        info!(kind = %self.kind, "Sentinel watcher started");
        Ok(())
    }

    /// Stops observing and discards any pending debounce window.
    ///
    /// Does nothing when already stopped.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            info!(kind = %self.kind, "Stopping sentinel watcher");
            drop(active);
            info!(kind = %self.kind, "Sentinel watcher stopped");
        }
    }

    /// Points the watcher at a different sentinel file.
    ///
    /// An active watcher is restarted so the new path takes effect
    /// immediately; a stopped one only records the path.
    ///
    /// # Errors
    ///
    /// Returns the restart error if the new sentinel cannot be prepared or
    /// observed. The watcher is stopped in that case.
    pub fn update_flag_file(&mut self, new_path: &str) -> Result<()> {
        let path = normalize_path(new_path);
        info!(kind = %self.kind, path = %path.display(), "Updating sentinel path");
        self.reconfigure(|config| config.path = path)
    }

    /// Changes the debounce window.
    ///
    /// Same restart rules as [`update_flag_file`](Self::update_flag_file).
    ///
    /// # Errors
    ///
    /// Returns the restart error if the watcher was active and cannot start again.
    pub fn update_debounce(&mut self, debounce: Duration) -> Result<()> {
        debug!(
            kind = %self.kind,
            debounce_ms = debounce.as_millis(),
            "Updating debounce window"
        );
        self.reconfigure(|config| config.debounce = debounce)
    }

    fn reconfigure(&mut self, apply: impl FnOnce(&mut WatchConfig)) -> Result<()> {
        let was_active = self.is_active();
        if was_active {
            self.stop();
        }

        apply(&mut self.config);

        if was_active {
            self.start()?;
        }
        Ok(())
    }
}

impl Drop for SentinelWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Splits a sentinel path into its parent directory and file name.
fn split_sentinel_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| WatcherError::InvalidPath(path.to_path_buf()))?;
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| WatcherError::InvalidPath(path.to_path_buf()))?;
    Ok((parent, file_name))
}

/// Creates the parent directory and a placeholder sentinel if missing.
///
/// The directory watch needs a stable target to attach to.
fn ensure_sentinel_file(path: &Path, parent: &Path) -> Result<()> {
    if !parent.exists() {
        info!(dir = %parent.display(), "Creating sentinel directory");
        fs::create_dir_all(parent).map_err(|source| WatcherError::Prepare {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if path.exists() {
        debug!(path = %path.display(), "Sentinel file already exists");
        return Ok(());
    }

    info!(path = %path.display(), "Creating sentinel file");
    let placeholder = format!("Created by cursor-helper on {}\n", Utc::now().to_rfc3339());
    fs::write(path, placeholder).map_err(|source| WatcherError::Prepare {
        path: path.to_path_buf(),
        source,
    })
}

/// Creates the notify watcher on `dir`, forwarding matching events.
fn create_watcher(
    dir: &Path,
    file_name: &std::ffi::OsStr,
    input: DebounceInput<()>,
) -> Result<RecommendedWatcher> {
    let target = file_name.to_os_string();

    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            handle_notify_event(res, &target, &input);
        },
        Config::default(),
    )?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    Ok(watcher)
}

/// Filters raw notify events down to the sentinel and feeds the debouncer.
///
/// Runs on notify's thread; must never block.
fn handle_notify_event(
    res: std::result::Result<Event, notify::Error>,
    target: &OsString,
    input: &DebounceInput<()>,
) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "Sentinel watcher error");
            return;
        }
    };

    if !is_relevant(&event, target) {
        trace!(kind = ?event.kind, paths = ?event.paths, "Ignoring unrelated event");
        return;
    }

    debug!(kind = ?event.kind, file = ?target, "Sentinel change detected");
    if !input.try_send(()) {
        warn!("Failed to queue sentinel change, debouncer busy or stopped");
    }
}

/// Whether a raw event touches the sentinel in a way that counts as activity.
///
/// Access events are ignored: reading the sentinel when the window fires
/// must not open a new window.
fn is_relevant(event: &Event, target: &OsString) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }

    event
        .paths
        .iter()
        .any(|p| p.file_name().is_some_and(|name| name == target.as_os_str()))
}

/// Receives debounce firings and hands events to the handler.
async fn run_dispatch(
    kind: SentinelKind,
    path: PathBuf,
    mut fire_rx: mpsc::Receiver<()>,
    handler: Arc<dyn ActivityHandler>,
) {
    while fire_rx.recv().await.is_some() {
        debug!(kind = %kind, "Debounced sentinel activity");

        let handler = Arc::clone(&handler);
        let path = path.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let event = build_event(kind, &path);
            handler.on_activity(event);
        })
        .await;

        if let Err(e) = outcome {
            if e.is_panic() {
                error!(kind = %kind, "Activity handler panicked, watcher keeps running");
            }
        }
    }

    debug!(kind = %kind, "Dispatch task shutting down");
}

/// Reads the sentinel and builds the event for one debounce window.
///
/// A read failure is logged and produces an empty payload so the user is
/// still notified.
fn build_event(kind: SentinelKind, path: &Path) -> WatchEvent {
    let payload = match fs::read_to_string(path) {
        Ok(content) => parse_payload(&content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read sentinel content");
            Map::new()
        }
    };

    WatchEvent::new(kind, path.to_path_buf(), payload)
}
