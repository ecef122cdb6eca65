//! Configuration module for cursor-helper.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CURSOR_HELPER_FLAG_FILE` | `~/.cursor-notify.flag` | Task completion sentinel |
//! | `CURSOR_HELPER_MESSAGE` | `Cursor task complete` | Task completion message |
//! | `CURSOR_HELPER_PLAY_SOUND` | `true` | Play a sound with each alert |
//! | `CURSOR_HELPER_SOUND_PATH` | - | Custom sound file |
//! | `CURSOR_HELPER_DEBOUNCE_MS` | 500 | Quiet period shared by all watchers |
//! | `CURSOR_HELPER_LOGGING` | `false` | Default log level `debug` instead of `info` |
//! | `CURSOR_HELPER_CONTEXT_ENABLED` | `false` | Watch the context alert sentinel |
//! | `CURSOR_HELPER_CONTEXT_FLAG_FILE` | `~/.cursor-context-alert.flag` | Context alert sentinel |
//! | `CURSOR_HELPER_CONTEXT_MESSAGE` | `Context window is nearing capacity` | Context alert message |
//! | `CURSOR_HELPER_CONTEXT_THRESHOLD` | 80 | Percentage quoted in the context rule (1-100) |
//! | `CURSOR_HELPER_CONFIRM_ENABLED` | `false` | Watch the file confirmation sentinel |
//! | `CURSOR_HELPER_CONFIRM_FLAG_FILE` | `~/.cursor-file-confirm.flag` | File confirmation sentinel |
//! | `CURSOR_HELPER_CONFIRM_MESSAGE` | `Cursor is asking to edit a file` | File confirmation message |
//! | `CURSOR_HELPER_TEMPLATES_ENABLED` | `true` | Allow `templates` commands |
//! | `CURSOR_HELPER_TEMPLATES_IN_PALETTE` | `true` | Mention templates in the `--help` hint |
//! | `CURSOR_HELPER_RECENT_TEMPLATES` | 5 | Default count for `templates recent` |
//! | `CURSOR_HELPER_DATA_DIR` | `~/.cursor-helper` | Template library directory |
//!
//! Booleans accept `true/false`, `1/0`, `yes/no` and `on/off`.
//!
//! # Example
//!
//! ```no_run
//! use cursor_helper::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Task sentinel: {}", config.task.flag_file.display());
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use thiserror::Error;

use crate::types::SentinelKind;
use crate::utils::debounce::DEFAULT_DEBOUNCE_MS;
use crate::utils::path::{absolutize, expand_home_with};
use crate::watcher::WatchConfig;

/// Default task completion message.
const DEFAULT_TASK_MESSAGE: &str = "Cursor task complete";

/// Default context alert message.
const DEFAULT_CONTEXT_MESSAGE: &str = "Context window is nearing capacity";

/// Default file confirmation message.
const DEFAULT_CONFIRM_MESSAGE: &str = "Cursor is asking to edit a file";

/// Default context threshold percentage.
const DEFAULT_CONTEXT_THRESHOLD: u8 = 80;

/// Default number of templates listed by `templates recent`.
const DEFAULT_RECENT_TEMPLATES: usize = 5;

/// Default data directory name relative to home.
const DEFAULT_DATA_DIR: &str = ".cursor-helper";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Settings for one sentinel watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelSettings {
    /// Whether `watch` starts this watcher.
    pub enabled: bool,

    /// Absolute, normalized sentinel path.
    pub flag_file: PathBuf,

    /// Text shown when the sentinel fires.
    pub message: String,
}

/// Settings for the template commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSettings {
    /// Whether `templates` subcommands run at all.
    pub enabled: bool,

    /// Whether the `--help` hint mentions template commands.
    pub show_in_palette: bool,

    /// Default count for `templates recent`. Always greater than 0.
    pub recent_count: usize,
}

/// Configuration for cursor-helper.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Task completion watcher. Always enabled.
    pub task: SentinelSettings,

    /// Context capacity watcher.
    pub context: SentinelSettings,

    /// File confirmation watcher.
    pub confirmation: SentinelSettings,

    /// Percentage quoted in the context rule. Never evaluated at runtime.
    pub context_threshold: u8,

    /// Whether alerts play a sound.
    pub play_sound: bool,

    /// Custom sound file. `None` uses the platform default.
    pub sound_path: Option<PathBuf>,

    /// Quiet period shared by every watcher.
    pub debounce: Duration,

    /// Verbose logging.
    pub logging: bool,

    /// Template command settings.
    pub templates: TemplateSettings,

    /// Directory holding the persisted template library.
    pub data_dir: PathBuf,

    /// Home directory paths were resolved against.
    pub home_dir: PathBuf,
}

impl Config {
    /// Creates a configuration with every default, resolving paths against `home`.
    #[must_use]
    pub fn with_home(home: &Path) -> Self {
        let sentinel = |kind: SentinelKind, enabled: bool, message: &str| SentinelSettings {
            enabled,
            flag_file: resolve_path(kind.default_flag_file(), home),
            message: message.to_string(),
        };

        Self {
            task: sentinel(SentinelKind::Task, true, DEFAULT_TASK_MESSAGE),
            context: sentinel(SentinelKind::Context, false, DEFAULT_CONTEXT_MESSAGE),
            confirmation: sentinel(SentinelKind::Confirmation, false, DEFAULT_CONFIRM_MESSAGE),
            context_threshold: DEFAULT_CONTEXT_THRESHOLD,
            play_sound: true,
            sound_path: None,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            logging: false,
            templates: TemplateSettings {
                enabled: true,
                show_in_palette: true,
                recent_count: DEFAULT_RECENT_TEMPLATES,
            },
            data_dir: home.join(DEFAULT_DATA_DIR),
            home_dir: home.to_path_buf(),
        }
    }

    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - The home directory cannot be determined (needed for default paths)
    /// - A boolean variable is not one of the accepted spellings
    /// - `CURSOR_HELPER_DEBOUNCE_MS` is not a non-negative integer
    /// - `CURSOR_HELPER_CONTEXT_THRESHOLD` is outside 1-100
    /// - `CURSOR_HELPER_RECENT_TEMPLATES` is not a positive integer
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cursor_helper::config::Config;
    ///
    /// std::env::set_var("CURSOR_HELPER_CONTEXT_ENABLED", "true");
    /// let config = Config::from_env().unwrap();
    /// assert!(config.context.enabled);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
        let home_dir = base_dirs.home_dir();
        let mut config = Self::with_home(home_dir);

        // Task watcher
        if let Some(path) = env_string("CURSOR_HELPER_FLAG_FILE") {
            config.task.flag_file = resolve_path(&path, home_dir);
        }
        if let Some(message) = env_string("CURSOR_HELPER_MESSAGE") {
            config.task.message = message;
        }

        // Sound
        if let Some(play) = env_bool("CURSOR_HELPER_PLAY_SOUND")? {
            config.play_sound = play;
        }
        config.sound_path =
            env_string("CURSOR_HELPER_SOUND_PATH").map(|path| resolve_path(&path, home_dir));

        // Optional: CURSOR_HELPER_DEBOUNCE_MS (default: 500)
        if let Some(val) = env_string("CURSOR_HELPER_DEBOUNCE_MS") {
            let ms = val
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "CURSOR_HELPER_DEBOUNCE_MS".to_string(),
                    message: format!("expected non-negative integer, got '{val}'"),
                })?;
            config.debounce = Duration::from_millis(ms);
        }

        if let Some(logging) = env_bool("CURSOR_HELPER_LOGGING")? {
            config.logging = logging;
        }

        // Context watcher
        if let Some(enabled) = env_bool("CURSOR_HELPER_CONTEXT_ENABLED")? {
            config.context.enabled = enabled;
        }
        if let Some(path) = env_string("CURSOR_HELPER_CONTEXT_FLAG_FILE") {
            config.context.flag_file = resolve_path(&path, home_dir);
        }
        if let Some(message) = env_string("CURSOR_HELPER_CONTEXT_MESSAGE") {
            config.context.message = message;
        }

        // Optional: CURSOR_HELPER_CONTEXT_THRESHOLD (default: 80, must be 1-100)
        if let Some(val) = env_string("CURSOR_HELPER_CONTEXT_THRESHOLD") {
            let threshold = val
                .parse::<u8>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "CURSOR_HELPER_CONTEXT_THRESHOLD".to_string(),
                    message: format!("expected integer 1-100, got '{val}'"),
                })?;
            if !(1..=100).contains(&threshold) {
                return Err(ConfigError::InvalidValue {
                    key: "CURSOR_HELPER_CONTEXT_THRESHOLD".to_string(),
                    message: format!("threshold must be between 1 and 100, got {threshold}"),
                });
            }
            config.context_threshold = threshold;
        }

        // Confirmation watcher
        if let Some(enabled) = env_bool("CURSOR_HELPER_CONFIRM_ENABLED")? {
            config.confirmation.enabled = enabled;
        }
        if let Some(path) = env_string("CURSOR_HELPER_CONFIRM_FLAG_FILE") {
            config.confirmation.flag_file = resolve_path(&path, home_dir);
        }
        if let Some(message) = env_string("CURSOR_HELPER_CONFIRM_MESSAGE") {
            config.confirmation.message = message;
        }

        // Templates
        if let Some(enabled) = env_bool("CURSOR_HELPER_TEMPLATES_ENABLED")? {
            config.templates.enabled = enabled;
        }
        if let Some(show) = env_bool("CURSOR_HELPER_TEMPLATES_IN_PALETTE")? {
            config.templates.show_in_palette = show;
        }

        // Optional: CURSOR_HELPER_RECENT_TEMPLATES (default: 5, must be > 0)
        if let Some(val) = env_string("CURSOR_HELPER_RECENT_TEMPLATES") {
            let count = val
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "CURSOR_HELPER_RECENT_TEMPLATES".to_string(),
                    message: format!("expected positive integer, got '{val}'"),
                })?;
            if count == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "CURSOR_HELPER_RECENT_TEMPLATES".to_string(),
                    message: "recent template count must be greater than 0".to_string(),
                });
            }
            config.templates.recent_count = count;
        }

        if let Some(dir) = env_string("CURSOR_HELPER_DATA_DIR") {
            config.data_dir = resolve_path(&dir, home_dir);
        }

        Ok(config)
    }

    /// Settings for the watcher of `kind`.
    #[must_use]
    pub fn sentinel(&self, kind: SentinelKind) -> &SentinelSettings {
        match kind {
            SentinelKind::Task => &self.task,
            SentinelKind::Context => &self.context,
            SentinelKind::Confirmation => &self.confirmation,
        }
    }

    /// Watch configuration for the watcher of `kind`.
    #[must_use]
    pub fn watch_config(&self, kind: SentinelKind) -> WatchConfig {
        WatchConfig::from_path(self.sentinel(kind).flag_file.clone(), self.debounce)
    }

    /// Kinds whose watcher is enabled, in start order.
    #[must_use]
    pub fn enabled_kinds(&self) -> Vec<SentinelKind> {
        SentinelKind::ALL
            .into_iter()
            .filter(|kind| self.sentinel(*kind).enabled)
            .collect()
    }
}

/// Reads a variable, treating unset and blank values the same.
fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads a boolean variable. Unset or blank yields `None`.
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    let Some(val) = env_string(key) else {
        return Ok(None);
    };

    match val.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected true/false, got '{val}'"),
        }),
    }
}

fn resolve_path(path: &str, home: &Path) -> PathBuf {
    absolutize(&expand_home_with(path, home))
}
