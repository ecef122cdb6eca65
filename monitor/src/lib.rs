//! cursor-helper - alerts and prompt templates for an AI coding assistant.
//!
//! This crate watches sentinel files the assistant writes at well-known
//! moments (end of turn, context nearly full, about to ask for an edit) and
//! alerts the user, and it keeps a small library of reusable prompt
//! templates with `{{name:description:default}}` placeholders.
//!
//! # Overview
//!
//! Each sentinel gets its own [`SentinelWatcher`]. Bursts of writes are
//! debounced into a single [`WatchEvent`], which is handed to an
//! [`ActivityHandler`]; the `watch` command uses an [`Alerter`].
//!
//! Templates live in a [`TemplateStore`] that persists the whole collection
//! through a [`persistence::KeyValueStore`].
//!
//! # Modules
//!
//! - [`types`]: Sentinel kinds, watch events and payload parsing
//! - [`watcher`]: Debounced sentinel file watcher
//! - [`alert`]: Notifications and sounds for watch events
//! - [`rules`]: Setup rules that make the assistant write sentinels
//! - [`templates`]: Template records, placeholder engine and store
//! - [`persistence`]: Key-value storage for the template library
//! - [`config`]: Configuration from environment variables
//! - [`error`]: Error types
//! - [`utils`]: Shared utilities (debouncing, paths)

pub mod alert;
pub mod config;
pub mod error;
pub mod persistence;
pub mod rules;
pub mod templates;
pub mod types;
pub mod utils;
pub mod watcher;

pub use alert::{Alerter, ConsoleNotifier, Notifier, SoundPlayer};
pub use config::Config;
pub use error::{HelperError, Result};
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore};
pub use templates::{
    extract_variables, substitute_variables, NewTemplate, Placeholder, Template,
    TemplateCategory, TemplateStore, TemplateUpdate,
};
pub use types::{SentinelKind, WatchEvent};
pub use utils::{Debouncer, DebouncerError, DEFAULT_DEBOUNCE_MS};
pub use watcher::{ActivityHandler, SentinelWatcher, WatchConfig, WatcherError};
