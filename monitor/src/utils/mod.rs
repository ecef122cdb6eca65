//! Utility modules for cursor-helper.
//!
//! # Modules
//!
//! - [`debounce`]: Trailing-edge debouncing of bursty notifications
//! - [`path`]: Home expansion and lexical normalization of sentinel paths

pub mod debounce;
pub mod path;

pub use debounce::{DebounceInput, Debouncer, DebouncerError, DEFAULT_DEBOUNCE_MS};
pub use path::{expand_home, normalize_path};
