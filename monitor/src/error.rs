//! Error types for cursor-helper.
//!
//! Each module has its own error enum; [`HelperError`] rolls them up for
//! callers that drive several modules at once, like the CLI.

use thiserror::Error;

use crate::alert::AlertError;
use crate::config::ConfigError;
use crate::persistence::PersistenceError;
use crate::templates::StoreError;
use crate::watcher::WatcherError;

/// Errors that can occur during cursor-helper operations.
///
/// # Examples
///
/// ```
/// use cursor_helper::error::{HelperError, Result};
/// use cursor_helper::templates::StoreError;
///
/// fn find(id: &str) -> Result<()> {
///     Err(StoreError::NotFound(id.to_string()).into())
/// }
///
/// let err = find("tpl_x").unwrap_err();
/// assert_eq!(err.to_string(), "template store error: template not found: tpl_x");
/// ```
#[derive(Error, Debug)]
pub enum HelperError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A watcher could not be started.
    #[error("file watch error: {0}")]
    Watch(#[from] WatcherError),

    /// Template store operation failed.
    #[error("template store error: {0}")]
    Store(#[from] StoreError),

    /// Reading or writing persisted values failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Presenting an alert failed.
    #[error("alert error: {0}")]
    Alert(#[from] AlertError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for cursor-helper operations.
pub type Result<T> = std::result::Result<T, HelperError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn config_error_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            key: "CURSOR_HELPER_DEBOUNCE_MS".to_string(),
            message: "expected non-negative integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for CURSOR_HELPER_DEBOUNCE_MS: expected non-negative integer"
        );
    }

    #[test]
    fn helper_error_config_display() {
        let err: HelperError = ConfigError::NoHomeDirectory.into();
        assert_eq!(
            err.to_string(),
            "configuration error: failed to determine home directory"
        );
    }

    #[test]
    fn helper_error_store_not_found_display() {
        let err: HelperError = StoreError::NotFound("tpl_abc".to_string()).into();
        assert!(matches!(err, HelperError::Store(StoreError::NotFound(ref id)) if id == "tpl_abc"));
        assert_eq!(err.to_string(), "template store error: template not found: tpl_abc");
    }

    #[test]
    fn helper_error_watch_display() {
        let err: HelperError = WatcherError::InvalidPath(PathBuf::from("/")).into();
        assert!(matches!(err, HelperError::Watch(_)));
        assert!(err.to_string().starts_with("file watch error:"));
    }

    #[test]
    fn helper_error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HelperError = io_err.into();
        assert!(matches!(err, HelperError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn helper_error_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let err: HelperError = json_err.into();
        assert!(matches!(err, HelperError::Json(_)));
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn persistence_error_keeps_source_chain() {
        use std::error::Error;

        let persistence = PersistenceError::Io {
            path: PathBuf::from("/data/x.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert!(persistence.source().is_some());

        let err: HelperError = persistence.into();
        assert!(err.to_string().contains("/data/x.json"));
    }

    #[test]
    fn result_type_alias_works() {
        fn example_function() -> Result<i32> {
            Ok(42)
        }

        fn example_error_function() -> Result<i32> {
            Err(HelperError::Config(ConfigError::NoHomeDirectory))
        }

        assert!(example_function().is_ok());
        assert!(example_error_function().is_err());
    }
}
