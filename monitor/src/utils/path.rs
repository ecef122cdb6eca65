//! Path helpers for sentinel file locations.
//!
//! Sentinel paths come from configuration and usually start with `~`, so
//! they are expanded against the home directory and normalized lexically
//! before any file system call sees them.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use cursor_helper::utils::path::{expand_home_with, normalize_lexically};
//!
//! let expanded = expand_home_with("~/.cursor-notify.flag", Path::new("/home/ann"));
//! assert_eq!(expanded, Path::new("/home/ann/.cursor-notify.flag"));
//!
//! let normalized = normalize_lexically(Path::new("/tmp/./a/../flag"));
//! assert_eq!(normalized, Path::new("/tmp/flag"));
//! ```

use std::path::{Component, Path, PathBuf};

use directories::BaseDirs;

/// Expands a leading `~` using the current user's home directory.
///
/// Paths without a leading `~` are returned unchanged. If the home directory
/// cannot be determined the path is returned as given.
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    match BaseDirs::new() {
        Some(dirs) => expand_home_with(path, dirs.home_dir()),
        None => PathBuf::from(path),
    }
}

/// Expands a leading `~` against an explicit home directory.
#[must_use]
pub fn expand_home_with(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }

    match path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("~\\"))
    {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Collapses `.` and `..` components without touching the file system.
///
/// A `..` that would climb above the root (or above the start of a relative
/// path) is kept for relative paths and dropped for absolute ones.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// Anchors a relative path at the current directory, then normalizes it.
///
/// If the current directory cannot be read the path stays relative.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    let anchored = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_lexically(&anchored)
}

/// Expands `~`, anchors relative paths at the current directory and
/// normalizes the result.
///
/// This is the form every sentinel path is stored in.
#[must_use]
pub fn normalize_path(path: &str) -> PathBuf {
    absolutize(&expand_home(path.trim()))
}
