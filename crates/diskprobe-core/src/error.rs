//! Error types for scanning operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a scan.
///
/// Per-directory and per-entry I/O failures are expected on any large tree
/// and are *not* represented here; they increment
/// [`ScanStats::access_errors`](crate::ScanStats) while the walk continues.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root path does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Root path exists but is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Root path could not be inspected.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cancel predicate fired; no snapshot is produced.
    #[error("Scan cancelled: {path}")]
    Cancelled { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context, classifying common kinds.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}
