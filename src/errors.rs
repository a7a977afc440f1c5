//! Error types for the car-manifest crate.
//!
//! This module defines a unified error enumeration used across page directory
//! resolution, metadata (de)serialization, entry streaming and graphsplit
//! parsing. It integrates with `thiserror` to provide rich `Display`
//! implementations and error source chaining where applicable.
//!
//! Notes:
//! - `NotFound` is kept apart from `IOError` so callers can treat a missing
//!   graphsplit file as "no correlation data" while a missing page is fatal.
//! - Malformed rows carry the 1-based line number of the offending row.

use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
/// Unified error enumeration for the manifest subsystem.
pub enum ManifestError {
    /// Page directory, metadata, entries or graphsplit file is absent.
    #[error("The `{}` does not exist.", .0.display())]
    NotFound(PathBuf),

    /// Row of `entries.csv` that cannot be decoded.
    #[error("Malformed entry at line {line}: {reason}")]
    MalformedEntry { line: usize, reason: String },

    /// Row of a graphsplit `manifest.csv` that cannot be decoded.
    #[error("Malformed graphsplit row at line {line}: {reason}")]
    MalformedGraphsplit { line: usize, reason: String },

    /// Text that is not a valid content identifier.
    #[error("The `{0}` is not a valid content identifier.")]
    InvalidContentId(String),

    /// Entry that cannot be written as an `entries.csv` row.
    #[error("Entry `{name}` cannot be written: {reason}")]
    InvalidEntry { name: String, reason: String },

    /// `metadata.json` is not valid JSON or has the wrong shape.
    #[error("Invalid page metadata: {0}")]
    InvalidMetadata(String),

    /// A scanned line exceeds the configured maximum.
    #[error("Line {line} exceeds the maximum scan size of {max} bytes")]
    LineTooLong { line: usize, max: usize },

    /// Entries requested from a page that was never read from disk.
    #[error("Manifest page `{0}` has no entries file on disk")]
    Unpersisted(String),

    /// I/O error from underlying reader or writer.
    #[error("IO Error: {0}")]
    IOError(#[from] io::Error),

    /// A spawned reader task panicked or was aborted.
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl ManifestError {
    /// Whether the error means "the thing is not there", as opposed to
    /// "the thing is there but broken".
    pub fn is_not_found(&self) -> bool {
        match self {
            ManifestError::NotFound(_) => true,
            ManifestError::IOError(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Map an I/O error on `path` to `NotFound` when the path is missing.
    pub(crate) fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            ManifestError::NotFound(path.into())
        } else {
            ManifestError::IOError(err)
        }
    }

    pub(crate) fn malformed_entry(line: usize, reason: impl Into<String>) -> Self {
        ManifestError::MalformedEntry {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_entry(name: &str, reason: impl Into<String>) -> Self {
        ManifestError::InvalidEntry {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_graphsplit(line: usize, reason: impl Into<String>) -> Self {
        ManifestError::MalformedGraphsplit {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let err = ManifestError::from_io(
            "/nowhere/manifest.csv",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert!(matches!(err, ManifestError::NotFound(_)));

        let err = ManifestError::from_io(
            "/nowhere/manifest.csv",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
        assert!(matches!(err, ManifestError::IOError(_)));
    }

    #[test]
    fn test_malformed_display() {
        let err = ManifestError::malformed_entry(3, "invalid size `abc`");
        assert_eq!(
            err.to_string(),
            "Malformed entry at line 3: invalid size `abc`"
        );
    }
}
