//! Error and warning types for tree assembly and scanning.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::element::NodeId;

/// Errors raised by the element arena: linking, lookups and size queries.
///
/// These are usage errors, never I/O errors, and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Size was read before it was computed (unaggregated directory or
    /// a filename with no file attached).
    #[error("Size not computed yet: {path}")]
    NotComputed { path: PathBuf },

    /// A directory query was made on a non-directory element.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The requested parent cannot hold the child.
    #[error("Cannot attach children to {path}")]
    NotAContainer { path: PathBuf },

    /// The parent already has a child of that name.
    #[error("{parent} already contains an entry named {name:?}")]
    DuplicateName { parent: PathBuf, name: String },

    /// A file with the same identity is already registered in this root.
    #[error("File identity already registered: {path}")]
    DuplicateIdentity { path: PathBuf },

    /// Linking would make an element its own ancestor.
    #[error("Linking {path} would create a cycle")]
    Cycle { path: PathBuf },

    /// The root directory cannot be given a parent.
    #[error("The root directory cannot have a parent")]
    RootHasNoParent,

    /// A filename can reference only one file.
    #[error("Filename already has a file attached: {path}")]
    FilenameOccupied { path: PathBuf },

    /// Handle does not belong to this root.
    #[error("Unknown node {id:?}")]
    UnknownNode { id: NodeId },
}

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Tree assembly failed while scanning.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Device node, socket, fifo or anything else the model has no kind for.
    UnsupportedKind,
    /// Entry disappeared between listing and stat.
    Vanished,
    /// Error reading a directory (kept going).
    ReadError,
    /// Filesystem boundary crossed (when not allowed).
    CrossFilesystem,
}

/// Non-fatal warning encountered during scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create an unsupported entry kind warning.
    pub fn unsupported(path: impl Into<PathBuf>, file_type: &str) -> Self {
        let path = path.into();
        Self {
            message: format!("Skipped unsupported {file_type}: {}", path.display()),
            path,
            kind: WarningKind::UnsupportedKind,
        }
    }

    /// Create a warning for an entry that vanished mid-scan.
    pub fn vanished(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Vanished during scan: {}", path.display()),
            path,
            kind: WarningKind::Vanished,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Read error at {}: {error}", path.display()),
            path,
            kind: WarningKind::ReadError,
        }
    }

    /// Create a filesystem boundary warning.
    pub fn cross_filesystem(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Not crossing filesystem boundary: {}", path.display()),
            path,
            kind: WarningKind::CrossFilesystem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        );
        assert!(matches!(err, ScanError::Io { .. }));
    }

    #[test]
    fn test_tree_error_converts() {
        let err: ScanError = TreeError::RootHasNoParent.into();
        assert!(matches!(err, ScanError::Tree(TreeError::RootHasNoParent)));
        assert_eq!(err.to_string(), "The root directory cannot have a parent");
    }

    #[test]
    fn test_scan_warning_creation() {
        let warning = ScanWarning::unsupported("/dev/null", "character device");
        assert_eq!(warning.kind, WarningKind::UnsupportedKind);
        assert!(warning.message.contains("character device"));

        let warning = ScanWarning::vanished("/tmp/gone");
        assert_eq!(warning.kind, WarningKind::Vanished);

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::read_error("/tmp/locked", &err);
        assert_eq!(warning.kind, WarningKind::ReadError);
        assert!(warning.message.contains("/tmp/locked"));
    }
}
