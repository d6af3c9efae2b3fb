//! File system scanning for dirtally.
//!
//! This crate walks a directory hierarchy depth-first and fills a
//! [`Root`] with directories, files and symbolic links.
//!
//! # Overview
//!
//! - **Link-aware**: entries are stat'ed without following symlinks, and
//!   symlinks are recorded with size 0 but never entered
//! - **Hardlink detection**: every regular file goes through the root's
//!   identity registry, so a file with several names is counted once
//! - **Eager aggregation**: each directory's size is summed as soon as its
//!   subtree is complete, and scan/aggregate timings are recorded
//! - **Configurable** ignore patterns, hidden files, filesystem boundaries
//!   and error tolerance
//!
//! # Example
//!
//! ```rust,no_run
//! use dirtally_scan::{ScanConfig, Scanner};
//!
//! let scanner = Scanner::new(ScanConfig::new("/path/to/scan")).unwrap();
//! let root = scanner.scan().unwrap();
//! let top = root.top_directory();
//!
//! println!("Total size: {} bytes", top.size().unwrap());
//! println!("Total files: {}", top.total_file_count());
//! println!("Hardlinks: {}", top.total_hardlink_count());
//! ```
//!
//! Scans of different roots share nothing and may run on separate threads.

mod scanner;

use std::path::PathBuf;

pub use scanner::Scanner;

// Re-export core types for convenience
pub use dirtally_core::{
    Directory, Element, ElementKind, ElementTree, FileId, NodeId, Root, ScanConfig, ScanError,
    ScanWarning, TreeError, WarningKind,
};

/// Scan `path` with the default configuration.
pub fn scan(path: impl Into<PathBuf>) -> Result<Root, ScanError> {
    Scanner::new(ScanConfig::new(path))?.scan()
}
