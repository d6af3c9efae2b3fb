//! Core types for dirtally.
//!
//! This crate holds the element arena ([`Root`]), the hardlink identity
//! registry, the bottom-up aggregation pass and the export of elements into
//! a presentable [`LabeledTree`]. It never touches the filesystem; the
//! `dirtally-scan` crate fills a [`Root`] from disk, and trees can also be
//! assembled by hand.
//!
//! ```rust
//! use dirtally_core::Root;
//!
//! let mut root = Root::new("/r");
//! let dir = root.new_directory("/r/d");
//! let file = root.new_file("/r/d/a", 100, None).unwrap();
//! root.attach(root.top(), dir).unwrap();
//! root.attach(dir, file).unwrap();
//!
//! assert_eq!(root.aggregate_all(root.top()).unwrap(), 100);
//! assert_eq!(root.top_directory().total_file_count(), 1);
//! ```

mod config;
mod directory;
mod element;
mod error;
mod export;
mod identity;
mod labeled;
mod root;

pub use config::{ScanConfig, ScanConfigBuilder};
pub use directory::Directory;
pub use element::{DirectoryData, Element, ElementKind, FileId, NodeId};
pub use error::{ScanError, ScanWarning, TreeError, WarningKind};
pub use export::{ElementSummary, ElementTree, SummaryKind};
pub use identity::IdentityRegistry;
pub use labeled::{FormatFn, LabeledTree, Labels};
pub use root::{FileClaim, Root};
