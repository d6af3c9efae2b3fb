//! Element types stored in a [`Root`](crate::Root) arena.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Handle of an element inside its root's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// On-disk file identity, used only to detect hardlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl FileId {
    /// Create a new file identity.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }
}

/// Children and counters of a directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryData {
    /// Child directories by on-disk name, in scan order.
    pub subdirectories: IndexMap<OsString, NodeId>,
    /// Child files (or filename slots) by on-disk name, in scan order.
    pub files: IndexMap<OsString, NodeId>,
    /// Child symbolic links by on-disk name, in scan order.
    pub symlinks: IndexMap<OsString, NodeId>,
    /// Extra names seen for files already claimed elsewhere in the tree.
    pub hardlink_count: u64,
    /// Time spent listing this directory's subtree (eager scans only).
    pub scan_duration: Option<Duration>,
    /// Time spent summing this directory's children (eager scans only).
    pub aggregate_duration: Option<Duration>,
    /// Listing failed and the directory was kept empty.
    pub unreadable: bool,
}

impl DirectoryData {
    /// Number of immediate children of every kind.
    pub fn len(&self) -> usize {
        self.subdirectories.len() + self.files.len() + self.symlinks.len()
    }

    /// Whether the directory has no children at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Child handle by on-disk name, searching every map.
    pub fn child(&self, name: impl AsRef<OsStr>) -> Option<NodeId> {
        let name = name.as_ref();
        self.subdirectories
            .get(name)
            .or_else(|| self.files.get(name))
            .or_else(|| self.symlinks.get(name))
            .copied()
    }
}

/// Variant-specific part of an element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElementKind {
    /// Container of other elements.
    Directory(DirectoryData),
    /// Named slot in a directory referencing at most one file.
    Filename {
        /// Attached file, if any.
        file: Option<NodeId>,
    },
    /// Regular file.
    File {
        /// Identity key, absent where the platform has no inode numbers.
        id: Option<FileId>,
    },
    /// Symbolic link, recorded but never followed.
    Symlink {
        /// Link target, if it could be read.
        target: Option<PathBuf>,
    },
}

impl ElementKind {
    /// Short lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Directory(_) => "directory",
            ElementKind::Filename { .. } => "filename",
            ElementKind::File { .. } => "file",
            ElementKind::Symlink { .. } => "symlink",
        }
    }
}

/// A single element of the tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub(crate) name: CompactString,
    pub(crate) file_name: OsString,
    pub(crate) path: PathBuf,
    pub(crate) size: Option<u64>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: ElementKind,
}

impl Element {
    pub(crate) fn new(path: PathBuf, size: Option<u64>, kind: ElementKind) -> Self {
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_else(|| path.clone().into_os_string());
        Self {
            name: CompactString::new(file_name.to_string_lossy()),
            file_name,
            path,
            size,
            parent: None,
            kind,
        }
    }

    /// Final path component (the whole path for a filesystem root), with
    /// invalid UTF-8 replaced for display.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact final path component; the key in the parent's child maps.
    pub fn file_name(&self) -> &OsStr {
        &self.file_name
    }

    /// Full path the element was created for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parent handle, `None` for the root and for detached elements.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Variant-specific data.
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Size stored on this element itself.
    ///
    /// Filenames never store a size; use [`Root::size`](crate::Root::size)
    /// to resolve them through their attached file.
    pub fn cached_size(&self) -> Option<u64> {
        self.size
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, ElementKind::Directory(_))
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, ElementKind::File { .. })
    }

    /// Check if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, ElementKind::Symlink { .. })
    }

    /// Check if this is a filename slot.
    pub fn is_filename(&self) -> bool {
        matches!(self.kind, ElementKind::Filename { .. })
    }

    /// Directory data, if this is a directory.
    pub fn as_directory(&self) -> Option<&DirectoryData> {
        match &self.kind {
            ElementKind::Directory(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn as_directory_mut(&mut self) -> Option<&mut DirectoryData> {
        match &mut self.kind {
            ElementKind::Directory(data) => Some(data),
            _ => None,
        }
    }

    /// Identity key of a file element.
    pub fn file_id(&self) -> Option<FileId> {
        match self.kind {
            ElementKind::File { id } => id,
            _ => None,
        }
    }
}
