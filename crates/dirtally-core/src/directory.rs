//! Read-only queries over a directory element.

use std::path::Path;
use std::time::Duration;

use crate::element::{DirectoryData, Element, NodeId};
use crate::error::TreeError;
use crate::root::Root;

/// Borrowed view of one directory in a [`Root`].
///
/// Immediate counts read the child maps. `total_*` counts recurse over the
/// subtree and never need an aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct Directory<'a> {
    root: &'a Root,
    id: NodeId,
    element: &'a Element,
    data: &'a DirectoryData,
}

impl<'a> Directory<'a> {
    pub(crate) fn new(root: &'a Root, id: NodeId) -> Result<Self, TreeError> {
        let element = root.get(id)?;
        Self::from_element(root, id, element).ok_or_else(|| TreeError::NotADirectory {
            path: element.path().to_path_buf(),
        })
    }

    pub(crate) fn from_element(root: &'a Root, id: NodeId, element: &'a Element) -> Option<Self> {
        let data = element.as_directory()?;
        Some(Self {
            root,
            id,
            element,
            data,
        })
    }

    pub(crate) fn root(&self) -> &'a Root {
        self.root
    }

    /// Handle of this directory.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Underlying element.
    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// Display name.
    pub fn name(&self) -> &'a str {
        self.element().name()
    }

    /// Full path.
    pub fn path(&self) -> &'a Path {
        self.element().path()
    }

    /// Raw child maps and counters.
    pub fn data(&self) -> &'a DirectoryData {
        self.data
    }

    /// Parent directory, `None` for the root or a detached directory.
    pub fn parent(&self) -> Option<Directory<'a>> {
        let parent = self.element().parent()?;
        self.root.directory(parent).ok()
    }

    /// Aggregated size in bytes.
    pub fn size(&self) -> Result<u64, TreeError> {
        self.root.size(self.id)
    }

    /// Immediate children of every kind.
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Immediate file entries.
    pub fn file_count(&self) -> usize {
        self.data.files.len()
    }

    /// Immediate subdirectories.
    pub fn subdirectory_count(&self) -> usize {
        self.data.subdirectories.len()
    }

    /// Immediate symbolic links.
    pub fn symlink_count(&self) -> usize {
        self.data.symlinks.len()
    }

    /// Extra names of already-seen files directly in this directory.
    pub fn hardlink_count(&self) -> u64 {
        self.data.hardlink_count
    }

    /// Files in this subtree.
    pub fn total_file_count(&self) -> u64 {
        self.data.files.len() as u64
            + self
                .subdirectories()
                .map(|dir| dir.total_file_count())
                .sum::<u64>()
    }

    /// Directories in this subtree, this one included.
    pub fn total_subdirectory_count(&self) -> u64 {
        1 + self
            .subdirectories()
            .map(|dir| dir.total_subdirectory_count())
            .sum::<u64>()
    }

    /// Extra hardlink names in this subtree.
    pub fn total_hardlink_count(&self) -> u64 {
        self.data.hardlink_count
            + self
                .subdirectories()
                .map(|dir| dir.total_hardlink_count())
                .sum::<u64>()
    }

    /// Symbolic links in this subtree.
    pub fn total_symlink_count(&self) -> u64 {
        self.data.symlinks.len() as u64
            + self
                .subdirectories()
                .map(|dir| dir.total_symlink_count())
                .sum::<u64>()
    }

    /// Immediate child directories in insertion order.
    ///
    /// Each call starts a fresh iterator over the current child map.
    pub fn subdirectories(&self) -> impl Iterator<Item = Directory<'a>> + use<'a> {
        let root = self.root;
        self.data
            .subdirectories
            .values()
            .filter_map(move |&id| root.directory(id).ok())
    }

    /// Immediate file entries (files or filename slots) in insertion order.
    pub fn files(&self) -> impl Iterator<Item = (NodeId, &'a Element)> + use<'a> {
        let root = self.root;
        self.data
            .files
            .values()
            .filter_map(move |&id| root.get(id).ok().map(|element| (id, element)))
    }

    /// Immediate symbolic links in insertion order.
    pub fn symlinks(&self) -> impl Iterator<Item = (NodeId, &'a Element)> + use<'a> {
        let root = self.root;
        self.data
            .symlinks
            .values()
            .filter_map(move |&id| root.get(id).ok().map(|element| (id, element)))
    }

    /// Time spent listing this subtree, if scanned eagerly.
    pub fn scan_duration(&self) -> Option<Duration> {
        self.data.scan_duration
    }

    /// Time spent summing this directory, if scanned eagerly.
    pub fn aggregate_duration(&self) -> Option<Duration> {
        self.data.aggregate_duration
    }

    /// Listing failed and the directory was kept empty.
    pub fn is_unreadable(&self) -> bool {
        self.data.unreadable
    }
}
