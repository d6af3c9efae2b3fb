//! The element arena and the aggregation pass.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::directory::Directory;
use crate::element::{DirectoryData, Element, ElementKind, FileId, NodeId};
use crate::error::{ScanWarning, TreeError};
use crate::identity::IdentityRegistry;

/// Outcome of adding a scanned regular file with [`Root::add_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClaim {
    /// First name seen for this file; a new element was created.
    Created(NodeId),
    /// Another name for a file already in the tree; only counted.
    Hardlink { original: NodeId },
}

/// Owner of a whole tree.
///
/// All elements live in one arena and refer to their parent by [`NodeId`].
/// The root directory is the only element of an assembled tree without a
/// parent. Each root owns its own [`IdentityRegistry`] and never shares
/// elements with another root.
#[derive(Debug, Clone)]
pub struct Root {
    nodes: Vec<Element>,
    top: NodeId,
    registry: IdentityRegistry,
    warnings: Vec<ScanWarning>,
}

impl Root {
    /// Create an empty, unscanned root directory for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let top = Element::new(path.into(), None, ElementKind::Directory(DirectoryData::default()));
        Self {
            nodes: vec![top],
            top: NodeId(0),
            registry: IdentityRegistry::new(),
            warnings: Vec::new(),
        }
    }

    /// Handle of the root directory.
    pub fn top(&self) -> NodeId {
        self.top
    }

    /// Path the root was created for.
    pub fn path(&self) -> &Path {
        &self.nodes[self.top.index()].path
    }

    /// Total number of elements, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the root directory is the only element.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Element behind a handle.
    pub fn get(&self, id: NodeId) -> Result<&Element, TreeError> {
        self.nodes.get(id.index()).ok_or(TreeError::UnknownNode { id })
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Element, TreeError> {
        self.nodes.get_mut(id.index()).ok_or(TreeError::UnknownNode { id })
    }

    /// Iterate over every element with its handle.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Element)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, element)| (NodeId(i as u32), element))
    }

    /// File identities claimed so far.
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Non-fatal problems recorded while scanning.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Record a non-fatal scan problem.
    pub fn push_warning(&mut self, warning: ScanWarning) {
        self.warnings.push(warning);
    }

    /// Read-only directory view.
    pub fn directory(&self, id: NodeId) -> Result<Directory<'_>, TreeError> {
        Directory::new(self, id)
    }

    /// Read-only view of the root directory.
    pub fn top_directory(&self) -> Directory<'_> {
        Directory::from_element(self, self.top, &self.nodes[self.top.index()])
            .unwrap_or_else(|| unreachable!("root element is always a directory"))
    }

    fn push(&mut self, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(element);
        id
    }

    /// Create a detached, unaggregated directory.
    pub fn new_directory(&mut self, path: impl Into<PathBuf>) -> NodeId {
        self.push(Element::new(
            path.into(),
            None,
            ElementKind::Directory(DirectoryData::default()),
        ))
    }

    /// Create a detached file of known size.
    ///
    /// A file carrying an identity is registered; an identity that is already
    /// registered is a hardlink and is rejected.
    pub fn new_file(
        &mut self,
        path: impl Into<PathBuf>,
        size: u64,
        id: Option<FileId>,
    ) -> Result<NodeId, TreeError> {
        let path = path.into();
        if let Some(file_id) = id {
            if self.registry.lookup(&file_id).is_some() {
                return Err(TreeError::DuplicateIdentity { path });
            }
        }

        let node = self.push(Element::new(path, Some(size), ElementKind::File { id }));
        if let Some(file_id) = id {
            self.registry.register(file_id, node);
        }
        Ok(node)
    }

    /// Add a regular file found in directory `dir`.
    ///
    /// The registry is consulted once: a known identity only bumps the
    /// directory's hardlink count, an unknown one creates, links and registers
    /// a new file.
    pub fn add_file(
        &mut self,
        dir: NodeId,
        path: impl Into<PathBuf>,
        size: u64,
        id: Option<FileId>,
    ) -> Result<FileClaim, TreeError> {
        if let Some(original) = id.and_then(|file_id| self.registry.lookup(&file_id)) {
            self.record_hardlink(dir)?;
            return Ok(FileClaim::Hardlink { original });
        }

        let node = self.push(Element::new(path.into(), Some(size), ElementKind::File { id }));
        self.attach(dir, node)?;
        if let Some(file_id) = id {
            self.registry.register(file_id, node);
        }
        Ok(FileClaim::Created(node))
    }

    /// Create a detached filename slot with no file attached.
    pub fn new_filename(&mut self, path: impl Into<PathBuf>) -> NodeId {
        self.push(Element::new(path.into(), None, ElementKind::Filename { file: None }))
    }

    /// Create a detached symbolic link. Links always weigh zero bytes.
    pub fn new_symlink(&mut self, path: impl Into<PathBuf>, target: Option<PathBuf>) -> NodeId {
        self.push(Element::new(path.into(), Some(0), ElementKind::Symlink { target }))
    }

    /// Parent handle of `id`.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
        Ok(self.get(id)?.parent)
    }

    /// Topmost ancestor of `id` (the element itself when detached).
    pub fn root_of(&self, id: NodeId) -> Result<NodeId, TreeError> {
        let mut current = id;
        while let Some(parent) = self.get(current)?.parent {
            current = parent;
        }
        Ok(current)
    }

    /// Elements without a parent. An assembled tree yields only the root.
    pub fn orphans(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, element)| element.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Link `child` below `parent`. Same as `set_parent(child, Some(parent))`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.set_parent(child, Some(parent))
    }

    /// Move `child` below `parent`, or detach it with `None`.
    ///
    /// Directories accept any element. Filenames accept a single file. Cached
    /// sizes of the old and new ancestors are reset.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), TreeError> {
        let current = self.get(child)?.parent;
        if let Some(parent) = parent {
            self.get(parent)?;
        }
        if current == parent {
            return Ok(());
        }
        if child == self.top && parent.is_some() {
            return Err(TreeError::RootHasNoParent);
        }
        if let Some(parent) = parent {
            self.check_link(parent, child)?;
        }

        self.unlink(child)?;
        if let Some(parent) = parent {
            self.link(parent, child)?;
        }
        Ok(())
    }

    fn check_link(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent_element = self.get(parent)?;
        let child_element = self.get(child)?;

        match &parent_element.kind {
            ElementKind::Directory(data) => {
                if data.child(&child_element.file_name).is_some() {
                    return Err(TreeError::DuplicateName {
                        parent: parent_element.path.clone(),
                        name: child_element.name.to_string(),
                    });
                }
            }
            ElementKind::Filename { file } if child_element.is_file() => {
                if file.is_some() {
                    return Err(TreeError::FilenameOccupied {
                        path: parent_element.path.clone(),
                    });
                }
            }
            _ => {
                return Err(TreeError::NotAContainer {
                    path: parent_element.path.clone(),
                });
            }
        }

        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(TreeError::Cycle {
                    path: child_element.path.clone(),
                });
            }
            ancestor = self.get(id)?.parent;
        }
        Ok(())
    }

    fn unlink(&mut self, child: NodeId) -> Result<(), TreeError> {
        let Some(parent) = self.get(child)?.parent else {
            return Ok(());
        };
        let name = self.get(child)?.file_name.clone();

        match &mut self.get_mut(parent)?.kind {
            ElementKind::Directory(data) => {
                data.subdirectories.shift_remove(&name);
                data.files.shift_remove(&name);
                data.symlinks.shift_remove(&name);
            }
            ElementKind::Filename { file } => *file = None,
            _ => {}
        }
        self.get_mut(child)?.parent = None;
        self.invalidate(parent)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let child_element = self.get(child)?;
        let name = child_element.file_name.clone();
        let is_dir = child_element.is_dir();
        let is_symlink = child_element.is_symlink();

        match &mut self.get_mut(parent)?.kind {
            ElementKind::Directory(data) => {
                let map = if is_dir {
                    &mut data.subdirectories
                } else if is_symlink {
                    &mut data.symlinks
                } else {
                    &mut data.files
                };
                map.insert(name, child);
            }
            ElementKind::Filename { file } => *file = Some(child),
            _ => {}
        }
        self.get_mut(child)?.parent = Some(parent);
        self.invalidate(parent)
    }

    /// Forget cached directory sizes from `id` upwards.
    ///
    /// A directory without a size never has an ancestor with one, so the walk
    /// stops at the first unaggregated directory.
    fn invalidate(&mut self, id: NodeId) -> Result<(), TreeError> {
        let mut current = Some(id);
        while let Some(node) = current {
            let element = self.get_mut(node)?;
            if element.is_dir() {
                if element.size.is_none() {
                    break;
                }
                element.size = None;
            }
            current = element.parent;
        }
        Ok(())
    }

    /// Size of any element.
    ///
    /// Fails with [`TreeError::NotComputed`] for a directory that was never
    /// aggregated and for a filename with no file attached.
    pub fn size(&self, id: NodeId) -> Result<u64, TreeError> {
        let element = self.get(id)?;
        match &element.kind {
            ElementKind::Filename { file: Some(file) } => self.size(*file),
            _ => element.size.ok_or_else(|| TreeError::NotComputed {
                path: element.path.clone(),
            }),
        }
    }

    /// Sum the immediate children of directory `id` and cache the result.
    ///
    /// Every child must already have a size; the first missing one aborts the
    /// pass and leaves the directory unaggregated.
    pub fn aggregate(&mut self, id: NodeId) -> Result<u64, TreeError> {
        let element = self.get(id)?;
        let data = element.as_directory().ok_or_else(|| TreeError::NotADirectory {
            path: element.path.clone(),
        })?;

        let mut total: u64 = 0;
        for &child in data.subdirectories.values().chain(data.files.values()) {
            total += self.size(child)?;
        }

        self.get_mut(id)?.size = Some(total);
        Ok(total)
    }

    /// Aggregate every directory below and including `id`, children first.
    pub fn aggregate_all(&mut self, id: NodeId) -> Result<u64, TreeError> {
        let element = self.get(id)?;
        let subdirectories: Vec<NodeId> = element
            .as_directory()
            .ok_or_else(|| TreeError::NotADirectory {
                path: element.path.clone(),
            })?
            .subdirectories
            .values()
            .copied()
            .collect();

        for child in subdirectories {
            self.aggregate_all(child)?;
        }
        self.aggregate(id)
    }

    fn directory_mut(&mut self, id: NodeId) -> Result<&mut DirectoryData, TreeError> {
        let element = self.get_mut(id)?;
        match &mut element.kind {
            ElementKind::Directory(data) => Ok(data),
            _ => Err(TreeError::NotADirectory {
                path: element.path.clone(),
            }),
        }
    }

    fn record_hardlink(&mut self, dir: NodeId) -> Result<(), TreeError> {
        self.directory_mut(dir)?.hardlink_count += 1;
        Ok(())
    }

    /// Flag a directory whose listing failed and was kept empty.
    pub fn mark_unreadable(&mut self, dir: NodeId) -> Result<(), TreeError> {
        self.directory_mut(dir)?.unreadable = true;
        Ok(())
    }

    /// Store eager-scan timings on a directory.
    pub fn set_durations(
        &mut self,
        dir: NodeId,
        scan: Duration,
        aggregate: Duration,
    ) -> Result<(), TreeError> {
        let data = self.directory_mut(dir)?;
        data.scan_duration = Some(scan);
        data.aggregate_duration = Some(aggregate);
        Ok(())
    }
}
