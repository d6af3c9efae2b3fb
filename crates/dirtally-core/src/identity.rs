//! Per-root file identity registry for hardlink deduplication.

use std::collections::HashMap;

use crate::element::{FileId, NodeId};

/// Maps each on-disk file identity to the first file element that claimed it.
///
/// A file with several hardlinks must appear once in the tree. Every root
/// owns its own registry, so independent scans never see each other's files.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    files: HashMap<FileId, NodeId>,
}

impl IdentityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `file` as the owner of `id`, replacing any previous owner.
    ///
    /// Callers check [`lookup`](Self::lookup) first.
    pub fn register(&mut self, id: FileId, file: NodeId) {
        self.files.insert(id, file);
    }

    /// File element already claiming `id`, if any.
    pub fn lookup(&self, id: &FileId) -> Option<NodeId> {
        self.files.get(id).copied()
    }

    /// Number of unique identities tracked.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no identity is tracked.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over identities and their owning files.
    pub fn iter(&self) -> impl Iterator<Item = (&FileId, &NodeId)> {
        self.files.iter()
    }
}
