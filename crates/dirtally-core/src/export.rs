//! Conversion of elements into [`LabeledTree`] snapshots.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::directory::Directory;
use crate::element::{ElementKind, NodeId};
use crate::error::TreeError;
use crate::labeled::{LabeledTree, Labels};
use crate::root::Root;

/// Kind tag carried by exported nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    Directory,
    Filename,
    File,
    Symlink,
}

/// Value of an exported node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub kind: SummaryKind,
    pub name: CompactString,
    /// `None` when the size has not been computed.
    pub size: Option<u64>,
}

/// Exported tree of element summaries.
pub type ElementTree = LabeledTree<ElementSummary>;

impl Root {
    /// Snapshot of the subtree at `id`.
    ///
    /// Directories list subdirectories, then files, then symlinks. Unknown
    /// sizes are exported as `None` rather than failing.
    pub fn to_tree(&self, id: NodeId) -> Result<ElementTree, TreeError> {
        let element = self.get(id)?;
        let size = self.size(id).ok();

        let mut labels: Vec<(&str, String)> = vec![("kind", element.kind().label().to_string())];
        if let Some(size) = size {
            labels.push(("size", size.to_string()));
        }

        let kind = match element.kind() {
            ElementKind::Directory(data) => {
                labels.push(("files", data.files.len().to_string()));
                labels.push(("subdirectories", data.subdirectories.len().to_string()));
                labels.push(("symlinks", data.symlinks.len().to_string()));
                labels.push(("hardlinks", data.hardlink_count.to_string()));
                if data.unreadable {
                    labels.push(("unreadable", "true".to_string()));
                }
                SummaryKind::Directory
            }
            ElementKind::Filename { .. } => SummaryKind::Filename,
            ElementKind::File { id } => {
                if let Some(id) = id {
                    labels.push(("inode", id.inode.to_string()));
                    labels.push(("device", id.device.to_string()));
                }
                SummaryKind::File
            }
            ElementKind::Symlink { target } => {
                if let Some(target) = target {
                    labels.push(("target", target.to_string_lossy().into_owned()));
                }
                SummaryKind::Symlink
            }
        };

        let summary = ElementSummary {
            kind,
            name: element.name().into(),
            size,
        };
        let mut node = LabeledTree::new(summary, labels, format_summary);

        match element.kind() {
            ElementKind::Directory(data) => {
                let children = data
                    .subdirectories
                    .values()
                    .chain(data.files.values())
                    .chain(data.symlinks.values())
                    .map(|&child| self.to_tree(child))
                    .collect::<Result<Vec<_>, _>>()?;
                node.extend_children(children);
            }
            ElementKind::Filename { file: Some(file) } => {
                node.extend_children([self.to_tree(*file)?]);
            }
            _ => {}
        }

        Ok(node)
    }
}

impl Directory<'_> {
    /// Snapshot of this directory's subtree.
    pub fn to_tree(&self) -> Result<ElementTree, TreeError> {
        self.root().to_tree(self.id())
    }
}

fn format_summary(summary: &ElementSummary, labels: &Labels) -> String {
    let size = summary
        .size
        .map(|s| humansize::format_size(s, humansize::BINARY))
        .unwrap_or_else(|| "?".to_string());

    match summary.kind {
        SummaryKind::Directory => format!("{}/  {size}", summary.name),
        SummaryKind::Symlink => match labels.get("target") {
            Some(target) => format!("{} -> {target}", summary.name),
            None => format!("{} -> ?", summary.name),
        },
        SummaryKind::File | SummaryKind::Filename => format!("{}  {size}", summary.name),
    }
}
