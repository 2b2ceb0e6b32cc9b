// src/tree/node.rs
// =============================================================================
// FileNode: one file or directory of the finished tree.
//
// A directory owns its children outright (no shared or back references),
// so the tree is a plain value that can be cloned, compared and serialized
// for the UI. Directory sizes are never stored; size() sums the files
// underneath on demand.
//
// Rust concepts:
// - Recursive enums: a directory owns its children in a Vec
// - Custom Iterator: Walk keeps an explicit stack instead of recursing
// - sha2: stable ids derived from the path
// =============================================================================

use super::builder::TreeEntry;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Stable node identity derived from the root-relative path, so the same
/// tree always gets the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn for_path(path: &str) -> Self {
        let digest = Sha256::digest(path.as_bytes());
        let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
        NodeId(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    File {
        size: u64,
        /// Absent for binary files and for anything filtered out of
        /// content extraction.
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        binary: bool,
    },
    Directory {
        children: Vec<FileNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub id: NodeId,
    pub name: String,
    /// Root-relative, slash-separated, no leading slash.
    pub path: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl FileNode {
    pub fn file(path: &str, size: u64, content: Option<String>, binary: bool) -> Self {
        Self {
            id: NodeId::for_path(path),
            name: last_segment(path).to_string(),
            path: path.to_string(),
            kind: NodeKind::File {
                size,
                content,
                binary,
            },
        }
    }

    pub fn directory(path: &str, children: Vec<FileNode>) -> Self {
        Self {
            id: NodeId::for_path(path),
            name: last_segment(path).to_string(),
            path: path.to_string(),
            kind: NodeKind::Directory { children },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// File size, or the sum of all file sizes below a directory.
    pub fn size(&self) -> u64 {
        match &self.kind {
            NodeKind::File { size, .. } => *size,
            NodeKind::Directory { children } => children.iter().map(FileNode::size).sum(),
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content, .. } => content.as_deref(),
            NodeKind::Directory { .. } => None,
        }
    }

    /// Children of a directory; empty for files.
    pub fn children(&self) -> &[FileNode] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<FileNode>> {
        match &mut self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    /// Number of file nodes in this subtree (including self).
    pub fn file_count(&self) -> usize {
        self.walk().filter(|node| node.is_file()).count()
    }

    /// Pre-order traversal starting at this node.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    // Gives the node a display name different from its last path segment
    // (a file kept beside a colliding entry). The id follows the name so
    // the two nodes never share one.
    pub(crate) fn rename(&mut self, name: String) {
        self.id = NodeId::for_path(&identity(&self.path, &name));
        self.name = name;
    }

    // Moves this subtree from `old_prefix` to `new_prefix`, rewriting the
    // path and id of every node in it. Used when a redundant directory
    // level is collapsed.
    pub(crate) fn rebase(&mut self, old_prefix: &str, new_prefix: &str) {
        if let Some(rest) = self.path.strip_prefix(old_prefix) {
            self.path = format!("{}{}", new_prefix, rest);
            self.id = NodeId::for_path(&identity(&self.path, &self.name));
        }
        if let Some(children) = self.children_mut() {
            for child in children {
                child.rebase(old_prefix, new_prefix);
            }
        }
    }
}

/// Pre-order iterator over a tree (see `FileNode::walk`).
pub struct Walk<'a> {
    stack: Vec<&'a FileNode>,
}

impl<'a> Walk<'a> {
    /// Walks a whole forest in order.
    pub fn forest(roots: &'a [FileNode]) -> Self {
        Walk {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a FileNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// Turns a finished tree back into flat builder entries (files only,
/// wrapper-free paths).
pub fn flatten(roots: &[FileNode]) -> Vec<TreeEntry> {
    Walk::forest(roots)
        .filter_map(|node| match &node.kind {
            NodeKind::File {
                size,
                content,
                binary,
            } => Some(TreeEntry {
                path: node.path.clone(),
                is_directory: false,
                size: *size,
                content: content.clone(),
                binary: *binary,
            }),
            NodeKind::Directory { .. } => None,
        })
        .collect()
}

// Parent path plus display name. Equal to the path for every node whose
// name is its last segment.
fn identity(path: &str, name: &str) -> String {
    match path.rsplit_once('/') {
        Some((parent, _)) => format!("{}/{}", parent, name),
        None => name.to_string(),
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
