// src/tree/builder.rs
// =============================================================================
// Builds the FileNode tree from flat, admitted entries.
//
// How it works:
// 1. Strip the archive's root wrapper from every path (wrapper.rs)
// 2. Put every entry into an arena: a BTreeMap keyed by normalized path
// 3. Synthesize any missing parent directory for every file
// 4. Attach each node to the node whose path is its own minus the last
//    segment; single-segment paths become top-level roots
// 5. Clean up bottom-up: drop empty directories and collapse a directory
//    whose only child is a directory with the same name ("pkg/pkg/...")
// 6. Sort siblings (ordering.rs)
//
// Two entries can claim the same path: a file and a directory, or the same
// file twice. Neither is dropped. The directory (or the first file) keeps
// the path's name and the other files sit beside it as "name (file)" or
// "name (copy)", numbered in archive order. The outcome does not depend on
// where the directory entry appears in the archive.
//
// Building everything in the arena first means no node ever needs a
// pointer to its parent; the owned tree is assembled once at the end.
//
// Rust concepts:
// - BTreeMap: a sorted arena keyed by path
// - Ownership moves: slots are removed from the arena as nodes are built
// - Builder pattern: chained methods that take and return self
// =============================================================================

use super::node::{FileNode, NodeKind};
use super::ordering::{sort_nodes, SiblingOrder};
use super::wrapper::{normalize_path, RootWrapper};
use crate::config::IngestionConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One admitted entry, as handed to the builder.
///
/// `path` may still carry the archive's root wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub is_directory: bool,
    pub size: u64,
    pub content: Option<String>,
    pub binary: bool,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>, size: u64, content: Option<String>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            size,
            content,
            binary: false,
        }
    }

    /// A file admitted without content (binary, kept by `include_binaries`).
    pub fn binary(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            size,
            content: None,
            binary: true,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_directory: true,
            size: 0,
            content: None,
            binary: false,
        }
    }
}

/// How far "name/name/..." nesting is collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NestingCollapse {
    /// Remove one redundant level: "a/a/a/f" becomes "a/a/f".
    #[default]
    SingleLevel,
    /// Remove every redundant level: "a/a/a/f" becomes "a/f".
    Full,
}

#[derive(Debug, Clone)]
enum WrapperMode {
    Detect,
    Known(Option<RootWrapper>),
}

// What the arena stores per path while the tree is being assembled.
enum Slot {
    File(FileSlot),
    Directory,
}

struct FileSlot {
    // Position in the archive
    seq: usize,
    size: u64,
    content: Option<String>,
    binary: bool,
}

impl FileSlot {
    fn into_node(self, path: &str) -> FileNode {
        FileNode::file(path, self.size, self.content, self.binary)
    }
}

#[derive(Debug, Clone)]
pub struct TreeBuilder {
    order: SiblingOrder,
    collapse: NestingCollapse,
    wrapper: WrapperMode,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            order: SiblingOrder::default(),
            collapse: NestingCollapse::default(),
            wrapper: WrapperMode::Detect,
        }
    }

    pub fn from_config(config: &IngestionConfig) -> Self {
        let builder = Self::new()
            .order(config.sibling_order)
            .collapse(config.nesting_collapse);
        if config.strip_root_wrapper {
            builder
        } else {
            builder.with_root_wrapper(None)
        }
    }

    pub fn order(mut self, order: SiblingOrder) -> Self {
        self.order = order;
        self
    }

    pub fn collapse(mut self, collapse: NestingCollapse) -> Self {
        self.collapse = collapse;
        self
    }

    /// Use an already-detected wrapper (or `None` to keep paths as they
    /// are) instead of detecting one from the first entry.
    pub fn with_root_wrapper(mut self, wrapper: Option<RootWrapper>) -> Self {
        self.wrapper = WrapperMode::Known(wrapper);
        self
    }

    pub fn build(&self, entries: Vec<TreeEntry>) -> Vec<FileNode> {
        let wrapper = match &self.wrapper {
            WrapperMode::Known(wrapper) => wrapper.clone(),
            WrapperMode::Detect => {
                RootWrapper::detect_shared(entries.iter().map(|e| (e.path.as_str(), e.is_directory)))
            }
        };
        if let Some(wrapper) = &wrapper {
            debug!(prefix = wrapper.prefix(), "stripping archive root wrapper");
        }

        let mut arena: BTreeMap<String, Slot> = BTreeMap::new();
        let mut orphans = Orphans::default();

        for (seq, entry) in entries.into_iter().enumerate() {
            let path = match &wrapper {
                Some(wrapper) => match wrapper.strip(&entry.path) {
                    Some(path) => path,
                    None => continue,
                },
                None => normalize_path(&entry.path),
            };
            if path.is_empty() {
                continue;
            }

            if entry.is_directory {
                // Re-inserting a directory is harmless; a file moves aside
                if let Some(Slot::File(file)) = arena.insert(path.clone(), Slot::Directory) {
                    orphans.push(&path, file);
                }
                continue;
            }

            let file = FileSlot {
                seq,
                size: entry.size,
                content: entry.content,
                binary: entry.binary,
            };
            // The first copy keeps the real name; later ones sit next to it
            if arena.contains_key(&path) {
                orphans.push(&path, file);
            } else {
                arena.insert(path, Slot::File(file));
            }
        }

        synthesize_parents(&mut arena, &mut orphans);
        orphans.settle(&arena);

        // Every ancestor is a directory by now, so a path either hangs off
        // its parent or sits at the top level.
        let mut children_of: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut roots: Vec<String> = Vec::new();
        for path in arena.keys() {
            match path.rsplit_once('/') {
                Some((parent, _)) => children_of
                    .entry(parent.to_string())
                    .or_default()
                    .push(path.clone()),
                None => roots.push(path.clone()),
            }
        }

        let mut nodes: Vec<FileNode> = roots
            .iter()
            .filter_map(|root| assemble(root, &mut arena, &mut children_of, &mut orphans))
            .collect();
        nodes.extend(orphans.take(""));

        let mut tree: Vec<FileNode> = nodes
            .into_iter()
            .filter_map(|node| self.clean(node).map(|(node, _)| node))
            .collect();
        sort_nodes(&mut tree, self.order);
        tree
    }

    // Bottom-up cleanup. Returns None for a directory that ends up empty;
    // the flag says whether this node was itself produced by a collapse.
    fn clean(&self, node: FileNode) -> Option<(FileNode, bool)> {
        let FileNode {
            id,
            name,
            path,
            kind,
        } = node;
        let children = match kind {
            NodeKind::Directory { children } => children,
            file => {
                return Some((
                    FileNode {
                        id,
                        name,
                        path,
                        kind: file,
                    },
                    false,
                ))
            }
        };

        let mut cleaned: Vec<(FileNode, bool)> = children
            .into_iter()
            .filter_map(|child| self.clean(child))
            .collect();
        if cleaned.is_empty() {
            debug!(%path, "dropping empty directory");
            return None;
        }

        let mut collapsed = false;
        loop {
            let redundant = cleaned.len() == 1 && {
                let (only, only_collapsed) = &cleaned[0];
                only.is_dir()
                    && only.name == name
                    && (self.collapse == NestingCollapse::Full || !*only_collapsed)
            };
            if !redundant {
                break;
            }

            let (only, _) = cleaned.remove(0);
            debug!(path = %only.path, "collapsing same-name nested directory");
            let old_prefix = format!("{}/", only.path);
            let new_prefix = format!("{}/", path);
            let grandchildren = match only.kind {
                NodeKind::Directory { children } => children,
                NodeKind::File { .. } => Vec::new(),
            };
            cleaned = grandchildren
                .into_iter()
                .map(|mut grandchild| {
                    grandchild.rebase(&old_prefix, &new_prefix);
                    (grandchild, false)
                })
                .collect();
            collapsed = true;

            if self.collapse == NestingCollapse::SingleLevel {
                break;
            }
        }

        let children = cleaned.into_iter().map(|(child, _)| child).collect();
        Some((
            FileNode {
                id,
                name,
                path,
                kind: NodeKind::Directory { children },
            },
            collapsed,
        ))
    }
}

// Makes sure every ancestor of every entry exists as a directory. A file
// sitting where a directory is needed gives up its slot and is kept next
// to that directory instead, whichever of the two came first.
fn synthesize_parents(arena: &mut BTreeMap<String, Slot>, orphans: &mut Orphans) {
    let mut ancestors: BTreeSet<String> = BTreeSet::new();
    for path in arena.keys() {
        let mut ancestor = path.as_str();
        while let Some((parent, _)) = ancestor.rsplit_once('/') {
            ancestors.insert(parent.to_string());
            ancestor = parent;
        }
    }
    for path in ancestors {
        if let Some(Slot::File(file)) = arena.insert(path.clone(), Slot::Directory) {
            orphans.push(&path, file);
        }
    }
}

fn assemble(
    path: &str,
    arena: &mut BTreeMap<String, Slot>,
    children_of: &mut BTreeMap<String, Vec<String>>,
    orphans: &mut Orphans,
) -> Option<FileNode> {
    match arena.remove(path)? {
        Slot::File(file) => Some(file.into_node(path)),
        Slot::Directory => {
            let mut children: Vec<FileNode> = children_of
                .remove(path)
                .unwrap_or_default()
                .iter()
                .filter_map(|child| assemble(child, arena, children_of, orphans))
                .collect();
            children.extend(orphans.take(path));
            Some(FileNode::directory(path, children))
        }
    }
}

// Files that lost their path to a collision. They keep their path but get
// a distinct name, so no content is dropped and sibling names stay unique.
#[derive(Default)]
struct Orphans {
    displaced: BTreeMap<String, Vec<FileSlot>>,
    // Named nodes grouped by parent directory ("" for the top level)
    by_parent: BTreeMap<String, Vec<FileNode>>,
}

impl Orphans {
    fn push(&mut self, path: &str, file: FileSlot) {
        warn!(%path, "path collision, keeping the file under a new name");
        self.displaced.entry(path.to_string()).or_default().push(file);
    }

    // Names every displaced file once the arena holds its final slots: a
    // path taken by a directory gives "(file)", one kept by an earlier file
    // gives "(copy)".
    fn settle(&mut self, arena: &BTreeMap<String, Slot>) {
        for (path, mut files) in std::mem::take(&mut self.displaced) {
            files.sort_by_key(|file| file.seq);
            let label = match arena.get(&path) {
                Some(Slot::Directory) => "file",
                _ => "copy",
            };
            let parent = path.rsplit_once('/').map_or("", |(parent, _)| parent);
            let siblings = self.by_parent.entry(parent.to_string()).or_default();

            for (index, file) in files.into_iter().enumerate() {
                let mut node = file.into_node(&path);
                let name = match index {
                    0 => format!("{} ({})", node.name, label),
                    n => format!("{} ({} {})", node.name, label, n + 1),
                };
                node.rename(name);
                siblings.push(node);
            }
        }
    }

    fn take(&mut self, parent: &str) -> Vec<FileNode> {
        self.by_parent.remove(parent).unwrap_or_default()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a BTreeMap and not a HashMap?
//    - Keys come out sorted, so parents ("src") always precede their
//      children ("src/main.rs") when we iterate
//    - Iteration order is the same on every run, which keeps output stable
//
// 2. What does arena.insert() return?
//    - The value that was previously stored under that key, if any
//    - That is how a collision is noticed: Some(old) means the path was taken
//    - The old file is moved into Orphans instead of being dropped
//    - `if let Some(Slot::File(file)) = ...` only matches a displaced file
//
// 3. Why are orphans renamed but not moved?
//    - Their path stays the same (it is where they came from in the archive)
//    - Only the display name changes, "docs" -> "docs (file)"
//    - The node id is hashed from parent + name, so both nodes stay distinct
//
// 4. What is `remove` doing in assemble()?
//    - It takes ownership of the slot out of the arena
//    - The content String is moved into the FileNode, never cloned
// -----------------------------------------------------------------------------
