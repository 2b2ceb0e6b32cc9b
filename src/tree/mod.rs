// src/tree/mod.rs
// =============================================================================
// Rebuilds a directory hierarchy from the flat list of admitted entries.
//
// Submodules:
// - node: FileNode, the unit of the finished tree
// - wrapper: detection/stripping of the archive's synthetic root folder
// - ordering: sibling ordering policies
// - builder: the arena-based construction and cleanup passes
//
// The builder never fails. Anything it cannot attach ends up at the top
// level instead of being dropped.
//
// Rust concepts:
// - Modules: nodes, building, ordering and wrappers kept apart
// - pub use: a small surface for the rest of the crate
// =============================================================================

mod builder;
mod node;
mod ordering;
mod wrapper;

pub use builder::{NestingCollapse, TreeBuilder, TreeEntry};
pub use node::{flatten, FileNode, NodeId, NodeKind, Walk};
pub use ordering::{sort_nodes, SiblingOrder};
pub use wrapper::{normalize_path, RootWrapper};
