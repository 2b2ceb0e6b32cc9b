// src/tree/ordering.rs
// =============================================================================
// Sibling ordering policies.
//
// DirectoriesFirst (default): directories, then files, each alphabetical.
// ReadmeFirst: README files, regular files, hidden files, regular
// directories, hidden directories; alphabetical within each group.
//
// Names compare case-insensitively first, then byte-wise, so "b.rs" sorts
// between "A.rs" and "C.rs" and ties still have a fixed order.
//
// Rust concepts:
// - Ordering and cmp: chaining comparisons with then_with
// - sort_by: in-place sorting with a custom comparator
// =============================================================================

use super::node::FileNode;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SiblingOrder {
    #[default]
    DirectoriesFirst,
    ReadmeFirst,
}

/// Sorts every level of the forest in place.
pub fn sort_nodes(nodes: &mut [FileNode], order: SiblingOrder) {
    nodes.sort_by(|a, b| compare(a, b, order));
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            sort_nodes(children, order);
        }
    }
}

fn compare(a: &FileNode, b: &FileNode, order: SiblingOrder) -> Ordering {
    rank(a, order)
        .cmp(&rank(b, order))
        .then_with(|| compare_names(&a.name, &b.name))
}

fn rank(node: &FileNode, order: SiblingOrder) -> u8 {
    let hidden = node.name.starts_with('.');
    match order {
        SiblingOrder::DirectoriesFirst => {
            if node.is_dir() {
                0
            } else {
                1
            }
        }
        SiblingOrder::ReadmeFirst => match (node.is_dir(), hidden) {
            (false, _) if node.name.to_lowercase().starts_with("readme") => 0,
            (false, false) => 1,
            (false, true) => 2,
            (true, false) => 3,
            (true, true) => 4,
        },
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[FileNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    fn dir(path: &str) -> FileNode {
        FileNode::directory(path, vec![FileNode::file(&format!("{path}/x"), 1, None, false)])
    }

    fn file(path: &str) -> FileNode {
        FileNode::file(path, 1, None, false)
    }

    fn mixed() -> Vec<FileNode> {
        vec![
            file("zeta.rs"),
            dir(".github"),
            file(".gitignore"),
            dir("src"),
            file("README.md"),
            file("Cargo.toml"),
            dir("benches"),
        ]
    }

    #[test]
    fn test_directories_first() {
        let mut nodes = mixed();
        sort_nodes(&mut nodes, SiblingOrder::DirectoriesFirst);
        assert_eq!(
            names(&nodes),
            vec![".github", "benches", "src", ".gitignore", "Cargo.toml", "README.md", "zeta.rs"]
        );
    }

    #[test]
    fn test_readme_first() {
        let mut nodes = mixed();
        sort_nodes(&mut nodes, SiblingOrder::ReadmeFirst);
        assert_eq!(
            names(&nodes),
            vec!["README.md", "Cargo.toml", "zeta.rs", ".gitignore", "benches", "src", ".github"]
        );
    }

    #[test]
    fn test_case_insensitive_names() {
        let mut nodes = vec![file("C.rs"), file("b.rs"), file("A.rs")];
        sort_nodes(&mut nodes, SiblingOrder::DirectoriesFirst);
        assert_eq!(names(&nodes), vec!["A.rs", "b.rs", "C.rs"]);
    }

    #[test]
    fn test_sorting_is_recursive() {
        let mut nodes = vec![FileNode::directory(
            "src",
            vec![file("src/b.rs"), dir("src/a"), file("src/a.rs")],
        )];
        sort_nodes(&mut nodes, SiblingOrder::DirectoriesFirst);
        assert_eq!(names(nodes[0].children()), vec!["a", "a.rs", "b.rs"]);
    }
}
