// src/artifacts/mod.rs
// =============================================================================
// Text projections of a finished tree, for pasting into a prompt.
//
// Three artifacts are produced:
// - Summary: who, how many files, which subpath and ref, rough token count
// - Tree listing: box-drawing rendering of the hierarchy
// - Concatenated content: every file with content, one after another
//
// Everything here is a pure function of its inputs. Nothing touches the
// network or the filesystem.
//
// Rust concepts:
// - String building: push_str and format! into one growing buffer
// - Recursion over borrowed trees (&FileNode)
// - Serialize derive for the JSON report
// =============================================================================

use crate::scan::IngestionStats;
use crate::tree::{FileNode, Walk};
use serde::Serialize;

/// Width of the separator line around each file header.
pub const SEPARATOR_WIDTH: usize = 48;

/// Identity of the snapshot being described.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotLabel<'a> {
    /// "owner/name" for hosted sources, the archive name for local ones.
    pub name: &'a str,
    pub subpath: &'a str,
    pub branch: Option<&'a str>,
    pub commit: Option<&'a str>,
}

/// All three artifacts together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub summary: String,
    pub tree: String,
    pub content: String,
}

impl Digest {
    pub fn build(label: SnapshotLabel<'_>, stats: &IngestionStats, roots: &[FileNode]) -> Self {
        // The token estimate needs the content, so it is rendered first
        let content = concatenated_content(roots);
        Self {
            summary: summary(label, stats, &content),
            tree: tree_listing(label.name, roots),
            content,
        }
    }
}

/// Coarse token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

// Builds the summary block.
//
// Parameters:
//   label: repository identity, subpath and ref
//   stats: scan statistics (accepted file count, truncation)
//   content: the concatenated content, used for the token estimate
pub fn summary(label: SnapshotLabel<'_>, stats: &IngestionStats, content: &str) -> String {
    let mut out = format!("Repository: {}\n", label.name);
    out.push_str(&format!("Files analyzed: {}\n", stats.accepted_files));

    if label.subpath != "/" && !label.subpath.is_empty() {
        out.push_str(&format!("Subpath: {}\n", label.subpath));
    }

    // A commit pins the snapshot more precisely than a branch name
    if let Some(commit) = label.commit {
        out.push_str(&format!("Commit: {}\n", commit));
    } else if let Some(branch) = label.branch {
        out.push_str(&format!("Branch: {}\n", branch));
    }

    out.push_str(&format!("Estimated tokens: {}\n", estimate_tokens(content)));

    if stats.truncated {
        out.push_str(&format!(
            "Note: snapshot truncated ({} files left out)\n",
            stats.excluded_files
        ));
    }
    out
}

/// Renders the hierarchy under a single root line named after the snapshot.
pub fn tree_listing(root_name: &str, roots: &[FileNode]) -> String {
    let mut out = String::from("Directory structure:\n");
    out.push_str(&format!("└── {}/\n", root_name));
    render_level(roots, "    ", &mut out);
    out
}

fn render_level(nodes: &[FileNode], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&node.name);
        if node.is_dir() {
            out.push('/');
        }
        out.push('\n');

        if node.is_dir() {
            let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
            render_level(node.children(), &next, out);
        }
    }
}

/// Every file with content, in tree traversal order. Files without
/// content (binary, or left out by a budget) are skipped.
pub fn concatenated_content(roots: &[FileNode]) -> String {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();
    for node in Walk::forest(roots) {
        let Some(content) = node.content() else {
            continue;
        };
        out.push_str(&separator);
        out.push('\n');
        out.push_str(&format!("File: {}\n", node.path));
        out.push_str(&separator);
        out.push('\n');
        out.push_str(content);
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Vec<FileNode> {
        vec![
            FileNode::directory(
                "src",
                vec![
                    FileNode::file("src/lib.rs", 9, Some("pub mod a;".into()), false),
                    FileNode::file("src/logo.png", 100, None, true),
                ],
            ),
            FileNode::file("README.md", 7, Some("# hello".into()), false),
        ]
    }

    fn label<'a>(branch: Option<&'a str>, commit: Option<&'a str>) -> SnapshotLabel<'a> {
        SnapshotLabel {
            name: "octocat/Hello-World",
            subpath: "/",
            branch,
            commit,
        }
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_summary_prefers_commit_over_branch() {
        let stats = IngestionStats {
            accepted_files: 2,
            ..IngestionStats::default()
        };
        let text = summary(label(Some("main"), Some("abc123")), &stats, "12345678");
        assert_eq!(
            text,
            "Repository: octocat/Hello-World\n\
             Files analyzed: 2\n\
             Commit: abc123\n\
             Estimated tokens: 2\n"
        );
    }

    #[test]
    fn test_summary_shows_subpath_and_truncation() {
        let stats = IngestionStats {
            accepted_files: 3,
            excluded_files: 4,
            truncated: true,
            ..IngestionStats::default()
        };
        let mut l = label(Some("dev"), None);
        l.subpath = "/src";
        let text = summary(l, &stats, "");
        assert!(text.contains("Subpath: /src\n"));
        assert!(text.contains("Branch: dev\n"));
        assert!(text.contains("4 files left out"));
    }

    #[test]
    fn test_tree_listing_layout() {
        let listing = tree_listing("octocat/Hello-World", &sample_tree());
        assert_eq!(
            listing,
            "Directory structure:\n\
             └── octocat/Hello-World/\n    \
             ├── src/\n    \
             │   ├── lib.rs\n    \
             │   └── logo.png\n    \
             └── README.md\n"
        );
    }

    #[test]
    fn test_content_skips_files_without_content() {
        let content = concatenated_content(&sample_tree());
        let sep = "=".repeat(SEPARATOR_WIDTH);
        let expected = format!(
            "{sep}\nFile: src/lib.rs\n{sep}\npub mod a;\n\n{sep}\nFile: README.md\n{sep}\n# hello\n\n"
        );
        assert_eq!(content, expected);
        assert!(!content.contains("logo.png"));
    }

    #[test]
    fn test_digest_token_estimate_matches_content() {
        let stats = IngestionStats {
            accepted_files: 3,
            ..IngestionStats::default()
        };
        let digest = Digest::build(label(Some("main"), None), &stats, &sample_tree());
        let expected = format!("Estimated tokens: {}", estimate_tokens(&digest.content));
        assert!(digest.summary.contains(&expected));
        assert!(digest.tree.starts_with("Directory structure:"));
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(
            tree_listing("x", &[]),
            "Directory structure:\n└── x/\n"
        );
        assert_eq!(concatenated_content(&[]), "");
    }
}
