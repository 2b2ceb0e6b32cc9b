// src/reference/parse.rs
// =============================================================================
// Parses hosted repository references.
//
// Supported formats:
//   - octocat/Hello-World
//   - github.com/octocat/Hello-World
//   - https://github.com/octocat/Hello-World(.git)
//   - https://github.com/octocat/Hello-World/tree/<branch>/<subpath>
//   - https://github.com/octocat/Hello-World/blob/<40-hex commit>/<file>
//
// Malformed input never produces an Err here. Instead the returned
// reference has `is_valid == false`, and callers must check it (or use
// `require_valid`, which converts it into an IngestError).
//
// Rust concepts:
// - url crate: parse and walk path segments
// - Lazy<Regex>: validated once, reused everywhere
// - Display: the canonical "owner/name" form
// =============================================================================

use crate::error::{IngestError, IngestResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

const GITHUB_HOST: &str = "github.com";

// GitHub account names: alphanumerics and single hyphens, max 39 chars
static OWNER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$").expect("valid regex"));

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid regex"));

static COMMIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").expect("valid regex"));

/// A parsed pointer to a repository, a branch or commit, and a subpath.
///
/// At most one of `branch`/`commit` is set. `subpath` is `/` for the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryReference {
    pub owner: String,
    pub name: String,
    pub is_valid: bool,
    pub canonical_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub subpath: String,
}

impl RepositoryReference {
    fn invalid() -> Self {
        Self::default()
    }

    /// "owner/name"
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// The explicitly requested ref: branch wins over commit.
    pub fn git_ref(&self) -> Option<&str> {
        self.branch.as_deref().or(self.commit.as_deref())
    }

    pub fn is_root(&self) -> bool {
        self.subpath == "/"
    }

    /// Turns the validity flag into a Result for `?`-style callers.
    pub fn require_valid(self, raw: &str) -> IngestResult<Self> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(IngestError::InvalidReference(raw.to_string()))
        }
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(git_ref) = self.git_ref() {
            write!(f, "@{}", git_ref)?;
        }
        if !self.is_root() {
            write!(f, ":{}", self.subpath)?;
        }
        Ok(())
    }
}

/// True for a full 40-character hexadecimal commit id.
pub fn is_commit_sha(segment: &str) -> bool {
    COMMIT_RE.is_match(segment)
}

// Parses a raw reference string.
//
// Parameters:
//   raw: URL or bare "owner/name[/tree/<ref>/<subpath>]"
//
// Returns: a RepositoryReference; check `is_valid` before using it
//
// Example:
//   "https://github.com/octocat/Hello-World/tree/main/src"
//     -> owner "octocat", name "Hello-World", branch "main", subpath "/src"
pub fn parse_reference(raw: &str) -> RepositoryReference {
    let Some(path) = strip_host(raw.trim()) else {
        return RepositoryReference::invalid();
    };

    // Query strings and fragments never carry path information
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return RepositoryReference::invalid();
    }

    let owner = segments[0];
    let name = segments[1].trim_end_matches(".git");
    if !OWNER_RE.is_match(owner) || !NAME_RE.is_match(name) || name == "." || name == ".." {
        return RepositoryReference::invalid();
    }

    let mut reference = RepositoryReference {
        owner: owner.to_string(),
        name: name.to_string(),
        is_valid: true,
        canonical_url: format!("https://{}/{}/{}", GITHUB_HOST, owner, name),
        branch: None,
        commit: None,
        subpath: "/".to_string(),
    };

    if segments.len() == 2 {
        return reference;
    }

    // Third segment must say what kind of path follows
    if !matches!(segments[2], "tree" | "blob") {
        return RepositoryReference::invalid();
    }
    let Some(git_ref) = segments.get(3) else {
        return RepositoryReference::invalid();
    };

    if is_commit_sha(git_ref) {
        reference.commit = Some(git_ref.to_lowercase());
    } else {
        reference.branch = Some(git_ref.to_string());
    }

    if segments.len() > 4 {
        reference.subpath = format!("/{}", segments[4..].join("/"));
    }

    reference
}

// Removes the scheme and host from URL-style input.
//
// Returns None when the input names a host other than github.com.
// Bare "owner/name" input is returned unchanged.
fn strip_host(input: &str) -> Option<&str> {
    let had_scheme = input.starts_with("https://") || input.starts_with("http://");
    let rest = input
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    if let Some(path) = rest.strip_prefix(GITHUB_HOST) {
        // "github.com" alone, or "github.com/..."; reject "github.community/..."
        return match path.chars().next() {
            None => Some(""),
            Some('/') => Some(path),
            Some(_) => None,
        };
    }

    // A dotted first segment is some other host. Owner names cannot
    // contain dots, so this never rejects a bare "owner/name".
    let first = rest.split('/').next().unwrap_or_default();
    if had_scheme || first.contains('.') {
        return None;
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_owner_name() {
        let reference = parse_reference("octocat/Hello-World");
        assert!(reference.is_valid);
        assert_eq!(reference.owner, "octocat");
        assert_eq!(reference.name, "Hello-World");
        assert_eq!(reference.subpath, "/");
        assert_eq!(reference.branch, None);
        assert_eq!(reference.commit, None);
        assert_eq!(reference.canonical_url, "https://github.com/octocat/Hello-World");
    }

    #[test]
    fn test_parse_tree_url_with_subpath() {
        let reference = parse_reference("https://github.com/octocat/Hello-World/tree/main/src");
        assert!(reference.is_valid);
        assert_eq!(reference.owner, "octocat");
        assert_eq!(reference.name, "Hello-World");
        assert_eq!(reference.branch.as_deref(), Some("main"));
        assert_eq!(reference.commit, None);
        assert_eq!(reference.subpath, "/src");
    }

    #[test]
    fn test_parse_commit_ref() {
        let sha = "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d";
        let reference = parse_reference(&format!("octocat/Hello-World/blob/{}/README", sha));
        assert!(reference.is_valid);
        assert_eq!(reference.commit.as_deref(), Some(sha));
        assert_eq!(reference.branch, None);
        assert_eq!(reference.subpath, "/README");
    }

    #[test]
    fn test_short_hex_is_a_branch() {
        let reference = parse_reference("octocat/Hello-World/tree/7fd1a60");
        assert_eq!(reference.branch.as_deref(), Some("7fd1a60"));
        assert_eq!(reference.commit, None);
    }

    #[test]
    fn test_too_few_segments_is_invalid() {
        assert!(!parse_reference("octocat").is_valid);
        assert!(!parse_reference("").is_valid);
        assert!(!parse_reference("https://github.com/octocat").is_valid);
        assert!(!parse_reference("https://github.com/").is_valid);
    }

    #[test]
    fn test_invalid_reference_has_no_fields() {
        let reference = parse_reference("octocat");
        assert_eq!(reference.owner, "");
        assert_eq!(reference.name, "");
        assert_eq!(reference.branch, None);
    }

    #[test]
    fn test_unknown_path_marker_is_invalid() {
        assert!(!parse_reference("octocat/Hello-World/issues/1").is_valid);
        assert!(!parse_reference("octocat/Hello-World/tree").is_valid);
    }

    #[test]
    fn test_parse_with_git_suffix_and_www() {
        let reference = parse_reference("http://www.github.com/user/repo.git");
        assert!(reference.is_valid);
        assert_eq!(reference.owner, "user");
        assert_eq!(reference.name, "repo");
    }

    #[test]
    fn test_query_and_trailing_slash_ignored() {
        let reference = parse_reference("github.com/user/repo/?tab=readme#top");
        assert!(reference.is_valid);
        assert_eq!(reference.name, "repo");
        assert!(reference.is_root());
    }

    #[test]
    fn test_other_hosts_are_invalid() {
        assert!(!parse_reference("https://gitlab.com/user/repo").is_valid);
        assert!(!parse_reference("gitlab.com/user/repo").is_valid);
        assert!(!parse_reference("https://github.community/user/repo").is_valid);
    }

    #[test]
    fn test_require_valid() {
        assert!(parse_reference("a/b").require_valid("a/b").is_ok());
        let err = parse_reference("nope").require_valid("nope").unwrap_err();
        assert!(matches!(err, IngestError::InvalidReference(_)));
    }

    #[test]
    fn test_display() {
        let reference = parse_reference("octocat/Hello-World/tree/dev/docs/api");
        assert_eq!(reference.to_string(), "octocat/Hello-World@dev:/docs/api");
    }
}
