// src/tree/wrapper.rs
// =============================================================================
// Archive snapshots wrap everything in one synthetic folder, named after the
// repository and ref ("Hello-World-main/", "octocat-Hello-World-7fd1a60/").
// The first archive entry names the candidate folder. It only counts as a
// wrapper when every entry lives under it; then it is stripped from every
// path, so the tree starts at the repository root.
//
// Rust concepts:
// - Option<Self>: "no wrapper" is a normal outcome
// - &str vs String: borrow for checks, allocate only for results
// =============================================================================

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootWrapper {
    prefix: String,
}

impl RootWrapper {
    // Detects the wrapper from the first archive entry.
    //
    // "repo-main/README.md" -> wrapper "repo-main"
    // "repo-main/" (directory) -> wrapper "repo-main"
    // "README.md" (file at the top) -> no wrapper
    pub fn detect(first_path: &str, is_directory: bool) -> Option<Self> {
        let normalized = normalize_path(first_path);
        match normalized.split_once('/') {
            Some((first, _)) => Some(Self::new(first)),
            None if is_directory && !normalized.is_empty() => Some(Self::new(&normalized)),
            None => None,
        }
    }

    // Detects a wrapper that every entry actually lives under.
    //
    // The candidate comes from the first entry, as with detect(). If any
    // later entry sits outside it, the archive has no single wrapper and
    // paths are kept as they are.
    pub fn detect_shared<'a, I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut entries = entries.into_iter();
        let (first, is_directory) = entries.next()?;
        let candidate = Self::detect(first, is_directory)?;
        if entries.all(|(path, _)| candidate.contains(path)) {
            Some(candidate)
        } else {
            None
        }
    }

    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: normalize_path(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// True for the wrapper folder itself and everything below it.
    pub fn contains(&self, path: &str) -> bool {
        let normalized = normalize_path(path);
        normalized == self.prefix
            || normalized
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Root-relative form of `path`.
    ///
    /// Returns None for the wrapper itself (it must not become a node).
    /// Paths outside the wrapper are returned normalized but unchanged.
    pub fn strip(&self, path: &str) -> Option<String> {
        let normalized = normalize_path(path);
        if normalized == self.prefix {
            return None;
        }
        match normalized
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(rest) => Some(rest.to_string()),
            None => Some(normalized),
        }
    }
}

/// Slash-normalizes an archive path: backslashes become slashes, and empty,
/// "." and ".." segments are dropped.
pub fn normalize_path(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}
