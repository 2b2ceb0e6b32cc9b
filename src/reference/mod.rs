// src/reference/mod.rs
// =============================================================================
// This module turns what the user typed into something we can ingest.
//
// Two kinds of input are supported:
// - Hosted repositories: "owner/name" or a github.com URL, optionally with a
//   "tree/<branch-or-commit>/<subpath>" suffix (see parse.rs)
// - Local archives: a filesystem path to a .tar.gz snapshot (see local.rs)
//
// IngestSource is the sum of both so the pipeline can branch once.
//
// Rust concepts:
// - Enums as sum types: a source is hosted OR local, never both
// - #[serde(tag = ...)]: readable JSON for enums
// - match on &self: borrow the variant's data without moving it
// =============================================================================

mod local;
mod parse;

pub use local::{looks_like_local_path, parse_local, LocalReference};
pub use parse::{is_commit_sha, parse_reference, RepositoryReference};

use serde::Serialize;

/// Where an ingestion reads its snapshot from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum IngestSource {
    Hosted(RepositoryReference),
    Local(LocalReference),
}

impl IngestSource {
    /// Classifies raw input. Filesystem-looking input becomes a local source,
    /// everything else goes through the hosted reference parser (and may come
    /// back with `is_valid == false`).
    pub fn parse(raw: &str) -> Self {
        if looks_like_local_path(raw) {
            IngestSource::Local(parse_local(raw))
        } else {
            IngestSource::Hosted(parse_reference(raw))
        }
    }

    /// Human-readable identity used in summaries ("owner/name" or the
    /// archive's name).
    pub fn display_name(&self) -> String {
        match self {
            IngestSource::Hosted(reference) => reference.full_name(),
            IngestSource::Local(local) => local.name.clone(),
        }
    }

    pub fn subpath(&self) -> &str {
        match self {
            IngestSource::Hosted(reference) => &reference.subpath,
            IngestSource::Local(local) => &local.subpath,
        }
    }

    /// Key that identifies the snapshot for caching purposes.
    pub fn cache_key(&self) -> String {
        match self {
            IngestSource::Hosted(reference) => format!(
                "{}@{}:{}",
                reference.canonical_url,
                reference.git_ref().unwrap_or("HEAD"),
                reference.subpath
            ),
            IngestSource::Local(local) => format!("local:{}", local.path.display()),
        }
    }
}
