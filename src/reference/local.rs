// src/reference/local.rs
// =============================================================================
// Companion mode of the reference parser: local snapshot archives.
//
// A local source has no owner/name, so it is keyed by a generated id
// instead. The rest of the pipeline (scan, tree, artifacts) is identical.
//
// Rust concepts:
// - PathBuf: owned filesystem paths
// - uuid: a fresh identifier per parse
// =============================================================================

use super::parse::parse_reference;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A snapshot archive on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalReference {
    pub id: Uuid,
    pub path: PathBuf,
    pub name: String,
    pub subpath: String,
}

/// True when the input is clearly a filesystem path rather than
/// "owner/name" or a URL.
///
/// Path prefixes decide first, then anything with a scheme or the GitHub
/// host is hosted. An archive suffix only means "local" when the input is
/// not a tree/blob reference to a file inside a repository.
pub fn looks_like_local_path(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.starts_with('/')
        || raw.starts_with("./")
        || raw.starts_with("../")
        || raw.starts_with("~/")
    {
        return true;
    }
    if raw.contains("://") || raw.starts_with("github.com/") || raw.starts_with("www.github.com/")
    {
        return false;
    }
    if !(raw.ends_with(".tar.gz") || raw.ends_with(".tgz")) {
        return false;
    }
    // "owner/name/blob/main/release.tgz" names a file in a repository
    let hosted = parse_reference(raw);
    !(hosted.is_valid && hosted.git_ref().is_some())
}

pub fn parse_local(raw: &str) -> LocalReference {
    let path = expand_home(raw.trim());
    let name = archive_name(&path);
    LocalReference {
        id: Uuid::new_v4(),
        path,
        name,
        subpath: "/".to_string(),
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}

// "snapshots/my-repo.tar.gz" -> "my-repo"
fn archive_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(".tar.gz")
        .or_else(|| file_name.strip_suffix(".tgz"))
        .unwrap_or(&file_name);
    if stem.is_empty() {
        "local".to_string()
    } else {
        stem.to_string()
    }
}
