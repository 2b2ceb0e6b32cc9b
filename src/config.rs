// src/config.rs
// =============================================================================
// Configuration for one ingestion run and for the hosting endpoints.
//
// IngestionConfig holds the budgets (per-file size, file count, total size,
// timeout) and the user's filters. Every field has a default, so a request
// can override only what it cares about. HostConfig says where the hosting
// API and the archive downloads live.
//
// Both types derive Serialize/Deserialize so they can be loaded from a JSON
// file and echoed back in --json output.
//
// Rust concepts:
// - #[serde(default)]: missing JSON fields take their Default value
// - Default trait: one place for every limit
// - anyhow::Context: attach the file name to a read or parse error
// =============================================================================

use crate::tree::{NestingCollapse, SiblingOrder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MIB: u64 = 1024 * 1024;

/// Per-file ceiling for regular ingestion.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * MIB;
/// Per-file ceiling used by the alternate ingestion path.
pub const ALTERNATE_MAX_FILE_SIZE: u64 = 10 * MIB;
pub const DEFAULT_MAX_FILES: usize = 5_000;
pub const DEFAULT_MAX_TOTAL_SIZE: u64 = 100 * MIB;
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_ARCHIVE_BASE: &str = "https://codeload.github.com";

// Budgets and filters for a single ingestion.
//
// Each budget is checked independently. Going over one of them truncates
// the snapshot; it never fails the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestionConfig {
    /// Largest single file (bytes) that may be admitted.
    pub max_file_size: u64,
    /// Largest number of files that may be admitted.
    pub max_files: usize,
    /// Largest cumulative size (bytes) of admitted files.
    pub max_total_size: u64,
    /// Keep binary files (without content) instead of excluding them.
    pub include_binaries: bool,
    /// Raw include tokens. Validated when the run starts.
    pub include_patterns: Option<Vec<String>>,
    /// Raw exclude tokens. Validated when the run starts.
    pub exclude_patterns: Option<Vec<String>>,
    /// Deadline for the whole network part of the pipeline.
    pub timeout_ms: u64,
    pub sibling_order: SiblingOrder,
    pub nesting_collapse: NestingCollapse,
    /// Drop the single synthetic folder that archive snapshots wrap
    /// everything in.
    pub strip_root_wrapper: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
            include_binaries: false,
            include_patterns: None,
            exclude_patterns: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            sibling_order: SiblingOrder::default(),
            nesting_collapse: NestingCollapse::default(),
            strip_root_wrapper: true,
        }
    }
}

impl IngestionConfig {
    /// Defaults of the alternate ingestion path (larger per-file ceiling,
    /// README-first ordering).
    pub fn alternate() -> Self {
        Self {
            max_file_size: ALTERNATE_MAX_FILE_SIZE,
            sibling_order: SiblingOrder::ReadmeFirst,
            ..Self::default()
        }
    }

    /// Loads a config from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Stable string form of the config, used as part of cache keys.
    pub fn fingerprint(&self) -> String {
        // Serializing a plain struct of primitives cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

// Where the hosting API and archive snapshots are fetched from.
//
// `proxy` models the same-origin relay: when set, every archive URL is
// requested as `<proxy>?url=<archive url>` and the proxy relays the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
    pub api_base: String,
    pub archive_base: String,
    pub proxy: Option<String>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub user_agent: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            archive_base: DEFAULT_ARCHIVE_BASE.to_string(),
            proxy: None,
            token: None,
            user_agent: concat!("repo-ingest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestionConfig::default();
        assert_eq!(config.max_file_size, 5 * MIB);
        assert_eq!(config.max_total_size, 100 * MIB);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(!config.include_binaries);
        assert!(config.strip_root_wrapper);
        assert_eq!(config.sibling_order, SiblingOrder::DirectoriesFirst);
    }

    #[test]
    fn test_alternate_path_uses_larger_file_ceiling() {
        let config = IngestionConfig::alternate();
        assert_eq!(config.max_file_size, 10 * MIB);
        assert_eq!(config.sibling_order, SiblingOrder::ReadmeFirst);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: IngestionConfig =
            serde_json::from_str(r#"{"maxFiles": 3, "excludePatterns": ["dist/"]}"#).unwrap();
        assert_eq!(config.max_files, 3);
        assert_eq!(config.exclude_patterns, Some(vec!["dist/".to_string()]));
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_fingerprint_changes_with_budgets() {
        let a = IngestionConfig::default();
        let b = IngestionConfig {
            max_files: 1,
            ..IngestionConfig::default()
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), IngestionConfig::default().fingerprint());
    }

    #[test]
    fn test_token_is_not_serialized() {
        let host = HostConfig {
            token: Some("secret".into()),
            ..HostConfig::default()
        };
        let json = serde_json::to_string(&host).unwrap();
        assert!(!json.contains("secret"));
    }
}
