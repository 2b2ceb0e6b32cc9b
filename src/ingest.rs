// src/ingest.rs
// =============================================================================
// The pipeline: reference -> metadata -> archive -> scan -> tree.
//
// Stages run strictly one after another. The archive download needs the
// ref resolved from the metadata, and the scan needs the downloaded bytes.
// Both network stages share one CancelContext, so the configured timeout
// covers them together.
//
// Failures are returned as IngestFailure, which always carries statistics
// (zeroed when nothing was scanned yet). A budget running out is NOT a
// failure: the partial tree comes back with `stats.truncated` set.
//
// Rust concepts:
// - spawn_blocking: keep CPU-bound decompression off the async workers
// - Arc: share the cache between clones of the Ingestor
// - Result<T, IngestFailure>: errors that carry partial statistics
// =============================================================================

use crate::artifacts::{Digest, SnapshotLabel};
use crate::cache::{NoopCache, ResultCache};
use crate::cancel::CancelContext;
use crate::config::{HostConfig, IngestionConfig};
use crate::error::{IngestError, IngestFailure};
use crate::github::{resolve_ref, GitHubClient, RepositoryMetadata};
use crate::patterns::PatternRules;
use crate::reference::IngestSource;
use crate::scan::{scan_tar_gz, IngestionStats};
use crate::tree::{FileNode, TreeBuilder};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A finished ingestion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingestion {
    pub source: IngestSource,
    /// Hosted sources only.
    pub metadata: Option<RepositoryMetadata>,
    /// Branch the snapshot was taken from (explicit or default branch).
    pub branch: Option<String>,
    /// Commit the snapshot was taken from, when one was requested.
    pub commit: Option<String>,
    pub tree: Vec<FileNode>,
    pub stats: IngestionStats,
}

impl Ingestion {
    pub fn label(&self) -> SnapshotLabel<'_> {
        let name = match &self.metadata {
            Some(metadata) => metadata.full_name.as_str(),
            None => match &self.source {
                IngestSource::Hosted(reference) => reference.name.as_str(),
                IngestSource::Local(local) => local.name.as_str(),
            },
        };
        SnapshotLabel {
            name,
            subpath: self.source.subpath(),
            branch: self.branch.as_deref(),
            commit: self.commit.as_deref(),
        }
    }

    pub fn digest(&self) -> Digest {
        Digest::build(self.label(), &self.stats, &self.tree)
    }

    /// True when some budget cut content out of the snapshot.
    pub fn is_partial(&self) -> bool {
        self.stats.truncated
    }
}

/// Runs ingestions. Holds the HTTP client and the result cache.
pub struct Ingestor {
    client: GitHubClient,
    cache: Arc<dyn ResultCache<Ingestion>>,
}

impl Ingestor {
    pub fn new(host: HostConfig) -> Result<Self, IngestError> {
        Ok(Self {
            client: GitHubClient::new(host)?,
            cache: Arc::new(NoopCache),
        })
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache<Ingestion>>) -> Self {
        self.cache = cache;
        self
    }

    pub async fn ingest(
        &self,
        raw: &str,
        config: &IngestionConfig,
    ) -> Result<Arc<Ingestion>, IngestFailure> {
        self.ingest_with_token(raw, config, CancellationToken::new())
            .await
    }

    // Runs one ingestion.
    //
    // Parameters:
    //   raw: reference string, URL, or local archive path
    //   config: budgets and filters for this run
    //   token: lets the caller abort; the config's timeout applies as well
    //
    // Returns: the finished ingestion, shared with the cache
    pub async fn ingest_with_token(
        &self,
        raw: &str,
        config: &IngestionConfig,
        token: CancellationToken,
    ) -> Result<Arc<Ingestion>, IngestFailure> {
        // Input problems block the request before anything touches the network
        let rules = PatternRules::from_config(config)?;
        let source = match IngestSource::parse(raw) {
            IngestSource::Hosted(reference) => IngestSource::Hosted(reference.require_valid(raw)?),
            local => local,
        };
        info!(source = %source.cache_key(), "reference parsed");

        let key = format!("{}#{}", source.cache_key(), config.fingerprint());
        if let Some(hit) = self.cache.get(&key) {
            info!(%key, "cache hit");
            return Ok(hit);
        }

        let ctx = CancelContext::with_token(token, config.timeout());
        let (bytes, metadata, branch, commit) = match &source {
            IngestSource::Hosted(reference) => {
                let metadata = self.client.fetch_metadata(reference, &ctx).await?;
                let git_ref = resolve_ref(reference, &metadata);
                let bytes = self.client.download_archive(reference, &git_ref, &ctx).await?;
                let (branch, commit) = match &reference.commit {
                    Some(commit) => (None, Some(commit.clone())),
                    None => (Some(git_ref), None),
                };
                (bytes, Some(metadata), branch, commit)
            }
            IngestSource::Local(local) => {
                let path = local.path.clone();
                let bytes = ctx
                    .run("read", async move {
                        tokio::fs::read(&path).await.map_err(IngestError::from)
                    })
                    .await?;
                (bytes, None, None, None)
            }
        };

        // Scanning is synchronous CPU work over bytes already in memory
        let scan_config = config.clone();
        let subpath = source.subpath().to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            scan_tar_gz(&bytes, &scan_config, &rules, &subpath)
        })
        .await
        .map_err(|e| {
            IngestFailure::before_scan(IngestError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("scan task failed: {}", e),
            )))
        })??;

        if outcome.stats.truncated {
            warn!(
                excluded_files = outcome.stats.excluded_files,
                "snapshot truncated by a budget"
            );
        }

        let tree = TreeBuilder::from_config(config)
            .with_root_wrapper(outcome.wrapper)
            .build(outcome.entries);
        info!(roots = tree.len(), "tree built");

        let ingestion = Arc::new(Ingestion {
            source,
            metadata,
            branch,
            commit,
            tree,
            stats: outcome.stats,
        });
        self.cache.set(key, Arc::clone(&ingestion));
        Ok(ingestion)
    }

    pub fn invalidate(&self, raw: &str, config: &IngestionConfig) {
        let source = IngestSource::parse(raw);
        let key = format!("{}#{}", source.cache_key(), config.fingerprint());
        self.cache.invalidate(&key);
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why spawn_blocking for the scan?
//    - gzip decoding and tar parsing are plain CPU work with no .await
//    - Running them on an async worker would stall every other task there
//    - spawn_blocking moves the closure to a thread pool meant for this
//
// 2. Why `move` and the clones before spawn_blocking?
//    - The closure must own everything it uses ('static), because it may
//      outlive the current stack frame
//    - So the config, rules and subpath are cloned and moved in
//
// 3. What is Arc<dyn ResultCache<Ingestion>>?
//    - dyn: any type implementing the trait (TtlCache, NoopCache, your own)
//    - Arc: cloning the Ingestor shares the same cache instead of copying it
//
// 4. Why does a failure carry stats?
//    - IngestFailure { error, stats } lets the CLI report how far the scan
//      got before the archive turned out to be corrupt
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::error::ErrorKind;
    use crate::github::test_support::can_bind_localhost;
    use crate::scan::entry::fixtures::{tar_gz, Member};
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;
    use std::time::Duration;

    fn snapshot() -> Vec<u8> {
        tar_gz(&[
            Member::Dir("Hello-World-main/"),
            Member::File("Hello-World-main/README.md", b"# Hello"),
            Member::Dir("Hello-World-main/src/"),
            Member::File("Hello-World-main/src/index.ts", b"export {};"),
            Member::File("Hello-World-main/dist/app.js", b"bundled"),
        ])
    }

    fn host_for(server: &MockServer) -> HostConfig {
        HostConfig {
            api_base: server.base_url(),
            archive_base: server.base_url(),
            ..HostConfig::default()
        }
    }

    async fn mock_repo(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octocat/Hello-World");
                then.status(200).json_body(json!({
                    "name": "Hello-World",
                    "full_name": "octocat/Hello-World",
                    "owner": { "login": "octocat" },
                    "default_branch": "main"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/octocat/Hello-World/tar.gz/main");
                then.status(200).body(snapshot());
            })
            .await;
    }

    #[tokio::test]
    async fn test_hosted_ingestion_end_to_end() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start_async().await;
        mock_repo(&server).await;

        let ingestor = Ingestor::new(host_for(&server)).unwrap();
        let config = IngestionConfig {
            exclude_patterns: Some(vec!["dist/".to_string()]),
            ..IngestionConfig::default()
        };
        let ingestion = ingestor.ingest("octocat/Hello-World", &config).await.unwrap();

        let names: Vec<&str> = ingestion.tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["src", "README.md"]);
        assert_eq!(ingestion.branch.as_deref(), Some("main"));
        assert_eq!(ingestion.stats.accepted_files, 2);
        assert_eq!(ingestion.stats.excluded_files, 1);

        let digest = ingestion.digest();
        assert!(digest.summary.starts_with("Repository: octocat/Hello-World\n"));
        assert!(digest.summary.contains("Branch: main"));
        assert!(digest.content.contains("File: src/index.ts"));
        assert!(!digest.content.contains("bundled"));
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_requests() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start_async().await;
        mock_repo(&server).await;

        let ingestor = Ingestor::new(host_for(&server))
            .unwrap()
            .with_cache(Arc::new(TtlCache::new(Duration::from_secs(60))));
        let config = IngestionConfig::default();

        let first = ingestor.ingest("octocat/Hello-World", &config).await.unwrap();
        let second = ingestor
            .ingest("https://github.com/octocat/Hello-World", &config)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        ingestor.invalidate("octocat/Hello-World", &config);
        let third = ingestor.ingest("octocat/Hello-World", &config).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_invalid_input_fails_before_network() {
        // Unroutable hosts: any request would fail with a network error
        let ingestor = Ingestor::new(HostConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            archive_base: "http://127.0.0.1:9".to_string(),
            ..HostConfig::default()
        })
        .unwrap();

        let failure = ingestor
            .ingest("not-a-reference", &IngestionConfig::default())
            .await
            .unwrap_err();
        assert_eq!(failure.error.kind(), ErrorKind::InvalidInput);
        assert_eq!(failure.stats, IngestionStats::default());

        let config = IngestionConfig {
            include_patterns: Some(vec!["src/**.ts".to_string()]),
            ..IngestionConfig::default()
        };
        let failure = ingestor
            .ingest("octocat/Hello-World", &config)
            .await
            .unwrap_err();
        assert!(matches!(failure.error, IngestError::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn test_missing_repository_is_not_found() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octocat/missing");
                then.status(404).json_body(json!({ "message": "Not Found" }));
            })
            .await;

        let ingestor = Ingestor::new(host_for(&server)).unwrap();
        let failure = ingestor
            .ingest("octocat/missing", &IngestionConfig::default())
            .await
            .unwrap_err();
        assert_eq!(failure.error.kind(), ErrorKind::NotFound);
        assert_eq!(failure.error.status(), Some(404));
    }

    #[tokio::test]
    async fn test_caller_cancellation() {
        let ingestor = Ingestor::new(HostConfig::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let failure = ingestor
            .ingest_with_token("octocat/Hello-World", &IngestionConfig::default(), token)
            .await
            .unwrap_err();
        assert!(matches!(failure.error, IngestError::Cancelled { .. }));
        assert_eq!(failure.error.kind(), ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_local_archive_with_budget() {
        let mut file = tempfile::Builder::new().suffix(".tar.gz").tempfile().unwrap();
        std::io::Write::write_all(&mut file, &snapshot()).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let ingestor = Ingestor::new(HostConfig::default()).unwrap();
        let config = IngestionConfig {
            max_files: 1,
            ..IngestionConfig::default()
        };
        let ingestion = ingestor.ingest(&path, &config).await.unwrap();

        assert!(matches!(ingestion.source, IngestSource::Local(_)));
        assert!(ingestion.metadata.is_none());
        assert_eq!(ingestion.stats.accepted_files, 1);
        assert!(ingestion.is_partial());
        assert_eq!(ingestion.tree.len(), 1);
        assert_eq!(ingestion.tree[0].name, "README.md");
    }

    #[tokio::test]
    async fn test_local_archive_without_wrapper_keeps_every_file() {
        let bytes = tar_gz(&[
            Member::Dir("src/"),
            Member::File("src/main.rs", b"fn main() { nested }"),
            Member::File("main.rs", b"fn main() { top }"),
        ]);
        let mut file = tempfile::Builder::new().suffix(".tgz").tempfile().unwrap();
        std::io::Write::write_all(&mut file, &bytes).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let ingestor = Ingestor::new(HostConfig::default()).unwrap();
        let ingestion = ingestor.ingest(&path, &IngestionConfig::default()).await.unwrap();

        let files: usize = ingestion.tree.iter().map(FileNode::file_count).sum();
        assert_eq!(ingestion.stats.accepted_files, 2);
        assert_eq!(files, 2);
        let total: u64 = ingestion.tree.iter().map(FileNode::size).sum();
        assert_eq!(total, ingestion.stats.total_accepted_bytes);
    }

    #[tokio::test]
    async fn test_missing_local_archive_is_io_error() {
        let ingestor = Ingestor::new(HostConfig::default()).unwrap();
        let failure = ingestor
            .ingest("/definitely/not/here.tar.gz", &IngestionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(failure.error, IngestError::Io(_)));
    }
}
