// src/github/archive.rs
// =============================================================================
// Downloads the compressed snapshot for one ref.
//
//   {archive_base}/{owner}/{name}/tar.gz/{ref}
//
// When a proxy is configured the request goes to `{proxy}?url=<that URL>`
// instead and the proxy relays the bytes unchanged.
//
// The ref is resolved with a fixed precedence: an explicit branch, else an
// explicit commit, else the repository's default branch.
//
// Rust concepts:
// - Streams: read the body chunk by chunk with StreamExt::next
// - let-else: early return when there is no proxy
// - Url builders: path_segments_mut and query_pairs_mut escape for us
// =============================================================================

use super::{transport_error, upstream_error, GitHubClient, RepositoryMetadata};
use crate::cancel::CancelContext;
use crate::error::{IngestError, IngestResult};
use crate::reference::RepositoryReference;
use futures::StreamExt;
use reqwest::StatusCode;
use tracing::{debug, info};
use url::Url;

/// Picks the ref to download.
pub fn resolve_ref(reference: &RepositoryReference, metadata: &RepositoryMetadata) -> String {
    reference
        .branch
        .clone()
        .or_else(|| reference.commit.clone())
        .unwrap_or_else(|| metadata.default_branch.clone())
}

impl GitHubClient {
    /// The URL actually requested for a snapshot, proxy included.
    pub fn archive_url(&self, owner: &str, name: &str, git_ref: &str) -> IngestResult<Url> {
        let mut direct = Url::parse(&self.host.archive_base).map_err(|e| {
            IngestError::InvalidReference(format!(
                "bad archive base '{}': {}",
                self.host.archive_base, e
            ))
        })?;
        direct
            .path_segments_mut()
            .map_err(|_| {
                IngestError::InvalidReference(format!(
                    "archive base '{}' cannot take a path",
                    self.host.archive_base
                ))
            })?
            .pop_if_empty()
            .extend([owner, name, "tar.gz"])
            // Branch names may contain slashes; keep them as path segments
            .extend(git_ref.split('/'));

        let Some(proxy) = &self.host.proxy else {
            return Ok(direct);
        };
        let mut relayed = Url::parse(proxy).map_err(|e| {
            IngestError::InvalidReference(format!("bad proxy endpoint '{}': {}", proxy, e))
        })?;
        relayed
            .query_pairs_mut()
            .append_pair("url", direct.as_str());
        Ok(relayed)
    }

    // Downloads the snapshot archive into memory.
    //
    // Returns: the raw .tar.gz bytes
    //
    // The body is read chunk by chunk inside the context, so a deadline or
    // cancellation also interrupts a slow transfer.
    pub async fn download_archive(
        &self,
        reference: &RepositoryReference,
        git_ref: &str,
        ctx: &CancelContext,
    ) -> IngestResult<Vec<u8>> {
        let url = self.archive_url(&reference.owner, &reference.name, git_ref)?;
        debug!(%url, "requesting archive");

        // Credentials go to the archive host only, never to the proxy
        let request = if self.host.proxy.is_some() {
            self.http.get(url.clone())
        } else {
            self.authorize(self.http.get(url.clone()))
        };

        let bytes = ctx
            .run("archive", async {
                let response = request.send().await.map_err(transport_error)?;

                match response.status() {
                    status if status.is_success() => {}
                    StatusCode::NOT_FOUND => {
                        return Err(IngestError::NotFound(format!(
                            "{}@{}",
                            reference.full_name(),
                            git_ref
                        )));
                    }
                    _ => return Err(upstream_error(response).await),
                }

                let mut bytes = Vec::new();
                let mut stream = response.bytes_stream();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(transport_error)?;
                    bytes.extend_from_slice(&chunk);
                }
                Ok(bytes)
            })
            .await?;

        info!(
            repository = %reference.full_name(),
            git_ref,
            bytes = bytes.len(),
            "downloaded archive"
        );
        Ok(bytes)
    }
}
