// src/github/mod.rs
// =============================================================================
// This module talks to GitHub.
//
// Currently implements:
// - Fetching repository metadata from the REST API (api.rs)
// - Downloading a .tar.gz snapshot for a branch or commit (archive.rs),
//   optionally relayed through a same-origin proxy endpoint
//
// Both requests run under the same CancelContext, so together they can
// never take longer than the ingestion timeout.
//
// Rust concepts:
// - Modules: Organizing related functionality
// - Public API: What other parts of the app can use
// =============================================================================

mod api;
mod archive;

pub use api::RepositoryMetadata;
pub use archive::resolve_ref;

use crate::config::HostConfig;
use crate::error::{IngestError, IngestResult};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

/// HTTP client for the hosting API and archive endpoints.
///
/// Cheap to clone: reqwest's Client is reference counted internally.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    host: HostConfig,
}

impl GitHubClient {
    pub fn new(host: HostConfig) -> IngestResult<Self> {
        // No per-request timeout here: the CancelContext owns the deadline
        let http = Client::builder()
            .user_agent(host.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| IngestError::Network(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { http, host })
    }

    pub fn host(&self) -> &HostConfig {
        &self.host
    }

    // Adds the bearer token, if one is configured
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.host.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

// Body GitHub sends along with error statuses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// Turns a non-2xx response into an Upstream error, keeping the server's
// message when it sent one.
async fn upstream_error(response: Response) -> IngestError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    let details = if body.is_empty() { None } else { Some(body) };
    IngestError::Upstream {
        status: status.as_u16(),
        message,
        details,
    }
}

// Categorizes transport errors from reqwest
fn transport_error(error: reqwest::Error) -> IngestError {
    if error.is_connect() {
        IngestError::Network(format!("connection failed: {}", error))
    } else if error.is_redirect() {
        IngestError::Network("too many redirects".to_string())
    } else {
        IngestError::Network(error.to_string())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a struct instead of free functions?
//    - The client and host settings are needed by every request
//    - Bundling them means callers pass one value around
//    - reqwest::Client keeps a connection pool, so reusing it is faster
//
// 2. What is `async fn upstream_error`?
//    - Reading the response body is I/O, so it has to be awaited
//    - unwrap_or_default() turns a failed read into an empty string
//      because the status code alone is still a useful error
// -----------------------------------------------------------------------------
