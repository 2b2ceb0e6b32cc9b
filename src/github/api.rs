// src/github/api.rs
// =============================================================================
// Repository metadata from the GitHub REST API.
//
//   GET {api_base}/repos/{owner}/{name}
//
// 404 is reported as NotFound (nothing to retry). Every other non-2xx
// status becomes Upstream with the status and GitHub's message.
//
// Rust concepts:
// - serde rename: map GitHub's field names onto ours
// - Option<T> fields: absent JSON values stay None
// - async fn returning Result
// =============================================================================

use super::{transport_error, upstream_error, GitHubClient};
use crate::cancel::CancelContext;
use crate::error::{IngestError, IngestResult};
use crate::reference::RepositoryReference;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

/// What we keep from the API's repository record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryMetadata {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub default_branch: String,
    pub language: Option<String>,
    pub private: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// Wire format of GET /repos/{owner}/{repo}; only the fields we use
#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    full_name: String,
    owner: ApiOwner,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    default_branch: String,
    language: Option<String>,
    #[serde(default)]
    private: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

impl From<ApiRepository> for RepositoryMetadata {
    fn from(repo: ApiRepository) -> Self {
        Self {
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            default_branch: repo.default_branch,
            language: repo.language,
            private: repo.private,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }
}

impl GitHubClient {
    // Fetches metadata for `reference`.
    //
    // Parameters:
    //   reference: a valid hosted reference (owner/name are used)
    //   ctx: shared deadline/cancellation for the whole ingestion
    pub async fn fetch_metadata(
        &self,
        reference: &RepositoryReference,
        ctx: &CancelContext,
    ) -> IngestResult<RepositoryMetadata> {
        let url = format!(
            "{}/repos/{}/{}",
            self.host.api_base.trim_end_matches('/'),
            reference.owner,
            reference.name
        );

        let request = self
            .authorize(self.http.get(&url))
            .header("Accept", "application/vnd.github+json");

        let metadata = ctx
            .run("metadata", async {
                let response = request.send().await.map_err(transport_error)?;

                match response.status() {
                    status if status.is_success() => {}
                    StatusCode::NOT_FOUND => {
                        return Err(IngestError::NotFound(reference.full_name()));
                    }
                    _ => return Err(upstream_error(response).await),
                }

                let body = response.text().await.map_err(transport_error)?;
                let repo: ApiRepository =
                    serde_json::from_str(&body).map_err(|e| IngestError::Upstream {
                        status: 200,
                        message: "unexpected metadata response".to_string(),
                        details: Some(e.to_string()),
                    })?;
                Ok(RepositoryMetadata::from(repo))
            })
            .await?;

        info!(
            repository = %metadata.full_name,
            default_branch = %metadata.default_branch,
            stars = metadata.stars,
            "fetched repository metadata"
        );
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::github::test_support::can_bind_localhost;
    use crate::reference::parse_reference;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;
    use std::time::Duration;

    fn client_for(server: &MockServer, token: Option<&str>) -> GitHubClient {
        GitHubClient::new(HostConfig {
            api_base: server.base_url(),
            token: token.map(str::to_string),
            ..HostConfig::default()
        })
        .unwrap()
    }

    fn ctx() -> CancelContext {
        CancelContext::with_timeout(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_fetch_metadata_success() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octocat/Hello-World")
                    .header("authorization", "Bearer secret-token");
                then.status(200).json_body(json!({
                    "name": "Hello-World",
                    "full_name": "octocat/Hello-World",
                    "owner": { "login": "octocat" },
                    "description": "My first repository on GitHub!",
                    "stargazers_count": 80,
                    "forks_count": 9,
                    "default_branch": "master",
                    "language": null,
                    "private": false,
                    "created_at": "2011-01-26T19:01:12Z",
                    "updated_at": "2011-01-26T19:14:43Z"
                }));
            })
            .await;

        let client = client_for(&server, Some("secret-token"));
        let reference = parse_reference("octocat/Hello-World");
        let metadata = client.fetch_metadata(&reference, &ctx()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.owner, "octocat");
        assert_eq!(metadata.stars, 80);
        assert_eq!(metadata.forks, 9);
        assert_eq!(metadata.default_branch, "master");
        assert_eq!(metadata.language, None);
        assert!(metadata.created_at.is_some());
    }

    #[tokio::test]
    async fn test_fetch_metadata_not_found() {
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

        let client = client_for(&server, None);
        let err = client
            .fetch_metadata(&parse_reference("octocat/missing"), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(ref name) if name == "octocat/missing"));
    }

    #[tokio::test]
    async fn test_fetch_metadata_upstream_failure_keeps_status() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octocat/Hello-World");
                then.status(403)
                    .json_body(json!({ "message": "API rate limit exceeded" }));
            })
            .await;

        let client = client_for(&server, None);
        let err = client
            .fetch_metadata(&parse_reference("octocat/Hello-World"), &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("API rate limit exceeded"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_metadata_times_out() {
        if !can_bind_localhost() {
            eprintln!("Skipping httpmock tests: cannot bind to localhost");
            return;
        }
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octocat/slow");
                then.status(200).delay(Duration::from_secs(5)).body("{}");
            })
            .await;

        let client = client_for(&server, None);
        let short = CancelContext::with_timeout(Duration::from_millis(100));
        let err = client
            .fetch_metadata(&parse_reference("octocat/slow"), &short)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Timeout { stage: "metadata", .. }));
    }
}
