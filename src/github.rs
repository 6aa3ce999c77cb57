//! Release listing from the GitHub REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::types::Release;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REPO: &str = "grpc/grpc";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("grpc-versions/", env!("CARGO_PKG_VERSION"));

/// Somewhere releases can be listed from, newest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn fetch_releases(&self, limit: u8) -> Result<Vec<Release>, FetchError>;
}

pub struct GitHubReleases {
    client: reqwest::Client,
    api_url: String,
    repo: String,
    token: Option<String>,
}

impl GitHubReleases {
    pub fn new(api_url: &str, repo: &str, token: Option<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            token,
        })
    }

    fn releases_url(&self) -> String {
        format!("{}/repos/{}/releases", self.api_url, self.repo)
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    async fn fetch_releases(&self, limit: u8) -> Result<Vec<Release>, FetchError> {
        let url = self.releases_url();
        debug!(%url, limit, "fetching releases");

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .query(&[("per_page", limit)]);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(self.repo.clone()));
        }
        if is_rate_limited(status, response.headers()) {
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(FetchError::Status { status, url });
        }

        let body = response.text().await?;
        let releases: Vec<Release> = serde_json::from_str(&body).map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;
        debug!(count = releases.len(), "fetched releases");
        Ok(releases)
    }
}

/// GitHub signals primary rate limits with 403 and an exhausted quota, and
/// secondary ones with 429.
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0"))
}

fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
