//! Ref source backed by a git host's smart-HTTP endpoint
//!
//! This module provides:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry on rate limits and transport errors
//! - A per-repository cache of the parsed ref listing

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{GitRef, RefListing, RefSource};
use crate::error::PolicyError;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("depgate/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// Lists refs of a remote repository over HTTP
pub struct HttpRefSource {
    client: Client,
    repo_url: String,
    max_retries: u32,
    listing: OnceCell<RefListing>,
}

impl HttpRefSource {
    /// Create a ref source with default settings
    pub fn new(repo_url: impl Into<String>) -> Result<Self, PolicyError> {
        Self::with_config(repo_url, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a ref source with custom timeout and User-Agent
    pub fn with_config(
        repo_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, PolicyError> {
        let repo_url = repo_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                PolicyError::git_host_unreachable(
                    &repo_url,
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            repo_url,
            max_retries: MAX_RETRIES,
            listing: OnceCell::new(),
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// `<repo>.git/info/refs?service=git-upload-pack`
    pub fn upload_pack_url(&self) -> String {
        let base = self.repo_url.trim_end_matches('/');
        let base = base.strip_suffix(".git").unwrap_or(base);
        format!("{}.git/info/refs?service=git-upload-pack", base)
    }

    async fn listing(&self) -> Result<&RefListing, PolicyError> {
        self.listing
            .get_or_try_init(|| async {
                let body = self.fetch_upload_pack().await?;
                Ok::<_, PolicyError>(RefListing::parse_upload_pack(&body))
            })
            .await
    }

    async fn fetch_upload_pack(&self) -> Result<String, PolicyError> {
        let url = self.upload_pack_url();
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            debug!(url = %url, attempt, "fetching ref advertisement");

            match self.client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(self.unreachable("rate limit exceeded"));

                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            delay *= 2;
                            continue;
                        }
                        break;
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(self.unreachable("repository not found"));
                    }

                    if !status.is_success() {
                        return Err(self.unreachable(format!("HTTP {}", status)));
                    }

                    return response
                        .text()
                        .await
                        .map_err(|e| self.unreachable(format!("failed to read response: {}", e)));
                }
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        self.unreachable("request timed out")
                    } else {
                        self.unreachable(e.to_string())
                    });

                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| self.unreachable("unknown error")))
    }

    fn unreachable(&self, message: impl Into<String>) -> PolicyError {
        PolicyError::git_host_unreachable(&self.repo_url, message)
    }
}

#[async_trait]
impl RefSource for HttpRefSource {
    async fn tags(&self) -> Result<Vec<GitRef>, PolicyError> {
        Ok(self.listing().await?.tags.clone())
    }

    async fn branches(&self) -> Result<Vec<GitRef>, PolicyError> {
        Ok(self.listing().await?.branches.clone())
    }

    async fn default_branch(&self) -> Result<Option<String>, PolicyError> {
        Ok(self.listing().await?.default_branch.clone())
    }
}
