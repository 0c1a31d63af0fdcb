//! Release lookup against the Heim release service.
//!
//! `GET {base}/release?version={specifier}` answers with a single release
//! record:
//!
//! ```json
//! {
//!   "name": "heim",
//!   "version": "1.1.1",
//!   "date": "2024-05-02",
//!   "assets": [
//!     { "name": "heim_1.1.1_x86_64_linux.tar.gz", "download_url": "https://..." }
//!   ]
//! }
//! ```
//!
//! Any status other than 200, or a `null` body, means the service knows no
//! release for that specifier.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{Result, SetupError};
use crate::http::{self, RetryPolicy};

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    /// Artifact file name.
    pub name: String,
    /// Direct download URL for the artifact.
    pub download_url: String,
}

/// A release record as returned by the release service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Product name.
    pub name: String,
    /// Canonical semantic version of the release.
    pub version: String,
    /// Publication date.
    pub date: String,
    /// Artifacts published with the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Resolves a floating specifier to the release it currently designates.
#[async_trait]
pub trait ReleaseLookup: Send + Sync {
    /// Looks up the release matching `specifier`, passed through verbatim.
    ///
    /// Returns `Ok(None)` when the service has no matching release.
    async fn find_release(&self, specifier: &str) -> Result<Option<ReleaseRecord>>;
}

/// [`ReleaseLookup`] backed by the HTTP release service.
#[derive(Debug, Clone)]
pub struct HttpReleaseLookup {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl HttpReleaseLookup {
    /// Creates a lookup against `base_url` (e.g. `https://cloud.heim.dev/heim`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::client(http::LOOKUP_TIMEOUT_SECS)?,
            base_url: base_url.into(),
            policy: RetryPolicy::lookup(),
        })
    }

    /// Overrides the retry policy.
    #[cfg(test)]
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn release_url(&self, specifier: &str) -> String {
        format!("{}/release?version={specifier}", self.base_url)
    }
}

#[async_trait]
impl ReleaseLookup for HttpReleaseLookup {
    async fn find_release(&self, specifier: &str) -> Result<Option<ReleaseRecord>> {
        let url = self.release_url(specifier);
        debug!("Looking up release: {url}");

        let response =
            http::get_with_retries(&self.client, &url, Some("application/json"), self.policy)
                .await?;

        if response.status() != StatusCode::OK {
            debug!("Release lookup answered {}", response.status());
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|source| SetupError::Transport {
                url: url.clone(),
                source,
            })?;

        serde_json::from_str::<Option<ReleaseRecord>>(&body).map_err(|e| {
            SetupError::InvalidResponse {
                url,
                source: Box::new(e),
            }
        })
    }
}
