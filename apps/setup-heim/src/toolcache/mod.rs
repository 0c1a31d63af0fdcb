//! Runner tool cache and artifact fetching.
//!
//! [`ToolCache`] and [`Fetcher`] are the two filesystem/network seams the
//! installer depends on. The production implementations are
//! [`cache::FsToolCache`] and [`HttpFetcher`]; tests substitute recording
//! fakes.

pub mod archive;
pub mod cache;
pub mod download;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{Result, SetupError};
use crate::http::{self, DOWNLOAD_TIMEOUT_SECS, RetryPolicy};

/// A versioned, per-architecture store of installed tool trees.
#[async_trait]
pub trait ToolCache: Send + Sync {
    /// Returns the cached directory for the key, if a complete entry exists.
    fn find(&self, tool: &str, version: &str, arch: &str) -> Option<PathBuf>;

    /// Copies `source` into the cache under the key and returns the cached
    /// directory.
    async fn cache_dir(
        &self,
        source: &Path,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> Result<PathBuf>;
}

/// Downloads and unpacks release archives into scratch space.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads `url` to a fresh temporary file and returns its path.
    async fn download_tool(&self, url: &str) -> Result<PathBuf>;

    /// Extracts a ZIP archive into a fresh temporary directory.
    async fn extract_zip(&self, archive: &Path) -> Result<PathBuf>;

    /// Extracts a tar.gz archive into a fresh temporary directory.
    async fn extract_tar(&self, archive: &Path) -> Result<PathBuf>;
}

/// [`Fetcher`] backed by HTTP and a scratch directory.
///
/// Every download and extraction gets its own uuid-named entry under
/// `temp_dir`, so concurrent runs sharing a temp directory never collide.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    temp_dir: PathBuf,
    policy: RetryPolicy,
}

impl HttpFetcher {
    /// Creates a fetcher that stages files under `temp_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(temp_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            client: http::client(DOWNLOAD_TIMEOUT_SECS)?,
            temp_dir: temp_dir.into(),
            policy: RetryPolicy::download(),
        })
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn scratch_path(&self) -> PathBuf {
        self.temp_dir.join(Uuid::new_v4().to_string())
    }

    async fn extract_with(
        &self,
        archive: &Path,
        extract: fn(&Path, &Path) -> Result<()>,
    ) -> Result<PathBuf> {
        let dest = self.scratch_path();
        debug!("Extracting {} to {}", archive.display(), dest.display());

        let archive = archive.to_path_buf();
        let target = dest.clone();
        tokio::task::spawn_blocking(move || extract(&archive, &target))
            .await
            .map_err(|e| {
                SetupError::io(
                    "extraction task failed",
                    std::io::Error::other(e.to_string()),
                )
            })??;

        Ok(dest)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn download_tool(&self, url: &str) -> Result<PathBuf> {
        let dest = self.scratch_path();
        debug!("Downloading {url}");
        debug!("Destination {}", dest.display());
        download::download_file(&self.client, url, &dest, self.policy).await?;
        Ok(dest)
    }

    async fn extract_zip(&self, archive: &Path) -> Result<PathBuf> {
        self.extract_with(archive, self::archive::extract_zip).await
    }

    async fn extract_tar(&self, archive: &Path) -> Result<PathBuf> {
        self.extract_with(archive, self::archive::extract_tar_gz).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::time::Duration;

    fn tar_gz_bytes() -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let body = b"cli";
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "heim/bin/heim", body.as_slice())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn fetcher(temp: &Path) -> HttpFetcher {
        HttpFetcher::new(temp)
            .unwrap()
            .with_retry_policy(RetryPolicy::download().with_base_delay(Duration::from_millis(1)))
    }

    #[tokio::test]
    async fn downloads_land_in_distinct_scratch_files() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(b"payload")
            .expect(2)
            .create_async()
            .await;
        let temp = tempfile::tempdir().unwrap();
        let fetcher = fetcher(temp.path());
        let url = format!("{}/download?file=a.tar.gz&major=v1", server.url());

        let first = fetcher.download_tool(&url).await.unwrap();
        let second = fetcher.download_tool(&url).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(temp.path()));
        assert_eq!(std::fs::read(&second).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn downloaded_tarball_extracts_into_scratch_dir() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(tar_gz_bytes())
            .create_async()
            .await;
        let temp = tempfile::tempdir().unwrap();
        let fetcher = fetcher(temp.path());
        let url = format!("{}/download?file=heim_1.1.1_x86_64_linux.tar.gz&major=v1", server.url());

        let archive = fetcher.download_tool(&url).await.unwrap();
        let extracted = fetcher.extract_tar(&archive).await.unwrap();

        assert_eq!(extracted.parent(), Some(temp.path()));
        assert_eq!(std::fs::read(extracted.join("heim/bin/heim")).unwrap(), b"cli");
    }

    #[tokio::test]
    async fn extracting_garbage_fails() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("bad.zip");
        std::fs::write(&archive, b"nope").unwrap();

        let err = fetcher(temp.path()).extract_zip(&archive).await.unwrap_err();

        assert!(matches!(err, SetupError::ExtractionFailed { .. }));
    }
}
