//! Streaming archive download.
//!
//! The body is streamed to a `.part` file next to the destination and
//! renamed into place once complete, so a failed download never leaves a
//! file at the destination path. Request-level retries are handled by
//! [`crate::http::get_with_retries`].

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::{Result, SetupError};
use crate::http::{self, RetryPolicy};

/// Minimum interval between progress log lines in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 2000;

/// Downloads `url` to `dest`.
///
/// # Errors
///
/// - [`SetupError::Io`] if `dest` already exists or cannot be written
/// - [`SetupError::DownloadFailed`] if the server answers with a non-success status
/// - [`SetupError::Transport`] if the connection fails or the body is cut short
pub async fn download_file(
    client: &Client,
    url: &str,
    dest: &Path,
    policy: RetryPolicy,
) -> Result<()> {
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        return Err(SetupError::io(
            format!("destination file path {} already exists", dest.display()),
            std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        ));
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SetupError::io(format!("failed to create {}", parent.display()), e))?;
    }

    let part = part_path(dest);
    match stream_to_file(client, url, &part, policy).await {
        Ok(()) => tokio::fs::rename(&part, dest).await.map_err(|e| {
            SetupError::io(
                format!("failed to rename {} to {}", part.display(), dest.display()),
                e,
            )
        }),
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            Err(e)
        }
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

async fn stream_to_file(client: &Client, url: &str, dest: &Path, policy: RetryPolicy) -> Result<()> {
    let response = http::get_with_retries(client, url, None, policy).await?;

    let status = response.status();
    if !status.is_success() {
        debug!("Failed to download from \"{url}\". Code({status})");
        return Err(SetupError::download_failed(status.as_u16(), url));
    }

    let total_size = response.content_length().unwrap_or(0);

    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| SetupError::io(format!("failed to create file {}", dest.display()), e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let start_time = Instant::now();
    let mut last_update = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| SetupError::Transport {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| SetupError::io(format!("failed to write to {}", dest.display()), e))?;
        downloaded += chunk.len() as u64;

        let now = Instant::now();
        if now.duration_since(last_update).as_millis() >= PROGRESS_INTERVAL_MS {
            debug!("{}/{}", format_bytes(downloaded), format_bytes(total_size));
            last_update = now;
        }
    }

    file.flush()
        .await
        .map_err(|e| SetupError::io(format!("failed to flush {}", dest.display()), e))?;

    info!(
        "Downloaded {} in {:.1}s",
        format_bytes(downloaded),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Formats bytes into a human-readable string (KB, MB, GB).
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}
