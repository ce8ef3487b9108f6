use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use super::error::DownloadError;
use super::storage::Storage;
use crate::retry::{self, RetryAction, RetryConfig};

/// `<dest>.part`, the staging file for `dest`.
pub(super) fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Download `url` to `dest` through a `.part` sibling.
///
/// Each attempt starts from an empty `.part` file; on success it is renamed
/// into place, on failure it is removed so no partial file survives.
/// Transient failures are retried with backoff. Returns the bytes written.
pub async fn download_file(
    client: &Client,
    storage: &dyn Storage,
    url: &str,
    dest: &Path,
    retry_config: &RetryConfig,
) -> Result<u64, DownloadError> {
    let part = part_path(dest);

    let result = retry::retry_with_backoff(
        retry_config,
        |e: &DownloadError| {
            if e.is_retryable() {
                RetryAction::Retry
            } else {
                RetryAction::Abort
            }
        },
        || async {
            let attempt = attempt_download(client, storage, url, dest, &part).await;
            if attempt.is_err() && storage.exists(&part).await {
                if let Err(e) = storage.remove_file(&part).await {
                    tracing::warn!("Could not remove {}: {}", part.display(), e);
                }
            }
            attempt
        },
    )
    .await;

    result.map_err(|e| {
        if e.is_retryable() {
            DownloadError::RetriesExhausted {
                retries: retry_config.max_retries,
                path: dest.display().to_string(),
                last_error: e.to_string(),
            }
        } else {
            e
        }
    })
}

/// Single streaming attempt.
async fn attempt_download(
    client: &Client,
    storage: &dyn Storage,
    url: &str,
    dest: &Path,
    part: &Path,
) -> Result<u64, DownloadError> {
    let path_str = dest.display().to_string();
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| DownloadError::Http {
            source,
            path: path_str.clone(),
        })?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            status: response.status().as_u16(),
            path: path_str,
        });
    }

    let mut sink = storage.create(part).await?;
    let mut bytes_written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| {
            tracing::warn!(
                "Body error for {} after {} bytes: {}",
                path_str,
                bytes_written,
                source
            );
            DownloadError::Http {
                source,
                path: path_str.clone(),
            }
        })?;
        sink.write_all(&chunk).await?;
        bytes_written += chunk.len() as u64;
    }
    sink.flush().await?;
    sink.shutdown().await?;
    drop(sink);

    storage.rename(part, dest).await?;
    tracing::debug!(bytes = bytes_written, path = %dest.display(), "Downloaded");
    Ok(bytes_written)
}
