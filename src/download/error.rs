use thiserror::Error;

/// Typed asset-transfer errors enabling retry classification.
///
/// `is_retryable()` separates transient failures (rate limits, server
/// errors, dropped connections) from permanent ones (missing assets, disk
/// failures) so the retry loop can give up early.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error {status} downloading {path}")]
    HttpStatus { status: u16, path: String },

    #[error("HTTP error downloading {path}: {source}")]
    Http {
        source: reqwest::Error,
        path: String,
    },

    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("Failed to encode metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Giving up on {path} after {retries} retries: {last_error}")]
    RetriesExhausted {
        retries: u32,
        path: String,
        last_error: String,
    },
}

impl DownloadError {
    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            DownloadError::Http { .. } => true,
            DownloadError::Disk(_) => false,
            DownloadError::Metadata(_) => false,
            DownloadError::RetriesExhausted { .. } => false,
        }
    }
}
