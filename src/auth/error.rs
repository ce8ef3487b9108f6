use std::path::PathBuf;

use thiserror::Error;

/// Credential capture errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Nothing authenticated has been observed yet. Recoverable: the user
    /// has to produce catalog traffic (or pass the values) and try again.
    #[error(
        "No credential captured for {host} yet. Pass --token and --device-id \
         (or SUNO_TOKEN / SUNO_DEVICE_ID), or --har with a browser capture of suno.com"
    )]
    CredentialUnavailable { host: String },

    #[error("Invalid catalog API base URL: {0}")]
    InvalidApiBase(String),

    #[error("Failed to read HAR file {path}: {source}")]
    HarRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed HAR file {path}: {source}")]
    HarParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
