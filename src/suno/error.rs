use thiserror::Error;

/// Errors from the paginated catalog fetch. Every variant aborts the whole
/// fetch; no partial catalog is handed back.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog page {page} returned HTTP {status}: {body}")]
    Status { page: u32, status: u16, body: String },

    #[error("Catalog page {page} request failed: {source}")]
    Http {
        page: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Catalog page {page} has a malformed body: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog fetch cancelled before page {page}")]
    Cancelled { page: u32 },
}

impl CatalogError {
    /// Page index the fetch stopped at.
    pub fn page(&self) -> u32 {
        match self {
            CatalogError::Status { page, .. }
            | CatalogError::Http { page, .. }
            | CatalogError::Decode { page, .. }
            | CatalogError::Cancelled { page } => *page,
        }
    }

    /// The catalog rejected the credential (expired or revoked token).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, CatalogError::Status { status: 401 | 403, .. })
    }
}
