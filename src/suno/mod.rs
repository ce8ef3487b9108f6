//! Suno catalog client: wire types, the transport seam and the paginated
//! feed fetcher.

pub mod error;
pub mod feed;
pub mod session;
pub mod types;

pub use error::CatalogError;
pub use feed::CatalogFetcher;
pub use types::{Project, SongRecord, Visibility};

/// Default catalog host.
pub const DEFAULT_API_BASE: &str = "https://studio-api.prod.suno.com";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// HTTP client shared by the catalog fetch and the asset downloads.
///
/// No request timeout is configured: a hung remote call stalls the run.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .build()
}
