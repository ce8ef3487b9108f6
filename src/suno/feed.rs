use std::collections::HashSet;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::CatalogError;
use super::session::CatalogSession;
use super::types::{FeedPage, SongRecord};
use crate::auth::Credential;

/// Fixed server-side filter: no disliked tracks, generated stems or studio clips.
const FEED_FILTER: &str = "hide_disliked=true&hide_gen_stems=true&hide_studio_clips=true";

/// Walks `/api/feed/v2` page by page and assembles the whole library.
pub struct CatalogFetcher {
    session: Box<dyn CatalogSession>,
    api_base: String,
    page_delay: Duration,
}

impl CatalogFetcher {
    pub fn new(session: Box<dyn CatalogSession>, api_base: &str, page_delay: Duration) -> Self {
        Self {
            session,
            api_base: api_base.trim_end_matches('/').to_string(),
            page_delay,
        }
    }

    pub fn page_url(&self, page: u32) -> String {
        format!("{}/api/feed/v2?{}&page={}", self.api_base, FEED_FILTER, page)
    }

    /// Fetch and decode a single catalog page.
    pub async fn fetch_page(
        &self,
        credential: &Credential,
        page: u32,
    ) -> Result<FeedPage, CatalogError> {
        let url = self.page_url(page);
        let authorization = credential.authorization_header();
        let headers = [
            ("authorization", authorization.as_str()),
            ("device-id", credential.device_id.as_str()),
            ("accept", "*/*"),
        ];

        debug!("Catalog GET {}", url);
        let response = self
            .session
            .get(&url, &headers)
            .await
            .map_err(|source| CatalogError::Http { page, source })?;

        if response.status != 200 {
            return Err(CatalogError::Status {
                page,
                status: response.status,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|source| CatalogError::Decode { page, source })
    }

    /// Fetch every page, starting at 0, until one reports `has_more: false`.
    ///
    /// Any failing page aborts the whole fetch. Cancellation is honoured
    /// before each request and during the courtesy delay between pages.
    pub async fn fetch_all(
        &self,
        credential: &Credential,
        shutdown_token: &CancellationToken,
    ) -> Result<Vec<SongRecord>, CatalogError> {
        let mut songs: Vec<SongRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page: u32 = 0;

        loop {
            if shutdown_token.is_cancelled() {
                return Err(CatalogError::Cancelled { page });
            }

            let feed = self.fetch_page(credential, page).await?;
            debug!(
                page,
                clips = feed.clips.len(),
                has_more = feed.has_more,
                "Fetched catalog page"
            );

            for clip in feed.clips {
                if seen.insert(clip.id.clone()) {
                    songs.push(clip);
                } else {
                    warn!(id = %clip.id, page, "Dropping duplicate song from catalog page");
                }
            }

            if !feed.has_more {
                break;
            }
            page += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.page_delay) => {}
                _ = shutdown_token.cancelled() => {
                    return Err(CatalogError::Cancelled { page });
                }
            }
        }

        Ok(songs)
    }
}
