/// Status and body of a catalog response, read in full.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal transport used by the catalog fetcher.
///
/// The production implementation is `reqwest::Client`; tests substitute a
/// scripted session so pagination can be exercised without a network.
#[async_trait::async_trait]
pub trait CatalogSession: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<RawResponse, reqwest::Error>;
}

#[async_trait::async_trait]
impl CatalogSession for reqwest::Client {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<RawResponse, reqwest::Error> {
        let mut builder = reqwest::Client::get(self, url);
        for &(k, v) in headers {
            builder = builder.header(k, v);
        }
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(RawResponse { status, body })
    }
}
