use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

use super::{FetchConfig, FetchError, PageFetcher, classify_response};

/// Fetches pages through an external headless-browser service that returns
/// the rendered DOM as HTML.
///
/// The service contract is `POST {endpoint}` with `{"url": ..., "wait_for": ...}`
/// and the rendered markup as the response body.
#[derive(Clone, Debug)]
pub struct RenderingFetcher {
    client: Client,
    endpoint: String,
    wait_for: Option<String>,
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for: Option<&'a str>,
}

impl RenderingFetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Option<Self>, FetchError> {
        let Some(endpoint) = cfg.render_url.clone() else { return Ok(None) };
        let client = Client::builder()
            .timeout(cfg.timeout)
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Some(RenderingFetcher { client, endpoint, wait_for: None }))
    }

    /// Ask the renderer to wait for a selector before snapshotting the DOM.
    pub fn wait_for(mut self, selector: &str) -> Self {
        self.wait_for = Some(selector.to_string());
        self
    }
}

impl PageFetcher for RenderingFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let req = RenderRequest { url, wait_for: self.wait_for.as_deref() };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&req)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| FetchError::from_reqwest(url, e))?;
        // the renderer passes the upstream status through
        if let Some(e) = classify_response(url, status, None, usize::MAX) {
            return Err(e);
        }
        if body.trim().is_empty() {
            return Err(FetchError::Render(format!("empty render for {url}")));
        }
        Ok(body)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
        Err(FetchError::Render(format!("binary downloads are not rendered: {url}")))
    }
}
