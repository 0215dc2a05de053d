use bytes::Bytes;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use super::throttle::Throttle;
use super::{FetchConfig, FetchError, PageFetcher, classify_response};

/// Plain HTTP fetcher: one shared client, a per-request timeout and a
/// politeness throttle.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
    throttle: Throttle,
}

impl HttpFetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"));
        let client = Client::builder()
            .timeout(cfg.timeout)
            .user_agent(cfg.user_agent.clone())
            .default_headers(headers)
            .build()?;
        Ok(HttpFetcher { client, throttle: Throttle::new(cfg.sleep) })
    }

    async fn get(&self, url: &str) -> Result<(u16, Option<String>, Bytes), FetchError> {
        self.throttle.wait().await;
        let resp = self.client.get(url).send().await.map_err(|e| FetchError::from_reqwest(url, e))?;
        let status = resp.status().as_u16();
        let waf = resp
            .headers()
            .get("x-amzn-waf-action")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.bytes().await.map_err(|e| FetchError::from_reqwest(url, e))?;
        Ok((status, waf, body))
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let (status, waf, body) = self.get(url).await?;
        if let Some(e) = classify_response(url, status, waf.as_deref(), body.len()) {
            return Err(e);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
        let (status, waf, body) = self.get(url).await?;
        // archives are never challenge pages; only the status matters
        let len = if status == 202 { usize::MAX } else { body.len() };
        if let Some(e) = classify_response(url, status, waf.as_deref(), len) {
            return Err(e);
        }
        Ok(body)
    }
}
