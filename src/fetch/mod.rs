//! Page fetching. Parsers never touch the network; they receive markup from
//! a `PageFetcher`.

use std::future::Future;

use bytes::Bytes;

pub mod config;
pub mod fallback;
pub mod http;
pub mod render;
mod throttle;

pub use config::FetchConfig;
pub use fallback::FallbackFetcher;
pub use http::HttpFetcher;
pub use render::RenderingFetcher;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("404 not found: {url}")]
    NotFound { url: String },

    #[error("bot challenge served for {url}")]
    Challenged { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("render service: {0}")]
    Render(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotFound { .. } => "http_404",
            FetchError::Challenged { .. } => "challenge",
            FetchError::Status { .. } => "http_status",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Http(_) => "transport",
            FetchError::Render(_) => "render",
        }
    }

    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() { FetchError::Timeout { url: url.to_string() } } else { FetchError::Http(e) }
    }
}

pub trait PageFetcher: Send + Sync {
    /// Raw markup for `url`.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// Raw bytes for `url` (archives).
    fn fetch_bytes(&self, url: &str) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

/// Plain HTTP with a rendering retry on bot challenges, when a renderer is configured.
pub fn plain_with_fallback(cfg: &FetchConfig) -> Result<FallbackFetcher<HttpFetcher, RenderingFetcher>, FetchError> {
    Ok(FallbackFetcher::new(HttpFetcher::new(cfg)?, RenderingFetcher::new(cfg)?))
}

/// Bodies shorter than this on a 202 are treated as a bot challenge page.
pub const CHALLENGE_BODY_LIMIT: usize = 10_000;

/// Classify a completed response. `None` means the body is usable.
pub fn classify_response(url: &str, status: u16, waf_action: Option<&str>, body_len: usize) -> Option<FetchError> {
    if waf_action.is_some_and(|a| a.trim().eq_ignore_ascii_case("challenge")) {
        return Some(FetchError::Challenged { url: url.to_string() });
    }
    if status == 202 && body_len < CHALLENGE_BODY_LIMIT {
        return Some(FetchError::Challenged { url: url.to_string() });
    }
    if status == 404 {
        return Some(FetchError::NotFound { url: url.to_string() });
    }
    if !(200..300).contains(&status) {
        return Some(FetchError::Status { url: url.to_string(), status });
    }
    None
}

#[cfg(test)]
pub(crate) mod stub {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Clone)]
    pub enum StubPage {
        Html(String),
        Bytes(Vec<u8>),
        NotFound,
        Timeout,
        Challenged,
    }

    /// In-memory fetcher keyed by exact URL; unknown URLs are 404s.
    #[derive(Default)]
    pub struct StubFetcher {
        pages: HashMap<String, StubPage>,
        pub calls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        pub fn new() -> Self { Self::default() }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), StubPage::Html(html.to_string()));
            self
        }

        pub fn bytes(mut self, url: &str, body: Vec<u8>) -> Self {
            self.pages.insert(url.to_string(), StubPage::Bytes(body));
            self
        }

        pub fn fail(mut self, url: &str, page: StubPage) -> Self {
            self.pages.insert(url.to_string(), page);
            self
        }

        fn lookup(&self, url: &str) -> Result<StubPage, FetchError> {
            if let Ok(mut calls) = self.calls.lock() { calls.push(url.to_string()); }
            match self.pages.get(url).cloned() {
                None | Some(StubPage::NotFound) => Err(FetchError::NotFound { url: url.to_string() }),
                Some(StubPage::Timeout) => Err(FetchError::Timeout { url: url.to_string() }),
                Some(StubPage::Challenged) => Err(FetchError::Challenged { url: url.to_string() }),
                Some(p) => Ok(p),
            }
        }
    }

    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            match self.lookup(url)? {
                StubPage::Html(s) => Ok(s),
                StubPage::Bytes(b) => Ok(String::from_utf8_lossy(&b).into_owned()),
                _ => unreachable!(),
            }
        }

        async fn fetch_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
            match self.lookup(url)? {
                StubPage::Html(s) => Ok(Bytes::from(s)),
                StubPage::Bytes(b) => Ok(Bytes::from(b)),
                _ => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waf_header_is_a_challenge() {
        let e = classify_response("u", 200, Some("challenge"), 50_000).unwrap();
        assert!(matches!(e, FetchError::Challenged { .. }));
    }

    #[test]
    fn short_202_is_a_challenge_long_202_is_content() {
        assert!(matches!(classify_response("u", 202, None, 900), Some(FetchError::Challenged { .. })));
        assert!(classify_response("u", 202, None, 20_000).is_none());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(classify_response("u", 404, None, 10), Some(FetchError::NotFound { .. })));
        assert!(matches!(classify_response("u", 503, None, 10), Some(FetchError::Status { status: 503, .. })));
        assert!(classify_response("u", 200, None, 10).is_none());
    }
}
