use bytes::Bytes;
use tracing::warn;

use super::{FetchError, PageFetcher};

/// Primary fetcher with a one-shot retry through a rendering fetcher when
/// the primary is served a bot challenge.
pub struct FallbackFetcher<P, R> {
    primary: P,
    renderer: Option<R>,
}

impl<P: PageFetcher, R: PageFetcher> FallbackFetcher<P, R> {
    pub fn new(primary: P, renderer: Option<R>) -> Self {
        FallbackFetcher { primary, renderer }
    }
}

impl<P: PageFetcher, R: PageFetcher> PageFetcher for FallbackFetcher<P, R> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self.primary.fetch(url).await {
            Err(FetchError::Challenged { url: u }) => match &self.renderer {
                Some(r) => {
                    warn!(url = %u, "challenge served; retrying through renderer");
                    r.fetch(&u).await
                }
                None => {
                    warn!(url = %u, "challenge served and no renderer configured (set BALLOT_RENDER_URL)");
                    Err(FetchError::Challenged { url: u })
                }
            },
            other => other,
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
        self.primary.fetch_bytes(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::{StubFetcher, StubPage};

    #[tokio::test]
    async fn challenge_retries_once_through_renderer() {
        let primary = StubFetcher::new().fail("https://x/a", StubPage::Challenged);
        let renderer = StubFetcher::new().page("https://x/a", "<html>rendered</html>");
        let f = FallbackFetcher::new(primary, Some(renderer));
        assert_eq!(f.fetch("https://x/a").await.unwrap(), "<html>rendered</html>");
        assert_eq!(f.renderer.as_ref().unwrap().calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn challenge_without_renderer_surfaces() {
        let primary = StubFetcher::new().fail("https://x/a", StubPage::Challenged);
        let f: FallbackFetcher<StubFetcher, StubFetcher> = FallbackFetcher::new(primary, None);
        assert!(matches!(f.fetch("https://x/a").await, Err(FetchError::Challenged { .. })));
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let primary = StubFetcher::new();
        let renderer = StubFetcher::new().page("https://x/a", "<html/>");
        let f = FallbackFetcher::new(primary, Some(renderer));
        assert!(matches!(f.fetch("https://x/a").await, Err(FetchError::NotFound { .. })));
        assert!(f.renderer.as_ref().unwrap().calls.lock().unwrap().is_empty());
    }
}
