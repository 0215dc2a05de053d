//! MediaWiki `Special:Search` on ballotpedia.org.

use scraper::Html;
use url::Url;

use super::BASE_URL;
use super::types::SearchHit;
use crate::dom::{self, text_of};
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;

pub const DEFAULT_LIMIT: u32 = 20;
pub const DEFAULT_MAX_PAGES: u32 = 10;

pub fn search_url(query: &str, limit: u32, offset: u32) -> Result<String, ScrapeError> {
    let url = Url::parse_with_params(
        &format!("{BASE_URL}/wiki/index.php"),
        &[
            ("title", "Special:Search"),
            ("search", query),
            ("profile", "advanced"),
            ("fulltext", "1"),
            ("limit", &limit.to_string()),
            ("offset", &offset.to_string()),
        ],
    )
    .map_err(|e| ScrapeError::Config(format!("search url: {e}")))?;
    Ok(url.to_string())
}

pub fn parse_search_results(html: &str) -> Result<Vec<SearchHit>, ScrapeError> {
    let doc = Html::parse_document(html);
    let li_sel = dom::css("ul[class*='mw-search-results'] > li")?;
    let heading_sel = dom::css("div[class*='mw-search-result-heading'] a")?;
    let snippet_sel = dom::css("div[class*='searchresult']")?;
    let meta_sel = dom::css("div[class*='mw-search-result-data']")?;

    let mut out = Vec::new();
    for li in doc.select(&li_sel) {
        let Some(a) = li.select(&heading_sel).next() else { continue };
        out.push(SearchHit {
            title: text_of(a),
            url: a.value().attr("href").map(|h| dom::absolute_url(BASE_URL, h)).unwrap_or_default(),
            snippet: li.select(&snippet_sel).next().map(text_of).unwrap_or_default(),
            metadata: li.select(&meta_sel).next().map(text_of).unwrap_or_default(),
        });
    }
    Ok(out)
}

/// Page through results by offset until an empty page or `max_pages`.
/// Returns the hits and the number of pages fetched.
pub async fn search_all<F: PageFetcher>(fetcher: &F, query: &str, limit: u32, max_pages: u32) -> Result<(Vec<SearchHit>, u32), ScrapeError> {
    let mut hits = Vec::new();
    let mut pages = 0;
    for page in 0..max_pages {
        let html = fetcher.fetch(&search_url(query, limit, page * limit)?).await?;
        pages += 1;
        let found = parse_search_results(&html)?;
        if found.is_empty() { break; }
        hits.extend(found);
    }
    Ok((hits, pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;

    const RESULTS: &str = r#"
    <ul class="mw-search-results">
      <li><div class="mw-search-result-heading"><a href="/Chicago,_Illinois" title="Chicago, Illinois">Chicago, Illinois</a></div>
          <div class="searchresult">The <span class="searchmatch">mayor</span> of Chicago</div>
          <div class="mw-search-result-data">30 KB (4,000 words) - 12:00, 1 May 2024</div></li>
      <li><div class="mw-search-result-heading"><a href="https://ballotpedia.org/Mayor_of_Chicago">Mayor of Chicago</a></div></li>
      <li><div>no heading</div></li>
    </ul>"#;

    #[test]
    fn parses_hits() {
        let hits = parse_search_results(RESULTS).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Chicago, Illinois");
        assert_eq!(hits[0].url, "https://ballotpedia.org/Chicago,_Illinois");
        assert_eq!(hits[0].snippet, "The mayor of Chicago");
        assert!(hits[0].metadata.starts_with("30 KB"));
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn url_encodes_query() {
        let u = search_url("mayor Chicago", 20, 40).unwrap();
        assert!(u.starts_with("https://ballotpedia.org/wiki/index.php?title=Special%3ASearch&search=mayor+Chicago"));
        assert!(u.ends_with("&limit=20&offset=40"));
    }

    #[tokio::test]
    async fn stops_on_empty_page() {
        let fetcher = StubFetcher::new()
            .page(&search_url("mayor", 2, 0).unwrap(), RESULTS)
            .page(&search_url("mayor", 2, 2).unwrap(), "<ul class=\"mw-search-results\"></ul>");
        let (hits, pages) = search_all(&fetcher, "mayor", 2, DEFAULT_MAX_PAGES).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(pages, 2);
    }
}
