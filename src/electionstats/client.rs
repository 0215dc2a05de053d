use std::collections::HashSet;

use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::record::{CandidateResult, SkippedUnit};
use crate::registry::{Generation, SourceConfig};

use super::search::parse_search_page;
use super::v2::parse_v2_search_page;

pub const MAX_PAGES: u32 = 200;

pub fn search_url(cfg: &SourceConfig, year_from: i32, year_to: i32, page: u32) -> String {
    let base = cfg.base_url.trim_end_matches('/');
    match cfg.generation {
        Generation::Classic => {
            let path = cfg.search_path.trim();
            let root = if path.is_empty() {
                base.to_string()
            } else if path.starts_with('/') {
                format!("{base}{path}")
            } else {
                format!("{base}/{path}")
            };
            format!("{root}?year_from={year_from}&year_to={year_to}&page={page}")
        }
        Generation::V2 => format!("{base}/search?t=table&df={year_from}&dt={year_to}"),
    }
}

pub fn detail_url(cfg: &SourceConfig, election_id: u64) -> String {
    let base = cfg.base_url.trim_end_matches('/');
    match cfg.generation {
        Generation::Classic => format!("{base}/view/{election_id}/"),
        Generation::V2 => format!("{base}/contest/{election_id}"),
    }
}

#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub rows: Vec<CandidateResult>,
    pub pages: u32,
    /// Set when a later page failed and iteration stopped early.
    pub stopped: Option<SkippedUnit>,
}

/// Walk the search pages for one year range.
///
/// Stops on an empty page, a page with no unseen `(election_id, candidate_id)`
/// keys, or `max_pages`. Failure on the first page is returned; on later
/// pages it ends iteration and is reported in `stopped`.
pub async fn scrape_search<F: PageFetcher>(
    fetcher: &F,
    state_key: &str,
    cfg: &SourceConfig,
    year_from: i32,
    year_to: i32,
    max_pages: u32,
) -> Result<SearchOutcome, ScrapeError> {
    let mut out = SearchOutcome::default();
    let mut seen: HashSet<(Option<u64>, u32)> = HashSet::new();

    let last_page = match cfg.generation {
        Generation::Classic => max_pages.max(1),
        // v2 renders the whole range into one table
        Generation::V2 => 1,
    };

    for page in 1..=last_page {
        let url = search_url(cfg, year_from, year_to, page);
        let parsed = match fetcher.fetch(&url).await {
            Ok(html) => match cfg.generation {
                Generation::Classic => parse_search_page(&html, state_key, &cfg.base_url),
                Generation::V2 => parse_v2_search_page(&html, state_key, &cfg.base_url),
            },
            Err(e) => Err(e.into()),
        };
        let rows = match parsed {
            Ok(rows) => rows,
            Err(e) if page == 1 => return Err(e),
            Err(e) => {
                out.stopped = Some(SkippedUnit { unit: format!("{state_key}/search/{page}"), url, kind: e.kind(), reason: e.to_string() });
                break;
            }
        };
        out.pages = page;
        if rows.is_empty() { break; }

        let fresh: Vec<CandidateResult> = rows
            .into_iter()
            .filter(|r| seen.insert((r.election_id, r.candidate_id)))
            .collect();
        if fresh.is_empty() { break; }
        out.rows.extend(fresh);
    }
    Ok(out)
}
