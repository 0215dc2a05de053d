//! Locality (county/city) breakdowns from contest detail pages, fetched
//! through a fixed-size worker pool.

use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html};

use crate::dom::{self, text_of};
use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::locate::{self, TableLocator};
use crate::record::{CandidateIdMap, LocalityVoteRow, SkippedUnit};

pub const COUNTY_LOCATOR: TableLocator = TableLocator {
    name: "county/city results",
    ids: &[],
    class_tokens: &[],
    attrs: &[],
    marker: None,
    header_labels: &["County/City", "City/Town", "County"],
};

const LEADING_LABELS: &[&str] = &["County/City", "City/Town", "County", "Ward", "Pct", "Precinct"];
const TRAILING_LABELS: &[&str] = &["All Others", "Blanks", "No Preference", "Total Votes Cast"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountyMarkup {
    /// Tooltip headers, `tr[id^=locality-id-]` rows with an `a.label` locality link.
    Classic,
    /// Plain text headers; locality name in the first cell.
    V2,
}

/// Parse one detail page. A missing `id_map` means ids follow header order.
pub fn parse_county_page(
    html: &str,
    state: &str,
    year: Option<i32>,
    election_id: u64,
    id_map: Option<&CandidateIdMap>,
    markup: CountyMarkup,
) -> Result<Vec<LocalityVoteRow>, ScrapeError> {
    let doc = Html::parse_document(html);
    let table = locate::locate_one(&doc, &COUNTY_LOCATOR)?;

    let header = header_cells(table)?;
    let names = candidate_names(&header, markup)?;
    if names.is_empty() {
        return Err(ScrapeError::ParseShape(format!("no candidate columns in county table of election {election_id}")));
    }
    let trailing = header
        .iter()
        .rev()
        .take_while(|th| TRAILING_LABELS.contains(&text_of(**th).as_str()))
        .count();

    let derived;
    let id_map = match id_map {
        Some(m) if !m.is_empty() => m,
        _ => {
            derived = CandidateIdMap::from_header_order(&names);
            &derived
        }
    };

    let tr_sel = dom::css("tbody tr")?;
    let label_sel = dom::css("a[class*='label']")?;
    let div_sel = dom::css("div")?;

    let mut out = Vec::new();
    for tr in table.select(&tr_sel) {
        let tds = dom::child_elements(tr, &["td"]);
        let (loc_idx, locality) = match markup {
            CountyMarkup::Classic => {
                if !tr.value().attr("id").is_some_and(|id| id.starts_with("locality-id-")) { continue; }
                let Some(idx) = tds.iter().position(|td| td.select(&label_sel).next().is_some()) else { continue };
                let name = tds[idx].select(&label_sel).next().map(text_of).unwrap_or_default();
                (idx, name)
            }
            CountyMarkup::V2 => {
                let Some(first) = tds.first() else { continue };
                (0, text_of(*first))
            }
        };
        if locality.is_empty() || TRAILING_LABELS.iter().any(|l| l.eq_ignore_ascii_case(&locality)) || locality.eq_ignore_ascii_case("total") {
            continue;
        }

        let mut data = &tds[loc_idx + 1..];
        if trailing > 0 && data.len() >= trailing {
            data = &data[..data.len() - trailing];
        }
        if data.len() < names.len() { continue; }
        let vote_cells = &data[data.len() - names.len()..];

        for (name, td) in names.iter().zip(vote_cells) {
            let text = td.select(&div_sel).next().map(text_of).filter(|t| !t.is_empty()).unwrap_or_else(|| text_of(*td));
            let Some(votes) = dom::parse_int(&text) else { continue };
            // names the map doesn't know are dropped
            let Some(candidate_id) = id_map.get(name) else { continue };
            out.push(LocalityVoteRow {
                state: state.to_string(),
                year,
                election_id,
                county_or_city: locality.clone(),
                candidate_id,
                candidate_name: name.clone(),
                votes,
            });
        }
    }
    Ok(out)
}

fn header_cells(table: ElementRef<'_>) -> Result<Vec<ElementRef<'_>>, ScrapeError> {
    let thead_tr = dom::css("thead tr")?;
    let tr = dom::css("tr")?;
    let row = table
        .select(&thead_tr)
        .next()
        .or_else(|| table.select(&tr).find(|r| !dom::child_elements(*r, &["th"]).is_empty()))
        .ok_or_else(|| ScrapeError::ParseShape("county table without a header row".into()))?;
    Ok(dom::child_elements(row, &["th"]))
}

fn candidate_names(header: &[ElementRef<'_>], markup: CountyMarkup) -> Result<Vec<String>, ScrapeError> {
    let tooltip = dom::css("a[class*='tooltip-above'], span[class*='tooltip-above']")?;
    let mut names = Vec::new();
    for th in header {
        let class = th.value().attr("class").unwrap_or("").to_lowercase();
        if class.contains("is_pseudocandidate") || class.contains("is-total-votes") { break; }

        let label = text_of(*th);
        if LEADING_LABELS.contains(&label.as_str()) { continue; }
        if TRAILING_LABELS.contains(&label.as_str()) { break; }

        let name = match th.select(&tooltip).next() {
            Some(node) => node
                .value()
                .attr("oldtitle")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| text_of(node)),
            None if markup == CountyMarkup::V2 => label,
            None => continue,
        };
        if TRAILING_LABELS.contains(&name.as_str()) { break; }
        if !name.is_empty() { names.push(name); }
    }
    Ok(names)
}

/// One detail page to fetch.
#[derive(Debug, Clone)]
pub struct CountyJob {
    pub election_id: u64,
    pub year: Option<i32>,
    pub url: String,
    pub id_map: Option<CandidateIdMap>,
}

#[derive(Debug, Default)]
pub struct CountyOutcome {
    pub rows: Vec<LocalityVoteRow>,
    pub skipped: Vec<SkippedUnit>,
    pub fetched: usize,
}

/// Fetch and parse every job with at most `workers` in flight. Failures are
/// recorded per unit and never abort the batch. Rows are merged here, after
/// each worker returns, and sorted for stable output.
pub async fn build_county_votes<F: PageFetcher>(
    fetcher: &F,
    state: &str,
    markup: CountyMarkup,
    jobs: Vec<CountyJob>,
    workers: usize,
) -> CountyOutcome {
    let results: Vec<(CountyJob, Result<Vec<LocalityVoteRow>, ScrapeError>)> = stream::iter(jobs)
        .map(|job| async move {
            let parsed = match fetcher.fetch(&job.url).await {
                Ok(html) => parse_county_page(&html, state, job.year, job.election_id, job.id_map.as_ref(), markup),
                Err(e) => Err(ScrapeError::from(e)),
            };
            (job, parsed)
        })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let mut out = CountyOutcome::default();
    for (job, res) in results {
        match res {
            Ok(rows) => {
                out.fetched += 1;
                out.rows.extend(rows);
            }
            Err(e) => out.skipped.push(SkippedUnit {
                unit: format!("{state}/{}", job.election_id),
                url: job.url,
                kind: e.kind(),
                reason: e.to_string(),
            }),
        }
    }
    out.rows.sort_by(|a, b| {
        (a.election_id, &a.county_or_city, a.candidate_id).cmp(&(b.election_id, &b.county_or_city, b.candidate_id))
    });
    out.skipped.sort_by(|a, b| a.unit.cmp(&b.unit));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::{StubFetcher, StubPage};

    const VA_DETAIL: &str = r#"
    <html><body>
    <table class="summary"><tr><th>Office</th></tr></table>
    <table id="precincts_table" class="results">
      <thead><tr>
        <th>County/City</th>
        <th class="candidate"><a class="tooltip-above" oldtitle="Glenn Youngkin">Youngkin</a></th>
        <th class="candidate"><a class="tooltip-above" oldtitle="Terry R. McAuliffe">McAuliffe</a></th>
        <th class="is_pseudocandidate">All Others</th>
        <th>Total Votes Cast</th>
      </tr></thead>
      <tbody>
        <tr id="locality-id-51001"><td><a class="label" href="/l/1">Accomack County</a></td>
            <td><div>7,878</div></td><td><div>4,948</div></td><td>11</td><td>12,837</td></tr>
        <tr id="locality-id-51003"><td><a class="label">Albemarle County</a></td>
            <td>19,141</td><td>30,069</td><td>60</td><td>49,270</td></tr>
        <tr class="total"><td>Total</td><td>1,663,596</td><td>1,600,116</td><td>1</td><td>1</td></tr>
      </tbody>
    </table>
    </body></html>"#;

    #[test]
    fn classic_detail_page() {
        let rows = parse_county_page(VA_DETAIL, "virginia", Some(2021), 99, None, CountyMarkup::Classic).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].county_or_city, "Accomack County");
        assert_eq!(rows[0].candidate_name, "Glenn Youngkin");
        assert_eq!(rows[0].candidate_id, 1);
        assert_eq!(rows[0].votes, 7_878);
        assert_eq!(rows[3].county_or_city, "Albemarle County");
        assert_eq!(rows[3].candidate_id, 2);
        assert_eq!(rows[3].votes, 30_069);
    }

    #[test]
    fn supplied_map_drops_unknown_names() {
        let map = CandidateIdMap::from_pairs([("Terry R. McAuliffe", 7u32)]);
        let rows = parse_county_page(VA_DETAIL, "virginia", Some(2021), 99, Some(&map), CountyMarkup::Classic).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.candidate_id == 7 && r.candidate_name == "Terry R. McAuliffe"));
    }

    #[test]
    fn v2_detail_page() {
        let html = r#"
        <table class="MuiTable-root"><thead><tr>
          <th>County</th><th>Nancy Mace</th><th>Michael B. Moore</th><th>Total Votes Cast</th>
        </tr></thead><tbody>
          <tr><td>Beaufort</td><td>60,001</td><td>40,000</td><td>100,001</td></tr>
          <tr><td>Total</td><td>1</td><td>1</td><td>2</td></tr>
        </tbody></table>"#;
        let rows = parse_county_page(html, "south_carolina", Some(2024), 8123, None, CountyMarkup::V2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].county_or_city, "Beaufort");
        assert_eq!(rows[1].candidate_name, "Michael B. Moore");
        assert_eq!(rows[1].votes, 40_000);
    }

    #[test]
    fn header_without_candidates_is_shape_error() {
        let html = r#"<table><thead><tr><th>County</th><th>Total Votes Cast</th></tr></thead><tbody></tbody></table>"#;
        let err = parse_county_page(html, "virginia", None, 1, None, CountyMarkup::Classic).unwrap_err();
        assert!(matches!(err, ScrapeError::ParseShape(_)));
    }

    fn locality_page(name: &str) -> String {
        format!(
            r#"<table><thead><tr><th>County/City</th>
                 <th><a class="tooltip-above" oldtitle="Jane Doe">Doe</a></th>
                 <th><a class="tooltip-above" oldtitle="John Smith">Smith</a></th></tr></thead>
               <tbody><tr id="locality-id-1"><td><a class="label">{name}</a></td><td>10</td><td>5</td></tr></tbody></table>"#
        )
    }

    #[tokio::test]
    async fn partial_failures_are_skipped_and_counted() {
        let mut fetcher = StubFetcher::new();
        let mut jobs = Vec::new();
        for i in 0..10u64 {
            let url = format!("https://x/elections/view/{i}/");
            fetcher = match i {
                2 | 5 => fetcher.fail(&url, StubPage::NotFound),
                7 => fetcher.fail(&url, StubPage::Timeout),
                _ => fetcher.page(&url, &locality_page(&format!("Locality {i}"))),
            };
            jobs.push(CountyJob { election_id: i, year: Some(2024), url, id_map: None });
        }

        let out = build_county_votes(&fetcher, "virginia", CountyMarkup::Classic, jobs, 3).await;
        let mut localities: Vec<&str> = out.rows.iter().map(|r| r.county_or_city.as_str()).collect();
        localities.dedup();
        assert_eq!(localities.len(), 7);
        assert_eq!(out.rows.len(), 14);
        assert_eq!(out.fetched, 7);
        assert_eq!(out.skipped.len(), 3);
        let kinds: Vec<&str> = out.skipped.iter().map(|s| s.kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == "http_404").count(), 2);
        assert_eq!(kinds.iter().filter(|k| **k == "timeout").count(), 1);
    }
}
