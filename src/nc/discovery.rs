//! The NCSBE historical results index: one `results_pct_YYYYMMDD.zip` per election.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;
use serde::Serialize;

use crate::dom::{self, text_of};
use crate::error::ScrapeError;

pub const INDEX_URL: &str = "https://www.ncsbe.gov/results-data/election-results/historical-election-results-data";

static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"results_pct_(\d{8})\.zip$").expect("zip name pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionArchive {
    pub election_date: NaiveDate,
    pub zip_url: String,
    pub label: String,
}

/// Archive links on the index page, oldest first. Links whose file name
/// doesn't carry a valid date are ignored.
pub fn parse_index(html: &str) -> Result<Vec<ElectionArchive>, ScrapeError> {
    let doc = Html::parse_document(html);
    let a_sel = dom::css("a[href*='results_pct_'][href*='.zip']")?;

    let mut out: Vec<ElectionArchive> = doc
        .select(&a_sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let caps = ZIP_RE.captures(href)?;
            let election_date = NaiveDate::parse_from_str(&caps[1], "%Y%m%d").ok()?;
            Some(ElectionArchive {
                election_date,
                zip_url: dom::absolute_url(INDEX_URL, href),
                label: text_of(a),
            })
        })
        .collect();
    out.sort_by(|a, b| a.election_date.cmp(&b.election_date));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archives_sorted_by_date() {
        let html = r#"
        <ul>
          <li><a href="https://s3.amazonaws.com/dl.ncsbe.gov/ENRS/2020_11_03/results_pct_20201103.zip">
                November 3,   2020 General</a></li>
          <li><a href="/ENRS/2016_03_15/results_pct_20160315.zip">March 15, 2016</a></li>
          <li><a href="https://s3.amazonaws.com/dl.ncsbe.gov/ENRS/results_pct_20201103.zip.md5">checksum</a></li>
          <li><a href="https://example.org/results_pct_2020.zip">bad date</a></li>
          <li><a href="https://example.org/results_pct_20201399.zip">not a date</a></li>
          <li><a href="/ENRS/layout_results_pct.txt">layout</a></li>
        </ul>"#;
        let got = parse_index(html).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].election_date, NaiveDate::from_ymd_opt(2016, 3, 15).unwrap());
        assert_eq!(got[0].zip_url, "https://www.ncsbe.gov/ENRS/2016_03_15/results_pct_20160315.zip");
        assert_eq!(got[1].label, "November 3, 2020 General");
    }
}
