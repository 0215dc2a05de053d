//! District election pages. Two markups exist: results voteboxes, and the
//! Office/Candidates wikitable used for races without published counts.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use super::BASE_URL;
use super::cell::{cell_events, parse_cell};
use super::types::RaceCandidate;
use crate::dom::{self, class_contains, text_of};
use crate::error::ScrapeError;

static TRAILING_PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\(([^)]+)\)\s*$").expect("trailing parens pattern"));
static PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("parens pattern"));

const HEADING_SELECTORS: &[&str] = &[
    "h5[class*='votebox-header-election-type']",
    "div[class*='votebox-heading']",
    "div[class*='votebox-title']",
    "h3",
    "h4",
];

pub fn infer_election_type(heading: &str) -> &'static str {
    let h = heading.to_lowercase();
    if h.contains("primary runoff") || h.contains("primary run-off") {
        "Primary Runoff"
    } else if h.contains("primary") {
        "Primary"
    } else if h.contains("general") {
        "General"
    } else {
        "Other"
    }
}

/// Every candidate on the page. Pages for future elections have neither
/// markup and yield nothing.
pub fn parse_district_page(html: &str) -> Result<Vec<RaceCandidate>, ScrapeError> {
    let doc = Html::parse_document(html);
    let mut out = votebox_candidates(&doc)?;
    out.extend(wikitable_candidates(&doc)?);
    Ok(out)
}

fn votebox_candidates(doc: &Html) -> Result<Vec<RaceCandidate>, ScrapeError> {
    let box_sel = dom::css("div[class*='votebox']")?;
    let heading_sels = HEADING_SELECTORS.iter().map(|s| dom::css(s)).collect::<Result<Vec<_>, _>>()?;
    let row_sel = dom::css("table[class*='results_table'] tr[class*='results_row']")?;
    let text_cell_sel = dom::css("td[class*='votebox-results-cell--text']")?;
    let num_cell_sel = dom::css("td[class*='votebox-results-cell--number']")?;
    let pct_sel = dom::css("div[class*='percentage_number']")?;
    let a_sel = dom::css("a")?;

    let mut out = Vec::new();
    // scroll-container wrappers are voteboxes too; only the inner box owns a race header
    let boxes = doc.select(&box_sel).filter(|b| {
        b.children().filter_map(ElementRef::wrap).any(|c| c.value().name() == "div" && class_contains(c, "race_header"))
    });
    for vb in boxes {
        let heading = heading_sels
            .iter()
            .find_map(|s| vb.select(s).next())
            .map(text_of)
            .unwrap_or_default();
        let election_type = infer_election_type(&heading);

        for tr in vb.select(&row_sel) {
            let Some(text_cell) = tr.select(&text_cell_sel).next() else { continue };
            let (raw_name, candidate_url) = match text_cell.select(&a_sel).next() {
                Some(a) => (
                    text_of(a),
                    a.value().attr("href").map(|h| dom::absolute_url(BASE_URL, h)).unwrap_or_default(),
                ),
                None => (text_of(text_cell), String::new()),
            };
            let candidate = TRAILING_PARENS.replace(&raw_name, "").trim().to_string();
            if candidate.is_empty() { continue; }

            let full = text_of(text_cell);
            // last parenthesized group that isn't the incumbent marker
            let party = PARENS
                .captures_iter(&full)
                .map(|c| c[1].trim().to_string())
                .filter(|p| p != "i")
                .last()
                .unwrap_or_default();

            out.push(RaceCandidate {
                race: heading.clone(),
                election_type: election_type.to_string(),
                candidate,
                candidate_url,
                party,
                is_winner: class_contains(tr, "winner"),
                is_incumbent: full.contains("(i)"),
                pct: tr.select(&pct_sel).next().map(text_of).unwrap_or_default(),
                votes: tr.select(&num_cell_sel).last().map(text_of).unwrap_or_default(),
            });
        }
    }
    Ok(out)
}

fn wikitable_candidates(doc: &Html) -> Result<Vec<RaceCandidate>, ScrapeError> {
    let table_sel = dom::css("table[class*='wikitable'][class*='collapsible']")?;
    let tr_sel = dom::css("tr")?;
    let title_sel = dom::css("h4, h3")?;

    let mut out = Vec::new();
    for table in doc.select(&table_sel) {
        let trs: Vec<ElementRef> = table.select(&tr_sel).collect();
        let Some(title) = trs.first().and_then(|r| r.select(&title_sel).next()) else { continue };
        let election_type = infer_election_type(&text_of(title));

        for tr in &trs {
            let tds = dom::child_elements(*tr, &["td"]);
            if tds.len() != 2 { continue; }
            let office = text_of(tds[0]);
            if office.is_empty() || office.eq_ignore_ascii_case("office") { continue; }

            for c in parse_cell(&cell_events(tds[1]), BASE_URL) {
                out.push(RaceCandidate {
                    race: office.clone(),
                    election_type: election_type.to_string(),
                    candidate: c.name,
                    candidate_url: c.url,
                    is_winner: c.is_winner,
                    is_incumbent: c.is_incumbent,
                    ..Default::default()
                });
            }
        }
    }
    Ok(out)
}
