//! Classic ElectionStats search pages (Virginia, Massachusetts, Colorado).
//!
//! Each contest is one `tr` with an `election-id-N` or `contest-id-N` id; its
//! last cell nests a `table.candidates` with one row per candidate.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::dom::{self, class_contains, text_of};
use crate::error::ScrapeError;
use crate::locate::{self, TableLocator};
use crate::record::{CandidateDraft, CandidateResult, RaceContext, finish_race};

pub const SEARCH_LOCATOR: TableLocator = TableLocator {
    name: "search results",
    ids: &["search_results_table"],
    class_tokens: &[],
    attrs: &[],
    marker: Some("tr[id^=election-id-], tr[id^=contest-id-]"),
    header_labels: &[],
};

static ROW_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:election|contest)-id-(\d+)$").expect("row id pattern"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year pattern"));

const SPECIAL_ROW_CLASSES: &[&str] = &[
    "more_info",
    "n_total_votes",
    "n_all_other_votes",
    "and-n-more",
    "total-votes-cast",
    "non_candidate",
];

/// Columns of one contest row, whichever layout it came from.
struct ContestRow<'a> {
    election_id: u64,
    year: i32,
    office: String,
    district: String,
    stage: String,
    candidates: ElementRef<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// `td` year, office, district, stage, candidates.
    VirginiaMassachusetts,
    /// `th.year`, `td.party_border_top`, `td.office`, `td.division`, `td.candidates_container_cell`.
    Colorado,
}

impl RowLayout {
    pub fn for_state(key: &str) -> Self {
        if key.trim().eq_ignore_ascii_case("colorado") { RowLayout::Colorado } else { RowLayout::VirginiaMassachusetts }
    }
}

/// Parse one search results page into candidate records.
///
/// A page without a results table is `NotFound`; a table with no parseable
/// rows is an empty page.
pub fn parse_search_page(html: &str, state_key: &str, base_url: &str) -> Result<Vec<CandidateResult>, ScrapeError> {
    let doc = Html::parse_document(html);
    let tables = locate::locate(&doc, &SEARCH_LOCATOR)?;
    let tr_sel = dom::css("tr")?;
    let layout = RowLayout::for_state(state_key);

    let mut out = Vec::new();
    for table in tables {
        for tr in table.select(&tr_sel) {
            let Some(row) = parse_contest_row(tr, layout) else { continue };
            let mut drafts = candidate_drafts(row.candidates, base_url)?;
            if drafts.is_empty() { continue; }
            for d in &mut drafts {
                d.party = normalize_party(&d.party, &row.stage);
            }
            let ctx = RaceContext {
                source_state: state_key.to_string(),
                election_id: Some(row.election_id),
                year: Some(row.year),
                office: row.office,
                district: row.district,
                stage: row.stage,
            };
            out.extend(finish_race(&ctx, drafts));
        }
    }
    Ok(out)
}

fn row_election_id(tr: ElementRef<'_>) -> Option<u64> {
    let id = tr.value().attr("id")?;
    ROW_ID.captures(id)?.get(1)?.as_str().parse().ok()
}

fn parse_year(text: &str) -> Option<i32> {
    text.trim().parse().ok().or_else(|| YEAR.find(text).and_then(|m| m.as_str().parse().ok()))
}

fn parse_contest_row(tr: ElementRef<'_>, layout: RowLayout) -> Option<ContestRow<'_>> {
    let election_id = row_election_id(tr)?;
    match layout {
        RowLayout::VirginiaMassachusetts => {
            let tds = dom::child_elements(tr, &["td"]);
            if tds.len() < 5 { return None; }
            let year = parse_year(&text_of(tds[0]))?;
            let office = text_of(tds[1]);
            let stage = text_of(tds[3]);
            if office.is_empty() || stage.is_empty() { return None; }
            Some(ContestRow { election_id, year, office, district: text_of(tds[2]), stage, candidates: tds[4] })
        }
        RowLayout::Colorado => {
            let children = dom::child_elements(tr, &["th", "td"]);
            let pick = |tag: &str, class: &str| {
                children.iter().copied().find(|c| c.value().name() == tag && class_contains(*c, class))
            };
            let year_th = pick("th", "year")?;
            let year = colorado_year(year_th)?;
            let stage = pick("td", "party_border_top").map(text_of).unwrap_or_default();
            let office = pick("td", "office").map(text_of).unwrap_or_default();
            let district = pick("td", "division").map(text_of).unwrap_or_default();
            let candidates = pick("td", "candidates_container_cell")?;
            if stage.is_empty() || office.is_empty() { return None; }
            Some(ContestRow { election_id, year, office, district, stage, candidates })
        }
    }
}

fn colorado_year(th: ElementRef<'_>) -> Option<i32> {
    let span = dom::css("span[class*='date-year']").ok()?;
    if let Some(y) = th.select(&span).next().and_then(|s| text_of(s).parse().ok()) {
        return Some(y);
    }
    YEAR.find(&text_of(th)).and_then(|m| m.as_str().parse().ok())
}

/// Candidates from the nested `table.candidates` of a contest row.
pub fn candidate_drafts(cell: ElementRef<'_>, base_url: &str) -> Result<Vec<CandidateDraft>, ScrapeError> {
    let table_sel = dom::css("table")?;
    let tr_sel = dom::css("tr")?;
    let name_sel = dom::css("div[class*='name'] a")?;
    let party_sel = dom::css("div[class*='party']")?;

    let Some(table) = cell.select(&table_sel).find(|t| dom::has_class_token(*t, "candidates")) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for tr in table.select(&tr_sel) {
        let class = tr.value().attr("class").unwrap_or("").to_lowercase();
        if SPECIAL_ROW_CLASSES.iter().any(|c| class.contains(c)) { continue; }

        let Some(link) = tr.select(&name_sel).next() else { continue };
        let name = text_of(link);
        if name.is_empty() { continue; }

        let cells = dom::cells(tr);
        let Some(votes) = cells.get(1).and_then(|c| dom::parse_int(&text_of(*c))) else { continue };
        let percentage = cells.get(2).map(|c| text_of(*c)).unwrap_or_default();

        out.push(CandidateDraft {
            name,
            url: link.value().attr("href").map(|h| dom::absolute_url(base_url, h)),
            party: dom::first_text(tr, &party_sel).unwrap_or_default(),
            votes: Some(votes),
            percentage,
            winner_marked: class_contains(tr, "is_winner"),
            incumbent: false,
        });
    }
    Ok(out)
}

/// In a party primary, a blank or write-in party label is replaced by the
/// primary's party. This is an approximation: a write-in in a Democratic
/// primary is recorded as Democratic.
pub fn normalize_party(party: &str, stage: &str) -> String {
    let party = party.trim();
    let stage_lc = stage.to_lowercase();
    let inferred = if !stage_lc.contains("primary") {
        None
    } else if stage_lc.contains("democratic") {
        Some("Democratic")
    } else if stage_lc.contains("republican") {
        Some("Republican")
    } else if stage_lc.contains("libertarian") {
        Some("Libertarian")
    } else {
        None
    };
    match inferred {
        Some(p) if party.is_empty() || is_write_in(party) => p.to_string(),
        _ => party.to_string(),
    }
}

fn is_write_in(party: &str) -> bool {
    let squashed: String = party
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '-') && !c.is_whitespace())
        .collect();
    squashed.contains("writein")
}
