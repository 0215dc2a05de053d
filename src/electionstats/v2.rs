//! Second-generation ElectionStats portals (South Carolina, New Mexico).
//!
//! The search table is rendered client-side, so columns are resolved from
//! the header text instead of fixed positions, and each candidate is a block
//! element inside the candidates cell.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::dom::{self, text_of};
use crate::error::ScrapeError;
use crate::locate::{self, TableLocator};
use crate::record::{CandidateDraft, CandidateResult, RaceContext, finish_race};
use crate::resolve::{FieldSpec, FieldValue, resolve};

pub const V2_SEARCH_LOCATOR: TableLocator = TableLocator {
    name: "v2 contest",
    ids: &["contestCollectionTable", "search_results_table"],
    class_tokens: &["MuiTable-root"],
    attrs: &["role=table"],
    marker: None,
    header_labels: &[],
};

pub const V2_SCHEMA: &[FieldSpec] = &[
    FieldSpec { field: "candidates", keywords: &["candidate", "results"], excludes: &[], specificity: 3 },
    FieldSpec { field: "stage", keywords: &["election type", "stage", "type"], excludes: &[], specificity: 2 },
    FieldSpec { field: "year", keywords: &["year", "election date"], excludes: &[], specificity: 1 },
    FieldSpec { field: "office", keywords: &["office", "contest"], excludes: &[], specificity: 1 },
    FieldSpec { field: "district", keywords: &["district", "division", "jurisdiction"], excludes: &[], specificity: 1 },
];

static CONTEST_HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/contest/(\d+)").expect("contest href pattern"));
static TRAILING_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)$").expect("trailing id pattern"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year pattern"));
static PAREN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)").expect("paren pattern"));

pub fn parse_v2_search_page(html: &str, state_key: &str, base_url: &str) -> Result<Vec<CandidateResult>, ScrapeError> {
    let doc = Html::parse_document(html);
    let table = locate::locate_one(&doc, &V2_SEARCH_LOCATOR)?;
    let tr_sel = dom::css("tr")?;
    let link_sel = dom::css("a[href]")?;

    let rows: Vec<ElementRef> = table.select(&tr_sel).collect();
    let Some(header_row) = rows.iter().find(|r| !dom::child_elements(**r, &["th"]).is_empty()) else {
        return Err(ScrapeError::ParseShape("v2 table without a header row".into()));
    };
    let headers: Vec<String> = dom::cells(*header_row).into_iter().map(text_of).collect();
    let cols = resolve(&headers, V2_SCHEMA);
    let Some(cand_idx) = cols.get("candidates") else {
        return Err(ScrapeError::ParseShape(format!("no candidates column in {headers:?}")));
    };

    let mut out = Vec::new();
    for tr in rows.iter().filter(|r| r.id() != header_row.id()) {
        let cells = dom::child_elements(*tr, &["td", "th"]);
        if cells.len() <= cand_idx { continue; }
        let texts: Vec<String> = cells.iter().map(|c| text_of(*c)).collect();

        let election_id: Option<u64> = tr
            .select(&link_sel)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|h| CONTEST_HREF.captures(h).and_then(|c| c[1].parse().ok()))
            .or_else(|| tr.value().attr("id").and_then(|id| TRAILING_ID.captures(id)).and_then(|c| c[1].parse().ok()));

        let field = |name: &str| match cols.value(name, &texts) {
            FieldValue::Value(v) => v,
            _ => String::new(),
        };
        let office = field("office");
        if office.is_empty() { continue; }
        let year: Option<i32> = YEAR.find(&field("year")).and_then(|m| m.as_str().parse().ok());

        let drafts = candidate_blocks(cells[cand_idx])
            .into_iter()
            .filter_map(|b| candidate_from_block(b, base_url))
            .collect::<Vec<_>>();
        if drafts.is_empty() { continue; }

        let ctx = RaceContext {
            source_state: state_key.to_string(),
            election_id,
            year,
            office,
            district: field("district"),
            stage: field("stage"),
        };
        out.extend(finish_race(&ctx, drafts));
    }
    Ok(out)
}

/// Direct element children of the cell, unwrapping a single wrapper element.
fn candidate_blocks(cell: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut kids: Vec<ElementRef> = cell.children().filter_map(ElementRef::wrap).collect();
    while kids.len() == 1 {
        let inner: Vec<ElementRef> = kids[0].children().filter_map(ElementRef::wrap).collect();
        // a lone candidate block has its own name/votes children; stop there
        if inner.len() < 2 || inner.iter().all(|k| !looks_like_block(*k)) { break; }
        kids = inner;
    }
    kids
}

fn looks_like_block(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "div" | "li" | "p" | "tr")
}

fn candidate_from_block(block: ElementRef<'_>, base_url: &str) -> Option<CandidateDraft> {
    let full = text_of(block);
    if full.is_empty() { return None; }

    let name_sel = dom::css("[class*='name']").ok()?;
    let link_sel = dom::css("a").ok()?;
    let party_sel = dom::css("[class*='party']").ok()?;

    let link = block.select(&link_sel).next();
    let raw_name = dom::first_text(block, &name_sel)
        .or_else(|| link.map(text_of).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| leading_name(&full));
    let (name, party_suffix) = dom::split_trailing_parens(&raw_name);
    if name.is_empty() { return None; }

    let rest = full.strip_prefix(raw_name.as_str()).unwrap_or(&full);
    let party = dom::first_text(block, &party_sel)
        .map(|p| p.trim_matches(|c: char| c == '(' || c == ')').trim().to_string())
        .or(party_suffix)
        .or_else(|| {
            PAREN
                .captures_iter(rest)
                .map(|c| c[1].trim().to_string())
                .find(|p| p != "i" && !p.ends_with('%') && dom::parse_int(p).is_none())
        })
        .unwrap_or_default();
    let votes = rest
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == '(' || c == ')'))
        .find_map(dom::parse_int);
    let percentage = rest
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == '(' || c == ')'))
        .find(|t| t.ends_with('%'))
        .unwrap_or("")
        .to_string();

    Some(CandidateDraft {
        name,
        url: link.and_then(|a| a.value().attr("href")).map(|h| dom::absolute_url(base_url, h)),
        party,
        votes,
        percentage,
        winner_marked: is_marked_winner(block),
        incumbent: full.contains("(i)"),
    })
}

/// Text before the first digit or parenthesis.
fn leading_name(text: &str) -> String {
    let end = text.find(|c: char| c.is_ascii_digit() || c == '(').unwrap_or(text.len());
    text[..end].trim().to_string()
}

fn is_marked_winner(block: ElementRef<'_>) -> bool {
    if dom::class_contains(block, "winner") { return true; }
    block.descendants().filter_map(ElementRef::wrap).any(|el| {
        let v = el.value();
        dom::class_contains(el, "winner")
            || ["aria-label", "title", "data-testid"]
                .iter()
                .filter_map(|a| v.attr(a))
                .any(|a| a.to_lowercase().contains("winner"))
    })
}
