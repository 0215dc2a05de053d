//! Table locators: find the results tables on a page by a prioritized list of
//! strategies. The first strategy that matches anything wins.

use scraper::{ElementRef, Html};

use crate::dom;
use crate::error::ScrapeError;

#[derive(Debug, Clone, Default)]
pub struct TableLocator {
    pub name: &'static str,
    /// Element ids, tried first.
    pub ids: &'static [&'static str],
    /// Whole class tokens on the table element.
    pub class_tokens: &'static [&'static str],
    /// Attribute selector fragments such as `role=table`.
    pub attrs: &'static [&'static str],
    /// A descendant selector that marks the table (e.g. `tr[id^=election-id-]`).
    pub marker: Option<&'static str>,
    /// Header labels; a table with a `th` whose normalized text equals one of
    /// these (case-insensitive) matches.
    pub header_labels: &'static [&'static str],
}

/// Locate all matching tables in document order.
///
/// Zero matches is `NotFound`; callers decide whether that means "page not
/// populated yet" or a hard failure.
pub fn locate<'a>(doc: &'a Html, loc: &TableLocator) -> Result<Vec<ElementRef<'a>>, ScrapeError> {
    let tables_sel = dom::css("table")?;

    for id in loc.ids {
        let sel = dom::css(&format!("table#{id}"))?;
        let found: Vec<_> = doc.select(&sel).collect();
        if !found.is_empty() { return Ok(found); }
    }

    if !loc.class_tokens.is_empty() {
        let found: Vec<_> = doc
            .select(&tables_sel)
            .filter(|t| loc.class_tokens.iter().any(|c| dom::has_class_token(*t, c)))
            .collect();
        if !found.is_empty() { return Ok(found); }
    }

    for attr in loc.attrs {
        let sel = dom::css(&format!("table[{attr}]"))?;
        let found: Vec<_> = doc.select(&sel).collect();
        if !found.is_empty() { return Ok(found); }
    }

    if let Some(marker) = loc.marker {
        let msel = dom::css(marker)?;
        let found: Vec<_> = doc
            .select(&tables_sel)
            .filter(|t| t.select(&msel).next().is_some())
            // nested tables also contain the marker; keep the innermost owner
            .filter(|t| {
                !t.select(&tables_sel)
                    .filter(|inner| inner.id() != t.id())
                    .any(|inner| inner.select(&msel).next().is_some())
            })
            .collect();
        if !found.is_empty() { return Ok(found); }
    }

    if !loc.header_labels.is_empty() {
        let th = dom::css("th")?;
        let found: Vec<_> = doc
            .select(&tables_sel)
            .filter(|t| {
                t.select(&th).any(|cell| {
                    let label = dom::text_of(cell);
                    loc.header_labels.iter().any(|l| l.eq_ignore_ascii_case(&label))
                })
            })
            .collect();
        if !found.is_empty() { return Ok(found); }
    }

    Err(ScrapeError::NotFound(format!("no {} table on page", loc.name)))
}

/// First located table.
pub fn locate_one<'a>(doc: &'a Html, loc: &TableLocator) -> Result<ElementRef<'a>, ScrapeError> {
    locate(doc, loc)?
        .into_iter()
        .next()
        .ok_or_else(|| ScrapeError::NotFound(format!("no {} table on page", loc.name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTY: TableLocator = TableLocator {
        name: "county",
        ids: &[],
        class_tokens: &[],
        attrs: &[],
        marker: None,
        header_labels: &["County/City", "City/Town", "County"],
    };

    #[test]
    fn primary_id_wins_over_structure() {
        let html = r#"<table id="other"><tr><th>County</th></tr></table>
                      <table id="results"><tr><td>x</td></tr></table>"#;
        let doc = Html::parse_document(html);
        let loc = TableLocator { ids: &["results"], ..COUNTY };
        let found = locate(&doc, &loc).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value().attr("id"), Some("results"));
    }

    #[test]
    fn structural_fallback_by_header_label() {
        let html = r#"<table><tr><th>Office</th></tr></table>
                      <table class="x"><tr><th> County/City </th><th>Jane</th></tr></table>"#;
        let doc = Html::parse_document(html);
        let found = locate(&doc, &COUNTY).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value().attr("class"), Some("x"));
    }

    #[test]
    fn empty_page_is_not_found() {
        let doc = Html::parse_document("<html><body><p>Loading…</p></body></html>");
        let err = locate(&doc, &COUNTY).unwrap_err();
        assert!(matches!(err, ScrapeError::NotFound(_)));
    }

    #[test]
    fn marker_picks_innermost_owner() {
        let html = r#"<table id="outer"><tr><td>
                        <table id="inner"><tr id="election-id-7"><td>a</td></tr></table>
                      </td></tr></table>"#;
        let doc = Html::parse_document(html);
        let loc = TableLocator { name: "search", marker: Some("tr[id^=election-id-]"), ..Default::default() };
        let found = locate(&doc, &loc).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value().attr("id"), Some("inner"));
    }
}
