//! `School_board_elections,_{year}` pages: one sortable table per state.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};

use super::BASE_URL;
use super::types::DistrictElectionRow;
use crate::dom::{self, text_of};
use crate::error::ScrapeError;
use crate::resolve::{FieldSpec, resolve};

/// "2024 Alabama School Board Elections" -> "Alabama"; the year is optional.
static CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:\d{4}\s+)?(.+?)\s+School Board").expect("caption pattern"));

pub const DISTRICT_SCHEMA: &[FieldSpec] = &[
    FieldSpec { field: "primary", keywords: &["primary"], excludes: &["runoff", "run-off"], specificity: 1 },
    FieldSpec { field: "primary_runoff", keywords: &["primary runoff", "primary run-off"], excludes: &[], specificity: 3 },
    FieldSpec { field: "general_election", keywords: &["general election"], excludes: &[], specificity: 2 },
    FieldSpec { field: "general_runoff", keywords: &["general runoff"], excludes: &[], specificity: 2 },
    FieldSpec { field: "term_length", keywords: &["term length"], excludes: &[], specificity: 1 },
    FieldSpec { field: "seats_up", keywords: &["seats up"], excludes: &[], specificity: 1 },
    FieldSpec { field: "total_board_seats", keywords: &["total board"], excludes: &[], specificity: 1 },
    FieldSpec { field: "enrollment", keywords: &["enrollment"], excludes: &[], specificity: 1 },
];

pub fn year_url(year: i32) -> String {
    format!("{BASE_URL}/School_board_elections,_{year}")
}

/// Every `sortable` table with a "... School Board" caption row, a header
/// row and at least one data row. Tables that don't fit are ignored.
pub fn parse_year_page(html: &str, year: i32) -> Result<Vec<DistrictElectionRow>, ScrapeError> {
    let doc = Html::parse_document(html);
    let table_sel = dom::css("table[class*='sortable']")?;
    let tr_sel = dom::css("tr")?;
    let a_sel = dom::css("a")?;

    let mut out = Vec::new();
    for table in doc.select(&table_sel) {
        let trs: Vec<ElementRef> = table.select(&tr_sel).collect();
        if trs.len() < 3 { continue; }

        let caption = text_of(trs[0]);
        let Some(state) = CAPTION.captures(&caption).map(|c| c[1].trim().to_string()) else { continue };

        let headers: Vec<String> = dom::cells(trs[1]).into_iter().map(text_of).collect();
        let cols = resolve(&headers, DISTRICT_SCHEMA);

        for tr in &trs[2..] {
            let tds = dom::child_elements(*tr, &["td"]);
            let Some(first) = tds.first() else { continue };
            let texts: Vec<String> = tds.iter().map(|c| text_of(*c)).collect();

            let (district, district_url) = match first.select(&a_sel).next() {
                Some(a) => (
                    text_of(a),
                    a.value().attr("href").map(|h| dom::absolute_url(BASE_URL, h)).unwrap_or_default(),
                ),
                None => {
                    let t = texts[0].clone();
                    (if t.is_empty() { "-".to_string() } else { t }, String::new())
                }
            };

            out.push(DistrictElectionRow {
                year,
                state: state.clone(),
                district,
                district_url,
                primary: cols.value("primary", &texts),
                primary_runoff: cols.value("primary_runoff", &texts),
                general_election: cols.value("general_election", &texts),
                general_runoff: cols.value("general_runoff", &texts),
                term_length: cols.value("term_length", &texts),
                seats_up: cols.value("seats_up", &texts),
                total_board_seats: cols.value("total_board_seats", &texts),
                enrollment: cols.value("enrollment", &texts),
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::FieldValue;

    const PAGE: &str = r#"
    <html><body>
    <table class="wikitable sortable">
      <tr><th colspan="6">2024 Alabama School Board Elections</th></tr>
      <tr><th>School district</th><th>Primary Runoff</th><th>Primary</th><th>General election</th><th>Seats up</th><th>2021-2022 enrollment</th></tr>
      <tr><td><a href="/Baldwin_County_Schools,_Alabama,_elections">Baldwin County Schools</a></td>
          <td></td><td>3/5/2024</td><td>11/5/2024</td><td>2</td><td>30,868</td></tr>
      <tr><td>Mobile County Public Schools</td><td>4/16/2024</td><td>3/5/2024</td><td>11/5/2024</td><td>3</td></tr>
    </table>
    <table class="sortable"><tr><th>Some other table</th></tr><tr><th>x</th></tr><tr><td>y</td></tr></table>
    <table class="sortable"><tr><th>New Hampshire School Board Elections</th></tr><tr><th>District</th></tr></table>
    </body></html>"#;

    #[test]
    fn state_tables_by_caption() {
        let rows = parse_year_page(PAGE, 2024).unwrap();
        assert_eq!(rows.len(), 2);
        let b = &rows[0];
        assert_eq!(b.state, "Alabama");
        assert_eq!(b.district, "Baldwin County Schools");
        assert_eq!(b.district_url, "https://ballotpedia.org/Baldwin_County_Schools,_Alabama,_elections");
        assert_eq!(b.primary, FieldValue::Value("3/5/2024".into()));
        assert_eq!(b.primary_runoff, FieldValue::Empty);
        assert_eq!(b.general_runoff, FieldValue::Absent);
        assert_eq!(b.enrollment, FieldValue::Value("30,868".into()));

        let m = &rows[1];
        assert_eq!(m.district_url, "");
        assert_eq!(m.primary_runoff, FieldValue::Value("4/16/2024".into()));
        // short row: resolved column with no cell
        assert_eq!(m.enrollment, FieldValue::Empty);
    }

    #[test]
    fn caption_without_year() {
        let html = r#"<table class="sortable">
            <tr><td>New Hampshire School Board Elections</td></tr>
            <tr><th>District</th><th>General election</th></tr>
            <tr><td><a href="https://ballotpedia.org/Bedford">Bedford</a></td><td>3/11/2025</td></tr></table>"#;
        let rows = parse_year_page(html, 2025).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, "New Hampshire");
        assert_eq!(rows[0].general_election.as_str(), "3/11/2025");
    }

    #[test]
    fn url_shape() {
        assert_eq!(year_url(2022), "https://ballotpedia.org/School_board_elections,_2022");
    }
}
