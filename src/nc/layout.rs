//! Historical column layouts of the precinct results files and the header
//! repair applied before columns are mapped to canonical names.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::archive::RawTable;
use crate::dom::clean_ws;

/// Header overlap needed before a row is trusted as the header.
pub const HEADER_OVERLAP: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub key: &'static str,
    /// `yyyymmdd`, inclusive.
    pub start: u32,
    /// `yyyymmdd`, exclusive.
    pub end: u32,
    pub columns: &'static [&'static str],
}

pub const LAYOUTS: &[Layout] = &[
    Layout {
        key: "pct_2000",
        start: 2000_01_01,
        end: 2006_01_01,
        columns: &["county", "election_dt", "precinct", "contest_name", "name_on_ballot", "party_cd", "ballot_count"],
    },
    Layout {
        key: "pct_2006",
        start: 2006_01_01,
        end: 2010_01_01,
        columns: &["County", "Election Date", "Precinct", "Contest", "Choice", "Party", "Election Day", "Absentee", "Provisional", "Total Votes"],
    },
    Layout {
        key: "pct_2010",
        start: 2010_01_01,
        end: 2014_01_01,
        columns: &[
            "County", "Election Date", "Precinct", "Contest Name", "Choice", "Party", "Vote For",
            "Election Day", "One Stop", "Absentee by Mail", "Provisional", "Total Votes", "Winner Flag",
        ],
    },
    Layout {
        key: "pct_2014",
        start: 2014_01_01,
        end: 2020_01_01,
        columns: &[
            "County", "Election Date", "Precinct", "Contest Group ID", "Contest Type", "Contest Name", "Choice",
            "Choice Party", "Vote For", "Election Day", "One Stop", "Absentee by Mail", "Provisional", "Total Votes",
        ],
    },
    Layout {
        key: "pct_2020",
        start: 2020_01_01,
        end: 2100_01_01,
        columns: &[
            "County", "Election Date", "Precinct", "Contest Group ID", "Contest Type", "Contest Name", "Choice",
            "Choice Party", "Vote For", "Election Day", "One Stop", "Absentee by Mail", "Provisional", "Total Votes",
            "Real Precinct",
        ],
    },
];

pub fn layout_for(date: NaiveDate) -> Option<&'static Layout> {
    let ymd = date.year() as u32 * 10_000 + date.month() * 100 + date.day();
    LAYOUTS.iter().find(|l| l.start <= ymd && ymd < l.end)
}

/// Canonical precinct columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    County,
    ElectionDate,
    Precinct,
    ContestGroupId,
    ContestType,
    ContestName,
    Choice,
    ChoiceParty,
    VoteFor,
    ElectionDay,
    EarlyVoting,
    AbsenteeByMail,
    Provisional,
    TotalVotes,
    RealPrecinct,
    WinnerStatus,
}

/// Normalized raw column name -> canonical column, across every era.
const COL_MAP: &[(&str, Field)] = &[
    ("county", Field::County),
    ("election date", Field::ElectionDate),
    ("election_dt", Field::ElectionDate),
    ("election_date", Field::ElectionDate),
    ("precinct", Field::Precinct),
    ("contest group id", Field::ContestGroupId),
    ("contest type", Field::ContestType),
    ("contest name", Field::ContestName),
    ("contest_name", Field::ContestName),
    ("contest", Field::ContestName),
    ("choice", Field::Choice),
    ("name_on_ballot", Field::Choice),
    ("choice party", Field::ChoiceParty),
    ("party", Field::ChoiceParty),
    ("party_cd", Field::ChoiceParty),
    ("vote for", Field::VoteFor),
    ("election day", Field::ElectionDay),
    ("one stop", Field::EarlyVoting),
    ("early voting", Field::EarlyVoting),
    ("absentee by mail", Field::AbsenteeByMail),
    ("absentee", Field::AbsenteeByMail),
    ("provisional", Field::Provisional),
    ("total votes", Field::TotalVotes),
    ("ballot_count", Field::TotalVotes),
    ("real precinct", Field::RealPrecinct),
    ("winner flag", Field::WinnerStatus),
    ("winner status", Field::WinnerStatus),
];

pub fn norm_col(s: &str) -> String {
    clean_ws(s).to_lowercase()
}

/// Share of `expected` names present in `tokens`, ignoring order and case.
pub fn overlap_ratio(tokens: &[String], expected: &[&str]) -> f64 {
    let got: std::collections::HashSet<String> = tokens.iter().map(|t| norm_col(t)).collect();
    let exp: std::collections::HashSet<String> = expected.iter().map(|t| norm_col(t)).collect();
    if exp.is_empty() {
        return 0.0;
    }
    exp.intersection(&got).count() as f64 / exp.len() as f64
}

/// Which rung of the repair ladder produced the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Repair {
    /// Read without a header; names assigned by position.
    Positional,
    /// The header matched the era.
    HeaderKept,
    /// The first data row was the header.
    HeaderPromoted,
    /// The header was really the first data row.
    HeaderShifted,
    /// Nothing matched; names assigned by position.
    BestEffort,
    /// No era covers the date; the header is used as read.
    Unrepaired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub repair: Repair,
}

fn positional(expected: &[&str], width: usize) -> Vec<String> {
    (0..width)
        .map(|i| expected.get(i).map(|s| s.to_string()).unwrap_or_else(|| format!("column_{}", i + 1)))
        .collect()
}

/// Give `table` the era's header, repairing the ways these files go wrong.
pub fn repair(table: RawTable, layout: Option<&Layout>) -> Repaired {
    let width = table.width();
    let Some(layout) = layout else {
        let columns = table.header.unwrap_or_else(|| positional(&[], width));
        return Repaired { columns, rows: table.rows, repair: Repair::Unrepaired };
    };
    let expected = layout.columns;

    let Some(header) = table.header else {
        return Repaired { columns: positional(expected, width), rows: table.rows, repair: Repair::Positional };
    };

    if overlap_ratio(&header, expected) >= HEADER_OVERLAP {
        let columns = if header.len() == expected.len() { positional(expected, header.len()) } else { header };
        return Repaired { columns, rows: table.rows, repair: Repair::HeaderKept };
    }

    if table.rows.first().is_some_and(|r| overlap_ratio(r, expected) >= HEADER_OVERLAP) {
        let rows = table.rows.into_iter().skip(1).collect();
        return Repaired { columns: positional(expected, width), rows, repair: Repair::HeaderPromoted };
    }

    if header.len() == expected.len() {
        let mut rows = Vec::with_capacity(table.rows.len() + 1);
        rows.push(header);
        rows.extend(table.rows);
        return Repaired { columns: positional(expected, expected.len()), rows, repair: Repair::HeaderShifted };
    }

    Repaired { columns: positional(expected, width), rows: table.rows, repair: Repair::BestEffort }
}

/// Canonical field -> column index. The first column mapping to a field wins.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    idx: HashMap<Field, usize>,
}

impl ColumnMap {
    pub fn from_columns(columns: &[String]) -> Self {
        let mut idx = HashMap::new();
        for (i, c) in columns.iter().enumerate() {
            let n = norm_col(c);
            if let Some((_, f)) = COL_MAP.iter().find(|(raw, _)| *raw == n) {
                idx.entry(*f).or_insert(i);
            }
        }
        ColumnMap { idx }
    }

    pub fn has(&self, f: Field) -> bool { self.idx.contains_key(&f) }

    /// Trimmed cell for `f`; blank and missing cells are `None`.
    pub fn get<'r>(&self, row: &'r [String], f: Field) -> Option<&'r str> {
        let i = *self.idx.get(&f)?;
        row.get(i).map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

    fn l2020() -> &'static Layout { layout_for(NaiveDate::from_ymd_opt(2020, 11, 3).unwrap()).unwrap() }

    fn data_row() -> Vec<String> {
        strs(&["WAKE", "11/03/2020", "01-01", "1", "S", "US SENATE", "Cal Cunningham", "DEM", "1", "10", "20", "3", "0", "33", "Y"])
    }

    #[test]
    fn eras_by_date() {
        assert_eq!(layout_for(NaiveDate::from_ymd_opt(2004, 11, 2).unwrap()).map(|l| l.key), Some("pct_2000"));
        assert_eq!(layout_for(NaiveDate::from_ymd_opt(2014, 1, 1).unwrap()).map(|l| l.key), Some("pct_2014"));
        assert_eq!(layout_for(NaiveDate::from_ymd_opt(2013, 12, 31).unwrap()).map(|l| l.key), Some("pct_2010"));
        assert_eq!(layout_for(NaiveDate::from_ymd_opt(1998, 11, 3).unwrap()), None);
    }

    #[test]
    fn overlap_ignores_case_and_spacing() {
        let got = overlap_ratio(&strs(&["COUNTY", "election  date", "x"]), &["County", "Election Date", "Precinct", "Choice"]);
        assert!((got - 0.5).abs() < 1e-9);
    }

    #[test]
    fn headerless_is_positional() {
        let t = RawTable { header: None, rows: vec![data_row()] };
        let r = repair(t, Some(l2020()));
        assert_eq!(r.repair, Repair::Positional);
        assert_eq!(r.columns[5], "Contest Name");
        assert_eq!(r.rows.len(), 1);
    }

    #[test]
    fn matching_header_is_kept() {
        let mut header = strs(l2020().columns);
        header[0] = "county".into();
        let t = RawTable { header: Some(header), rows: vec![data_row()] };
        let r = repair(t, Some(l2020()));
        assert_eq!(r.repair, Repair::HeaderKept);
        assert_eq!(r.columns[0], "County");
    }

    #[test]
    fn header_in_first_row_is_promoted() {
        let t = RawTable { header: Some(strs(&["junk"; 15])), rows: vec![strs(l2020().columns), data_row()] };
        let r = repair(t, Some(l2020()));
        assert_eq!(r.repair, Repair::HeaderPromoted);
        assert_eq!(r.rows, vec![data_row()]);
    }

    #[test]
    fn data_read_as_header_is_shifted_back() {
        let t = RawTable { header: Some(data_row()), rows: vec![data_row()] };
        let r = repair(t, Some(l2020()));
        assert_eq!(r.repair, Repair::HeaderShifted);
        assert_eq!(r.rows.len(), 2);
        assert_eq!(r.columns.len(), 15);
    }

    #[test]
    fn best_effort_when_nothing_fits() {
        let t = RawTable { header: Some(strs(&["a", "b", "c"])), rows: vec![strs(&["WAKE", "11/03/2020", "01-01"])] };
        let r = repair(t, Some(l2020()));
        assert_eq!(r.repair, Repair::BestEffort);
        assert_eq!(r.columns, strs(&["County", "Election Date", "Precinct"]));
        assert_eq!(r.rows.len(), 1);
    }

    #[test]
    fn column_map_across_eras() {
        let m = ColumnMap::from_columns(&strs(&["county", "election_dt", "contest_name", "name_on_ballot", "party_cd", "ballot_count"]));
        let row = strs(&["WAKE", "11/02/2004", "PRESIDENT", "  ", "DEM", "12"]);
        assert_eq!(m.get(&row, Field::County), Some("WAKE"));
        assert_eq!(m.get(&row, Field::Choice), None);
        assert_eq!(m.get(&row, Field::TotalVotes), Some("12"));
        assert!(!m.has(Field::ContestGroupId));
        assert_eq!(m.get(&row, Field::ContestGroupId), None);
    }
}
