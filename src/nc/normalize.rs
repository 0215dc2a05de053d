//! Raw precinct cells -> canonical precinct rows.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use super::archive::RawTable;
use super::contest::{self, ContestParts};
use super::election_type::ElectionTypeRules;
use super::layout::{self, ColumnMap, Field, Repair};
use super::types::PrecinctRow;
use crate::aggregate::{TallyRecord, VoteBreakdown};
use crate::dom::parse_int;
use crate::error::ScrapeError;
use crate::util::time::parse_election_date;

pub const UNCLASSIFIED: &str = "unclassified";

/// Columns an archive must map to before it can be aggregated.
const REQUIRED: &[(Field, &str)] = &[(Field::ContestName, "contest name"), (Field::Choice, "choice"), (Field::TotalVotes, "total votes")];

#[derive(Debug, Clone)]
pub struct Normalized {
    pub rows: Vec<PrecinctRow>,
    pub layout: Option<&'static str>,
    pub repair: Repair,
    /// Distinct contest names the grammar did not match.
    pub unclassified: Vec<String>,
}

/// Contest names parsed once per archive.
#[derive(Debug, Default)]
pub struct ContestCache {
    parsed: HashMap<String, ContestParts>,
}

impl ContestCache {
    pub fn get(&mut self, name: &str) -> &ContestParts {
        self.parsed.entry(name.to_string()).or_insert_with(|| contest::parse(name))
    }
}

/// Vote counts: digits with optional thousands separators, or a whole float.
pub fn parse_count(s: &str) -> Option<u64> {
    parse_int(s).or_else(|| {
        let f: f64 = s.trim().parse().ok()?;
        (f >= 0.0 && f.fract() == 0.0).then_some(f as u64)
    })
}

fn contest_type_label(raw: &str) -> String {
    match raw {
        "S" => "State".to_string(),
        "C" => "County".to_string(),
        other => other.to_string(),
    }
}

/// Repair the header for the archive's era, map columns, and build one
/// canonical row per record. Blank dates take the archive date.
pub fn normalize(
    table: RawTable,
    archive_date: NaiveDate,
    source_url: &str,
    rules: &ElectionTypeRules,
    contests: &mut ContestCache,
) -> Result<Normalized, ScrapeError> {
    let era = layout::layout_for(archive_date);
    let repaired = layout::repair(table, era);
    let cols = ColumnMap::from_columns(&repaired.columns);
    let missing: Vec<&str> = REQUIRED.iter().filter(|(f, _)| !cols.has(*f)).map(|(_, n)| *n).collect();
    if !missing.is_empty() {
        return Err(ScrapeError::ParseShape(format!(
            "missing columns {:?} (have {:?})",
            missing, repaired.columns
        )));
    }

    let mut unclassified: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(repaired.rows.len());
    for raw in &repaired.rows {
        let get = |f: Field| cols.get(raw, f).map(str::to_string);
        let election_date = cols.get(raw, Field::ElectionDate).and_then(parse_election_date).or(Some(archive_date));
        let contest_name = get(Field::ContestName);

        let parts = match contest_name.as_deref() {
            Some(name) => contests.get(name).clone(),
            None => ContestParts::default(),
        };
        if !parts.is_classified() {
            if let Some(name) = &contest_name {
                if !unclassified.contains(name) { unclassified.push(name.clone()); }
            }
        }

        let count = |f: Field| cols.get(raw, f).and_then(parse_count);
        rows.push(PrecinctRow {
            state: "NC",
            county: get(Field::County),
            election_date,
            election_year: election_date.map(|d| d.year()),
            election_type: rules.classify(election_date),
            precinct: get(Field::Precinct),
            real_precinct: get(Field::RealPrecinct),
            contest_group_id: get(Field::ContestGroupId),
            contest_type: cols.get(raw, Field::ContestType).map(contest_type_label),
            choice_party: get(Field::ChoiceParty).or_else(|| contest_name.as_deref().and_then(contest::party_from_name)),
            contest_name,
            jurisdiction: parts.jurisdiction,
            jurisdiction_type: parts.jurisdiction_type,
            office: parts.office.unwrap_or_else(|| UNCLASSIFIED.to_string()),
            district: parts.district,
            choice: get(Field::Choice),
            vote_for: count(Field::VoteFor).and_then(|v| u32::try_from(v).ok()),
            election_day: count(Field::ElectionDay),
            early_voting: count(Field::EarlyVoting),
            absentee_by_mail: count(Field::AbsenteeByMail),
            provisional: count(Field::Provisional),
            total_votes: count(Field::TotalVotes),
            winner_status: get(Field::WinnerStatus),
            source_url: source_url.to_string(),
        });
    }

    Ok(Normalized { rows, layout: era.map(|l| l.key), repair: repaired.repair, unclassified })
}

impl PrecinctRow {
    pub fn to_tally(&self) -> TallyRecord {
        TallyRecord {
            election_date: self.election_date,
            contest_group_id: self.contest_group_id.clone(),
            contest_name: self.contest_name.clone().unwrap_or_default(),
            district: self.district.clone(),
            county: self.county.clone(),
            choice: self.choice.clone().unwrap_or_default(),
            party: self.choice_party.clone(),
            vote_for: self.vote_for,
            votes: self.total_votes,
            breakdown: VoteBreakdown {
                election_day: self.election_day,
                early_voting: self.early_voting,
                absentee_by_mail: self.absentee_by_mail,
                provisional: self.provisional,
            },
            winner_status: self.winner_status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

    fn nov2020() -> NaiveDate { NaiveDate::from_ymd_opt(2020, 11, 3).unwrap() }

    fn table_2020() -> RawTable {
        let header = strs(&[
            "County", "Election Date", "Precinct", "Contest Group ID", "Contest Type", "Contest Name", "Choice",
            "Choice Party", "Vote For", "Election Day", "One Stop", "Absentee by Mail", "Provisional", "Total Votes",
            "Real Precinct",
        ]);
        RawTable {
            header: Some(header),
            rows: vec![
                strs(&["WAKE", "11/03/2020", "01-01", "1", "S", "US SENATE", "Thom Tillis", "REP", "1", "100", "200", "50", "1", "351", "Y"]),
                strs(&["WAKE", "", "01-01", "7", "C", "WAKE COUNTY BOARD OF EDUCATION DISTRICT 3", "Jane Doe", "", "1", "10", "x", "", "", "1,010", "Y"]),
                strs(&["WAKE", "11/03/2020", "01-01", "9", "C", "COUNTY COMMISSIONER REFERENDUM (REP)", "Yes", " ", "1", "", "", "", "", "5", "Y"]),
            ],
        }
    }

    #[test]
    fn canonical_rows() {
        let mut cache = ContestCache::default();
        let n = normalize(table_2020(), nov2020(), "u", &ElectionTypeRules::default(), &mut cache).unwrap();
        assert_eq!(n.layout, Some("pct_2020"));
        assert_eq!(n.repair, Repair::HeaderKept);
        assert_eq!(n.rows.len(), 3);

        let s = &n.rows[0];
        assert_eq!(s.contest_type.as_deref(), Some("State"));
        assert_eq!(s.jurisdiction.as_deref(), Some("US"));
        assert_eq!(s.office, "Senate");
        assert_eq!(s.election_type.as_deref(), Some("General"));
        assert_eq!(s.election_year, Some(2020));
        assert_eq!(s.early_voting, Some(200));
        assert_eq!(s.total_votes, Some(351));

        let b = &n.rows[1];
        assert_eq!(b.election_date, Some(nov2020()));
        assert_eq!(b.contest_type.as_deref(), Some("County"));
        assert_eq!(b.district.as_deref(), Some("District 3"));
        assert_eq!(b.early_voting, None);
        assert_eq!(b.total_votes, Some(1010));
        assert_eq!(b.choice_party, None);
    }

    #[test]
    fn unclassified_rows_are_kept() {
        let mut cache = ContestCache::default();
        let n = normalize(table_2020(), nov2020(), "u", &ElectionTypeRules::default(), &mut cache).unwrap();
        let r = &n.rows[2];
        assert_eq!(r.office, UNCLASSIFIED);
        assert_eq!(r.jurisdiction, None);
        assert_eq!(r.choice_party.as_deref(), Some("REP"));
        assert_eq!(n.unclassified, vec!["COUNTY COMMISSIONER REFERENDUM (REP)".to_string()]);
    }

    #[test]
    fn missing_required_columns_is_a_shape_error() {
        let t = RawTable { header: Some(strs(&["County", "Precinct"])), rows: vec![strs(&["WAKE", "01"])] };
        let mut cache = ContestCache::default();
        let err = normalize(t, nov2020(), "u", &ElectionTypeRules::default(), &mut cache).unwrap_err();
        assert_eq!(err.kind(), "parse_shape");
    }

    #[test]
    fn counts() {
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count("12.5"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn tally_carries_breakdown() {
        let mut cache = ContestCache::default();
        let n = normalize(table_2020(), nov2020(), "u", &ElectionTypeRules::default(), &mut cache).unwrap();
        let t = n.rows[0].to_tally();
        assert_eq!(t.votes, Some(351));
        assert_eq!(t.breakdown.absentee_by_mail, Some(50));
        assert_eq!(t.party.as_deref(), Some("REP"));
    }
}
