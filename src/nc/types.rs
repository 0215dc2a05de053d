use chrono::NaiveDate;
use serde::Serialize;

use super::contest::{ContestParts, JurisdictionType};
use super::discovery::ElectionArchive;
use super::layout::Repair;
use crate::aggregate::{Outcome, Rollup};
use crate::output::TableWritten;
use crate::record::SkippedUnit;

/// One precinct's tally for one choice, after column normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecinctRow {
    pub state: &'static str,
    pub county: Option<String>,
    pub election_date: Option<NaiveDate>,
    pub election_year: Option<i32>,
    pub election_type: Option<String>,
    pub precinct: Option<String>,
    pub real_precinct: Option<String>,
    pub contest_group_id: Option<String>,
    pub contest_type: Option<String>,
    pub contest_name: Option<String>,
    pub jurisdiction: Option<String>,
    pub jurisdiction_type: Option<JurisdictionType>,
    pub office: String,
    pub district: Option<String>,
    pub choice: Option<String>,
    pub choice_party: Option<String>,
    pub vote_for: Option<u32>,
    pub election_day: Option<u64>,
    pub early_voting: Option<u64>,
    pub absentee_by_mail: Option<u64>,
    pub provisional: Option<u64>,
    pub total_votes: Option<u64>,
    pub winner_status: Option<String>,
    pub source_url: String,
}

/// County or state rollup row; the vote breakdown is flattened for CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupRow {
    pub state: &'static str,
    pub election_date: Option<NaiveDate>,
    pub election_year: Option<i32>,
    pub election_type: Option<String>,
    pub county: Option<String>,
    pub contest_group_id: Option<String>,
    pub contest_name: String,
    pub jurisdiction: Option<String>,
    pub jurisdiction_type: Option<JurisdictionType>,
    pub office: String,
    pub district: Option<String>,
    pub choice: String,
    pub party: Option<String>,
    pub vote_for: Option<u32>,
    pub votes: u64,
    pub election_day: Option<u64>,
    pub early_voting: Option<u64>,
    pub absentee_by_mail: Option<u64>,
    pub provisional: Option<u64>,
    pub contest_total_votes: u64,
    pub vote_share: Option<f64>,
    pub contest_outcome: Option<Outcome>,
    pub source_url: String,
}

impl RollupRow {
    pub fn new(r: Rollup, parts: &ContestParts, election_type: Option<String>, source_url: &str) -> Self {
        use chrono::Datelike;
        RollupRow {
            state: "NC",
            election_year: r.election_date.map(|d| d.year()),
            election_date: r.election_date,
            election_type,
            county: r.county,
            contest_group_id: r.contest_group_id,
            contest_name: r.contest_name,
            jurisdiction: parts.jurisdiction.clone(),
            jurisdiction_type: parts.jurisdiction_type,
            office: parts.office.clone().unwrap_or_else(|| super::normalize::UNCLASSIFIED.to_string()),
            district: r.district,
            choice: r.choice,
            party: r.party,
            vote_for: r.vote_for,
            votes: r.votes,
            election_day: r.breakdown.election_day,
            early_voting: r.breakdown.early_voting,
            absentee_by_mail: r.breakdown.absentee_by_mail,
            provisional: r.breakdown.provisional,
            contest_total_votes: r.contest_total_votes,
            vote_share: r.vote_share,
            contest_outcome: r.contest_outcome,
            source_url: source_url.to_string(),
        }
    }
}

// Plan envelope types
#[derive(Serialize)]
pub struct NcPlan {
    pub index_url: String,
    pub discovered: usize,
    pub selected: usize,
    pub elections: Vec<ElectionArchive>,
}

// Apply/result envelope types
#[derive(Debug, Clone, Serialize)]
pub struct ElectionSummary {
    pub election_date: NaiveDate,
    pub member: String,
    pub layout: Option<&'static str>,
    pub repair: Repair,
    pub precinct_rows: usize,
    pub unclassified_contests: usize,
}

#[derive(Serialize)]
pub struct NcTotals {
    pub elections: usize,
    pub skipped: usize,
    pub precinct_rows: usize,
    pub county_rows: usize,
    pub state_rows: usize,
}

#[derive(Serialize)]
pub struct NcApply {
    pub totals: NcTotals,
    pub elections: Vec<ElectionSummary>,
    pub skipped: Vec<SkippedUnit>,
    pub tables: Vec<TableWritten>,
}
