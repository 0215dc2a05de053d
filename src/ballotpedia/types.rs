use serde::Serialize;

use crate::output::TableWritten;
use crate::record::SkippedUnit;
use crate::resolve::FieldValue;

/// One district row of a year page's per-state table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictElectionRow {
    pub year: i32,
    pub state: String,
    pub district: String,
    pub district_url: String,
    pub primary: FieldValue,
    pub primary_runoff: FieldValue,
    pub general_election: FieldValue,
    pub general_runoff: FieldValue,
    pub term_length: FieldValue,
    pub seats_up: FieldValue,
    pub total_board_seats: FieldValue,
    pub enrollment: FieldValue,
}

/// One candidate of one race as it appears on a district page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RaceCandidate {
    pub race: String,
    pub election_type: String,
    pub candidate: String,
    pub candidate_url: String,
    pub party: String,
    pub is_winner: bool,
    pub is_incumbent: bool,
    pub pct: String,
    pub votes: String,
}

/// A race candidate keyed by the district it was scraped from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRow {
    pub year: i32,
    pub state: String,
    pub district: String,
    pub district_url: String,
    pub race: String,
    pub election_type: String,
    pub candidate: String,
    pub candidate_url: String,
    pub party: String,
    pub is_winner: bool,
    pub is_incumbent: bool,
    pub pct: String,
    pub votes: String,
}

impl CandidateRow {
    pub fn new(d: &DistrictElectionRow, c: RaceCandidate) -> Self {
        CandidateRow {
            year: d.year,
            state: d.state.clone(),
            district: d.district.clone(),
            district_url: d.district_url.clone(),
            race: c.race,
            election_type: c.election_type,
            candidate: c.candidate,
            candidate_url: c.candidate_url,
            party: c.party,
            is_winner: c.is_winner,
            is_incumbent: c.is_incumbent,
            pct: c.pct,
            votes: c.votes,
        }
    }
}

/// District metadata followed by the candidate columns; blank candidate
/// columns for districts without results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRow {
    pub year: i32,
    pub state: String,
    pub district: String,
    pub district_url: String,
    pub primary: FieldValue,
    pub primary_runoff: FieldValue,
    pub general_election: FieldValue,
    pub general_runoff: FieldValue,
    pub term_length: FieldValue,
    pub seats_up: FieldValue,
    pub total_board_seats: FieldValue,
    pub enrollment: FieldValue,
    pub race: Option<String>,
    pub election_type: Option<String>,
    pub candidate: Option<String>,
    pub candidate_url: Option<String>,
    pub party: Option<String>,
    pub is_winner: Option<bool>,
    pub is_incumbent: Option<bool>,
    pub pct: Option<String>,
    pub votes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub metadata: String,
}

// Plan envelope types
#[derive(Serialize)]
pub struct SchoolBoardPlan {
    pub state: String,
    pub start: i32,
    pub end: i32,
    pub district_pages: bool,
    pub year_urls: Vec<String>,
}

#[derive(Serialize)]
pub struct SearchPlan { pub query: String, pub limit: u32, pub max_pages: u32, pub first_url: String }

// Apply/result envelope types
#[derive(Serialize)]
pub struct YearSummary { pub year: i32, pub districts: usize, pub candidates: usize }

#[derive(Serialize)]
pub struct SchoolBoardApply {
    pub state: String,
    pub per_year: Vec<YearSummary>,
    pub skipped: Vec<SkippedUnit>,
    pub tables: Vec<TableWritten>,
}

#[derive(Serialize)]
pub struct SearchApply { pub query: String, pub pages: u32, pub hits: Vec<SearchHit>, pub table: Option<TableWritten> }
