use serde::Serialize;

use crate::output::TableWritten;
use crate::record::SkippedUnit;
use crate::registry::{FetchMethod, Generation};

// Plan envelope types
#[derive(Serialize)]
pub struct StatsPlan {
    pub state: String,
    pub generation: Generation,
    pub fetch_method: FetchMethod,
    pub years: Vec<i32>,
    pub max_pages: u32,
    pub county_details: bool,
    pub sample_search_urls: Vec<String>,
}

// Apply/result envelope types
#[derive(Serialize)]
pub struct YearSummary { pub year: i32, pub pages: u32, pub rows: usize }

#[derive(Serialize)]
pub struct StatsTotals {
    pub state_rows: usize,
    pub elections: usize,
    pub details_fetched: usize,
    pub county_rows: usize,
    pub joined_rows: usize,
    pub skipped: usize,
}

#[derive(Serialize)]
pub struct StatsApply {
    pub state: String,
    pub totals: StatsTotals,
    pub per_year: Vec<YearSummary>,
    pub skipped: Vec<SkippedUnit>,
    pub tables: Vec<TableWritten>,
}
