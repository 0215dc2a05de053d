use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate, Weekday};

// Formats seen in NC precinct files across eras, tried in order.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d"];

// Parse an election date cell. Blank or unparseable -> None.
pub fn parse_election_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS.iter().find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}

// Helper for Option<String> inputs used by CLI flags like --date / --start
pub fn parse_iso_opt(flag: &str, s: &Option<String>) -> Result<Option<NaiveDate>> {
    let Some(s) = s.as_ref() else { return Ok(None) };
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| anyhow!("{flag} {s:?} is not YYYY-MM-DD: {e}"))
}

// The Tuesday after the first Monday in November.
pub fn is_general_election_day(d: NaiveDate) -> bool {
    d.month() == 11 && d.weekday() == Weekday::Tue && (2..=8).contains(&d.day())
}
