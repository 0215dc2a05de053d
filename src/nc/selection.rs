use chrono::NaiveDate;

use super::discovery::ElectionArchive;
use crate::error::ScrapeError;

/// Which discovered elections to process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    /// Everything discovered.
    #[default]
    All,
    Exact(NaiveDate),
    /// Inclusive; a missing bound is the discovered min/max.
    Range { start: Option<NaiveDate>, end: Option<NaiveDate> },
}

impl Selection {
    pub fn from_flags(date: Option<NaiveDate>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match (date, start, end) {
            (Some(d), _, _) => Selection::Exact(d),
            (None, None, None) => Selection::All,
            (None, start, end) => Selection::Range { start, end },
        }
    }
}

pub fn select(elections: &[ElectionArchive], sel: Selection) -> Result<Vec<ElectionArchive>, ScrapeError> {
    let (Some(first), Some(last)) = (elections.iter().map(|e| e.election_date).min(), elections.iter().map(|e| e.election_date).max()) else {
        return Ok(Vec::new());
    };
    let (start, end) = match sel {
        Selection::All => (first, last),
        Selection::Exact(d) => (d, d),
        Selection::Range { start, end } => (start.unwrap_or(first), end.unwrap_or(last)),
    };
    if start > end {
        return Err(ScrapeError::Config(format!("--start {start} is after --end {end}")));
    }
    Ok(elections
        .iter()
        .filter(|e| (start..=end).contains(&e.election_date))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

    fn archives() -> Vec<ElectionArchive> {
        [d(2016, 3, 15), d(2018, 11, 6), d(2020, 3, 3), d(2020, 11, 3)]
            .into_iter()
            .map(|election_date| ElectionArchive { election_date, zip_url: format!("u/{election_date}"), label: String::new() })
            .collect()
    }

    fn dates(v: &[ElectionArchive]) -> Vec<NaiveDate> { v.iter().map(|e| e.election_date).collect() }

    #[test]
    fn exact_date() {
        let got = select(&archives(), Selection::from_flags(Some(d(2020, 3, 3)), Some(d(2000, 1, 1)), None)).unwrap();
        assert_eq!(dates(&got), vec![d(2020, 3, 3)]);
        assert!(select(&archives(), Selection::Exact(d(2021, 1, 1))).unwrap().is_empty());
    }

    #[test]
    fn open_bounds_default_to_discovered_range() {
        let got = select(&archives(), Selection::from_flags(None, Some(d(2018, 1, 1)), None)).unwrap();
        assert_eq!(dates(&got), vec![d(2018, 11, 6), d(2020, 3, 3), d(2020, 11, 3)]);
        let got = select(&archives(), Selection::from_flags(None, None, Some(d(2018, 11, 6)))).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(select(&archives(), Selection::All).unwrap().len(), 4);
    }

    #[test]
    fn inverted_range_is_a_config_error() {
        let err = select(&archives(), Selection::Range { start: Some(d(2020, 1, 1)), end: Some(d(2019, 1, 1)) }).unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn nothing_discovered() {
        assert!(select(&[], Selection::Range { start: Some(d(2020, 1, 1)), end: Some(d(2019, 1, 1)) }).unwrap().is_empty());
    }
}
