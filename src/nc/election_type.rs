use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::util::time::is_general_election_day;

/// Election type by date: listed general dates and the November general
/// election day are `General`, listed special dates are `Special`, anything
/// else falls back to `default`.
#[derive(Debug, Clone)]
pub struct ElectionTypeRules {
    pub general_dates: BTreeSet<NaiveDate>,
    pub special_dates: BTreeSet<NaiveDate>,
    pub default: String,
}

impl Default for ElectionTypeRules {
    fn default() -> Self {
        ElectionTypeRules { general_dates: BTreeSet::new(), special_dates: BTreeSet::new(), default: "Primary".to_string() }
    }
}

impl ElectionTypeRules {
    pub fn with_special_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.special_dates.extend(dates);
        self
    }

    pub fn classify(&self, date: Option<NaiveDate>) -> Option<String> {
        let d = date?;
        Some(if self.general_dates.contains(&d) || is_general_election_day(d) {
            "General".to_string()
        } else if self.special_dates.contains(&d) {
            "Special".to_string()
        } else {
            self.default.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

    #[test]
    fn by_date() {
        let rules = ElectionTypeRules::default().with_special_dates([d(2019, 9, 10)]);
        assert_eq!(rules.classify(Some(d(2020, 11, 3))).as_deref(), Some("General"));
        assert_eq!(rules.classify(Some(d(2019, 9, 10))).as_deref(), Some("Special"));
        assert_eq!(rules.classify(Some(d(2020, 3, 3))).as_deref(), Some("Primary"));
        assert_eq!(rules.classify(None), None);
    }

    #[test]
    fn listed_general_dates() {
        let mut rules = ElectionTypeRules::default();
        rules.general_dates.insert(d(2019, 10, 8));
        assert_eq!(rules.classify(Some(d(2019, 10, 8))).as_deref(), Some("General"));
    }
}
