//! Header-to-field resolution for tables whose column order varies between
//! pages and years.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: &'static str,
    /// Case-insensitive substrings; any one matching claims the column.
    pub keywords: &'static [&'static str],
    /// Case-insensitive substrings that disqualify a header.
    pub excludes: &'static [&'static str],
    /// Higher resolves first.
    pub specificity: u8,
}

impl FieldSpec {
    fn matches(&self, header_lc: &str) -> bool {
        self.keywords.iter().any(|k| header_lc.contains(k))
            && !self.excludes.iter().any(|x| header_lc.contains(x))
    }

    fn longest_keyword(&self) -> usize {
        self.keywords.iter().map(|k| k.len()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    fields: Vec<(&'static str, Option<usize>)>,
}

impl ResolvedColumns {
    pub fn get(&self, field: &str) -> Option<usize> {
        self.fields.iter().find(|(f, _)| *f == field).and_then(|(_, i)| *i)
    }

    /// Three-state value of `field` for one data row.
    pub fn value(&self, field: &str, cells: &[String]) -> FieldValue {
        let Some(idx) = self.get(field) else { return FieldValue::Absent };
        match cells.get(idx).map(|s| s.trim()) {
            Some(s) if !s.is_empty() => FieldValue::Value(s.to_string()),
            _ => FieldValue::Empty,
        }
    }
}

/// A resolved field that is blank is different from a field the table
/// doesn't carry at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    Value(String),
    /// Column present, cell empty. Rendered as `-`.
    Empty,
    /// Column not present on this table. Rendered as an empty string.
    #[default]
    Absent,
}

impl FieldValue {
    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::Value(v) => v,
            FieldValue::Empty => "-",
            FieldValue::Absent => "",
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Map each field to a header index.
///
/// Fields resolve in decreasing specificity (ties: longer keyword first) and
/// every claimed index is unavailable to later fields, so "Primary Runoff"
/// can never be taken by the plain "Primary" field.
pub fn resolve(headers: &[String], specs: &[FieldSpec]) -> ResolvedColumns {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut order: Vec<&FieldSpec> = specs.iter().collect();
    order.sort_by(|a, b| {
        b.specificity
            .cmp(&a.specificity)
            .then_with(|| b.longest_keyword().cmp(&a.longest_keyword()))
    });

    let mut claimed = vec![false; lowered.len()];
    let mut found: Vec<(&'static str, Option<usize>)> = Vec::with_capacity(specs.len());
    for spec in order {
        let idx = lowered
            .iter()
            .enumerate()
            .find(|(i, h)| !claimed[*i] && spec.matches(h))
            .map(|(i, _)| i);
        if let Some(i) = idx { claimed[i] = true; }
        found.push((spec.field, idx));
    }

    // report in declaration order
    let fields = specs
        .iter()
        .map(|s| found.iter().find(|(f, _)| *f == s.field).copied().unwrap_or((s.field, None)))
        .collect();
    ResolvedColumns { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &[FieldSpec] = &[
        FieldSpec { field: "primary", keywords: &["primary"], excludes: &[], specificity: 1 },
        FieldSpec { field: "primary_runoff", keywords: &["primary runoff", "primary run-off"], excludes: &[], specificity: 3 },
        FieldSpec { field: "general_election", keywords: &["general election"], excludes: &[], specificity: 2 },
        FieldSpec { field: "enrollment", keywords: &["enrollment"], excludes: &[], specificity: 1 },
    ];

    fn hs(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn runoff_is_not_stolen_by_primary() {
        let r = resolve(&hs(&["Primary", "Primary Runoff", "General Election"]), SCHEMA);
        assert_eq!(r.get("primary"), Some(0));
        assert_eq!(r.get("primary_runoff"), Some(1));
        assert_eq!(r.get("general_election"), Some(2));

        let r = resolve(&hs(&["Primary Run-off", "General election", "PRIMARY"]), SCHEMA);
        assert_eq!(r.get("primary"), Some(2));
        assert_eq!(r.get("primary_runoff"), Some(0));
        assert_eq!(r.get("general_election"), Some(1));
    }

    #[test]
    fn three_state_values() {
        let r = resolve(&hs(&["District", "Primary", "General Election"]), SCHEMA);
        let cells = hs(&["Wake", "", "Nov 5"]);
        assert_eq!(r.value("general_election", &cells), FieldValue::Value("Nov 5".into()));
        assert_eq!(r.value("primary", &cells), FieldValue::Empty);
        assert_eq!(r.value("primary_runoff", &cells), FieldValue::Absent);
        assert_eq!(r.value("primary", &cells).as_str(), "-");
        assert_eq!(r.value("primary_runoff", &cells).as_str(), "");
    }

    #[test]
    fn excludes_disqualify() {
        let specs = [FieldSpec { field: "primary", keywords: &["primary"], excludes: &["runoff", "run-off"], specificity: 1 }];
        let r = resolve(&hs(&["Primary runoff"]), &specs);
        assert_eq!(r.get("primary"), None);
    }
}
