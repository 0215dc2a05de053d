//! Contest-name grammar: `"WAKE COUNTY BOARD OF EDUCATION DISTRICT 3"` ->
//! jurisdiction, office and district.
//!
//! Two grammars are tried in order. The first covers municipal and local
//! board races; the second covers county, state, judicial and federal races
//! with a fixed office vocabulary. Coverage is incomplete by nature; callers
//! keep unmatched contests as unclassified.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::dom::clean_ws;

const WARD_ORDINALS: &str = "FIRST|SECOND|THIRD|FOURTH|FIFTH|SIXTH|SEVENTH|EIGHTH|NINTH|TENTH|ELEVENTH|TWELFTH";

static LOCAL: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?x)
        ^
        (?:(?P<unit>CITY|TOWN|VILLAGE)\s+OF\s+)?
        (?P<jurisdiction>[A-Z0-9\s&\-.\x{{2013}}\x{{2014}}]+?)\s+
        (?P<county>COUNTY\s+)?
        (?:(?:CITY|TOWN|VILLAGE)\s+)??
        (?P<office>
            MAYOR
            | COUNCIL\s+MEMBERS?
            | COUNCILMAN
            | COUNCILMEN
            | COUNCIL(?:\s+MEMBERS?)?
            | (?:CITY|TOWN|VILLAGE)\s+COUNCIL(?:\s+MEMBERS?)?
            | (?:CITY|TOWN|VILLAGE)\s+COUNCILMEN
            | BOARD
            | BOARD\s+MEMBERS?
            | BOARD\s+OF\s+DIRECTORS
            | BOARD\s+OF\s+EDUCATION
            | BOARD\s+OF\s+TRUSTEES
            | BOARD\s+OF\s+ALDERMEN
            | BOARD\s+OF\s+COMMISSIONERS
            | COMMISSIONERS?
            | TRUSTEES?
            | ALDERMAN
            | ALDERMEN
        )
        (?:\s+
            (?P<district>
                AT[-\s]?LARGE
                (?:\s+
                    (?:
                        \d+(?:ST|ND|RD|TH)\s+WARD
                        | (?:{ord})\s+WARD
                        | WARD\s+(?:\d+|[A-Z]|[IVXLCDM]+)
                        | (?:NORTH|SOUTH|EAST|WEST)\s+WARD
                    )
                )?
                | DISTRICT\s+\d+
                | DISTRICT\s+[A-Z]
                | WARD\s+(?:\d+|[A-Z]|[IVXLCDM]+)
                | \d+(?:ST|ND|RD|TH)\s+WARD
                | (?:{ord})\s+WARD
                | (?:NORTH|SOUTH|EAST|WEST)\s+WARD
                | (?:NORTH|SOUTH|EAST|WEST)\s+END
                | [A-Z0-9&.\-]+(?:\s+[A-Z0-9&.\-]+)?\s+DISTRICT
            )
        )?
        (?:\s*\([A-Z]+\))?
        \s*$",
        ord = WARD_ORDINALS
    );
    Regex::new(&pattern).expect("local contest pattern")
});

static STATEWIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?:(?P<state_prefix>NC)\s+)?
        (?:
            (?P<jurisdiction>
                [A-Z0-9&.\-]+(?:\s+[A-Z0-9&.\-]+)*\s+COUNTY(?:\s+PUBLIC\s+SCHOOLS)?
                | [A-Z0-9&.\-]+(?:\s+[A-Z0-9&.\-]+)*\s+CITY\s+SCHOOLS
                | [A-Z0-9&.\-]+(?:\s+[A-Z0-9&.\-]+)*\s+SANITARY\s+DISTRICT
                | [A-Z0-9&.\-]+(?:\s+[A-Z0-9&.\-]+)*\s+SOIL\s+AND\s+WATER\s+CONSERVATION\s+DISTRICT
            )
            \s+
        )?
        (?P<office>
            US\s+HOUSE\s+OF\s+REPRESENTATIVES
            | US\s+SENATE
            | US\s+PRESIDENT
            | PRESIDENTIAL\s+PREFERENCE
            | (?:NC\s+)?HOUSE\s+OF\s+REPRESENTATIVES
            | (?:NC\s+)?STATE\s+SENATE
            | (?:NC\s+)?ATTORNEY\s+GENERAL
            | (?:NC\s+)?AUDITOR
            | (?:NC\s+)?COMMISSIONER\s+OF\s+AGRICULTURE
            | (?:NC\s+)?COMMISSIONER\s+OF\s+LABOR
            | (?:NC\s+)?COMMISSIONER\s+OF\s+INSURANCE
            | (?:NC\s+)?GOVERNOR
            | (?:NC\s+)?LIEUTENANT\s+GOVERNOR
            | (?:NC\s+)?SECRETARY\s+OF\s+STATE
            | (?:NC\s+)?TREASURER
            | (?:NC\s+)?SUPERINTENDENT\s+OF\s+PUBLIC\s+INSTRUCTION
            | (?:NC\s+)?SUPREME\s+COURT\s+CHIEF\s+JUSTICE
            | (?:NC\s+)?COURT\s+OF\s+APPEALS\s+JUDGE
            | (?:NC\s+)?SUPERIOR\s+COURT\s+JUDGE
            | (?:NC\s+)?DISTRICT\s+COURT\s+JUDGE
            | (?:NC\s+)?SUPREME\s+COURT\s+ASSOCIATE\s+JUSTICE
            | DISTRICT\s+ATTORNEY
            | SHERIFF
            | CLERK\s+OF\s+SUPERIOR\s+COURT
            | REGISTER\s+OF\s+DEEDS
            | BOARD\s+OF\s+COMMISSIONERS
            | BOARD\s+OF\s+EDUCATION(?:\s+MEMBER)?
            | SUPERVISOR
        )
        (?P<qualifiers>
            (?:\s+
                (?:
                    DIST(?:RICT)?\s+(?:\d{1,3}[A-Z]?|[IVXLCDM]+)
                    | DISTRICT\s+(?:\d{1,3}[A-Z]?|[IVXLCDM]+)
                    | SEAT\s+\d{1,3}
                    | AT[-\s]?LARGE
                    | COUNTY[-\s]?WIDE
                    | AREA\s+(?:[IVXLCDM]+|[A-Z]|\d+)
                    | CHAIRMAN
                    | MEMBER
                )
            )*
        )
        (?:\s*\((?P<party>[A-Z]+)\))?
        \s*$",
    )
    .expect("statewide contest pattern")
});

static TRAILING_PARTY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)$").expect("trailing party pattern"));

const COUNTY_OFFICES: &[&str] = &["SHERIFF", "CLERK OF SUPERIOR COURT", "REGISTER OF DEEDS", "BOARD OF COMMISSIONERS"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JurisdictionType {
    Municipal,
    County,
    #[serde(rename = "School System")]
    SchoolSystem,
    #[serde(rename = "Special District")]
    SpecialDistrict,
    State,
    Federal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContestParts {
    pub jurisdiction: Option<String>,
    pub jurisdiction_type: Option<JurisdictionType>,
    pub office: Option<String>,
    pub district: Option<String>,
}

impl ContestParts {
    pub fn is_classified(&self) -> bool { self.office.is_some() }

    pub fn triple(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        (self.jurisdiction.as_deref(), self.office.as_deref(), self.district.as_deref())
    }
}

/// `"BOARD OF EDUCATION"` -> `"Board Of Education"`; a letter is upper-cased
/// when it follows a non-letter.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha { out.extend(ch.to_lowercase()) } else { out.extend(ch.to_uppercase()) }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

fn normalize_name(name: &str) -> String {
    clean_ws(&name.to_uppercase())
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> Option<&'h str> {
    caps.name(name).map(|m| m.as_str().trim()).filter(|s| !s.is_empty())
}

/// Parse a contest label. Nothing matched -> every part is `None`.
pub fn parse(contest_name: &str) -> ContestParts {
    let s = normalize_name(contest_name);
    if let Some(c) = LOCAL.captures(&s) {
        return local_parts(&c);
    }
    if let Some(c) = STATEWIDE.captures(&s) {
        return statewide_parts(&c);
    }
    ContestParts::default()
}

fn district_of(raw: Option<&str>) -> Option<String> {
    let d = clean_ws(&raw?.replace('-', " "));
    if d.is_empty() { None } else { Some(title_case(&d)) }
}

fn local_parts(c: &Captures<'_>) -> ContestParts {
    let office_raw = group(c, "office").unwrap_or_default();
    let jurisdiction = group(c, "jurisdiction");
    let jurisdiction_type = if office_raw.starts_with("BOARD OF EDUCATION") {
        JurisdictionType::SchoolSystem
    } else if group(c, "county").is_some() {
        JurisdictionType::County
    } else {
        JurisdictionType::Municipal
    };
    ContestParts {
        jurisdiction: jurisdiction.map(title_case),
        jurisdiction_type: jurisdiction.map(|_| jurisdiction_type),
        office: Some(title_case(&clean_ws(office_raw))),
        district: district_of(group(c, "district")),
    }
}

fn statewide_parts(c: &Captures<'_>) -> ContestParts {
    let office_raw = group(c, "office").unwrap_or_default();
    let captured = group(c, "jurisdiction");

    let (jurisdiction, jurisdiction_type) = match captured {
        Some(j) => (Some(title_case(j)), Some(type_of_named(j, office_raw))),
        None if office_raw.starts_with("US ") => (Some("US".to_string()), Some(JurisdictionType::Federal)),
        None if group(c, "state_prefix").is_some() || office_raw.starts_with("NC ") => (Some("NC".to_string()), Some(JurisdictionType::State)),
        None => (None, None),
    };

    let office = office_raw.strip_prefix("US ").or_else(|| office_raw.strip_prefix("NC ")).unwrap_or(office_raw);
    ContestParts {
        jurisdiction,
        jurisdiction_type,
        office: Some(title_case(&clean_ws(office))),
        district: district_of(group(c, "qualifiers")),
    }
}

fn type_of_named(jurisdiction: &str, office: &str) -> JurisdictionType {
    if jurisdiction.ends_with("SCHOOLS") || office.starts_with("BOARD OF EDUCATION") {
        JurisdictionType::SchoolSystem
    } else if jurisdiction.ends_with("DISTRICT") {
        JurisdictionType::SpecialDistrict
    } else if jurisdiction.ends_with("COUNTY") || COUNTY_OFFICES.contains(&office) {
        JurisdictionType::County
    } else {
        JurisdictionType::State
    }
}

/// `"COUNTY COMMISSIONER (REP)"` -> `Some("REP")`.
pub fn party_from_name(contest_name: &str) -> Option<String> {
    TRAILING_PARTY.captures(contest_name.trim()).map(|c| c[1].trim().to_string()).filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn county_school_board_with_district() {
        let p = parse("WAKE COUNTY BOARD OF EDUCATION DISTRICT 3");
        assert_eq!(p.triple(), (Some("Wake"), Some("Board Of Education"), Some("District 3")));
        assert_eq!(p.jurisdiction_type, Some(JurisdictionType::SchoolSystem));
    }

    #[test]
    fn municipal_council_at_large() {
        let p = parse("CITY OF RALEIGH CITY COUNCIL AT-LARGE");
        assert_eq!(p.triple(), (Some("Raleigh"), Some("City Council"), Some("At Large")));
        assert_eq!(p.jurisdiction_type, Some(JurisdictionType::Municipal));
    }

    #[test]
    fn unmatched_is_all_none() {
        let p = parse("REFERENDUM ON SALES TAX");
        assert_eq!(p.triple(), (None, None, None));
        assert!(!p.is_classified());
    }

    #[test]
    fn wards_and_mayors() {
        assert_eq!(parse("TOWN OF CARY MAYOR").triple(), (Some("Cary"), Some("Mayor"), None));
        assert_eq!(parse("ST. PAULS TOWN COMMISSIONER 2ND WARD").triple(), (Some("St. Pauls"), Some("Commissioner"), Some("2Nd Ward")));
        assert_eq!(parse("  fayetteville city council district 4,").triple(), (Some("Fayetteville"), Some("City Council"), Some("District 4")));
    }

    #[test]
    fn federal_and_state_offices() {
        let p = parse("US SENATE (DEM)");
        assert_eq!(p.triple(), (Some("US"), Some("Senate"), None));
        assert_eq!(p.jurisdiction_type, Some(JurisdictionType::Federal));

        let p = parse("NC HOUSE OF REPRESENTATIVES DISTRICT 035");
        assert_eq!(p.triple(), (Some("NC"), Some("House Of Representatives"), Some("District 035")));
        assert_eq!(p.jurisdiction_type, Some(JurisdictionType::State));

        let p = parse("NC DISTRICT COURT JUDGE DISTRICT 10F SEAT 02");
        assert_eq!(p.triple(), (Some("NC"), Some("District Court Judge"), Some("District 10F Seat 02")));
    }

    #[test]
    fn typed_jurisdictions() {
        let p = parse("BRUNSWICK SOIL AND WATER CONSERVATION DISTRICT SUPERVISOR");
        assert_eq!(p.triple(), (Some("Brunswick Soil And Water Conservation District"), Some("Supervisor"), None));
        assert_eq!(p.jurisdiction_type, Some(JurisdictionType::SpecialDistrict));

        let p = parse("SHERIFF");
        assert_eq!(p.triple(), (None, Some("Sheriff"), None));
        assert_eq!(p.jurisdiction_type, None);
    }

    #[test]
    fn title_case_follows_letters() {
        assert_eq!(title_case("AT LARGE"), "At Large");
        assert_eq!(title_case("o'neal 27B"), "O'Neal 27B");
    }

    #[test]
    fn party_suffix() {
        assert_eq!(party_from_name("COUNTY COMMISSIONER (REP)"), Some("REP".into()));
        assert_eq!(party_from_name("SHERIFF"), None);
    }
}
