use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::ScrapeError;
use crate::record::{CandidateResult, LocalityVoteRow};

/// Locality votes with the statewide candidate columns attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRow {
    pub state: String,
    pub year: Option<i32>,
    pub election_id: u64,
    pub county_or_city: String,
    pub candidate_id: u32,
    pub candidate_name: String,
    pub votes: u64,
    pub office: Option<String>,
    pub district: Option<String>,
    pub stage: Option<String>,
    pub party: Option<String>,
    pub statewide_votes: Option<u64>,
    pub vote_percentage: Option<String>,
    pub is_winner: Option<bool>,
}

/// Many-to-one left join on `(state, election_id, candidate_id)`.
///
/// Duplicate statewide keys keep their first row. A locality row whose
/// election has no statewide rows at all means the detail jobs and the
/// search results disagree, which is fatal.
pub fn join_county_with_state(county: &[LocalityVoteRow], state: &[CandidateResult]) -> Result<Vec<JoinedRow>, ScrapeError> {
    let mut by_key: HashMap<(&str, u64, u32), &CandidateResult> = HashMap::new();
    let mut elections: HashSet<(&str, u64)> = HashSet::new();
    for s in state {
        let Some(eid) = s.election_id else { continue };
        elections.insert((s.source_state.as_str(), eid));
        by_key.entry((s.source_state.as_str(), eid, s.candidate_id)).or_insert(s);
    }

    let mut out = Vec::with_capacity(county.len());
    for c in county {
        if !elections.contains(&(c.state.as_str(), c.election_id)) {
            return Err(ScrapeError::JoinIntegrity(format!(
                "locality rows for {}/{} have no statewide rows",
                c.state, c.election_id
            )));
        }
        let s = by_key.get(&(c.state.as_str(), c.election_id, c.candidate_id)).copied();
        out.push(JoinedRow {
            state: c.state.clone(),
            year: c.year,
            election_id: c.election_id,
            county_or_city: c.county_or_city.clone(),
            candidate_id: c.candidate_id,
            candidate_name: c.candidate_name.clone(),
            votes: c.votes,
            office: s.map(|s| s.office.clone()),
            district: s.map(|s| s.district.clone()),
            stage: s.map(|s| s.stage.clone()),
            party: s.map(|s| s.party.clone()),
            statewide_votes: s.and_then(|s| s.vote_count),
            vote_percentage: s.map(|s| s.vote_percentage.clone()),
            is_winner: s.map(|s| s.is_winner),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CandidateDraft, RaceContext, finish_race};

    fn state_rows() -> Vec<CandidateResult> {
        let ctx = RaceContext { source_state: "virginia".into(), election_id: Some(10), year: Some(2021), office: "Governor".into(), ..Default::default() };
        let drafts = vec![
            CandidateDraft { name: "Jane Doe".into(), votes: Some(60), percentage: "60%".into(), ..Default::default() },
            CandidateDraft { name: "John Smith".into(), votes: Some(40), percentage: "40%".into(), ..Default::default() },
        ];
        finish_race(&ctx, drafts)
    }

    fn county(election_id: u64, candidate_id: u32) -> LocalityVoteRow {
        LocalityVoteRow {
            state: "virginia".into(),
            year: Some(2021),
            election_id,
            county_or_city: "Accomack County".into(),
            candidate_id,
            candidate_name: "x".into(),
            votes: 5,
        }
    }

    #[test]
    fn attaches_statewide_columns() {
        let joined = join_county_with_state(&[county(10, 1), county(10, 2), county(10, 9)], &state_rows()).unwrap();
        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].office.as_deref(), Some("Governor"));
        assert_eq!(joined[0].is_winner, Some(true));
        assert_eq!(joined[1].statewide_votes, Some(40));
        // unmatched candidate keeps the locality row
        assert_eq!(joined[2].office, None);
    }

    #[test]
    fn orphan_election_is_fatal() {
        let err = join_county_with_state(&[county(11, 1)], &state_rows()).unwrap_err();
        assert!(matches!(err, ScrapeError::JoinIntegrity(_)));
    }
}
