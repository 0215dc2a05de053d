//! Canonical per-candidate records shared by the portal scrapers.

use std::collections::HashMap;

use serde::Serialize;

use crate::dom::parse_percent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateResult {
    pub source_state: String,
    pub election_id: Option<u64>,
    pub year: Option<i32>,
    pub office: String,
    pub district: String,
    pub stage: String,
    /// 1-based extraction order within one race; not stable across runs.
    pub candidate_id: u32,
    pub candidate_name: String,
    pub candidate_url: Option<String>,
    pub party: String,
    pub vote_count: Option<u64>,
    pub vote_percentage: String,
    pub is_winner: bool,
    pub is_incumbent: bool,
}

impl CandidateResult {
    pub fn contest_outcome(&self) -> &'static str {
        if self.is_winner { "Winner" } else { "Loser" }
    }
}

/// Fields scraped for one candidate before the race context is attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateDraft {
    pub name: String,
    pub url: Option<String>,
    pub party: String,
    pub votes: Option<u64>,
    pub percentage: String,
    /// An explicit winner marker was present on the page.
    pub winner_marked: bool,
    pub incumbent: bool,
}

/// Race context attached to every candidate of one contest.
#[derive(Debug, Clone, Default)]
pub struct RaceContext {
    pub source_state: String,
    pub election_id: Option<u64>,
    pub year: Option<i32>,
    pub office: String,
    pub district: String,
    pub stage: String,
}

/// Turn the drafts of one race into records: ids follow extraction order and
/// the majority rule fills in winners when the page marks none.
pub fn finish_race(ctx: &RaceContext, drafts: Vec<CandidateDraft>) -> Vec<CandidateResult> {
    let winners = winner_flags(&drafts);
    drafts
        .into_iter()
        .zip(winners)
        .enumerate()
        .map(|(i, (d, is_winner))| CandidateResult {
            source_state: ctx.source_state.clone(),
            election_id: ctx.election_id,
            year: ctx.year,
            office: ctx.office.clone(),
            district: ctx.district.clone(),
            stage: ctx.stage.clone(),
            candidate_id: (i + 1) as u32,
            candidate_name: d.name,
            candidate_url: d.url,
            party: d.party,
            vote_count: d.votes,
            vote_percentage: d.percentage,
            is_winner,
            is_incumbent: d.incumbent,
        })
        .collect()
}

/// Explicit markers win. With no marker anywhere in the race, anyone above
/// 50% is the winner.
pub fn winner_flags(drafts: &[CandidateDraft]) -> Vec<bool> {
    if drafts.iter().any(|d| d.winner_marked) {
        return drafts.iter().map(|d| d.winner_marked).collect();
    }
    drafts
        .iter()
        .map(|d| parse_percent(&d.percentage).is_some_and(|p| p > 50.0))
        .collect()
}

/// One locality's votes for one candidate of one election.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalityVoteRow {
    pub state: String,
    pub year: Option<i32>,
    pub election_id: u64,
    pub county_or_city: String,
    pub candidate_id: u32,
    pub candidate_name: String,
    pub votes: u64,
}

/// A unit (page, archive, election) that produced no data this run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedUnit {
    pub unit: String,
    pub url: String,
    pub kind: &'static str,
    pub reason: String,
}

/// Candidate name -> candidate id for one election. First occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct CandidateIdMap {
    ids: HashMap<String, u32>,
}

impl CandidateIdMap {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut ids = HashMap::new();
        for (name, id) in pairs {
            ids.entry(name.into()).or_insert(id);
        }
        CandidateIdMap { ids }
    }

    /// Ids assigned in header order, 1-based.
    pub fn from_header_order(names: &[String]) -> Self {
        Self::from_pairs(names.iter().enumerate().map(|(i, n)| (n.clone(), (i + 1) as u32)))
    }

    pub fn get(&self, name: &str) -> Option<u32> { self.ids.get(name).copied() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, pct: &str, marked: bool) -> CandidateDraft {
        CandidateDraft { name: name.into(), percentage: pct.into(), winner_marked: marked, ..Default::default() }
    }

    #[test]
    fn majority_fills_in_without_markers() {
        let flags = winner_flags(&[draft("A", "61.5%", false), draft("B", "38.5%", false)]);
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn explicit_marker_overrides_majority() {
        let flags = winner_flags(&[draft("A", "61.5%", false), draft("B", "38.5%", true)]);
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn no_majority_no_winner() {
        let flags = winner_flags(&[draft("A", "50%", false), draft("B", "50%", false)]);
        assert_eq!(flags, vec![false, false]);
    }

    #[test]
    fn ids_follow_extraction_order() {
        let ctx = RaceContext { source_state: "virginia".into(), office: "Governor".into(), ..Default::default() };
        let rows = finish_race(&ctx, vec![draft("A", "", false), draft("B", "", true), draft("C", "", false)]);
        let ids: Vec<u32> = rows.iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(rows[1].contest_outcome(), "Winner");
        assert_eq!(rows[0].contest_outcome(), "Loser");
    }

    #[test]
    fn id_map_first_seen_wins() {
        let m = CandidateIdMap::from_pairs([("Jane", 1u32), ("John", 2), ("Jane", 3)]);
        assert_eq!(m.get("Jane"), Some(1));
        assert_eq!(m.get("Nobody"), None);
    }
}
