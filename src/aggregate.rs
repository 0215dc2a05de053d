//! Contest / county / state rollups with vote share and outcome labels.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Contest,
    County,
    State,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteBreakdown {
    pub election_day: Option<u64>,
    pub early_voting: Option<u64>,
    pub absentee_by_mail: Option<u64>,
    pub provisional: Option<u64>,
}

impl VoteBreakdown {
    fn add(&mut self, other: &VoteBreakdown) {
        fn sum(a: &mut Option<u64>, b: Option<u64>) {
            if let Some(b) = b { *a = Some(a.unwrap_or(0) + b); }
        }
        sum(&mut self.election_day, other.election_day);
        sum(&mut self.early_voting, other.early_voting);
        sum(&mut self.absentee_by_mail, other.absentee_by_mail);
        sum(&mut self.provisional, other.provisional);
    }
}

/// One choice's tally from one reporting unit (precinct, locality, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TallyRecord {
    pub election_date: Option<NaiveDate>,
    pub contest_group_id: Option<String>,
    pub contest_name: String,
    pub district: Option<String>,
    pub county: Option<String>,
    pub choice: String,
    pub party: Option<String>,
    pub vote_for: Option<u32>,
    pub votes: Option<u64>,
    pub breakdown: VoteBreakdown,
    pub winner_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Winner,
    Loser,
    #[serde(rename = "Tied Winner")]
    TiedWinner,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Winner => "Winner",
            Outcome::Loser => "Loser",
            Outcome::TiedWinner => "Tied Winner",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    pub election_date: Option<NaiveDate>,
    pub contest_group_id: Option<String>,
    pub contest_name: String,
    pub district: Option<String>,
    pub county: Option<String>,
    pub choice: String,
    pub party: Option<String>,
    pub vote_for: Option<u32>,
    pub votes: u64,
    pub breakdown: VoteBreakdown,
    pub contest_total_votes: u64,
    /// Percent of the contest total; `None` when the total is zero.
    pub vote_share: Option<f64>,
    /// `None` when the contest has no votes at all, or when it elects more
    /// than one seat and carries no explicit winner status.
    pub contest_outcome: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    election_date: Option<NaiveDate>,
    contest_group_id: Option<String>,
    contest_name: String,
    district: Option<String>,
    county: Option<String>,
}

impl GroupKey {
    fn of(r: &TallyRecord, level: Level) -> Self {
        GroupKey {
            election_date: r.election_date,
            contest_group_id: r.contest_group_id.clone(),
            contest_name: r.contest_name.clone(),
            district: r.district.clone(),
            county: match level {
                Level::County => r.county.clone(),
                _ => None,
            },
        }
    }
}

#[derive(Default)]
struct ChoiceAcc {
    votes: u64,
    breakdown: VoteBreakdown,
    vote_for: Option<u32>,
    winner_status: Option<String>,
}

/// Roll tallies up to `level`. Recomputed from scratch on every call; the
/// output is ordered by contest key then choice.
///
/// Grouping: contest = date + contest group + name + district; county adds
/// the county; state keeps the contest key and collapses counties. Same-named
/// local contests stay apart through their contest group.
pub fn aggregate(records: &[TallyRecord], level: Level) -> Vec<Rollup> {
    let mut groups: BTreeMap<GroupKey, BTreeMap<(String, Option<String>), ChoiceAcc>> = BTreeMap::new();
    for r in records {
        let choices = groups.entry(GroupKey::of(r, level)).or_default();
        let acc = choices.entry((r.choice.trim().to_string(), r.party.clone())).or_default();
        acc.votes += r.votes.unwrap_or(0);
        acc.breakdown.add(&r.breakdown);
        acc.vote_for = acc.vote_for.max(r.vote_for);
        if acc.winner_status.is_none() {
            acc.winner_status = r.winner_status.clone().filter(|s| !s.trim().is_empty());
        }
    }

    let mut out = Vec::new();
    for (key, choices) in groups {
        let total: u64 = choices.values().map(|c| c.votes).sum();
        let single_seat = choices.values().any(|c| c.vote_for == Some(1));
        let explicit = choices.values().any(|c| c.winner_status.is_some());
        let votes: Vec<u64> = choices.values().map(|c| c.votes).collect();

        for ((choice, party), acc) in choices {
            let contest_outcome = if total == 0 {
                None
            } else if explicit {
                Some(if acc.winner_status.as_deref().is_some_and(is_truthy_status) { Outcome::Winner } else { Outcome::Loser })
            } else if single_seat {
                Some(outcome_by_votes(acc.votes, &votes))
            } else {
                None
            };
            out.push(Rollup {
                election_date: key.election_date,
                contest_group_id: key.contest_group_id.clone(),
                contest_name: key.contest_name.clone(),
                district: key.district.clone(),
                county: key.county.clone(),
                choice,
                party,
                vote_for: acc.vote_for,
                votes: acc.votes,
                breakdown: acc.breakdown,
                contest_total_votes: total,
                vote_share: if total == 0 { None } else { Some(acc.votes as f64 / total as f64 * 100.0) },
                contest_outcome,
            });
        }
    }
    out
}

/// Single-seat contests only: the top vote-getter wins, and a shared
/// maximum makes every leader a tied winner.
fn outcome_by_votes(votes: u64, all: &[u64]) -> Outcome {
    let max = all.iter().copied().max().unwrap_or(0);
    if votes < max {
        Outcome::Loser
    } else if all.iter().filter(|v| **v == max).count() > 1 {
        Outcome::TiedWinner
    } else {
        Outcome::Winner
    }
}

/// Anything non-empty that isn't an explicit negative counts as a win.
pub fn is_truthy_status(s: &str) -> bool {
    let s = s.trim().to_ascii_lowercase();
    !matches!(s.as_str(), "" | "0" | "n" | "no" | "false")
}
