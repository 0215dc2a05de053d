//! Ballotpedia school board elections and site search.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::Args;

use crate::error::ScrapeError;
use crate::fetch::{self, FetchConfig, FetchError, PageFetcher};
use crate::output::{self, write_table};
use crate::record::SkippedUnit;
use crate::telemetry::{self};
use crate::telemetry::ops::bp_search::Phase as SearchPhase;
use crate::telemetry::ops::schoolboard::Phase as BoardPhase;

pub mod cell;
pub mod district_page;
pub mod search;
pub mod types;
pub mod year_page;

use types::{CandidateRow, DistrictElectionRow, JoinedRow};

pub const BASE_URL: &str = "https://ballotpedia.org";
/// First year with a school board elections page.
pub const FIRST_YEAR: i32 = 2013;

#[derive(Args)]
pub struct SchoolBoardCmd {
    /// State name as captioned on Ballotpedia, e.g. "New Hampshire"
    #[arg(long)] pub state: String,
    #[arg(long)] pub start: i32,
    /// Defaults to --start
    #[arg(long)] pub end: Option<i32>,
    /// Seconds between requests
    #[arg(long, default_value_t=1.0)] pub sleep: f64,
    #[arg(long)] pub out_dir: Option<PathBuf>,
    /// District metadata only; don't follow district pages
    #[arg(long, default_value_t=false)] pub districts_only: bool,
    #[arg(long, default_value_t=false)] pub apply: bool,
    #[arg(long, default_value_t=10)] pub plan_limit: usize,
}

#[derive(Args)]
pub struct BpSearchCmd {
    #[arg(long)] pub query: String,
    #[arg(long, default_value_t=search::DEFAULT_LIMIT)] pub limit: u32,
    #[arg(long, default_value_t=search::DEFAULT_MAX_PAGES)] pub max_pages: u32,
    #[arg(long, default_value_t=1.0)] pub sleep: f64,
    /// Also write the hits to `{out-dir}/bp_search_{slug}.csv`
    #[arg(long)] pub out_dir: Option<PathBuf>,
    #[arg(long, default_value_t=false)] pub apply: bool,
}

/// `--start/--end` clamped to the years Ballotpedia covers. `None` when
/// nothing is left after clamping.
pub fn year_range(start: i32, end: Option<i32>, current_year: i32) -> Result<Option<(i32, i32)>, ScrapeError> {
    let end = end.unwrap_or(start);
    if end < start {
        return Err(ScrapeError::Config(format!("--end {end} is before --start {start}")));
    }
    let (s, e) = (start.max(FIRST_YEAR), end.min(current_year));
    Ok(if s > e { None } else { Some((s, e)) })
}

pub fn state_slug(state: &str) -> String {
    state.trim().to_lowercase().replace(' ', "_")
}

pub async fn run_schoolboard(args: SchoolBoardCmd) -> Result<()> {
    let log = telemetry::schoolboard();
    let _g = log.root_span_kv([
        ("state", args.state.clone()),
        ("start", args.start.to_string()),
        ("end", format!("{:?}", args.end)),
        ("apply", args.apply.to_string()),
        ("districts_only", args.districts_only.to_string()),
    ]).entered();

    let current_year = chrono::Local::now().year();
    let Some((start, end)) = year_range(args.start, args.end, current_year)? else {
        log.info(format!("No Ballotpedia years in range (pages exist for {}..={})", FIRST_YEAR, current_year));
        return Ok(());
    };
    if start != args.start || Some(end) != args.end.or(Some(args.start)) {
        log.info(format!("Year range clamped to {}..={}", start, end));
    }
    let years: Vec<i32> = (start..=end).collect();

    if !args.apply {
        let urls: Vec<String> = years.iter().take(args.plan_limit).map(|y| year_page::year_url(*y)).collect();
        if telemetry::config::json_mode() {
            let plan = types::SchoolBoardPlan { state: args.state.clone(), start, end, district_pages: !args.districts_only, year_urls: urls };
            log.plan(&plan)?;
        } else {
            log.info(format!("📝 School board plan — state={} years={}..={} district_pages={}", args.state, start, end, !args.districts_only));
            for u in &urls { log.info(format!("  {}", u)); }
            if years.len() > args.plan_limit { log.info(format!("  ... ({} more)", years.len() - args.plan_limit)); }
            log.info("   Use --apply to execute.");
        }
        return Ok(());
    }

    let cfg = FetchConfig::from_env().with_overrides(Some(args.sleep), None);
    let fetcher = fetch::plain_with_fallback(&cfg)?;
    let target = args.state.trim().to_lowercase();

    let mut districts: Vec<DistrictElectionRow> = Vec::new();
    let mut candidates: Vec<CandidateRow> = Vec::new();
    let mut skipped: Vec<SkippedUnit> = Vec::new();
    let mut per_year = Vec::new();

    for year in &years {
        let url = year_page::year_url(*year);
        let rows = {
            let _s = log.span_kv(&BoardPhase::YearPage, [("year", year.to_string()), ("url", url.clone())]).entered();
            match fetch_page(&fetcher, &url).await {
                Ok(Some(html)) => year_page::parse_year_page(&html, *year)?
                    .into_iter()
                    .filter(|r| r.state.to_lowercase() == target)
                    .collect::<Vec<_>>(),
                Ok(None) => {
                    log.info_kv(&format!("{} — no page", year), [("year", year.to_string()), ("url", url.clone())]);
                    Vec::new()
                }
                Err(e) => {
                    let s = skip(format!("{year}"), url, &e);
                    log.skipped(&s);
                    skipped.push(s);
                    Vec::new()
                }
            }
        };

        let before = candidates.len();
        let year_skips = skipped.len();
        if !args.districts_only {
            for d in rows.iter().filter(|d| !d.district_url.is_empty()) {
                let _s = log.span_kv(&BoardPhase::DistrictPage, [("district", d.district.clone()), ("url", d.district_url.clone())]).entered();
                match fetch_page(&fetcher, &d.district_url).await {
                    Ok(Some(html)) => {
                        let found = district_page::parse_district_page(&html)?;
                        candidates.extend(found.into_iter().map(|c| CandidateRow::new(d, c)));
                    }
                    Ok(None) => log.debug(format!("no district page: {}", d.district_url)),
                    Err(e) => {
                        let s = skip(format!("{year}/{}", d.district), d.district_url.clone(), &e);
                        log.skipped(&s);
                        skipped.push(s);
                    }
                }
            }
        }
        log.year_summary(*year, rows.len(), candidates.len() - before, skipped.len() - year_skips);
        per_year.push(types::YearSummary { year: *year, districts: rows.len(), candidates: candidates.len() - before });
        districts.extend(rows);
    }

    let joined = {
        let _s = log.span(&BoardPhase::Join).entered();
        join_districts(&districts, &candidates)
    };

    let dir = output::out_dir(args.out_dir.clone());
    let prefix = format!("{}_{}_{}", state_slug(&args.state), start, end);
    let mut tables = Vec::new();
    {
        let _s = log.span_kv(&BoardPhase::Write, [("dir", dir.display().to_string())]).entered();
        tables.push(write_table(&dir, &format!("{prefix}_districts"), &districts).context("writing districts")?);
        if !args.districts_only {
            tables.push(write_table(&dir, &format!("{prefix}_candidates"), &candidates).context("writing candidates")?);
            tables.push(write_table(&dir, &format!("{prefix}_joined"), &joined).context("writing joined table")?);
        }
        for t in &tables { log.wrote(t); }
    }

    log.totals(districts.len(), candidates.len(), joined.len(), skipped.len());

    if telemetry::config::json_mode() {
        let result = types::SchoolBoardApply { state: args.state.clone(), per_year, skipped, tables };
        log.result(&result)?;
    }
    Ok(())
}

pub async fn run_search(args: BpSearchCmd) -> Result<()> {
    let log = telemetry::bp_search();
    let _g = log.root_span_kv([
        ("query", args.query.clone()),
        ("limit", args.limit.to_string()),
        ("max_pages", args.max_pages.to_string()),
        ("apply", args.apply.to_string()),
    ]).entered();

    if args.query.trim().is_empty() { bail!("--query must not be empty"); }
    let first_url = search::search_url(&args.query, args.limit, 0)?;

    if !args.apply {
        if telemetry::config::json_mode() {
            let plan = types::SearchPlan { query: args.query.clone(), limit: args.limit, max_pages: args.max_pages, first_url };
            log.plan(&plan)?;
        } else {
            log.info(format!("📝 Search plan — query={:?} limit={} max_pages={}", args.query, args.limit, args.max_pages));
            log.info(format!("  {}", first_url));
            log.info("   Use --apply to execute.");
        }
        return Ok(());
    }

    let cfg = FetchConfig::from_env().with_overrides(Some(args.sleep), None);
    let fetcher = fetch::plain_with_fallback(&cfg)?;
    let (hits, pages) = {
        let _s = log.span(&SearchPhase::Page).entered();
        search::search_all(&fetcher, &args.query, args.limit, args.max_pages).await?
    };
    for h in &hits {
        log.info_kv(&format!("🔎 {} — {}", h.title, h.url), [("title", h.title.clone()), ("url", h.url.clone())]);
    }

    let table = match &args.out_dir {
        Some(dir) => {
            let _s = log.span(&SearchPhase::Write).entered();
            let t = write_table(dir, &format!("bp_search_{}", state_slug(&args.query)), &hits)?;
            log.wrote(&t);
            Some(t)
        }
        None => None,
    };
    log.totals(pages as usize, hits.len());

    if telemetry::config::json_mode() {
        let result = types::SearchApply { query: args.query.clone(), pages, hits, table };
        log.result(&result)?;
    }
    Ok(())
}

/// 404 is "no page yet" (`Ok(None)`); everything else that fails is an error
/// for the caller to skip.
async fn fetch_page<F: PageFetcher>(fetcher: &F, url: &str) -> Result<Option<String>, FetchError> {
    match fetcher.fetch(url).await {
        Ok(html) => Ok(Some(html)),
        Err(FetchError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn skip(unit: String, url: String, e: &FetchError) -> SkippedUnit {
    SkippedUnit { unit, url, kind: e.kind(), reason: e.to_string() }
}

/// Left join on `(year, state, district, district_url)`: every district
/// appears at least once, fanned out per candidate when it has any.
pub fn join_districts(districts: &[DistrictElectionRow], candidates: &[CandidateRow]) -> Vec<JoinedRow> {
    let mut by_key: HashMap<(i32, &str, &str, &str), Vec<&CandidateRow>> = HashMap::new();
    for c in candidates {
        by_key.entry((c.year, c.state.as_str(), c.district.as_str(), c.district_url.as_str())).or_default().push(c);
    }

    let mut out = Vec::new();
    for d in districts {
        let base = |c: Option<&CandidateRow>| JoinedRow {
            year: d.year,
            state: d.state.clone(),
            district: d.district.clone(),
            district_url: d.district_url.clone(),
            primary: d.primary.clone(),
            primary_runoff: d.primary_runoff.clone(),
            general_election: d.general_election.clone(),
            general_runoff: d.general_runoff.clone(),
            term_length: d.term_length.clone(),
            seats_up: d.seats_up.clone(),
            total_board_seats: d.total_board_seats.clone(),
            enrollment: d.enrollment.clone(),
            race: c.map(|c| c.race.clone()),
            election_type: c.map(|c| c.election_type.clone()),
            candidate: c.map(|c| c.candidate.clone()),
            candidate_url: c.map(|c| c.candidate_url.clone()),
            party: c.map(|c| c.party.clone()),
            is_winner: c.map(|c| c.is_winner),
            is_incumbent: c.map(|c| c.is_incumbent),
            pct: c.map(|c| c.pct.clone()),
            votes: c.map(|c| c.votes.clone()),
        };
        match by_key.get(&(d.year, d.state.as_str(), d.district.as_str(), d.district_url.as_str())) {
            Some(cs) => out.extend(cs.iter().map(|c| base(Some(*c)))),
            None => out.push(base(None)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::FieldValue;
    use types::RaceCandidate;

    fn district(name: &str) -> DistrictElectionRow {
        DistrictElectionRow {
            year: 2024,
            state: "Alabama".into(),
            district: name.into(),
            district_url: format!("https://ballotpedia.org/{name}"),
            primary: FieldValue::Value("3/5/2024".into()),
            primary_runoff: FieldValue::Empty,
            general_election: FieldValue::Value("11/5/2024".into()),
            general_runoff: FieldValue::Absent,
            term_length: FieldValue::Absent,
            seats_up: FieldValue::Value("2".into()),
            total_board_seats: FieldValue::Absent,
            enrollment: FieldValue::Absent,
        }
    }

    #[test]
    fn years_are_clamped() {
        assert_eq!(year_range(2010, Some(2015), 2026).unwrap(), Some((2013, 2015)));
        assert_eq!(year_range(2024, None, 2026).unwrap(), Some((2024, 2024)));
        assert_eq!(year_range(2025, Some(2030), 2026).unwrap(), Some((2025, 2026)));
        assert_eq!(year_range(2005, Some(2010), 2026).unwrap(), None);
        assert!(matches!(year_range(2024, Some(2020), 2026), Err(ScrapeError::Config(_))));
    }

    #[test]
    fn join_keeps_districts_without_candidates() {
        let a = district("A");
        let b = district("B");
        let cands = vec![
            CandidateRow::new(&a, RaceCandidate { candidate: "Jane".into(), is_winner: true, ..Default::default() }),
            CandidateRow::new(&a, RaceCandidate { candidate: "John".into(), ..Default::default() }),
        ];
        let joined = join_districts(&[a, b], &cands);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].candidate.as_deref(), Some("Jane"));
        assert_eq!(joined[0].is_winner, Some(true));
        assert_eq!(joined[1].candidate.as_deref(), Some("John"));
        assert_eq!(joined[2].district, "B");
        assert_eq!(joined[2].candidate, None);
        assert_eq!(joined[2].primary_runoff, FieldValue::Empty);
    }

    #[test]
    fn slug() {
        assert_eq!(state_slug(" New Hampshire "), "new_hampshire");
    }
}
