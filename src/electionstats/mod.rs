//! ElectionStats state portals: statewide search results, per-locality
//! detail pages, and the join of the two.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use crate::fetch::{self, FetchConfig, PageFetcher, RenderingFetcher};
use crate::output::{self, write_table};
use crate::record::{CandidateIdMap, CandidateResult, SkippedUnit};
use crate::registry::{FetchMethod, Generation, Registry, SourceConfig};
use crate::telemetry::{self};
use crate::telemetry::ops::stats::Phase as StatsPhase;

pub mod client;
pub mod county;
pub mod join;
pub mod search;
pub mod v2;
mod types;

use county::{CountyJob, CountyMarkup, build_county_votes};

#[derive(Args)]
pub struct StatsCmd {
    /// Source key, e.g. `virginia` or "South Carolina"; see `ballot sources`
    #[arg(long)] pub state: String,
    #[arg(long)] pub start: i32,
    /// Defaults to --start
    #[arg(long)] pub end: Option<i32>,
    /// Seconds between requests
    #[arg(long)] pub sleep: Option<f64>,
    #[arg(long)] pub workers: Option<usize>,
    #[arg(long)] pub out_dir: Option<PathBuf>,
    #[arg(long, default_value_t=client::MAX_PAGES)] pub max_pages: u32,
    /// Statewide results only; skip the locality detail pages
    #[arg(long, default_value_t=false)] pub no_county: bool,
    #[arg(long, default_value_t=false)] pub apply: bool,
    #[arg(long, default_value_t=10)] pub plan_limit: usize,
}

pub async fn run(registry: &Registry, args: StatsCmd) -> Result<()> {
    let log = telemetry::stats();
    let _g = log.root_span_kv([
        ("state", args.state.clone()),
        ("start", args.start.to_string()),
        ("end", format!("{:?}", args.end)),
        ("apply", args.apply.to_string()),
        ("max_pages", args.max_pages.to_string()),
    ]).entered();

    let (key, src) = registry.lookup(&args.state)?;
    let end = args.end.unwrap_or(args.start);
    if end < args.start { bail!("--end {} is before --start {}", end, args.start); }
    let years: Vec<i32> = (args.start..=end).collect();

    if !args.apply {
        let urls: Vec<String> = years.iter().take(args.plan_limit).map(|y| client::search_url(src, *y, *y, 1)).collect();
        if telemetry::config::json_mode() {
            let plan = types::StatsPlan {
                state: key.to_string(),
                generation: src.generation,
                fetch_method: src.fetch_method,
                years: years.clone(),
                max_pages: args.max_pages,
                county_details: !args.no_county,
                sample_search_urls: urls,
            };
            log.plan(&plan)?;
        } else {
            log.info(format!("📝 Stats plan — state={} years={}..={} generation={:?} fetch={:?} county={}", key, args.start, end, src.generation, src.fetch_method, !args.no_county));
            for u in &urls { log.info(format!("  {}", u)); }
            if years.len() > args.plan_limit { log.info(format!("  ... ({} more)", years.len() - args.plan_limit)); }
            log.info("   Use --apply to execute.");
        }
        return Ok(());
    }

    let cfg = FetchConfig::from_env().with_overrides(args.sleep, args.workers);
    match src.fetch_method {
        FetchMethod::Plain => {
            let fetcher = fetch::plain_with_fallback(&cfg)?;
            scrape(&fetcher, key, src, &years, &cfg, &args).await
        }
        FetchMethod::Rendering => {
            let Some(renderer) = RenderingFetcher::new(&cfg)? else {
                bail!("{} needs a rendering service; set BALLOT_RENDER_URL", key);
            };
            scrape(&renderer.wait_for("table"), key, src, &years, &cfg, &args).await
        }
    }
}

async fn scrape<F: PageFetcher>(fetcher: &F, key: &str, src: &SourceConfig, years: &[i32], cfg: &FetchConfig, args: &StatsCmd) -> Result<()> {
    let log = telemetry::stats();
    let mut state_rows: Vec<CandidateResult> = Vec::new();
    let mut skipped: Vec<SkippedUnit> = Vec::new();
    let mut per_year = Vec::new();

    {
        let _s = log.span(&StatsPhase::Search).entered();
        for (i, year) in years.iter().enumerate() {
            let _p = log.span_kv(&StatsPhase::SearchPage, [("year", year.to_string())]).entered();
            // A failing first year points at a bad source entry; later years are per-unit.
            let outcome = match client::scrape_search(fetcher, key, src, *year, *year, args.max_pages).await {
                Ok(o) => o,
                Err(e) if i == 0 => return Err(e).with_context(|| format!("search results for {key} {year}")),
                Err(e) => {
                    let s = SkippedUnit {
                        unit: format!("{key}/{year}"),
                        url: client::search_url(src, *year, *year, 1),
                        kind: e.kind(),
                        reason: e.to_string(),
                    };
                    log.skipped(&s);
                    skipped.push(s);
                    continue;
                }
            };
            if let Some(s) = outcome.stopped {
                log.skipped(&s);
                skipped.push(s);
            }
            log.info_kv(&format!("✅ {} {} — pages={} rows={}", key, year, outcome.pages, outcome.rows.len()),
                [("year", year.to_string()), ("pages", outcome.pages.to_string()), ("rows", outcome.rows.len().to_string())]);
            per_year.push(types::YearSummary { year: *year, pages: outcome.pages, rows: outcome.rows.len() });
            state_rows.extend(outcome.rows);
        }
    }

    let jobs = county_jobs(src, &state_rows);
    let elections = jobs.len();
    let mut details_fetched = 0usize;
    let mut county_rows = Vec::new();
    if !args.no_county {
        let _s = log.span_kv(&StatsPhase::Detail, [("elections", elections.to_string()), ("workers", cfg.max_workers.to_string())]).entered();
        let markup = match src.generation {
            Generation::Classic => CountyMarkup::Classic,
            Generation::V2 => CountyMarkup::V2,
        };
        let outcome = build_county_votes(fetcher, key, markup, jobs, cfg.max_workers).await;
        for s in &outcome.skipped { log.skipped(s); }
        details_fetched = outcome.fetched;
        county_rows = outcome.rows;
        skipped.extend(outcome.skipped);
    }

    let joined = {
        let _s = log.span(&StatsPhase::Join).entered();
        join::join_county_with_state(&county_rows, &state_rows)?
    };

    let dir = output::out_dir(args.out_dir.clone());
    let (from, to) = (years.first().copied().unwrap_or_default(), years.last().copied().unwrap_or_default());
    let mut tables = Vec::new();
    {
        let _s = log.span_kv(&StatsPhase::Write, [("dir", dir.display().to_string())]).entered();
        tables.push(write_table(&dir, &format!("{key}_state_{from}_{to}"), &state_rows)?);
        if !args.no_county {
            tables.push(write_table(&dir, &format!("{key}_county_{from}_{to}"), &county_rows)?);
            tables.push(write_table(&dir, &format!("{key}_joined_{from}_{to}"), &joined)?);
        }
        for t in &tables { log.wrote(t); }
    }

    log.totals(state_rows.len(), county_rows.len(), joined.len(), skipped.len());

    if telemetry::config::json_mode() {
        let result = types::StatsApply {
            state: key.to_string(),
            totals: types::StatsTotals {
                state_rows: state_rows.len(),
                elections,
                details_fetched,
                county_rows: county_rows.len(),
                joined_rows: joined.len(),
                skipped: skipped.len(),
            },
            per_year,
            skipped,
            tables,
        };
        log.result(&result)?;
    }
    Ok(())
}

/// One detail job per distinct election, with the candidate-id map taken
/// from that election's statewide rows.
pub fn county_jobs(src: &SourceConfig, state_rows: &[CandidateResult]) -> Vec<CountyJob> {
    let mut by_election: BTreeMap<u64, (Option<i32>, Vec<(String, u32)>)> = BTreeMap::new();
    for r in state_rows {
        let Some(eid) = r.election_id else { continue };
        let entry = by_election.entry(eid).or_insert_with(|| (r.year, Vec::new()));
        entry.1.push((r.candidate_name.clone(), r.candidate_id));
    }
    by_election
        .into_iter()
        .map(|(election_id, (year, pairs))| CountyJob {
            election_id,
            year,
            url: client::detail_url(src, election_id),
            id_map: Some(CandidateIdMap::from_pairs(pairs)),
        })
        .collect()
}
