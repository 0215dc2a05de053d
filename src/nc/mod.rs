//! North Carolina precinct results: discover the per-election ZIP archives,
//! normalize each era's file layout, and roll precincts up to county and
//! state totals.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::aggregate::{Level, aggregate};
use crate::error::ScrapeError;
use crate::fetch::{self, FetchConfig, PageFetcher};
use crate::output::{self, write_table};
use crate::record::SkippedUnit;
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::nc::{Nc, Phase};
use crate::telemetry::{self};
use crate::util::time::parse_iso_opt;

pub mod archive;
pub mod contest;
pub mod discovery;
pub mod election_type;
pub mod layout;
pub mod normalize;
pub mod selection;
mod types;

use discovery::{ElectionArchive, INDEX_URL};
use election_type::ElectionTypeRules;
use normalize::ContestCache;
use selection::Selection;
use types::{ElectionSummary, PrecinctRow, RollupRow};

#[derive(Args)]
pub struct NcCmd {
    /// Single election, YYYY-MM-DD; overrides --start/--end
    #[arg(long)] pub date: Option<String>,
    /// YYYY-MM-DD; defaults to the earliest archive
    #[arg(long)] pub start: Option<String>,
    /// YYYY-MM-DD; defaults to the latest archive
    #[arg(long)] pub end: Option<String>,
    /// Dates to label as Special elections (repeatable)
    #[arg(long = "special-date")] pub special_dates: Vec<String>,
    /// Seconds between requests
    #[arg(long)] pub sleep: Option<f64>,
    #[arg(long)] pub out_dir: Option<PathBuf>,
    #[arg(long, default_value_t=false)] pub apply: bool,
    #[arg(long, default_value_t=10)] pub plan_limit: usize,
}

/// Everything one archive produced.
pub struct ElectionOutput {
    pub summary: ElectionSummary,
    pub precinct: Vec<PrecinctRow>,
    pub county: Vec<RollupRow>,
    pub state: Vec<RollupRow>,
}

#[derive(Default)]
pub struct NcOutcome {
    pub elections: Vec<ElectionSummary>,
    pub precinct: Vec<PrecinctRow>,
    pub county: Vec<RollupRow>,
    pub state: Vec<RollupRow>,
    pub skipped: Vec<SkippedUnit>,
}

pub async fn run(args: NcCmd) -> Result<()> {
    let log = telemetry::nc();
    let _g = log.root_span_kv([
        ("date", format!("{:?}", args.date)),
        ("start", format!("{:?}", args.start)),
        ("end", format!("{:?}", args.end)),
        ("apply", args.apply.to_string()),
    ]).entered();

    let sel = Selection::from_flags(
        parse_iso_opt("--date", &args.date)?,
        parse_iso_opt("--start", &args.start)?,
        parse_iso_opt("--end", &args.end)?,
    );
    let mut specials = Vec::with_capacity(args.special_dates.len());
    for s in &args.special_dates {
        specials.extend(parse_iso_opt("--special-date", &Some(s.clone()))?);
    }
    let rules = ElectionTypeRules::default().with_special_dates(specials);

    let cfg = FetchConfig::from_env().with_overrides(args.sleep, None);
    let fetcher = fetch::plain_with_fallback(&cfg)?;

    let (discovered, elections) = {
        let _s = log.span_kv(&Phase::Discover, [("url", INDEX_URL.to_string())]).entered();
        let html = fetcher.fetch(INDEX_URL).await.context("NC results index")?;
        let all = discovery::parse_index(&html)?;
        let picked = selection::select(&all, sel)?;
        (all.len(), picked)
    };

    if !args.apply {
        if telemetry::config::json_mode() {
            let plan = types::NcPlan {
                index_url: INDEX_URL.to_string(),
                discovered,
                selected: elections.len(),
                elections: elections.iter().take(args.plan_limit).cloned().collect(),
            };
            log.plan(&plan)?;
        } else {
            log.info(format!("📝 NC plan — discovered={} selected={}", discovered, elections.len()));
            for e in elections.iter().take(args.plan_limit) { log.info(format!("  {} {}", e.election_date, e.zip_url)); }
            if elections.len() > args.plan_limit { log.info(format!("  ... ({} more)", elections.len() - args.plan_limit)); }
            log.info("   Use --apply to execute.");
        }
        return Ok(());
    }

    let (Some(first), Some(last)) = (elections.first(), elections.last()) else {
        log.info(format!("No NC elections selected ({} discovered)", discovered));
        return Ok(());
    };
    let stem = format!("nc_{}_{}", first.election_date.format("%Y%m%d"), last.election_date.format("%Y%m%d"));

    let outcome = scrape_elections(&fetcher, &elections, &rules, &log).await;

    let dir = output::out_dir(args.out_dir.clone());
    let mut tables = Vec::new();
    {
        let _s = log.span_kv(&Phase::Write, [("dir", dir.display().to_string())]).entered();
        tables.push(write_table(&dir, &format!("{stem}_precinct"), &outcome.precinct).context("writing precinct table")?);
        tables.push(write_table(&dir, &format!("{stem}_county"), &outcome.county).context("writing county table")?);
        tables.push(write_table(&dir, &format!("{stem}_state"), &outcome.state).context("writing state table")?);
        for t in &tables { log.wrote(t); }
    }

    log.totals(outcome.elections.len(), outcome.skipped.len(), outcome.precinct.len(), outcome.county.len(), outcome.state.len());

    if telemetry::config::json_mode() {
        let result = types::NcApply {
            totals: types::NcTotals {
                elections: outcome.elections.len(),
                skipped: outcome.skipped.len(),
                precinct_rows: outcome.precinct.len(),
                county_rows: outcome.county.len(),
                state_rows: outcome.state.len(),
            },
            elections: outcome.elections,
            skipped: outcome.skipped,
            tables,
        };
        log.result(&result)?;
    }
    Ok(())
}

/// Process each archive in turn. A failing archive is logged and skipped;
/// the others still contribute rows.
pub async fn scrape_elections<F: PageFetcher>(
    fetcher: &F,
    elections: &[ElectionArchive],
    rules: &ElectionTypeRules,
    log: &LogCtx<Nc>,
) -> NcOutcome {
    let mut out = NcOutcome::default();
    for e in elections {
        let _s = log.span_kv(&Phase::Election, [("date", e.election_date.to_string()), ("url", e.zip_url.clone())]).entered();
        match scrape_one(fetcher, e, rules, log).await {
            Ok(one) => {
                out.elections.push(one.summary);
                out.precinct.extend(one.precinct);
                out.county.extend(one.county);
                out.state.extend(one.state);
            }
            Err(err) => {
                let s = SkippedUnit {
                    unit: format!("nc {}", e.election_date),
                    url: e.zip_url.clone(),
                    kind: err.kind(),
                    reason: err.to_string(),
                };
                log.skipped(&s);
                out.skipped.push(s);
            }
        }
    }
    out
}

async fn scrape_one<F: PageFetcher>(
    fetcher: &F,
    e: &ElectionArchive,
    rules: &ElectionTypeRules,
    log: &LogCtx<Nc>,
) -> Result<ElectionOutput, ScrapeError> {
    let bytes = {
        let _s = log.span(&Phase::Download).entered();
        fetcher.fetch_bytes(&e.zip_url).await?
    };
    log.debug(format!("downloaded {} bytes from {}", bytes.len(), e.zip_url));

    let (member, raw) = {
        let _s = log.span(&Phase::Read).entered();
        archive::read_results(&bytes)?
    };

    let mut contests = ContestCache::default();
    let norm = {
        let _s = log.span_kv(&Phase::Normalize, [("member", member.clone())]).entered();
        normalize::normalize(raw, e.election_date, &e.zip_url, rules, &mut contests)?
    };
    if let Some(example) = norm.unclassified.first() {
        log.unclassified(norm.unclassified.len(), example);
    }

    let (county, state) = {
        let _s = log.span(&Phase::Aggregate).entered();
        let tallies: Vec<_> = norm.rows.iter().map(PrecinctRow::to_tally).collect();
        let mut rollup = |level: Level| -> Vec<RollupRow> {
            aggregate(&tallies, level)
                .into_iter()
                .map(|r| {
                    let election_type = rules.classify(r.election_date);
                    let parts = contests.get(&r.contest_name).clone();
                    RollupRow::new(r, &parts, election_type, &e.zip_url)
                })
                .collect()
        };
        (rollup(Level::County), rollup(Level::State))
    };

    log.election_summary(&e.election_date.to_string(), norm.rows.len(), norm.unclassified.len());
    Ok(ElectionOutput {
        summary: ElectionSummary {
            election_date: e.election_date,
            member,
            layout: norm.layout,
            repair: norm.repair,
            precinct_rows: norm.rows.len(),
            unclassified_contests: norm.unclassified.len(),
        },
        precinct: norm.rows,
        county,
        state,
    })
}
