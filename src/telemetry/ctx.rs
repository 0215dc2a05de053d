use anyhow::Result;
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Instant;
use tracing::{info, debug, warn, Span};

use super::config;
use super::ops::{bp_search::BpSearch, nc::Nc, schoolboard::SchoolBoard, stats::Stats};
use crate::output::config::OutputConfig;
use crate::output::presenter::Emitter;
use crate::output::types::{Envelope, Meta};
use crate::output::TableWritten;
use crate::record::SkippedUnit;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) started: Instant,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn span_kv<'a, T>(&self, ph: &O::Phase, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.span(ph);
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), phase = ph.name(), "span_start");
        } else {
            info!(op = %self.op_name(), phase = ph.name(), details = %details, "span_start");
        }
        span
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn debug(&self, msg: impl AsRef<str>) { if self.json { debug!(op = %self.op_name(), "{}", msg.as_ref()); } else { debug!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{}", msg); }
    }

    pub fn plan<T: Serialize>(&self, plan: &T) -> Result<()> {
        let env = Envelope::plan(self.op_name(), plan, None)?;
        emitter().emit(&env)?;
        Ok(())
    }

    pub fn result<T: Serialize>(&self, result: &T) -> Result<()> {
        let meta = Meta { duration_ms: Some(self.started.elapsed().as_millis()) };
        let env = Envelope::result(self.op_name(), result, Some(meta))?;
        emitter().emit(&env)?;
        Ok(())
    }

    /// A unit that produced no data; the run continues.
    pub fn skipped(&self, s: &SkippedUnit) {
        if self.json { warn!(op = %self.op_name(), unit = %s.unit, url = %s.url, kind = s.kind, reason = %s.reason, "skipped"); }
        else { warn!("⏭️  skip {} ({}) {} — {}", s.unit, s.kind, s.url, s.reason); }
    }

    pub fn wrote(&self, t: &TableWritten) {
        if self.json { info!(op = %self.op_name(), path = %t.path.display(), rows = t.rows, "table_written"); }
        else { info!("💾 {} rows → {}", t.rows, t.path.display()); }
    }
}

fn emitter() -> Emitter { Emitter::from_config(OutputConfig::from_env(config::json_mode())) }

impl LogCtx<Stats> {
    pub fn totals(&self, state_rows: usize, county_rows: usize, joined_rows: usize, skipped: usize) {
        if self.json { info!(op = %self.op_name(), state_rows, county_rows, joined_rows, skipped, "stats_totals"); }
        else { info!("📊 Stats totals — state_rows={} county_rows={} joined_rows={} skipped={}", state_rows, county_rows, joined_rows, skipped); }
    }
}

impl LogCtx<SchoolBoard> {
    pub fn year_summary(&self, year: i32, districts: usize, candidates: usize, skipped: usize) {
        if self.json { info!(op = %self.op_name(), year, districts, candidates, skipped, "year_summary"); }
        else { info!("✅ {} — districts={} candidates={} skipped={}", year, districts, candidates, skipped); }
    }

    pub fn totals(&self, districts: usize, candidates: usize, joined: usize, skipped: usize) {
        if self.json { info!(op = %self.op_name(), districts, candidates, joined, skipped, "schoolboard_totals"); }
        else { info!("📊 School board totals — districts={} candidates={} joined={} skipped={}", districts, candidates, joined, skipped); }
    }
}

impl LogCtx<BpSearch> {
    pub fn totals(&self, pages: usize, hits: usize) {
        if self.json { info!(op = %self.op_name(), pages, hits, "search_totals"); }
        else { info!("📊 Search totals — pages={} hits={}", pages, hits); }
    }
}

impl LogCtx<Nc> {
    pub fn election_summary(&self, date: &str, rows: usize, unclassified: usize) {
        if self.json { info!(op = %self.op_name(), date, rows, unclassified, "election_summary"); }
        else { info!("✅ Election {} — rows={} unclassified={}", date, rows, unclassified); }
    }

    pub fn unclassified(&self, count: usize, example: &str) {
        if self.json { warn!(op = %self.op_name(), count, example, "unclassified_contests"); }
        else { warn!("❓ {} contest names did not parse, e.g. {:?}", count, example); }
    }

    pub fn totals(&self, elections: usize, skipped: usize, precinct_rows: usize, county_rows: usize, state_rows: usize) {
        if self.json { info!(op = %self.op_name(), elections, skipped, precinct_rows, county_rows, state_rows, "nc_totals"); }
        else { info!("📊 NC totals — elections={} skipped={} precinct_rows={} county_rows={} state_rows={}", elections, skipped, precinct_rows, county_rows, state_rows); }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}
