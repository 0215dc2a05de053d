use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Stats;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Search, SearchPage, Detail, Join, Write }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Search => "search",
        Phase::SearchPage => "search_page",
        Phase::Detail => "detail",
        Phase::Join => "join",
        Phase::Write => "write",
    }}
    fn span(&self) -> Span { match self {
        Phase::Search => info_span!("search"),
        Phase::SearchPage => info_span!("search_page"),
        Phase::Detail => info_span!("detail"),
        Phase::Join => info_span!("join"),
        Phase::Write => info_span!("write"),
    }}
}

impl OpMarker for Stats {
    const NAME: &'static str = "stats";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("stats") }
}
