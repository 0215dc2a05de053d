use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct BpSearch;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Page, Write }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Page => "page",
        Phase::Write => "write",
    }}
    fn span(&self) -> Span { match self {
        Phase::Page => info_span!("page"),
        Phase::Write => info_span!("write"),
    }}
}

impl OpMarker for BpSearch {
    const NAME: &'static str = "bp_search";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("bp_search") }
}
