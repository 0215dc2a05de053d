use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Nc;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Discover, Election, Download, Read, Normalize, Aggregate, Write }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Discover => "discover",
        Phase::Election => "election",
        Phase::Download => "download",
        Phase::Read => "read",
        Phase::Normalize => "normalize",
        Phase::Aggregate => "aggregate",
        Phase::Write => "write",
    }}
    fn span(&self) -> Span { match self {
        Phase::Discover => info_span!("discover"),
        Phase::Election => info_span!("election"),
        Phase::Download => info_span!("download"),
        Phase::Read => info_span!("read"),
        Phase::Normalize => info_span!("normalize"),
        Phase::Aggregate => info_span!("aggregate"),
        Phase::Write => info_span!("write"),
    }}
}

impl OpMarker for Nc {
    const NAME: &'static str = "nc";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("nc") }
}
