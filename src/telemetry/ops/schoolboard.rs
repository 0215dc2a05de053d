use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct SchoolBoard;

#[derive(Copy, Clone, Debug)]
pub enum Phase { YearPage, DistrictPage, Join, Write }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::YearPage => "year_page",
        Phase::DistrictPage => "district_page",
        Phase::Join => "join",
        Phase::Write => "write",
    }}
    fn span(&self) -> Span { match self {
        Phase::YearPage => info_span!("year_page"),
        Phase::DistrictPage => info_span!("district_page"),
        Phase::Join => info_span!("join"),
        Phase::Write => info_span!("write"),
    }}
}

impl OpMarker for SchoolBoard {
    const NAME: &'static str = "schoolboard";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("schoolboard") }
}
