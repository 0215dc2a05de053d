pub mod config;
pub mod ctx;
pub mod ops;

use std::marker::PhantomData;
use std::time::Instant;

use ctx::{LogCtx, OpMarker};

fn ctx<O: OpMarker>() -> LogCtx<O> { LogCtx { json: config::logs_are_json(), started: Instant::now(), _marker: PhantomData } }

pub fn stats() -> LogCtx<ops::stats::Stats> { ctx() }
pub fn schoolboard() -> LogCtx<ops::schoolboard::SchoolBoard> { ctx() }
pub fn bp_search() -> LogCtx<ops::bp_search::BpSearch> { ctx() }
pub fn nc() -> LogCtx<ops::nc::Nc> { ctx() }
pub fn sources() -> LogCtx<ops::sources::Sources> { ctx() }
