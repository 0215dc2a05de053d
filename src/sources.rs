use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::registry::{FetchMethod, Generation, Registry};
use crate::telemetry::{self};
use crate::telemetry::ops::sources::Phase as SourcesPhase;

#[derive(Args, Debug)]
pub struct SourcesCmd {
    /// Only sources whose key contains this text
    #[arg(long)] pub filter: Option<String>,
}

#[derive(Serialize)]
pub struct SourceRow {
    pub key: String,
    pub state: String,
    pub base_url: String,
    pub search_path: String,
    pub generation: Generation,
    pub fetch_method: FetchMethod,
}

#[derive(Serialize)]
pub struct SourcesList { pub sources: Vec<SourceRow> }

pub fn list(registry: &Registry, filter: Option<&str>) -> Vec<SourceRow> {
    let needle = filter.map(|f| f.trim().to_lowercase());
    registry
        .iter()
        .filter(|(k, _)| needle.as_deref().is_none_or(|n| k.contains(n)))
        .map(|(k, s)| SourceRow {
            key: k.to_string(),
            state: s.state.clone(),
            base_url: s.base_url.clone(),
            search_path: s.search_path.clone(),
            generation: s.generation,
            fetch_method: s.fetch_method,
        })
        .collect()
}

pub fn run(registry: &Registry, args: SourcesCmd) -> Result<()> {
    let log = telemetry::sources();
    let _s = log.span(&SourcesPhase::Load).entered();

    let rows = list(registry, args.filter.as_deref());
    if telemetry::config::json_mode() {
        log.result(&SourcesList { sources: rows })?;
        return Ok(());
    }

    log.info(format!("🗂️  ElectionStats sources ({}):", rows.len()));
    for r in &rows {
        log.info(format!("  {:16} {:14} {:?}/{:?}  {}{}", r.key, r.state, r.generation, r.fetch_method, r.base_url, r.search_path));
    }
    log.info("   Also: `schoolboard` / `bp-search` (ballotpedia.org) and `nc` (ncsbe.gov precinct archives).");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_by_key() {
        let reg = Registry::builtin();
        assert_eq!(list(&reg, None).len(), reg.keys().count());
        let sc = list(&reg, Some("South"));
        assert_eq!(sc.len(), 1);
        assert_eq!(sc[0].key, "south_carolina");
        assert_eq!(sc[0].generation, Generation::V2);
    }
}
