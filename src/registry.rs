//! Immutable table of ElectionStats portals, built once and handed to the
//! commands that need it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// Server-rendered search table with `election-id-N` rows.
    Classic,
    /// Client-rendered table; needs a rendering fetcher.
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMethod {
    Plain,
    Rendering,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub state: String,
    pub base_url: String,
    #[serde(default)]
    pub search_path: String,
    pub generation: Generation,
    pub fetch_method: FetchMethod,
}

#[derive(Debug, Clone)]
pub struct Registry {
    sources: BTreeMap<String, SourceConfig>,
}

impl Registry {
    pub fn builtin() -> Self {
        let entries = [
            ("virginia", "Virginia", "https://historical.elections.virginia.gov/elections", "/search", Generation::Classic, FetchMethod::Plain),
            ("massachusetts", "Massachusetts", "https://electionstats.state.ma.us/elections", "/search", Generation::Classic, FetchMethod::Plain),
            ("colorado", "Colorado", "https://co.elstats2.civera.com/eng/contests", "", Generation::Classic, FetchMethod::Plain),
            ("south_carolina", "South Carolina", "https://electionhistory.scvotes.gov", "/search", Generation::V2, FetchMethod::Rendering),
            ("new_mexico", "New Mexico", "https://electionstats.sos.nm.gov", "/search", Generation::V2, FetchMethod::Rendering),
        ];
        let sources = entries
            .into_iter()
            .map(|(key, state, base, path, generation, fetch_method)| {
                (key.to_string(), SourceConfig {
                    state: state.to_string(),
                    base_url: base.to_string(),
                    search_path: path.to_string(),
                    generation,
                    fetch_method,
                })
            })
            .collect();
        Registry { sources }
    }

    /// Built-in table, optionally replaced by a JSON object `{key: SourceConfig}`.
    pub fn load(path: Option<&Path>) -> Result<Self, ScrapeError> {
        let Some(path) = path else { return Ok(Self::builtin()) };
        let raw = std::fs::read_to_string(path)?;
        let parsed: BTreeMap<String, SourceConfig> = serde_json::from_str(&raw)
            .map_err(|e| ScrapeError::Config(format!("{}: {e}", path.display())))?;
        let sources = parsed.into_iter().map(|(k, v)| (normalize_key(&k), v)).collect();
        Ok(Registry { sources })
    }

    /// Look up a source by key; `"South Carolina"` and `south_carolina` are the same key.
    pub fn lookup(&self, key: &str) -> Result<(&str, &SourceConfig), ScrapeError> {
        let norm = normalize_key(key);
        self.sources
            .get_key_value(&norm)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| {
                ScrapeError::Config(format!(
                    "unknown state '{key}'; available: {}",
                    self.keys().collect::<Vec<_>>().join(", ")
                ))
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceConfig)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v))
    }
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("_")
}
