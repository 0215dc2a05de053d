use std::env;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_S: u64 = 60;
pub const DEFAULT_SLEEP_S: f64 = 0.10;
pub const DEFAULT_MAX_WORKERS: usize = 6;

#[derive(Clone, Debug, PartialEq)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Minimum spacing between requests from one fetcher.
    pub sleep: Duration,
    pub max_workers: usize,
    pub user_agent: String,
    pub render_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_S),
            sleep: Duration::from_secs_f64(DEFAULT_SLEEP_S),
            max_workers: DEFAULT_MAX_WORKERS,
            user_agent: default_user_agent(),
            render_url: None,
        }
    }
}

impl FetchConfig {
    pub fn from_env() -> Self {
        let d = FetchConfig::default();
        let timeout = env::var("BALLOT_TIMEOUT_S").ok().and_then(|v| v.parse::<u64>().ok()).map(Duration::from_secs).unwrap_or(d.timeout);
        let sleep = env::var("BALLOT_SLEEP_S").ok().and_then(|v| parse_secs(&v)).unwrap_or(d.sleep);
        let max_workers = env::var("BALLOT_MAX_WORKERS").ok().and_then(|v| v.parse::<usize>().ok()).filter(|n| *n > 0).unwrap_or(d.max_workers);
        let user_agent = env::var("BALLOT_USER_AGENT").ok().filter(|v| !v.trim().is_empty()).unwrap_or(d.user_agent);
        let render_url = env::var("BALLOT_RENDER_URL").ok().filter(|v| !v.trim().is_empty());
        FetchConfig { timeout, sleep, max_workers, user_agent, render_url }
    }

    /// CLI overrides; `None` keeps the env/default value.
    pub fn with_overrides(mut self, sleep_s: Option<f64>, workers: Option<usize>) -> Self {
        if let Some(d) = sleep_s.and_then(|s| parse_secs(&s.to_string())) { self.sleep = d; }
        if let Some(w) = workers.filter(|w| *w > 0) { self.max_workers = w; }
        self
    }
}

fn parse_secs(v: &str) -> Option<Duration> {
    let s: f64 = v.trim().parse().ok()?;
    if s.is_finite() && s >= 0.0 { Some(Duration::from_secs_f64(s)) } else { None }
}

fn default_user_agent() -> String {
    format!("ballotscrape/{} (election results research)", env!("CARGO_PKG_VERSION"))
}
