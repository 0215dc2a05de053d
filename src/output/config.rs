use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// How the plan/result envelope reaches stdout. CSV tables are unaffected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputConfig {
    /// `--json` forces JSON; otherwise `BALLOT_OUTPUT_FORMAT` decides.
    pub fn from_env(json_flag: bool) -> Self {
        OutputConfig::from_lookup(json_flag, |k| env::var(k).ok())
    }

    fn from_lookup(json_flag: bool, var: impl Fn(&str) -> Option<String>) -> Self {
        let requested = var("BALLOT_OUTPUT_FORMAT").map(|v| v.trim().to_ascii_lowercase());
        let format = if json_flag || requested.as_deref() == Some("json") { OutputFormat::Json } else { OutputFormat::Text };
        let pretty = var("BALLOT_OUTPUT_PRETTY")
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"));
        OutputConfig { format, pretty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |k| pairs.iter().find(|(n, _)| *n == k).map(|(_, v)| v.to_string())
    }

    #[test]
    fn json_flag_wins() {
        let cfg = OutputConfig::from_lookup(true, vars(&[("BALLOT_OUTPUT_FORMAT", "text")]));
        assert_eq!(cfg.format, OutputFormat::Json);
    }

    #[test]
    fn env_selects_format_and_pretty() {
        let cfg = OutputConfig::from_lookup(false, vars(&[("BALLOT_OUTPUT_FORMAT", " JSON "), ("BALLOT_OUTPUT_PRETTY", "Yes")]));
        assert_eq!(cfg, OutputConfig { format: OutputFormat::Json, pretty: true });
        let cfg = OutputConfig::from_lookup(false, vars(&[("BALLOT_OUTPUT_FORMAT", "csv")]));
        assert_eq!(cfg, OutputConfig { format: OutputFormat::Text, pretty: false });
    }
}
