use crate::fetch::FetchError;

/// Failure taxonomy shared by the locators, extractors and pipelines.
///
/// `NotFound` and `ParseShape` are per-unit conditions: a pipeline counts
/// them as skipped and moves on. `JoinIntegrity` is fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected page shape: {0}")]
    ParseShape(String),

    #[error(transparent)]
    Transport(#[from] FetchError),

    #[error("join integrity: {0}")]
    JoinIntegrity(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ScrapeError {
    /// Short machine-friendly label used in skip logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::NotFound(_) => "not_found",
            ScrapeError::ParseShape(_) => "parse_shape",
            ScrapeError::Transport(e) => e.kind(),
            ScrapeError::JoinIntegrity(_) => "join_integrity",
            ScrapeError::Config(_) => "config",
            ScrapeError::Io(_) => "io",
            ScrapeError::Csv(_) => "csv",
            ScrapeError::Zip(_) => "zip",
        }
    }
}
