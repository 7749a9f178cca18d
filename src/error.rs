use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutofixError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for AutofixError {
    fn from(err: rusqlite::Error) -> Self {
        AutofixError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AutofixError>;

/// Pipeline step that talks to the reasoning service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Translate,
    Explain,
    Repair,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Translate => write!(f, "translate"),
            Stage::Explain => write!(f, "explain"),
            Stage::Repair => write!(f, "repair"),
        }
    }
}

/// A request that could not reach a terminal payload.
///
/// `original_sql` and `error` are kept when the failure happened inside the
/// repair cycle, so callers still see what the store rejected.
#[derive(Error, Debug)]
#[error("{stage} step failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: AutofixError,
    pub original_sql: Option<String>,
    pub error: Option<String>,
}

impl PipelineError {
    pub fn new(stage: Stage, source: AutofixError) -> Self {
        Self {
            stage,
            source,
            original_sql: None,
            error: None,
        }
    }

    pub fn with_failed_attempt(mut self, sql: &str, error: &str) -> Self {
        self.original_sql = Some(sql.to_string());
        self.error = Some(error.to_string());
        self
    }

    /// Whether the caller sent something unusable rather than a service failing
    pub fn is_invalid_request(&self) -> bool {
        matches!(self.source, AutofixError::InvalidRequest(_))
    }
}
