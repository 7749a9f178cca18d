//! Runtime configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Defaults target a local Ollama instance serving `sqlcoder:7b`.

use crate::error::{AutofixError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_API_KEY: &str = "none";
pub const DEFAULT_MODEL: &str = "sqlcoder:7b";
pub const DEFAULT_DATABASE_PATH: &str = "mydb.sqlite";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings for the reasoning service endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

/// Settings for the relational store
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Open connections with `SQLITE_OPEN_READ_ONLY`
    pub read_only: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key: DEFAULT_API_KEY.to_string(),
                model: DEFAULT_MODEL.to_string(),
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                path: PathBuf::from(DEFAULT_DATABASE_PATH),
                read_only: false,
            },
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read configuration from the environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout = match lookup("LLM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    AutofixError::Config(format!("LLM_TIMEOUT_SECS must be a whole number of seconds, got '{}'", raw))
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.llm.timeout,
        };

        let read_only = match lookup("DATABASE_READ_ONLY") {
            Some(raw) => parse_bool("DATABASE_READ_ONLY", &raw)?,
            None => defaults.database.read_only,
        };

        Ok(Self {
            llm: LlmConfig {
                base_url: lookup("OPENAI_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.llm.base_url),
                api_key: lookup("OPENAI_API_KEY").unwrap_or(defaults.llm.api_key),
                model: lookup("OPENAI_MODEL").unwrap_or(defaults.llm.model),
                timeout,
            },
            database: DatabaseConfig {
                path: lookup("DATABASE_PATH").map(PathBuf::from).unwrap_or(defaults.database.path),
                read_only,
            },
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AutofixError::Config(format!("{} must be a boolean, got '{}'", key, raw))),
    }
}
