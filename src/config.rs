//! Process configuration read from the environment

use crate::nlp::DEFAULT_BASE_URL;
use crate::runtime::DEFAULT_IDLE_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    /// Bearer token for the Wit.ai message endpoint; extraction is off without it
    pub wit_token: Option<String>,
    pub wit_url: String,
    pub idle_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("DAYLOG_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.daylog/daylog.db"))
            },
            PathBuf::from,
        );

        let port = lookup("DAYLOG_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let idle_timeout = lookup("DAYLOG_IDLE_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_IDLE_TIMEOUT, Duration::from_secs);

        Self {
            db_path,
            port,
            wit_token: lookup("WIT_AI_TOKEN").filter(|t| !t.trim().is_empty()),
            wit_url: lookup("WIT_AI_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            idle_timeout,
        }
    }
}
