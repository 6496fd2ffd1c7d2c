use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_UNAUTHORIZED_MESSAGE: &str = "Unauthorized. Contact the bot owner for access.";

/// Typed configuration for the bot process.
#[derive(Clone, Debug)]
pub struct Config {
    // Remote API
    pub bot_token: String,
    pub api_base: String,
    pub request_timeout: Duration,

    // Polling
    pub long_polling_timeout: Duration,
    pub fail_retry_interval: Duration,

    // Durable state (cursor record lives here)
    pub working_dir: PathBuf,

    // Authorization
    pub allowed_users: Vec<i64>,
    pub unauthorized_message: String,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self> {
        load_env_file(Path::new(".env"))?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let api_base = lookup("TELEGRAM_API_BASE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let working_dir = lookup("POLLBOT_WORKING_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let long_polling_timeout =
            Duration::from_secs(parse_u64(&lookup, "LONG_POLLING_TIMEOUT")?.unwrap_or(30));
        let fail_retry_interval =
            Duration::from_secs(parse_u64(&lookup, "FAIL_RETRY_INTERVAL")?.unwrap_or(5));
        let request_timeout =
            Duration::from_secs(parse_u64(&lookup, "REQUEST_TIMEOUT")?.unwrap_or(10));

        let allowed_users = parse_csv_i64(lookup("TELEGRAM_ALLOWED_USERS"))?;
        let unauthorized_message = lookup("UNAUTHORIZED_MESSAGE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_UNAUTHORIZED_MESSAGE.to_string());

        Ok(Self {
            bot_token: bot_token.trim().to_string(),
            api_base,
            request_timeout,
            long_polling_timeout,
            fail_retry_interval,
            working_dir,
            allowed_users,
            unauthorized_message,
        })
    }
}

/// Export `.env` entries into the process environment. Variables that are
/// already set win; a missing file is not an error.
fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::Config(format!("{}: {e}", path.display()))),
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| Error::Config(format!("{key} must be a non-negative integer: {e}")))
}

fn parse_csv_i64(v: Option<String>) -> Result<Vec<i64>> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| Error::Config(format!("invalid user id {s:?}: {e}")))
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
