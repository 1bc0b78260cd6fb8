use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::currency::CurrencyCode;

pub const DEFAULT_API_URL: &str = "https://openexchangerates.org/api";

#[derive(Debug, Clone)]
pub struct Config {
    pub app_id: Option<String>,
    pub api_url: String,
    pub base: CurrencyCode,
    pub poll_interval: Duration,
    pub max_backoff: Duration,
    pub request_timeout: Duration,
    pub highlight_duration: Duration,
    pub history_len: usize,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_id = lookup("HAREMFX_APP_ID").filter(|id| !id.trim().is_empty());
        let api_url = lookup("HAREMFX_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let base: CurrencyCode = parse_var(&lookup, "HAREMFX_BASE", "TRY".parse()?)?;
        let poll_interval = millis(&lookup, "HAREMFX_POLL_INTERVAL_MS", 2000)?;
        let max_backoff = millis(&lookup, "HAREMFX_MAX_BACKOFF_MS", 30_000)?;
        let request_timeout = millis(&lookup, "HAREMFX_REQUEST_TIMEOUT_MS", 5000)?;
        let highlight_duration = millis(&lookup, "HAREMFX_HIGHLIGHT_MS", 1100)?;
        let history_len = parse_var(&lookup, "HAREMFX_HISTORY_LEN", 24usize)?;

        if poll_interval.is_zero() {
            anyhow::bail!("HAREMFX_POLL_INTERVAL_MS must be greater than zero");
        }
        if max_backoff < poll_interval {
            anyhow::bail!("HAREMFX_MAX_BACKOFF_MS must not be below the poll interval");
        }

        Ok(Config {
            app_id,
            api_url,
            base,
            poll_interval,
            max_backoff,
            request_timeout,
            highlight_duration,
            history_len,
        })
    }

    pub fn require_app_id(&self) -> Result<&str> {
        self.app_id
            .as_deref()
            .ok_or(anyhow::anyhow!("HAREMFX_APP_ID is not set"))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn millis<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_var(lookup, key, default).map(Duration::from_millis)
}
