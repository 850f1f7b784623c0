//! Runtime configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::SniperError;

pub const DEFAULT_SEARCH_URL: &str =
    "https://www.olx.pl/oferty/q-iphone/?search%5Border%5D=created_at:desc";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 45;
pub const DEFAULT_SEEN_FILE: &str = "./seen.json";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Pause between two successful notifications in one cycle.
pub const NOTIFY_PAUSE: Duration = Duration::from_secs(5);
/// First backoff step after a 429 from the webhook; doubles per attempt.
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct Config {
    pub search_url: Url,
    pub webhook_url: Option<String>,
    pub poll_interval_secs: u64,
    /// `None` rotates through built-in desktop user agents.
    pub user_agent: Option<String>,
    pub seen_file: PathBuf,
    pub port: u16,
    pub keywords: Vec<String>,
    pub max_results: usize,
    pub notify_on_start: bool,
    pub notify_pause: Duration,
    pub retry_base_delay: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("search_url", &self.search_url.as_str())
            .field(
                "webhook_url",
                &self.webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("user_agent", &self.user_agent)
            .field("seen_file", &self.seen_file)
            .field("port", &self.port)
            .field("keywords", &self.keywords)
            .field("max_results", &self.max_results)
            .field("notify_on_start", &self.notify_on_start)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SniperError::InvalidConfig`] or [`SniperError::InvalidUrl`]
    /// when a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, SniperError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SniperError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_search = get("OLX_SEARCH_URL").unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string());
        let search_url = Url::parse(&raw_search).map_err(|source| SniperError::InvalidUrl {
            url: raw_search.clone(),
            source,
        })?;

        let poll_interval_secs: u64 =
            parse_or("POLL_INTERVAL", get("POLL_INTERVAL"), DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_interval_secs == 0 {
            return Err(SniperError::InvalidConfig {
                key: "POLL_INTERVAL".to_string(),
                value: "0".to_string(),
            });
        }

        let keywords = get("KEYWORDS")
            .map(|raw| {
                raw.split(',')
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            search_url,
            webhook_url: get("DISCORD_WEBHOOK_URL"),
            poll_interval_secs,
            user_agent: get("USER_AGENT"),
            seen_file: get("SEEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SEEN_FILE)),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            keywords,
            max_results: parse_or("MAX_RESULTS", get("MAX_RESULTS"), DEFAULT_MAX_RESULTS)?,
            notify_on_start: parse_bool("NOTIFY_ON_START", get("NOTIFY_ON_START"))?,
            notify_pause: NOTIFY_PAUSE,
            retry_base_delay: RETRY_BASE_DELAY,
        })
    }

    /// Scheme + host (+ port) of the search URL; relative listing links resolve against it.
    #[must_use]
    pub fn base_origin(&self) -> Url {
        let mut base = self.search_url.clone();
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);
        base
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T, SniperError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| SniperError::InvalidConfig {
            key: key.to_string(),
            value: v,
        }),
    }
}

fn parse_bool(key: &str, value: Option<String>) -> Result<bool, SniperError> {
    let Some(raw) = value else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(SniperError::InvalidConfig {
            key: key.to_string(),
            value: raw,
        }),
    }
}
