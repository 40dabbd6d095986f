use anyhow::{anyhow, Context, Result};
use chrono::Datelike;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_PLAYER_BASE: &str = "https://p.lumex.cloud/pBHgzGTxFN54";
pub const DEFAULT_LANGUAGE: &str = "ru-RU";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3146";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct Settings {
    pub tmdb_api_key: String,
    pub language: String,
    pub tmdb_base_url: String,
    pub image_base_url: String,
    pub player_base_url: String,
    pub bind_addr: SocketAddr,
    /// Upper bound of the year filter; read once at startup.
    pub current_year: i32,
    pub search_debounce: Duration,
    pub http_timeout: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("tmdb_api_key", &"<redacted>")
            .field("language", &self.language)
            .field("tmdb_base_url", &self.tmdb_base_url)
            .field("image_base_url", &self.image_base_url)
            .field("player_base_url", &self.player_base_url)
            .field("bind_addr", &self.bind_addr)
            .field("current_year", &self.current_year)
            .field("search_debounce", &self.search_debounce)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tmdb_api_key = get("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3146")?;
        let current_year = match get("CURRENT_YEAR") {
            Some(v) => v.trim().parse().context("CURRENT_YEAR must be an integer")?,
            None => chrono::Utc::now().year(),
        };
        let search_debounce_ms = match get("SEARCH_DEBOUNCE_MS") {
            Some(v) => v
                .trim()
                .parse()
                .context("SEARCH_DEBOUNCE_MS must be an integer")?,
            None => DEFAULT_SEARCH_DEBOUNCE_MS,
        };
        let http_timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .context("HTTP_TIMEOUT_SECS must be an integer")?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        if http_timeout_secs == 0 {
            return Err(anyhow!("HTTP_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(Self {
            tmdb_api_key,
            language: get("TMDB_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            tmdb_base_url: get("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_TMDB_BASE.to_string()),
            image_base_url: get("TMDB_IMAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE.to_string()),
            player_base_url: get("PLAYER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PLAYER_BASE.to_string()),
            bind_addr,
            current_year,
            search_debounce: Duration::from_millis(search_debounce_ms),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}
