//! Configuration model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the TMDB bearer token.
pub const TOKEN_ENV: &str = "TMDB_BEARER_TOKEN";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TMDB configuration.
    pub tmdb: TmdbConfig,
    /// Sync run configuration.
    pub sync: SyncConfig,
    /// Pacing between remote calls.
    pub rate_limit: RateLimitConfig,
    /// Catalog store file.
    pub store_path: PathBuf,
}

/// TMDB configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// Bearer token (API read access token).
    pub bearer_token: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Language for responses.
    pub language: String,
}

/// Discover sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Popularity,
    ReleaseDate,
    VoteAverage,
    Revenue,
}

impl SortBy {
    /// Value of the `sort_by` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            SortBy::Popularity => "popularity.desc",
            SortBy::ReleaseDate => "release_date.desc",
            SortBy::VoteAverage => "vote_average.desc",
            SortBy::Revenue => "revenue.desc",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

/// Sync run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Number of new movies to create before stopping.
    pub target: usize,
    /// Number of leading cast members linked per movie.
    pub cast_limit: usize,
    /// Consecutive failed page fetches tolerated before the run ends.
    pub max_consecutive_page_errors: u32,
    /// Last discover page to request (TMDB serves at most 500).
    pub max_pages: u32,
    /// Movies processed concurrently within a page.
    pub concurrency: usize,
    /// Discover sort order.
    pub sort_by: SortBy,
    /// Minimum vote count (`vote_count.gte`).
    pub min_vote_count: Option<u32>,
    /// Only movies released within this many months.
    pub released_within_months: Option<u32>,
}

/// Rate limiter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitMode {
    /// Fixed pause after every movie and page.
    Fixed,
    /// Token bucket shared by all workers.
    TokenBucket,
}

/// Pacing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub mode: RateLimitMode,
    /// Pause after each movie in fixed mode, in milliseconds.
    pub delay_ms: u64,
    /// Pause after each page in fixed mode, in milliseconds.
    pub page_delay_ms: u64,
    /// Remote requests per second in token bucket mode.
    pub requests_per_second: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb: TmdbConfig::default(),
            sync: SyncConfig::default(),
            rate_limit: RateLimitConfig::default(),
            store_path: dirs_config_path().join("catalog.db"),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            bearer_token: None,
            base_url: "https://api.themoviedb.org/3".to_string(),
            language: "en-US".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target: 300,
            cast_limit: 5,
            max_consecutive_page_errors: 5,
            max_pages: 500,
            concurrency: 1,
            sort_by: SortBy::Revenue,
            min_vote_count: None,
            released_within_months: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            mode: RateLimitMode::Fixed,
            delay_ms: 200,
            page_delay_ms: 300,
            requests_per_second: 4,
        }
    }
}

impl Config {
    /// Bearer token, or the fatal startup error when it is missing.
    pub fn bearer_token(&self) -> crate::Result<&str> {
        self.tmdb
            .bearer_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(crate::Error::TmdbTokenMissing)
    }

    /// Override file values with the environment.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.tmdb.bearer_token = Some(token);
            }
        }
    }
}

/// Get the configuration directory path.
pub fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("catalog_sync")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from a file, falling back to defaults when it is absent.
///
/// The environment is applied on top of whatever was loaded.
pub fn load_config(path: Option<&Path>) -> crate::Result<Config> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    let mut config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("{}: {}", config_path.display(), e)))?
    } else {
        if path.is_some() {
            return Err(crate::Error::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }
        Config::default()
    };

    config.apply_env();
    Ok(config)
}
