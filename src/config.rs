// src/config.rs

//! Application configuration structures and loading.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server and database settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream fetching behavior settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Per-client request quota settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// CSS selectors for the listing markup
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// `DATABASE_URL`, when set, overrides the configured store URL so
    /// deployments can keep credentials out of the config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.server.database_url = url;
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.server.listen_addr.trim().is_empty() {
            return Err(AppError::validation("server.listen_addr is empty"));
        }
        if self.server.database_url.trim().is_empty() {
            return Err(AppError::validation("server.database_url is empty"));
        }
        if self.server.max_connections == 0 {
            return Err(AppError::validation("server.max_connections must be > 0"));
        }
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs must be > 0"));
        }
        if self.scraper.retry_attempts == 0 {
            return Err(AppError::validation("scraper.retry_attempts must be > 0"));
        }
        if self.scraper.max_pages == 0 {
            return Err(AppError::validation("scraper.max_pages must be > 0"));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(AppError::validation("rate_limit.max_requests must be > 0"));
        }
        if self.rate_limit.window_secs == 0 {
            return Err(AppError::validation("rate_limit.window_secs must be > 0"));
        }
        Ok(())
    }
}

/// HTTP server and database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API listens on
    #[serde(default = "defaults::listen_addr")]
    pub listen_addr: String,

    /// sqlx connection URL for the jobs store
    #[serde(default = "defaults::database_url")]
    pub database_url: String,

    /// Connection pool size
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: defaults::listen_addr(),
            database_url: defaults::database_url(),
            max_connections: defaults::max_connections(),
        }
    }
}

/// Upstream fetching behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Site base URL the category feed paths are joined to
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per page fetch before the category is marked failed
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay between retry attempts in milliseconds (grows linearly)
    #[serde(default = "defaults::retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Delay between page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Upper bound on feed pages fetched per category
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retry_attempts: defaults::retry_attempts(),
            retry_backoff_ms: defaults::retry_backoff_ms(),
            request_delay_ms: defaults::request_delay(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// Per-client request quota settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window per client IP
    #[serde(default = "defaults::max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "defaults::window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: defaults::max_requests(),
            window_secs: defaults::window_secs(),
        }
    }
}

/// CSS selectors for the talentd.in listing markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Selector for one listing card
    #[serde(default = "defaults::card_selector")]
    pub card: String,

    #[serde(default = "defaults::title_selector")]
    pub title: String,

    #[serde(default = "defaults::company_location_selector")]
    pub company_location: String,

    #[serde(default = "defaults::salary_selector")]
    pub salary: String,

    #[serde(default = "defaults::posted_selector")]
    pub posted: String,

    /// Selector for individual skill tags within a card
    #[serde(default = "defaults::skills_selector")]
    pub skills: String,

    #[serde(default = "defaults::eligible_years_selector")]
    pub eligible_years: String,

    /// Selector for the apply link (`href` is taken)
    #[serde(default = "defaults::apply_link_selector")]
    pub apply_link: String,

    /// Selector for the company logo (`src` is taken)
    #[serde(default = "defaults::company_logo_selector")]
    pub company_logo: String,

    /// Selector for pagination links carrying page numbers
    #[serde(default = "defaults::pagination_selector")]
    pub pagination: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            card: defaults::card_selector(),
            title: defaults::title_selector(),
            company_location: defaults::company_location_selector(),
            salary: defaults::salary_selector(),
            posted: defaults::posted_selector(),
            skills: defaults::skills_selector(),
            eligible_years: defaults::eligible_years_selector(),
            apply_link: defaults::apply_link_selector(),
            company_logo: defaults::company_logo_selector(),
            pagination: defaults::pagination_selector(),
        }
    }
}

mod defaults {
    // Server defaults
    pub fn listen_addr() -> String {
        "0.0.0.0:8000".into()
    }
    pub fn database_url() -> String {
        "sqlite://hirepro.db".into()
    }
    pub fn max_connections() -> u32 {
        5
    }

    // Scraper defaults
    pub fn base_url() -> String {
        "https://www.talentd.in".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; hirepro/1.0)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn retry_attempts() -> u32 {
        3
    }
    pub fn retry_backoff_ms() -> u64 {
        500
    }
    pub fn request_delay() -> u64 {
        250
    }
    pub fn max_pages() -> u32 {
        20
    }

    // Rate limit defaults
    pub fn max_requests() -> u32 {
        60
    }
    pub fn window_secs() -> u64 {
        60
    }

    // Selector defaults for talentd.in listing cards
    pub fn card_selector() -> String {
        "div.job-listing".into()
    }
    pub fn title_selector() -> String {
        "h2".into()
    }
    pub fn company_location_selector() -> String {
        "div.company".into()
    }
    pub fn salary_selector() -> String {
        "div.salary".into()
    }
    pub fn posted_selector() -> String {
        "div.posted".into()
    }
    pub fn skills_selector() -> String {
        "div.skills span".into()
    }
    pub fn eligible_years_selector() -> String {
        "div.eligible-years".into()
    }
    pub fn apply_link_selector() -> String {
        "a.apply-link".into()
    }
    pub fn company_logo_selector() -> String {
        "img.company-logo".into()
    }
    pub fn pagination_selector() -> String {
        "a[href*='page=']".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.scraper.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_window() {
        let mut config = Config::default();
        config.rate_limit.window_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [rate_limit]
            max_requests = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.scraper.retry_attempts, 3);
        assert_eq!(config.selectors.card, "div.job-listing");
    }
}
