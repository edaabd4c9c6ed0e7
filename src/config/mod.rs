//! Configuration management for cubewatch
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CUBEWATCH_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listing page and HTTP client configuration
    pub listing: ListingConfig,

    /// Country reference feed configuration
    pub countries: CountriesConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Periodic check configuration
    pub scheduler: SchedulerConfig,

    /// Delivery configuration
    pub notifications: NotificationsConfig,

    /// Translation configuration
    pub i18n: I18nConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Listing page and HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Site root; the listing lives under `/competitions`
    pub base_url: String,

    /// Rate limit (requests per second)
    pub rate_limit: u32,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries after the first attempt on 429/5xx
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds
    pub retry_base_delay_ms: u64,

    /// User agent string
    pub user_agent: String,
}

/// Country reference feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountriesConfig {
    /// JSON feed with `items[{name, iso2Code}]`
    pub feed_url: String,

    /// How long the feed is reused, 0 refetches on every resolution
    pub cache_ttl_secs: u64,

    /// Minimum normalized similarity for a fuzzy match (0.0 - 1.0)
    pub similarity_threshold: f64,

    /// Used when nothing matches, and as the default session country
    pub default_country: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path (`:memory:` for a throwaway store)
    pub sqlite_path: PathBuf,
}

/// Periodic check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between cycles
    pub interval_secs: u64,

    /// Run a cycle immediately instead of waiting one interval
    pub run_on_startup: bool,
}

/// Delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Chat webhook; when absent notifications go to the log
    pub webhook_url: Option<String>,

    /// Webhook request timeout in seconds
    pub timeout_secs: u64,

    /// Webhook retries after the first attempt
    pub max_retries: u32,

    /// Text prepended to the announcement (e.g. a role mention)
    pub mention: Option<String>,

    /// Send one combined text message instead of one block per competition
    pub combined: bool,

    /// Competitions per page in the current-competitions view
    pub page_size: usize,
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    /// Translation table; the embedded table is used when absent
    pub messages_path: Option<PathBuf>,

    /// Default session locale
    pub default_locale: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://www.worldcubeassociation.org"),
            rate_limit: 2,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            user_agent: format!("cubewatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for CountriesConfig {
    fn default() -> Self {
        Self {
            feed_url: String::from(
                "https://raw.githubusercontent.com/robiningelbrecht/wca-rest-api/master/api/countries.json",
            ),
            cache_ttl_secs: 86_400,
            similarity_threshold: 0.8,
            default_country: String::from("Chile"),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/competitions.db"),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2 * 60 * 60,
            run_on_startup: true,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
            max_retries: 2,
            mention: None,
            combined: false,
            page_size: 3,
        }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            messages_path: None,
            default_locale: String::from("es"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Read `CUBEWATCH_{key}` and parse it, falling back to `default`
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(format!("{ENV_PREFIX}{key}"))
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let d = Self::default();

        Ok(Self {
            listing: ListingConfig {
                base_url: env_or("BASE_URL", d.listing.base_url),
                rate_limit: env_or("RATE_LIMIT", d.listing.rate_limit),
                request_timeout_secs: env_or("REQUEST_TIMEOUT", d.listing.request_timeout_secs),
                max_retries: env_or("MAX_RETRIES", d.listing.max_retries),
                retry_base_delay_ms: env_or("RETRY_BASE_DELAY_MS", d.listing.retry_base_delay_ms),
                user_agent: env_or("USER_AGENT", d.listing.user_agent),
            },
            countries: CountriesConfig {
                feed_url: env_or("COUNTRIES_URL", d.countries.feed_url),
                cache_ttl_secs: env_or("COUNTRIES_CACHE_TTL", d.countries.cache_ttl_secs),
                similarity_threshold: env_or(
                    "SIMILARITY_THRESHOLD",
                    d.countries.similarity_threshold,
                ),
                default_country: env_or("COUNTRY", d.countries.default_country),
            },
            database: DatabaseConfig {
                sqlite_path: env_or("SQLITE_PATH", d.database.sqlite_path),
            },
            scheduler: SchedulerConfig {
                interval_secs: env_or("INTERVAL_SECS", d.scheduler.interval_secs),
                run_on_startup: env_or("RUN_ON_STARTUP", d.scheduler.run_on_startup),
            },
            notifications: NotificationsConfig {
                webhook_url: env_opt("WEBHOOK_URL"),
                timeout_secs: env_or("WEBHOOK_TIMEOUT", d.notifications.timeout_secs),
                max_retries: env_or("WEBHOOK_MAX_RETRIES", d.notifications.max_retries),
                mention: env_opt("MENTION"),
                combined: env_or("COMBINED", d.notifications.combined),
                page_size: env_or("PAGE_SIZE", d.notifications.page_size),
            },
            i18n: I18nConfig {
                messages_path: env_opt("MESSAGES_PATH").map(PathBuf::from),
                default_locale: env_or("LOCALE", d.i18n.default_locale),
            },
            logging: LoggingConfig {
                level: env_or("LOG_LEVEL", d.logging.level),
                format: env_or("LOG_FORMAT", d.logging.format),
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.listing.base_url)
            .with_context(|| format!("Invalid listing base_url: {}", self.listing.base_url))?;

        url::Url::parse(&self.countries.feed_url)
            .with_context(|| format!("Invalid countries feed_url: {}", self.countries.feed_url))?;

        if self.listing.rate_limit == 0 {
            anyhow::bail!("rate_limit must be greater than 0");
        }

        if self.listing.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.countries.similarity_threshold) {
            anyhow::bail!("similarity_threshold must be between 0.0 and 1.0");
        }

        if self.countries.default_country.trim().is_empty() {
            anyhow::bail!("default_country must not be empty");
        }

        if self.scheduler.interval_secs == 0 {
            anyhow::bail!("interval_secs must be greater than 0");
        }

        if self.notifications.page_size == 0 {
            anyhow::bail!("page_size must be greater than 0");
        }

        if let Some(webhook) = &self.notifications.webhook_url {
            url::Url::parse(webhook).context("Invalid webhook_url")?;
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }
}
