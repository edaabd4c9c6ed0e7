pub mod admin;
pub mod monitor;
pub mod query;

// Re-export command functions for convenience
pub use admin::{delete, purge};
pub use monitor::{check, run};
pub use query::{languages, list, resolve};

use anyhow::{Context, Result};
use std::sync::Arc;

use cubewatch::config::Config;
use cubewatch::crawler::Crawler;
use cubewatch::i18n::{normalize_locale, Translations};
use cubewatch::models::Session;
use cubewatch::notifications::channels::webhook::WebhookConfig;
use cubewatch::notifications::{LogChannel, NotificationFormatter, SharedChannel, WebhookChannel};
use cubewatch::pipeline::{Monitor, MonitorOptions};
use cubewatch::storage::open_store;

/// Components shared by every subcommand
pub struct App {
    pub config: Config,
    pub translations: Arc<Translations>,
    pub monitor: Arc<Monitor>,
}

impl App {
    /// Build crawler, store, formatter and channel from `config`
    pub fn build(config: Config) -> Result<Self> {
        let translations = Arc::new(
            Translations::load(config.i18n.messages_path.as_deref())
                .context("Failed to load translations")?,
        );

        let crawler = Arc::new(Crawler::new(&config)?);
        let store = open_store(&config.database).context("Failed to open competition store")?;
        let channel = build_channel(&config)?;

        tracing::debug!(
            channel = channel.name(),
            store = %config.database.sqlite_path.display(),
            "Components ready"
        );

        let monitor = Monitor::new(
            crawler,
            store,
            NotificationFormatter::new(Arc::clone(&translations)),
            channel,
            MonitorOptions::from(&config.notifications),
        );

        Ok(Self {
            config,
            translations,
            monitor: Arc::new(monitor),
        })
    }

    /// Session from CLI overrides, falling back to configured defaults
    ///
    /// An unsupported locale is reported and replaced by the default one.
    pub fn session(&self, country: Option<String>, locale: Option<String>) -> Session {
        let default_locale = normalize_locale(&self.config.i18n.default_locale);
        let locale = match locale.map(|l| normalize_locale(&l)) {
            Some(l) if self.translations.is_supported(&l) => l,
            Some(l) => {
                eprintln!(
                    "{} ({l})",
                    self.translations.translate(&default_locale, "InvalidLanguage")
                );
                default_locale
            }
            None => default_locale,
        };

        let country = country
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.config.countries.default_country.clone());

        Session::new(country, locale)
    }
}

/// Webhook when configured, log channel otherwise
fn build_channel(config: &Config) -> Result<SharedChannel> {
    if config.notifications.webhook_url.is_none() {
        tracing::warn!("No webhook configured, notifications go to the log");
        return Ok(Arc::new(LogChannel::new()));
    }

    let webhook_config = WebhookConfig::try_from(&config.notifications)?;
    let channel = WebhookChannel::new(webhook_config).context("Invalid webhook configuration")?;
    Ok(Arc::new(channel))
}
