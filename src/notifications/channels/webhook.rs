//! Webhook notification channel
//!
//! This module posts deliveries to a chat webhook (Discord-compatible
//! `{content, embeds}` payloads) via HTTP POST requests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::config::NotificationsConfig;
use crate::notifications::{Field, Message, Outbound};
use crate::utils::truncate_text;

/// Embeds accepted per webhook request
pub const MAX_EMBEDS_PER_REQUEST: usize = 10;

/// Characters accepted in one request's `content`
pub const MAX_CONTENT_CHARS: usize = 2000;

const MAX_TITLE_CHARS: usize = 256;
const MAX_FIELD_CHARS: usize = 1024;

/// Webhook channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retry attempts on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_base_delay_ms: u64,
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    1000
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            retry_base_delay_ms: default_retry_delay(),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set backoff base delay
    pub fn with_retry_delay(mut self, retry_base_delay_ms: u64) -> Self {
        self.retry_base_delay_ms = retry_base_delay_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Webhook URL cannot be empty".to_string());
        }

        // Basic URL validation
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl TryFrom<&NotificationsConfig> for WebhookConfig {
    type Error = ChannelError;

    fn try_from(config: &NotificationsConfig) -> Result<Self, Self::Error> {
        let url = config
            .webhook_url
            .clone()
            .ok_or_else(|| ChannelError::InvalidConfig("webhook_url is not set".to_string()))?;

        Ok(Self::new(url)
            .with_timeout(config.timeout_secs)
            .with_max_retries(config.max_retries))
    }
}

/// Webhook notification channel
///
/// # Payload Format
///
/// ```json
/// {
///   "content": "New competitions are available! (1)",
///   "embeds": [
///     {
///       "title": "Santiago Open 2024",
///       "url": "https://www.worldcubeassociation.org/competitions/SantiagoOpen2024",
///       "fields": [
///         { "name": "Location", "value": "Santiago", "inline": true },
///         { "name": "Date", "value": "10/06/2024", "inline": true }
///       ]
///     }
///   ]
/// }
/// ```
///
/// Deliveries with more than ten blocks are split over several requests;
/// the text content travels with the first one.
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    /// Create a new webhook channel
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create a simple webhook channel with just a URL
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    /// Get the webhook URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Build the request payloads for a delivery
    ///
    /// Long content is sent as several text requests; the last content chunk
    /// rides along with the first batch of embeds.
    fn build_payloads(&self, outbound: &Outbound) -> Vec<serde_json::Value> {
        let mut content = outbound
            .content
            .as_deref()
            .map(|text| split_content(text, MAX_CONTENT_CHARS))
            .unwrap_or_default();

        if outbound.blocks.is_empty() {
            if content.is_empty() {
                return vec![serde_json::json!({ "content": outbound.content })];
            }
            return content
                .into_iter()
                .map(|chunk| serde_json::json!({ "content": chunk }))
                .collect();
        }

        let mut attached = content.pop();
        let mut payloads: Vec<serde_json::Value> = content
            .into_iter()
            .map(|chunk| serde_json::json!({ "content": chunk }))
            .collect();

        payloads.extend(outbound.blocks.chunks(MAX_EMBEDS_PER_REQUEST).map(|chunk| {
            serde_json::json!({
                "content": attached.take(),
                "embeds": chunk.iter().map(embed).collect::<Vec<_>>(),
            })
        }));
        payloads
    }

    /// Send the request with retry logic
    async fn send_with_retry(&self, payload: &serde_json::Value) -> ChannelResult<()> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.retry_base_delay_ms * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                tracing::debug!(
                    attempt = attempt + 1,
                    max = self.config.max_retries + 1,
                    "Retrying webhook request"
                );
            }

            match self.client.post(&self.config.url).json(payload).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        tracing::debug!(status = %status, "Webhook delivered");
                        return Ok(());
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read response body".to_string());
                    let error = ChannelError::Rejected {
                        status: status.as_u16(),
                        body,
                    };

                    // Don't retry on client errors (4xx)
                    if !error.is_recoverable() {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(e) => {
                    last_error = Some(ChannelError::HttpError(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ChannelError::Other("Unknown error".to_string())))
    }
}

/// Split `text` into chunks of at most `max` characters
///
/// Chunks break between `\n\n`-separated entries. An entry longer than `max`
/// is cut on character boundaries.
fn split_content(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for entry in text.split("\n\n") {
        let len = entry.chars().count();

        if len > max {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = entry.chars().collect();
            chunks.extend(chars.chunks(max).map(|part| part.iter().collect::<String>()));
            continue;
        }

        if current.is_empty() {
            current.push_str(entry);
            current_len = len;
        } else if current_len + 2 + len > max {
            chunks.push(std::mem::replace(&mut current, entry.to_string()));
            current_len = len;
        } else {
            current.push_str("\n\n");
            current.push_str(entry);
            current_len += 2 + len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Discord embed object for a block
fn embed(message: &Message) -> serde_json::Value {
    let fields: Vec<Field> = message
        .fields
        .iter()
        .map(|f| {
            Field::new(
                truncate_text(&f.name, MAX_TITLE_CHARS),
                truncate_text(&f.value, MAX_FIELD_CHARS),
                f.inline,
            )
        })
        .collect();

    let mut embed = serde_json::json!({
        "title": message.title.as_deref().map(|t| truncate_text(t, MAX_TITLE_CHARS)),
        "url": message.url,
        "description": message.description,
        "fields": fields,
    });
    if let Some(footer) = &message.footer {
        embed["footer"] = serde_json::json!({ "text": footer });
    }
    embed
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, outbound: &Outbound) -> ChannelResult<DeliveryStatus> {
        let payloads = self.build_payloads(outbound);
        let requests = payloads.len();

        for payload in &payloads {
            if let Err(e) = self.send_with_retry(payload).await {
                tracing::error!(error = %e, "Failed to deliver webhook");
                return Ok(DeliveryStatus::failure("webhook", e.to_string()));
            }
        }

        tracing::info!(requests, blocks = outbound.blocks.len(), "Webhook delivered");
        Ok(DeliveryStatus::success_with_message(
            "webhook",
            format!("Delivered in {requests} request(s)"),
        ))
    }
}
