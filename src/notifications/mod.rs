//! Notification formatting and delivery
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │      NotificationFormatter                 │
//! │  - Translated labels                       │
//! │  - One block per competition or combined   │
//! │  - Paginated current-competitions view     │
//! └────────────────────────────────────────────┘
//!                     │  Outbound
//!             ┌───────┴───────┐
//!             ▼               ▼
//!       ┌─────────┐     ┌─────────┐
//!       │ Webhook │     │   Log   │
//!       │ Channel │     │ Channel │
//!       └─────────┘     └─────────┘
//! ```
//!
//! Channels are write-only sinks: a send is either accepted or failed.

pub mod channels;
pub mod formatter;
pub mod pagination;

use serde::{Deserialize, Serialize};

// Re-exports
pub use channels::log::LogChannel;
pub use channels::webhook::WebhookChannel;
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus, SharedChannel};
pub use formatter::NotificationFormatter;
pub use pagination::{Control, Controls, Paginator};

/// Labelled value inside a message block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// Rich message block (rendered as an embed by chat webhooks)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Message {
    /// Plain-text rendering, one line per element
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        match (&self.title, &self.url) {
            (Some(title), Some(url)) => lines.push(format!("{title} <{url}>")),
            (Some(title), None) => lines.push(title.clone()),
            (None, Some(url)) => lines.push(url.clone()),
            (None, None) => {}
        }
        if let Some(description) = &self.description {
            lines.push(description.clone());
        }
        for field in &self.fields {
            if field.name.is_empty() {
                lines.push(field.value.clone());
            } else {
                lines.push(format!("{}: {}", field.name, field.value));
            }
        }
        if let Some(footer) = &self.footer {
            lines.push(footer.clone());
        }

        lines.join("\n")
    }
}

/// One delivery: optional text plus ordered blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Message>,
}

impl Outbound {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            blocks: Vec::new(),
        }
    }

    pub fn with_blocks(content: Option<String>, blocks: Vec<Message>) -> Self {
        Self { content, blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty) && self.blocks.is_empty()
    }

    /// Plain-text rendering of the whole delivery
    pub fn to_text(&self) -> String {
        let mut parts: Vec<String> = self.content.iter().cloned().collect();
        parts.extend(self.blocks.iter().map(Message::to_text));
        parts.join("\n\n")
    }
}
