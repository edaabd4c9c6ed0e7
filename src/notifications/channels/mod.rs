//! Notification channels for delivering competition messages
//!
//! This module provides the channels a formatted delivery can be sent
//! through: a chat webhook and the application log.

pub mod log;
pub mod webhook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::notifications::Outbound;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Endpoint rejected the delivery
    #[error("Rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error
    #[error("Channel error: {0}")]
    Other(String),
}

impl ChannelError {
    /// Client errors (4xx) will not succeed on retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::Other(_) => true,
            Self::Rejected { status, .. } => !(400..500).contains(status) || *status == 429,
            Self::InvalidConfig(_) | Self::SerializationError(_) => false,
        }
    }
}

/// Response from sending a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Whether the notification was accepted by the sink
    pub success: bool,
    /// Channel that delivered (or failed to deliver) the notification
    pub channel: String,
    /// Optional message about the delivery
    pub message: Option<String>,
    /// Timestamp of delivery attempt
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a successful delivery status
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a successful delivery status with a message
    pub fn success_with_message(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a failed delivery status
    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// Trait for notification channels
///
/// Implement this trait to create custom notification channels.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Send a delivery through this channel
    async fn send(&self, outbound: &Outbound) -> ChannelResult<DeliveryStatus>;
}

/// Thread-safe shared channel
pub type SharedChannel = Arc<dyn Channel>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_success() {
        let status = DeliveryStatus::success("webhook");
        assert!(status.success);
        assert_eq!(status.channel, "webhook");
        assert!(status.message.is_none());
    }

    #[test]
    fn test_delivery_status_failure() {
        let status = DeliveryStatus::failure("webhook", "Connection timeout");
        assert!(!status.success);
        assert_eq!(status.message, Some("Connection timeout".to_string()));
    }

    #[test]
    fn test_delivery_status_display() {
        let success = DeliveryStatus::success_with_message("webhook", "Delivered");
        assert!(success.to_string().contains("SUCCESS"));
        assert!(success.to_string().contains("webhook"));

        let failure = DeliveryStatus::failure("log", "closed");
        assert!(failure.to_string().contains("FAILED"));
        assert!(failure.to_string().contains("closed"));
    }

    #[test]
    fn test_channel_error_recoverable() {
        let rejected = |status| ChannelError::Rejected {
            status,
            body: String::new(),
        };
        assert!(!rejected(400).is_recoverable());
        assert!(!rejected(404).is_recoverable());
        assert!(rejected(429).is_recoverable());
        assert!(rejected(503).is_recoverable());
        assert!(!ChannelError::InvalidConfig("x".into()).is_recoverable());
    }
}
