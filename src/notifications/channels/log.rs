//! Log channel
//!
//! Writes deliveries to the tracing log. Used when no webhook is configured
//! so a cycle still reports what it would have announced.

use async_trait::async_trait;

use super::{Channel, ChannelResult, DeliveryStatus};
use crate::notifications::Outbound;

/// Channel that writes each delivery as an `info` event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Channel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, outbound: &Outbound) -> ChannelResult<DeliveryStatus> {
        if let Some(content) = &outbound.content {
            tracing::info!(target: "cubewatch::notify", "{content}");
        }
        for block in &outbound.blocks {
            tracing::info!(target: "cubewatch::notify", "{}", block.to_text());
        }

        Ok(DeliveryStatus::success_with_message(
            "log",
            format!("{} block(s) logged", outbound.blocks.len()),
        ))
    }
}
