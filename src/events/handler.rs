//! Vacated-channel handling.

use async_trait::async_trait;

use crate::events::VacatedChannel;

/// Receives private channels that just lost their last subscriber.
#[async_trait]
pub trait ChannelHandler: Send + Sync {
    /// `channel_type` is the `<type>` segment of `private-<type>-...`.
    async fn handle_vacated_channel(
        &self,
        channel_type: &str,
        event: &VacatedChannel,
        time_ms: Option<u64>,
    );
}

/// Records vacated channels in the log and nothing else.
#[derive(Debug, Default, Clone)]
pub struct LoggingChannelHandler;

#[async_trait]
impl ChannelHandler for LoggingChannelHandler {
    async fn handle_vacated_channel(
        &self,
        channel_type: &str,
        event: &VacatedChannel,
        time_ms: Option<u64>,
    ) {
        tracing::info!(
            channel_type = %channel_type,
            channel = %event.channel,
            time_ms = ?time_ms,
            "Channel vacated"
        );
    }
}
