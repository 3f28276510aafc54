// File: src/platforms/notifier.rs

use async_trait::async_trait;
use tracing::info;

use velxebot_common::traits::platform_traits::Notifier;

use crate::Error;

/// Notifier that writes outbound messages to the log instead of a chat
/// transport. Useful for tests and headless runs.
#[derive(Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify_user(&self, discord_id: &str, message: &str) -> Result<(), Error> {
        info!("[dm -> {discord_id}] {message}");
        Ok(())
    }

    async fn announce(&self, channel_ref: &str, message: &str) -> Result<(), Error> {
        info!("[channel {channel_ref}] {message}");
        Ok(())
    }
}
