use async_trait::async_trait;

use crate::error::Error;

/// Read-only questions the bot asks the Roblox platform. Failures surface
/// immediately; retry policy is the caller's decision.
#[async_trait]
pub trait IdentityOracle: Send + Sync {
    /// Resolves a username to its Roblox user id, or `None` when no
    /// (non-banned) account matches.
    async fn resolve_username(&self, username: &str) -> Result<Option<String>, Error>;

    /// The profile "About" text for a user.
    async fn get_profile_bio(&self, roblox_id: &str) -> Result<String, Error>;

    /// The account's current username.
    async fn get_username(&self, roblox_id: &str) -> Result<String, Error>;

    /// Whether the user owns the given gamepass.
    async fn has_gamepass(&self, roblox_id: &str, gamepass_id: u64) -> Result<bool, Error>;
}

/// Outbound messages. Implemented by the embedding chat process; the core
/// treats delivery failures as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Direct message to one user.
    async fn notify_user(&self, discord_id: &str, message: &str) -> Result<(), Error>;

    /// Public message to a channel.
    async fn announce(&self, channel_ref: &str, message: &str) -> Result<(), Error>;
}

/// Answers whether a user may run moderator commands. The embedding process
/// resolves roles however it likes.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, discord_id: &str) -> bool;
}
