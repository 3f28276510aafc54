// ================================================================
// File: velxebot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Roblox API error: {0}")]
    Oracle(String),

    #[error("No Roblox user found with username '{0}'")]
    IdentityNotFound(String),

    #[error("Already linked to Roblox account '{username}' ({roblox_id})")]
    AlreadyLinked { roblox_id: String, username: String },

    #[error("No verified Roblox account linked")]
    NotLinked,

    #[error("No pending link request")]
    NoPendingLink,

    #[error("Verification code not found in profile bio")]
    BioCheckFailed,

    #[error("License already held for product '{0}'")]
    DuplicateLicense(String),

    #[error("Invalid duration '{0}': expected a number followed by s, m, h or d")]
    InvalidDuration(String),

    #[error("Winner count {0} is out of range (1-10)")]
    InvalidWinnerCount(u32),

    #[error("Not authorized")]
    Unauthorized,

    #[error("Product '{0}' is not for sale")]
    NotForSale(String),

    #[error("No download configured for product '{0}'")]
    MissingDownload(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}
