use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Discord user's claim on a Roblox account. At most one row exists per
/// `discord_id`; `verified` flips to true once the bio challenge passed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LinkedIdentity {
    pub discord_id: String,
    pub roblox_id: String,
    pub roblox_username: String,
    pub verification_code: String,
    pub verified: bool,
    pub link_date: DateTime<Utc>,
}

impl LinkedIdentity {
    /// A fresh, unverified claim carrying a newly issued challenge code.
    pub fn pending(
        discord_id: &str,
        roblox_id: &str,
        roblox_username: &str,
        verification_code: &str,
    ) -> Self {
        Self {
            discord_id: discord_id.to_string(),
            roblox_id: roblox_id.to_string(),
            roblox_username: roblox_username.to_string(),
            verification_code: verification_code.to_string(),
            verified: false,
            link_date: Utc::now(),
        }
    }
}
