use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One granted product license. Immutable once stored; only a moderator
/// revoke removes it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct License {
    /// Storage-assigned row id, surfaced to users as the license number.
    pub id: i64,
    pub discord_id: String,
    pub roblox_id: String,
    pub roblox_username: String,
    pub product_name: String,
    pub purchase_date: DateTime<Utc>,
}

/// Insert shape for a license grant; the id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewLicense {
    pub discord_id: String,
    pub roblox_id: String,
    pub roblox_username: String,
    pub product_name: String,
    pub purchase_date: DateTime<Utc>,
}

impl NewLicense {
    pub fn new(
        discord_id: &str,
        roblox_id: &str,
        roblox_username: &str,
        product_name: &str,
    ) -> Self {
        Self {
            discord_id: discord_id.to_string(),
            roblox_id: roblox_id.to_string(),
            roblox_username: roblox_username.to_string(),
            product_name: product_name.to_string(),
            purchase_date: Utc::now(),
        }
    }
}
