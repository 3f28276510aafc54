use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use velxebot_common::traits::platform_traits::IdentityOracle;

use crate::Error;

const USERS_API: &str = "https://users.roblox.com/v1";
const INVENTORY_API: &str = "https://inventory.roblox.com/v1";

/// Client for the public (unauthenticated) Roblox web APIs.
pub struct RobloxClient {
    http_client: Client,
}

/// Request body for `POST /usernames/users`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UsernameLookupJson<'a> {
    usernames: [&'a str; 1],
    exclude_banned_users: bool,
}

#[derive(Debug, Deserialize, Default)]
struct UsernameLookupResponseJson {
    #[serde(default)]
    data: Vec<UsernameMatchJson>,
}

#[derive(Debug, Deserialize)]
struct UsernameMatchJson {
    id: u64,
}

/// JSON shape for `GET /users/{userId}`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct UserDetailsJson {
    name: String,
    description: String,
}

/// JSON shape for `GET /users/{userId}/items/GamePass/{gamepassId}`. Item
/// contents are irrelevant; a non-empty `data` array means "owned".
#[derive(Debug, Deserialize, Default)]
struct GamepassInventoryJson {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

impl RobloxClient {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::ClientBuilder::new()
            .user_agent("VelxeBot/1.0")
            .build()
            .map_err(|e| Error::Oracle(format!("Failed to build reqwest client: {e}")))?;

        Ok(Self {
            http_client: client,
        })
    }

    async fn fetch_user_details(&self, roblox_id: &str) -> Result<UserDetailsJson, Error> {
        let url = format!("{USERS_API}/users/{roblox_id}");
        let resp = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Oracle(format!("GET /users/{roblox_id}: request failed => {e}")))?;

        if !resp.status().is_success() {
            let st = resp.status();
            let txt = resp.text().await.unwrap_or_default();
            return Err(Error::Oracle(format!(
                "Roblox GET /users/{roblox_id} => HTTP {st}, {txt}"
            )));
        }

        let parsed: UserDetailsJson = resp
            .json()
            .await
            .map_err(|e| Error::Oracle(format!("Parsing UserDetailsJson => {e}")))?;
        Ok(parsed)
    }
}

#[async_trait]
impl IdentityOracle for RobloxClient {
    async fn resolve_username(&self, username: &str) -> Result<Option<String>, Error> {
        let url = format!("{USERS_API}/usernames/users");
        let body = UsernameLookupJson {
            usernames: [username],
            exclude_banned_users: true,
        };

        let resp = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Oracle(format!("POST /usernames/users: request failed => {e}")))?;

        if !resp.status().is_success() {
            let st = resp.status();
            let txt = resp.text().await.unwrap_or_default();
            return Err(Error::Oracle(format!(
                "Roblox POST /usernames/users => HTTP {st}, {txt}"
            )));
        }

        let parsed: UsernameLookupResponseJson = resp
            .json()
            .await
            .map_err(|e| Error::Oracle(format!("Parsing UsernameLookupResponseJson => {e}")))?;

        Ok(parsed.data.first().map(|m| m.id.to_string()))
    }

    async fn get_profile_bio(&self, roblox_id: &str) -> Result<String, Error> {
        Ok(self.fetch_user_details(roblox_id).await?.description)
    }

    async fn get_username(&self, roblox_id: &str) -> Result<String, Error> {
        let details = self.fetch_user_details(roblox_id).await?;
        if details.name.is_empty() {
            return Err(Error::Oracle(format!(
                "Roblox user {roblox_id} came back with no username"
            )));
        }
        Ok(details.name)
    }

    async fn has_gamepass(&self, roblox_id: &str, gamepass_id: u64) -> Result<bool, Error> {
        let url = format!("{INVENTORY_API}/users/{roblox_id}/items/GamePass/{gamepass_id}");
        let resp = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                Error::Oracle(format!("GET gamepass inventory: request failed => {e}"))
            })?;

        if !resp.status().is_success() {
            let st = resp.status();
            let txt = resp.text().await.unwrap_or_default();
            return Err(Error::Oracle(format!(
                "Roblox GET inventory/GamePass/{gamepass_id} => HTTP {st}, {txt}"
            )));
        }

        let parsed: GamepassInventoryJson = resp
            .json()
            .await
            .map_err(|e| Error::Oracle(format!("Parsing GamepassInventoryJson => {e}")))?;

        Ok(!parsed.data.is_empty())
    }
}
