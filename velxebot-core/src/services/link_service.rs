use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use velxebot_common::models::identity::LinkedIdentity;
use velxebot_common::traits::platform_traits::IdentityOracle;
use velxebot_common::traits::repository_traits::LinkedIdentityRepository;

use crate::Error;

/// Prefix carried by every bio challenge code we hand out.
pub const VERIFICATION_CODE_PREFIX: &str = "Velxe-";

/// Links Discord users to Roblox accounts via the bio challenge.
pub struct LinkService {
    identity_repo: Arc<dyn LinkedIdentityRepository>,
    oracle: Arc<dyn IdentityOracle>,
}

impl LinkService {
    pub fn new(
        identity_repo: Arc<dyn LinkedIdentityRepository>,
        oracle: Arc<dyn IdentityOracle>,
    ) -> Self {
        Self {
            identity_repo,
            oracle,
        }
    }

    /// Starts (or restarts) a link request for `discord_id` claiming
    /// `username`. Any earlier pending request is replaced; a verified link
    /// is reported back instead of being overwritten.
    pub async fn request_link(
        &self,
        discord_id: &str,
        username: &str,
    ) -> Result<LinkedIdentity, Error> {
        // 1) A verified link has to be unlinked explicitly first.
        if let Some(existing) = self.identity_repo.get_verified_identity(discord_id).await? {
            return Err(Error::AlreadyLinked {
                roblox_id: existing.roblox_id,
                username: existing.roblox_username,
            });
        }

        // 2) Resolve the claimed username. A lookup outage reads the same
        //    as "no such user" to the caller; the transport error is logged.
        let roblox_id = match self.oracle.resolve_username(username).await {
            Ok(Some(id)) => id,
            Ok(None) => return Err(Error::IdentityNotFound(username.to_string())),
            Err(e) => {
                warn!("resolve_username('{username}') failed => {e}");
                return Err(Error::IdentityNotFound(username.to_string()));
            }
        };

        // 3) Issue a fresh code and store the pending claim.
        let code = generate_verification_code();
        let identity = LinkedIdentity::pending(discord_id, &roblox_id, username, &code);
        self.identity_repo.upsert_identity(&identity).await?;

        info!("Link requested: discord={discord_id} roblox={roblox_id} ({username})");
        Ok(identity)
    }

    /// Checks the profile bio for the pending code and marks the link
    /// verified. The bio is consulted on every call, so repeating a
    /// successful confirmation succeeds again; a failed recheck leaves the
    /// stored row untouched.
    pub async fn confirm_link(&self, discord_id: &str) -> Result<LinkedIdentity, Error> {
        let Some(mut identity) = self.identity_repo.get_identity(discord_id).await? else {
            return Err(Error::NoPendingLink);
        };

        match self.oracle.get_profile_bio(&identity.roblox_id).await {
            Ok(bio) if bio.contains(&identity.verification_code) => {
                self.identity_repo.mark_verified(discord_id).await?;
                identity.verified = true;
                info!(
                    "Link verified: discord={discord_id} roblox={}",
                    identity.roblox_id
                );
                Ok(identity)
            }
            Ok(_) => Err(Error::BioCheckFailed),
            Err(e) => {
                warn!("get_profile_bio({}) failed => {e}", identity.roblox_id);
                Err(Error::BioCheckFailed)
            }
        }
    }

    /// First half of the unlink flow: returns the identity for the
    /// confirmation prompt without touching state.
    pub async fn begin_unlink(&self, discord_id: &str) -> Result<LinkedIdentity, Error> {
        self.identity_repo
            .get_verified_identity(discord_id)
            .await?
            .ok_or(Error::NotLinked)
    }

    /// Second half of the unlink flow: deletes the link row.
    pub async fn confirm_unlink(&self, discord_id: &str) -> Result<(), Error> {
        if self.identity_repo.delete_identity(discord_id).await? {
            info!("Unlinked discord={discord_id}");
            Ok(())
        } else {
            Err(Error::NotLinked)
        }
    }

    /// The stored link row for a user, verified or not.
    pub async fn identity(&self, discord_id: &str) -> Result<Option<LinkedIdentity>, Error> {
        self.identity_repo.get_identity(discord_id).await
    }

    /// The verified link for a user, used to gate store access.
    pub async fn verified_identity(
        &self,
        discord_id: &str,
    ) -> Result<Option<LinkedIdentity>, Error> {
        self.identity_repo.get_verified_identity(discord_id).await
    }
}

/// Generates a fresh `Velxe-XXXX` bio challenge code. Four uppercase
/// letters; collisions are tolerable because the code only ever proves
/// control of one specific profile.
pub fn generate_verification_code() -> String {
    let mut rng = rand::rng();
    let letters: String = (0..4)
        .map(|_| rng.random_range(b'A'..=b'Z') as char)
        .collect();
    format!("{VERIFICATION_CODE_PREFIX}{letters}")
}
