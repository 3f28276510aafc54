use async_trait::async_trait;

use crate::error::Error;
use crate::models::identity::LinkedIdentity;
use crate::models::license::{License, NewLicense};

#[async_trait]
pub trait LinkedIdentityRepository: Send + Sync {
    /// Inserts or wholesale-replaces the row for `identity.discord_id`.
    async fn upsert_identity(&self, identity: &LinkedIdentity) -> Result<(), Error>;

    async fn get_identity(&self, discord_id: &str) -> Result<Option<LinkedIdentity>, Error>;

    /// Like `get_identity`, but only returns a row that passed verification.
    async fn get_verified_identity(&self, discord_id: &str)
        -> Result<Option<LinkedIdentity>, Error>;

    async fn mark_verified(&self, discord_id: &str) -> Result<(), Error>;

    /// Returns whether a row was actually removed.
    async fn delete_identity(&self, discord_id: &str) -> Result<bool, Error>;
}

#[async_trait]
pub trait LicenseRepository: Send + Sync {
    /// Returns the stored row including the storage-assigned license id.
    async fn insert_license(&self, license: &NewLicense) -> Result<License, Error>;

    async fn get_license(&self, license_id: i64) -> Result<Option<License>, Error>;

    /// Owner-scoped lookup; misses when the license belongs to someone else.
    async fn get_license_for_user(
        &self,
        license_id: i64,
        discord_id: &str,
    ) -> Result<Option<License>, Error>;

    /// The one license a user holds for a product, if any.
    async fn find_license(
        &self,
        discord_id: &str,
        product_name: &str,
    ) -> Result<Option<License>, Error>;

    /// Returns whether a row was actually removed.
    async fn delete_license(&self, license_id: i64) -> Result<bool, Error>;

    /// All licenses for one user, newest first.
    async fn list_licenses_for_user(&self, discord_id: &str) -> Result<Vec<License>, Error>;

    /// Most recent licenses across all users, newest first.
    async fn list_all_licenses(&self, limit: i64) -> Result<Vec<License>, Error>;

    /// Licenses whose Discord id or Roblox id equals `query`, newest first.
    async fn search_licenses(&self, query: &str) -> Result<Vec<License>, Error>;
}
