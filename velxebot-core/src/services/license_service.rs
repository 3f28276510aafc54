use std::sync::Arc;

use tracing::info;

use velxebot_common::models::license::{License, NewLicense};
use velxebot_common::traits::repository_traits::LicenseRepository;

use crate::Error;

/// The license ledger: every grant, lookup and revoke goes through here.
pub struct LicenseService {
    license_repo: Arc<dyn LicenseRepository>,
}

impl LicenseService {
    pub fn new(license_repo: Arc<dyn LicenseRepository>) -> Self {
        Self { license_repo }
    }

    pub async fn has_license(&self, discord_id: &str, product_name: &str) -> Result<bool, Error> {
        Ok(self
            .license_repo
            .find_license(discord_id, product_name)
            .await?
            .is_some())
    }

    /// Records a grant. The duplicate check and the insert are separate
    /// statements; two near-simultaneous grants for the same pair can both
    /// pass the check. Duplicates are reconciled offline, not prevented here.
    pub async fn grant(
        &self,
        discord_id: &str,
        roblox_id: &str,
        roblox_username: &str,
        product_name: &str,
    ) -> Result<License, Error> {
        if self.has_license(discord_id, product_name).await? {
            return Err(Error::DuplicateLicense(product_name.to_string()));
        }

        let license = self
            .license_repo
            .insert_license(&NewLicense::new(
                discord_id,
                roblox_id,
                roblox_username,
                product_name,
            ))
            .await?;

        info!(
            "License #{} granted: {} -> '{}'",
            license.id, discord_id, product_name
        );
        Ok(license)
    }

    pub async fn revoke(&self, license_id: i64) -> Result<(), Error> {
        if self.license_repo.delete_license(license_id).await? {
            info!("License #{license_id} revoked");
            Ok(())
        } else {
            Err(Error::NotFound(format!("license {license_id}")))
        }
    }

    /// Owner-scoped lookup used by file retrieval.
    pub async fn find_for_user(
        &self,
        license_id: i64,
        discord_id: &str,
    ) -> Result<Option<License>, Error> {
        self.license_repo
            .get_license_for_user(license_id, discord_id)
            .await
    }

    pub async fn list_for_user(&self, discord_id: &str) -> Result<Vec<License>, Error> {
        self.license_repo.list_licenses_for_user(discord_id).await
    }

    pub async fn list_all(&self, limit: i64) -> Result<Vec<License>, Error> {
        self.license_repo.list_all_licenses(limit).await
    }

    /// Moderator search; `query` may be a Discord id or a Roblox id.
    pub async fn search(&self, query: &str) -> Result<Vec<License>, Error> {
        self.license_repo.search_licenses(query).await
    }
}
