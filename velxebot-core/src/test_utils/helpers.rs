// File: velxebot-core/src/test_utils/helpers.rs

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;

use velxebot_common::models::identity::LinkedIdentity;
use velxebot_common::models::product::{Catalog, DownloadRef, Product, ProductStatus};

use crate::auth::StaticAuthorizer;
use crate::db::Database;
use crate::repositories::{SqliteLicenseRepository, SqliteLinkedIdentityRepository};
use crate::services::{
    EventHandler, GiveawayService, LicenseService, LinkService, PurchaseService,
};
use crate::test_utils::mocks::{MockNotifier, MockOracle, MockScheduler};
use crate::Error;

/// Returns a migrated, empty in-memory database.
///
/// A fresh `sqlite::memory:` database exists per connection, so the pool is
/// pinned to a single connection that never expires.
pub async fn setup_test_database() -> Result<Database, Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    let db = Database::from_pool(pool);
    db.migrate().await?;
    Ok(db)
}

/// A small catalog covering every product shape the engines care about.
pub fn sample_catalog() -> Result<Catalog, Error> {
    Catalog::new(vec![
        Product {
            name: "Crate Spawner".to_string(),
            info: "Spawns supply crates on a timer.".to_string(),
            description: "Drop-in crate spawner system with loot tables.".to_string(),
            buyable: true,
            is_free: false,
            gamepass_id: Some(111),
            status: ProductStatus::Available,
            download: Some(DownloadRef::Url(
                "https://files.velxe.example/crate-spawner.rbxm".to_string(),
            )),
        },
        Product {
            name: "Starter Pack".to_string(),
            info: "Free starter assets.".to_string(),
            description: "A free bundle of starter assets.".to_string(),
            buyable: true,
            is_free: true,
            gamepass_id: None,
            status: ProductStatus::Available,
            download: Some(DownloadRef::File("starter_pack.rbxm".to_string())),
        },
        Product {
            name: "Night Vision".to_string(),
            info: "Preorder: night vision overlay.".to_string(),
            description: "Screen-space night vision, shipping soon.".to_string(),
            buyable: true,
            is_free: false,
            gamepass_id: Some(222),
            status: ProductStatus::Preorder,
            download: None,
        },
        Product {
            name: "Terrain Tools".to_string(),
            info: "In development.".to_string(),
            description: "Terrain sculpting toolkit, not yet purchasable.".to_string(),
            buyable: false,
            is_free: false,
            gamepass_id: Some(333),
            status: ProductStatus::Development,
            download: None,
        },
        Product {
            name: "Radio Kit".to_string(),
            info: "Walkie-talkie system.".to_string(),
            description: "Proximity radio kit. Download pending upload.".to_string(),
            buyable: true,
            is_free: false,
            gamepass_id: Some(444),
            status: ProductStatus::Available,
            download: None,
        },
        Product {
            name: "Legacy Bundle".to_string(),
            info: "Old asset bundle.".to_string(),
            description: "Legacy assets with no store listing yet.".to_string(),
            buyable: true,
            is_free: false,
            gamepass_id: None,
            status: ProductStatus::Available,
            download: Some(DownloadRef::Url(
                "https://files.velxe.example/legacy-bundle.zip".to_string(),
            )),
        },
    ])
}

/// Everything a service-level test needs, wired over one in-memory database.
pub struct TestContext {
    pub catalog: Catalog,
    pub db: Database,
    pub identity_repo: Arc<SqliteLinkedIdentityRepository>,
    pub license_repo: Arc<SqliteLicenseRepository>,
    pub oracle: Arc<MockOracle>,
    pub notifier: Arc<MockNotifier>,
    pub scheduler: Arc<MockScheduler>,
    pub link_service: Arc<LinkService>,
    pub license_service: Arc<LicenseService>,
    pub purchase_service: Arc<PurchaseService>,
    pub giveaway_service: Arc<GiveawayService>,
}

impl TestContext {
    pub async fn new() -> Result<Self, Error> {
        Self::with_catalog(sample_catalog()?).await
    }

    pub async fn with_catalog(catalog: Catalog) -> Result<Self, Error> {
        let db = setup_test_database().await?;
        let identity_repo = Arc::new(SqliteLinkedIdentityRepository::new(db.pool().clone()));
        let license_repo = Arc::new(SqliteLicenseRepository::new(db.pool().clone()));

        let oracle = Arc::new(MockOracle::default());
        let notifier = Arc::new(MockNotifier::default());
        let scheduler = Arc::new(MockScheduler::default());

        let link_service = Arc::new(LinkService::new(identity_repo.clone(), oracle.clone()));
        let license_service = Arc::new(LicenseService::new(license_repo.clone()));
        let purchase_service = Arc::new(PurchaseService::new(
            catalog.clone(),
            link_service.clone(),
            license_service.clone(),
            oracle.clone(),
            notifier.clone(),
        ));
        let giveaway_service = Arc::new(GiveawayService::new(
            catalog.clone(),
            link_service.clone(),
            license_service.clone(),
            notifier.clone(),
            scheduler.clone(),
        ));

        Ok(Self {
            catalog,
            db,
            identity_repo,
            license_repo,
            oracle,
            notifier,
            scheduler,
            link_service,
            license_service,
            purchase_service,
            giveaway_service,
        })
    }

    /// Builds the dispatcher with the given moderator allowlist.
    pub fn handler(&self, moderators: &[&str]) -> EventHandler {
        EventHandler::new(
            self.catalog.clone(),
            Arc::new(StaticAuthorizer::new(moderators.iter().copied())),
            self.notifier.clone(),
            self.link_service.clone(),
            self.license_service.clone(),
            self.purchase_service.clone(),
            self.giveaway_service.clone(),
        )
    }

    /// Registers `username` with the oracle and walks the full link flow
    /// through to a verified identity.
    pub async fn seed_verified_user(
        &self,
        discord_id: &str,
        roblox_id: &str,
        username: &str,
    ) -> Result<LinkedIdentity, Error> {
        self.oracle.add_user(username, roblox_id);
        let pending = self.link_service.request_link(discord_id, username).await?;
        self.oracle.set_bio(
            roblox_id,
            &format!("Verifying my account: {}", pending.verification_code),
        );
        self.link_service.confirm_link(discord_id).await
    }
}
