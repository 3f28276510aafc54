use std::sync::Arc;

use tracing::{debug, warn};

use velxebot_common::models::giveaway::{EntryOutcome, Giveaway};
use velxebot_common::models::identity::LinkedIdentity;
use velxebot_common::models::license::License;
use velxebot_common::models::product::{Catalog, DownloadRef, Product, ProductStatus};
use velxebot_common::traits::platform_traits::{Authorizer, Notifier};

use crate::services::giveaway_service::GiveawayService;
use crate::services::license_service::LicenseService;
use crate::services::link_service::LinkService;
use crate::services::purchase_service::{
    BeginOutcome, ExternalPurchase, PurchaseOutcome, PurchaseService,
};
use crate::Error;

/// How many rows the moderator panel shows.
const MOD_PANEL_LIMIT: i64 = 10;

/// One parsed inbound intent, already stripped of transport details. The
/// acting user arrives separately.
#[derive(Debug, Clone)]
pub enum CommandEvent {
    Products,
    Link { username: String },
    ConfirmLink,
    Unlink,
    ConfirmUnlink,
    CancelUnlink,
    Profile { target: Option<String> },
    Give { target: String },
    GiveProduct { target: String, product: String },
    Retrieve,
    RetrieveFile { owner: String, license_id: i64 },
    ModPanel,
    ModSearch { query: String },
    RevokeLicense { license_id: i64 },
    Buy { owner: String, product: String },
    CancelBuy { owner: String },
    ConfirmBuy { owner: String },
    PurchaseDone { owner: String },
    HostGiveaway {
        channel_ref: String,
        message_ref: String,
        product: String,
        duration: String,
        winners: Option<u32>,
    },
}

/// A license plus the catalog status of its product, for the retrieval menu.
#[derive(Debug)]
pub struct RetrieveEntry {
    pub license: License,
    /// `None` when the product has since left the catalog.
    pub status: Option<ProductStatus>,
}

/// Typed view data handed back to the presentation layer. Rendering (embeds,
/// buttons, attachments) happens outside the core.
#[derive(Debug)]
pub enum Reply {
    ProductList { products: Vec<Product> },
    LinkChallenge { identity: LinkedIdentity },
    LinkVerified { identity: LinkedIdentity },
    UnlinkPrompt { identity: LinkedIdentity },
    Unlinked,
    UnlinkCancelled,
    ProfileView {
        target: String,
        identity: Option<LinkedIdentity>,
        licenses: Vec<License>,
    },
    GiveMenu {
        target: String,
        identity: LinkedIdentity,
        products: Vec<Product>,
    },
    Granted { target: String, license: License },
    RetrieveMenu { entries: Vec<RetrieveEntry> },
    FileDelivery {
        license: License,
        status: ProductStatus,
        /// Present only for `Available` products.
        download: Option<DownloadRef>,
    },
    ModPanelView { licenses: Vec<License> },
    SearchResults {
        query: String,
        identity: Option<LinkedIdentity>,
        licenses: Vec<License>,
    },
    Revoked { license_id: i64 },
    CatalogGranted { license: License },
    PurchasePrompt { product: Product },
    PurchaseCancelled,
    ExternalPurchaseRef { purchase: ExternalPurchase },
    PurchaseCompleted { license: License },
    PurchaseFailed { product_name: String },
    GiveawayStarted { giveaway: Giveaway },
}

/// Routes parsed events to the owning engine and shapes the replies.
pub struct EventHandler {
    catalog: Catalog,
    authorizer: Arc<dyn Authorizer>,
    notifier: Arc<dyn Notifier>,
    link_service: Arc<LinkService>,
    license_service: Arc<LicenseService>,
    purchase_service: Arc<PurchaseService>,
    giveaway_service: Arc<GiveawayService>,
}

impl EventHandler {
    pub fn new(
        catalog: Catalog,
        authorizer: Arc<dyn Authorizer>,
        notifier: Arc<dyn Notifier>,
        link_service: Arc<LinkService>,
        license_service: Arc<LicenseService>,
        purchase_service: Arc<PurchaseService>,
        giveaway_service: Arc<GiveawayService>,
    ) -> Self {
        Self {
            catalog,
            authorizer,
            notifier,
            link_service,
            license_service,
            purchase_service,
            giveaway_service,
        }
    }

    /// Handles one command from `user_id`. Moderator-only commands check
    /// authorization before anything else, persistence included.
    pub async fn handle_command(&self, user_id: &str, event: CommandEvent) -> Result<Reply, Error> {
        debug!("handle_command: user={user_id} event={event:?}");
        match event {
            CommandEvent::Products => {
                let products = self.purchase_service.open_catalog(user_id).await?;
                Ok(Reply::ProductList { products })
            }

            CommandEvent::Link { username } => {
                let identity = self.link_service.request_link(user_id, &username).await?;
                Ok(Reply::LinkChallenge { identity })
            }

            CommandEvent::ConfirmLink => {
                let identity = self.link_service.confirm_link(user_id).await?;
                Ok(Reply::LinkVerified { identity })
            }

            CommandEvent::Unlink => {
                let identity = self.link_service.begin_unlink(user_id).await?;
                Ok(Reply::UnlinkPrompt { identity })
            }

            CommandEvent::ConfirmUnlink => {
                self.link_service.confirm_unlink(user_id).await?;
                Ok(Reply::Unlinked)
            }

            // Dismissing the prompt touches nothing.
            CommandEvent::CancelUnlink => Ok(Reply::UnlinkCancelled),

            CommandEvent::Profile { target } => {
                let target = target.unwrap_or_else(|| user_id.to_string());
                let identity = self.link_service.identity(&target).await?;
                let licenses = self.license_service.list_for_user(&target).await?;
                Ok(Reply::ProfileView {
                    target,
                    identity,
                    licenses,
                })
            }

            CommandEvent::Give { target } => {
                self.ensure_authorized(user_id)?;
                let identity = self
                    .link_service
                    .verified_identity(&target)
                    .await?
                    .ok_or(Error::NotLinked)?;
                Ok(Reply::GiveMenu {
                    target,
                    identity,
                    products: self.catalog.products().to_vec(),
                })
            }

            CommandEvent::GiveProduct { target, product } => {
                self.ensure_authorized(user_id)?;
                let product = self
                    .catalog
                    .get(&product)
                    .ok_or_else(|| Error::NotFound(format!("product '{product}'")))?
                    .clone();
                let identity = self
                    .link_service
                    .verified_identity(&target)
                    .await?
                    .ok_or(Error::NotLinked)?;
                let license = self
                    .license_service
                    .grant(
                        &target,
                        &identity.roblox_id,
                        &identity.roblox_username,
                        &product.name,
                    )
                    .await?;
                let text = format!(
                    "A moderator granted you **{}**. License #{} is registered to {}.",
                    product.name, license.id, identity.roblox_username
                );
                if let Err(e) = self.notifier.notify_user(&target, &text).await {
                    warn!("notify_user({target}) failed => {e}");
                }
                Ok(Reply::Granted { target, license })
            }

            CommandEvent::Retrieve => {
                if self
                    .link_service
                    .verified_identity(user_id)
                    .await?
                    .is_none()
                {
                    return Err(Error::NotLinked);
                }
                let licenses = self.license_service.list_for_user(user_id).await?;
                let entries = licenses
                    .into_iter()
                    .map(|license| {
                        let status = self
                            .catalog
                            .get(&license.product_name)
                            .map(|p| p.status);
                        RetrieveEntry { license, status }
                    })
                    .collect();
                Ok(Reply::RetrieveMenu { entries })
            }

            CommandEvent::RetrieveFile { owner, license_id } => {
                // Menus are per-user; a click relayed for someone else's
                // menu is rejected before any lookup.
                if user_id != owner {
                    return Err(Error::Unauthorized);
                }
                let license = self
                    .license_service
                    .find_for_user(license_id, &owner)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("license {license_id}")))?;
                let product = self
                    .catalog
                    .get(&license.product_name)
                    .ok_or_else(|| {
                        Error::NotFound(format!("product '{}'", license.product_name))
                    })?;

                // Development and preorder licenses get a notice instead of
                // a file; an available product must have a download wired.
                let download = match product.status {
                    ProductStatus::Available => Some(
                        product
                            .download
                            .clone()
                            .ok_or_else(|| Error::MissingDownload(product.name.clone()))?,
                    ),
                    _ => None,
                };
                Ok(Reply::FileDelivery {
                    license,
                    status: product.status,
                    download,
                })
            }

            CommandEvent::ModPanel => {
                self.ensure_authorized(user_id)?;
                let licenses = self.license_service.list_all(MOD_PANEL_LIMIT).await?;
                Ok(Reply::ModPanelView { licenses })
            }

            CommandEvent::ModSearch { query } => {
                self.ensure_authorized(user_id)?;
                let licenses = self.license_service.search(&query).await?;
                let identity = self.link_service.identity(&query).await?;
                Ok(Reply::SearchResults {
                    query,
                    identity,
                    licenses,
                })
            }

            CommandEvent::RevokeLicense { license_id } => {
                self.ensure_authorized(user_id)?;
                self.license_service.revoke(license_id).await?;
                Ok(Reply::Revoked { license_id })
            }

            CommandEvent::Buy { owner, product } => {
                match self
                    .purchase_service
                    .begin_purchase(user_id, &owner, &product)
                    .await?
                {
                    BeginOutcome::Granted(license) => Ok(Reply::CatalogGranted { license }),
                    BeginOutcome::NeedsConfirmation(product) => {
                        Ok(Reply::PurchasePrompt { product })
                    }
                }
            }

            CommandEvent::CancelBuy { owner } => {
                self.purchase_service.cancel_purchase(user_id, &owner).await?;
                Ok(Reply::PurchaseCancelled)
            }

            CommandEvent::ConfirmBuy { owner } => {
                let purchase = self
                    .purchase_service
                    .confirm_purchase(user_id, &owner)
                    .await?;
                Ok(Reply::ExternalPurchaseRef { purchase })
            }

            CommandEvent::PurchaseDone { owner } => {
                match self
                    .purchase_service
                    .complete_purchase(user_id, &owner)
                    .await?
                {
                    PurchaseOutcome::Completed(license) => {
                        Ok(Reply::PurchaseCompleted { license })
                    }
                    PurchaseOutcome::VerificationFailed { product_name } => {
                        Ok(Reply::PurchaseFailed { product_name })
                    }
                }
            }

            CommandEvent::HostGiveaway {
                channel_ref,
                message_ref,
                product,
                duration,
                winners,
            } => {
                self.ensure_authorized(user_id)?;
                let giveaway = self
                    .giveaway_service
                    .start(
                        user_id,
                        &channel_ref,
                        &message_ref,
                        &product,
                        &duration,
                        winners.unwrap_or(1),
                    )
                    .await?;
                Ok(Reply::GiveawayStarted { giveaway })
            }
        }
    }

    /// Feeds one reaction-add event into giveaway entry gating.
    pub async fn handle_reaction(
        &self,
        message_ref: &str,
        emoji: &str,
        user_id: &str,
        is_bot: bool,
    ) -> Result<EntryOutcome, Error> {
        self.giveaway_service
            .handle_entry(message_ref, emoji, user_id, is_bot)
            .await
    }

    fn ensure_authorized(&self, user_id: &str) -> Result<(), Error> {
        if self.authorizer.is_authorized(user_id) {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }
}
