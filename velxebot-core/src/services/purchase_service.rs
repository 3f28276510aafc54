use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use velxebot_common::models::license::License;
use velxebot_common::models::product::{Catalog, Product};
use velxebot_common::traits::platform_traits::{IdentityOracle, Notifier};

use crate::services::license_service::LicenseService;
use crate::services::link_service::LinkService;
use crate::Error;

/// Where one user currently is in the purchase conversation. One flow per
/// user; a finished flow is dropped from the map entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseState {
    Browsing,
    ConfirmPending { product_name: String },
    AwaitingExternalPurchase { product_name: String },
    Verifying { product_name: String },
}

/// What came out of a buy request.
#[derive(Debug)]
pub enum BeginOutcome {
    /// Free product: granted on the spot.
    Granted(License),
    /// Paid product: the user still has to confirm.
    NeedsConfirmation(Product),
}

/// Everything the presentation layer needs to point the user at the
/// external store.
#[derive(Debug)]
pub struct ExternalPurchase {
    pub product: Product,
    pub gamepass_id: u64,
    /// The linked account the gamepass must end up on.
    pub roblox_username: String,
}

/// Terminal result of a verification attempt.
#[derive(Debug)]
pub enum PurchaseOutcome {
    Completed(License),
    /// The gamepass was not found on the linked account. The flow is over;
    /// the user is told to contact support if they did pay.
    VerificationFailed { product_name: String },
}

/// Drives the catalog-to-license purchase flow.
pub struct PurchaseService {
    catalog: Catalog,
    link_service: Arc<LinkService>,
    license_service: Arc<LicenseService>,
    oracle: Arc<dyn IdentityOracle>,
    notifier: Arc<dyn Notifier>,
    flows: DashMap<String, PurchaseState>,
}

impl PurchaseService {
    pub fn new(
        catalog: Catalog,
        link_service: Arc<LinkService>,
        license_service: Arc<LicenseService>,
        oracle: Arc<dyn IdentityOracle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            catalog,
            link_service,
            license_service,
            oracle,
            notifier,
            flows: DashMap::new(),
        }
    }

    /// Opens the product catalog for a user. Requires a verified link and
    /// resets any flow the user already had in flight.
    pub async fn open_catalog(&self, discord_id: &str) -> Result<Vec<Product>, Error> {
        if self
            .link_service
            .verified_identity(discord_id)
            .await?
            .is_none()
        {
            return Err(Error::NotLinked);
        }

        self.flows
            .insert(discord_id.to_string(), PurchaseState::Browsing);
        Ok(self.catalog.products().to_vec())
    }

    /// A product was picked from the catalog. Free products are granted on
    /// the spot; paid ones move to the confirmation prompt.
    pub async fn begin_purchase(
        &self,
        actor: &str,
        owner: &str,
        product_name: &str,
    ) -> Result<BeginOutcome, Error> {
        self.ensure_owner(actor, owner)?;

        let product = self
            .catalog
            .get(product_name)
            .ok_or_else(|| Error::NotFound(format!("product '{product_name}'")))?
            .clone();

        if !product.buyable {
            return Err(Error::NotForSale(product.name));
        }

        if product.is_free {
            // Free claim: same gating as a paid purchase, minus the store.
            let identity = self
                .link_service
                .verified_identity(owner)
                .await?
                .ok_or(Error::NotLinked)?;

            let license = self
                .license_service
                .grant(
                    owner,
                    &identity.roblox_id,
                    &identity.roblox_username,
                    &product.name,
                )
                .await?;

            self.flows.remove(owner);
            self.notify_in_background(
                owner,
                format!(
                    "You claimed **{}**. License #{} is registered to {}.",
                    product.name, license.id, identity.roblox_username
                ),
            );
            return Ok(BeginOutcome::Granted(license));
        }

        // Paid products need a gamepass to verify against.
        if product.gamepass_id.is_none() {
            return Err(Error::NotForSale(product.name));
        }

        self.flows.insert(
            owner.to_string(),
            PurchaseState::ConfirmPending {
                product_name: product.name.clone(),
            },
        );
        Ok(BeginOutcome::NeedsConfirmation(product))
    }

    /// Backs out of the confirmation prompt, returning the user to the
    /// catalog.
    pub async fn cancel_purchase(&self, actor: &str, owner: &str) -> Result<(), Error> {
        self.ensure_owner(actor, owner)?;

        match self.current_state(owner) {
            Some(PurchaseState::ConfirmPending { .. }) => {
                self.flows
                    .insert(owner.to_string(), PurchaseState::Browsing);
                Ok(())
            }
            _ => Err(Error::InvalidState(
                "no purchase awaiting confirmation".to_string(),
            )),
        }
    }

    /// The user confirmed the prompt. Link and duplicate gates run here;
    /// failing either one ends the flow. On success the purchase hands off
    /// to the external store.
    pub async fn confirm_purchase(
        &self,
        actor: &str,
        owner: &str,
    ) -> Result<ExternalPurchase, Error> {
        self.ensure_owner(actor, owner)?;

        // 1) Must be sitting at the confirmation prompt.
        let product_name = match self.current_state(owner) {
            Some(PurchaseState::ConfirmPending { product_name }) => product_name,
            _ => {
                return Err(Error::InvalidState(
                    "no purchase awaiting confirmation".to_string(),
                ))
            }
        };

        let product = self
            .catalog
            .get(&product_name)
            .ok_or_else(|| Error::NotFound(format!("product '{product_name}'")))?
            .clone();

        // 2) The link could have been removed since the catalog opened.
        let identity = match self.link_service.verified_identity(owner).await? {
            Some(identity) => identity,
            None => {
                self.flows.remove(owner);
                return Err(Error::NotLinked);
            }
        };

        // 3) Never sell something the user already holds.
        if self
            .license_service
            .has_license(owner, &product.name)
            .await?
        {
            self.flows.remove(owner);
            return Err(Error::DuplicateLicense(product.name));
        }

        let gamepass_id = product
            .gamepass_id
            .ok_or_else(|| Error::NotForSale(product.name.clone()))?;

        self.flows.insert(
            owner.to_string(),
            PurchaseState::AwaitingExternalPurchase {
                product_name: product.name.clone(),
            },
        );
        info!(
            "Purchase confirmed: {owner} -> '{}' (gamepass {gamepass_id})",
            product.name
        );

        Ok(ExternalPurchase {
            roblox_username: identity.roblox_username,
            gamepass_id,
            product,
        })
    }

    /// The user claims to have bought the gamepass. Asks the oracle, and
    /// either grants the license or ends the flow with a support pointer.
    pub async fn complete_purchase(
        &self,
        actor: &str,
        owner: &str,
    ) -> Result<PurchaseOutcome, Error> {
        self.ensure_owner(actor, owner)?;

        // 1) Only a flow that was handed to the external store can verify.
        //    The Verifying marker also keeps a double-click from running two
        //    checks at once.
        let product_name = match self.current_state(owner) {
            Some(PurchaseState::AwaitingExternalPurchase { product_name }) => product_name,
            _ => {
                return Err(Error::InvalidState(
                    "no purchase awaiting verification".to_string(),
                ))
            }
        };
        self.flows.insert(
            owner.to_string(),
            PurchaseState::Verifying {
                product_name: product_name.clone(),
            },
        );

        let product = self
            .catalog
            .get(&product_name)
            .ok_or_else(|| Error::NotFound(format!("product '{product_name}'")))?
            .clone();
        let gamepass_id = product
            .gamepass_id
            .ok_or_else(|| Error::NotForSale(product.name.clone()))?;

        let identity = match self.link_service.verified_identity(owner).await? {
            Some(identity) => identity,
            None => {
                self.flows.remove(owner);
                return Err(Error::NotLinked);
            }
        };

        // 2) Ask the inventory endpoint. An unreachable oracle reads the
        //    same as "not owned"; the transport error is only logged.
        let owned = match self
            .oracle
            .has_gamepass(&identity.roblox_id, gamepass_id)
            .await
        {
            Ok(owned) => owned,
            Err(e) => {
                warn!(
                    "has_gamepass({}, {gamepass_id}) failed => {e}",
                    identity.roblox_id
                );
                false
            }
        };

        if !owned {
            self.flows.remove(owner);
            info!("Purchase verification failed: {owner} -> '{}'", product.name);
            return Ok(PurchaseOutcome::VerificationFailed {
                product_name: product.name,
            });
        }

        // 3) Record the grant under the account's current username; the one
        //    stored at link time may be stale. If the username fetch fails,
        //    put the flow back so the user can retry the check.
        let roblox_username = match self.oracle.get_username(&identity.roblox_id).await {
            Ok(name) => name,
            Err(e) => {
                self.flows.insert(
                    owner.to_string(),
                    PurchaseState::AwaitingExternalPurchase {
                        product_name: product.name.clone(),
                    },
                );
                return Err(e);
            }
        };

        let license = match self
            .license_service
            .grant(owner, &identity.roblox_id, &roblox_username, &product.name)
            .await
        {
            Ok(license) => license,
            Err(e) => {
                self.flows.remove(owner);
                return Err(e);
            }
        };

        self.flows.remove(owner);
        self.notify_in_background(
            owner,
            format!(
                "Purchase verified. **{}** license #{} is registered to {}.",
                product.name, license.id, roblox_username
            ),
        );
        Ok(PurchaseOutcome::Completed(license))
    }

    fn ensure_owner(&self, actor: &str, owner: &str) -> Result<(), Error> {
        if actor == owner {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    fn current_state(&self, owner: &str) -> Option<PurchaseState> {
        self.flows.get(owner).map(|entry| entry.value().clone())
    }

    /// Completion notices go out without blocking the reply to the user.
    fn notify_in_background(&self, discord_id: &str, message: String) {
        let notifier = Arc::clone(&self.notifier);
        let discord_id = discord_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify_user(&discord_id, &message).await {
                warn!("notify_user({discord_id}) failed => {e}");
            }
        });
    }
}
