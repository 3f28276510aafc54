use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use tracing::{error, info, warn};
use uuid::Uuid;

use velxebot_common::models::giveaway::{EntryOutcome, Giveaway, GiveawayOutcome};
use velxebot_common::models::product::Catalog;
use velxebot_common::traits::platform_traits::Notifier;

use crate::services::license_service::LicenseService;
use crate::services::link_service::LinkService;
use crate::tasks::scheduler::TaskScheduler;
use crate::utils::duration::parse_duration_ms;
use crate::Error;

/// Reaction users click to enter a giveaway.
pub const ENTRY_EMOJI: &str = "\u{1F389}";

struct ActiveGiveaway {
    giveaway: Giveaway,
    /// Insertion-ordered, deduplicated entrant ids.
    entrants: Vec<String>,
}

/// Runs timed giveaways: entry gating, the closing draw and prize
/// fulfillment.
pub struct GiveawayService {
    catalog: Catalog,
    link_service: Arc<LinkService>,
    license_service: Arc<LicenseService>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn TaskScheduler>,
    active: DashMap<Uuid, ActiveGiveaway>,
}

impl GiveawayService {
    pub fn new(
        catalog: Catalog,
        link_service: Arc<LinkService>,
        license_service: Arc<LicenseService>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        Self {
            catalog,
            link_service,
            license_service,
            notifier,
            scheduler,
            active: DashMap::new(),
        }
    }

    /// Registers a giveaway and schedules its closing draw. The caller has
    /// already posted the announcement message and passes its refs in.
    pub async fn start(
        self: &Arc<Self>,
        host_id: &str,
        channel_ref: &str,
        message_ref: &str,
        product_name: &str,
        duration: &str,
        winner_count: u32,
    ) -> Result<Giveaway, Error> {
        // 1) Validate everything before any state exists.
        let duration_ms = parse_duration_ms(duration)?;
        if !(1..=10).contains(&winner_count) {
            return Err(Error::InvalidWinnerCount(winner_count));
        }
        let product = self
            .catalog
            .get(product_name)
            .ok_or_else(|| Error::NotFound(format!("product '{product_name}'")))?;

        let delay = Duration::from_millis(duration_ms);
        let end_time = Utc::now()
            + chrono::Duration::from_std(delay)
                .map_err(|_| Error::InvalidDuration(duration.to_string()))?;

        // 2) Track it and arm the fire-once timer.
        let giveaway = Giveaway::new(
            channel_ref,
            message_ref,
            &product.name,
            winner_count,
            host_id,
            end_time,
        );
        let giveaway_id = giveaway.giveaway_id;
        self.active.insert(
            giveaway_id,
            ActiveGiveaway {
                giveaway: giveaway.clone(),
                entrants: Vec::new(),
            },
        );

        let service = Arc::clone(self);
        self.scheduler.schedule(
            giveaway_id,
            delay,
            Box::pin(async move {
                let _ = service.resolve(giveaway_id).await;
            }),
        );

        info!(
            "Giveaway {giveaway_id} started: '{}' x{winner_count}, ends {end_time}",
            giveaway.product_name
        );
        Ok(giveaway)
    }

    /// Applies one reaction-add event. Eligibility is gated eagerly at entry
    /// time; a `Rejected` outcome tells the caller to retract the reaction,
    /// and the reason goes out by DM.
    pub async fn handle_entry(
        &self,
        message_ref: &str,
        emoji: &str,
        discord_id: &str,
        is_bot: bool,
    ) -> Result<EntryOutcome, Error> {
        if is_bot || emoji != ENTRY_EMOJI {
            return Ok(EntryOutcome::Ignored);
        }
        let Some((giveaway_id, product_name)) = self.find_by_message(message_ref) else {
            return Ok(EntryOutcome::Ignored);
        };

        let identity = self.link_service.verified_identity(discord_id).await?;
        if identity.is_none() {
            self.try_notify(
                discord_id,
                &format!(
                    "Your entry for the **{product_name}** giveaway was removed: link and \
                     verify your Roblox account first, then react again."
                ),
            )
            .await;
            return Ok(EntryOutcome::Rejected);
        }

        if self
            .license_service
            .has_license(discord_id, &product_name)
            .await?
        {
            self.try_notify(
                discord_id,
                &format!(
                    "Your entry for the **{product_name}** giveaway was removed: you already \
                     own this product."
                ),
            )
            .await;
            return Ok(EntryOutcome::Rejected);
        }

        // The giveaway may have closed while we were gating; treat that the
        // same as reacting to a dead message.
        let entered = match self.active.get_mut(&giveaway_id) {
            Some(mut entry) => {
                if !entry.entrants.iter().any(|e| e == discord_id) {
                    entry.entrants.push(discord_id.to_string());
                }
                true
            }
            None => false,
        };
        if !entered {
            return Ok(EntryOutcome::Ignored);
        }

        self.try_notify(
            discord_id,
            &format!("You're in! Entry recorded for the **{product_name}** giveaway."),
        )
        .await;
        Ok(EntryOutcome::Entered)
    }

    /// Ends a giveaway: closes entries, draws winners, fulfills prizes and
    /// announces the result. Fired by the scheduler; everything in here is
    /// best-effort because there is nobody left to report errors to.
    pub async fn resolve(&self, giveaway_id: Uuid) -> Option<GiveawayOutcome> {
        let Some((_, active)) = self.active.remove(&giveaway_id) else {
            warn!("Giveaway {giveaway_id} fired but is no longer tracked");
            return None;
        };
        let giveaway = active.giveaway;
        let entrant_count = active.entrants.len();

        if active.entrants.is_empty() {
            info!("Giveaway {giveaway_id} ended with no valid entries");
            self.try_announce(
                &giveaway.channel_ref,
                &format!(
                    "The **{}** giveaway ended with no valid entries.",
                    giveaway.product_name
                ),
            )
            .await;
            return Some(GiveawayOutcome {
                giveaway_id,
                channel_ref: giveaway.channel_ref,
                product_name: giveaway.product_name,
                winners: Vec::new(),
                entrant_count,
            });
        }

        let winners = select_winners(
            &mut rand::rng(),
            active.entrants,
            giveaway.winner_count as usize,
        );
        info!(
            "Giveaway {giveaway_id} ended: {} winner(s) drawn from {entrant_count} entrant(s)",
            winners.len()
        );

        for discord_id in &winners {
            self.fulfill_prize(discord_id, &giveaway.product_name).await;
        }

        let mentions = winners
            .iter()
            .map(|id| format!("<@{id}>"))
            .collect::<Vec<_>>()
            .join(" ");
        self.try_announce(
            &giveaway.channel_ref,
            &format!(
                "{ENTRY_EMOJI} The **{}** giveaway is over! Congratulations {mentions}!",
                giveaway.product_name
            ),
        )
        .await;

        Some(GiveawayOutcome {
            giveaway_id,
            channel_ref: giveaway.channel_ref,
            product_name: giveaway.product_name,
            winners,
            entrant_count,
        })
    }

    /// Grants the prize to one winner. Entry gating ran at entry time, but
    /// both the link and the license picture can change before the draw, so
    /// everything is re-checked. Failures skip the winner, never the draw.
    async fn fulfill_prize(&self, discord_id: &str, product_name: &str) {
        let identity = match self.link_service.verified_identity(discord_id).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                self.try_notify(
                    discord_id,
                    &format!(
                        "You won the **{product_name}** giveaway, but no verified Roblox \
                         account is linked. Link your account and contact a moderator to \
                         claim your prize."
                    ),
                )
                .await;
                return;
            }
            Err(e) => {
                warn!("fulfill_prize: identity lookup for {discord_id} failed => {e}");
                return;
            }
        };

        match self
            .license_service
            .grant(
                discord_id,
                &identity.roblox_id,
                &identity.roblox_username,
                product_name,
            )
            .await
        {
            Ok(license) => {
                self.try_notify(
                    discord_id,
                    &format!(
                        "{ENTRY_EMOJI} You won **{product_name}**! License #{} is registered \
                         to {}.",
                        license.id, identity.roblox_username
                    ),
                )
                .await;
            }
            Err(Error::DuplicateLicense(_)) => {
                // Raced a purchase between entry and draw.
                warn!("Winner {discord_id} already holds '{product_name}', skipping grant");
                self.try_notify(
                    discord_id,
                    &format!(
                        "You won the **{product_name}** giveaway, but you already own it. \
                         Contact a moderator."
                    ),
                )
                .await;
            }
            Err(e) => {
                error!("Granting '{product_name}' to winner {discord_id} failed => {e}");
            }
        }
    }

    fn find_by_message(&self, message_ref: &str) -> Option<(Uuid, String)> {
        self.active.iter().find_map(|entry| {
            if entry.giveaway.message_ref == message_ref {
                Some((*entry.key(), entry.giveaway.product_name.clone()))
            } else {
                None
            }
        })
    }

    async fn try_notify(&self, discord_id: &str, message: &str) {
        if let Err(e) = self.notifier.notify_user(discord_id, message).await {
            warn!("notify_user({discord_id}) failed => {e}");
        }
    }

    async fn try_announce(&self, channel_ref: &str, message: &str) {
        if let Err(e) = self.notifier.announce(channel_ref, message).await {
            warn!("announce({channel_ref}) failed => {e}");
        }
    }
}

/// Draws up to `count` distinct winners; every pick is uniform over the
/// remaining pool.
pub fn select_winners<R: Rng>(rng: &mut R, mut pool: Vec<String>, count: usize) -> Vec<String> {
    let mut winners = Vec::with_capacity(count.min(pool.len()));
    while winners.len() < count && !pool.is_empty() {
        let idx = rng.random_range(0..pool.len());
        winners.push(pool.swap_remove(idx));
    }
    winners
}
