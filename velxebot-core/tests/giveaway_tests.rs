// tests/giveaway_tests.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use velxebot_common::models::giveaway::EntryOutcome;
use velxebot_core::services::giveaway_service::{select_winners, GiveawayService, ENTRY_EMOJI};
use velxebot_core::tasks::{TaskScheduler, TokioScheduler};
use velxebot_core::test_utils::helpers::TestContext;
use velxebot_core::Error;

#[tokio::test]
async fn test_start_validates_before_tracking() -> Result<(), Error> {
    let ctx = TestContext::new().await?;

    let err = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "next week", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDuration(_)));

    let err = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidWinnerCount(0)));

    let err = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 11)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidWinnerCount(11)));

    let err = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "NoSuchThing", "10m", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // Nothing got armed along the way.
    assert!(ctx.scheduler.scheduled.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_start_arms_a_timer_for_the_deadline() -> Result<(), Error> {
    let ctx = TestContext::new().await?;

    let before = Utc::now();
    let giveaway = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 3)
        .await?;

    assert_eq!(giveaway.product_name, "Crate Spawner");
    assert_eq!(giveaway.winner_count, 3);
    assert_eq!(giveaway.host_id, "host");
    assert_eq!(giveaway.channel_ref, "chan-1");
    assert_eq!(giveaway.message_ref, "msg-1");

    let expected_end = before + chrono::Duration::minutes(10);
    let skew = (giveaway.end_time - expected_end).num_seconds().abs();
    assert!(skew <= 1, "end_time off by {skew}s");

    let armed = ctx
        .scheduler
        .scheduled
        .get(&giveaway.giveaway_id)
        .map(|entry| *entry.value());
    assert_eq!(armed, Some(Duration::from_millis(600_000)));
    Ok(())
}

#[tokio::test]
async fn test_entry_gating() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    ctx.giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 1)
        .await?;

    // Bots, other emoji and unrelated messages are not entries.
    let outcome = ctx
        .giveaway_service
        .handle_entry("msg-1", ENTRY_EMOJI, "some-bot", true)
        .await?;
    assert_eq!(outcome, EntryOutcome::Ignored);
    let outcome = ctx
        .giveaway_service
        .handle_entry("msg-1", "\u{1F44D}", "disc-1", false)
        .await?;
    assert_eq!(outcome, EntryOutcome::Ignored);
    let outcome = ctx
        .giveaway_service
        .handle_entry("msg-other", ENTRY_EMOJI, "disc-1", false)
        .await?;
    assert_eq!(outcome, EntryOutcome::Ignored);

    // No verified link: rejected, with the reason sent by DM.
    let outcome = ctx
        .giveaway_service
        .handle_entry("msg-1", ENTRY_EMOJI, "stranger", false)
        .await?;
    assert_eq!(outcome, EntryOutcome::Rejected);
    let dms = ctx.notifier.dms_for("stranger").await;
    assert!(dms.iter().any(|m| m.contains("link and")), "got {dms:?}");

    // Owners of the product cannot enter.
    ctx.seed_verified_user("owner", "111", "OwnerAcct").await?;
    ctx.license_service
        .grant("owner", "111", "OwnerAcct", "Crate Spawner")
        .await?;
    let outcome = ctx
        .giveaway_service
        .handle_entry("msg-1", ENTRY_EMOJI, "owner", false)
        .await?;
    assert_eq!(outcome, EntryOutcome::Rejected);
    let dms = ctx.notifier.dms_for("owner").await;
    assert!(dms.iter().any(|m| m.contains("already")), "got {dms:?}");

    // A verified non-owner gets in.
    ctx.seed_verified_user("disc-1", "999", "Builder123").await?;
    let outcome = ctx
        .giveaway_service
        .handle_entry("msg-1", ENTRY_EMOJI, "disc-1", false)
        .await?;
    assert_eq!(outcome, EntryOutcome::Entered);
    let dms = ctx.notifier.dms_for("disc-1").await;
    assert!(dms.iter().any(|m| m.contains("You're in")), "got {dms:?}");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_reactions_count_once() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    let giveaway = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 1)
        .await?;
    ctx.seed_verified_user("disc-1", "999", "Builder123").await?;

    for _ in 0..3 {
        let outcome = ctx
            .giveaway_service
            .handle_entry("msg-1", ENTRY_EMOJI, "disc-1", false)
            .await?;
        assert_eq!(outcome, EntryOutcome::Entered);
    }

    let outcome = ctx
        .giveaway_service
        .resolve(giveaway.giveaway_id)
        .await
        .ok_or_else(|| Error::NotFound("giveaway outcome".to_string()))?;
    assert_eq!(outcome.entrant_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_resolve_with_no_entries_announces_that() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    let giveaway = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 2)
        .await?;

    let outcome = ctx
        .giveaway_service
        .resolve(giveaway.giveaway_id)
        .await
        .ok_or_else(|| Error::NotFound("giveaway outcome".to_string()))?;
    assert!(outcome.winners.is_empty());
    assert_eq!(outcome.entrant_count, 0);

    let (channel, message) = ctx
        .notifier
        .last_announcement()
        .await
        .ok_or_else(|| Error::NotFound("announcement".to_string()))?;
    assert_eq!(channel, "chan-1");
    assert!(message.contains("no valid entries"), "got {message}");

    // The giveaway is gone; the timer firing again finds nothing.
    assert!(ctx.giveaway_service.resolve(giveaway.giveaway_id).await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_resolve_grants_and_announces_winner() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    let giveaway = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 1)
        .await?;

    for (discord_id, roblox_id, username) in [
        ("disc-1", "991", "EntrantOne"),
        ("disc-2", "992", "EntrantTwo"),
        ("disc-3", "993", "EntrantThree"),
    ] {
        ctx.seed_verified_user(discord_id, roblox_id, username).await?;
        let outcome = ctx
            .giveaway_service
            .handle_entry("msg-1", ENTRY_EMOJI, discord_id, false)
            .await?;
        assert_eq!(outcome, EntryOutcome::Entered);
    }

    let outcome = ctx
        .giveaway_service
        .resolve(giveaway.giveaway_id)
        .await
        .ok_or_else(|| Error::NotFound("giveaway outcome".to_string()))?;
    assert_eq!(outcome.entrant_count, 3);
    assert_eq!(outcome.winners.len(), 1);

    let winner = outcome.winners[0].clone();
    assert!(["disc-1", "disc-2", "disc-3"].contains(&winner.as_str()));
    assert!(ctx.license_service.has_license(&winner, "Crate Spawner").await?);

    let (channel, message) = ctx
        .notifier
        .last_announcement()
        .await
        .ok_or_else(|| Error::NotFound("announcement".to_string()))?;
    assert_eq!(channel, "chan-1");
    assert!(message.contains(&format!("<@{winner}>")), "got {message}");
    assert!(message.contains(ENTRY_EMOJI));

    let dms = ctx.notifier.dms_for(&winner).await;
    assert!(dms.iter().any(|m| m.contains("License #")), "got {dms:?}");
    Ok(())
}

#[tokio::test]
async fn test_resolve_with_fewer_entrants_than_prizes() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    let giveaway = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 5)
        .await?;

    ctx.seed_verified_user("disc-1", "991", "EntrantOne").await?;
    ctx.seed_verified_user("disc-2", "992", "EntrantTwo").await?;
    for discord_id in ["disc-1", "disc-2"] {
        ctx.giveaway_service
            .handle_entry("msg-1", ENTRY_EMOJI, discord_id, false)
            .await?;
    }

    let outcome = ctx
        .giveaway_service
        .resolve(giveaway.giveaway_id)
        .await
        .ok_or_else(|| Error::NotFound("giveaway outcome".to_string()))?;
    assert_eq!(outcome.winners.len(), 2);
    for discord_id in ["disc-1", "disc-2"] {
        assert!(ctx.license_service.has_license(discord_id, "Crate Spawner").await?);
    }
    Ok(())
}

#[tokio::test]
async fn test_winner_who_bought_meanwhile_is_skipped() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    let giveaway = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 2)
        .await?;

    ctx.seed_verified_user("disc-1", "991", "EntrantOne").await?;
    ctx.seed_verified_user("disc-2", "992", "EntrantTwo").await?;
    for discord_id in ["disc-1", "disc-2"] {
        ctx.giveaway_service
            .handle_entry("msg-1", ENTRY_EMOJI, discord_id, false)
            .await?;
    }

    // disc-1 buys the product after entering; the draw must not double it.
    ctx.license_service
        .grant("disc-1", "991", "EntrantOne", "Crate Spawner")
        .await?;

    let outcome = ctx
        .giveaway_service
        .resolve(giveaway.giveaway_id)
        .await
        .ok_or_else(|| Error::NotFound("giveaway outcome".to_string()))?;
    assert_eq!(outcome.winners.len(), 2);

    let owned: Vec<_> = ctx
        .license_service
        .list_for_user("disc-1")
        .await?
        .into_iter()
        .filter(|l| l.product_name == "Crate Spawner")
        .collect();
    assert_eq!(owned.len(), 1, "no second license for disc-1");
    assert!(ctx.license_service.has_license("disc-2", "Crate Spawner").await?);

    let dms = ctx.notifier.dms_for("disc-1").await;
    assert!(dms.iter().any(|m| m.contains("already own")), "got {dms:?}");
    Ok(())
}

#[tokio::test]
async fn test_winner_who_unlinked_gets_pointed_at_moderators() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    let giveaway = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 1)
        .await?;

    ctx.seed_verified_user("disc-1", "991", "EntrantOne").await?;
    ctx.giveaway_service
        .handle_entry("msg-1", ENTRY_EMOJI, "disc-1", false)
        .await?;
    ctx.link_service.confirm_unlink("disc-1").await?;

    let outcome = ctx
        .giveaway_service
        .resolve(giveaway.giveaway_id)
        .await
        .ok_or_else(|| Error::NotFound("giveaway outcome".to_string()))?;
    assert_eq!(outcome.winners, vec!["disc-1".to_string()]);

    assert!(!ctx.license_service.has_license("disc-1", "Crate Spawner").await?);
    let dms = ctx.notifier.dms_for("disc-1").await;
    assert!(
        dms.iter().any(|m| m.contains("contact a moderator")),
        "got {dms:?}"
    );
    Ok(())
}

#[tokio::test]
async fn test_entry_after_close_is_ignored() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    let giveaway = ctx
        .giveaway_service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "10m", 1)
        .await?;
    ctx.seed_verified_user("disc-1", "999", "Builder123").await?;

    ctx.giveaway_service.resolve(giveaway.giveaway_id).await;

    let outcome = ctx
        .giveaway_service
        .handle_entry("msg-1", ENTRY_EMOJI, "disc-1", false)
        .await?;
    assert_eq!(outcome, EntryOutcome::Ignored);
    Ok(())
}

#[test]
fn test_select_winners_draws_distinct_entrants() {
    let pool: Vec<String> = (0..5).map(|i| format!("user-{i}")).collect();
    let mut rng = StdRng::seed_from_u64(42);

    let winners = select_winners(&mut rng, pool.clone(), 3);
    assert_eq!(winners.len(), 3);
    for winner in &winners {
        assert!(pool.contains(winner));
    }
    let mut deduped = winners.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), 3, "winners must be distinct");
}

#[test]
fn test_select_winners_caps_at_pool_size() {
    let pool: Vec<String> = (0..2).map(|i| format!("user-{i}")).collect();
    let mut rng = StdRng::seed_from_u64(7);

    let winners = select_winners(&mut rng, pool.clone(), 10);
    let mut sorted = winners.clone();
    sorted.sort();
    let mut expected = pool.clone();
    expected.sort();
    assert_eq!(sorted, expected);

    assert!(select_winners(&mut rng, pool, 0).is_empty());
    assert!(select_winners(&mut rng, Vec::new(), 3).is_empty());
}

#[test]
fn test_select_winners_is_deterministic_per_seed() {
    let pool: Vec<String> = (0..8).map(|i| format!("user-{i}")).collect();
    let a = select_winners(&mut StdRng::seed_from_u64(1234), pool.clone(), 4);
    let b = select_winners(&mut StdRng::seed_from_u64(1234), pool, 4);
    assert_eq!(a, b);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_scheduler_fires_after_delay() {
    let scheduler = TokioScheduler::default();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    scheduler.schedule(
        Uuid::new_v4(),
        Duration::from_secs(3600),
        Box::pin(async move {
            let _ = tx.send(());
        }),
    );

    // Paused clock: the hour elapses instantly once the runtime is idle.
    rx.await.expect("scheduled task should fire");
}

// Real clock: the paused-clock auto-advance races sqlx-sqlite's worker
// thread and trips the pool's acquire timeout, so this test waits out the
// one-minute giveaway in real time.
#[tokio::test]
async fn test_timer_drives_the_draw() -> Result<(), Error> {
    let ctx = TestContext::new().await?;
    let service = Arc::new(GiveawayService::new(
        ctx.catalog.clone(),
        ctx.link_service.clone(),
        ctx.license_service.clone(),
        ctx.notifier.clone(),
        Arc::new(TokioScheduler::default()),
    ));

    ctx.seed_verified_user("disc-1", "999", "Builder123").await?;
    service
        .start("host", "chan-1", "msg-1", "Crate Spawner", "1m", 1)
        .await?;
    let outcome = service
        .handle_entry("msg-1", ENTRY_EMOJI, "disc-1", false)
        .await?;
    assert_eq!(outcome, EntryOutcome::Entered);

    tokio::time::sleep(Duration::from_secs(61)).await;
    for _ in 0..50 {
        if ctx.notifier.announcement_count().await > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }

    let (channel, message) = ctx
        .notifier
        .last_announcement()
        .await
        .ok_or_else(|| Error::NotFound("announcement".to_string()))?;
    assert_eq!(channel, "chan-1");
    assert!(message.contains("<@disc-1>"), "got {message}");
    assert!(ctx.license_service.has_license("disc-1", "Crate Spawner").await?);
    Ok(())
}
