// File: velxebot-core/src/test_utils/mocks.rs

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use velxebot_common::models::identity::LinkedIdentity;
use velxebot_common::models::license::{License, NewLicense};
use velxebot_common::traits::platform_traits::{IdentityOracle, Notifier};
use velxebot_common::traits::repository_traits::{LicenseRepository, LinkedIdentityRepository};
use velxebot_common::Error;

use crate::tasks::{ScheduledTask, TaskScheduler};

/// An in-process stand-in for the Roblox web API. Lookups are keyed the way
/// the real endpoints behave (usernames case-insensitively).
#[derive(Default)]
pub struct MockOracle {
    users: DashMap<String, String>,
    usernames: DashMap<String, String>,
    bios: DashMap<String, String>,
    gamepasses: DashMap<(String, u64), bool>,
    pub fail_resolves: AtomicBool,
    pub fail_bios: AtomicBool,
    pub fail_usernames: AtomicBool,
    pub fail_gamepasses: AtomicBool,
}

impl MockOracle {
    pub fn add_user(&self, username: &str, roblox_id: &str) {
        self.users
            .insert(username.to_lowercase(), roblox_id.to_string());
        self.usernames
            .insert(roblox_id.to_string(), username.to_string());
    }

    pub fn set_bio(&self, roblox_id: &str, bio: &str) {
        self.bios.insert(roblox_id.to_string(), bio.to_string());
    }

    pub fn set_gamepass(&self, roblox_id: &str, gamepass_id: u64, owned: bool) {
        self.gamepasses
            .insert((roblox_id.to_string(), gamepass_id), owned);
    }

    pub fn rename_user(&self, roblox_id: &str, new_username: &str) {
        self.usernames
            .insert(roblox_id.to_string(), new_username.to_string());
    }
}

#[async_trait]
impl IdentityOracle for MockOracle {
    async fn resolve_username(&self, username: &str) -> Result<Option<String>, Error> {
        if self.fail_resolves.load(Ordering::SeqCst) {
            return Err(Error::Oracle("simulated outage".to_string()));
        }
        Ok(self
            .users
            .get(&username.to_lowercase())
            .map(|id| id.value().clone()))
    }

    async fn get_profile_bio(&self, roblox_id: &str) -> Result<String, Error> {
        if self.fail_bios.load(Ordering::SeqCst) {
            return Err(Error::Oracle("simulated outage".to_string()));
        }
        Ok(self
            .bios
            .get(roblox_id)
            .map(|b| b.value().clone())
            .unwrap_or_default())
    }

    async fn get_username(&self, roblox_id: &str) -> Result<String, Error> {
        if self.fail_usernames.load(Ordering::SeqCst) {
            return Err(Error::Oracle("simulated outage".to_string()));
        }
        self.usernames
            .get(roblox_id)
            .map(|u| u.value().clone())
            .ok_or_else(|| Error::Oracle(format!("no such user {roblox_id}")))
    }

    async fn has_gamepass(&self, roblox_id: &str, gamepass_id: u64) -> Result<bool, Error> {
        if self.fail_gamepasses.load(Ordering::SeqCst) {
            return Err(Error::Oracle("simulated outage".to_string()));
        }
        Ok(self
            .gamepasses
            .get(&(roblox_id.to_string(), gamepass_id))
            .map(|owned| *owned.value())
            .unwrap_or(false))
    }
}

/// Records every outbound message instead of delivering it.
#[derive(Default)]
pub struct MockNotifier {
    pub dms: Mutex<Vec<(String, String)>>,
    pub announcements: Mutex<Vec<(String, String)>>,
    pub fail_dms: AtomicBool,
}

impl MockNotifier {
    pub async fn dms_for(&self, discord_id: &str) -> Vec<String> {
        self.dms
            .lock()
            .await
            .iter()
            .filter(|(to, _)| to == discord_id)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub async fn dm_count(&self) -> usize {
        self.dms.lock().await.len()
    }

    pub async fn last_announcement(&self) -> Option<(String, String)> {
        self.announcements.lock().await.last().cloned()
    }

    pub async fn announcement_count(&self) -> usize {
        self.announcements.lock().await.len()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify_user(&self, discord_id: &str, message: &str) -> Result<(), Error> {
        if self.fail_dms.load(Ordering::SeqCst) {
            return Err(Error::Oracle("DMs closed".to_string()));
        }
        self.dms
            .lock()
            .await
            .push((discord_id.to_string(), message.to_string()));
        Ok(())
    }

    async fn announce(&self, channel_ref: &str, message: &str) -> Result<(), Error> {
        self.announcements
            .lock()
            .await
            .push((channel_ref.to_string(), message.to_string()));
        Ok(())
    }
}

/// Captures schedule requests without running them, so a test can fire the
/// deadline itself by calling the service directly.
#[derive(Default)]
pub struct MockScheduler {
    pub scheduled: DashMap<Uuid, Duration>,
}

impl TaskScheduler for MockScheduler {
    fn schedule(&self, task_id: Uuid, delay: Duration, _task: ScheduledTask) {
        self.scheduled.insert(task_id, delay);
    }
}

/// DashMap-backed identity store with a call counter, for asserting that a
/// rejected command never touched persistence.
#[derive(Default)]
pub struct MockIdentityRepo {
    rows: DashMap<String, LinkedIdentity>,
    pub calls: AtomicUsize,
}

impl MockIdentityRepo {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkedIdentityRepository for MockIdentityRepo {
    async fn upsert_identity(&self, identity: &LinkedIdentity) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows
            .insert(identity.discord_id.clone(), identity.clone());
        Ok(())
    }

    async fn get_identity(&self, discord_id: &str) -> Result<Option<LinkedIdentity>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.get(discord_id).map(|row| row.value().clone()))
    }

    async fn get_verified_identity(
        &self,
        discord_id: &str,
    ) -> Result<Option<LinkedIdentity>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .get(discord_id)
            .filter(|row| row.value().verified)
            .map(|row| row.value().clone()))
    }

    async fn mark_verified(&self, discord_id: &str) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(mut row) = self.rows.get_mut(discord_id) {
            row.value_mut().verified = true;
        }
        Ok(())
    }

    async fn delete_identity(&self, discord_id: &str) -> Result<bool, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.remove(discord_id).is_some())
    }
}

/// DashMap-backed license store mirroring the SQLite ordering rules.
#[derive(Default)]
pub struct MockLicenseRepo {
    rows: DashMap<i64, License>,
    next_id: AtomicI64,
    pub calls: AtomicUsize,
}

impl MockLicenseRepo {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn sorted(&self, mut rows: Vec<License>) -> Vec<License> {
        rows.sort_by(|a, b| {
            b.purchase_date
                .cmp(&a.purchase_date)
                .then(b.id.cmp(&a.id))
        });
        rows
    }
}

#[async_trait]
impl LicenseRepository for MockLicenseRepo {
    async fn insert_license(&self, license: &NewLicense) -> Result<License, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = License {
            id,
            discord_id: license.discord_id.clone(),
            roblox_id: license.roblox_id.clone(),
            roblox_username: license.roblox_username.clone(),
            product_name: license.product_name.clone(),
            purchase_date: license.purchase_date,
        };
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn get_license(&self, license_id: i64) -> Result<Option<License>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.get(&license_id).map(|row| row.value().clone()))
    }

    async fn get_license_for_user(
        &self,
        license_id: i64,
        discord_id: &str,
    ) -> Result<Option<License>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .get(&license_id)
            .filter(|row| row.value().discord_id == discord_id)
            .map(|row| row.value().clone()))
    }

    async fn find_license(
        &self,
        discord_id: &str,
        product_name: &str,
    ) -> Result<Option<License>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .iter()
            .find(|row| {
                row.value().discord_id == discord_id && row.value().product_name == product_name
            })
            .map(|row| row.value().clone()))
    }

    async fn delete_license(&self, license_id: i64) -> Result<bool, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.remove(&license_id).is_some())
    }

    async fn list_licenses_for_user(&self, discord_id: &str) -> Result<Vec<License>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = self
            .rows
            .iter()
            .filter(|row| row.value().discord_id == discord_id)
            .map(|row| row.value().clone())
            .collect();
        Ok(self.sorted(rows))
    }

    async fn list_all_licenses(&self, limit: i64) -> Result<Vec<License>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.iter().map(|row| row.value().clone()).collect();
        let mut rows = self.sorted(rows);
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn search_licenses(&self, query: &str) -> Result<Vec<License>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = self
            .rows
            .iter()
            .filter(|row| row.value().discord_id == query || row.value().roblox_id == query)
            .map(|row| row.value().clone())
            .collect();
        Ok(self.sorted(rows))
    }
}
