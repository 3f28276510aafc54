// src/repositories/sqlite/linked_identities.rs

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

use velxebot_common::models::identity::LinkedIdentity;
pub(crate) use velxebot_common::traits::repository_traits::LinkedIdentityRepository;

use crate::Error;

#[derive(Clone)]
pub struct SqliteLinkedIdentityRepository {
    pool: Pool<Sqlite>,
}

impl SqliteLinkedIdentityRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn row_to_identity(r: &sqlx::sqlite::SqliteRow) -> Result<LinkedIdentity, Error> {
    Ok(LinkedIdentity {
        discord_id: r.try_get("discord_id")?,
        roblox_id: r.try_get("roblox_id")?,
        roblox_username: r.try_get("roblox_username")?,
        verification_code: r.try_get("verification_code")?,
        verified: r.try_get("verified")?,
        link_date: r.try_get("link_date")?,
    })
}

#[async_trait]
impl LinkedIdentityRepository for SqliteLinkedIdentityRepository {
    async fn upsert_identity(&self, identity: &LinkedIdentity) -> Result<(), Error> {
        // OR REPLACE rides on the discord_id UNIQUE constraint; a re-link
        // drops the old row entirely, including its verified flag.
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO linked_accounts (
                discord_id,
                roblox_id,
                roblox_username,
                verification_code,
                verified,
                link_date
            )
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
            .bind(&identity.discord_id)
            .bind(&identity.roblox_id)
            .bind(&identity.roblox_username)
            .bind(&identity.verification_code)
            .bind(identity.verified)
            .bind(identity.link_date)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_identity(&self, discord_id: &str) -> Result<Option<LinkedIdentity>, Error> {
        let row = sqlx::query(
            r#"
            SELECT discord_id, roblox_id, roblox_username, verification_code, verified, link_date
            FROM linked_accounts
            WHERE discord_id = ?
            "#,
        )
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_identity(&r)?)),
            None => Ok(None),
        }
    }

    async fn get_verified_identity(
        &self,
        discord_id: &str,
    ) -> Result<Option<LinkedIdentity>, Error> {
        let row = sqlx::query(
            r#"
            SELECT discord_id, roblox_id, roblox_username, verification_code, verified, link_date
            FROM linked_accounts
            WHERE discord_id = ? AND verified = 1
            "#,
        )
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_identity(&r)?)),
            None => Ok(None),
        }
    }

    async fn mark_verified(&self, discord_id: &str) -> Result<(), Error> {
        sqlx::query("UPDATE linked_accounts SET verified = 1 WHERE discord_id = ?")
            .bind(discord_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_identity(&self, discord_id: &str) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM linked_accounts WHERE discord_id = ?")
            .bind(discord_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
