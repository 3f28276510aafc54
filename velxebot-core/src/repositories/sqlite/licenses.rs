// src/repositories/sqlite/licenses.rs

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

use velxebot_common::models::license::{License, NewLicense};
use velxebot_common::traits::repository_traits::LicenseRepository;

use crate::Error;

#[derive(Clone)]
pub struct SqliteLicenseRepository {
    pool: Pool<Sqlite>,
}

impl SqliteLicenseRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn row_to_license(r: &sqlx::sqlite::SqliteRow) -> Result<License, Error> {
    Ok(License {
        id: r.try_get("id")?,
        discord_id: r.try_get("discord_id")?,
        roblox_id: r.try_get("roblox_id")?,
        roblox_username: r.try_get("roblox_username")?,
        product_name: r.try_get("product_name")?,
        purchase_date: r.try_get("purchase_date")?,
    })
}

#[async_trait]
impl LicenseRepository for SqliteLicenseRepository {
    async fn insert_license(&self, license: &NewLicense) -> Result<License, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO purchases (discord_id, roblox_id, roblox_username, product_name, purchase_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
            .bind(&license.discord_id)
            .bind(&license.roblox_id)
            .bind(&license.roblox_username)
            .bind(&license.product_name)
            .bind(license.purchase_date)
            .execute(&self.pool)
            .await?;

        Ok(License {
            id: result.last_insert_rowid(),
            discord_id: license.discord_id.clone(),
            roblox_id: license.roblox_id.clone(),
            roblox_username: license.roblox_username.clone(),
            product_name: license.product_name.clone(),
            purchase_date: license.purchase_date,
        })
    }

    async fn get_license(&self, license_id: i64) -> Result<Option<License>, Error> {
        let row = sqlx::query(
            r#"
            SELECT id, discord_id, roblox_id, roblox_username, product_name, purchase_date
            FROM purchases
            WHERE id = ?
            "#,
        )
            .bind(license_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_license(&r)?)),
            None => Ok(None),
        }
    }

    async fn get_license_for_user(
        &self,
        license_id: i64,
        discord_id: &str,
    ) -> Result<Option<License>, Error> {
        let row = sqlx::query(
            r#"
            SELECT id, discord_id, roblox_id, roblox_username, product_name, purchase_date
            FROM purchases
            WHERE id = ? AND discord_id = ?
            "#,
        )
            .bind(license_id)
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_license(&r)?)),
            None => Ok(None),
        }
    }

    async fn find_license(
        &self,
        discord_id: &str,
        product_name: &str,
    ) -> Result<Option<License>, Error> {
        let row = sqlx::query(
            r#"
            SELECT id, discord_id, roblox_id, roblox_username, product_name, purchase_date
            FROM purchases
            WHERE discord_id = ? AND product_name = ?
            "#,
        )
            .bind(discord_id)
            .bind(product_name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_license(&r)?)),
            None => Ok(None),
        }
    }

    async fn delete_license(&self, license_id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = ?")
            .bind(license_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_licenses_for_user(&self, discord_id: &str) -> Result<Vec<License>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, discord_id, roblox_id, roblox_username, product_name, purchase_date
            FROM purchases
            WHERE discord_id = ?
            ORDER BY purchase_date DESC, id DESC
            "#,
        )
            .bind(discord_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_license).collect()
    }

    async fn list_all_licenses(&self, limit: i64) -> Result<Vec<License>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, discord_id, roblox_id, roblox_username, product_name, purchase_date
            FROM purchases
            ORDER BY purchase_date DESC, id DESC
            LIMIT ?
            "#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_license).collect()
    }

    async fn search_licenses(&self, query: &str) -> Result<Vec<License>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, discord_id, roblox_id, roblox_username, product_name, purchase_date
            FROM purchases
            WHERE discord_id = ? OR roblox_id = ?
            ORDER BY purchase_date DESC, id DESC
            "#,
        )
            .bind(query)
            .bind(query)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_license).collect()
    }
}
