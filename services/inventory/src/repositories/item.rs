//! PostgreSQL implementation of ItemRepository

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{info, instrument};

use super::{ItemRepository, RepoResult, map_db_error};
use crate::models::{Item, ItemFields, ItemId, UserId};

const ITEM_COLUMNS: &str =
    "id, name, serial_number, bill_number, date_of_purchase, warranty, assigned_to_id";

/// Item repository
#[derive(Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    /// Create a new item repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> RepoResult<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.as_ref().map(item_from_row).transpose()
    }
}

fn item_from_row(row: &PgRow) -> RepoResult<Item> {
    Ok(Item {
        id: ItemId(row.try_get("id")?),
        name: row.try_get("name")?,
        serial_number: row.try_get("serial_number")?,
        bill_number: row.try_get("bill_number")?,
        date_of_purchase: row.try_get("date_of_purchase")?,
        warranty: row.try_get("warranty")?,
        assigned_to: row
            .try_get::<Option<i64>, _>("assigned_to_id")?
            .map(UserId),
    })
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    #[instrument(skip(self, item), fields(serial_number = %item.serial_number))]
    async fn insert(&self, item: ItemFields) -> RepoResult<Item> {
        info!("Creating new item: {}", item.name);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO items (name, serial_number, bill_number, date_of_purchase, warranty)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&item.name)
        .bind(&item.serial_number)
        .bind(&item.bill_number)
        .bind(item.date_of_purchase)
        .bind(&item.warranty)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        item_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn find_by_serial_number(&self, serial_number: &str) -> RepoResult<Option<Item>> {
        self.find_one("serial_number", serial_number).await
    }

    async fn find_by_bill_number(&self, bill_number: &str) -> RepoResult<Option<Item>> {
        self.find_one("bill_number", bill_number).await
    }

    #[instrument(skip(self))]
    async fn find_assigned_by_name(&self, user: UserId, name: &str) -> RepoResult<Option<Item>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE assigned_to_id = $1 AND name = $2 LIMIT 1"
        ))
        .bind(user.0)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn list(&self) -> RepoResult<Vec<Item>> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.iter().map(item_from_row).collect()
    }

    async fn list_assigned_to(&self, user: UserId) -> RepoResult<Vec<Item>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE assigned_to_id = $1 ORDER BY id"
        ))
        .bind(user.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: ItemId, changes: ItemFields) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET name = $1, serial_number = $2, bill_number = $3,
                date_of_purchase = $4, warranty = $5
            WHERE id = $6
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.serial_number)
        .bind(&changes.bill_number)
        .bind(changes.date_of_purchase)
        .bind(&changes.warranty)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn set_assignee(&self, id: ItemId, user: Option<UserId>) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE items SET assigned_to_id = $1 WHERE id = $2")
            .bind(user.map(|u| u.0))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ItemId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
