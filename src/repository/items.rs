//! Items repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, ConflictKind, Dependency},
    models::{CreateItem, Item, ItemId, UpdateItem},
};

use super::ItemDirectory;

/// Map a database failure to a dependency outage, or a duplicate ISBN
/// when the unique index rejected the write.
fn db_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(ConflictKind::DuplicateIsbn, "A book with this ISBN already exists");
        }
    }
    AppError::unavailable(Dependency::ItemDirectory, e)
}

#[derive(Clone)]
pub struct PgItemDirectory {
    pool: Pool<Postgres>,
}

impl PgItemDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemDirectory for PgItemDirectory {
    async fn get(&self, id: ItemId) -> AppResult<Option<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn exists(&self, id: ItemId) -> AppResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn set_available(&self, id: ItemId, available: bool) -> AppResult<bool> {
        let result = sqlx::query("UPDATE items SET available = $1, updated_at = $2 WHERE id = $3")
            .bind(available)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> AppResult<Vec<Item>> {
        sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn create(&self, item: &CreateItem) -> AppResult<Item> {
        sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (
                title, author, publication_year, isbn, genre, price,
                available, description, page_count, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&item.title)
        .bind(&item.author)
        .bind(item.publication_year)
        .bind(&item.isbn)
        .bind(&item.genre)
        .bind(item.price)
        .bind(&item.description)
        .bind(item.page_count)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn update(&self, id: ItemId, changes: &UpdateItem) -> AppResult<Option<Item>> {
        // The availability column is owned by the ledger and left untouched.
        sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET
                title = COALESCE($1, title),
                author = COALESCE($2, author),
                publication_year = COALESCE($3, publication_year),
                genre = COALESCE($4, genre),
                price = COALESCE($5, price),
                description = COALESCE($6, description),
                page_count = COALESCE($7, page_count),
                updated_at = $8
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.author)
        .bind(changes.publication_year)
        .bind(&changes.genre)
        .bind(changes.price)
        .bind(&changes.description)
        .bind(changes.page_count)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn remove(&self, id: ItemId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
