//! Members repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, ConflictKind, Dependency},
    models::{CreateMember, Member, MemberId, UpdateMember},
};

use super::MemberDirectory;

fn db_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(ConflictKind::DuplicateEmail, "A patron with this email already exists");
        }
    }
    AppError::unavailable(Dependency::MemberDirectory, e)
}

#[derive(Clone)]
pub struct PgMemberDirectory {
    pool: Pool<Postgres>,
}

impl PgMemberDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberDirectory for PgMemberDirectory {
    async fn get(&self, id: MemberId) -> AppResult<Option<Member>> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn exists(&self, id: MemberId) -> AppResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn list(&self) -> AppResult<Vec<Member>> {
        sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn create(&self, member: &CreateMember) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (name, email, phone, address, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(&member.address)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn update(&self, id: MemberId, changes: &UpdateMember) -> AppResult<Option<Member>> {
        sqlx::query_as::<_, Member>(
            r#"
            UPDATE members SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                updated_at = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(&changes.address)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn remove(&self, id: MemberId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
