//! Loan journal: durable copy of the ledger's borrowing records

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, Dependency},
    models::BorrowingRecord,
};

use super::LoanJournal;

fn db_error(e: sqlx::Error) -> AppError {
    AppError::unavailable(Dependency::LoanJournal, e)
}

#[derive(Clone)]
pub struct PgLoanJournal {
    pool: Pool<Postgres>,
}

impl PgLoanJournal {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanJournal for PgLoanJournal {
    async fn load_all(&self) -> AppResult<Vec<BorrowingRecord>> {
        sqlx::query_as::<_, BorrowingRecord>(
            r#"
            SELECT id, item_id, member_id, borrowed_at, returned_at
            FROM borrowing_records
            ORDER BY borrowed_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn record_borrow(&self, record: &BorrowingRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO borrowing_records (id, item_id, member_id, borrowed_at, returned_at)
            VALUES ($1, $2, $3, $4, NULL)
            "#,
        )
        .bind(record.id())
        .bind(record.item_id())
        .bind(record.member_id())
        .bind(record.borrowed_at())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn record_return(&self, record: &BorrowingRecord) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE borrowing_records SET returned_at = $1 WHERE id = $2 AND returned_at IS NULL",
        )
        .bind(record.returned_at())
        .bind(record.id())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::Internal(format!(
                "Borrowing record {} is not open in the journal",
                record.id()
            )));
        }

        Ok(())
    }
}
