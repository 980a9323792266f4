//! # Expense Repository
//!
//! The expense ledger: cash outflows (rent, supplies, services) recorded
//! against the drawer. Expenses feed the profit and cash-balance reports
//! and appear as negative entries in the journal.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::validation::{validate_amount_cents, validate_description};
use mercado_core::{DateRange, Expense};

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense.
    ///
    /// ## Rules
    /// - Description must be non-empty
    /// - Amount must be strictly positive (cents)
    pub async fn create(&self, description: &str, amount_cents: i64) -> DbResult<Expense> {
        self.create_at(description, amount_cents, Utc::now()).await
    }

    /// Expense with an explicit timestamp, for deterministic report tests.
    pub(crate) async fn create_at(
        &self,
        description: &str,
        amount_cents: i64,
        at: DateTime<Utc>,
    ) -> DbResult<Expense> {
        validate_description(description)?;
        validate_amount_cents(amount_cents)?;

        let description = description.trim();
        debug!(description = %description, amount_cents, "Recording expense");

        let id = sqlx::query(
            "INSERT INTO expenses (created_at, description, amount_cents) VALUES (?1, ?2, ?3)",
        )
        .bind(at)
        .bind(description)
        .bind(amount_cents)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Expense {
            id,
            created_at: at,
            description: description.to_string(),
            amount_cents,
        })
    }

    /// Lists expenses inside a window, newest first.
    pub async fn list_range(&self, range: DateRange) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, created_at, description, amount_cents
            FROM expenses
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Lists the expenses of one calendar day, newest first.
    pub async fn list_by_date(&self, date: NaiveDate) -> DbResult<Vec<Expense>> {
        self.list_range(DateRange::single_day(date)).await
    }

    /// Deletes an expense (recorded by mistake).
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting expense");

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
