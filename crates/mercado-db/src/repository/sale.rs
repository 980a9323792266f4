//! # Sale Repository
//!
//! The transactional checkout engine.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Transaction                                │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── INSERT sales (header: subtotal, discount, total, method)        │
//! │    │                                                                    │
//! │    ├── for each line:                                                  │
//! │    │     ├── product exists?            no → ROLLBACK (NotFound)       │
//! │    │     ├── standard product:                                         │
//! │    │     │     UPDATE stock = stock - qty WHERE stock >= qty           │
//! │    │     │     0 rows → ROLLBACK (InsufficientStock)                   │
//! │    │     ├── non-inventoried (recharge): stock untouched               │
//! │    │     └── INSERT sale_items (snapshot of name + unit price)         │
//! │    │                                                                    │
//! │  COMMIT ← header, items and stock all move together or not at all      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock guard (`WHERE stock >= qty`) is the authoritative check: even
//! if a cart validated against stale stock, the sale cannot drive stock
//! negative.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::validation::validate_quantity;
use mercado_core::{
    DateRange, PaymentMethod, ProductKind, Sale, SaleItem, SaleLine, SaleWithItems,
    ValidationError,
};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Commits a checkout: sale header, line items and stock decrements in
    /// one transaction.
    ///
    /// ## Invariants
    /// - `subtotal = Σ line subtotals`, `total = subtotal - discount`
    /// - Standard lines decrement stock; a line that would drive stock
    ///   negative aborts the whole sale
    /// - Non-inventoried lines (recharges) never touch stock
    ///
    /// ## Errors
    /// * `DbError::NotFound` - A line references a missing product
    /// * `DbError::InsufficientStock` - Live stock can't cover a line
    pub async fn create_sale(
        &self,
        lines: &[SaleLine],
        discount_cents: i64,
        payment_method: PaymentMethod,
    ) -> DbResult<SaleWithItems> {
        self.create_sale_at(lines, discount_cents, payment_method, Utc::now())
            .await
    }

    /// Checkout with an explicit timestamp. Reports and journal ordering
    /// are tested against fixed clocks through this entry point.
    pub(crate) async fn create_sale_at(
        &self,
        lines: &[SaleLine],
        discount_cents: i64,
        payment_method: PaymentMethod,
        at: DateTime<Utc>,
    ) -> DbResult<SaleWithItems> {
        if lines.is_empty() {
            return Err(ValidationError::Required {
                field: "lines".to_string(),
            }
            .into());
        }

        for line in lines {
            validate_quantity(line.quantity)?;
        }

        let subtotal_cents: i64 = lines.iter().map(|l| l.subtotal_cents).sum();
        if !(0..=subtotal_cents).contains(&discount_cents) {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: subtotal_cents,
            }
            .into());
        }
        let total_cents = subtotal_cents - discount_cents;

        debug!(
            lines = lines.len(),
            subtotal_cents, discount_cents, total_cents, "Creating sale"
        );

        let mut tx = self.pool.begin().await?;

        let sale_id = sqlx::query(
            r#"
            INSERT INTO sales (created_at, subtotal_cents, discount_cents, total_cents, payment_method)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(at)
        .bind(subtotal_cents)
        .bind(discount_cents)
        .bind(total_cents)
        .bind(payment_method)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let row = sqlx::query_as::<_, (String, i64, ProductKind)>(
                "SELECT name, stock, kind FROM products WHERE id = ?1",
            )
            .bind(line.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            // Dropping the open transaction on the error path rolls back
            // the header and any items inserted so far.
            let (name, stock, kind) =
                row.ok_or_else(|| DbError::not_found("Product", line.product_id))?;

            if kind == ProductKind::Standard {
                let result = sqlx::query(
                    "UPDATE products SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2",
                )
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::InsufficientStock {
                        name,
                        available: stock,
                        requested: line.quantity,
                    });
                }
            }

            let item_id = sqlx::query(
                r#"
                INSERT INTO sale_items
                    (sale_id, product_id, name_snapshot, quantity, unit_price_cents, subtotal_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            items.push(SaleItem {
                id: item_id,
                sale_id,
                product_id: line.product_id,
                name_snapshot: line.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                subtotal_cents: line.subtotal_cents,
            });
        }

        tx.commit().await?;

        debug!(sale_id, "Sale committed");

        Ok(SaleWithItems {
            sale: Sale {
                id: sale_id,
                created_at: at,
                subtotal_cents,
                discount_cents,
                total_cents,
                payment_method,
            },
            items,
        })
    }

    /// Gets a sale with its items, for ticket reprints and the return screen.
    pub async fn get_with_items(&self, id: i64) -> DbResult<SaleWithItems> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, created_at, subtotal_cents, discount_cents, total_cents, payment_method
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", id))?;

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, name_snapshot, quantity, unit_price_cents, subtotal_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SaleWithItems { sale, items })
    }

    /// Lists sales inside a window, newest first.
    pub async fn list_range(&self, range: DateRange) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, created_at, subtotal_cents, discount_cents, total_cents, payment_method
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
