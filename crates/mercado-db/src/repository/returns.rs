//! # Return Repository
//!
//! The transactional return engine: refunds against a prior sale.
//!
//! ## Return Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Return Transaction                                 │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── sale exists?                       no → ROLLBACK (NotFound)      │
//! │    │                                                                    │
//! │    ├── for each returned line:                                          │
//! │    │     ├── sold = Σ sale_items.quantity for this product              │
//! │    │     ├── returned = Σ prior returns for this product                │
//! │    │     ├── returned + requested > sold → ROLLBACK (ReturnTooLarge)    │
//! │    │     ├── INSERT returns row                                         │
//! │    │     └── standard product: UPDATE stock = stock + qty               │
//! │    │                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale may accumulate several partial returns, but across all of them no
//! product can come back in greater quantity than it left.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::validation::validate_quantity;
use mercado_core::{DateRange, ProductKind, ReturnLine, ReturnRecord, ValidationError};

/// Repository for return database operations.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Records a return against a sale: return rows and stock restoration
    /// in one transaction.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Sale missing, or a line's product never sold
    ///   on that sale
    /// * `DbError::ReturnTooLarge` - Cumulative returns would exceed the
    ///   quantity sold
    pub async fn create_return(
        &self,
        sale_id: i64,
        lines: &[ReturnLine],
    ) -> DbResult<Vec<ReturnRecord>> {
        self.create_return_at(sale_id, lines, Utc::now()).await
    }

    /// Return with an explicit timestamp, for deterministic report tests.
    pub(crate) async fn create_return_at(
        &self,
        sale_id: i64,
        lines: &[ReturnLine],
        at: DateTime<Utc>,
    ) -> DbResult<Vec<ReturnRecord>> {
        if lines.is_empty() {
            return Err(ValidationError::Required {
                field: "lines".to_string(),
            }
            .into());
        }

        for line in lines {
            validate_quantity(line.quantity)?;
            if line.refund_cents < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "refund".to_string(),
                    min: 0,
                    max: i64::MAX,
                }
                .into());
            }
        }

        debug!(sale_id, lines = lines.len(), "Creating return");

        let mut tx = self.pool.begin().await?;

        let sale_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE id = ?1")
            .bind(sale_id)
            .fetch_one(&mut *tx)
            .await?;
        if sale_exists == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        // Quantities already accepted earlier in this same batch also count
        // toward the cap.
        let mut batch_returned: HashMap<i64, i64> = HashMap::new();
        let mut records = Vec::with_capacity(lines.len());

        for line in lines {
            let sold: i64 = sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(quantity), 0)
                FROM sale_items
                WHERE sale_id = ?1 AND product_id = ?2
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .fetch_one(&mut *tx)
            .await?;

            if sold == 0 {
                return Err(DbError::not_found(
                    "Sale item for product",
                    line.product_id,
                ));
            }

            let previously_returned: i64 = sqlx::query_scalar(
                r#"
                SELECT COALESCE(SUM(quantity), 0)
                FROM returns
                WHERE sale_id = ?1 AND product_id = ?2
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .fetch_one(&mut *tx)
            .await?;

            let already_returned =
                previously_returned + batch_returned.get(&line.product_id).copied().unwrap_or(0);

            if already_returned + line.quantity > sold {
                return Err(DbError::ReturnTooLarge {
                    product_id: line.product_id,
                    sold,
                    already_returned,
                    requested: line.quantity,
                });
            }

            let id = sqlx::query(
                r#"
                INSERT INTO returns (sale_id, product_id, quantity, refund_cents, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.refund_cents)
            .bind(at)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            // Physical goods go back on the shelf; recharges have nothing
            // to restore.
            sqlx::query("UPDATE products SET stock = stock + ?2 WHERE id = ?1 AND kind = ?3")
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(ProductKind::Standard)
                .execute(&mut *tx)
                .await?;

            *batch_returned.entry(line.product_id).or_insert(0) += line.quantity;

            records.push(ReturnRecord {
                id,
                sale_id,
                product_id: line.product_id,
                quantity: line.quantity,
                refund_cents: line.refund_cents,
                created_at: at,
            });
        }

        tx.commit().await?;

        debug!(sale_id, count = records.len(), "Return committed");
        Ok(records)
    }

    /// Lists all returns recorded against a sale.
    pub async fn list_for_sale(&self, sale_id: i64) -> DbResult<Vec<ReturnRecord>> {
        let returns = sqlx::query_as::<_, ReturnRecord>(
            r#"
            SELECT id, sale_id, product_id, quantity, refund_cents, created_at
            FROM returns
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }

    /// Lists returns inside a window, newest first.
    pub async fn list_range(&self, range: DateRange) -> DbResult<Vec<ReturnRecord>> {
        let returns = sqlx::query_as::<_, ReturnRecord>(
            r#"
            SELECT id, sale_id, product_id, quantity, refund_cents, created_at
            FROM returns
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mercado_core::{Cart, NewProduct, PaymentMethod, Product, SaleWithItems};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_pencil(db: &Database, stock: i64) -> Product {
        db.products()
            .create(&NewProduct {
                barcode: "7501031310017".to_string(),
                name: "Lápiz HB #2".to_string(),
                description: String::new(),
                price_cents: 350,
                cost_cents: 150,
                stock,
                kind: ProductKind::Standard,
                category_id: None,
            })
            .await
            .unwrap()
    }

    async fn sell(db: &Database, product: &Product, quantity: i64) -> SaleWithItems {
        let mut cart = Cart::new();
        cart.add_product(product, quantity).unwrap();
        db.sales()
            .create_sale(&cart.lines(), 0, PaymentMethod::Cash)
            .await
            .unwrap()
    }

    fn line(product: &Product, quantity: i64) -> ReturnLine {
        ReturnLine {
            product_id: product.id,
            quantity,
            refund_cents: product.price_cents * quantity,
        }
    }

    #[tokio::test]
    async fn test_full_return_round_trip() {
        let db = test_db().await;
        let pencil = seed_pencil(&db, 10).await;

        let sale = sell(&db, &pencil, 4).await;
        assert_eq!(db.products().get(pencil.id).await.unwrap().unwrap().stock, 6);

        let records = db
            .returns()
            .create_return(sale.sale.id, &[line(&pencil, 4)])
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].refund_cents, 1400);
        // stock is back where it started
        assert_eq!(
            db.products().get(pencil.id).await.unwrap().unwrap().stock,
            10
        );
    }

    #[tokio::test]
    async fn test_partial_returns_accumulate_to_cap() {
        let db = test_db().await;
        let pencil = seed_pencil(&db, 10).await;
        let sale = sell(&db, &pencil, 4).await;

        db.returns()
            .create_return(sale.sale.id, &[line(&pencil, 2)])
            .await
            .unwrap();
        db.returns()
            .create_return(sale.sale.id, &[line(&pencil, 2)])
            .await
            .unwrap();

        // everything is back; one more unit would exceed the purchase
        let err = db
            .returns()
            .create_return(sale.sale.id, &[line(&pencil, 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::ReturnTooLarge {
                sold: 4,
                already_returned: 4,
                requested: 1,
                ..
            }
        ));

        assert_eq!(
            db.products().get(pencil.id).await.unwrap().unwrap().stock,
            10
        );
    }

    #[tokio::test]
    async fn test_cap_counts_lines_within_one_batch() {
        let db = test_db().await;
        let pencil = seed_pencil(&db, 10).await;
        let sale = sell(&db, &pencil, 3).await;

        let err = db
            .returns()
            .create_return(sale.sale.id, &[line(&pencil, 2), line(&pencil, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ReturnTooLarge { .. }));

        // the accepted first line was rolled back with the batch
        assert!(db.returns().list_for_sale(sale.sale.id).await.unwrap().is_empty());
        assert_eq!(db.products().get(pencil.id).await.unwrap().unwrap().stock, 7);
    }

    #[tokio::test]
    async fn test_product_not_on_sale_rejected() {
        let db = test_db().await;
        let pencil = seed_pencil(&db, 10).await;
        let sale = sell(&db, &pencil, 1).await;

        let stranger = ReturnLine {
            product_id: 9999,
            quantity: 1,
            refund_cents: 100,
        };
        assert!(matches!(
            db.returns().create_return(sale.sale.id, &[stranger]).await,
            Err(DbError::NotFound { .. })
        ));

        assert!(matches!(
            db.returns().create_return(9999, &[line(&pencil, 1)]).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_recharge_return_leaves_counter_alone() {
        let db = test_db().await;
        let recharge = db
            .products()
            .create(&NewProduct {
                barcode: "RECARGA-001".to_string(),
                name: "Recarga Celular".to_string(),
                description: String::new(),
                price_cents: 0,
                cost_cents: 0,
                stock: 0,
                kind: ProductKind::NonInventoried,
                category_id: None,
            })
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_recharge(&recharge, 2000).unwrap();
        let sale = db
            .sales()
            .create_sale(&cart.lines(), 0, PaymentMethod::Cash)
            .await
            .unwrap();

        let records = db
            .returns()
            .create_return(
                sale.sale.id,
                &[ReturnLine {
                    product_id: recharge.id,
                    quantity: 1,
                    refund_cents: 2100,
                }],
            )
            .await
            .unwrap();

        assert_eq!(records[0].refund_cents, 2100);
        assert_eq!(
            db.products().get(recharge.id).await.unwrap().unwrap().stock,
            0
        );
    }
}
