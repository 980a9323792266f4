//! # Report Repository
//!
//! Aggregation queries over the sales, returns and expense ledgers.
//!
//! ## Reporting Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Reporting Pipeline                                 │
//! │                                                                         │
//! │  Period::Week ──resolve(today)──► DateRange [Mon 00:00, tomorrow)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReportRepository                                                      │
//! │  ├── sales_report(range)      SUM/COUNT over sales + returns           │
//! │  ├── profit_report(range)     joins sale_items → products for costs    │
//! │  ├── cash_balance(range, s0)  s0 + net sales − returns − expenses      │
//! │  ├── journal(range)           UNION ALL of the three ledgers           │
//! │  ├── category_breakdown(...)  revenue grouped by category              │
//! │  ├── product_breakdown(...)   revenue grouped by product               │
//! │  └── daily_trend(today, n)    per-day totals, zero-filled              │
//! │                                                                         │
//! │  Reads only. Running a report twice never changes its result.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All methods take a half-open [`DateRange`]; resolving period keywords
//! is the caller's job (see [`mercado_core::Period`]).

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::period::last_n_days;
use mercado_core::{
    CashBalanceReport, CategoryRevenue, DailySales, DashboardSummary, DateRange, JournalEntry,
    JournalKind, Period, ProductRevenue, ProductUnits, ProfitReport, SalesReport,
    LOW_STOCK_THRESHOLD, RECHARGE_COMMISSION_CENTS,
};

/// Read-only reporting engine over the ledgers.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales figures for a window.
    ///
    /// An empty window yields a zeroed report, not an error.
    pub async fn sales_report(&self, range: DateRange) -> DbResult<SalesReport> {
        debug!(start = %range.start, end = %range.end, "Building sales report");

        let (gross_cents, discount_cents, ticket_count) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT COALESCE(SUM(subtotal_cents), 0),
                   COALESCE(SUM(discount_cents), 0),
                   COUNT(*)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        let returns_cents = self.refunds_in(range).await?;

        let top_products = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT p.name, SUM(si.quantity) AS units
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
              AND p.kind = 'standard'
            GROUP BY p.name
            ORDER BY units DESC, p.name
            LIMIT 5
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(name, units)| ProductUnits { name, units })
        .collect();

        Ok(SalesReport {
            gross_cents,
            discount_cents,
            returns_cents,
            net_sales_cents: gross_cents - discount_cents - returns_cents,
            ticket_count,
            top_products,
        })
    }

    /// Estimated profit for a window.
    ///
    /// Goods carry their purchase cost; recharges have no cost basis, so
    /// their contribution is the fixed commission per unit, reported
    /// separately.
    pub async fn profit_report(&self, range: DateRange) -> DbResult<ProfitReport> {
        debug!(start = %range.start, end = %range.end, "Building profit report");

        let (gross_revenue_cents, discount_cents) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(subtotal_cents), 0),
                   COALESCE(SUM(discount_cents), 0)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        let cost_of_goods_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(si.quantity * p.cost_cents), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
              AND p.kind = 'standard'
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        let (recharge_revenue_cents, recharge_units) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(si.subtotal_cents), 0),
                   COALESCE(SUM(si.quantity), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
              AND p.kind = 'non_inventoried'
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        let returns_cents = self.refunds_in(range).await?;
        let expenses_cents = self.expenses_in(range).await?;

        Ok(ProfitReport {
            gross_revenue_cents,
            cost_of_goods_cents,
            discount_cents,
            returns_cents,
            expenses_cents,
            recharge_revenue_cents,
            recharge_profit_cents: recharge_units * RECHARGE_COMMISSION_CENTS,
            net_profit_cents: (gross_revenue_cents - discount_cents)
                - returns_cents
                - expenses_cents,
        })
    }

    /// Estimated drawer position for a window.
    ///
    /// The starting balance is whatever the caller says was in the drawer
    /// at the start of the window; this engine reads no configuration.
    pub async fn cash_balance(
        &self,
        range: DateRange,
        starting_cents: i64,
    ) -> DbResult<CashBalanceReport> {
        let net_sales_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        let returns_cents = self.refunds_in(range).await?;
        let expenses_cents = self.expenses_in(range).await?;

        Ok(CashBalanceReport {
            starting_cents,
            net_sales_cents,
            returns_cents,
            expenses_cents,
            ending_cents: starting_cents + net_sales_cents - returns_cents - expenses_cents,
        })
    }

    /// The unified ledger view: sales, expenses and returns merged and
    /// sorted newest first.
    ///
    /// Sales appear with positive amounts; expenses and returns with
    /// negative amounts.
    pub async fn journal(&self, range: DateRange) -> DbResult<Vec<JournalEntry>> {
        debug!(start = %range.start, end = %range.end, "Building journal");

        type Row = (
            chrono::DateTime<chrono::Utc>,
            String,
            i64,
            Option<i64>,
            Option<String>,
            i64,
        );

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT created_at AS at, 'sale' AS kind, id AS source_id,
                   NULL AS sale_id, NULL AS detail, total_cents AS amount_cents
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            UNION ALL
            SELECT created_at, 'expense', id, NULL, description, -amount_cents
            FROM expenses
            WHERE created_at >= ?1 AND created_at < ?2
            UNION ALL
            SELECT created_at, 'return', id, sale_id, NULL, -refund_cents
            FROM returns
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY at DESC, source_id DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(at, kind, source_id, sale_id, detail, amount_cents)| {
                let kind = match kind.as_str() {
                    "sale" => JournalKind::Sale,
                    "expense" => JournalKind::Expense,
                    "return" => JournalKind::Return,
                    other => {
                        return Err(DbError::Internal(format!(
                            "unexpected journal kind: {other}"
                        )))
                    }
                };
                Ok(JournalEntry {
                    at,
                    kind,
                    source_id,
                    sale_id,
                    detail,
                    amount_cents,
                })
            })
            .collect()
    }

    /// Revenue grouped by category. Uncategorized products group under
    /// "Sin Categoría".
    pub async fn category_breakdown(&self, range: DateRange) -> DbResult<Vec<CategoryRevenue>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT COALESCE(c.name, 'Sin Categoría') AS category,
                   SUM(si.subtotal_cents) AS revenue
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
            GROUP BY category
            ORDER BY revenue DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(category, revenue_cents)| CategoryRevenue {
                category,
                revenue_cents,
            })
            .collect())
    }

    /// Revenue grouped by product, highest first.
    pub async fn product_breakdown(&self, range: DateRange) -> DbResult<Vec<ProductRevenue>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT p.name, SUM(si.subtotal_cents) AS revenue
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.created_at >= ?1 AND s.created_at < ?2
            GROUP BY p.name
            ORDER BY revenue DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, revenue_cents)| ProductRevenue {
                name,
                revenue_cents,
            })
            .collect())
    }

    /// Per-day sale totals for the last `n` days ending at `today`.
    ///
    /// Days with no sales appear as zero so charts get a continuous axis.
    pub async fn daily_trend(&self, today: NaiveDate, n: u32) -> DbResult<Vec<DailySales>> {
        let days = last_n_days(today, n);
        let range = match (days.first(), days.last()) {
            (Some(first), Some(last)) => DateRange::days(*first, *last),
            _ => return Ok(Vec::new()),
        };

        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT DATE(created_at) AS day, SUM(total_cents) AS total
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            GROUP BY day
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        let mut totals = std::collections::HashMap::with_capacity(rows.len());
        for (day, total) in rows {
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| DbError::Internal(format!("unparseable day '{day}': {e}")))?;
            totals.insert(date, total);
        }

        Ok(days
            .into_iter()
            .map(|date| DailySales {
                date,
                total_cents: totals.get(&date).copied().unwrap_or(0),
            })
            .collect())
    }

    /// Headline numbers for the dashboard cards.
    pub async fn dashboard(&self, today: NaiveDate) -> DbResult<DashboardSummary> {
        let range = Period::Day.resolve(today);

        let (sales_cents, tickets_today) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(total_cents), 0), COUNT(*)
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        let returns_cents = self.refunds_in(range).await?;

        let low_stock_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE kind = 'standard' AND stock <= ?1",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardSummary {
            net_sales_today_cents: sales_cents - returns_cents,
            tickets_today,
            low_stock_count,
        })
    }

    /// Total refunds paid out inside a window.
    async fn refunds_in(&self, range: DateRange) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(refund_cents), 0)
            FROM returns
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Total expenses recorded inside a window.
    ///
    /// Expenses filter by the same timestamp window as sales, so a profit
    /// report never mixes granularities.
    async fn expenses_in(&self, range: DateRange) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM expenses
            WHERE created_at >= ?1 AND created_at < ?2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{TimeZone, Utc};
    use mercado_core::{
        Cart, NewProduct, PaymentMethod, Product, ProductKind, ReturnLine, SaleLine,
    };

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 19).unwrap()
    }

    fn at(hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 19, hour, 0, 0).unwrap()
    }

    async fn seed_product(
        db: &Database,
        barcode: &str,
        name: &str,
        price: i64,
        cost: i64,
        stock: i64,
        kind: ProductKind,
        category_id: Option<i64>,
    ) -> Product {
        db.products()
            .create(&NewProduct {
                barcode: barcode.to_string(),
                name: name.to_string(),
                description: String::new(),
                price_cents: price,
                cost_cents: cost,
                stock,
                kind,
                category_id,
            })
            .await
            .unwrap()
    }

    async fn sell_at(
        db: &Database,
        product: &Product,
        quantity: i64,
        discount: i64,
        hour: u32,
    ) -> i64 {
        let mut cart = Cart::new();
        cart.add_product(product, quantity).unwrap();
        db.sales()
            .create_sale_at(&cart.lines(), discount, PaymentMethod::Cash, at(hour))
            .await
            .unwrap()
            .sale
            .id
    }

    #[tokio::test]
    async fn test_sales_report_figures() {
        let db = test_db().await;
        let pencil =
            seed_product(&db, "P-1", "Lápiz", 350, 150, 50, ProductKind::Standard, None).await;

        // two tickets: 4 × $3.50 with 10% off, and 2 × $3.50
        sell_at(&db, &pencil, 4, 140, 9).await;
        let second = sell_at(&db, &pencil, 2, 0, 10).await;

        // one pencil comes back
        db.returns()
            .create_return_at(
                second,
                &[ReturnLine {
                    product_id: pencil.id,
                    quantity: 1,
                    refund_cents: 350,
                }],
                at(11),
            )
            .await
            .unwrap();

        let report = db
            .reports()
            .sales_report(Period::Day.resolve(day()))
            .await
            .unwrap();

        assert_eq!(report.gross_cents, 2100);
        assert_eq!(report.discount_cents, 140);
        assert_eq!(report.returns_cents, 350);
        assert_eq!(report.net_sales_cents, 2100 - 140 - 350);
        assert_eq!(report.ticket_count, 2);
        assert_eq!(report.top_products[0].name, "Lápiz");
        assert_eq!(report.top_products[0].units, 6);
    }

    #[tokio::test]
    async fn test_reports_are_idempotent_reads() {
        let db = test_db().await;
        let pencil =
            seed_product(&db, "P-1", "Lápiz", 350, 150, 50, ProductKind::Standard, None).await;
        sell_at(&db, &pencil, 3, 0, 9).await;

        let range = Period::Day.resolve(day());
        let first = db.reports().sales_report(range).await.unwrap();
        let second = db.reports().sales_report(range).await.unwrap();
        assert_eq!(first, second);

        // and running the report changed no stock
        assert_eq!(db.products().get(pencil.id).await.unwrap().unwrap().stock, 47);
    }

    #[tokio::test]
    async fn test_profit_report_separates_recharges() {
        let db = test_db().await;
        let pencil =
            seed_product(&db, "P-1", "Lápiz", 350, 150, 50, ProductKind::Standard, None).await;
        let recharge = seed_product(
            &db,
            "R-1",
            "Recarga Celular",
            0,
            0,
            0,
            ProductKind::NonInventoried,
            None,
        )
        .await;

        sell_at(&db, &pencil, 2, 0, 9).await; // revenue 700, cost 300

        let mut cart = Cart::new();
        cart.add_recharge(&recharge, 2000).unwrap();
        cart.add_recharge(&recharge, 2000).unwrap(); // 2 × $21.00
        db.sales()
            .create_sale_at(&cart.lines(), 0, PaymentMethod::Cash, at(10))
            .await
            .unwrap();

        db.expenses().create_at("Bolsas", 100, at(11)).await.unwrap();

        let report = db
            .reports()
            .profit_report(Period::Day.resolve(day()))
            .await
            .unwrap();

        assert_eq!(report.gross_revenue_cents, 700 + 4200);
        assert_eq!(report.cost_of_goods_cents, 300);
        assert_eq!(report.recharge_revenue_cents, 4200);
        assert_eq!(report.recharge_profit_cents, 200); // 2 × $1.00 commission
        assert_eq!(report.expenses_cents, 100);
        assert_eq!(report.net_profit_cents, 4900 - 0 - 0 - 100);
    }

    #[tokio::test]
    async fn test_cash_balance_arithmetic() {
        let db = test_db().await;
        let pencil =
            seed_product(&db, "P-1", "Lápiz", 350, 150, 50, ProductKind::Standard, None).await;

        let sale = sell_at(&db, &pencil, 4, 0, 9).await; // +1400
        db.expenses().create_at("Renta", 500, at(10)).await.unwrap(); // -500
        db.returns()
            .create_return_at(
                sale,
                &[ReturnLine {
                    product_id: pencil.id,
                    quantity: 1,
                    refund_cents: 350,
                }],
                at(11),
            )
            .await
            .unwrap(); // -350

        let balance = db
            .reports()
            .cash_balance(Period::Day.resolve(day()), 10_000)
            .await
            .unwrap();

        assert_eq!(balance.net_sales_cents, 1400);
        assert_eq!(balance.expenses_cents, 500);
        assert_eq!(balance.returns_cents, 350);
        assert_eq!(balance.ending_cents, 10_000 + 1400 - 500 - 350);
    }

    #[tokio::test]
    async fn test_journal_merges_descending() {
        let db = test_db().await;
        let pencil =
            seed_product(&db, "P-1", "Lápiz", 350, 150, 50, ProductKind::Standard, None).await;

        let sale_id = sell_at(&db, &pencil, 2, 0, 10).await;
        db.expenses()
            .create_at("Renta del local", 500, at(11))
            .await
            .unwrap();
        db.returns()
            .create_return_at(
                sale_id,
                &[ReturnLine {
                    product_id: pencil.id,
                    quantity: 1,
                    refund_cents: 350,
                }],
                at(12),
            )
            .await
            .unwrap();

        let journal = db
            .reports()
            .journal(Period::Day.resolve(day()))
            .await
            .unwrap();

        assert_eq!(journal.len(), 3);

        // newest first: return (12:00), expense (11:00), sale (10:00)
        assert_eq!(journal[0].kind, JournalKind::Return);
        assert_eq!(journal[0].amount_cents, -350);
        assert_eq!(journal[0].sale_id, Some(sale_id));

        assert_eq!(journal[1].kind, JournalKind::Expense);
        assert_eq!(journal[1].amount_cents, -500);
        assert_eq!(journal[1].detail.as_deref(), Some("Renta del local"));

        assert_eq!(journal[2].kind, JournalKind::Sale);
        assert_eq!(journal[2].amount_cents, 700);
        assert_eq!(journal[2].source_id, sale_id);
    }

    #[tokio::test]
    async fn test_category_breakdown_groups_uncategorized() {
        let db = test_db().await;
        let papeleria = db.categories().create("Papelería").await.unwrap();

        let pencil = seed_product(
            &db,
            "P-1",
            "Lápiz",
            350,
            150,
            50,
            ProductKind::Standard,
            Some(papeleria.id),
        )
        .await;
        let soda =
            seed_product(&db, "S-1", "Refresco", 1800, 1200, 30, ProductKind::Standard, None)
                .await;

        sell_at(&db, &pencil, 2, 0, 9).await; // 700 Papelería
        sell_at(&db, &soda, 1, 0, 10).await; // 1800 uncategorized

        let breakdown = db
            .reports()
            .category_breakdown(Period::Day.resolve(day()))
            .await
            .unwrap();

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Sin Categoría");
        assert_eq!(breakdown[0].revenue_cents, 1800);
        assert_eq!(breakdown[1].category, "Papelería");
        assert_eq!(breakdown[1].revenue_cents, 700);
    }

    #[tokio::test]
    async fn test_daily_trend_zero_fills() {
        let db = test_db().await;
        let pencil =
            seed_product(&db, "P-1", "Lápiz", 350, 150, 50, ProductKind::Standard, None).await;

        // sales on the 17th and 19th, nothing on the 18th
        let lines = |qty: i64| {
            vec![SaleLine {
                product_id: pencil.id,
                name: pencil.name.clone(),
                quantity: qty,
                unit_price_cents: 350,
                subtotal_cents: 350 * qty,
            }]
        };
        db.sales()
            .create_sale_at(
                &lines(1),
                0,
                PaymentMethod::Cash,
                Utc.with_ymd_and_hms(2026, 8, 17, 12, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        db.sales()
            .create_sale_at(&lines(2), 0, PaymentMethod::Cash, at(9))
            .await
            .unwrap();

        let trend = db.reports().daily_trend(day(), 3).await.unwrap();

        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2026, 8, 17).unwrap());
        assert_eq!(trend[0].total_cents, 350);
        assert_eq!(trend[1].total_cents, 0);
        assert_eq!(trend[2].total_cents, 700);
    }

    #[tokio::test]
    async fn test_dashboard_summary() {
        let db = test_db().await;
        let pencil =
            seed_product(&db, "P-1", "Lápiz", 350, 150, 3, ProductKind::Standard, None).await;

        sell_at(&db, &pencil, 2, 0, 9).await;

        let summary = db.reports().dashboard(day()).await.unwrap();
        assert_eq!(summary.net_sales_today_cents, 700);
        assert_eq!(summary.tickets_today, 1);
        // 3 - 2 = 1 left, at or below the threshold
        assert_eq!(summary.low_stock_count, 1);
    }

    #[tokio::test]
    async fn test_empty_window_is_zero_not_error() {
        let db = test_db().await;
        let range = Period::Day.resolve(day());

        let sales = db.reports().sales_report(range).await.unwrap();
        assert_eq!(sales.ticket_count, 0);
        assert_eq!(sales.net_sales_cents, 0);
        assert!(sales.top_products.is_empty());

        assert!(db.reports().journal(range).await.unwrap().is_empty());
        assert!(db
            .reports()
            .category_breakdown(range)
            .await
            .unwrap()
            .is_empty());
    }
}
