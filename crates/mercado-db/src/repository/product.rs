//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Barcode lookup (the scan path at the register)
//! - CRUD with validation
//! - Stock adjustments that never go negative
//! - Low-stock listing for the restock screen
//!
//! ## Stock Adjustment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: Absolute update (races with concurrent sales)               │
//! │     UPDATE products SET stock = 7 WHERE id = ?                         │
//! │                                                                         │
//! │  ✅ CORRECT: Delta update with a floor guard                           │
//! │     UPDATE products SET stock = stock - 3                              │
//! │     WHERE id = ? AND stock >= 3                                        │
//! │                                                                         │
//! │  rows_affected = 0 distinguishes "missing" from "would go negative"    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::validation::{
    validate_barcode, validate_price_cents, validate_product_name, validate_stock,
};
use mercado_core::{NewProduct, Product, ProductKind, LOW_STOCK_THRESHOLD};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its assigned id
    /// * `Err(DbError::UniqueViolation)` - Barcode already exists
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        validate_barcode(&new.barcode)?;
        validate_product_name(&new.name)?;
        validate_price_cents(new.price_cents)?;
        validate_price_cents(new.cost_cents)?;
        validate_stock(new.stock)?;

        debug!(barcode = %new.barcode, name = %new.name, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                barcode, name, description,
                price_cents, cost_cents, stock, kind, category_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(new.barcode.trim())
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.price_cents)
        .bind(new.cost_cents)
        .bind(new.stock)
        .bind(new.kind)
        .bind(new.category_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();

        Ok(Product {
            id,
            barcode: new.barcode.trim().to_string(),
            name: new.name.trim().to_string(),
            description: new.description.clone(),
            price_cents: new.price_cents,
            cost_cents: new.cost_cents,
            stock: new.stock,
            kind: new.kind,
            category_id: new.category_id,
        })
    }

    /// Gets a product by its ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, description,
                   price_cents, cost_cents, stock, kind, category_id
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode (the scan path).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, description,
                   price_cents, cost_cents, stock, kind, category_id
            FROM products
            WHERE barcode = ?1
            "#,
        )
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, description,
                   price_cents, cost_cents, stock, kind, category_id
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists the products of one category, sorted by name.
    pub async fn list_by_category(&self, category_id: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, description,
                   price_cents, cost_cents, stock, kind, category_id
            FROM products
            WHERE category_id = ?1
            ORDER BY name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches products by name or barcode substring.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list().await;
        }

        debug!(term = %term, "Searching products");

        let pattern = format!("%{}%", term);
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, description,
                   price_cents, cost_cents, stock, kind, category_id
            FROM products
            WHERE name LIKE ?1 OR barcode LIKE ?1
            ORDER BY name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates an existing product.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::UniqueViolation)` - New barcode collides
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_barcode(&product.barcode)?;
        validate_product_name(&product.name)?;
        validate_price_cents(product.price_cents)?;
        validate_price_cents(product.cost_cents)?;
        validate_stock(product.stock)?;

        debug!(id = product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                barcode = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                cost_cents = ?6,
                stock = ?7,
                kind = ?8,
                category_id = ?9
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(product.barcode.trim())
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.kind)
        .bind(product.category_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// The non-inventoried recharge entry is protected and cannot be
    /// deleted. Products referenced by sale history cannot be deleted
    /// either; the foreign key constraint surfaces as
    /// [`DbError::ForeignKeyViolation`].
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let row = sqlx::query_as::<_, (String, ProductKind)>(
            "SELECT name, kind FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let (name, kind) = row.ok_or_else(|| DbError::not_found("Product", id))?;
        if kind == ProductKind::NonInventoried {
            return Err(DbError::ProtectedProduct { name });
        }

        debug!(id, "Deleting product");

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Adjusts stock by a delta (positive restocks, negative removes).
    ///
    /// Stock never goes below zero: a delta that would cross the floor
    /// fails with [`DbError::InsufficientStock`] and leaves stock unchanged.
    ///
    /// ## Returns
    /// The new stock level.
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> DbResult<i64> {
        debug!(id, delta, "Adjusting stock");

        let row = sqlx::query_as::<_, (String, i64)>(
            "SELECT name, stock FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let (name, stock) = row.ok_or_else(|| DbError::not_found("Product", id))?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::InsufficientStock {
                name,
                available: stock,
                requested: -delta,
            });
        }

        Ok(stock + delta)
    }

    /// Lists stock-tracked products at or below the low-stock threshold.
    ///
    /// Non-inventoried products (recharges) never show up here: their
    /// stock field is a counter, not inventory.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, barcode, name, description,
                   price_cents, cost_cents, stock, kind, category_id
            FROM products
            WHERE kind = 'standard' AND stock <= ?1
            ORDER BY stock, name
            "#,
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts total products (for diagnostics and seed checks).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn pencil() -> NewProduct {
        NewProduct {
            barcode: "7501031310017".to_string(),
            name: "Lápiz HB #2".to_string(),
            description: String::new(),
            price_cents: 350,
            cost_cents: 150,
            stock: 10,
            kind: ProductKind::Standard,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.create(&pencil()).await.unwrap();
        assert!(created.id > 0);

        let by_id = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Lápiz HB #2");

        let by_barcode = repo
            .get_by_barcode("7501031310017")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_barcode.id, created.id);

        assert!(repo.get(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_barcode_leaves_catalog_unchanged() {
        let db = test_db().await;
        let repo = db.products();

        repo.create(&pencil()).await.unwrap();

        let mut dup = pencil();
        dup.name = "Otro Lápiz".to_string();
        assert!(matches!(
            repo.create(&dup).await,
            Err(DbError::UniqueViolation { .. })
        ));

        assert_eq!(repo.count().await.unwrap(), 1);
        let survivor = repo.get_by_barcode("7501031310017").await.unwrap().unwrap();
        assert_eq!(survivor.name, "Lápiz HB #2");
    }

    #[tokio::test]
    async fn test_adjust_stock_floor() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.create(&pencil()).await.unwrap();

        assert_eq!(repo.adjust_stock(product.id, -3).await.unwrap(), 7);
        assert_eq!(repo.adjust_stock(product.id, 5).await.unwrap(), 12);

        let err = repo.adjust_stock(product.id, -20).await.unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { available: 12, .. }));

        // failed adjustment left stock untouched
        assert_eq!(repo.get(product.id).await.unwrap().unwrap().stock, 12);
    }

    #[tokio::test]
    async fn test_low_stock_excludes_recharges() {
        let db = test_db().await;
        let repo = db.products();

        let mut low = pencil();
        low.stock = 2;
        repo.create(&low).await.unwrap();

        let mut plenty = pencil();
        plenty.barcode = "7501031310024".to_string();
        plenty.name = "Cuaderno".to_string();
        plenty.stock = 50;
        repo.create(&plenty).await.unwrap();

        let mut recharge = pencil();
        recharge.barcode = "RECARGA-001".to_string();
        recharge.name = "Recarga Celular".to_string();
        recharge.stock = 0;
        recharge.kind = ProductKind::NonInventoried;
        repo.create(&recharge).await.unwrap();

        let alerts = repo.low_stock().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].name, "Lápiz HB #2");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.products();
        let mut product = repo.create(&pencil()).await.unwrap();

        product.price_cents = 400;
        repo.update(&product).await.unwrap();
        assert_eq!(repo.get(product.id).await.unwrap().unwrap().price_cents, 400);

        repo.delete(product.id).await.unwrap();
        assert!(repo.get(product.id).await.unwrap().is_none());

        assert!(matches!(
            repo.delete(product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_recharge_entry_cannot_be_deleted() {
        let db = test_db().await;
        let repo = db.products();

        let mut recharge = pencil();
        recharge.barcode = "RECARGA-001".to_string();
        recharge.name = "Recarga Celular".to_string();
        recharge.kind = ProductKind::NonInventoried;
        let created = repo.create(&recharge).await.unwrap();

        assert!(matches!(
            repo.delete(created.id).await,
            Err(DbError::ProtectedProduct { .. })
        ));
        assert!(repo.get(created.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let db = test_db().await;
        let papeleria = db.categories().create("Papelería").await.unwrap();

        let mut categorized = pencil();
        categorized.category_id = Some(papeleria.id);
        db.products().create(&categorized).await.unwrap();

        let mut loose = pencil();
        loose.barcode = "7501031310024".to_string();
        loose.name = "Cuaderno".to_string();
        db.products().create(&loose).await.unwrap();

        let listed = db.products().list_by_category(papeleria.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Lápiz HB #2");
    }

    #[tokio::test]
    async fn test_search_by_name_and_barcode() {
        let db = test_db().await;
        let repo = db.products();
        repo.create(&pencil()).await.unwrap();

        assert_eq!(repo.search("Lápiz").await.unwrap().len(), 1);
        assert_eq!(repo.search("750103").await.unwrap().len(), 1);
        assert!(repo.search("inexistente").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_invalid_input() {
        let db = test_db().await;
        let repo = db.products();

        let mut bad = pencil();
        bad.barcode = "  ".to_string();
        assert!(matches!(
            repo.create(&bad).await,
            Err(DbError::Validation(_))
        ));

        let mut negative = pencil();
        negative.price_cents = -1;
        assert!(repo.create(&negative).await.is_err());
    }
}
