//! # Category Repository
//!
//! Database operations for product categories.
//!
//! Categories are created explicitly from the admin screen or implicitly by
//! the bulk importer via [`CategoryRepository::find_or_create`]. Deleting a
//! category leaves its products uncategorized (FK `ON DELETE SET NULL`).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::validation::validate_product_name;
use mercado_core::Category;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name already exists
    pub async fn create(&self, name: &str) -> DbResult<Category> {
        validate_product_name(name)?;

        debug!(name = %name, "Creating category");

        let result = sqlx::query("INSERT INTO categories (name) VALUES (?1)")
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        Ok(Category {
            id: result.last_insert_rowid(),
            name: name.trim().to_string(),
        })
    }

    /// Gets a category by ID.
    pub async fn get(&self, id: i64) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// Gets a category by its exact name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE name = ?1")
                .bind(name.trim())
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// Lists all categories sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    /// Renames a category.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No category with this id
    /// * `Err(DbError::UniqueViolation)` - New name already taken
    pub async fn update(&self, id: i64, name: &str) -> DbResult<()> {
        validate_product_name(name)?;

        debug!(id, name = %name, "Renaming category");

        let result = sqlx::query("UPDATE categories SET name = ?2 WHERE id = ?1")
            .bind(id)
            .bind(name.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Returns the category with the given name, creating it if absent.
    ///
    /// Used by the bulk importer so unknown category names in the input
    /// become real categories instead of errors.
    pub async fn find_or_create(&self, name: &str) -> DbResult<Category> {
        if let Some(existing) = self.get_by_name(name).await? {
            return Ok(existing);
        }

        match self.create(name).await {
            Ok(category) => Ok(category),
            // Lost a race with a concurrent insert; the row exists now.
            Err(DbError::UniqueViolation { .. }) => self
                .get_by_name(name)
                .await?
                .ok_or_else(|| DbError::not_found("Category", name)),
            Err(e) => Err(e),
        }
    }

    /// Deletes a category. Products keep existing with no category.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mercado_core::{NewProduct, ProductKind};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let db = test_db().await;
        let repo = db.categories();

        let papeleria = repo.create("Papelería").await.unwrap();
        repo.create("Abarrotes").await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Abarrotes"); // sorted

        repo.delete(papeleria.id).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);

        assert!(matches!(
            repo.delete(papeleria.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        let repo = db.categories();

        repo.create("Papelería").await.unwrap();
        assert!(matches!(
            repo.create("Papelería").await,
            Err(DbError::UniqueViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_renames_category() {
        let db = test_db().await;
        let repo = db.categories();

        let category = repo.create("Papeleria").await.unwrap();
        repo.create("Abarrotes").await.unwrap();

        repo.update(category.id, "Papelería").await.unwrap();
        let renamed = repo.get(category.id).await.unwrap().unwrap();
        assert_eq!(renamed.name, "Papelería");

        // renaming onto an existing name hits the unique constraint
        assert!(matches!(
            repo.update(category.id, "Abarrotes").await,
            Err(DbError::UniqueViolation { .. })
        ));

        assert!(matches!(
            repo.update(9999, "Dulces").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let db = test_db().await;
        let repo = db.categories();

        let first = repo.find_or_create("Dulces").await.unwrap();
        let second = repo.find_or_create("Dulces").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_uncategorizes_products() {
        let db = test_db().await;
        let category = db.categories().create("Papelería").await.unwrap();

        let product = db
            .products()
            .create(&NewProduct {
                barcode: "7501031310017".to_string(),
                name: "Lápiz HB #2".to_string(),
                description: String::new(),
                price_cents: 350,
                cost_cents: 150,
                stock: 10,
                kind: ProductKind::Standard,
                category_id: Some(category.id),
            })
            .await
            .unwrap();

        db.categories().delete(category.id).await.unwrap();

        let orphan = db.products().get(product.id).await.unwrap().unwrap();
        assert_eq!(orphan.category_id, None);
    }
}
