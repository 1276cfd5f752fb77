//! # Category Repository
//!
//! `product_count` is not stored; every read counts the active products
//! that reference the category.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::input::CategoryInput;
use tally_core::Category;

const CATEGORY_SELECT: &str = r#"
    SELECT
        c.id,
        c.name,
        c.description,
        (SELECT COUNT(*) FROM products p
         WHERE p.category_id = c.id AND p.is_active = 1) AS product_count,
        c.created_at,
        c.updated_at
    FROM categories c
"#;

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "{} ORDER BY c.name COLLATE NOCASE",
            CATEGORY_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>(&format!("{} WHERE c.id = ?1", CATEGORY_SELECT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already taken (case-insensitive)
    pub async fn insert(&self, input: &CategoryInput) -> DbResult<Category> {
        debug!(name = %input.name, "Inserting category");

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&input.name))?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", &id))
    }

    pub async fn update(&self, id: &str, input: &CategoryInput) -> DbResult<Category> {
        debug!(id = %id, "Updating category");

        let result = sqlx::query(
            "UPDATE categories SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&input.name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes a category that no active product uses.
    ///
    /// Inactive products that still point at it lose their category
    /// (`ON DELETE SET NULL`).
    ///
    /// ## Returns
    /// * `Err(DbError::Conflict)` - active products still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let in_use: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE category_id = ?1 AND is_active = 1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if in_use > 0 {
            return Err(DbError::conflict(format!(
                "Category is used by {} active product(s)",
                in_use
            )));
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        tx.commit().await?;

        info!(id = %id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use tally_core::input::ProductInput;

    fn category(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            description: None,
        }
    }

    fn product(barcode: &str, category_id: &str) -> ProductInput {
        ProductInput {
            barcode: barcode.to_string(),
            name: format!("Item {}", barcode),
            description: None,
            price_cents: 100,
            cost_cents: 50,
            stock_quantity: 5,
            min_stock_level: 1,
            category_id: Some(category_id.to_string()),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_crud_and_product_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let c = repo.insert(&category("Stationery")).await.unwrap();
        assert_eq!(c.product_count, 0);

        db.products().insert(&product("A1", &c.id)).await.unwrap();
        db.products().insert(&product("A2", &c.id)).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product_count, 2);

        let renamed = repo
            .update(&c.id, &CategoryInput {
                name: "Office".to_string(),
                description: Some("Desk supplies".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(renamed.name, "Office");
        assert_eq!(renamed.description.as_deref(), Some("Desk supplies"));
    }

    #[tokio::test]
    async fn test_name_is_unique_ignoring_case() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.insert(&category("Snacks")).await.unwrap();
        let err = repo.insert(&category("snacks")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_rejected_while_in_use() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let c = repo.insert(&category("Drinks")).await.unwrap();
        let p = db.products().insert(&product("D1", &c.id)).await.unwrap();

        assert!(matches!(repo.delete(&c.id).await, Err(DbError::Conflict(_))));

        db.products().deactivate(&p.id).await.unwrap();
        repo.delete(&c.id).await.unwrap();

        assert!(repo.get_by_id(&c.id).await.unwrap().is_none());
        let orphan = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(orphan.category_id, None);

        assert!(matches!(repo.delete(&c.id).await, Err(DbError::NotFound { .. })));
    }
}
