//! # Product Repository
//!
//! Catalogue reads and writes. Stock changes caused by sales live in
//! [`super::transaction`]; this module only handles manual edits and
//! restocks.
//!
//! ## Listing Filters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/products?search=pen&categoryId=..&lowStock=true               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductFilter ──► QueryBuilder                                         │
//! │                    SELECT .. FROM products WHERE 1 = 1                  │
//! │                      AND is_active = 1              (unless inactive)   │
//! │                      AND (name LIKE ? OR barcode LIKE ?)                │
//! │                      AND category_id = ?                                │
//! │                      AND stock_quantity <= min_stock_level              │
//! │                    ORDER BY name                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::input::ProductInput;
use tally_core::{CoreError, Product, ValidationError, MAX_STOCK_QUANTITY};

const PRODUCT_COLUMNS: &str = "id, barcode, name, description, price_cents, cost_cents, \
     stock_quantity, min_stock_level, category_id, is_active, created_at, updated_at";

/// Filters for [`ProductRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Substring match on name or barcode.
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub low_stock_only: bool,
    pub include_inactive: bool,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products matching `filter`, ordered by name.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(?filter, "Listing products");

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM products WHERE 1 = 1", PRODUCT_COLUMNS));

        if !filter.include_inactive {
            qb.push(" AND is_active = 1");
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR barcode LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if let Some(category_id) = &filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id.clone());
        }

        if filter.low_stock_only {
            qb.push(" AND stock_quantity <= min_stock_level");
        }

        qb.push(" ORDER BY name COLLATE NOCASE");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        debug!(count = products.len(), "Product list returned");
        Ok(products)
    }

    /// Active products at or below their minimum level, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products \
             WHERE is_active = 1 AND stock_quantity <= min_stock_level \
             ORDER BY stock_quantity, name COLLATE NOCASE",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Every product, active or not (inventory report input).
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        self.list(&ProductFilter {
            include_inactive: true,
            ..Default::default()
        })
        .await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Looks up a product by its scanned barcode, active or not.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE barcode = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new, active product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category
    pub async fn insert(&self, input: &ProductInput) -> DbResult<Product> {
        debug!(barcode = %input.barcode, "Inserting product");

        let id = generate_product_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO products (
                id, barcode, name, description,
                price_cents, cost_cents, stock_quantity, min_stock_level,
                category_id, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)
            "#,
        )
        .bind(&id)
        .bind(&input.barcode)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.cost_cents)
        .bind(input.stock_quantity)
        .bind(input.min_stock_level)
        .bind(&input.category_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&input.barcode))?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &id))
    }

    /// Replaces the editable fields of a product.
    ///
    /// `is_active: None` keeps the current flag.
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                barcode = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                cost_cents = ?6,
                stock_quantity = ?7,
                min_stock_level = ?8,
                category_id = ?9,
                is_active = COALESCE(?10, is_active),
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.barcode)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.cost_cents)
        .bind(input.stock_quantity)
        .bind(input.min_stock_level)
        .bind(&input.category_id)
        .bind(input.is_active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&input.barcode))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Adds `quantity` units to stock and returns the updated product.
    ///
    /// Stock never exceeds MAX_STOCK_QUANTITY; a restock past it fails
    /// with a validation error and leaves the row unchanged.
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<Product> {
        debug!(id = %id, quantity = quantity, "Restocking product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + ?2, updated_at = ?3
            WHERE id = ?1 AND stock_quantity + ?2 <= ?4
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .bind(MAX_STOCK_QUANTITY)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(_) => Err(CoreError::from(ValidationError::OutOfRange {
                    field: "stockQuantity".to_string(),
                    min: 0,
                    max: MAX_STOCK_QUANTITY,
                })
                .into()),
                None => Err(DbError::not_found("Product", id)),
            };
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product by setting `is_active = 0`.
    ///
    /// Past transactions keep referencing the row.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let now = Utc::now();

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts active products at or below their minimum level.
    pub async fn count_low_stock(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE is_active = 1 AND stock_quantity <= min_stock_level",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn input(barcode: &str, name: &str, stock: i64, min: i64) -> ProductInput {
        ProductInput {
            barcode: barcode.to_string(),
            name: name.to_string(),
            description: None,
            price_cents: 250,
            cost_cents: 100,
            stock_quantity: stock,
            min_stock_level: min,
            category_id: None,
            is_active: None,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("pen"), "pen");
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = db().await;
        let repo = db.products();

        let created = repo.insert(&input("4006381333931", "Ballpoint Pen", 10, 2)).await.unwrap();
        assert!(created.is_active);

        let by_id = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.name, "Ballpoint Pen");

        let by_barcode = repo.get_by_barcode("4006381333931").await.unwrap().unwrap();
        assert_eq!(by_barcode.id, created.id);

        assert!(repo.get_by_barcode("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_barcode_is_rejected() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&input("A1", "Tape", 1, 0)).await.unwrap();
        let err = repo.insert(&input("A1", "Glue", 1, 0)).await.unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "barcode");
                assert_eq!(value, "A1");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&input("P-1", "Blue Pen", 10, 2)).await.unwrap();
        repo.insert(&input("P-2", "Red Pen", 1, 5)).await.unwrap();
        let stapler = repo.insert(&input("S-1", "Stapler", 3, 1)).await.unwrap();
        repo.deactivate(&stapler.id).await.unwrap();

        let all_active = repo.list(&ProductFilter::default()).await.unwrap();
        assert_eq!(all_active.len(), 2);

        let pens = repo
            .list(&ProductFilter {
                search: Some("pen".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pens.len(), 2);

        let low = repo
            .list(&ProductFilter {
                low_stock_only: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].barcode, "P-2");

        let with_inactive = repo
            .list(&ProductFilter {
                include_inactive: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(with_inactive.len(), 3);
        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.count_low_stock().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&input("A1", "Tape", 1, 0)).await.unwrap();
        let hits = repo
            .list(&ProductFilter {
                search: Some("%".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_restock() {
        let db = db().await;
        let repo = db.products();

        let p = repo.insert(&input("A1", "Tape", 1, 3)).await.unwrap();

        let mut changes = input("A1", "Packing Tape", 1, 3);
        changes.price_cents = 399;
        let updated = repo.update(&p.id, &changes).await.unwrap();
        assert_eq!(updated.name, "Packing Tape");
        assert_eq!(updated.price_cents, 399);
        assert!(updated.is_active);

        let restocked = repo.restock(&p.id, 24).await.unwrap();
        assert_eq!(restocked.stock_quantity, 25);

        assert_eq!(repo.low_stock().await.unwrap().len(), 0);
        assert!(matches!(
            repo.restock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_restock_stops_at_stock_cap() {
        let db = db().await;
        let repo = db.products();

        let p = repo.insert(&input("A1", "Tape", 1, 3)).await.unwrap();
        let p = repo.restock(&p.id, MAX_STOCK_QUANTITY - 1).await.unwrap();
        assert_eq!(p.stock_quantity, MAX_STOCK_QUANTITY);

        assert!(matches!(
            repo.restock(&p.id, 1).await,
            Err(DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. })))
        ));
        let unchanged = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock_quantity, MAX_STOCK_QUANTITY);
    }
}
