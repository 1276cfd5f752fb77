//! # Transaction Repository
//!
//! Sales, their line items, and every stock movement a sale causes.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Transaction Lifecycle                             │
//! │                                                                         │
//! │  checkout(status = Completed)                                           │
//! │     └── BEGIN                                                           │
//! │         ├── UPDATE products SET stock = stock - q                       │
//! │         │   WHERE id = ? AND stock >= q      (0 rows → rollback)        │
//! │         ├── INSERT transactions (receipt number R-YYYYMMDD-NNNN)        │
//! │         ├── INSERT transaction_items                                    │
//! │         └── COMMIT                                                      │
//! │                                                                         │
//! │  checkout(status = Pending)    stock untouched                          │
//! │  complete(id)                  pending   → completed, stock taken       │
//! │  refund(id)                    completed → refunded,  stock returned    │
//! │  delete(id)                    stock returned only if still completed   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conditional UPDATE is what keeps stock non-negative when two tills
//! sell the last unit at the same time: the second one updates zero rows and
//! its whole SQL transaction is rolled back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::cart::{Cart, Tender};
use tally_core::{CoreError, PaymentMethod, Transaction, TransactionItem, TransactionStatus};

const TRANSACTION_SELECT: &str = r#"
    SELECT
        t.id,
        t.receipt_number,
        t.cashier_id,
        u.full_name AS cashier_name,
        t.total_cents,
        t.payment_method,
        t.status,
        t.amount_tendered_cents,
        t.change_cents,
        t.created_at,
        t.completed_at,
        t.refunded_at
    FROM transactions t
    LEFT JOIN users u ON u.id = t.cashier_id
"#;

const ITEM_COLUMNS: &str = "id, transaction_id, product_id, barcode_snapshot, name_snapshot, \
     quantity, unit_price_cents, unit_cost_cents, line_total_cents";

// =============================================================================
// Inputs
// =============================================================================

/// A priced checkout ready to be written.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub cashier_id: String,
    pub payment_method: PaymentMethod,
    /// `Completed` or `Pending`.
    pub status: TransactionStatus,
    pub tender: Tender,
    pub cart: Cart,
}

/// Filters for [`TransactionRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
    pub cashier_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Records a sale.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::EmptyCart))` - no lines
    /// * `Err(DbError::Domain(CoreError::InsufficientStock))` - stock moved
    ///   since the cart was priced
    pub async fn checkout(&self, new: NewTransaction) -> DbResult<Transaction> {
        if new.cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        if new.status == TransactionStatus::Refunded {
            return Err(DbError::Internal(
                "checkout status must be completed or pending".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let total = new.cart.total();
        let items = new
            .cart
            .into_items(&id, || Uuid::new_v4().to_string());
        let completed_at = (new.status == TransactionStatus::Completed).then_some(now);

        debug!(
            id = %id,
            lines = items.len(),
            total_cents = total.cents(),
            status = %new.status,
            "Recording checkout"
        );

        let mut tx = self.pool.begin().await?;

        if new.status == TransactionStatus::Completed {
            for item in &items {
                take_stock(&mut tx, &item.product_id, &item.barcode_snapshot, item.quantity, now)
                    .await?;
            }
        }

        let receipt_prefix = format!("R-{}-", now.format("%Y%m%d"));

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, receipt_number, cashier_id, total_cents,
                payment_method, status, amount_tendered_cents, change_cents,
                created_at, completed_at, refunded_at
            ) VALUES (
                ?1,
                ?2 || printf('%04d', COALESCE((
                    SELECT MAX(CAST(substr(receipt_number, 12) AS INTEGER))
                    FROM transactions
                    WHERE receipt_number LIKE ?2 || '%'
                ), 0) + 1),
                ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL
            )
            "#,
        )
        .bind(&id)
        .bind(&receipt_prefix)
        .bind(&new.cashier_id)
        .bind(total.cents())
        .bind(new.payment_method)
        .bind(new.status)
        .bind(new.tender.amount_tendered_cents)
        .bind(new.tender.change_cents)
        .bind(now)
        .bind(completed_at)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    id, transaction_id, product_id, barcode_snapshot, name_snapshot,
                    quantity, unit_price_cents, unit_cost_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.product_id)
            .bind(&item.barcode_snapshot)
            .bind(&item.name_snapshot)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.unit_cost_cents)
            .bind(item.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %id,
            total_cents = total.cents(),
            payment_method = %new.payment_method,
            status = %new.status,
            "Checkout recorded"
        );

        self.require(&id).await
    }

    /// Moves a pending sale to completed and takes its stock.
    pub async fn complete(&self, id: &str, tender: Tender) -> DbResult<Transaction> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'completed', completed_at = ?2,
                amount_tendered_cents = ?3, change_cents = ?4
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(tender.amount_tendered_cents)
        .bind(tender.change_cents)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(status_error(&mut tx, id, "complete").await);
        }

        for item in fetch_items(&mut tx, id).await? {
            take_stock(&mut tx, &item.product_id, &item.barcode_snapshot, item.quantity, now)
                .await?;
        }

        tx.commit().await?;

        info!(id = %id, "Pending transaction completed");
        self.require(id).await
    }

    /// Refunds a completed sale and puts its stock back.
    pub async fn refund(&self, id: &str) -> DbResult<Transaction> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'refunded', refunded_at = ?2
            WHERE id = ?1 AND status = 'completed'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(status_error(&mut tx, id, "refund").await);
        }

        for item in fetch_items(&mut tx, id).await? {
            return_stock(&mut tx, &item.product_id, item.quantity, now).await?;
        }

        tx.commit().await?;

        info!(id = %id, "Transaction refunded");
        self.require(id).await
    }

    /// Deletes a sale and its items.
    ///
    /// Stock is returned only when the sale was still `completed`; refunded
    /// sales already returned it and pending ones never took it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let status: Option<TransactionStatus> =
            sqlx::query_scalar("SELECT status FROM transactions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let status = status.ok_or_else(|| DbError::not_found("Transaction", id))?;

        if status == TransactionStatus::Completed {
            for item in fetch_items(&mut tx, id).await? {
                return_stock(&mut tx, &item.product_id, item.quantity, now).await?;
            }
        }

        sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, status = %status, "Transaction deleted");
        Ok(())
    }

    /// Gets a transaction with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let txn = sqlx::query_as::<_, Transaction>(&format!(
            "{} WHERE t.id = ?1",
            TRANSACTION_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut txn) = txn else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        txn.items = fetch_items(&mut conn, id).await?;
        Ok(Some(txn))
    }

    async fn require(&self, id: &str) -> DbResult<Transaction> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }

    /// Lists transactions, newest first, with their items.
    pub async fn list(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>> {
        debug!(?filter, "Listing transactions");

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("{} WHERE 1 = 1", TRANSACTION_SELECT));

        if let Some(from) = filter.from {
            qb.push(" AND t.created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND t.created_at < ").push_bind(to);
        }
        if let Some(status) = filter.status {
            qb.push(" AND t.status = ").push_bind(status);
        }
        if let Some(cashier_id) = &filter.cashier_id {
            qb.push(" AND t.cashier_id = ").push_bind(cashier_id.clone());
        }

        qb.push(" ORDER BY t.created_at DESC, t.receipt_number DESC");

        match (filter.limit, filter.offset) {
            (Some(limit), offset) => {
                qb.push(" LIMIT ").push_bind(limit);
                qb.push(" OFFSET ").push_bind(offset.unwrap_or(0));
            }
            (None, Some(offset)) => {
                qb.push(" LIMIT -1 OFFSET ").push_bind(offset);
            }
            (None, None) => {}
        }

        let mut transactions = qb
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(&mut transactions).await?;

        debug!(count = transactions.len(), "Transaction list returned");
        Ok(transactions)
    }

    /// Every transaction created in `[from, to)`, with items (report input).
    pub async fn list_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Transaction>> {
        self.list(&TransactionFilter {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        })
        .await
    }

    async fn attach_items(&self, transactions: &mut [Transaction]) -> DbResult<()> {
        if transactions.is_empty() {
            return Ok(());
        }

        let mut by_txn: HashMap<String, Vec<TransactionItem>> = HashMap::new();

        // SQLite caps bound parameters per statement
        for chunk in transactions.chunks(500) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT {} FROM transaction_items WHERE transaction_id IN (",
                ITEM_COLUMNS
            ));
            let mut ids = qb.separated(", ");
            for txn in chunk {
                ids.push_bind(txn.id.clone());
            }
            ids.push_unseparated(") ORDER BY rowid");

            let items = qb
                .build_query_as::<TransactionItem>()
                .fetch_all(&self.pool)
                .await?;

            for item in items {
                by_txn
                    .entry(item.transaction_id.clone())
                    .or_default()
                    .push(item);
            }
        }

        for txn in transactions.iter_mut() {
            txn.items = by_txn.remove(&txn.id).unwrap_or_default();
        }

        Ok(())
    }
}

// =============================================================================
// Helpers (run inside an open SQL transaction)
// =============================================================================

async fn fetch_items(conn: &mut SqliteConnection, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
    let items = sqlx::query_as::<_, TransactionItem>(&format!(
        "SELECT {} FROM transaction_items WHERE transaction_id = ?1 ORDER BY rowid",
        ITEM_COLUMNS
    ))
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Decrements stock only if enough is on hand.
async fn take_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    barcode: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND stock_quantity >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    let available: Option<i64> =
        sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    match available {
        Some(available) => Err(CoreError::InsufficientStock {
            barcode: barcode.to_string(),
            available,
            requested: quantity,
        }
        .into()),
        None => Err(DbError::not_found("Product", product_id)),
    }
}

async fn return_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        "UPDATE products SET stock_quantity = stock_quantity + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Explains why a status transition matched no row.
async fn status_error(conn: &mut SqliteConnection, id: &str, action: &str) -> DbError {
    let current: Result<Option<TransactionStatus>, sqlx::Error> =
        sqlx::query_scalar("SELECT status FROM transactions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await;

    match current {
        Ok(Some(current)) => CoreError::InvalidTransactionStatus {
            id: id.to_string(),
            current,
            action: action.to_string(),
        }
        .into(),
        Ok(None) => DbError::not_found("Transaction", id),
        Err(e) => e.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use tally_core::input::{NewUser, ProductInput};
    use tally_core::{Product, Role};

    struct Fixture {
        db: Database,
        cashier_id: String,
        pen: Product,
        pad: Product,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let cashier = db
            .users()
            .insert(&NewUser {
                username: "casey".to_string(),
                password: "password123".to_string(),
                full_name: "Casey Till".to_string(),
                email: None,
                role: Role::Cashier,
            })
            .await
            .unwrap();

        let product = |barcode: &str, price: i64, stock: i64| ProductInput {
            barcode: barcode.to_string(),
            name: format!("Item {}", barcode),
            description: None,
            price_cents: price,
            cost_cents: price / 2,
            stock_quantity: stock,
            min_stock_level: 0,
            category_id: None,
            is_active: None,
        };

        let pen = db.products().insert(&product("PEN", 150, 10)).await.unwrap();
        let pad = db.products().insert(&product("PAD", 400, 2)).await.unwrap();

        Fixture {
            db,
            cashier_id: cashier.id,
            pen,
            pad,
        }
    }

    fn sale(f: &Fixture, lines: &[(&Product, i64)], status: TransactionStatus) -> NewTransaction {
        let mut cart = Cart::new();
        for (product, qty) in lines {
            cart.add(product, *qty).unwrap();
        }
        NewTransaction {
            cashier_id: f.cashier_id.clone(),
            payment_method: PaymentMethod::Card,
            status,
            tender: Tender::NONE,
            cart,
        }
    }

    async fn stock(f: &Fixture, product: &Product) -> i64 {
        f.db
            .products()
            .get_by_id(&product.id)
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    #[tokio::test]
    async fn test_checkout_takes_stock_and_numbers_receipts() {
        let f = fixture().await;
        let repo = f.db.transactions();

        let first = repo
            .checkout(sale(&f, &[(&f.pen, 3), (&f.pad, 1)], TransactionStatus::Completed))
            .await
            .unwrap();

        assert_eq!(first.total_cents, 850);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.cashier_name.as_deref(), Some("Casey Till"));
        assert!(first.receipt_number.ends_with("-0001"));
        assert!(first.completed_at.is_some());
        assert_eq!(stock(&f, &f.pen).await, 7);
        assert_eq!(stock(&f, &f.pad).await, 1);

        let second = repo
            .checkout(sale(&f, &[(&f.pen, 1)], TransactionStatus::Completed))
            .await
            .unwrap();
        assert!(second.receipt_number.ends_with("-0002"));
    }

    #[tokio::test]
    async fn test_checkout_cannot_drive_stock_negative() {
        let f = fixture().await;
        let repo = f.db.transactions();

        // Both carts were priced against stock = 2
        let a = sale(&f, &[(&f.pad, 2)], TransactionStatus::Completed);
        let b = sale(&f, &[(&f.pen, 1), (&f.pad, 1)], TransactionStatus::Completed);

        repo.checkout(a).await.unwrap();
        let err = repo.checkout(b).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 0, requested: 1, .. })
        ));
        assert_eq!(stock(&f, &f.pad).await, 0);
        // The pen decrement in the failed checkout was rolled back
        assert_eq!(stock(&f, &f.pen).await, 10);
        assert_eq!(repo.list(&TransactionFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_then_complete() {
        let f = fixture().await;
        let repo = f.db.transactions();

        let pending = repo
            .checkout(sale(&f, &[(&f.pen, 4)], TransactionStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.status, TransactionStatus::Pending);
        assert!(pending.completed_at.is_none());
        assert_eq!(stock(&f, &f.pen).await, 10);

        let done = repo.complete(&pending.id, Tender::NONE).await.unwrap();
        assert_eq!(done.status, TransactionStatus::Completed);
        assert_eq!(stock(&f, &f.pen).await, 6);

        let err = repo.complete(&pending.id, Tender::NONE).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidTransactionStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_refund_restores_stock_once() {
        let f = fixture().await;
        let repo = f.db.transactions();

        let txn = repo
            .checkout(sale(&f, &[(&f.pen, 5)], TransactionStatus::Completed))
            .await
            .unwrap();
        assert_eq!(stock(&f, &f.pen).await, 5);

        let refunded = repo.refund(&txn.id).await.unwrap();
        assert_eq!(refunded.status, TransactionStatus::Refunded);
        assert!(refunded.refunded_at.is_some());
        assert_eq!(stock(&f, &f.pen).await, 10);

        assert!(repo.refund(&txn.id).await.is_err());
        assert_eq!(stock(&f, &f.pen).await, 10);

        // Deleting a refunded sale must not add the stock back again
        repo.delete(&txn.id).await.unwrap();
        assert_eq!(stock(&f, &f.pen).await, 10);
        assert!(repo.get_by_id(&txn.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_completed_restores_stock() {
        let f = fixture().await;
        let repo = f.db.transactions();

        let txn = repo
            .checkout(sale(&f, &[(&f.pad, 2)], TransactionStatus::Completed))
            .await
            .unwrap();
        assert_eq!(stock(&f, &f.pad).await, 0);

        repo.delete(&txn.id).await.unwrap();
        assert_eq!(stock(&f, &f.pad).await, 2);
        assert!(matches!(repo.delete(&txn.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let f = fixture().await;
        let repo = f.db.transactions();

        repo.checkout(sale(&f, &[(&f.pen, 1)], TransactionStatus::Completed))
            .await
            .unwrap();
        repo.checkout(sale(&f, &[(&f.pen, 1)], TransactionStatus::Pending))
            .await
            .unwrap();
        repo.checkout(sale(&f, &[(&f.pad, 1)], TransactionStatus::Completed))
            .await
            .unwrap();

        let completed = repo
            .list(&TransactionFilter {
                status: Some(TransactionStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed.iter().all(|t| t.items.len() == 1));

        let page = repo
            .list(&TransactionFilter {
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let none = repo
            .list(&TransactionFilter {
                cashier_id: Some("someone-else".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        let now = Utc::now();
        let in_range = repo
            .list_in_range(now - chrono::Duration::hours(1), now + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(in_range.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let f = fixture().await;
        let err = f
            .db
            .transactions()
            .checkout(sale(&f, &[], TransactionStatus::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));
    }
}
