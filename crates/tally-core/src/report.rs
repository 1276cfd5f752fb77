//! # Reports
//!
//! Pure aggregation behind the reports screen and its CSV/PDF exports.
//! The JSON report, the CSV and the PDF all print these structs, so the
//! numbers match across every format.
//!
//! ## Sales accounting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  status      │ gross revenue │ refunds │ cost / profit │ items │ daily │
//! │──────────────┼───────────────┼─────────┼───────────────┼───────┼───────│
//! │  completed   │      ✓        │         │       ✓       │   ✓   │   ✓   │
//! │  refunded    │      ✓        │    ✓    │               │       │       │
//! │  pending     │               │         │               │       │       │
//! └─────────────────────────────────────────────────────────────────────────┘
//!   net revenue = gross revenue - refunds  (= completed totals)
//! ```
//!
//! Transactions are bucketed by the UTC date of `created_at`.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Category, PaymentMethod, Product, Transaction, TransactionStatus};

/// How many products the top-sellers table lists.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

// =============================================================================
// Sales Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
    pub gross_revenue_cents: i64,
    pub refunded_cents: i64,
    pub net_revenue_cents: i64,
    pub cost_of_goods_cents: i64,
    pub gross_profit_cents: i64,
    /// Gross profit over net revenue, in basis points.
    pub margin_bps: i64,
    /// Completed transactions.
    pub transaction_count: i64,
    pub refund_count: i64,
    pub items_sold: i64,
    pub average_ticket_cents: i64,
    pub by_payment_method: Vec<PaymentBreakdown>,
    /// One entry per day in range, zero-filled.
    pub daily: Vec<DailySales>,
    pub top_products: Vec<ProductSales>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    pub method: PaymentMethod,
    pub transaction_count: i64,
    pub total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub transaction_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
    pub profit_cents: i64,
}

impl SalesSummary {
    /// Aggregates `transactions` (with items loaded) over `[from, to]`.
    ///
    /// Transactions whose date falls outside the range are ignored, so the
    /// caller may over-fetch.
    pub fn build(transactions: &[Transaction], from: NaiveDate, to: NaiveDate) -> Self {
        let mut gross = Money::zero();
        let mut refunded = Money::zero();
        let mut cost = Money::zero();
        let mut completed = 0i64;
        let mut refund_count = 0i64;
        let mut items_sold = 0i64;

        let mut by_method: HashMap<PaymentMethod, (i64, Money)> = HashMap::new();
        let mut daily: BTreeMap<NaiveDate, (i64, Money)> = BTreeMap::new();
        let mut products: HashMap<String, ProductSales> = HashMap::new();

        let mut day = from;
        while day <= to {
            daily.insert(day, (0, Money::zero()));
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        for txn in transactions {
            let date = txn.created_at.date_naive();
            if date < from || date > to {
                continue;
            }

            match txn.status {
                TransactionStatus::Pending => continue,
                TransactionStatus::Refunded => {
                    gross += txn.total();
                    refunded += txn.total();
                    refund_count += 1;
                }
                TransactionStatus::Completed => {
                    gross += txn.total();
                    cost += txn.cost();
                    completed += 1;
                    items_sold = items_sold.saturating_add(txn.item_count());

                    let method = by_method.entry(txn.payment_method).or_insert((0, Money::zero()));
                    method.0 += 1;
                    method.1 += txn.total();

                    let bucket = daily.entry(date).or_insert((0, Money::zero()));
                    bucket.0 += 1;
                    bucket.1 += txn.total();

                    for item in &txn.items {
                        let entry = products
                            .entry(item.product_id.clone())
                            .or_insert_with(|| ProductSales {
                                product_id: item.product_id.clone(),
                                name: item.name_snapshot.clone(),
                                quantity: 0,
                                revenue_cents: 0,
                                profit_cents: 0,
                            });
                        entry.quantity = entry.quantity.saturating_add(item.quantity);
                        entry.revenue_cents = entry.revenue_cents.saturating_add(item.line_total_cents);
                        entry.profit_cents = entry
                            .profit_cents
                            .saturating_add((item.line_total() - item.line_cost()).cents());
                    }
                }
            }
        }

        let net = gross - refunded;
        let profit = net - cost;

        let mut top_products: Vec<ProductSales> = products.into_values().collect();
        top_products.sort_by(|a, b| {
            b.revenue_cents
                .cmp(&a.revenue_cents)
                .then_with(|| b.quantity.cmp(&a.quantity))
                .then_with(|| a.name.cmp(&b.name))
        });
        top_products.truncate(TOP_PRODUCTS_LIMIT);

        SalesSummary {
            from,
            to,
            gross_revenue_cents: gross.cents(),
            refunded_cents: refunded.cents(),
            net_revenue_cents: net.cents(),
            cost_of_goods_cents: cost.cents(),
            gross_profit_cents: profit.cents(),
            margin_bps: profit.share_of_bps(net),
            transaction_count: completed,
            refund_count,
            items_sold,
            average_ticket_cents: net.average_over(completed).cents(),
            by_payment_method: PaymentMethod::ALL
                .iter()
                .map(|m| {
                    let (count, total) = by_method.get(m).copied().unwrap_or((0, Money::zero()));
                    PaymentBreakdown {
                        method: *m,
                        transaction_count: count,
                        total_cents: total.cents(),
                    }
                })
                .collect(),
            daily: daily
                .into_iter()
                .map(|(date, (count, revenue))| DailySales {
                    date,
                    transaction_count: count,
                    revenue_cents: revenue.cents(),
                })
                .collect(),
            top_products,
        }
    }
}

// =============================================================================
// Inventory Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    /// Active products only.
    pub product_count: i64,
    pub total_units: i64,
    pub stock_value_cost_cents: i64,
    pub stock_value_retail_cents: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    /// Lowest stock first.
    pub low_stock: Vec<LowStockItem>,
    pub by_category: Vec<CategoryStock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub product_id: String,
    pub barcode: String,
    pub name: String,
    pub stock_quantity: i64,
    pub min_stock_level: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStock {
    pub category_id: Option<String>,
    pub category_name: String,
    pub product_count: i64,
    pub total_units: i64,
    pub stock_value_cost_cents: i64,
}

/// Name used for products without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

impl InventorySummary {
    pub fn build(products: &[Product], categories: &[Category]) -> Self {
        let names: HashMap<&str, &str> = categories
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect();

        let mut total_units = 0i64;
        let mut value_cost = Money::zero();
        let mut value_retail = Money::zero();
        let mut out_of_stock = 0i64;
        let mut low_stock = Vec::new();
        let mut by_category: HashMap<Option<&str>, CategoryStock> = HashMap::new();

        let active: Vec<&Product> = products.iter().filter(|p| p.is_active).collect();

        for product in &active {
            total_units = total_units.saturating_add(product.stock_quantity);
            value_cost += product.stock_value_at_cost();
            value_retail += product.stock_value_at_retail();

            if product.is_out_of_stock() {
                out_of_stock += 1;
            }
            if product.is_low_stock() {
                low_stock.push(LowStockItem {
                    product_id: product.id.clone(),
                    barcode: product.barcode.clone(),
                    name: product.name.clone(),
                    stock_quantity: product.stock_quantity,
                    min_stock_level: product.min_stock_level,
                });
            }

            // Unknown category ids fall into the uncategorized bucket
            let (key, name) = match product
                .category_id
                .as_deref()
                .and_then(|id| names.get_key_value(id))
            {
                Some((id, name)) => (Some(*id), *name),
                None => (None, UNCATEGORIZED),
            };

            let entry = by_category.entry(key).or_insert_with(|| CategoryStock {
                category_id: key.map(str::to_string),
                category_name: name.to_string(),
                product_count: 0,
                total_units: 0,
                stock_value_cost_cents: 0,
            });
            entry.product_count += 1;
            entry.total_units = entry.total_units.saturating_add(product.stock_quantity);
            entry.stock_value_cost_cents = entry
                .stock_value_cost_cents
                .saturating_add(product.stock_value_at_cost().cents());
        }

        low_stock.sort_by(|a, b| {
            a.stock_quantity
                .cmp(&b.stock_quantity)
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut by_category: Vec<CategoryStock> = by_category.into_values().collect();
        by_category.sort_by(|a, b| {
            a.category_name
                .cmp(&b.category_name)
                .then_with(|| a.category_id.is_none().cmp(&b.category_id.is_none()))
        });

        InventorySummary {
            product_count: active.len() as i64,
            total_units,
            stock_value_cost_cents: value_cost.cents(),
            stock_value_retail_cents: value_retail.cents(),
            low_stock_count: low_stock.len() as i64,
            out_of_stock_count: out_of_stock,
            low_stock,
            by_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionItem;
    use crate::{MAX_PRICE_CENTS, MAX_STOCK_QUANTITY};
    use chrono::{TimeZone, Utc};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn txn(
        id: &str,
        day: u32,
        status: TransactionStatus,
        method: PaymentMethod,
        lines: &[(&str, i64, i64, i64)],
    ) -> Transaction {
        let items: Vec<TransactionItem> = lines
            .iter()
            .enumerate()
            .map(|(n, (pid, qty, price, cost))| TransactionItem {
                id: format!("{}-{}", id, n),
                transaction_id: id.to_string(),
                product_id: pid.to_string(),
                barcode_snapshot: format!("BC-{}", pid),
                name_snapshot: format!("Product {}", pid),
                quantity: *qty,
                unit_price_cents: *price,
                unit_cost_cents: *cost,
                line_total_cents: qty * price,
            })
            .collect();
        let created_at = Utc.with_ymd_and_hms(2026, 3, day, 15, 30, 0).unwrap();
        Transaction {
            id: id.to_string(),
            receipt_number: format!("R-{}", id),
            cashier_id: "u-1".to_string(),
            cashier_name: None,
            total_cents: items.iter().map(|i| i.line_total_cents).sum(),
            payment_method: method,
            status,
            amount_tendered_cents: None,
            change_cents: None,
            created_at,
            completed_at: Some(created_at),
            refunded_at: None,
            items,
        }
    }

    #[test]
    fn test_sales_summary_totals() {
        let txns = vec![
            txn("a", 2, TransactionStatus::Completed, PaymentMethod::Cash, &[("p1", 2, 500, 200)]),
            txn("b", 2, TransactionStatus::Completed, PaymentMethod::Card, &[("p2", 1, 1000, 600)]),
            txn("c", 3, TransactionStatus::Refunded, PaymentMethod::Card, &[("p1", 1, 500, 200)]),
            txn("d", 3, TransactionStatus::Pending, PaymentMethod::Cash, &[("p1", 9, 500, 200)]),
        ];

        let s = SalesSummary::build(&txns, date("2026-03-01"), date("2026-03-04"));

        assert_eq!(s.gross_revenue_cents, 2500);
        assert_eq!(s.refunded_cents, 500);
        assert_eq!(s.net_revenue_cents, 2000);
        assert_eq!(s.cost_of_goods_cents, 1000);
        assert_eq!(s.gross_profit_cents, 1000);
        assert_eq!(s.margin_bps, 5000);
        assert_eq!(s.transaction_count, 2);
        assert_eq!(s.refund_count, 1);
        assert_eq!(s.items_sold, 3);
        assert_eq!(s.average_ticket_cents, 1000);
    }

    #[test]
    fn test_daily_series_is_zero_filled() {
        let txns = vec![txn(
            "a",
            2,
            TransactionStatus::Completed,
            PaymentMethod::Cash,
            &[("p1", 1, 300, 100)],
        )];

        let s = SalesSummary::build(&txns, date("2026-03-01"), date("2026-03-03"));

        assert_eq!(s.daily.len(), 3);
        assert_eq!(s.daily[0].revenue_cents, 0);
        assert_eq!(s.daily[1].date, date("2026-03-02"));
        assert_eq!(s.daily[1].revenue_cents, 300);
        assert_eq!(s.daily[2].transaction_count, 0);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let txns = vec![txn(
            "a",
            10,
            TransactionStatus::Completed,
            PaymentMethod::Cash,
            &[("p1", 1, 300, 100)],
        )];
        let s = SalesSummary::build(&txns, date("2026-03-01"), date("2026-03-03"));
        assert_eq!(s.transaction_count, 0);
        assert_eq!(s.average_ticket_cents, 0);
    }

    #[test]
    fn test_payment_breakdown_has_fixed_order() {
        let txns = vec![txn(
            "a",
            1,
            TransactionStatus::Completed,
            PaymentMethod::Mobile,
            &[("p1", 1, 300, 100)],
        )];
        let s = SalesSummary::build(&txns, date("2026-03-01"), date("2026-03-01"));
        let methods: Vec<_> = s.by_payment_method.iter().map(|b| b.method).collect();
        assert_eq!(methods, PaymentMethod::ALL.to_vec());
        assert_eq!(s.by_payment_method[2].total_cents, 300);
        assert_eq!(s.by_payment_method[0].transaction_count, 0);
    }

    #[test]
    fn test_top_products_sorted_by_revenue() {
        let txns = vec![
            txn("a", 1, TransactionStatus::Completed, PaymentMethod::Cash, &[("p1", 1, 100, 50), ("p2", 1, 900, 400)]),
            txn("b", 1, TransactionStatus::Completed, PaymentMethod::Cash, &[("p1", 3, 100, 50)]),
        ];
        let s = SalesSummary::build(&txns, date("2026-03-01"), date("2026-03-01"));
        assert_eq!(s.top_products[0].product_id, "p2");
        assert_eq!(s.top_products[1].quantity, 4);
        assert_eq!(s.top_products[1].profit_cents, 200);
    }

    fn product(id: &str, category: Option<&str>, stock: i64, min: i64, active: bool) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            barcode: format!("BC-{}", id),
            name: format!("Product {}", id),
            description: None,
            price_cents: 200,
            cost_cents: 100,
            stock_quantity: stock,
            min_stock_level: min,
            category_id: category.map(str::to_string),
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_inventory_summary() {
        let now = Utc::now();
        let categories = vec![Category {
            id: "c1".to_string(),
            name: "Stationery".to_string(),
            description: None,
            product_count: 2,
            created_at: now,
            updated_at: now,
        }];
        let products = vec![
            product("a", Some("c1"), 10, 2, true),
            product("b", Some("c1"), 1, 5, true),
            product("c", None, 0, 0, true),
            product("d", None, 50, 0, false),
        ];

        let s = InventorySummary::build(&products, &categories);

        assert_eq!(s.product_count, 3);
        assert_eq!(s.total_units, 11);
        assert_eq!(s.stock_value_cost_cents, 1100);
        assert_eq!(s.stock_value_retail_cents, 2200);
        assert_eq!(s.low_stock_count, 2);
        assert_eq!(s.out_of_stock_count, 1);
        assert_eq!(s.low_stock[0].product_id, "c");

        assert_eq!(s.by_category.len(), 2);
        let stationery = s.by_category.iter().find(|c| c.category_name == "Stationery").unwrap();
        assert_eq!(stationery.product_count, 2);
        assert_eq!(stationery.category_id.as_deref(), Some("c1"));
        let none = s.by_category.iter().find(|c| c.category_name == UNCATEGORIZED).unwrap();
        assert_eq!(none.category_id, None);
    }

    #[test]
    fn test_category_named_uncategorized_stays_separate() {
        let now = Utc::now();
        let categories = vec![Category {
            id: "c9".to_string(),
            name: UNCATEGORIZED.to_string(),
            description: None,
            product_count: 1,
            created_at: now,
            updated_at: now,
        }];
        let products = vec![
            product("a", Some("c9"), 4, 0, true),
            product("b", None, 6, 0, true),
            product("c", Some("gone"), 1, 0, true),
        ];

        let s = InventorySummary::build(&products, &categories);

        assert_eq!(s.by_category.len(), 2);
        assert!(s.by_category.iter().all(|c| c.category_name == UNCATEGORIZED));
        assert_eq!(s.by_category[0].category_id.as_deref(), Some("c9"));
        assert_eq!(s.by_category[0].total_units, 4);
        assert_eq!(s.by_category[1].category_id, None);
        assert_eq!(s.by_category[1].product_count, 2);
        assert_eq!(s.by_category[1].total_units, 7);
    }

    #[test]
    fn test_inventory_at_max_bounds_does_not_overflow() {
        let mut huge = product("a", None, MAX_STOCK_QUANTITY, 0, true);
        huge.price_cents = MAX_PRICE_CENTS;
        huge.cost_cents = MAX_PRICE_CENTS;
        let mut legacy = product("b", None, i64::MAX / 4, 0, true);
        legacy.cost_cents = i64::MAX / 4;

        let exact = InventorySummary::build(std::slice::from_ref(&huge), &[]);
        assert_eq!(exact.stock_value_cost_cents, MAX_PRICE_CENTS * MAX_STOCK_QUANTITY);

        let s = InventorySummary::build(&[huge, legacy], &[]);
        assert_eq!(s.stock_value_cost_cents, i64::MAX);
        assert_eq!(s.by_category[0].stock_value_cost_cents, i64::MAX);
    }
}
