//! # Cart & Tender
//!
//! Prices a checkout from catalogue data and settles cash tender.
//!
//! The SPA sends only product references and quantities. Prices, costs and
//! names are read from the catalogue and frozen into the lines here, so a
//! tampered request cannot change what is charged.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout request          Cart (this module)         Transaction row   │
//! │  ────────────────          ──────────────────         ───────────────   │
//! │  [{barcode, qty: 2},  ──►  add(product, 2)      ──►  items[] (frozen)  │
//! │   {barcode, qty: 1}]       add(product, 1)  merge    total_cents       │
//! │                            total()                                      │
//! │  paymentMethod: cash  ──►  settle(total, tendered) ──► change_cents     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by product id (adding the same product merges)
//! - 1 <= quantity <= MAX_ITEM_QUANTITY per line
//! - At most MAX_CART_ITEMS lines
//! - A line never asks for more than the product's current stock

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Product, TransactionItem};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A priced line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub barcode: String,
    pub name: String,
    /// Locked in when the line is added.
    pub unit_price_cents: i64,
    pub unit_cost_cents: i64,
    pub quantity: i64,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            barcode: product.barcode.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            unit_cost_cents: product.cost_cents,
            quantity,
        }
    }

    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

/// A checkout being assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product or increases the quantity of an existing line.
    ///
    /// ## Errors
    /// - `ProductInactive` if the product is deactivated
    /// - `Validation` if the quantity (or merged quantity) is out of range
    /// - `CartTooLarge` past MAX_CART_ITEMS lines
    /// - `InsufficientStock` if the merged quantity exceeds stock on hand
    /// - `AmountOverflow` if the line or cart total leaves the i64 range
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if !product.is_active {
            return Err(CoreError::ProductInactive {
                barcode: product.barcode.clone(),
            });
        }

        let existing = self.lines.iter().position(|l| l.product_id == product.id);
        let merged = match existing {
            Some(idx) => self.lines[idx].quantity + quantity,
            None => quantity,
        };

        if merged > MAX_ITEM_QUANTITY {
            validate_quantity(merged)?;
        }

        if !product.can_sell(merged) {
            return Err(CoreError::InsufficientStock {
                barcode: product.barcode.clone(),
                available: product.stock_quantity,
                requested: merged,
            });
        }

        let unit_price = match existing {
            Some(idx) => Money::from_cents(self.lines[idx].unit_price_cents),
            None => product.price(),
        };
        let line_total = unit_price.checked_mul_quantity(merged)?;
        self.lines
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != existing)
            .try_fold(line_total, |acc, (_, line)| acc.checked_add(line.line_total()))?;

        match existing {
            Some(idx) => self.lines[idx].quantity = merged,
            None => {
                if self.lines.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                self.lines.push(CartLine::from_product(product, quantity));
            }
        }

        Ok(())
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line totals. `add` keeps this within range.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Freezes the lines into transaction items.
    ///
    /// `next_id` supplies the item ids so this crate stays free of
    /// randomness.
    pub fn into_items(
        self,
        transaction_id: &str,
        mut next_id: impl FnMut() -> String,
    ) -> Vec<TransactionItem> {
        self.lines
            .into_iter()
            .map(|line| TransactionItem {
                id: next_id(),
                transaction_id: transaction_id.to_string(),
                line_total_cents: line.line_total().cents(),
                product_id: line.product_id,
                barcode_snapshot: line.barcode,
                name_snapshot: line.name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                unit_cost_cents: line.unit_cost_cents,
            })
            .collect()
    }
}

// =============================================================================
// Tender
// =============================================================================

/// Outcome of settling payment for a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub amount_tendered_cents: Option<i64>,
    pub change_cents: Option<i64>,
}

impl Tender {
    /// No money changed hands yet (pending sale).
    pub const NONE: Tender = Tender {
        amount_tendered_cents: None,
        change_cents: None,
    };

    /// Settles payment.
    ///
    /// - Cash: a missing tender means exact change; a tender below the
    ///   total is rejected; change is `tendered - total`.
    /// - Card / mobile: tender is not recorded.
    ///
    /// ```rust
    /// use tally_core::cart::Tender;
    /// use tally_core::money::Money;
    /// use tally_core::PaymentMethod;
    ///
    /// let t = Tender::settle(PaymentMethod::Cash, Money::from_cents(870), Some(1000)).unwrap();
    /// assert_eq!(t.change_cents, Some(130));
    /// ```
    pub fn settle(method: PaymentMethod, total: Money, tendered: Option<i64>) -> CoreResult<Tender> {
        match method {
            PaymentMethod::Cash => {
                let tendered = tendered.unwrap_or(total.cents());
                if tendered < total.cents() {
                    return Err(CoreError::InsufficientTender {
                        total: total.cents(),
                        tendered,
                    });
                }
                Ok(Tender {
                    amount_tendered_cents: Some(tendered),
                    change_cents: Some(tendered - total.cents()),
                })
            }
            PaymentMethod::Card | PaymentMethod::Mobile => Ok(Tender::NONE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_PRICE_CENTS, MAX_STOCK_QUANTITY};
    use chrono::Utc;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            barcode: format!("BC-{}", id),
            name: format!("Product {}", id),
            description: None,
            price_cents: price,
            cost_cents: price / 2,
            stock_quantity: stock,
            min_stock_level: 0,
            category_id: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_merges_same_product() {
        let p = product("a", 250, 10);
        let mut cart = Cart::new();
        cart.add(&p, 2).unwrap();
        cart.add(&p, 3).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.total().cents(), 1250);
    }

    #[test]
    fn test_add_rejects_more_than_stock() {
        let p = product("a", 250, 4);
        let mut cart = Cart::new();
        cart.add(&p, 3).unwrap();

        let err = cart.add(&p, 2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 4, requested: 5, .. }
        ));
        // The failed add leaves the line untouched
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_add_rejects_inactive_and_bad_quantity() {
        let mut p = product("a", 100, 10);
        let mut cart = Cart::new();
        assert!(cart.add(&p, 0).is_err());

        p.is_active = false;
        assert!(matches!(
            cart.add(&p, 1),
            Err(CoreError::ProductInactive { .. })
        ));
    }

    #[test]
    fn test_into_items_freezes_prices() {
        let mut cart = Cart::new();
        cart.add(&product("a", 199, 10), 2).unwrap();
        cart.add(&product("b", 500, 10), 1).unwrap();
        assert_eq!(cart.unit_count(), 3);

        let mut n = 0;
        let items = cart.into_items("t-1", || {
            n += 1;
            format!("i-{}", n)
        });

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "i-1");
        assert_eq!(items[0].line_total_cents, 398);
        assert_eq!(items[0].unit_cost_cents, 99);
        assert_eq!(items[1].transaction_id, "t-1");
    }

    #[test]
    fn test_max_price_at_max_quantity_totals_exactly() {
        let p = product("a", MAX_PRICE_CENTS, MAX_STOCK_QUANTITY);
        let mut cart = Cart::new();
        cart.add(&p, MAX_ITEM_QUANTITY).unwrap();

        assert_eq!(cart.total().cents(), MAX_PRICE_CENTS * MAX_ITEM_QUANTITY);
        assert_eq!(cart.lines()[0].line_total().cents(), 99_900_000_000);
    }

    #[test]
    fn test_add_rejects_overflowing_total() {
        let p = product("a", i64::MAX / 2 + 1, 10);
        let mut cart = Cart::new();
        assert!(matches!(cart.add(&p, 2), Err(CoreError::AmountOverflow)));
        assert!(cart.is_empty());

        cart.add(&p, 1).unwrap();
        let q = product("b", i64::MAX / 2 + 1, 10);
        assert!(matches!(cart.add(&q, 1), Err(CoreError::AmountOverflow)));
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_settle_cash() {
        let total = Money::from_cents(870);
        let exact = Tender::settle(PaymentMethod::Cash, total, None).unwrap();
        assert_eq!(exact.amount_tendered_cents, Some(870));
        assert_eq!(exact.change_cents, Some(0));

        assert!(matches!(
            Tender::settle(PaymentMethod::Cash, total, Some(500)),
            Err(CoreError::InsufficientTender { .. })
        ));
    }

    #[test]
    fn test_settle_card_ignores_tender() {
        let t = Tender::settle(PaymentMethod::Card, Money::from_cents(870), Some(5000)).unwrap();
        assert_eq!(t, Tender::NONE);
    }
}
