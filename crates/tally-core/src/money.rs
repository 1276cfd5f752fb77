//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A report that sums 10 000 receipts in floats drifts by cents, and the │
//! │  CSV export then disagrees with the dashboard.                         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every price, cost and total is an i64 number of cents.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price.checked_mul_quantity(2).unwrap(); // $21.98
//! let total = price + Money::from_cents(500); // $15.99
//! assert_eq!(doubled.cents(), 2198);
//! assert_eq!(total.to_string(), "$15.99");
//! ```
//!
//! ## Overflow
//! Checkout goes through the `checked_*` methods, which return
//! `CoreError::AmountOverflow`. The operators and `multiply_quantity`
//! saturate at the i64 bounds and never panic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies money by a quantity, failing on overflow.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Sparkling Water $2.99
    /// Quantity: 3
    ///      │
    ///      ▼
    /// checked_mul_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: $8.97
    /// ```
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_mul_quantity(3).unwrap().cents(), 897);
    /// assert!(Money::from_cents(i64::MAX / 2 + 1).checked_mul_quantity(2).is_err());
    /// ```
    pub fn checked_mul_quantity(&self, qty: i64) -> CoreResult<Money> {
        self.0
            .checked_mul(qty)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Adds two amounts, failing on overflow.
    pub fn checked_add(&self, other: Money) -> CoreResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(CoreError::AmountOverflow)
    }

    /// Multiplies money by a quantity, saturating at the i64 bounds.
    ///
    /// Used for stock valuation and stored line costs.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Divides evenly across `count` parts, rounding half up.
    ///
    /// Used for the average ticket. Returns zero when `count` is zero.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).average_over(3).cents(), 333);
    /// assert_eq!(Money::from_cents(1001).average_over(2).cents(), 501);
    /// assert_eq!(Money::from_cents(500).average_over(0).cents(), 0);
    /// ```
    pub fn average_over(&self, count: i64) -> Money {
        if count <= 0 {
            return Money::zero();
        }
        let doubled = self.0 as i128 * 2;
        let avg = (doubled + count as i128) / (2 * count as i128);
        Money(avg as i64)
    }

    /// Returns `self` as a share of `whole` in basis points (10000 = 100%).
    ///
    /// Used for gross margin on the sales report.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let profit = Money::from_cents(250);
    /// let revenue = Money::from_cents(1000);
    /// assert_eq!(profit.share_of_bps(revenue), 2500);
    /// ```
    pub fn share_of_bps(&self, whole: Money) -> i64 {
        if whole.0 == 0 {
            return 0;
        }
        ((self.0 as i128 * 10_000) / whole.0 as i128) as i64
    }

    /// Renders the amount without the currency sign, e.g. `1234.50`.
    ///
    /// CSV exports use this so spreadsheets parse the column as numbers.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_cents(123450).to_decimal_string(), "1234.50");
        assert_eq!(Money::from_cents(-5).to_decimal_string(), "-0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply_quantity(3).cents(), 3000);

        let mut c = a;
        c += b;
        c -= Money::from_cents(100);
        assert_eq!(c.cents(), 1400);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 1000);
    }

    #[test]
    fn test_average_rounding() {
        assert_eq!(Money::from_cents(1000).average_over(4).cents(), 250);
        assert_eq!(Money::from_cents(1000).average_over(3).cents(), 333);
        assert_eq!(Money::from_cents(5).average_over(2).cents(), 3);
    }

    #[test]
    fn test_share_of_bps() {
        assert_eq!(Money::from_cents(1).share_of_bps(Money::from_cents(3)), 3333);
        assert_eq!(Money::from_cents(1).share_of_bps(Money::zero()), 0);
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let big = Money::from_cents(i64::MAX / 2 + 1);
        assert!(matches!(big.checked_mul_quantity(2), Err(CoreError::AmountOverflow)));
        assert!(matches!(big.checked_add(big), Err(CoreError::AmountOverflow)));
        assert_eq!(big.checked_mul_quantity(1).unwrap(), big);
    }

    #[test]
    fn test_operators_saturate() {
        let big = Money::from_cents(i64::MAX - 1);
        assert_eq!((big + Money::from_cents(10)).cents(), i64::MAX);
        assert_eq!(big.multiply_quantity(3).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - Money::from_cents(1)).cents(), i64::MIN);

        let total: Money = [big, big].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }
}
