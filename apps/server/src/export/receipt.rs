//! Plain-text receipt, the printable body of the receipt window.
//!
//! ```text
//!                Tally Store
//!               1 High Street
//! ----------------------------------------
//! Receipt  R-20260504-0003
//! Date     2026-05-04 14:02 UTC
//! Cashier  Front Till
//! ----------------------------------------
//! Cola 330ml
//!   2 x $1.50                        $3.00
//! ----------------------------------------
//! TOTAL                              $3.00
//! Payment                             Cash
//! Tendered                           $5.00
//! Change                             $2.00
//! ----------------------------------------
//!          Thank you for shopping!
//! ```

use tally_core::{Money, Transaction, TransactionStatus};

use crate::config::StoreConfig;

pub const RECEIPT_WIDTH: usize = 40;

fn rule() -> String {
    "-".repeat(RECEIPT_WIDTH)
}

fn centered(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((RECEIPT_WIDTH - len) / 2), text)
}

/// `left` and `right` on one line, right-aligned to the receipt width.
fn spread(left: &str, right: &str) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = RECEIPT_WIDTH.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

pub fn render(txn: &Transaction, store: &StoreConfig) -> String {
    let mut lines = vec![centered(&store.name)];
    if let Some(address) = &store.address {
        lines.push(centered(address));
    }
    lines.push(rule());

    lines.push(format!("Receipt  {}", txn.receipt_number));
    lines.push(format!("Date     {}", txn.created_at.format("%Y-%m-%d %H:%M UTC")));
    if let Some(cashier) = &txn.cashier_name {
        lines.push(format!("Cashier  {}", cashier));
    }
    lines.push(rule());

    for item in &txn.items {
        lines.push(item.name_snapshot.clone());
        lines.push(spread(
            &format!(
                "  {} x {}",
                item.quantity,
                Money::from_cents(item.unit_price_cents)
            ),
            &item.line_total().to_string(),
        ));
    }
    lines.push(rule());

    lines.push(spread("TOTAL", &txn.total().to_string()));
    lines.push(spread("Payment", txn.payment_method.label()));
    if let Some(tendered) = txn.amount_tendered_cents {
        lines.push(spread("Tendered", &Money::from_cents(tendered).to_string()));
    }
    if let Some(change) = txn.change_cents {
        lines.push(spread("Change", &Money::from_cents(change).to_string()));
    }

    match txn.status {
        TransactionStatus::Completed => {}
        TransactionStatus::Pending => lines.push(spread("Status", "PENDING")),
        TransactionStatus::Refunded => lines.push(spread("Status", "REFUNDED")),
    }

    lines.push(rule());
    lines.push(centered("Thank you for shopping!"));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
