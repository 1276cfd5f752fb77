//! Role-specific landing summary.
//!
//! ```text
//! cashier  ─► myToday
//! manager  ─► myToday + store (today, low stock, 5 most recent sales)
//! admin    ─► myToday + store + users (active accounts per role)
//! ```
//!
//! "Today" is the current UTC day and counts completed sales only.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tally_core::money::Money;
use tally_core::{Permission, Role, Transaction, TransactionStatus};
use tally_db::TransactionFilter;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::routes::day_bounds;
use crate::state::AppState;

const RECENT_TRANSACTIONS: i64 = 5;

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct DayTotals {
    transaction_count: i64,
    total_cents: i64,
}

impl DayTotals {
    fn of(transactions: &[Transaction]) -> Self {
        DayTotals {
            transaction_count: transactions.len() as i64,
            total_cents: transactions.iter().map(Transaction::total).sum::<Money>().cents(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreOverview {
    today: DayTotals,
    product_count: i64,
    low_stock_count: i64,
    recent_transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleCount {
    role: Role,
    count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard {
    role: Role,
    my_today: DayTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<StoreOverview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    users: Option<Vec<RoleCount>>,
}

async fn dashboard(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Dashboard>> {
    let today = Utc::now().date_naive();
    let (start, end) = day_bounds(today, today);
    let transactions = state.db.transactions();

    let completed_today = TransactionFilter {
        from: Some(start),
        to: Some(end),
        status: Some(TransactionStatus::Completed),
        ..Default::default()
    };

    let mine = transactions
        .list(&TransactionFilter {
            cashier_id: Some(auth.id().to_string()),
            ..completed_today.clone()
        })
        .await?;

    let store = if auth.can(Permission::ViewAllTransactions) {
        let all_today = transactions.list(&completed_today).await?;
        let recent = transactions
            .list(&TransactionFilter {
                limit: Some(RECENT_TRANSACTIONS),
                ..Default::default()
            })
            .await?;

        Some(StoreOverview {
            today: DayTotals::of(&all_today),
            product_count: state.db.products().count().await?,
            low_stock_count: state.db.products().count_low_stock().await?,
            recent_transactions: recent,
        })
    } else {
        None
    };

    let users = if auth.can(Permission::ManageUsers) {
        let counts = state.db.users().count_active_by_role().await?;
        Some(
            counts
                .into_iter()
                .map(|(role, count)| RoleCount { role, count })
                .collect(),
        )
    } else {
        None
    };

    Ok(Json(Dashboard {
        role: auth.role(),
        my_today: DayTotals::of(&mine),
        store,
        users,
    }))
}
