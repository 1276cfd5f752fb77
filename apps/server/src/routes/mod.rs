//! # HTTP Routes
//!
//! Every endpoint lives under `/api`. Handlers take the [`AuthUser`]
//! extractor (except login and health) and check the role permission they
//! need before touching the database.
//!
//! ```text
//! /api
//! ├── /auth          login, me, logout
//! ├── /products      catalogue CRUD, barcode lookup, restock
//! ├── /categories    category CRUD
//! ├── /transactions  checkout, history, complete, refund, receipt
//! ├── /users         staff accounts (admin)
//! ├── /reports       sales + inventory as JSON, CSV, PDF
//! ├── /scans         scan bridge
//! ├── /dashboard     role-specific landing summary
//! └── /health        liveness (no auth)
//! ```
//!
//! [`AuthUser`]: crate::auth::AuthUser

mod auth;
mod categories;
mod dashboard;
mod health;
mod products;
mod reports;
mod scans;
mod transactions;
mod users;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/transactions", transactions::router())
        .nest("/users", users::router())
        .nest("/reports", reports::router())
        .nest("/scans", scans::router())
        .merge(dashboard::router())
        .merge(health::router())
}

/// A downloadable body with `Content-Disposition: attachment`.
pub(crate) fn attachment(content_type: &str, filename: &str, body: impl IntoResponse) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Midnight UTC at the start of `date`.
pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// `[start of from, start of the day after to)`.
pub(crate) fn day_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = to.succ_opt().unwrap_or(to);
    (start_of_day(from), start_of_day(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let (from, to) = day_bounds(d, d);
        assert_eq!(from.to_rfc3339(), "2026-02-28T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }
}
