//! # Report Endpoints
//!
//! ```text
//! GET /api/reports/sales?from=2026-05-01&to=2026-05-31
//!      │
//!      ▼
//! list_in_range [from 00:00, to+1 00:00) ──► SalesSummary::build
//!      │
//!      ├──► JSON
//!      └──► ReportDocument::sales ──► csv::render / pdf::render
//! ```
//!
//! CSV and PDF are rendered from the same [`SalesSummary`] as the JSON, so
//! the figures always agree. Managers and admins only.

use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use tally_core::report::{InventorySummary, SalesSummary};
use tally_core::validation::{parse_date, validate_date_range};
use tally_core::Permission;
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::export::{self, ExportError, PdfRequest, ReportDocument};
use crate::routes::{attachment, day_bounds};
use crate::state::AppState;

/// Days covered when no range is given (today included).
const DEFAULT_RANGE_DAYS: i64 = 30;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const PDF_CONTENT_TYPE: &str = "application/pdf";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sales))
        .route("/sales.csv", get(sales_csv))
        .route("/sales.pdf", get(sales_pdf))
        .route("/inventory", get(inventory))
        .route("/inventory.csv", get(inventory_csv))
        .route("/inventory.pdf", get(inventory_pdf))
        .route("/pdf", post(custom_pdf))
}

// =============================================================================
// Loading
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    from: Option<String>,
    to: Option<String>,
}

impl RangeQuery {
    /// Resolves the inclusive date range, defaulting to the last 30 days.
    fn resolve(&self, today: NaiveDate) -> ApiResult<(NaiveDate, NaiveDate)> {
        let to = match self.to.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(v) => parse_date("to", v)?,
            None => today,
        };
        let from = match self.from.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(v) => parse_date("from", v)?,
            None => to - Duration::days(DEFAULT_RANGE_DAYS - 1),
        };

        validate_date_range(from, to)?;
        Ok((from, to))
    }
}

async fn load_sales(state: &AppState, auth: &AuthUser, range: &RangeQuery) -> ApiResult<SalesSummary> {
    auth.require(Permission::ViewReports)?;

    let (from, to) = range.resolve(Utc::now().date_naive())?;
    let (start, end) = day_bounds(from, to);
    let transactions = state.db.transactions().list_in_range(start, end).await?;

    Ok(SalesSummary::build(&transactions, from, to))
}

async fn load_inventory(state: &AppState, auth: &AuthUser) -> ApiResult<InventorySummary> {
    auth.require(Permission::ViewReports)?;

    let products = state.db.products().list_all().await?;
    let categories = state.db.categories().list().await?;

    Ok(InventorySummary::build(&products, &categories))
}

// =============================================================================
// Rendering
// =============================================================================

/// Renderer failures are logged and surfaced as a generic 500.
fn rendered(kind: &str, result: Result<Vec<u8>, ExportError>) -> ApiResult<Vec<u8>> {
    result.map_err(|e| {
        error!(kind = %kind, error = %e, "Report export failed");
        ApiError::internal("Failed to generate report")
    })
}

fn sales_filename(summary: &SalesSummary, ext: &str) -> String {
    format!("sales-{}-to-{}.{}", summary.from, summary.to, ext)
}

fn inventory_filename(ext: &str) -> String {
    format!("inventory-{}.{}", Utc::now().date_naive(), ext)
}

// =============================================================================
// Handlers
// =============================================================================

async fn sales(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(range): ApiQuery<RangeQuery>,
) -> ApiResult<Json<SalesSummary>> {
    Ok(Json(load_sales(&state, &auth, &range).await?))
}

async fn sales_csv(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(range): ApiQuery<RangeQuery>,
) -> ApiResult<Response> {
    let summary = load_sales(&state, &auth, &range).await?;
    let doc = ReportDocument::sales(&summary, &state.config.store.name);
    let body = rendered("sales.csv", export::csv::render(&doc))?;

    info!(from = %summary.from, to = %summary.to, by = %auth.id(), "Sales CSV exported");
    Ok(attachment(CSV_CONTENT_TYPE, &sales_filename(&summary, "csv"), body))
}

async fn sales_pdf(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(range): ApiQuery<RangeQuery>,
) -> ApiResult<Response> {
    let summary = load_sales(&state, &auth, &range).await?;
    let doc = ReportDocument::sales(&summary, &state.config.store.name);
    let body = rendered("sales.pdf", export::pdf::render(&doc))?;

    info!(from = %summary.from, to = %summary.to, by = %auth.id(), "Sales PDF exported");
    Ok(attachment(PDF_CONTENT_TYPE, &sales_filename(&summary, "pdf"), body))
}

async fn inventory(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<InventorySummary>> {
    Ok(Json(load_inventory(&state, &auth).await?))
}

async fn inventory_csv(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Response> {
    let summary = load_inventory(&state, &auth).await?;
    let doc = ReportDocument::inventory(&summary, &state.config.store.name);
    let body = rendered("inventory.csv", export::csv::render(&doc))?;

    Ok(attachment(CSV_CONTENT_TYPE, &inventory_filename("csv"), body))
}

async fn inventory_pdf(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Response> {
    let summary = load_inventory(&state, &auth).await?;
    let doc = ReportDocument::inventory(&summary, &state.config.store.name);
    let body = rendered("inventory.pdf", export::pdf::render(&doc))?;

    Ok(attachment(PDF_CONTENT_TYPE, &inventory_filename("pdf"), body))
}

/// Renders a report the SPA assembled itself.
async fn custom_pdf(auth: AuthUser, ApiJson(req): ApiJson<PdfRequest>) -> ApiResult<Response> {
    auth.require(Permission::ViewReports)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    if req.rows.iter().any(|row| row.len() > req.columns.len()) {
        return Err(ApiError::validation("A row has more cells than there are columns"));
    }

    let filename = format!("{}.pdf", slug(&req.title));
    let doc = ReportDocument::from(req);
    let body = rendered("custom.pdf", export::pdf::render(&doc))?;

    Ok(attachment(PDF_CONTENT_TYPE, &filename, body))
}

/// Lowercase ASCII file stem, `report` when nothing usable is left.
fn slug(title: &str) -> String {
    let slug = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_default_range_is_last_30_days() {
        let (from, to) = RangeQuery::default().resolve(date("2026-05-31")).unwrap();
        assert_eq!(from, date("2026-05-02"));
        assert_eq!(to, date("2026-05-31"));
    }

    #[test]
    fn test_range_validation() {
        let reversed = RangeQuery {
            from: Some("2026-05-10".to_string()),
            to: Some("2026-05-01".to_string()),
        };
        assert!(reversed.resolve(date("2026-05-31")).is_err());

        let garbage = RangeQuery {
            from: Some("May 1st".to_string()),
            to: None,
        };
        assert!(garbage.resolve(date("2026-05-31")).is_err());
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Weekly Sales: Till 2"), "weekly-sales-till-2");
        assert_eq!(slug("!!!"), "report");
    }
}
