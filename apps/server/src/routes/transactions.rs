//! # Transaction Endpoints
//!
//! ## Checkout Flow
//! ```text
//! POST /api/transactions
//! { items: [{ barcode: "5449000000996", quantity: 2 }, { productId, quantity }],
//!   paymentMethod: "cash", amountTenderedCents: 500 }
//!      │
//!      ▼
//! look up each line (productId or barcode) ──► 404 unknown product
//!      │
//!      ▼
//! Cart::add (price from catalogue, merge repeats,
//!            reject inactive / over stock) ──────► 422
//!      │
//!      ▼
//! Tender::settle (cash below total) ─────────────► 422 PAYMENT_ERROR
//!      │
//!      ▼
//! TransactionRepository::checkout (stock taken atomically) ──► 201
//! ```
//!
//! Cashiers only ever see their own sales; other people's transactions
//! answer 404.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tally_core::cart::{Cart, Tender};
use tally_core::validation::{parse_date, validate_cart_size};
use tally_core::{CoreError, PaymentMethod, Permission, Transaction, TransactionStatus};
use tally_db::{NewTransaction, TransactionFilter};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::export::receipt;
use crate::routes::{attachment, start_of_day};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(checkout))
        .route("/{id}", get(get_transaction).delete(delete_transaction))
        .route("/{id}/complete", post(complete))
        .route("/{id}/refund", post(refund))
        .route("/{id}/receipt", get(receipt_text))
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutLine {
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest {
    items: Vec<CheckoutLine>,
    payment_method: PaymentMethod,
    #[serde(default)]
    amount_tendered_cents: Option<i64>,
    /// Record without taking payment or stock.
    #[serde(default)]
    pending: bool,
}

/// Prices the requested lines against the current catalogue.
async fn build_cart(state: &AppState, lines: &[CheckoutLine]) -> ApiResult<Cart> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }
    validate_cart_size(lines.len())?;

    let products = state.db.products();
    let mut cart = Cart::new();

    for line in lines {
        let product = match (line.product_id.as_deref(), line.barcode.as_deref()) {
            (Some(id), _) if !id.trim().is_empty() => products
                .get_by_id(id.trim())
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?,
            (_, Some(barcode)) if !barcode.trim().is_empty() => products
                .get_by_barcode(barcode.trim())
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(barcode.to_string()))?,
            _ => {
                return Err(ApiError::validation(
                    "Each item needs a productId or a barcode",
                ))
            }
        };

        cart.add(&product, line.quantity)?;
    }

    Ok(cart)
}

async fn checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    auth.require(Permission::Checkout)?;

    let cart = build_cart(&state, &req.items).await?;

    let (status, tender) = if req.pending {
        (TransactionStatus::Pending, Tender::NONE)
    } else {
        let tender = Tender::settle(req.payment_method, cart.total(), req.amount_tendered_cents)?;
        (TransactionStatus::Completed, tender)
    };

    let txn = state
        .db
        .transactions()
        .checkout(NewTransaction {
            cashier_id: auth.id().to_string(),
            payment_method: req.payment_method,
            status,
            tender,
            cart,
        })
        .await?;

    info!(
        receipt = %txn.receipt_number,
        total_cents = txn.total_cents,
        status = %txn.status,
        cashier_id = %auth.id(),
        "Checkout complete"
    );
    Ok((StatusCode::CREATED, Json(txn)))
}

// =============================================================================
// History
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    /// `YYYY-MM-DD`, inclusive.
    from: Option<String>,
    /// `YYYY-MM-DD`, inclusive.
    to: Option<String>,
    status: Option<String>,
    cashier_id: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ListQuery {
    fn into_filter(self, auth: &AuthUser) -> ApiResult<TransactionFilter> {
        let from = non_blank(&self.from)
            .map(|v| parse_date("from", v))
            .transpose()?
            .map(start_of_day);
        let to = non_blank(&self.to)
            .map(|v| parse_date("to", v))
            .transpose()?
            .map(|d| start_of_day(d.succ_opt().unwrap_or(d)));
        let status = non_blank(&self.status)
            .map(str::parse::<TransactionStatus>)
            .transpose()?;

        let cashier_id = if auth.can(Permission::ViewAllTransactions) {
            non_blank(&self.cashier_id).map(str::to_string)
        } else {
            Some(auth.id().to_string())
        };

        Ok(TransactionFilter {
            from,
            to,
            status,
            cashier_id,
            limit: Some(self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)),
            offset: Some(self.offset.unwrap_or(0).max(0)),
        })
    }
}

async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let filter = query.into_filter(&auth)?;
    Ok(Json(state.db.transactions().list(&filter).await?))
}

/// Loads a transaction the caller is allowed to see.
async fn visible(state: &AppState, auth: &AuthUser, id: &str) -> ApiResult<Transaction> {
    let txn = state
        .db
        .transactions()
        .get_by_id(id)
        .await?
        .filter(|t| auth.can(Permission::ViewAllTransactions) || t.cashier_id == auth.id())
        .ok_or_else(|| ApiError::not_found("Transaction", id))?;
    Ok(txn)
}

async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(visible(&state, &auth, &id).await?))
}

async fn receipt_text(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Response> {
    let txn = visible(&state, &auth, &id).await?;
    let body = receipt::render(&txn, &state.config.store);
    Ok(attachment(
        "text/plain; charset=utf-8",
        &format!("{}.txt", txn.receipt_number),
        body,
    ))
}

// =============================================================================
// Status Changes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest {
    #[serde(default)]
    amount_tendered_cents: Option<i64>,
}

async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
    body: Bytes,
) -> ApiResult<Json<Transaction>> {
    auth.require(Permission::Checkout)?;

    // The body is optional; card and mobile sales send none
    let req: CompleteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("Invalid request body: {}", e)))?
    };

    let pending = visible(&state, &auth, &id).await?;
    let tendered = req.amount_tendered_cents;
    let tender = Tender::settle(pending.payment_method, pending.total(), tendered)?;

    let txn = state.db.transactions().complete(&id, tender).await?;
    info!(receipt = %txn.receipt_number, by = %auth.id(), "Pending sale completed");
    Ok(Json(txn))
}

async fn refund(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Transaction>> {
    auth.require(Permission::Refund)?;

    let txn = state.db.transactions().refund(&id).await?;
    info!(
        receipt = %txn.receipt_number,
        total_cents = txn.total_cents,
        by = %auth.id(),
        "Transaction refunded"
    );
    Ok(Json(txn))
}

async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    auth.require(Permission::DeleteTransaction)?;

    state.db.transactions().delete(&id).await?;
    info!(transaction_id = %id, by = %auth.id(), "Transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}
