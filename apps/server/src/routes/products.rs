//! Catalogue endpoints.
//!
//! | Route                          | Permission  |
//! |--------------------------------|-------------|
//! | GET  /products[/..]            | ViewCatalog |
//! | POST/PUT/DELETE /products      | EditCatalog |
//! | POST /products/{id}/restock    | Restock     |
//!
//! Delete is a soft delete; sold products stay referenced by history.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tally_core::input::ProductInput;
use tally_core::validation::{validate_restock_quantity, validate_search_query};
use tally_core::{Permission, Product};
use tally_db::ProductFilter;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/low-stock", get(low_stock))
        .route("/barcode/{barcode}", get(get_by_barcode))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{id}/restock", post(restock))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductQuery {
    search: Option<String>,
    category_id: Option<String>,
    low_stock: Option<bool>,
    include_inactive: Option<bool>,
}

async fn list_products(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    auth.require(Permission::ViewCatalog)?;

    let search = match query.search.as_deref() {
        Some(s) if !s.trim().is_empty() => Some(validate_search_query(s)?),
        _ => None,
    };

    // Deactivated products are only shown to catalogue editors
    let include_inactive =
        query.include_inactive.unwrap_or(false) && auth.can(Permission::EditCatalog);

    let filter = ProductFilter {
        search,
        category_id: query.category_id.filter(|c| !c.trim().is_empty()),
        low_stock_only: query.low_stock.unwrap_or(false),
        include_inactive,
    };

    Ok(Json(state.db.products().list(&filter).await?))
}

async fn low_stock(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<Product>>> {
    auth.require(Permission::ViewCatalog)?;
    Ok(Json(state.db.products().low_stock().await?))
}

async fn get_by_barcode(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(barcode): ApiPath<String>,
) -> ApiResult<Json<Product>> {
    auth.require(Permission::ViewCatalog)?;

    let product = state
        .db
        .products()
        .get_by_barcode(barcode.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &barcode))?;

    Ok(Json(product))
}

async fn get_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Product>> {
    auth.require(Permission::ViewCatalog)?;

    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(Json(product))
}

/// Normalizes and validates a product form, including the category
/// reference.
async fn checked_input(state: &AppState, input: ProductInput) -> ApiResult<ProductInput> {
    let input = input.normalized();
    input.validate()?;

    if let Some(category_id) = &input.category_id {
        if state.db.categories().get_by_id(category_id).await?.is_none() {
            return Err(ApiError::validation(format!(
                "Category not found: {}",
                category_id
            )));
        }
    }

    Ok(input)
}

async fn create_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    auth.require(Permission::EditCatalog)?;

    let input = checked_input(&state, input).await?;
    let product = state.db.products().insert(&input).await?;

    info!(product_id = %product.id, barcode = %product.barcode, by = %auth.id(), "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<Product>> {
    auth.require(Permission::EditCatalog)?;

    let input = checked_input(&state, input).await?;
    let product = state.db.products().update(&id, &input).await?;

    info!(product_id = %product.id, by = %auth.id(), "Product updated");
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    auth.require(Permission::EditCatalog)?;

    state.db.products().deactivate(&id).await?;

    info!(product_id = %id, by = %auth.id(), "Product deactivated");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct RestockRequest {
    quantity: i64,
}

async fn restock(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(req): ApiJson<RestockRequest>,
) -> ApiResult<Json<Product>> {
    auth.require(Permission::Restock)?;
    validate_restock_quantity(req.quantity)?;

    let product = state.db.products().restock(&id, req.quantity).await?;

    info!(
        product_id = %id,
        quantity = req.quantity,
        stock = product.stock_quantity,
        by = %auth.id(),
        "Product restocked"
    );
    Ok(Json(product))
}
