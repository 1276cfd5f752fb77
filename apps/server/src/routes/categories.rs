//! Category endpoints. Deleting is admin only and refused while active
//! products use the category.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tally_core::input::CategoryInput;
use tally_core::{Category, Permission};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Category>>> {
    auth.require(Permission::ViewCatalog)?;
    Ok(Json(state.db.categories().list().await?))
}

async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Category>> {
    auth.require(Permission::ViewCatalog)?;

    let category = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    Ok(Json(category))
}

async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    auth.require(Permission::EditCatalog)?;

    let input = input.normalized();
    input.validate()?;

    let category = state.db.categories().insert(&input).await?;
    info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Json<Category>> {
    auth.require(Permission::EditCatalog)?;

    let input = input.normalized();
    input.validate()?;

    Ok(Json(state.db.categories().update(&id, &input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    auth.require(Permission::DeleteCategory)?;

    state.db.categories().delete(&id).await?;
    info!(category_id = %id, by = %auth.id(), "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
