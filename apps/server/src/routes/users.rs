//! Staff account management.
//!
//! Admins manage every account. Anyone may read their own profile and change
//! their own password, which requires the current password. Admins cannot
//! demote, deactivate or delete themselves; the repository additionally
//! refuses anything that would leave the store without an active admin.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use tally_core::input::{NewUser, PasswordChange, UserUpdate};
use tally_core::{Permission, User};
use tally_db::password::verify_password;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/password", put(change_password))
}

async fn list_users(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<Vec<User>>> {
    auth.require(Permission::ManageUsers)?;
    Ok(Json(state.db.users().list().await?))
}

async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<User>> {
    if id != auth.id() {
        auth.require(Permission::ManageUsers)?;
    }

    let user = state
        .db
        .users()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &id))?;

    Ok(Json(user))
}

async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(input): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    auth.require(Permission::ManageUsers)?;

    let input = input.normalized();
    input.validate()?;

    let user = state.db.users().insert(&input).await?;
    info!(user_id = %user.id, username = %user.username, role = %user.role, by = %auth.id(), "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> ApiResult<Json<User>> {
    auth.require(Permission::ManageUsers)?;

    let update = update.normalized();
    update.validate()?;

    if id == auth.id() && update.revokes_admin() {
        return Err(ApiError::conflict(
            "You cannot change your own role or deactivate your own account",
        ));
    }

    let user = state.db.users().update(&id, &update).await?;
    info!(user_id = %user.id, role = %user.role, active = user.is_active, by = %auth.id(), "User updated");
    Ok(Json(user))
}

async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(change): ApiJson<PasswordChange>,
) -> ApiResult<StatusCode> {
    let own_account = id == auth.id();
    if !own_account {
        auth.require(Permission::ManageUsers)?;
    }
    change.validate()?;

    let users = state.db.users();

    if own_account {
        let record = users
            .get_record_by_id(&id)
            .await?
            .ok_or_else(|| ApiError::not_found("User", &id))?;

        let current = change.current_password.as_deref().unwrap_or_default();
        if current.is_empty() {
            return Err(ApiError::validation("Current password is required"));
        }
        if !verify_password(current, &record.password_hash) {
            warn!(user_id = %id, "Password change rejected: wrong current password");
            return Err(ApiError::unauthorized("Current password is incorrect"));
        }
    }

    users.set_password(&id, &change.new_password).await?;
    info!(user_id = %id, by = %auth.id(), "Password updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    auth.require(Permission::ManageUsers)?;

    if id == auth.id() {
        return Err(ApiError::conflict("You cannot delete your own account"));
    }

    state.db.users().delete(&id).await?;
    info!(user_id = %id, by = %auth.id(), "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
