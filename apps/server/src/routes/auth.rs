//! Login, current user and logout.
//!
//! Sessions are stateless JWTs with a fixed expiry; logout revokes the
//! token's `jti` for the rest of its lifetime.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_core::User;
use tally_db::password::{verify_dummy, verify_password};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    expires_at: DateTime<Utc>,
    user: User,
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let username = req.username.trim();
    let invalid = || ApiError::unauthorized("Invalid username or password");

    let Some(record) = state.db.users().get_by_username(username).await? else {
        verify_dummy(&req.password);
        warn!(username = %username, "Login rejected: unknown user");
        return Err(invalid());
    };

    if !verify_password(&req.password, &record.password_hash) {
        warn!(username = %username, "Login rejected: wrong password");
        return Err(invalid());
    }

    if !record.user.is_active {
        warn!(username = %username, "Login rejected: account disabled");
        return Err(ApiError::unauthorized("Account is disabled"));
    }

    let users = state.db.users();
    users.touch_last_login(&record.user.id).await?;
    let user = users
        .get_by_id(&record.user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &record.user.id))?;

    let issued = state.jwt.issue(&user)?;
    info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}

async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

async fn logout(State(state): State<AppState>, auth: AuthUser) -> StatusCode {
    let now = Utc::now().timestamp();
    state.with_revoked(|revoked| revoked.revoke(&auth.claims.jti, auth.claims.exp, now));
    info!(user_id = %auth.id(), "User logged out");
    StatusCode::NO_CONTENT
}
