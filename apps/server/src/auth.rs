//! JWT authentication module.
//!
//! Handles session token generation and validation, and the [`AuthUser`]
//! extractor every protected handler takes.
//!
//! ## Request Authentication
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! signature + exp valid? ──no──► 401 UNAUTHORIZED
//!        │
//!        ▼
//! jti revoked (logout)? ──yes──► 401
//!        │
//!        ▼
//! user exists and active? ──no──► 401
//!        │
//!        ▼
//! AuthUser { user, claims } ──► handler checks role permissions (403)
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tally_core::{Permission, Role, User};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub username: String,

    /// Role at issue time. Permission checks use the role loaded from the
    /// database, so a demotion applies immediately.
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID, used to revoke the token on logout
    pub jti: String,
}

/// An issued session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    session_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, session_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            session_lifetime_secs,
        }
    }

    /// Issues a session token with a fixed expiry.
    pub fn issue(&self, user: &User) -> ApiResult<IssuedToken> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.session_lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!("Failed to generate token: {}", e);
            ApiError::internal("Failed to generate token")
        })?;

        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "Rejected session token");
            ApiError::unauthorized("Invalid or expired session")
        })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Loaded fresh on every request.
    pub user: User,
    pub claims: Claims,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.user.role.can(permission)
    }

    /// 403 unless the caller's role grants `permission`.
    pub fn require(&self, permission: Permission) -> ApiResult<()> {
        self.user.role.require(permission).map_err(ApiError::from)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let claims = state.jwt.validate_token(token)?;

        if state.with_revoked(|revoked| revoked.is_revoked(&claims.jti)) {
            return Err(ApiError::unauthorized("Session has been logged out"));
        }

        let user = state
            .db
            .users()
            .get_by_id(&claims.sub)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ApiError::unauthorized("Account is no longer active"))?;

        Ok(AuthUser { user, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: "u-1".to_string(),
            username: "till1".to_string(),
            full_name: "Till One".to_string(),
            email: None,
            role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let issued = manager.issue(&user(Role::Manager)).unwrap();
        let claims = manager.validate_token(&issued.token).unwrap();

        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.username, "till1");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_each_token_has_its_own_jti() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let a = manager.validate_token(&manager.issue(&user(Role::Cashier)).unwrap().token).unwrap();
        let b = manager.validate_token(&manager.issue(&user(Role::Cashier)).unwrap().token).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600);
        let verifier = JwtManager::new("secret-b".to_string(), 3600);

        let issued = issuer.issue(&user(Role::Admin)).unwrap();
        assert!(verifier.validate_token(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway
        let manager = JwtManager::new("test-secret".to_string(), -600);
        let issued = manager.issue(&user(Role::Admin)).unwrap();
        assert!(manager.validate_token(&issued.token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
