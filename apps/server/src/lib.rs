//! # Tally Server
//!
//! REST backend for the Tally POS single-page app: catalogue, checkout,
//! staff accounts, reports and the scan bridge, all under `/api`.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SPA ──HTTP──► TraceLayer ──► CorsLayer ──► /api router                 │
//! │                                               │                         │
//! │                                     AuthUser extractor (JWT)            │
//! │                                               │                         │
//! │                               handler: role check ──► 403               │
//! │                                               │                         │
//! │                         tally-core (pricing, reports, validation)       │
//! │                                               │                         │
//! │                              tally-db (SQLite repositories)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`auth`] - JWT sessions and the `AuthUser` extractor
//! - [`config`] - Layered configuration (defaults, TOML, env)
//! - [`error`] - `ApiError` and its HTTP mapping
//! - [`export`] - CSV, PDF and receipt rendering
//! - [`extract`] - `Json`/`Query`/`Path` wrappers that reject with `ApiError`
//! - [`routes`] - HTTP handlers
//! - [`state`] - Shared handler state

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod routes;
pub mod state;

use axum::http::header::{HeaderValue, CONTENT_DISPOSITION};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tally=debug,sqlx=warn";

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .nest("/api", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// An empty origin list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([CONTENT_DISPOSITION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Installs the global tracing subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
