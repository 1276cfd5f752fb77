//! Liveness probe. Unauthenticated.
//!
//! 503 when the database is unreachable or its schema is behind the binary.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tally_db::MigrationStatus;
use tracing::warn;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<Migrations>,
}

#[derive(Debug, Serialize)]
struct Migrations {
    embedded: usize,
    applied: usize,
}

impl From<MigrationStatus> for Migrations {
    fn from(status: MigrationStatus) -> Self {
        Migrations {
            embedded: status.embedded,
            applied: status.applied,
        }
    }
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    if !state.db.health_check().await {
        return degraded("down", None);
    }

    match state.db.migration_status().await {
        Ok(status) if status.is_current() => (
            StatusCode::OK,
            Json(Health {
                status: "ok",
                database: "up",
                migrations: Some(status.into()),
            }),
        ),
        Ok(status) => {
            warn!(
                embedded = status.embedded,
                applied = status.applied,
                "Database schema has pending migrations"
            );
            degraded("up", Some(status.into()))
        }
        Err(e) => {
            warn!(error = %e, "Failed to read migration status");
            degraded("up", None)
        }
    }
}

fn degraded(database: &'static str, migrations: Option<Migrations>) -> (StatusCode, Json<Health>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(Health {
            status: "degraded",
            database,
            migrations,
        }),
    )
}
