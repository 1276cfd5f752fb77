//! Scan bridge endpoints.
//!
//! A scanner device posts barcodes, checkout screens poll for them. Any
//! signed-in role may do either. The buffer lock is released before the
//! product lookups run.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tally_core::scan::{ScanEvent, DEFAULT_SOURCE};
use tally_core::validation::validate_barcode;
use tally_core::Product;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(poll).post(submit))
        .route("/latest", get(latest))
}

#[derive(Debug, Deserialize)]
struct ScanRequest {
    barcode: String,
    #[serde(default)]
    source: Option<String>,
}

/// A relayed scan with the product it resolves to, if any.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanView {
    #[serde(flatten)]
    event: ScanEvent,
    product: Option<Product>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    accepted: bool,
    scan: Option<ScanView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PollResponse {
    scans: Vec<ScanView>,
    latest_seq: u64,
}

#[derive(Debug, Default, Deserialize)]
struct PollQuery {
    #[serde(default)]
    after: Option<u64>,
}

async fn resolve(state: &AppState, event: ScanEvent) -> ApiResult<ScanView> {
    let product = state.db.products().get_by_barcode(&event.barcode).await?;
    Ok(ScanView { event, product })
}

async fn submit(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiJson(req): ApiJson<ScanRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    let barcode = req.barcode.trim().to_string();
    validate_barcode(&barcode)?;

    let source = req
        .source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SOURCE)
        .to_string();

    let recorded = state.with_scans(|scans| scans.record(&barcode, &source, Utc::now()));

    let scan = match recorded {
        Some(event) => Some(resolve(&state, event).await?),
        None => None,
    };

    Ok(Json(SubmitResponse {
        accepted: scan.is_some(),
        scan,
    }))
}

async fn poll(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<PollQuery>,
) -> ApiResult<Json<PollResponse>> {
    let after = query.after.unwrap_or(0);
    let (events, latest_seq) = state.with_scans(|scans| (scans.since(after), scans.latest_seq()));

    let mut views = Vec::with_capacity(events.len());
    for event in events {
        views.push(resolve(&state, event).await?);
    }

    Ok(Json(PollResponse {
        scans: views,
        latest_seq,
    }))
}

async fn latest(State(state): State<AppState>, _auth: AuthUser) -> ApiResult<Json<Option<ScanView>>> {
    let event = state.with_scans(|scans| scans.latest().cloned());

    let view = match event {
        Some(event) => Some(resolve(&state, event).await?),
        None => None,
    };

    Ok(Json(view))
}
