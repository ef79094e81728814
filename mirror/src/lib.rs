//! Shared state and HTTP API for the Keygate mirror service.
//!
//! The mirror receives per-owner license subsets pushed by the issuing
//! process and serves them for external lookup. It holds one JSON file
//! per owner plus a merged aggregate, and exposes:
//!
//! - `GET /health` — reachability probe
//! - `POST /upload/{owner}` — authenticated full-subset replace
//! - `GET /licenses/{owner}` — per-owner lookup (unauthenticated)
//! - `GET /licenses` — full aggregate (privileged)
//! - `POST /sync` — rebuild the aggregate from the owner files (privileged)

mod files;

pub use files::MirrorDir;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use keygate_types::{LicenseMap, OwnerId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state for the mirror's HTTP handlers.
#[derive(Debug, Clone)]
pub struct MirrorState {
    /// Shared secret expected as `Authorization: Bearer` on privileged
    /// routes.
    pub upload_secret: String,
    /// Mirror file directory.
    pub files: MirrorDir,
}

/// Body of `GET /health`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Body of a successful `POST /upload/{owner}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub count: usize,
}

/// Body of `GET /licenses/{owner}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OwnerLicensesResponse {
    pub success: bool,
    pub owner_id: OwnerId,
    pub licenses: LicenseMap,
    pub timestamp: String,
}

/// Body of the privileged `GET /licenses`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AggregateResponse {
    pub success: bool,
    pub licenses: LicenseMap,
    pub total: usize,
    pub timestamp: String,
}

/// Body of the privileged `POST /sync`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
}

/// Error body shared by all failure responses.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn authorized(state: &MirrorState, headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", state.upload_secret);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == expected)
}

/// Owner ids become filenames; restrict them to characters that cannot
/// escape the mirror directory.
fn valid_owner_id(owner: &str) -> bool {
    !owner.is_empty()
        && owner
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: now_rfc3339(),
    })
}

async fn upload_handler(
    State(state): State<Arc<MirrorState>>,
    Path(owner): Path<String>,
    headers: HeaderMap,
    body: Result<Json<LicenseMap>, JsonRejection>,
) -> Response {
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "unauthorized");
    }
    if !valid_owner_id(&owner) {
        return error(StatusCode::BAD_REQUEST, "invalid owner id");
    }
    let Ok(Json(subset)) = body else {
        return error(StatusCode::BAD_REQUEST, "no data provided");
    };
    if subset.is_empty() {
        return error(StatusCode::BAD_REQUEST, "no data provided");
    }

    let owner = OwnerId::new(owner);
    if let Err(err) = state.files.save_owner(&owner, &subset) {
        warn!(owner = %owner, "failed to persist subset: {err}");
        return error(StatusCode::INTERNAL_SERVER_ERROR, "failed to save licenses");
    }
    // The upload itself already succeeded; a failed rebuild only leaves
    // the aggregate stale until the next one.
    if let Err(err) = state.files.rebuild_aggregate() {
        warn!("aggregate rebuild failed: {err}");
    }
    info!(owner = %owner, count = subset.len(), "subset updated");

    (
        StatusCode::OK,
        Json(UploadResponse {
            success: true,
            message: format!("licenses updated for owner {owner}"),
            timestamp: now_rfc3339(),
            count: subset.len(),
        }),
    )
        .into_response()
}

async fn owner_licenses_handler(
    State(state): State<Arc<MirrorState>>,
    Path(owner): Path<String>,
) -> Response {
    if !valid_owner_id(&owner) {
        return error(StatusCode::BAD_REQUEST, "invalid owner id");
    }
    let owner = OwnerId::new(owner);
    let licenses = state.files.load_owner(&owner);
    if licenses.is_empty() {
        return error(StatusCode::NOT_FOUND, "no licenses found for this owner");
    }
    Json(OwnerLicensesResponse {
        success: true,
        owner_id: owner,
        licenses,
        timestamp: now_rfc3339(),
    })
    .into_response()
}

async fn all_licenses_handler(
    State(state): State<Arc<MirrorState>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "unauthorized");
    }
    let licenses = state.files.load_aggregate();
    let total = licenses.len();
    Json(AggregateResponse {
        success: true,
        licenses,
        total,
        timestamp: now_rfc3339(),
    })
    .into_response()
}

async fn sync_handler(State(state): State<Arc<MirrorState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "unauthorized");
    }
    match state.files.rebuild_aggregate() {
        Ok(count) => {
            info!(count, "aggregate rebuilt");
            Json(SyncResponse {
                success: true,
                message: format!("aggregate rebuilt from owner files ({count} licenses)"),
                timestamp: now_rfc3339(),
            })
            .into_response()
        }
        Err(err) => {
            warn!("aggregate rebuild failed: {err}");
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to rebuild aggregate",
            )
        }
    }
}

/// Builds the mirror HTTP router over the given state.
pub fn build_router(state: Arc<MirrorState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/upload/{owner}", post(upload_handler))
        .route("/licenses", get(all_licenses_handler))
        .route("/licenses/{owner}", get(owner_licenses_handler))
        .route("/sync", post(sync_handler))
        .with_state(state)
}
