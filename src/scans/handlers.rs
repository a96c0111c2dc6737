use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::SaveScanRequest;
use super::repo::{PendingScan, Scan, ScanError, Viewer};
use crate::auth::extractors::{AdminUser, AuthUser};
use crate::auth::repo::Profile;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/scans", post(save_scan))
        .route("/scans/pending", get(pending_scans))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/scans/:id/process", post(process_scan))
}

/// Submit a decoded scan. The authentication requirement lives in the data
/// layer; an anonymous call is rejected before anything is written.
#[instrument(skip(state, payload))]
async fn save_scan(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(payload): Json<SaveScanRequest>,
) -> Result<(StatusCode, Json<Scan>), (StatusCode, String)> {
    if payload.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "content is required".into()));
    }

    let user_id = user.map(|AuthUser(id)| id);
    match Scan::save(&state.db, payload.content.trim(), user_id).await {
        Ok(scan) => {
            info!(scan_id = %scan.id, "scan submitted");
            Ok((StatusCode::CREATED, Json(scan)))
        }
        Err(e @ ScanError::NotAuthenticated) => {
            warn!("scan rejected for anonymous caller");
            Err((StatusCode::UNAUTHORIZED, e.to_string()))
        }
        Err(ScanError::Other(e)) => Err(internal(e)),
    }
}

/// Pending submissions visible to the caller: admins see all, everyone
/// else sees only their own.
#[instrument(skip(state))]
async fn pending_scans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PendingScan>>, (StatusCode, String)> {
    let is_admin = Profile::find_by_id(&state.db, user_id)
        .await
        .map_err(internal)?
        .map(|p| p.is_admin())
        .unwrap_or(false);

    let scans = Scan::list_pending(&state.db, Viewer { user_id, is_admin })
        .await
        .map_err(internal)?;
    Ok(Json(scans))
}

#[instrument(skip(state))]
async fn process_scan(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let found = Scan::mark_processed(&state.db, id)
        .await
        .map_err(internal)?;
    if !found {
        return Err((StatusCode::NOT_FOUND, "Scan not found".into()));
    }
    info!(scan_id = %id, admin_id = %admin, "scan marked as processed");
    Ok(StatusCode::NO_CONTENT)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
