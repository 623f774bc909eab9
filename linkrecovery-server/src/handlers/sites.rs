//! Site registry endpoints.

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::scan::run_scan;
use crate::state::SharedState;
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use linkrecovery_core::model::{CreateSiteRequest, CreateSiteResponse, ScanResponse, SitesResponse};
use tracing::info;

/// GET /api/sites
pub async fn list_sites(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<SitesResponse>, ApiError> {
    let db = state.db.lock().await;
    let sites = db.list_sites(&user.user_id)?;
    Ok(Json(SitesResponse { sites }))
}

/// POST /api/sites
pub async fn create_site(
    State(state): State<SharedState>,
    user: CurrentUser,
    WithRejection(Json(body), _): WithRejection<Json<CreateSiteRequest>, ApiError>,
) -> Result<Json<CreateSiteResponse>, ApiError> {
    let db = state.db.lock().await;
    if db.find_site_by_url(&user.user_id, &body.site_url)?.is_some() {
        return Err(ApiError::BadRequest("Site already exists".to_string()));
    }

    let site = db.create_site(&user.user_id, &body.site_url)?;
    info!("Added site {}", site.site_url);
    Ok(Json(CreateSiteResponse {
        message: "Site added successfully".to_string(),
        site,
    }))
}

/// POST /api/sites/{site_id}/scan
pub async fn scan_site(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(site_id): Path<String>,
) -> Result<Json<ScanResponse>, ApiError> {
    let site = {
        let db = state.db.lock().await;
        db.get_site(&user.user_id, &site_id)?
            .ok_or(ApiError::NotFound("Site not found"))?
    };

    let outcome = run_scan(&state, &site).await?;
    Ok(Json(ScanResponse {
        message: "Scan completed".to_string(),
        errors_found: outcome.errors_found,
        urls_inspected: outcome.urls_inspected,
    }))
}
