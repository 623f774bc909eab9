//! Broken URL endpoints.

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::SharedState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::WithRejection;
use linkrecovery_core::data::Database;
use linkrecovery_core::model::{
    ErrorDetail, ErrorListQuery, ErrorRecord, ErrorStatus, ErrorsResponse, RecommendationResponse,
    Site, UpdateStatusRequest, UpdateStatusResponse,
};
use tracing::info;

/// Fixed URLs offered to the advisor as redirect targets.
const EXISTING_PAGE_LIMIT: usize = 50;

fn parse_status(raw: &str) -> Result<ErrorStatus, ApiError> {
    raw.parse::<ErrorStatus>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Load an error and the site it belongs to, checking ownership.
fn owned_error(
    db: &Database,
    user: &CurrentUser,
    error_id: &str,
) -> Result<(ErrorRecord, Site), ApiError> {
    let error = db
        .get_error(error_id)?
        .ok_or(ApiError::NotFound("Error not found"))?;
    let site = db
        .get_site(&user.user_id, &error.site_id)?
        .ok_or(ApiError::NotFound("Unauthorized"))?;
    Ok((error, site))
}

/// GET /api/errors?site_id=&status=
pub async fn list_errors(
    State(state): State<SharedState>,
    user: CurrentUser,
    Query(query): Query<ErrorListQuery>,
) -> Result<Json<ErrorsResponse>, ApiError> {
    let site_id = query.site_id.as_deref().filter(|s| !s.is_empty());
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(parse_status(raw)?),
        None => None,
    };

    let db = state.db.lock().await;
    if let Some(site_id) = site_id
        && db.get_site(&user.user_id, site_id)?.is_none()
    {
        return Err(ApiError::NotFound("Site not found"));
    }

    let errors = db.list_errors(&user.user_id, site_id, status)?;
    let count = errors.len();
    Ok(Json(ErrorsResponse { errors, count }))
}

/// GET /api/errors/{error_id}
pub async fn get_error(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(error_id): Path<String>,
) -> Result<Json<ErrorDetail>, ApiError> {
    let db = state.db.lock().await;
    let (error, site) = owned_error(&db, &user, &error_id)?;
    let backlinks = db.list_backlinks(&error.id)?;
    let recommendation = db.get_recommendation(&error.id)?;

    Ok(Json(ErrorDetail {
        error,
        site: Some(site),
        backlinks,
        recommendation,
    }))
}

/// POST /api/errors/{error_id}/generate-recommendations
///
/// Always regenerates. The stored recommendation keeps its id.
pub async fn generate_recommendations(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(error_id): Path<String>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let (error, site, existing_pages) = {
        let db = state.db.lock().await;
        let (error, site) = owned_error(&db, &user, &error_id)?;
        let pages = db.fixed_urls(&site.id, EXISTING_PAGE_LIMIT)?;
        (error, site, pages)
    };

    let recommendation = state.advisor.recommend(&error, &site, &existing_pages).await;

    let db = state.db.lock().await;
    let recommendation = db.upsert_recommendation(&recommendation)?;
    info!("Generated recommendation for {}", error.url);
    Ok(Json(RecommendationResponse { recommendation }))
}

/// PATCH /api/errors/{error_id}
///
/// Any status may move to any other.
pub async fn update_error_status(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(error_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateStatusRequest>, ApiError>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
    let status = parse_status(&body.status)?;

    let db = state.db.lock().await;
    let (error, _) = owned_error(&db, &user, &error_id)?;
    db.update_error_status(&error.id, status)?;
    info!("Marked {} as {}", error.url, status);

    Ok(Json(UpdateStatusResponse {
        message: "Error status updated".to_string(),
        status,
    }))
}
