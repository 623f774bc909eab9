use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::SharedState;
use axum::{Json, extract::State};
use linkrecovery_core::model::DashboardStats;
use serde_json::{Value, json};

/// GET /api/dashboard/stats
pub async fn dashboard_stats(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<DashboardStats>, ApiError> {
    let db = state.db.lock().await;
    Ok(Json(db.dashboard_stats(&user.user_id)?))
}

/// GET /api/
pub async fn api_root() -> Json<Value> {
    Json(json!({
        "message": "Link Recovery API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}
