//! Session endpoints: demo login, logout and status.

use crate::auth::{CurrentUser, SESSION_COOKIE, removal_cookie, session_cookie, session_token};
use crate::error::ApiError;
use crate::state::SharedState;
use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use linkrecovery_core::data::DEMO_EMAIL;
use linkrecovery_core::model::{AuthStatus, MessageResponse, SessionUser};
use serde_json::{Value, json};
use tracing::{info, warn};

/// GET /api/auth/status
pub async fn auth_status(
    State(state): State<SharedState>,
    user: Result<CurrentUser, ApiError>,
) -> Result<Json<AuthStatus>, ApiError> {
    let Ok(user) = user else {
        return Ok(Json(AuthStatus {
            authenticated: false,
            user: None,
        }));
    };

    let db = state.db.lock().await;
    let status = match db.get_user(&user.user_id)? {
        Some(u) => AuthStatus {
            authenticated: true,
            user: Some(SessionUser {
                id: u.id,
                email: u.email,
            }),
        },
        None => AuthStatus {
            authenticated: false,
            user: None,
        },
    };
    Ok(Json(status))
}

/// POST /api/auth/demo-login
pub async fn demo_login(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let ttl = state.config.session_ttl();
    let token = {
        let db = state.db.lock().await;
        let user = db.upsert_user_by_email(DEMO_EMAIL)?;
        db.create_session(&user.id, ttl)?
    };
    info!("Demo user logged in");

    let jar = jar.add(session_cookie(&token, ttl)?);
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged in as demo user".to_string(),
        }),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    if let Some(token) = session_token(&jar) {
        let db = state.db.lock().await;
        if !db.delete_session(&token)? {
            warn!("Logout with unknown {} cookie", SESSION_COOKIE);
        }
    }

    Ok((
        jar.remove(removal_cookie()),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// GET /api/auth/google
///
/// OAuth is not wired up; demo login is the only way in.
pub async fn login_google() -> Json<Value> {
    Json(json!({
        "message": "Google sign-in is not configured: use demo login",
        "oauth_url": "/api/auth/google/callback",
    }))
}
