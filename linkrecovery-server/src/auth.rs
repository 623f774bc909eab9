//! Cookie sessions.

use crate::error::ApiError;
use crate::state::SharedState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;

pub const SESSION_COOKIE: &str = "access_token";

/// The user behind the request's session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: String,
}

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(ApiError::NotAuthenticated)?;

        let db = state.db.lock().await;
        match db.session_user(&token)? {
            Some(user_id) => Ok(CurrentUser { user_id }),
            None => {
                debug!("Rejected unknown or expired session token");
                Err(ApiError::InvalidToken)
            }
        }
    }
}

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// `access_token=<token>; HttpOnly; SameSite=Lax; Path=/; Max-Age=<ttl>`
pub fn session_cookie(token: &str, ttl: chrono::Duration) -> Result<Cookie<'static>, ApiError> {
    Cookie::parse(format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    ))
    .map_err(|e| ApiError::Internal(format!("session cookie: {}", e)))
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::SameSite;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc123", chrono::Duration::minutes(30)).unwrap();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age().map(|d| d.whole_seconds()), Some(1800));
    }

    #[test]
    fn test_session_token_from_jar() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "tok"));
        assert_eq!(session_token(&jar).as_deref(), Some("tok"));
        assert_eq!(session_token(&CookieJar::new()), None);
    }
}
