//! Axum router: maps every `/api` path to its handler.

use crate::config::ServerConfig;
use crate::handlers::{
    auth::{auth_status, demo_login, login_google, logout},
    dashboard::{api_root, dashboard_stats},
    errors::{generate_recommendations, get_error, list_errors, update_error_status},
    sites::{create_site, list_sites, scan_site},
};
use crate::state::SharedState;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Credentialed CORS. `*` mirrors the caller's origin since browsers reject
/// a literal wildcard together with cookies.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::very_permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origin_list()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build and return the full Axum router.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/api", get(api_root))
        .route("/api/", get(api_root))

        // Session
        .route("/api/auth/status",     get(auth_status))
        .route("/api/auth/google",     get(login_google))
        .route("/api/auth/demo-login", post(demo_login))
        .route("/api/auth/logout",     post(logout))

        // Sites
        .route("/api/sites",                 get(list_sites).post(create_site))
        .route("/api/sites/{site_id}/scan",  post(scan_site))

        // Broken URLs
        .route("/api/errors",            get(list_errors))
        .route("/api/errors/{error_id}", get(get_error).patch(update_error_status))
        .route(
            "/api/errors/{error_id}/generate-recommendations",
            post(generate_recommendations),
        )

        .route("/api/dashboard/stats", get(dashboard_stats))

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
