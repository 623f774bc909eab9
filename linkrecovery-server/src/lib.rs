pub mod advisor;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod scan;
pub mod state;

pub use config::{CrawlSettings, LlmConfig, ServerConfig};
pub use error::ApiError;
pub use state::{AppState, SharedState};

use anyhow::Context;
use linkrecovery_core::data::Database;
use tracing::info;

/// Open the database and serve the API until Ctrl-C.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    if let Some(parent) = config.database_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let db = Database::new(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path.display()))?;
    info!("Using database {}", config.database_path.display());

    let bind = config.bind;
    let state = AppState::new(db, config).shared();
    if state.advisor.uses_llm() {
        info!("Recommendations: LLM backend");
    } else {
        info!("Recommendations: built-in heuristic (no LLM key configured)");
    }

    let app = router::build_router(state);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {}", bind))?;
    info!("Server listening on http://{}/api/", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
