//! Shared application state for the web server.

use crate::advisor::Advisor;
use crate::config::ServerConfig;
use linkrecovery_core::data::Database;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared state injected into every Axum handler.
pub struct AppState {
    /// The lock is never held across a crawl or an LLM call.
    pub db: Mutex<Database>,
    pub config: ServerConfig,
    pub advisor: Advisor,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let advisor = Advisor::from_config(config.llm.as_ref());
        Self::with_advisor(db, config, advisor)
    }

    pub fn with_advisor(db: Database, config: ServerConfig, advisor: Advisor) -> Self {
        Self {
            db: Mutex::new(db),
            config,
            advisor,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}

pub type SharedState = Arc<AppState>;
