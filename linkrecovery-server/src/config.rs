//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:8001";
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 30;
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    pub max_depth: usize,
    pub max_pages: usize,
    pub workers: usize,
    pub timeout_secs: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 200,
            workers: 4,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database_path: PathBuf,
    pub session_ttl_minutes: i64,
    /// Comma separated list, or `*` to mirror any origin.
    pub cors_origins: String,
    /// No backend means recommendations come from the built-in heuristic.
    pub llm: Option<LlmConfig>,
    /// Directory holding `<host>.csv` Search Console exports.
    pub traffic_dir: Option<PathBuf>,
    pub crawl: CrawlSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8001)),
            database_path: PathBuf::from("linkrecovery.db"),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            cors_origins: "*".to_string(),
            llm: None,
            traffic_dir: None,
            crawl: CrawlSettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes.max(1))
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origin_list().iter().any(|o| o == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.session_ttl(), chrono::Duration::minutes(30));
        assert!(config.allows_any_origin());
        assert_eq!(config.crawl.max_depth, 3);
        assert!(config.llm.is_none());
        assert_eq!(LlmConfig::new("k").model, "gpt-4o-mini");
    }

    #[test]
    fn test_cors_origin_list() {
        let config = ServerConfig {
            cors_origins: "http://localhost:3000, https://app.example.com,".to_string(),
            ..ServerConfig::default()
        };
        assert_eq!(
            config.cors_origin_list(),
            vec!["http://localhost:3000", "https://app.example.com"]
        );
        assert!(!config.allows_any_origin());
    }
}
