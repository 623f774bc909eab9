//! Redirect and content recommendations for broken URLs.
//!
//! With an LLM configured the advisor asks an OpenAI-compatible
//! chat-completions endpoint. Without one it falls back to a path
//! similarity heuristic so the feature still works offline.

use crate::config::LlmConfig;
use async_trait::async_trait;
use linkrecovery_core::model::{ErrorRecord, Recommendation, Site};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

pub const CREATE_NEW: &str = "CREATE_NEW";
/// Existing pages listed in the redirect prompt.
pub const PROMPT_PAGE_LIMIT: usize = 20;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Empty completion")]
    EmptyCompletion,
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
}

fn parse_openai_response(json: &serde_json::Value, fallback_model: &str) -> LlmResponse {
    LlmResponse {
        content: json["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string(),
        model: json["model"].as_str().unwrap_or(fallback_model).to_string(),
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let message = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message });
    }
    Ok(body)
}

// ── OpenAI-compatible backend ─────────────────────────────────────────────────

pub struct OpenAiCompatibleBackend {
    pub base_url: String,
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.base_url, &config.api_key, &config.model)
    }
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model":       &self.model,
            "messages":    req.messages,
            "max_tokens":  req.max_tokens.unwrap_or(400),
            "temperature": req.temperature.unwrap_or(0.3),
        });
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        let response = parse_openai_response(&json, &self.model);
        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ── Advisor ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectAdvice {
    pub redirect_target: Option<String>,
    pub reason: Option<String>,
}

#[derive(Clone, Default)]
pub struct Advisor {
    backend: Option<Arc<dyn LlmBackend>>,
}

impl Advisor {
    pub fn new(backend: Option<Arc<dyn LlmBackend>>) -> Self {
        Self { backend }
    }

    pub fn heuristic() -> Self {
        Self { backend: None }
    }

    pub fn from_config(config: Option<&LlmConfig>) -> Self {
        match config {
            Some(cfg) => Self::new(Some(Arc::new(OpenAiCompatibleBackend::from_config(cfg)))),
            None => Self::heuristic(),
        }
    }

    pub fn uses_llm(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn redirect(
        &self,
        error_url: &str,
        site_url: &str,
        existing_pages: &[String],
    ) -> RedirectAdvice {
        let Some(backend) = &self.backend else {
            return heuristic_redirect(error_url, existing_pages);
        };

        let request = LlmRequest {
            messages: vec![
                Message::system(
                    "You are an SEO expert specializing in 404 error recovery and redirect strategies.",
                ),
                Message::user(redirect_prompt(error_url, site_url, existing_pages)),
            ],
            max_tokens: None,
            temperature: None,
        };

        match backend.complete(request).await {
            Ok(response) => {
                debug!("Redirect advice from {}", response.model);
                parse_redirect_response(&response.content)
            }
            Err(e) => {
                error!("Failed to generate redirect recommendation: {}", e);
                RedirectAdvice {
                    redirect_target: None,
                    reason: Some(format!("AI recommendation failed: {}", e)),
                }
            }
        }
    }

    pub async fn content(&self, error_url: &str, site_url: &str, backlink_count: u32) -> String {
        let Some(backend) = &self.backend else {
            return heuristic_content(error_url, site_url, backlink_count);
        };

        let request = LlmRequest {
            messages: vec![
                Message::system(
                    "You are an SEO content strategist helping create content to replace 404 pages.",
                ),
                Message::user(content_prompt(error_url, site_url, backlink_count)),
            ],
            max_tokens: None,
            temperature: None,
        };

        match backend.complete(request).await {
            Ok(response) => response.content.trim().to_string(),
            Err(e) => {
                error!("Failed to generate content suggestion: {}", e);
                format!("AI content suggestion failed: {}", e)
            }
        }
    }

    /// Build a fresh recommendation for `error`. Storage is left to the caller.
    pub async fn recommend(
        &self,
        error: &ErrorRecord,
        site: &Site,
        existing_pages: &[String],
    ) -> Recommendation {
        let advice = self.redirect(&error.url, &site.site_url, existing_pages).await;
        let content = self
            .content(&error.url, &site.site_url, error.backlink_count)
            .await;

        let mut recommendation = Recommendation::new(&error.id);
        recommendation.redirect_target = advice.redirect_target;
        recommendation.redirect_reason = advice.reason;
        recommendation.content_suggestion = Some(content);
        recommendation
    }
}

pub fn redirect_prompt(error_url: &str, site_url: &str, existing_pages: &[String]) -> String {
    let pages = if existing_pages.is_empty() {
        "No existing pages provided".to_string()
    } else {
        existing_pages
            .iter()
            .take(PROMPT_PAGE_LIMIT)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are an SEO expert helping with 404 error recovery.

A 404 error was found for this URL:
{error_url}

On site: {site_url}

Existing pages on the site:
{pages}

Task: Recommend the best existing page to redirect this 404 URL to, or suggest creating new content.

Provide your response in this format:
REDIRECT_TARGET: [URL of the best page to redirect to, or '{CREATE_NEW}' if new content should be created]
REASON: [Brief explanation of why this is the best choice]
"
    )
}

pub fn content_prompt(error_url: &str, site_url: &str, backlink_count: u32) -> String {
    format!(
        "You are an SEO content strategist.

A 404 error was found for: {error_url}
On site: {site_url}
This URL has {backlink_count} backlinks pointing to it.

Task: Suggest what type of content should be created for this URL to:
1. Satisfy the intent of the original URL
2. Provide value to visitors arriving via backlinks
3. Improve SEO

Provide a brief, actionable content suggestion (2-3 sentences).
"
    )
}

pub fn parse_redirect_response(text: &str) -> RedirectAdvice {
    let mut advice = RedirectAdvice::default();
    for line in text.trim().lines() {
        let line = line.trim();
        if let Some(target) = line.strip_prefix("REDIRECT_TARGET:") {
            advice.redirect_target = Some(target.trim().to_string());
        } else if let Some(reason) = line.strip_prefix("REASON:") {
            advice.reason = Some(reason.trim().to_string());
        }
    }
    advice
}

fn path_terms(url: &str) -> Vec<String> {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    path.split(|c: char| c == '/' || c == '-' || c == '_' || c == '.')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| t.len() > 1 && !matches!(t.as_str(), "html" | "htm" | "php" | "aspx"))
        .collect()
}

/// Pick the existing page sharing the most path terms with the broken URL.
pub fn heuristic_redirect(error_url: &str, existing_pages: &[String]) -> RedirectAdvice {
    let wanted: HashSet<String> = path_terms(error_url).into_iter().collect();

    let mut best: Option<(&String, usize)> = None;
    for page in existing_pages {
        if page == error_url {
            continue;
        }
        let shared = path_terms(page)
            .into_iter()
            .collect::<HashSet<_>>()
            .intersection(&wanted)
            .count();
        if shared > 0 && best.map(|(_, s)| shared > s).unwrap_or(true) {
            best = Some((page, shared));
        }
    }

    match best {
        Some((page, shared)) => RedirectAdvice {
            redirect_target: Some(page.clone()),
            reason: Some(format!(
                "Shares {} path term{} with the missing page, so visitors land on related content.",
                shared,
                if shared == 1 { "" } else { "s" }
            )),
        },
        None => RedirectAdvice {
            redirect_target: Some(CREATE_NEW.to_string()),
            reason: Some("No existing page covers the topic of the missing URL.".to_string()),
        },
    }
}

pub fn heuristic_content(error_url: &str, site_url: &str, backlink_count: u32) -> String {
    let terms = path_terms(error_url);
    let topic = if terms.is_empty() {
        "the original topic".to_string()
    } else {
        terms.join(" ")
    };

    format!(
        "Publish a page at {} about {} that matches what visitors expected to find. \
         It has {} backlink{} pointing to it, so restoring it keeps that authority on {}.",
        error_url,
        topic,
        backlink_count,
        if backlink_count == 1 { "" } else { "s" },
        site_url
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": content}}],
        })
    }

    #[test]
    fn test_parse_redirect_response() {
        let advice = parse_redirect_response(
            "REDIRECT_TARGET: https://example.com/products\nREASON: Closest category page\n",
        );
        assert_eq!(advice.redirect_target.as_deref(), Some("https://example.com/products"));
        assert_eq!(advice.reason.as_deref(), Some("Closest category page"));

        let empty = parse_redirect_response("I am not sure.");
        assert_eq!(empty, RedirectAdvice::default());
    }

    #[test]
    fn test_redirect_prompt_limits_pages() {
        let pages: Vec<String> = (0..30).map(|i| format!("https://example.com/p{i}")).collect();
        let prompt = redirect_prompt("https://example.com/gone", "https://example.com", &pages);
        assert!(prompt.contains("https://example.com/p19"));
        assert!(!prompt.contains("https://example.com/p20"));

        let prompt = redirect_prompt("https://example.com/gone", "https://example.com", &[]);
        assert!(prompt.contains("No existing pages provided"));
    }

    #[test]
    fn test_heuristic_redirect_prefers_overlap() {
        let pages = vec![
            "https://example.com/about".to_string(),
            "https://example.com/products/blue-widget".to_string(),
            "https://example.com/products".to_string(),
        ];
        let advice = heuristic_redirect("https://example.com/products/old-blue-widget", &pages);
        assert_eq!(
            advice.redirect_target.as_deref(),
            Some("https://example.com/products/blue-widget")
        );
        assert!(advice.reason.unwrap().starts_with("Shares 3 path terms"));
    }

    #[test]
    fn test_heuristic_redirect_create_new() {
        let advice = heuristic_redirect("https://example.com/deleted-blog-post", &[]);
        assert_eq!(advice.redirect_target.as_deref(), Some(CREATE_NEW));
    }

    #[test]
    fn test_heuristic_content() {
        let text = heuristic_content("https://example.com/missing-category", "https://example.com", 3);
        assert!(text.contains("missing category"));
        assert!(text.contains("3 backlinks"));
    }

    #[tokio::test]
    async fn test_llm_recommendation() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "REDIRECT_TARGET: CREATE_NEW\nREASON: Nothing similar exists",
            )))
            .expect(2)
            .mount(&mock_server)
            .await;

        let backend = OpenAiCompatibleBackend::new(mock_server.uri(), "test-key", "gpt-4o-mini");
        let advisor = Advisor::new(Some(Arc::new(backend)));
        assert!(advisor.uses_llm());

        let mut error = ErrorRecord::new("site-1", "https://example.com/gone");
        error.backlink_count = 4;
        let site = Site {
            id: "site-1".into(),
            user_id: "user-1".into(),
            site_url: "https://example.com".into(),
            site_type: "url-prefix".into(),
            permission_level: "owner".into(),
            status: "active".into(),
            last_scan: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let rec = advisor.recommend(&error, &site, &[]).await;
        assert_eq!(rec.error_id, error.id);
        assert_eq!(rec.redirect_target.as_deref(), Some(CREATE_NEW));
        assert_eq!(rec.redirect_reason.as_deref(), Some("Nothing similar exists"));
        assert!(rec.content_suggestion.unwrap().starts_with("REDIRECT_TARGET"));
    }

    #[tokio::test]
    async fn test_llm_failure_is_reported_in_fields() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": {"message": "bad key"}})),
            )
            .mount(&mock_server)
            .await;

        let advisor = Advisor::new(Some(Arc::new(OpenAiCompatibleBackend::new(
            mock_server.uri(),
            "wrong",
            "gpt-4o-mini",
        ))));

        let advice = advisor
            .redirect("https://example.com/gone", "https://example.com", &[])
            .await;
        assert!(advice.redirect_target.is_none());
        assert_eq!(
            advice.reason.as_deref(),
            Some("AI recommendation failed: API error [401]: bad key")
        );

        let content = advisor
            .content("https://example.com/gone", "https://example.com", 0)
            .await;
        assert_eq!(content, "AI content suggestion failed: API error [401]: bad key");
    }
}
