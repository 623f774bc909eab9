use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Triage state of a broken URL.
///
/// Any state can be set to any other; the server only rejects values outside
/// this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatus {
    New,
    Fixed,
    Ignored,
}

impl ErrorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::New => "new",
            ErrorStatus::Fixed => "fixed",
            ErrorStatus::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid status '{0}' (expected new, fixed or ignored)")]
pub struct ParseStatusError(pub String);

impl FromStr for ErrorStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(ErrorStatus::New),
            "fixed" => Ok(ErrorStatus::Fixed),
            "ignored" => Ok(ErrorStatus::Ignored),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display bucket for a priority score. Only used for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Normal,
}

impl Priority {
    pub const HIGH_THRESHOLD: u32 = 70;

    pub fn of(score: u32) -> Self {
        if score > Self::HIGH_THRESHOLD {
            Priority::High
        } else {
            Priority::Normal
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Normal => "NORMAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub site_url: String,
    #[serde(default = "default_site_type")]
    pub site_type: String,
    #[serde(default = "default_permission")]
    pub permission_level: String,
    #[serde(default = "default_site_status")]
    pub status: String,
    pub last_scan: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_site_type() -> String {
    "url-prefix".to_string()
}

fn default_permission() -> String {
    "owner".to_string()
}

fn default_site_status() -> String {
    "active".to_string()
}

impl Site {
    /// `url-prefix` properties start with a scheme, anything else is a domain property.
    pub fn site_type_for(site_url: &str) -> &'static str {
        if site_url.starts_with("http") {
            "url-prefix"
        } else {
            "domain"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    #[serde(default)]
    pub site_id: String,
    pub url: String,
    #[serde(default)]
    pub backlink_count: u32,
    #[serde(default)]
    pub impressions: u32,
    #[serde(default)]
    pub clicks: u32,
    #[serde(default)]
    pub priority_score: u32,
    pub status: ErrorStatus,
    #[serde(default = "Utc::now")]
    pub detected_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_checked: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(site_id: &str, url: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            site_id: site_id.to_string(),
            url: url.to_string(),
            backlink_count: 0,
            impressions: 0,
            clicks: 0,
            priority_score: 0,
            status: ErrorStatus::New,
            detected_at: now,
            last_checked: now,
        }
    }

    pub fn priority(&self) -> Priority {
        Priority::of(self.priority_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backlink {
    pub id: String,
    #[serde(default)]
    pub error_id: String,
    pub source_url: String,
    pub anchor_text: Option<String>,
    #[serde(default = "Utc::now")]
    pub discovered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub error_id: String,
    pub redirect_target: Option<String>,
    pub redirect_reason: Option<String>,
    pub content_suggestion: Option<String>,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

impl Recommendation {
    pub fn new(error_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            error_id: error_id.to_string(),
            redirect_target: None,
            redirect_reason: None,
            content_suggestion: None,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Manual,
    Scheduled,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Manual => "manual",
            ScanType::Scheduled => "scheduled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanLog {
    pub id: String,
    pub site_id: String,
    pub scan_type: ScanType,
    pub status: ScanStatus,
    pub errors_found: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub sites_count: u64,
    pub total_errors: u64,
    pub new_errors: u64,
    pub fixed_errors: u64,
    pub backlinks_affected: u64,
    #[serde(default)]
    pub recent_scans: Vec<ScanLog>,
}

// Wire envelopes shared by the server and the client.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSiteRequest {
    pub site_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSiteResponse {
    pub message: String,
    pub site: Site,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitesResponse {
    pub sites: Vec<Site>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub message: String,
    pub errors_found: u32,
    #[serde(default)]
    pub urls_inspected: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorsResponse {
    pub errors: Vec<ErrorRecord>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub error: ErrorRecord,
    #[serde(default)]
    pub site: Option<Site>,
    #[serde(default)]
    pub backlinks: Vec<Backlink>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    pub message: String,
    pub status: ErrorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<SessionUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_values_only() {
        assert_eq!("fixed".parse::<ErrorStatus>(), Ok(ErrorStatus::Fixed));
        assert_eq!(" Ignored ".parse::<ErrorStatus>(), Ok(ErrorStatus::Ignored));
        assert!("resolved".parse::<ErrorStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ErrorStatus::New).unwrap();
        assert_eq!(json, "\"new\"");
    }

    #[test]
    fn priority_threshold_is_exclusive() {
        assert_eq!(Priority::of(70), Priority::Normal);
        assert_eq!(Priority::of(71), Priority::High);
    }

    #[test]
    fn site_type_depends_on_scheme() {
        assert_eq!(Site::site_type_for("https://example.com"), "url-prefix");
        assert_eq!(Site::site_type_for("sc-domain:example.com"), "domain");
    }

    #[test]
    fn error_record_accepts_minimal_payload() {
        let json = r#"{"id":"e1","url":"https://a.test/x","status":"new","priority_score":75}"#;
        let record: ErrorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.priority(), Priority::High);
        assert_eq!(record.backlink_count, 0);
    }
}
