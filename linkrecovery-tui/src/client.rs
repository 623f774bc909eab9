//! Typed client for the Link Recovery REST API.
//!
//! Every call is a single request: no retry, no timeout, no de-duplication.
//! The session cookie set by demo login lives in the client's cookie store and
//! is shared by every clone.

use linkrecovery_core::model::{
    ApiErrorBody, AuthStatus, CreateSiteRequest, CreateSiteResponse, DashboardStats, ErrorDetail,
    ErrorListQuery, ErrorStatus, ErrorsResponse, MessageResponse, RecommendationResponse,
    ScanResponse, SitesResponse, UpdateStatusRequest, UpdateStatusResponse,
};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("{status}: {detail}")]
    Status { status: StatusCode, detail: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_base: String,
}

impl ApiClient {
    /// `base_url` is the backend root; requests go to `<base_url>/api/...`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        let parsed =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                base_url
            )));
        }

        let http = Client::builder().cookie_store(true).build()?;

        Ok(Self {
            http,
            api_base: format!("{}/api", base_url),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.detail)
            .unwrap_or(body);
        debug!("API error {}: {}", status, detail);
        Err(ClientError::Status { status, detail })
    }

    // GET /auth/status
    pub async fn auth_status(&self) -> Result<AuthStatus> {
        let response = self.http.get(self.endpoint("/auth/status")).send().await?;
        Self::parse(response).await
    }

    // POST /auth/demo-login
    pub async fn demo_login(&self) -> Result<MessageResponse> {
        let response = self
            .http
            .post(self.endpoint("/auth/demo-login"))
            .send()
            .await?;
        Self::parse(response).await
    }

    // POST /auth/logout
    pub async fn logout(&self) -> Result<MessageResponse> {
        let response = self.http.post(self.endpoint("/auth/logout")).send().await?;
        Self::parse(response).await
    }

    pub async fn list_sites(&self) -> Result<SitesResponse> {
        let response = self.http.get(self.endpoint("/sites")).send().await?;
        Self::parse(response).await
    }

    /// The URL is sent exactly as given.
    pub async fn create_site(&self, site_url: &str) -> Result<CreateSiteResponse> {
        let body = CreateSiteRequest {
            site_url: site_url.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint("/sites"))
            .json(&body)
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Waits for the whole scan to finish.
    pub async fn scan_site(&self, site_id: &str) -> Result<ScanResponse> {
        let response = self
            .http
            .post(self.endpoint(&format!("/sites/{}/scan", site_id)))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn list_errors(&self, query: &ErrorListQuery) -> Result<ErrorsResponse> {
        let response = self
            .http
            .get(self.endpoint("/errors"))
            .query(query)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_error(&self, error_id: &str) -> Result<ErrorDetail> {
        let response = self
            .http
            .get(self.endpoint(&format!("/errors/{}", error_id)))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn generate_recommendation(&self, error_id: &str) -> Result<RecommendationResponse> {
        let response = self
            .http
            .post(self.endpoint(&format!("/errors/{}/generate-recommendations", error_id)))
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn update_status(
        &self,
        error_id: &str,
        status: ErrorStatus,
    ) -> Result<UpdateStatusResponse> {
        let body = UpdateStatusRequest {
            status: status.as_str().to_string(),
        };
        let response = self
            .http
            .patch(self.endpoint(&format!("/errors/{}", error_id)))
            .json(&body)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let response = self
            .http
            .get(self.endpoint("/dashboard/stats"))
            .send()
            .await?;
        Self::parse(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_prefix() {
        let client = ApiClient::new("http://localhost:8001/").unwrap();
        assert_eq!(client.api_base(), "http://localhost:8001/api");
        assert_eq!(client.endpoint("/sites"), "http://localhost:8001/api/sites");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("ftp://example.com"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_status_error_display() {
        let err = ClientError::Status {
            status: StatusCode::NOT_FOUND,
            detail: "Site not found".to_string(),
        };
        assert_eq!(err.to_string(), "404 Not Found: Site not found");
    }
}
