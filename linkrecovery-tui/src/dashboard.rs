//! Dashboard view-model: stats, sites, the newest broken URLs and the
//! add-site dialog.

use crate::client::{self, ApiClient};
use crate::detail::ErrorDetailView;
use linkrecovery_core::model::{
    CreateSiteResponse, DashboardStats, ErrorDetail, ErrorListQuery, ErrorRecord, ErrorStatus,
    RecommendationResponse, ScanResponse, Site, UpdateStatusResponse,
};
use tracing::{error, info};

/// Rows shown in the recent errors table.
pub const RECENT_ERROR_LIMIT: usize = 10;

/// Everything one dashboard load fetches.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub sites: Vec<Site>,
    pub errors: Vec<ErrorRecord>,
}

/// Fetch stats, sites and new errors together.
pub async fn fetch_dashboard(client: &ApiClient) -> client::Result<DashboardData> {
    let new_errors = ErrorListQuery {
        site_id: None,
        status: Some(ErrorStatus::New.as_str().to_string()),
    };

    let (stats, sites, errors) = futures::try_join!(
        client.dashboard_stats(),
        client.list_sites(),
        client.list_errors(&new_errors),
    )?;

    Ok(DashboardData {
        stats,
        sites: sites.sites,
        errors: errors.errors,
    })
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    client: ApiClient,
    pub stats: Option<DashboardStats>,
    pub sites: Vec<Site>,
    pub errors: Vec<ErrorRecord>,
    pub loading: bool,
    pub scanning: bool,
    pub adding_site: bool,
    pub add_site_open: bool,
    pub new_site_url: String,
    pub last_scan: Option<ScanResponse>,
    pub detail: Option<ErrorDetailView>,
}

impl DashboardView {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            stats: None,
            sites: Vec::new(),
            errors: Vec::new(),
            loading: true,
            scanning: false,
            adding_site: false,
            add_site_open: false,
            new_site_url: String::new(),
            last_scan: None,
            detail: None,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Nothing is applied unless all three requests succeed.
    pub async fn load(&mut self) {
        let fetched = fetch_dashboard(&self.client).await;
        self.apply_load(fetched);
    }

    pub fn apply_load(&mut self, fetched: client::Result<DashboardData>) {
        match fetched {
            Ok(data) => {
                self.stats = Some(data.stats);
                self.sites = data.sites;
                self.errors = data.errors;
            }
            Err(e) => error!("Failed to load data: {}", e),
        }
        self.loading = false;
    }

    pub fn recent_errors(&self) -> &[ErrorRecord] {
        let end = self.errors.len().min(RECENT_ERROR_LIMIT);
        &self.errors[..end]
    }

    pub fn open_add_site(&mut self) {
        self.add_site_open = true;
    }

    pub fn cancel_add_site(&mut self) {
        self.add_site_open = false;
    }

    /// The dialog input to submit, as typed. `None` for an empty input or
    /// while a previous submission is out.
    pub fn begin_add_site(&mut self) -> Option<String> {
        if self.new_site_url.is_empty() || self.adding_site {
            return None;
        }
        self.adding_site = true;
        Some(self.new_site_url.clone())
    }

    pub async fn add_site(&mut self) {
        let Some(site_url) = self.begin_add_site() else {
            return;
        };
        let result = self.client.create_site(&site_url).await;
        if self.apply_site_added(result) {
            self.load().await;
        }
    }

    /// Returns true when the dashboard should reload.
    pub fn apply_site_added(&mut self, result: client::Result<CreateSiteResponse>) -> bool {
        self.adding_site = false;
        match result {
            Ok(resp) => {
                info!("{}: {}", resp.message, resp.site.site_url);
                self.new_site_url.clear();
                self.add_site_open = false;
                true
            }
            Err(e) => {
                error!("Failed to add site: {}", e);
                false
            }
        }
    }

    pub fn begin_scan(&mut self) -> bool {
        if self.scanning {
            return false;
        }
        self.scanning = true;
        true
    }

    pub async fn scan(&mut self, site_id: &str) {
        self.scanning = true;
        let result = self.client.scan_site(site_id).await;
        if self.apply_scan(result) {
            self.load().await;
        }
    }

    /// Returns true when the dashboard should reload.
    pub fn apply_scan(&mut self, result: client::Result<ScanResponse>) -> bool {
        self.scanning = false;
        match result {
            Ok(resp) => {
                info!("{} ({} new)", resp.message, resp.errors_found);
                self.last_scan = Some(resp);
                true
            }
            Err(e) => {
                error!("Scan failed: {}", e);
                false
            }
        }
    }

    /// Show the detail panel in its loading state.
    pub fn show_error(&mut self, record: ErrorRecord) {
        self.detail = Some(ErrorDetailView::new(self.client.clone(), record));
    }

    pub async fn open_error(&mut self, record: ErrorRecord) {
        self.show_error(record);
        if let Some(detail) = self.detail.as_mut() {
            detail.load().await;
        }
    }

    pub fn close_error(&mut self) {
        self.detail = None;
    }

    /// The open detail view, if it is still showing `error_id`. Results for
    /// a panel that was closed or replaced are dropped.
    fn detail_for(&mut self, error_id: &str) -> Option<&mut ErrorDetailView> {
        self.detail.as_mut().filter(|d| d.error.id == error_id)
    }

    pub fn apply_details(&mut self, error_id: &str, result: client::Result<ErrorDetail>) {
        if let Some(detail) = self.detail_for(error_id) {
            detail.apply_details(result);
        }
    }

    pub fn apply_recommendation(
        &mut self,
        error_id: &str,
        result: client::Result<RecommendationResponse>,
    ) {
        if let Some(detail) = self.detail_for(error_id) {
            detail.apply_recommendation(result);
        }
    }

    /// Closes the detail view once the backend accepts the status. Returns
    /// true when the dashboard should reload.
    pub fn apply_status_update(
        &mut self,
        error_id: &str,
        status: ErrorStatus,
        result: client::Result<UpdateStatusResponse>,
    ) -> bool {
        let accepted = match self.detail_for(error_id) {
            Some(detail) => detail.apply_status(status, result),
            None => result.is_ok(),
        };
        if accepted {
            self.close_error();
        }
        accepted
    }

    async fn set_open_error_status(&mut self, status: ErrorStatus) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let error_id = detail.error.id.clone();
        detail.updating = true;
        let result = detail.client().update_status(&error_id, status).await;
        if self.apply_status_update(&error_id, status, result) {
            self.load().await;
        }
    }

    pub async fn mark_fixed(&mut self) {
        self.set_open_error_status(ErrorStatus::Fixed).await;
    }

    pub async fn mark_ignored(&mut self) {
        self.set_open_error_status(ErrorStatus::Ignored).await;
    }

    pub async fn generate_recommendation(&mut self) {
        if let Some(detail) = self.detail.as_mut() {
            detail.generate_recommendation().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize) -> ErrorRecord {
        ErrorRecord::new("site", &format!("https://example.com/{}", n))
    }

    #[test]
    fn test_recent_errors_capped() {
        let mut view = DashboardView::new(ApiClient::new("http://localhost:8001").unwrap());
        view.errors = (0..15).map(record).collect();
        assert_eq!(view.recent_errors().len(), RECENT_ERROR_LIMIT);

        view.errors.truncate(3);
        assert_eq!(view.recent_errors().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_input_is_not_submitted() {
        // Unroutable backend: any request would fail and be logged, not panic.
        let mut view = DashboardView::new(ApiClient::new("http://127.0.0.1:1").unwrap());
        view.open_add_site();
        view.add_site().await;
        assert!(view.add_site_open);
        assert!(view.loading);
    }
}
