//! View-model for a single broken URL: metrics, backlinks and the
//! redirect/content recommendation.

use crate::client::{self, ApiClient};
use linkrecovery_core::model::{
    ErrorDetail, ErrorRecord, ErrorStatus, Recommendation, RecommendationResponse,
    UpdateStatusResponse,
};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Recommendations,
    Backlinks,
}

impl DetailTab {
    pub fn toggle(self) -> Self {
        match self {
            DetailTab::Recommendations => DetailTab::Backlinks,
            DetailTab::Backlinks => DetailTab::Recommendations,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorDetailView {
    client: ApiClient,
    /// The list row the view was opened from.
    pub error: ErrorRecord,
    pub details: Option<ErrorDetail>,
    pub generating: bool,
    pub updating: bool,
    pub tab: DetailTab,
}

impl ErrorDetailView {
    pub fn new(client: ApiClient, error: ErrorRecord) -> Self {
        Self {
            client,
            error,
            details: None,
            generating: false,
            updating: false,
            tab: DetailTab::Recommendations,
        }
    }

    /// Until details arrive the panel shows its loading indicator. A failed
    /// load leaves it there.
    pub fn is_loading(&self) -> bool {
        self.details.is_none()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn load(&mut self) {
        let result = self.client.get_error(&self.error.id).await;
        self.apply_details(result);
    }

    pub fn apply_details(&mut self, result: client::Result<ErrorDetail>) {
        match result {
            Ok(details) => self.details = Some(details),
            Err(e) => error!("Failed to load error details: {}", e),
        }
    }

    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.details.as_ref().and_then(|d| d.recommendation.as_ref())
    }

    /// Returns false while a previous request is still out.
    pub fn begin_generate(&mut self) -> bool {
        if self.generating {
            return false;
        }
        self.generating = true;
        true
    }

    /// Every call asks the backend for a fresh recommendation.
    pub async fn generate_recommendation(&mut self) {
        self.generating = true;
        let result = self.client.generate_recommendation(&self.error.id).await;
        self.apply_recommendation(result);
    }

    pub fn apply_recommendation(&mut self, result: client::Result<RecommendationResponse>) {
        match result {
            Ok(resp) => match self.details.as_mut() {
                Some(details) => details.recommendation = Some(resp.recommendation),
                None => error!("Recommendation arrived before error details; dropped"),
            },
            Err(e) => error!("Failed to generate recommendations: {}", e),
        }
        self.generating = false;
    }

    pub fn begin_update(&mut self) -> bool {
        if self.updating {
            return false;
        }
        self.updating = true;
        true
    }

    /// Returns true once the backend accepted the new status.
    pub async fn update_status(&mut self, status: ErrorStatus) -> bool {
        self.updating = true;
        let result = self.client.update_status(&self.error.id, status).await;
        self.apply_status(status, result)
    }

    pub fn apply_status(
        &mut self,
        status: ErrorStatus,
        result: client::Result<UpdateStatusResponse>,
    ) -> bool {
        self.updating = false;
        match result {
            Ok(_) => {
                self.error.status = status;
                if let Some(details) = self.details.as_mut() {
                    details.error.status = status;
                }
                true
            }
            Err(e) => {
                error!("Failed to update status: {}", e);
                false
            }
        }
    }

    pub async fn mark_fixed(&mut self) -> bool {
        self.update_status(ErrorStatus::Fixed).await
    }

    pub async fn mark_ignored(&mut self) -> bool {
        self.update_status(ErrorStatus::Ignored).await
    }
}
