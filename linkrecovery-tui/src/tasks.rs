//! Backend requests run as tokio tasks. Each one reports back to the render
//! loop with a single message.

use crate::client::{self, ApiClient};
use crate::dashboard::{DashboardData, fetch_dashboard};
use linkrecovery_core::model::{
    CreateSiteResponse, ErrorDetail, ErrorStatus, MessageResponse, RecommendationResponse,
    ScanResponse, UpdateStatusResponse,
};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum DashboardMessage {
    Loaded(client::Result<DashboardData>),
    SiteAdded(client::Result<CreateSiteResponse>),
    Scanned(client::Result<ScanResponse>),
    DetailLoaded {
        error_id: String,
        result: client::Result<ErrorDetail>,
    },
    RecommendationGenerated {
        error_id: String,
        result: client::Result<RecommendationResponse>,
    },
    StatusUpdated {
        error_id: String,
        status: ErrorStatus,
        result: client::Result<UpdateStatusResponse>,
    },
    LoggedOut(client::Result<MessageResponse>),
}

/// A request ready to be sent, owning everything it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Load,
    AddSite(String),
    Scan(String),
    ErrorDetail(String),
    GenerateRecommendation(String),
    UpdateStatus(String, ErrorStatus),
    Logout,
}

async fn execute(client: &ApiClient, request: Request) -> DashboardMessage {
    match request {
        Request::Load => DashboardMessage::Loaded(fetch_dashboard(client).await),
        Request::AddSite(site_url) => {
            DashboardMessage::SiteAdded(client.create_site(&site_url).await)
        }
        Request::Scan(site_id) => DashboardMessage::Scanned(client.scan_site(&site_id).await),
        Request::ErrorDetail(error_id) => {
            let result = client.get_error(&error_id).await;
            DashboardMessage::DetailLoaded { error_id, result }
        }
        Request::GenerateRecommendation(error_id) => {
            let result = client.generate_recommendation(&error_id).await;
            DashboardMessage::RecommendationGenerated { error_id, result }
        }
        Request::UpdateStatus(error_id, status) => {
            let result = client.update_status(&error_id, status).await;
            DashboardMessage::StatusUpdated {
                error_id,
                status,
                result,
            }
        }
        Request::Logout => DashboardMessage::LoggedOut(client.logout().await),
    }
}

/// Run `request` on its own task. Must be called inside a tokio runtime.
pub fn spawn_request(
    client: ApiClient,
    request: Request,
    tx: mpsc::UnboundedSender<DashboardMessage>,
) {
    tokio::spawn(async move {
        let message = execute(&client, request).await;
        // The receiver is gone once the dashboard has quit.
        let _ = tx.send(message);
    });
}
