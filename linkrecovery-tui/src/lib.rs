pub mod client;
pub mod dashboard;
pub mod detail;
pub mod session;
pub mod tasks;
pub mod ui;

pub use client::{ApiClient, ClientError};
pub use dashboard::DashboardView;
pub use detail::ErrorDetailView;
pub use session::AuthSession;

/// Bootstrap a demo session against `base_url` and run the dashboard.
pub async fn run_dashboard(base_url: &str) -> anyhow::Result<()> {
    let client = ApiClient::new(base_url)?;
    let session = AuthSession::bootstrap(client).await;
    ui::run(session).await
}
