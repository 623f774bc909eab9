//! Demo session bootstrap.
//!
//! The dashboard assumes it is authenticated from the start; the demo login
//! issued at startup only has to refresh the cookie.

use crate::client::{self, ApiClient};
use linkrecovery_core::model::{MessageResponse, SessionUser};
use tracing::{error, info, warn};

pub const LOGIN_FAILED: &str = "Login failed. Please try again.";

#[derive(Debug, Clone)]
pub struct AuthSession {
    client: ApiClient,
    pub user: Option<SessionUser>,
    pub authenticated: bool,
    pub error: Option<String>,
}

impl AuthSession {
    /// A session that has not talked to the backend yet.
    pub fn assumed(client: ApiClient) -> Self {
        Self {
            client,
            user: None,
            authenticated: true,
            error: None,
        }
    }

    /// Log in as the demo user. Failure is logged, never fatal.
    pub async fn bootstrap(client: ApiClient) -> Self {
        let mut session = Self::assumed(client);

        match session.client.demo_login().await {
            Ok(resp) => {
                info!("{}", resp.message);
                session.refresh_user().await;
            }
            Err(e) => warn!("Auto-login: {}", e),
        }

        session
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    async fn refresh_user(&mut self) {
        match self.client.auth_status().await {
            Ok(status) => self.user = status.user,
            Err(e) => warn!("Failed to load session status: {}", e),
        }
    }

    /// Explicit login. The only failure shown to the user is a generic message.
    pub async fn login(&mut self) -> bool {
        self.error = None;
        match self.client.demo_login().await {
            Ok(_) => {
                self.authenticated = true;
                self.refresh_user().await;
                true
            }
            Err(e) => {
                error!("Login failed: {}", e);
                self.error = Some(LOGIN_FAILED.to_string());
                false
            }
        }
    }

    pub async fn logout(&mut self) {
        let result = self.client.logout().await;
        self.apply_logout(result);
    }

    /// The local session ends even when the backend call failed.
    pub fn apply_logout(&mut self, result: client::Result<MessageResponse>) {
        if let Err(e) = result {
            error!("Logout failed: {}", e);
        }
        self.authenticated = false;
        self.user = None;
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.email.as_str())
    }
}
