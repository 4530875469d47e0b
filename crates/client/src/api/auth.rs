use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sysconsole_auth::UserInfo;

use crate::gateway::{RequestError, RequestGateway, RequestOptions};

/// Response of the auth-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub user: Option<UserInfo>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct AuthApi {
    gateway: Arc<RequestGateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    /// `GET /api/auth/info`
    pub async fn info(&self) -> Result<AuthInfo, RequestError> {
        self.gateway
            .request("/api/auth/info", RequestOptions::get())
            .await
    }
}
