use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sysconsole_core::{DeptId, RoleId, UserId};

use super::{NamedRef, PageQuery, PageResult};
use crate::gateway::{RequestError, RequestGateway, RequestOptions};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub dept: Option<NamedRef<DeptId>>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub roles: Option<Vec<NamedRef<RoleId>>>,
}

/// Record returned by the self-user endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub superuser: Option<bool>,
}

/// Create/update payload. `id` present means update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dept_id: Option<DeptId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_ids: Option<Vec<RoleId>>,
}

#[derive(Debug, Clone)]
pub struct UserApi {
    gateway: Arc<RequestGateway>,
}

impl UserApi {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    pub async fn page(&self, query: &PageQuery) -> Result<PageResult<User>, RequestError> {
        self.gateway
            .request("/api/sys/user", RequestOptions::get().query(query))
            .await
    }

    /// `PUT` when the form carries an id, `POST` otherwise. Returns the user id.
    pub async fn save(&self, form: &UserForm) -> Result<UserId, RequestError> {
        let options = if form.id.is_some() {
            RequestOptions::put()
        } else {
            RequestOptions::post()
        };
        self.gateway
            .request("/api/sys/user", options.json(form))
            .await
    }

    pub async fn delete(&self, id: UserId) -> Result<(), RequestError> {
        self.gateway
            .request(&format!("/api/sys/user/{id}"), RequestOptions::delete())
            .await
    }

    /// `GET /api/sys/user/self`
    pub async fn self_user(&self) -> Result<SelfUser, RequestError> {
        self.gateway
            .request("/api/sys/user/self", RequestOptions::get())
            .await
    }
}
