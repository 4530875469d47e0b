use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sysconsole_core::{DeptId, MenuId, RoleId};

use super::{PageQuery, PageResult};
use crate::gateway::{RequestError, RequestGateway, RequestOptions};

/// Row-level data visibility granted by a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataScope {
    All,
    DeptSame,
    DeptRecursive,
    #[serde(rename = "SELF")]
    OwnOnly,
    DeptCustom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRef {
    pub id: MenuId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RoleId>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data_scope: DataScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dept_ids: Option<Vec<DeptId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_ids: Option<Vec<MenuId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menus: Option<Vec<MenuRef>>,
}

#[derive(Debug, Clone)]
pub struct RoleApi {
    gateway: Arc<RequestGateway>,
}

impl RoleApi {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    pub async fn page(&self, query: &PageQuery) -> Result<PageResult<Role>, RequestError> {
        self.gateway
            .request("/api/sys/role", RequestOptions::get().query(query))
            .await
    }

    pub async fn all(&self) -> Result<Vec<Role>, RequestError> {
        self.gateway
            .request("/api/sys/role/all", RequestOptions::get())
            .await
    }

    pub async fn get(&self, id: RoleId) -> Result<Role, RequestError> {
        self.gateway
            .request(&format!("/api/sys/role/{id}"), RequestOptions::get())
            .await
    }

    pub async fn save(&self, role: &Role) -> Result<RoleId, RequestError> {
        let options = if role.id.is_some() {
            RequestOptions::put()
        } else {
            RequestOptions::post()
        };
        self.gateway
            .request("/api/sys/role", options.json(role))
            .await
    }

    pub async fn delete(&self, id: RoleId) -> Result<(), RequestError> {
        self.gateway
            .request(&format!("/api/sys/role/{id}"), RequestOptions::delete())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_scope_wire_names() {
        assert_eq!(serde_json::to_string(&DataScope::DeptRecursive).unwrap(), "\"DEPT_RECURSIVE\"");
        assert_eq!(serde_json::to_string(&DataScope::OwnOnly).unwrap(), "\"SELF\"");
        let scope: DataScope = serde_json::from_str("\"DEPT_CUSTOM\"").unwrap();
        assert_eq!(scope, DataScope::DeptCustom);
    }

    #[test]
    fn role_reads_camel_case() {
        let role: Role = serde_json::from_str(
            r#"{"id":3,"code":"ops","name":"Ops","description":"","dataScope":"ALL","menuIds":[1,2]}"#,
        )
        .unwrap();
        assert_eq!(role.id, Some(RoleId::new(3)));
        assert_eq!(role.menu_ids, Some(vec![MenuId::new(1), MenuId::new(2)]));
    }
}
