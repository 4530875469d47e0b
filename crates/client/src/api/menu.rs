use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sysconsole_core::MenuId;

use super::{IdBody, NamedRef};
use crate::gateway::{RequestError, RequestGateway, RequestOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MenuType {
    Dir,
    Menu,
    Button,
}

/// Menu node. `permission` is the code guarding the entry, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MenuId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MenuId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NamedRef<MenuId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MenuType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Menu>,
}

impl Menu {
    /// Every permission code in this subtree, pre-order.
    pub fn permission_codes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_codes(&mut out);
        out
    }

    fn collect_codes<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(code) = self.permission.as_deref().filter(|c| !c.is_empty()) {
            out.push(code);
        }
        for child in &self.children {
            child.collect_codes(out);
        }
    }
}

#[derive(Debug, Clone)]
pub struct MenuApi {
    gateway: Arc<RequestGateway>,
}

impl MenuApi {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    pub async fn tree(&self) -> Result<Vec<Menu>, RequestError> {
        self.gateway
            .request("/api/sys/menu/tree", RequestOptions::get())
            .await
    }

    pub async fn save(&self, menu: &Menu) -> Result<MenuId, RequestError> {
        let path = if menu.id.is_some() {
            "/api/sys/menu/update"
        } else {
            "/api/sys/menu/create"
        };
        self.gateway
            .request(path, RequestOptions::post().json(menu))
            .await
    }

    pub async fn delete(&self, id: MenuId) -> Result<(), RequestError> {
        self.gateway
            .request(
                "/api/sys/menu/delete",
                RequestOptions::post().json(&IdBody { id }),
            )
            .await
    }
}
