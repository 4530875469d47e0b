use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sysconsole_core::DeptId;

use super::{IdBody, NamedRef};
use crate::gateway::{RequestError, RequestGateway, RequestOptions};

/// Department node; `children` makes the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dept {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DeptId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<DeptId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NamedRef<DeptId>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Dept>,
}

impl Dept {
    /// Depth-first search by id.
    pub fn find(&self, id: DeptId) -> Option<&Dept> {
        if self.id == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

#[derive(Debug, Clone)]
pub struct DeptApi {
    gateway: Arc<RequestGateway>,
}

impl DeptApi {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    pub async fn tree(&self) -> Result<Vec<Dept>, RequestError> {
        self.gateway
            .request("/api/sys/dept/tree", RequestOptions::get())
            .await
    }

    /// Posts to `update` when the node has an id, `create` otherwise.
    pub async fn save(&self, dept: &Dept) -> Result<DeptId, RequestError> {
        let path = if dept.id.is_some() {
            "/api/sys/dept/update"
        } else {
            "/api/sys/dept/create"
        };
        self.gateway
            .request(path, RequestOptions::post().json(dept))
            .await
    }

    pub async fn delete(&self, id: DeptId) -> Result<(), RequestError> {
        self.gateway
            .request(
                "/api/sys/dept/delete",
                RequestOptions::post().json(&IdBody { id }),
            )
            .await
    }
}
