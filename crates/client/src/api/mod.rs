//! Typed resource clients over the [`RequestGateway`](crate::gateway::RequestGateway).
//!
//! These are thin one-call-per-endpoint shims; all error handling lives in the
//! gateway.

pub mod auth;
pub mod dept;
pub mod menu;
pub mod role;
pub mod user;

use serde::{Deserialize, Serialize};

pub use auth::{AuthApi, AuthInfo};
pub use dept::{Dept, DeptApi};
pub use menu::{Menu, MenuApi, MenuType};
pub use role::{DataScope, Role, RoleApi};
pub use user::{SelfUser, User, UserApi, UserForm};

/// One page of a listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub total: u64,
    pub rows: Vec<T>,
}

/// Paging parameters; absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl PageQuery {
    pub fn page(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            sort: None,
        }
    }
}

/// `{id, name}` reference embedded in other records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef<I> {
    pub id: I,
    pub name: String,
}

/// Body of the tree-style delete endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct IdBody<I> {
    pub id: I,
}
