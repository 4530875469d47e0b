//! `sysconsole-auth`: pure authorization boundary for the console.
//!
//! This crate is intentionally decoupled from HTTP and storage: it only answers
//! "does this identity with this permission set get past this requirement".

pub mod authorize;
pub mod permissions;
pub mod user;

pub use authorize::{AccessDecision, explain_permission, has_permission};
pub use permissions::{Permission, PermissionSet, WILDCARD};
pub use user::UserInfo;
