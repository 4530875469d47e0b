//! `sysconsole-core`: shared building blocks for the admin console client.
//!
//! This crate contains **pure** primitives (no transport or storage concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{DeptId, MenuId, RoleId, UserId};
