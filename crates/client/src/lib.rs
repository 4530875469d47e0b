//! `sysconsole-client`
//!
//! **Responsibility:** client side of the admin console.
//!
//! This crate provides:
//! - The Request Gateway (token injection, envelope unwrapping, failure notification)
//! - Typed resource clients for users, roles, departments, menus and auth info
//! - The Auth Session Store (identity + permission cache)
//! - The Route Guard and router deciding every navigation

pub mod api;
pub mod config;
pub mod context;
pub mod envelope;
pub mod gateway;
pub mod navigation;
pub mod notify;
pub mod router;
pub mod session;
pub mod token;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use context::{ConsoleContext, ContextError};
pub use gateway::{RequestError, RequestGateway, RequestOptions};
pub use navigation::{Location, Navigator};
pub use notify::{MemoryNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use router::{NavigationOutcome, RedirectReason, RouteDef, RouteGuard, RouteTable, Router};
pub use session::{AuthSession, SessionSnapshot};
pub use token::{FileTokenStore, MemoryTokenStore, SessionToken, TokenStore};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
