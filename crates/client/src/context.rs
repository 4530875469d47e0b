//! Application context: one of each collaborator, wired together.
//!
//! Built once at startup and torn down with the process; everything that
//! needs the session gets it from here rather than from module state.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{AuthApi, DeptApi, MenuApi, RoleApi, UserApi};
use crate::config::{ClientConfig, ConfigError};
use crate::gateway::RequestGateway;
use crate::navigation::Location;
use crate::notify::Notifier;
use crate::router::{RouteGuard, RouteTable, Router, RouterError};
use crate::session::AuthSession;
use crate::token::{FileTokenStore, TokenStore};
use crate::transport::{ReqwestTransport, Transport, TransportError};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Router(#[from] RouterError),
}

#[derive(Debug, Clone)]
pub struct ConsoleContext {
    pub gateway: Arc<RequestGateway>,
    pub session: Arc<AuthSession>,
    pub router: Router,
    pub location: Location,
}

impl ConsoleContext {
    /// Production wiring: file token store and `reqwest` transport.
    pub fn from_config(
        config: &ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ContextError> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout)?);
        let tokens = Arc::new(FileTokenStore::new(config.token_file.clone()));
        let table = RouteTable::console(&config.login_route, &config.fallback_route);
        Self::assemble(config, transport, tokens, notifier, table)
    }

    /// Wiring with caller-supplied collaborators.
    pub fn assemble(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
        table: RouteTable,
    ) -> Result<Self, ContextError> {
        let location = Location::new(config.fallback_route.clone());
        let gateway = Arc::new(
            RequestGateway::new(
                config.api_url.clone(),
                transport,
                tokens,
                notifier,
                Arc::new(location.clone()),
            )
            .with_login_route(config.login_route.clone()),
        );
        let session = Arc::new(AuthSession::new(gateway.clone()));
        let guard = RouteGuard::new(
            session.clone(),
            config.login_route.clone(),
            config.fallback_route.clone(),
        );
        let router = Router::new(table, guard, location.clone())?;

        Ok(Self {
            gateway,
            session,
            router,
            location,
        })
    }

    pub fn auth_api(&self) -> AuthApi {
        AuthApi::new(self.gateway.clone())
    }

    pub fn user_api(&self) -> UserApi {
        UserApi::new(self.gateway.clone())
    }

    pub fn role_api(&self) -> RoleApi {
        RoleApi::new(self.gateway.clone())
    }

    pub fn dept_api(&self) -> DeptApi {
        DeptApi::new(self.gateway.clone())
    }

    pub fn menu_api(&self) -> MenuApi {
        MenuApi::new(self.gateway.clone())
    }
}
