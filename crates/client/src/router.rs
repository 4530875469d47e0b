//! Route table, route guard and the router that commits navigations.

use std::sync::Arc;

use serde::Serialize;
use sysconsole_auth::Permission;
use thiserror::Error;

use crate::navigation::Location;
use crate::session::AuthSession;

/// A declared route. `permission: None` means authenticated-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef {
    pub path: String,
    pub name: String,
    pub permission: Option<Permission>,
    pub redirect: Option<String>,
}

impl RouteDef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            permission: None,
            redirect: None,
        }
    }

    pub fn requires(mut self, permission: impl Into<Permission>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("route '{0}' is not declared")]
    MissingRoute(String),
    #[error("route '{0}' must not require a permission")]
    GuardedEntryPoint(String),
    #[error("route '{0}' is declared twice")]
    DuplicateRoute(String),
}

/// Strip the query string and any trailing slash (except for the root).
pub fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDef>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, route: RouteDef) -> Self {
        self.routes.push(route);
        self
    }

    /// The console's own pages.
    pub fn console(login_route: &str, fallback_route: &str) -> Self {
        Self::new()
            .route(RouteDef::new(login_route, "login"))
            .route(RouteDef::new(fallback_route, "Dashboard"))
            .route(RouteDef::new("/", "Root").redirect_to(fallback_route))
            .route(RouteDef::new("/system/user", "SystemUser").requires("sys:user:list"))
            .route(RouteDef::new("/system/role", "SystemRole").requires("sys:role:list"))
            .route(RouteDef::new("/system/dept", "SystemDept").requires("sys:dept:list"))
            .route(RouteDef::new("/system/menu", "SystemMenu").requires("sys:menu:list"))
    }

    pub fn find(&self, path: &str) -> Option<&RouteDef> {
        let path = normalize_path(path);
        self.routes.iter().find(|r| normalize_path(&r.path) == path)
    }

    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }

    fn validate(&self, login_route: &str, fallback_route: &str) -> Result<(), RouterError> {
        for (i, route) in self.routes.iter().enumerate() {
            let path = normalize_path(&route.path);
            if self.routes[..i].iter().any(|r| normalize_path(&r.path) == path) {
                return Err(RouterError::DuplicateRoute(route.path.clone()));
            }
        }
        for entry in [login_route, fallback_route] {
            let route = self
                .find(entry)
                .ok_or_else(|| RouterError::MissingRoute(entry.to_string()))?;
            if route.permission.is_some() {
                return Err(RouterError::GuardedEntryPoint(entry.to_string()));
            }
        }
        Ok(())
    }
}

/// Why a navigation was redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedirectReason {
    /// No session token.
    Unauthenticated,
    /// Token present but the session could not be loaded.
    SessionInvalid,
    /// The route requires a permission the session lacks.
    Forbidden { permission: String },
    /// Login requested while already signed in.
    AlreadyAuthenticated,
    /// No route matches the path.
    UnknownRoute,
}

/// Result of one navigation attempt: allow, or exactly one redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Allow { path: String },
    Redirect { to: String, reason: RedirectReason },
}

impl NavigationOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationOutcome::Allow { .. })
    }

    /// Path the console ends up on.
    pub fn destination(&self) -> &str {
        match self {
            NavigationOutcome::Allow { path } => path,
            NavigationOutcome::Redirect { to, .. } => to,
        }
    }
}

/// Evaluated before every committed navigation.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: Arc<AuthSession>,
    login_route: String,
    fallback_route: String,
}

impl RouteGuard {
    pub fn new(
        session: Arc<AuthSession>,
        login_route: impl Into<String>,
        fallback_route: impl Into<String>,
    ) -> Self {
        Self {
            session,
            login_route: login_route.into(),
            fallback_route: fallback_route.into(),
        }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    fn redirect(&self, to: &str, reason: RedirectReason) -> NavigationOutcome {
        NavigationOutcome::Redirect {
            to: to.to_string(),
            reason,
        }
    }

    /// Decide the navigation to `path`; `route` is its match, if any.
    ///
    /// Authentication is settled before any permission is looked at.
    pub async fn check(&self, path: &str, route: Option<&RouteDef>) -> NavigationOutcome {
        let to_login = normalize_path(path) == normalize_path(&self.login_route);
        let has_token = self.session.tokens().is_present();

        if !has_token {
            if self.session.initialized() {
                self.session.clear_auth();
            }
            if !to_login {
                return self.redirect(&self.login_route, RedirectReason::Unauthenticated);
            }
        }

        if has_token && !to_login && !self.session.initialized() {
            if !self.session.fetch_user_info().await {
                return self.redirect(&self.login_route, RedirectReason::SessionInvalid);
            }
        }

        let Some(route) = route else {
            return self.redirect(&self.fallback_route, RedirectReason::UnknownRoute);
        };

        if let Some(required) = &route.permission {
            if !self.session.has_permission(Some(required.as_str())) {
                return self.redirect(
                    &self.fallback_route,
                    RedirectReason::Forbidden {
                        permission: required.to_string(),
                    },
                );
            }
        }

        if has_token && to_login {
            return self.redirect(&self.fallback_route, RedirectReason::AlreadyAuthenticated);
        }

        NavigationOutcome::Allow {
            path: path.to_string(),
        }
    }
}

const MAX_REDIRECT_HOPS: usize = 3;

/// Resolves paths, runs the guard and commits the resulting location.
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
    guard: RouteGuard,
    location: Location,
}

impl Router {
    pub fn new(table: RouteTable, guard: RouteGuard, location: Location) -> Result<Self, RouterError> {
        table.validate(&guard.login_route, &guard.fallback_route)?;
        Ok(Self {
            table,
            guard,
            location,
        })
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    /// Navigate to `path` and commit where the console ends up.
    ///
    /// Returns the guard's answer for this attempt. Route-level redirects
    /// (e.g. `/` to the landing page) resolve before the guard runs. A guard
    /// redirect is followed as a fresh guarded attempt, so the committed
    /// location is always one the guard allowed.
    pub async fn navigate(&self, path: &str) -> NavigationOutcome {
        let first = self.attempt(path).await;
        let mut settled = first.clone();

        let mut hops = 0;
        while let NavigationOutcome::Redirect { to, .. } = &settled {
            if hops == MAX_REDIRECT_HOPS {
                tracing::warn!(to = %to, "redirect chain too long; stopping");
                break;
            }
            hops += 1;
            let to = to.clone();
            settled = self.attempt(&to).await;
        }

        self.location.commit(settled.destination());
        first
    }

    async fn attempt(&self, path: &str) -> NavigationOutcome {
        let mut target = path.to_string();
        let mut route = self.table.find(&target);
        if let Some(next) = route.and_then(|r| r.redirect.clone()) {
            tracing::debug!(from = %target, to = %next, "route redirect");
            route = self.table.find(&next);
            target = next;
        }

        let outcome = self.guard.check(&target, route).await;
        match &outcome {
            NavigationOutcome::Allow { path } => {
                tracing::debug!(path = %path, "navigation allowed");
            }
            NavigationOutcome::Redirect { to, reason } => {
                tracing::info!(from = %target, to = %to, reason = ?reason, "navigation redirected");
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_query_and_trailing_slash() {
        assert_eq!(normalize_path("/system/user/?page=2"), "/system/user");
        assert_eq!(normalize_path("/login#top"), "/login");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn console_table_is_valid() {
        let table = RouteTable::console("/login", "/dashboard");
        table.validate("/login", "/dashboard").unwrap();
        assert_eq!(
            table
                .find("/system/menu")
                .and_then(|r| r.permission.as_ref())
                .map(Permission::as_str),
            Some("sys:menu:list")
        );
        assert_eq!(table.find("/").and_then(|r| r.redirect.as_deref()), Some("/dashboard"));
    }

    #[test]
    fn guarded_fallback_is_rejected() {
        let table = RouteTable::new()
            .route(RouteDef::new("/login", "login"))
            .route(RouteDef::new("/home", "home").requires("sys:home:view"));
        assert_eq!(
            table.validate("/login", "/home"),
            Err(RouterError::GuardedEntryPoint("/home".to_string()))
        );
    }

    #[test]
    fn missing_login_is_rejected() {
        let table = RouteTable::new().route(RouteDef::new("/home", "home"));
        assert_eq!(
            table.validate("/login", "/home"),
            Err(RouterError::MissingRoute("/login".to_string()))
        );
    }

    #[test]
    fn duplicates_are_rejected() {
        let table = RouteTable::new()
            .route(RouteDef::new("/login", "login"))
            .route(RouteDef::new("/login/", "login-again"));
        assert!(matches!(
            table.validate("/login", "/login"),
            Err(RouterError::DuplicateRoute(_))
        ));
    }

    #[test]
    fn outcome_serializes_with_tags() {
        let outcome = NavigationOutcome::Redirect {
            to: "/dashboard".to_string(),
            reason: RedirectReason::Forbidden {
                permission: "sys:menu:list".to_string(),
            },
        };
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["outcome"], "redirect");
        assert_eq!(v["reason"]["kind"], "forbidden");
        assert_eq!(v["reason"]["permission"], "sys:menu:list");
    }
}
