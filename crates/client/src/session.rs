//! Auth Session Store.
//!
//! One [`AuthSession`] is created per running console and shared (via `Arc`)
//! with the route guard and with anything that needs a permission check. It
//! holds the signed-in identity and its permission set; both are always
//! replaced or cleared together.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use sysconsole_auth::{AccessDecision, PermissionSet, UserInfo, explain_permission};
use tokio::sync::Mutex;

use crate::api::{AuthApi, UserApi};
use crate::gateway::{RequestError, RequestGateway};
use crate::token::TokenStore;

/// Point-in-time copy of the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<UserInfo>,
    pub permissions: PermissionSet,
    pub is_loading: bool,
    pub initialized: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<UserInfo>,
    permissions: PermissionSet,
    initialized: bool,
}

/// Resets the loading flag however the fetch exits, including cancellation.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AuthSession {
    auth_api: AuthApi,
    user_api: UserApi,
    tokens: Arc<dyn TokenStore>,
    state: RwLock<SessionState>,
    is_loading: AtomicBool,
    // Single-flight: callers queue on the gate; whoever finds the epoch moved
    // while waiting reuses the outcome of the fetch that just finished.
    fetch_gate: Mutex<()>,
    fetch_epoch: AtomicU64,
    last_outcome: AtomicBool,
    // Bumped by every clear; a fetch that straddles one must not resurrect state.
    clear_epoch: AtomicU64,
}

impl AuthSession {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        let tokens = gateway.tokens().clone();
        Self {
            auth_api: AuthApi::new(gateway.clone()),
            user_api: UserApi::new(gateway),
            tokens,
            state: RwLock::new(SessionState::default()),
            is_loading: AtomicBool::new(false),
            fetch_gate: Mutex::new(()),
            fetch_epoch: AtomicU64::new(0),
            last_outcome: AtomicBool::new(false),
            clear_epoch: AtomicU64::new(0),
        }
    }

    /// Load identity and permissions for the current token.
    ///
    /// Returns `false` (with the session cleared) when there is no token or
    /// when either upstream call fails. The gateway has already notified the
    /// user of the failure.
    pub async fn fetch_user_info(&self) -> bool {
        if !self.tokens.is_present() {
            self.clear_auth();
            return false;
        }

        let epoch = self.fetch_epoch.load(Ordering::Acquire);
        let _gate = self.fetch_gate.lock().await;
        if self.fetch_epoch.load(Ordering::Acquire) != epoch {
            let shared = self.last_outcome.load(Ordering::Acquire);
            tracing::debug!(outcome = shared, "joined in-flight session fetch");
            return shared;
        }

        let cleared = self.clear_epoch.load(Ordering::Acquire);
        let ok = {
            let _loading = LoadingGuard::engage(&self.is_loading);
            match self.load_identity().await {
                Ok((user, permissions)) => {
                    let mut state = self.write_state();
                    if self.clear_epoch.load(Ordering::Acquire) != cleared {
                        tracing::debug!(user = %user.username, "session cleared mid-fetch, discarding identity");
                        false
                    } else {
                        tracing::info!(
                            user = %user.username,
                            permissions = permissions.len(),
                            "session initialized"
                        );
                        state.user = Some(user);
                        state.permissions = permissions;
                        state.initialized = true;
                        true
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "session fetch failed");
                    self.clear_auth();
                    false
                }
            }
        };

        self.last_outcome.store(ok, Ordering::Release);
        self.fetch_epoch.fetch_add(1, Ordering::AcqRel);
        ok
    }

    /// Sequential auth-info then self-user; nothing is applied unless both succeed.
    async fn load_identity(&self) -> Result<(UserInfo, PermissionSet), RequestError> {
        let info = self.auth_api.info().await?;
        let permissions: PermissionSet = info.permissions.unwrap_or_default().into_iter().collect();

        let me = self.user_api.self_user().await?;
        let user = UserInfo {
            id: me.id,
            username: me.username,
            email: me.email,
            is_superuser: me.superuser,
        };

        Ok((user, permissions))
    }

    /// Drop identity, permissions and the stored token. Idempotent.
    pub fn clear_auth(&self) {
        {
            let mut state = self.write_state();
            self.clear_epoch.fetch_add(1, Ordering::AcqRel);
            state.user = None;
            state.permissions.clear();
            state.initialized = false;
        }
        if let Err(err) = self.tokens.clear() {
            tracing::warn!(error = %err, "failed to delete session token");
        }
    }

    /// Whether the current session satisfies `required`.
    ///
    /// Pure read of the current state; `None` or an empty code always passes.
    pub fn has_permission(&self, required: Option<&str>) -> bool {
        self.explain(required).is_granted()
    }

    pub fn explain(&self, required: Option<&str>) -> AccessDecision {
        let state = self.read_state();
        explain_permission(state.user.as_ref(), &state.permissions, required)
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.read_state().user.clone()
    }

    pub fn permissions(&self) -> PermissionSet {
        self.read_state().permissions.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::Acquire)
    }

    pub fn initialized(&self) -> bool {
        self.read_state().initialized
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.read_state();
        SessionSnapshot {
            user: state.user.clone(),
            permissions: state.permissions.clone(),
            is_loading: self.is_loading(),
            initialized: state.initialized,
        }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Location;
    use crate::notify::MemoryNotifier;
    use crate::token::MemoryTokenStore;
    use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Serves auth-info and self-user, optionally slowly or with a failing self-user.
    struct Upstream {
        permissions: Vec<&'static str>,
        superuser: bool,
        self_status: u16,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Upstream {
        fn new(permissions: Vec<&'static str>) -> Self {
            Self {
                permissions,
                superuser: false,
                self_status: 200,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for Upstream {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let body = if request.url.ends_with("/api/auth/info") {
                json!({"code": 200, "message": "ok", "data": {"permissions": self.permissions}})
            } else if request.url.ends_with("/api/sys/user/self") {
                if self.self_status != 200 {
                    return Ok(HttpResponse::new(self.self_status, ""));
                }
                json!({"code": 200, "message": "ok", "data": {
                    "id": 7, "username": "alice", "email": "alice@example.com",
                    "superuser": self.superuser
                }})
            } else {
                return Ok(HttpResponse::new(404, ""));
            };
            Ok(HttpResponse::new(200, body.to_string()))
        }
    }

    fn session_with(upstream: Arc<Upstream>, token: Option<&str>) -> (AuthSession, Arc<MemoryNotifier>) {
        let tokens: Arc<MemoryTokenStore> = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let notifier = Arc::new(MemoryNotifier::new());
        let gateway = RequestGateway::new(
            "http://api.test",
            upstream,
            tokens,
            notifier.clone(),
            Arc::new(Location::default()),
        );
        (AuthSession::new(Arc::new(gateway)), notifier)
    }

    #[tokio::test]
    async fn no_token_clears_without_network() {
        let upstream = Arc::new(Upstream::new(vec!["sys:user:list"]));
        let (session, _) = session_with(upstream.clone(), None);

        assert!(!session.fetch_user_info().await);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
        assert!(!session.initialized());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn successful_fetch_populates_user_and_permissions() {
        let upstream = Arc::new(Upstream::new(vec!["sys:user:list", "sys:role:list"]));
        let (session, notifier) = session_with(upstream.clone(), Some("tok"));

        assert!(session.fetch_user_info().await);
        let snap = session.snapshot();
        assert!(snap.initialized);
        assert!(!snap.is_loading);
        assert_eq!(snap.user.as_ref().map(|u| u.username.as_str()), Some("alice"));
        assert_eq!(snap.user.as_ref().and_then(|u| u.is_superuser), Some(false));
        assert_eq!(snap.permissions.len(), 2);
        assert!(session.has_permission(Some("sys:user:list")));
        assert!(!session.has_permission(Some("sys:menu:list")));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn failing_self_user_discards_permissions() {
        let mut upstream = Upstream::new(vec!["sys:user:list"]);
        upstream.self_status = 500;
        let (session, notifier) = session_with(Arc::new(upstream), Some("tok"));

        assert!(!session.fetch_user_info().await);
        assert_eq!(session.snapshot(), SessionSnapshot::default());
        assert!(session.tokens().load().is_none());
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn superuser_passes_everything() {
        let mut upstream = Upstream::new(vec![]);
        upstream.superuser = true;
        let (session, _) = session_with(Arc::new(upstream), Some("tok"));

        assert!(session.fetch_user_info().await);
        assert_eq!(session.explain(Some("sys:menu:list")), AccessDecision::Superuser);
    }

    #[tokio::test]
    async fn clear_auth_is_idempotent() {
        let upstream = Arc::new(Upstream::new(vec!["*:*:*"]));
        let (session, _) = session_with(upstream, Some("tok"));
        assert!(session.fetch_user_info().await);
        assert!(session.has_permission(Some("anything:at:all")));

        session.clear_auth();
        let once = session.snapshot();
        session.clear_auth();
        assert_eq!(session.snapshot(), once);
        assert!(!once.initialized);
        assert!(!session.has_permission(Some("sys:user:list")));
        assert!(session.has_permission(None));
    }

    #[tokio::test]
    async fn concurrent_fetches_share_one_round_trip() {
        let mut upstream = Upstream::new(vec!["sys:user:list"]);
        upstream.delay = Duration::from_millis(20);
        let upstream = Arc::new(upstream);
        let (session, _) = session_with(upstream.clone(), Some("tok"));
        let session = Arc::new(session);

        let a = tokio::spawn({
            let s = session.clone();
            async move { s.fetch_user_info().await }
        });
        let b = tokio::spawn({
            let s = session.clone();
            async move { s.fetch_user_info().await }
        });

        assert!(a.await.unwrap());
        assert!(b.await.unwrap());
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sequential_fetches_each_hit_upstream() {
        let upstream = Arc::new(Upstream::new(vec!["sys:user:list"]));
        let (session, _) = session_with(upstream.clone(), Some("tok"));

        assert!(session.fetch_user_info().await);
        assert!(session.fetch_user_info().await);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn loading_flag_is_raised_while_fetch_is_suspended() {
        let mut upstream = Upstream::new(vec!["sys:user:list"]);
        upstream.delay = Duration::from_millis(20);
        let (session, _) = session_with(Arc::new(upstream), Some("tok"));
        let session = Arc::new(session);
        assert!(!session.is_loading());

        let fetch = tokio::spawn({
            let s = session.clone();
            async move { s.fetch_user_info().await }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(session.is_loading());

        assert!(fetch.await.unwrap());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn clear_during_fetch_is_not_overwritten() {
        let mut upstream = Upstream::new(vec!["sys:user:list"]);
        upstream.delay = Duration::from_millis(20);
        let (session, _) = session_with(Arc::new(upstream), Some("tok"));
        let session = Arc::new(session);

        let fetch = tokio::spawn({
            let s = session.clone();
            async move { s.fetch_user_info().await }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        session.clear_auth();

        assert!(!fetch.await.unwrap());
        assert!(!session.initialized());
        assert!(session.user().is_none());
        assert!(session.permissions().is_empty());
        assert!(!session.is_loading());
    }
}
