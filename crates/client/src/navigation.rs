//! Current location and forced navigations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Sink for navigations that bypass the route guard (e.g. the 401 bounce to login).
pub trait Navigator: Send + Sync {
    fn force_navigate(&self, path: &str);
}

/// Shared handle to the path the console is currently showing.
///
/// Clones share state: the router commits guarded navigations here and the
/// gateway forces the login bounce through the same handle.
#[derive(Debug, Clone)]
pub struct Location {
    current: Arc<RwLock<String>>,
    forced: Arc<AtomicUsize>,
}

impl Location {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial.into())),
            forced: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn current(&self) -> String {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn commit(&self, path: &str) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = path.to_string();
    }

    /// Number of forced navigations so far.
    pub fn forced_count(&self) -> usize {
        self.forced.load(Ordering::Acquire)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for Location {
    fn force_navigate(&self, path: &str) {
        tracing::info!(to = path, "forced navigation");
        self.commit(path);
        self.forced.fetch_add(1, Ordering::AcqRel);
    }
}
