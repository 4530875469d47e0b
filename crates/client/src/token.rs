//! Durable session-token storage.
//!
//! Presence of a token is the only client-side signal of "logged in"; there is
//! no expiry tracking, the server rejects stale tokens with 401.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

/// Opaque session credential.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token; blank input is no token at all.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("failed to write token to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove token at {path:?}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Storage for the single session token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<SessionToken>;

    fn save(&self, token: &SessionToken) -> Result<(), TokenStoreError>;

    /// Remove the token. Removing an absent token succeeds.
    fn clear(&self) -> Result<(), TokenStoreError>;

    fn is_present(&self) -> bool {
        self.load().is_some()
    }
}

/// File-backed store: the file holds the raw token text.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<SessionToken> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => SessionToken::new(raw),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "unreadable token file treated as absent");
                None
            }
        }
    }

    fn save(&self, token: &SessionToken) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| TokenStoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, token.as_str()).map_err(|source| TokenStoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TokenStoreError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// In-process store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SessionToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(raw: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(SessionToken::new(raw)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<SessionToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &SessionToken) -> Result<(), TokenStoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("sysconsole-token-{}", uuid::Uuid::now_v7()))
            .join(name)
    }

    #[test]
    fn blank_token_is_absent() {
        assert!(SessionToken::new("  \n").is_none());
        assert_eq!(SessionToken::new(" abc\n").unwrap().as_str(), "abc");
    }

    #[test]
    fn debug_does_not_leak_token() {
        let token = SessionToken::new("secret").unwrap();
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn file_store_round_trip_and_idempotent_clear() {
        let store = FileTokenStore::new(temp_path("token"));
        assert!(store.load().is_none());

        store.save(&SessionToken::new("t-1").unwrap()).unwrap();
        assert_eq!(store.load().unwrap().as_str(), "t-1");

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.is_present());
    }

    #[test]
    fn empty_file_counts_as_absent() {
        let path = temp_path("token");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        assert!(FileTokenStore::new(path).load().is_none());
    }

    #[test]
    fn memory_store_clear() {
        let store = MemoryTokenStore::with_token("abc");
        assert!(store.is_present());
        store.clear().unwrap();
        assert!(store.load().is_none());
    }
}
