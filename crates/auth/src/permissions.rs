use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sysconsole_core::{DomainError, DomainResult};

/// Permission code granting everything.
pub const WILDCARD: &str = "*:*:*";

/// Permission code.
///
/// Codes are opaque colon-separated strings (e.g. `"sys:user:list"`). The
/// special code [`WILDCARD`] grants every permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(code: impl Into<Cow<'static, str>>) -> Self {
        Self(code.into())
    }

    /// Parse a code, rejecting empty or whitespace-bearing input.
    pub fn parse(code: &str) -> DomainResult<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(DomainError::validation("permission code must not be empty"));
        }
        if code.chars().any(char::is_whitespace) {
            return Err(DomainError::validation(format!(
                "permission code '{code}' must not contain whitespace"
            )));
        }
        Ok(Self(Cow::Owned(code.to_string())))
    }

    pub const fn wildcard() -> Self {
        Self(Cow::Borrowed(WILDCARD))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == WILDCARD
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(code: &'static str) -> Self {
        Self::new(code)
    }
}

/// Unordered, duplicate-free set of permission codes held by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(HashSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: &str) -> bool {
        // HashSet<Permission> cannot be probed with &str directly.
        self.0.iter().any(|p| p.as_str() == code)
    }

    pub fn has_wildcard(&self) -> bool {
        self.0.iter().any(Permission::is_wildcard)
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Codes in lexical order, for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.0.iter().map(Permission::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<String> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().map(Permission::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_blank_and_whitespace() {
        assert!(Permission::parse("").is_err());
        assert!(Permission::parse("   ").is_err());
        assert!(Permission::parse("sys:user list").is_err());
        assert_eq!(Permission::parse(" sys:user:list ").unwrap().as_str(), "sys:user:list");
    }

    #[test]
    fn set_deduplicates() {
        let set: PermissionSet = ["sys:user:list", "sys:user:list", "sys:role:list"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.sorted(), vec!["sys:role:list", "sys:user:list"]);
    }

    #[test]
    fn wildcard_is_detected() {
        let set: PermissionSet = [Permission::wildcard()].into_iter().collect();
        assert!(set.has_wildcard());
        assert!(!set.contains("sys:menu:list"));
    }

    #[test]
    fn deserializes_from_plain_array() {
        let set: PermissionSet = serde_json::from_str(r#"["a:b:c","d:e:f"]"#).unwrap();
        assert!(set.contains("a:b:c"));
        assert!(set.contains("d:e:f"));
    }
}
