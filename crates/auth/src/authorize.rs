use serde::Serialize;

use crate::{PermissionSet, UserInfo};

/// Outcome of a permission check, with the rule that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// No permission was required.
    NotRequired,
    /// The user carries the superuser flag.
    Superuser,
    /// The permission set holds the wildcard code.
    Wildcard,
    /// The permission set holds the exact code.
    Explicit,
    /// None of the above.
    Denied,
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        !matches!(self, AccessDecision::Denied)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            AccessDecision::NotRequired => "no permission required",
            AccessDecision::Superuser => "superuser bypass",
            AccessDecision::Wildcard => "wildcard permission",
            AccessDecision::Explicit => "explicit permission",
            AccessDecision::Denied => "missing permission",
        }
    }
}

/// Explain whether `required` is satisfied by the given identity.
///
/// An absent or empty requirement is always satisfied. The superuser flag is
/// checked before the permission set, so a superuser passes even with an empty
/// set.
///
/// - No IO
/// - No panics
pub fn explain_permission(
    user: Option<&UserInfo>,
    permissions: &PermissionSet,
    required: Option<&str>,
) -> AccessDecision {
    let required = match required {
        Some(code) if !code.is_empty() => code,
        _ => return AccessDecision::NotRequired,
    };

    if user.is_some_and(UserInfo::is_superuser) {
        return AccessDecision::Superuser;
    }

    if permissions.has_wildcard() {
        AccessDecision::Wildcard
    } else if permissions.contains(required) {
        AccessDecision::Explicit
    } else {
        AccessDecision::Denied
    }
}

/// Boolean form of [`explain_permission`].
pub fn has_permission(
    user: Option<&UserInfo>,
    permissions: &PermissionSet,
    required: Option<&str>,
) -> bool {
    explain_permission(user, permissions, required).is_granted()
}
