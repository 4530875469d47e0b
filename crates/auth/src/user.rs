use serde::{Deserialize, Serialize};
use sysconsole_core::UserId;

/// Identity of the signed-in console user.
///
/// Assembled from the auth-info and self-user calls; `is_superuser` is absent
/// when the upstream record does not carry the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
}

impl UserInfo {
    pub fn is_superuser(&self) -> bool {
        self.is_superuser.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_superuser_flag_means_regular_user() {
        let user: UserInfo =
            serde_json::from_str(r#"{"id":1,"username":"alice","email":"a@example.com"}"#).unwrap();
        assert_eq!(user.is_superuser, None);
        assert!(!user.is_superuser());
    }

    #[test]
    fn camel_case_flag_is_read() {
        let user: UserInfo = serde_json::from_str(
            r#"{"id":1,"username":"root","email":"r@example.com","isSuperuser":true}"#,
        )
        .unwrap();
        assert!(user.is_superuser());
    }
}
