//! Authenticated user and auth responses.

use serde::{Deserialize, Serialize};

/// Cached user record.
///
/// `/auth/me` only returns `id` and `email`; the optional fields are kept
/// when a richer record was cached earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    /// Best human-facing name: name, then username, then email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.email)
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Plain `{ "message": ... }` acknowledgement used by several auth routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let mut user = User {
            id: 1,
            email: "a@b.io".to_string(),
            name: None,
            username: Some("ana".to_string()),
            role: None,
        };
        assert_eq!(user.display_name(), "ana");
        user.username = None;
        assert_eq!(user.display_name(), "a@b.io");
        user.name = Some("Ana P".to_string());
        assert_eq!(user.display_name(), "Ana P");
    }

    #[test]
    fn test_me_response_parses() {
        let user: User = serde_json::from_str(r#"{"id": 4, "email": "x@y.z"}"#).unwrap();
        assert_eq!(user.id, 4);
        assert!(user.role.is_none());
    }

    #[test]
    fn test_login_response_default_token_type() {
        let login: LoginResponse = serde_json::from_str(r#"{"access_token": "t"}"#).unwrap();
        assert_eq!(login.token_type, "bearer");
    }
}
