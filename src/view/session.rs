//! Session bootstrap: login, restore on start, logout.

use crate::api::{ApiClient, Transport};
use crate::error::{Error, Result};
use crate::model::User;
use crate::session::SessionStore;
use tracing::{info, warn};

/// Log in, persist the token, then fetch and cache the user.
///
/// When the identity check after login fails, the fresh token is dropped
/// again so no half-initialized session is left behind.
///
/// # Errors
///
/// Validation, `Http` 401 for bad credentials, or the `/auth/me` error.
/// A login or identity reply without a body is an `Other` error.
pub async fn login<T: Transport>(api: &ApiClient<T>, email: &str, password: &str) -> Result<User> {
    let login = api
        .auth()
        .login(email, password)
        .await?
        .ok_or_else(|| Error::Other("Login response carried no token".to_string()))?;
    api.session().save_token(&login.access_token)?;

    let checked = api
        .auth()
        .me()
        .await
        .and_then(|user| user.ok_or_else(|| Error::Other("Could not load the current user".to_string())));
    match checked {
        Ok(user) => {
            api.session().save_user(&user)?;
            info!(user_id = user.id, "Logged in");
            Ok(user)
        }
        Err(e) => {
            api.session().clear()?;
            Err(e)
        }
    }
}

/// Re-validate a stored session.
///
/// Returns `None` when there is no token, or when the backend rejects it
/// (401, 403 or 404 from `/auth/me`); in the latter case the session is
/// cleared. An empty identity reply keeps the cached user.
///
/// # Errors
///
/// Store errors, and any other `/auth/me` failure (network, 5xx), which
/// leaves the stored session untouched.
pub async fn restore<T: Transport>(api: &ApiClient<T>) -> Result<Option<User>> {
    if !api.session().is_authenticated()? {
        return Ok(None);
    }

    match api.auth().me().await {
        Ok(Some(user)) => {
            api.session().save_user(&user)?;
            Ok(Some(user))
        }
        Ok(None) => api.session().user(),
        Err(e) if rejects_session(&e) => {
            warn!(error = %e, "Stored session rejected, clearing it");
            api.session().clear()?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn rejects_session(error: &Error) -> bool {
    matches!(error, Error::Http { status: 401 | 403 | 404, .. })
}

/// Forget the session.
///
/// # Errors
///
/// Store errors.
pub fn logout(session: &SessionStore) -> Result<()> {
    session.clear()?;
    info!("Logged out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::testing::{ScriptedTransport, client_with, project_json};
    use crate::session::{LEGACY_TOKEN_KEY, USER_ID_KEY};

    fn login_transport() -> ScriptedTransport {
        ScriptedTransport::new()
            .route(Method::Post, "/auth/login", 200, r#"{"access_token": "tok-1", "token_type": "bearer"}"#)
            .route(Method::Get, "/auth/me", 200, r#"{"id": 42, "email": "ana@example.com"}"#)
    }

    #[tokio::test]
    async fn test_login_persists_and_headers_follow() {
        let body = serde_json::json!([project_json(1, "Apollo")]).to_string();
        let transport = login_transport().route(Method::Get, "/projects/", 200, &body);
        let (client, transport) = client_with(transport);

        let user = login(&client, "ana@example.com", "Secret1!").await.unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(client.session().token().unwrap().as_deref(), Some("tok-1"));
        assert_eq!(client.session().store().get(USER_ID_KEY).unwrap().as_deref(), Some("42"));

        // The identity check itself already carries the new token
        let me = &transport.requests_to(Method::Get, "/auth/me")[0];
        assert_eq!(me.header("Authorization"), Some("Bearer tok-1"));

        client.projects().list().await.unwrap();
        let list = transport.last_request();
        assert_eq!(list.header("Authorization"), Some("Bearer tok-1"));
        assert_eq!(list.header("X-User-Id"), Some("42"));
    }

    #[tokio::test]
    async fn test_login_rolls_back_when_me_fails() {
        let transport = ScriptedTransport::new()
            .route(Method::Post, "/auth/login", 200, r#"{"access_token": "tok-1"}"#)
            .route(Method::Get, "/auth/me", 404, r#"{"detail": "User not found"}"#);
        let (client, _) = client_with(transport);

        assert!(login(&client, "ana@example.com", "Secret1!").await.is_err());
        assert!(!client.session().is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn test_restore_clears_rejected_session() {
        let transport = ScriptedTransport::new()
            .route(Method::Get, "/auth/me", 401, r#"{"detail": "Invalid or expired token"}"#);
        let (client, _) = client_with(transport);
        client.session().store().set(LEGACY_TOKEN_KEY, "stale").unwrap();

        assert_eq!(restore(&client).await.unwrap(), None);
        assert!(!client.session().is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn test_restore_keeps_session_when_offline() {
        let (client, _) = client_with(ScriptedTransport::new().fail("connection refused"));
        client.session().store().set(LEGACY_TOKEN_KEY, "still-good").unwrap();

        let err = restore(&client).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(client.session().token().unwrap().as_deref(), Some("still-good"));
    }

    #[tokio::test]
    async fn test_restore_keeps_session_on_server_error() {
        let transport = ScriptedTransport::new().route(Method::Get, "/auth/me", 502, "Bad Gateway");
        let (client, _) = client_with(transport);
        client.session().store().set(LEGACY_TOKEN_KEY, "still-good").unwrap();

        assert_eq!(restore(&client).await.unwrap_err().status(), Some(502));
        assert!(client.session().is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn test_login_without_token_body_fails_cleanly() {
        let transport = ScriptedTransport::new().route(Method::Post, "/auth/login", 204, "");
        let (client, _) = client_with(transport);

        assert!(matches!(
            login(&client, "ana@example.com", "Secret1!").await,
            Err(Error::Other(_))
        ));
        assert!(!client.session().is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn test_restore_without_token_sends_nothing() {
        let (client, transport) = client_with(ScriptedTransport::new());
        assert_eq!(restore(&client).await.unwrap(), None);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (client, _) = client_with(login_transport());
        login(&client, "ana@example.com", "Secret1!").await.unwrap();

        logout(client.session()).unwrap();
        assert!(!client.session().is_authenticated().unwrap());
        assert_eq!(client.session().user_id().unwrap(), None);
    }
}
