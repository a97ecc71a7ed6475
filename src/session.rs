//! Session state: bearer token plus cached user identity.
//!
//! Reads and writes go through an injected [`KeyValueStore`]. Keys:
//!
//! | key            | value                                 |
//! |----------------|---------------------------------------|
//! | `token`        | bearer token                          |
//! | `access_token` | legacy token key (read fallback only) |
//! | `user`         | cached [`User`] as JSON               |
//! | `user_id`      | raw numeric id                        |

use crate::error::{Error, Result};
use crate::model::User;
use crate::store::{KeyValueStore, read_json, write_json};
use std::sync::Arc;
use tracing::debug;

pub const TOKEN_KEY: &str = "token";
pub const LEGACY_TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";
pub const USER_ID_KEY: &str = "user_id";

/// Header carrying the caller's user id on writes.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Whether a call needs the `X-User-Id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Attach when known, never fail.
    Optional,
    /// Fail with [`Error::MissingIdentity`] when unknown.
    Required,
}

/// Header fragments produced for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthHeaders {
    pub authorization: Option<String>,
    pub user_id: Option<i64>,
}

impl AuthHeaders {
    /// Flatten into `(name, value)` pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(auth) = self.authorization {
            pairs.push(("Authorization".to_string(), auth));
        }
        if let Some(id) = self.user_id {
            pairs.push((USER_ID_HEADER.to_string(), id.to_string()));
        }
        pairs
    }
}

/// Session store over an injected key/value store.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for components sharing it (preferences).
    #[must_use]
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Current token: `token`, then legacy `access_token`.
    pub fn token(&self) -> Result<Option<String>> {
        for key in [TOKEN_KEY, LEGACY_TOKEN_KEY] {
            if let Some(token) = self.store.get(key)?.filter(|t| !t.trim().is_empty()) {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }

    /// Cached user record, if any.
    pub fn user(&self) -> Result<Option<User>> {
        read_json(self.store.as_ref(), USER_KEY)
    }

    /// Current user id: structured user record first, then raw `user_id`.
    pub fn user_id(&self) -> Result<Option<i64>> {
        if let Some(user) = self.user()? {
            if user.id > 0 {
                return Ok(Some(user.id));
            }
        }
        Ok(self
            .store
            .get(USER_ID_KEY)?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|id| *id > 0))
    }

    /// Stable identifier for per-user data: numeric id, else email.
    pub fn identity_key(&self) -> Result<Option<String>> {
        if let Some(id) = self.user_id()? {
            return Ok(Some(id.to_string()));
        }
        Ok(self
            .user()?
            .map(|u| u.email.trim().to_lowercase())
            .filter(|e| !e.is_empty()))
    }

    /// True once a token is stored.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.token()?.is_some())
    }

    /// Store a fresh token, replacing any legacy one.
    pub fn save_token(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, token)?;
        self.store.remove(LEGACY_TOKEN_KEY)
    }

    /// Cache the user record and its raw id.
    pub fn save_user(&self, user: &User) -> Result<()> {
        write_json(self.store.as_ref(), USER_KEY, user)?;
        self.store.set(USER_ID_KEY, &user.id.to_string())
    }

    /// Forget everything about the session.
    pub fn clear(&self) -> Result<()> {
        for key in [TOKEN_KEY, LEGACY_TOKEN_KEY, USER_KEY, USER_ID_KEY] {
            self.store.remove(key)?;
        }
        debug!("Session cleared");
        Ok(())
    }

    /// Build the header fragments for a request.
    ///
    /// The bearer token is attached whenever one exists; anonymous calls
    /// simply go without it. The user id is attached when known, and
    /// required under [`IdentityPolicy::Required`].
    ///
    /// # Errors
    ///
    /// [`Error::MissingIdentity`] when the policy is `Required` and no user
    /// id is known; store errors are propagated.
    pub fn headers(&self, policy: IdentityPolicy) -> Result<AuthHeaders> {
        let authorization = self.token()?.map(|t| format!("Bearer {t}"));
        let user_id = self.user_id()?;

        if policy == IdentityPolicy::Required && user_id.is_none() {
            return Err(Error::MissingIdentity);
        }

        Ok(AuthHeaders {
            authorization,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn session() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStore::new()))
    }

    fn user(id: i64) -> User {
        User {
            id,
            email: "Ana@Example.com".to_string(),
            name: None,
            username: None,
            role: None,
        }
    }

    #[test]
    fn test_token_falls_back_to_legacy_key() {
        let s = session();
        assert_eq!(s.token().unwrap(), None);
        s.store().set(LEGACY_TOKEN_KEY, "old").unwrap();
        assert_eq!(s.token().unwrap().as_deref(), Some("old"));
        s.save_token("new").unwrap();
        assert_eq!(s.token().unwrap().as_deref(), Some("new"));
        assert_eq!(s.store().get(LEGACY_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_user_id_prefers_structured_record() {
        let s = session();
        s.store().set(USER_ID_KEY, "12").unwrap();
        assert_eq!(s.user_id().unwrap(), Some(12));

        write_json(s.store().as_ref(), USER_KEY, &user(5)).unwrap();
        assert_eq!(s.user_id().unwrap(), Some(5));
    }

    #[test]
    fn test_identity_key_falls_back_to_email() {
        let s = session();
        assert_eq!(s.identity_key().unwrap(), None);
        write_json(s.store().as_ref(), USER_KEY, &user(0)).unwrap();
        assert_eq!(s.identity_key().unwrap().as_deref(), Some("ana@example.com"));
        s.save_user(&user(9)).unwrap();
        assert_eq!(s.identity_key().unwrap().as_deref(), Some("9"));
    }

    #[test]
    fn test_optional_identity_never_blocks() {
        let s = session();
        let headers = s.headers(IdentityPolicy::Optional).unwrap();
        assert_eq!(headers, AuthHeaders::default());
        assert!(headers.into_pairs().is_empty());
    }

    #[test]
    fn test_required_identity_fails_fast() {
        let s = session();
        s.save_token("t").unwrap();
        assert!(matches!(
            s.headers(IdentityPolicy::Required),
            Err(Error::MissingIdentity)
        ));

        s.save_user(&user(3)).unwrap();
        let pairs = s.headers(IdentityPolicy::Required).unwrap().into_pairs();
        assert_eq!(
            pairs,
            vec![
                ("Authorization".to_string(), "Bearer t".to_string()),
                (USER_ID_HEADER.to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_clear_removes_everything() {
        let s = session();
        s.save_token("t").unwrap();
        s.save_user(&user(3)).unwrap();
        s.clear().unwrap();
        assert!(!s.is_authenticated().unwrap());
        assert_eq!(s.user_id().unwrap(), None);
    }
}
