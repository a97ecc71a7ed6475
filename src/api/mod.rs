//! Backend API client.
//!
//! One [`ApiClient`] owns a [`Transport`] and a [`SessionStore`]. Resource
//! services borrow it and map one user intent to one HTTP call:
//!
//! ```text
//! view / CLI ──▶ service fn ──▶ Call ──▶ headers (session) ──▶ Transport
//!                                                   │
//!                     typed value / Error ◀── decode_response
//! ```
//!
//! - [`auth`] - login, register, password reset, `/auth/me`
//! - [`projects`] - project CRUD and AI summary
//! - [`tasks`] - task CRUD, status, AI descriptions and estimates
//! - [`notifications`] - per-user notification feed

pub mod auth;
pub mod notifications;
pub mod projects;
pub mod response;
pub mod tasks;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use response::{decode_response, error_message};
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, Transport};

use crate::error::Result;
use crate::session::{IdentityPolicy, SessionStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// One backend call, before headers are attached.
#[derive(Debug, Clone)]
pub struct Call {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    identity: IdentityPolicy,
    fallback: &'static str,
}

impl Call {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            identity: IdentityPolicy::Optional,
            fallback: "Request failed",
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// `Json` when the payload cannot be serialized.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Require `X-User-Id` (create/update/delete).
    #[must_use]
    pub fn requires_identity(mut self) -> Self {
        self.identity = IdentityPolicy::Required;
        self
    }

    /// Message used when a failed response carries no body.
    #[must_use]
    pub fn fallback(mut self, message: &'static str) -> Self {
        self.fallback = message;
        self
    }
}

/// Client for the backend REST API.
#[derive(Debug)]
pub struct ApiClient<T> {
    transport: T,
    session: SessionStore,
}

impl<T: Transport> ApiClient<T> {
    #[must_use]
    pub fn new(transport: T, session: SessionStore) -> Self {
        Self { transport, session }
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn auth(&self) -> auth::Auth<'_, T> {
        auth::Auth::new(self)
    }

    #[must_use]
    pub fn projects(&self) -> projects::Projects<'_, T> {
        projects::Projects::new(self)
    }

    #[must_use]
    pub fn tasks(&self) -> tasks::Tasks<'_, T> {
        tasks::Tasks::new(self)
    }

    #[must_use]
    pub fn notifications(&self) -> notifications::Notifications<'_, T> {
        notifications::Notifications::new(self)
    }

    /// Execute a call and return the normalized body.
    ///
    /// Identity requirements are checked before anything is sent.
    ///
    /// # Errors
    ///
    /// `MissingIdentity`, `Transport` or `Http`.
    pub async fn execute(&self, call: Call) -> Result<Option<Value>> {
        let headers = self.session.headers(call.identity)?.into_pairs();
        let request = ApiRequest {
            method: call.method,
            path: call.path,
            query: call.query,
            headers,
            body: call.body,
        };

        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        debug!(%method, path = %path, status = response.status, "Backend call");

        decode_response(&response, call.fallback)
    }

    /// Execute a call whose body is a single record.
    ///
    /// An empty success body (204 included), an unparsable one, or one that
    /// does not match `R` is `Ok(None)`: the backend accepted the call, there
    /// is just nothing to return.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute).
    pub async fn fetch<R: DeserializeOwned>(&self, call: Call) -> Result<Option<R>> {
        let fallback = call.fallback;
        let Some(value) = self.execute(call).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(context = fallback, error = %e, "Unexpected response shape, treating as empty");
                Ok(None)
            }
        }
    }

    /// Execute a call whose body is a list; an empty or unexpected body is
    /// an empty list.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute).
    pub async fn fetch_list<R: DeserializeOwned>(&self, call: Call) -> Result<Vec<R>> {
        let fallback = call.fallback;
        match self.execute(call).await? {
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(value) => match serde_json::from_value(value) {
                Ok(items) => Ok(items),
                Err(e) => {
                    warn!(context = fallback, error = %e, "Unexpected list shape, treating as empty");
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Execute a call whose body, if any, is not needed.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute).
    pub async fn send(&self, call: Call) -> Result<()> {
        self.execute(call).await.map(|_| ())
    }
}
