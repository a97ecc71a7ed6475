//! `/notifications` routes.
//!
//! Every call is scoped by a `user_id` query parameter taken from the
//! session; without one the call fails before anything is sent.

use super::{ApiClient, Call, Transport};
use crate::error::{Error, Result};
use crate::model::{Notification, UnreadCount};

/// Default page size of the notification list.
pub const DEFAULT_LIMIT: u32 = 30;

/// Notification service, borrowed from an [`ApiClient`].
pub struct Notifications<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> Notifications<'a, T> {
    pub(super) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    fn scoped(&self, call: Call) -> Result<Call> {
        let user_id = self.client.session().user_id()?.ok_or(Error::MissingIdentity)?;
        Ok(call.query("user_id", user_id))
    }

    /// Most recent notifications first, at most `limit`.
    ///
    /// # Errors
    ///
    /// `MissingIdentity` without a user id; `Transport` or `Http`.
    pub async fn list(&self, limit: u32) -> Result<Vec<Notification>> {
        let call = self.scoped(Call::get("/notifications/"))?
            .query("limit", limit)
            .fallback("Failed to load notifications");
        self.client.fetch_list(call).await
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// As [`list`](Self::list).
    pub async fn unread_count(&self) -> Result<i64> {
        let call = self
            .scoped(Call::get("/notifications/unread_count"))?
            .fallback("Failed to load unread count");
        let count: Option<UnreadCount> = self
            .client
            .execute(call)
            .await?
            .map(serde_json::from_value)
            .transpose()?;
        Ok(count.unwrap_or_default().unread)
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// `Http` 404 when it belongs to someone else or does not exist.
    pub async fn mark_read(&self, id: i64) -> Result<()> {
        let call = self
            .scoped(Call::post(format!("/notifications/{id}/read")))?
            .fallback("Failed to mark notification read");
        self.client.send(call).await
    }

    /// Mark every notification read.
    ///
    /// # Errors
    ///
    /// As [`list`](Self::list).
    pub async fn mark_all_read(&self) -> Result<()> {
        let call = self
            .scoped(Call::post("/notifications/read_all"))?
            .fallback("Failed to mark notifications read");
        self.client.send(call).await
    }

    /// Delete one notification.
    ///
    /// # Errors
    ///
    /// `Http` 404 when it belongs to someone else or does not exist.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let call = self
            .scoped(Call::delete(format!("/notifications/{id}")))?
            .fallback("Failed to delete notification");
        self.client.send(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::Method;
    use super::super::testing::{ScriptedTransport, client_with, signed_in_client};
    use super::*;

    #[tokio::test]
    async fn test_list_scopes_by_user() {
        let body = r#"[{"id": 1, "user_id": 5, "type": "task_created", "title": "Task created",
                        "is_read": false, "created_at": "2025-01-01T00:00:00"}]"#;
        let (client, transport) = signed_in_client(ScriptedTransport::new().respond(200, body), 5);

        let items = client.notifications().list(DEFAULT_LIMIT).await.unwrap();
        assert_eq!(items.len(), 1);

        let request = transport.last_request();
        assert_eq!(request.path, "/notifications/");
        assert_eq!(request.query_param("user_id"), Some("5"));
        assert_eq!(request.query_param("limit"), Some("30"));
    }

    #[tokio::test]
    async fn test_requires_user_id() {
        let (client, transport) = client_with(ScriptedTransport::new());
        assert!(matches!(
            client.notifications().unread_count().await,
            Err(Error::MissingIdentity)
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unread_count() {
        let (client, _) = signed_in_client(ScriptedTransport::new().respond(200, r#"{"unread": 4}"#), 5);
        assert_eq!(client.notifications().unread_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_mutations_hit_expected_routes() {
        let transport = ScriptedTransport::new()
            .route(Method::Post, "/notifications/3/read", 200, r#"{"id": 3, "title": "x", "is_read": true}"#)
            .route(Method::Post, "/notifications/read_all", 200, r#"{"ok": true}"#)
            .route(Method::Delete, "/notifications/3", 204, "");
        let (client, transport) = signed_in_client(transport, 5);

        client.notifications().mark_read(3).await.unwrap();
        client.notifications().mark_all_read().await.unwrap();
        client.notifications().delete(3).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.query_param("user_id") == Some("5")));
    }
}
