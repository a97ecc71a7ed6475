//! `/projects` routes.

use super::{ApiClient, Call, Transport};
use crate::error::{Error, Result};
use crate::model::ai::ScopedSummaryRequest;
use crate::model::{AiScope, Project, ProjectCreate, ProjectSummary, ProjectUpdate};

/// Project service, borrowed from an [`ApiClient`].
pub struct Projects<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> Projects<'a, T> {
    pub(super) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// All projects.
    ///
    /// # Errors
    ///
    /// `Transport` or `Http`.
    pub async fn list(&self) -> Result<Vec<Project>> {
        self.client
            .fetch_list(Call::get("/projects/").fallback("Failed to load projects"))
            .await
    }

    /// One project by id; `None` when the backend answers without a body.
    ///
    /// # Errors
    ///
    /// `Http` 404 when it does not exist.
    pub async fn get(&self, id: i64) -> Result<Option<Project>> {
        self.client
            .fetch(Call::get(format!("/projects/{id}")).fallback("Failed to load project"))
            .await
    }

    /// Create a project from a validated payload.
    ///
    /// Returns the created record, or `None` when the backend accepted the
    /// create without echoing it back.
    ///
    /// # Errors
    ///
    /// `MissingIdentity` without a user id; `Http` on rejection.
    pub async fn create(&self, body: &ProjectCreate) -> Result<Option<Project>> {
        let call = Call::post("/projects/")
            .json(body)?
            .requires_identity()
            .fallback("Failed to create project");
        self.client.fetch(call).await
    }

    /// Partial update (`PATCH`).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty patch, otherwise as [`create`](Self::create).
    pub async fn update(&self, id: i64, patch: &ProjectUpdate) -> Result<Option<Project>> {
        if patch.is_empty() {
            return Err(Error::InvalidArgument("nothing to update".to_string()));
        }
        let call = Call::patch(format!("/projects/{id}"))
            .json(patch)?
            .requires_identity()
            .fallback("Failed to update project");
        self.client.fetch(call).await
    }

    /// Full replacement (`PUT`).
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create).
    pub async fn replace(&self, id: i64, body: &ProjectUpdate) -> Result<Option<Project>> {
        let call = Call::put(format!("/projects/{id}"))
            .json(body)?
            .requires_identity()
            .fallback("Failed to update project");
        self.client.fetch(call).await
    }

    /// Delete a project (and, server-side, its tasks).
    ///
    /// # Errors
    ///
    /// `MissingIdentity` without a user id; `Http` 404 when already gone.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let call = Call::delete(format!("/projects/{id}"))
            .requires_identity()
            .fallback("Failed to delete project");
        self.client.send(call).await
    }

    /// AI summary of the project's tasks within `scope`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a single-task scope; `Http` 503 when AI is
    /// disabled on the backend.
    pub async fn summary(&self, scope: &AiScope) -> Result<Option<ProjectSummary>> {
        let AiScope::Project {
            project_id,
            task_ids,
            include_done,
        } = scope
        else {
            return Err(Error::InvalidArgument(
                "a project summary needs a project scope".to_string(),
            ));
        };

        let call = Call::post(format!("/projects/{project_id}/ai/summary"))
            .json(&ScopedSummaryRequest {
                task_ids: task_ids.clone(),
                include_done: *include_done,
            })?
            .fallback("Failed to summarize project");
        self.client.fetch(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ScriptedTransport, client_with, project_json, signed_in_client};
    use super::super::Method;
    use super::*;
    use crate::model::SelectionScope;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_list_sends_both_headers_once_signed_in() {
        let body = serde_json::json!([project_json(1, "Apollo")]).to_string();
        let (client, transport) = signed_in_client(ScriptedTransport::new().respond(200, &body), 7);

        let projects = client.projects().list().await.unwrap();
        assert_eq!(projects.len(), 1);

        let request = transport.last_request();
        assert_eq!(request.header("Authorization"), Some("Bearer test-token"));
        assert_eq!(request.header("X-User-Id"), Some("7"));
    }

    #[tokio::test]
    async fn test_list_works_anonymously() {
        let (client, transport) = client_with(ScriptedTransport::new().respond(200, "[]"));
        assert!(client.projects().list().await.unwrap().is_empty());
        assert!(transport.last_request().headers.is_empty());
    }

    #[tokio::test]
    async fn test_delete_needs_identity() {
        let (client, transport) = client_with(ScriptedTransport::new());
        client.session().save_token("t").unwrap();
        assert!(matches!(
            client.projects().delete(3).await,
            Err(Error::MissingIdentity)
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_delete_accepts_no_content() {
        let (client, transport) = signed_in_client(ScriptedTransport::new().respond(204, ""), 2);
        client.projects().delete(3).await.unwrap();
        assert_eq!(transport.requests_to(Method::Delete, "/projects/3").len(), 1);
    }

    #[tokio::test]
    async fn test_update_without_body_is_not_an_error() {
        let (client, _) = signed_in_client(ScriptedTransport::new().respond(204, ""), 2);
        let patch = ProjectUpdate {
            name: Some("Gemini".to_string()),
            ..ProjectUpdate::default()
        };
        assert_eq!(client.projects().update(3, &patch).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_patch_rejected() {
        let (client, transport) = signed_in_client(ScriptedTransport::new(), 2);
        assert!(client.projects().update(3, &ProjectUpdate::default()).await.is_err());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_summary_scope_body() {
        let transport = ScriptedTransport::new()
            .respond(200, r#"{"project_id": 4, "summary": "All good", "method": "placeholder"}"#);
        let (client, transport) = client_with(transport);

        let selected: BTreeSet<i64> = [5, 6].into_iter().collect();
        let scope = AiScope::for_selection(4, SelectionScope::Selected, &selected).unwrap();
        let summary = client.projects().summary(&scope).await.unwrap().unwrap();
        assert_eq!(summary.summary, "All good");

        let request = transport.last_request();
        assert_eq!(request.path, "/projects/4/ai/summary");
        assert_eq!(
            request.body,
            Some(serde_json::json!({"task_ids": [5, 6], "include_done": true}))
        );
    }

    #[tokio::test]
    async fn test_summary_ai_disabled() {
        let transport = ScriptedTransport::new()
            .respond(503, r#"{"detail": "AI functionality is disabled (set AI_ENABLED=true)"}"#);
        let (client, _) = client_with(transport);

        let scope = AiScope::for_selection(4, SelectionScope::All, &BTreeSet::new()).unwrap();
        let err = client.projects().summary(&scope).await.unwrap_err();
        assert_eq!(err.error_code(), crate::error::ErrorCode::AiUnavailable);
    }
}
