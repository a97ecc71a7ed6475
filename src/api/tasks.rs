//! `/tasks` routes, including the AI helpers.
//!
//! Form payloads are validated before anything is sent: a create with a
//! blank title never reaches the wire.

use super::{ApiClient, Call, Transport};
use crate::error::{Error, Result};
use crate::model::ai::{
    EffortEstimateRequest, EstimateEffortBatchRequest, GenerateDescriptionsRequest,
    ProjectSummaryRequest,
};
use crate::model::{AiOutcome, AiScope, EffortEstimate, ProjectSummary, Task, TaskDraft, TaskStatus, TaskUpdate};

/// Task service, borrowed from an [`ApiClient`].
pub struct Tasks<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> Tasks<'a, T> {
    pub(super) fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    /// Tasks of one project, normalized.
    ///
    /// # Errors
    ///
    /// `Transport` or `Http`.
    pub async fn list_by_project(&self, project_id: i64) -> Result<Vec<Task>> {
        self.client
            .fetch_list(Call::get(format!("/tasks/project/{project_id}")).fallback("Failed to load tasks"))
            .await
    }

    /// One task by id.
    ///
    /// # Errors
    ///
    /// `Http` 404 when it does not exist.
    pub async fn get(&self, id: i64) -> Result<Option<Task>> {
        self.client
            .fetch(Call::get(format!("/tasks/{id}")).fallback("Failed to load task"))
            .await
    }

    /// Create a task in `project_id` from form input.
    ///
    /// `None` when the backend accepted it without echoing the record.
    ///
    /// # Errors
    ///
    /// `RequiredField` for a blank title, `MissingIdentity` without a user id.
    pub async fn create(&self, project_id: i64, draft: &TaskDraft) -> Result<Option<Task>> {
        let body = draft.validate(project_id)?;
        let call = Call::post("/tasks/")
            .json(&body)?
            .requires_identity()
            .fallback("Failed to create task");
        self.client.fetch(call).await
    }

    /// Partial update.
    ///
    /// # Errors
    ///
    /// `RequiredField` for a blank title, `InvalidArgument` for an empty patch.
    pub async fn update(&self, id: i64, patch: TaskUpdate) -> Result<Option<Task>> {
        let patch = patch.validate()?;
        let call = Call::patch(format!("/tasks/{id}"))
            .json(&patch)?
            .requires_identity()
            .fallback("Failed to update task");
        self.client.fetch(call).await
    }

    /// Move a task to `status`.
    ///
    /// # Errors
    ///
    /// `MissingIdentity` without a user id; `Http` on rejection.
    pub async fn set_status(&self, id: i64, status: TaskStatus) -> Result<Option<Task>> {
        let call = Call::patch(format!("/tasks/{id}/status"))
            .query("status", status)
            .requires_identity()
            .fallback("Failed to update task status");
        self.client.fetch(call).await
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// `MissingIdentity` without a user id; `Http` 404 when already gone.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let call = Call::delete(format!("/tasks/{id}"))
            .requires_identity()
            .fallback("Failed to delete task");
        self.client.send(call).await
    }

    /// Estimate story points for one task using project history.
    ///
    /// # Errors
    ///
    /// `Http` 409 for a done task, 503 when AI is disabled.
    pub async fn estimate(&self, task_id: i64) -> Result<Option<EffortEstimate>> {
        let call = Call::post(format!("/tasks/{task_id}/estimate"))
            .json(&EffortEstimateRequest::default())?
            .fallback("Failed to estimate task");
        self.client.fetch(call).await
    }

    /// Generate a description for one task.
    ///
    /// # Errors
    ///
    /// `Http` 503 when AI is disabled.
    pub async fn generate_description(&self, task_id: i64) -> Result<Option<Task>> {
        let call = Call::post(format!("/tasks/{task_id}/ai-description"))
            .fallback("Failed to generate description");
        self.client.fetch(call).await
    }

    /// Generate descriptions for every task in `scope`.
    ///
    /// # Errors
    ///
    /// As [`generate_description`](Self::generate_description).
    pub async fn generate_descriptions(&self, scope: &AiScope) -> Result<AiOutcome> {
        match scope {
            AiScope::Task(id) => Ok(match self.generate_description(*id).await? {
                Some(task) => AiOutcome::Single(task),
                None => AiOutcome::Batch(Vec::new()),
            }),
            AiScope::Project {
                project_id,
                task_ids,
                include_done,
            } => {
                let call = Call::post("/tasks/ai/generate-descriptions")
                    .json(&GenerateDescriptionsRequest {
                        project_id: *project_id,
                        task_ids: task_ids.clone(),
                        include_done: *include_done,
                    })?
                    .fallback("Failed to generate descriptions");
                self.client.fetch_list(call).await.map(AiOutcome::Batch)
            }
        }
    }

    /// Summary of the tasks in a project scope.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a single-task scope; `Http` 503 when AI is
    /// disabled.
    pub async fn project_summary(&self, scope: &AiScope) -> Result<Option<ProjectSummary>> {
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

        let call = Call::post("/tasks/ai/project-summary")
            .json(&ProjectSummaryRequest {
                project_id: *project_id,
                task_ids: task_ids.clone(),
                include_done: *include_done,
            })?
            .fallback("Failed to summarize project");
        self.client.fetch(call).await
    }

    /// Estimate every open task of a project in one backend call.
    ///
    /// # Errors
    ///
    /// `Http` 503 when AI is disabled.
    pub async fn estimate_effort_batch(&self, project_id: i64) -> Result<Vec<EffortEstimate>> {
        let defaults = EffortEstimateRequest::default();
        let call = Call::post("/tasks/ai/estimate-effort")
            .json(&EstimateEffortBatchRequest {
                project_id,
                include_history: defaults.include_history,
                max_history_tasks: defaults.max_history_tasks,
            })?
            .fallback("Failed to estimate tasks");
        self.client.fetch_list(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::Method;
    use super::super::testing::{ScriptedTransport, client_with, signed_in_client, task_json};
    use super::*;
    use crate::model::{Level, SelectionScope};
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_list_normalizes_records() {
        let body = serde_json::json!([
            {"id": 1, "title": "A", "status": "DONE", "priority": null, "project_id": 3,
             "estimated_story_points": 5, "created_at": ""},
            task_json(2, 3, "in_progress"),
        ])
        .to_string();
        let (client, transport) = client_with(ScriptedTransport::new().respond(200, &body));

        let tasks = client.tasks().list_by_project(3).await.unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Done);
        assert_eq!(tasks[0].priority, Level::Medium);
        assert_eq!(tasks[0].story_points, Some(5));
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
        assert_eq!(transport.last_request().path, "/tasks/project/3");
    }

    #[tokio::test]
    async fn test_create_blank_title_sends_nothing() {
        let (client, transport) = signed_in_client(ScriptedTransport::new(), 1);
        let draft = TaskDraft {
            title: "  ".to_string(),
            ..TaskDraft::default()
        };

        let err = client.tasks().create(3, &draft).await.unwrap_err();
        assert!(matches!(err, Error::RequiredField { field: "title" }));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_sends_identity_and_payload() {
        let body = task_json(10, 3, "todo").to_string();
        let (client, transport) = signed_in_client(ScriptedTransport::new().respond(200, &body), 4);
        let draft = TaskDraft {
            title: "Ship it".to_string(),
            ..TaskDraft::default()
        };

        let task = client.tasks().create(3, &draft).await.unwrap().unwrap();
        assert_eq!(task.id, 10);

        let request = transport.last_request();
        assert_eq!(request.header("X-User-Id"), Some("4"));
        let sent = request.body.unwrap();
        assert_eq!(sent["title"], "Ship it");
        assert_eq!(sent["project_id"], 3);
        assert_eq!(sent["priority"], "medium");
    }

    #[tokio::test]
    async fn test_update_with_no_content_resolves_empty() {
        let (client, transport) = signed_in_client(ScriptedTransport::new().respond(204, ""), 1);
        let patch = TaskUpdate {
            title: Some("Renamed".to_string()),
            ..TaskUpdate::default()
        };

        assert_eq!(client.tasks().update(1, patch).await.unwrap(), None);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_create_with_unparsable_body_resolves_empty() {
        let (client, _) = signed_in_client(ScriptedTransport::new().respond(200, "<html>ok</html>"), 1);
        let draft = TaskDraft {
            title: "Ship it".to_string(),
            ..TaskDraft::default()
        };

        assert_eq!(client.tasks().create(3, &draft).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_status_uses_query() {
        let body = task_json(2, 3, "done").to_string();
        let (client, transport) = signed_in_client(ScriptedTransport::new().respond(200, &body), 1);

        let task = client.tasks().set_status(2, TaskStatus::Done).await.unwrap().unwrap();
        assert!(task.is_done());

        let request = transport.last_request();
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.path, "/tasks/2/status");
        assert_eq!(request.query_param("status"), Some("done"));
    }

    #[tokio::test]
    async fn test_estimate_on_done_task_is_rejected() {
        let transport = ScriptedTransport::new()
            .respond(409, r#"{"detail": "Task is done; estimation is only for open tasks."}"#);
        let (client, transport) = client_with(transport);

        let err = client.tasks().estimate(1).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(
            transport.last_request().body,
            Some(serde_json::json!({"include_history": true, "max_history_tasks": 20}))
        );
    }

    #[tokio::test]
    async fn test_generate_descriptions_single_and_batch() {
        let single = task_json(1, 3, "todo").to_string();
        let batch = serde_json::json!([task_json(1, 3, "todo"), task_json(2, 3, "todo")]).to_string();
        let transport = ScriptedTransport::new()
            .route(Method::Post, "/tasks/1/ai-description", 200, &single)
            .route(Method::Post, "/tasks/ai/generate-descriptions", 200, &batch);
        let (client, transport) = client_with(transport);

        let one = client.tasks().generate_descriptions(&AiScope::Task(1)).await.unwrap();
        assert!(matches!(one, AiOutcome::Single(ref t) if t.id == 1));

        let scope = AiScope::for_selection(3, SelectionScope::Open, &BTreeSet::new()).unwrap();
        let many = client.tasks().generate_descriptions(&scope).await.unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(
            transport.last_request().body,
            Some(serde_json::json!({"project_id": 3, "include_done": false}))
        );
    }

    #[tokio::test]
    async fn test_project_summary_rejects_task_scope() {
        let (client, transport) = client_with(ScriptedTransport::new());
        assert!(client.tasks().project_summary(&AiScope::Task(1)).await.is_err());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_estimate_batch_body() {
        let body = r#"[{"task_id": 2, "project_id": 3, "story_points": 3, "confidence": 0.2,
                        "method": "placeholder", "rationale": "AI disabled"}]"#;
        let (client, transport) = client_with(ScriptedTransport::new().respond(200, body));

        let estimates = client.tasks().estimate_effort_batch(3).await.unwrap();
        assert_eq!(estimates[0].story_points, 3);
        assert_eq!(
            transport.last_request().body,
            Some(serde_json::json!({"project_id": 3, "include_history": true, "max_history_tasks": 20}))
        );
    }
}
