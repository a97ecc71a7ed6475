//! Project list page.

use super::{Feedback, LoadState};
use crate::api::{ApiClient, Transport};
use crate::error::{Error, Result};
use crate::model::{Project, ProjectDraft, ProjectUpdate};

/// Check the name typed into the delete dialog.
///
/// # Errors
///
/// `InvalidArgument` unless `typed` matches the project name (surrounding
/// whitespace ignored, case-sensitive).
pub fn confirm_delete(project: &Project, typed: &str) -> Result<()> {
    if typed.trim() == project.name.trim() {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "type the project name '{}' to confirm deletion",
            project.name
        )))
    }
}

#[derive(Debug, Default)]
pub struct ProjectList {
    pub projects: LoadState<Vec<Project>>,
    feedback: Option<Feedback>,
}

impl ProjectList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Loaded project by id.
    #[must_use]
    pub fn find(&self, id: i64) -> Option<&Project> {
        self.projects.value()?.iter().find(|p| p.id == id)
    }

    /// Load (or reload) the list.
    ///
    /// # Errors
    ///
    /// `Transport` / `Http`, also recorded as `LoadState::Error`.
    pub async fn load<T: Transport>(&mut self, api: &ApiClient<T>) -> Result<()> {
        self.projects = LoadState::Loading;
        let result = api.projects().list().await;
        self.projects.settle(result)
    }

    /// Validate the form, create the project, reload.
    ///
    /// # Errors
    ///
    /// Form validation errors (nothing sent) or the backend error.
    pub async fn create<T: Transport>(&mut self, api: &ApiClient<T>, draft: &ProjectDraft) -> Result<Option<Project>> {
        let result = match draft.validate() {
            Ok(body) => api.projects().create(&body).await,
            Err(e) => Err(e),
        };
        let project = self.record(result, |p| {
            let name = p.as_ref().map_or(draft.name.trim(), |p| p.name.as_str());
            format!("Project '{name}' created")
        })?;
        self.load(api).await?;
        Ok(project)
    }

    /// Patch a project, reload.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty patch, or the backend error.
    pub async fn update<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        id: i64,
        patch: &ProjectUpdate,
    ) -> Result<Option<Project>> {
        let result = api.projects().update(id, patch).await;
        let project = self.record(result, |p| match p {
            Some(p) => format!("Project '{}' updated", p.name),
            None => format!("Project #{id} updated"),
        })?;
        self.load(api).await?;
        Ok(project)
    }

    /// Delete after the name was typed back, reload.
    ///
    /// The project is looked up in the loaded list, or fetched when the
    /// list is not loaded.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the confirmation does not match, or the
    /// backend error.
    pub async fn delete<T: Transport>(&mut self, api: &ApiClient<T>, id: i64, typed_name: &str) -> Result<()> {
        let project = match self.find(id) {
            Some(project) => project.clone(),
            None => api
                .projects()
                .get(id)
                .await?
                .ok_or_else(|| Error::Other(format!("Project #{id} returned no data")))?,
        };

        let result = match confirm_delete(&project, typed_name) {
            Ok(()) => api.projects().delete(id).await,
            Err(e) => Err(e),
        };
        self.record(result, |_| format!("Project '{}' deleted", project.name))?;
        self.load(api).await
    }

    fn record<R>(&mut self, result: Result<R>, describe: impl FnOnce(&R) -> String) -> Result<R> {
        match result {
            Ok(value) => {
                self.feedback = Some(Feedback::success(describe(&value)));
                Ok(value)
            }
            Err(e) => {
                self.feedback = Some(Feedback::error(e.to_string()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::testing::{ScriptedTransport, project_json, signed_in_client};

    fn list_body(projects: &[(i64, &str)]) -> String {
        let list: Vec<_> = projects.iter().map(|(id, name)| project_json(*id, name)).collect();
        serde_json::Value::Array(list).to_string()
    }

    #[test]
    fn test_confirm_delete() {
        let project: Project = serde_json::from_value(project_json(1, "Apollo")).unwrap();
        assert!(confirm_delete(&project, " Apollo ").is_ok());
        assert!(confirm_delete(&project, "apollo").is_err());
        assert!(confirm_delete(&project, "").is_err());
    }

    #[tokio::test]
    async fn test_delete_then_reload() {
        let transport = ScriptedTransport::new()
            .respond(200, &list_body(&[(1, "Apollo"), (2, "Gemini")]))
            .respond(204, "")
            .respond(200, &list_body(&[(2, "Gemini")]));
        let (client, transport) = signed_in_client(transport, 5);

        let mut page = ProjectList::new();
        page.load(&client).await.unwrap();
        page.delete(&client, 1, "Apollo").await.unwrap();

        assert!(page.find(1).is_none());
        assert!(page.find(2).is_some());
        assert_eq!(transport.requests_to(Method::Delete, "/projects/1").len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_confirmation_sends_no_delete() {
        let transport = ScriptedTransport::new().respond(200, &list_body(&[(1, "Apollo")]));
        let (client, transport) = signed_in_client(transport, 5);

        let mut page = ProjectList::new();
        page.load(&client).await.unwrap();
        assert!(page.delete(&client, 1, "Gemini").await.is_err());
        assert!(transport.requests_to(Method::Delete, "/projects/1").is_empty());
        assert!(page.feedback().unwrap().message.contains("Apollo"));
    }

    #[tokio::test]
    async fn test_create_validates_then_reloads() {
        let transport = ScriptedTransport::new()
            .respond(200, &project_json(3, "Vostok").to_string())
            .respond(200, &list_body(&[(3, "Vostok")]));
        let (client, transport) = signed_in_client(transport, 5);

        let mut page = ProjectList::new();
        assert!(page.create(&client, &ProjectDraft::default()).await.is_err());
        assert!(transport.requests().is_empty());

        let draft = ProjectDraft {
            name: "Vostok".to_string(),
            ..ProjectDraft::default()
        };
        page.create(&client, &draft).await.unwrap();
        assert!(page.find(3).is_some());
        assert_eq!(transport.requests()[0].header("X-User-Id"), Some("5"));
    }

    #[tokio::test]
    async fn test_create_without_body_reloads() {
        let transport = ScriptedTransport::new()
            .respond(201, "")
            .respond(200, &list_body(&[(4, "Soyuz")]));
        let (client, _) = signed_in_client(transport, 5);

        let mut page = ProjectList::new();
        let draft = ProjectDraft {
            name: "Soyuz".to_string(),
            ..ProjectDraft::default()
        };
        assert_eq!(page.create(&client, &draft).await.unwrap(), None);
        assert_eq!(page.feedback().unwrap().message, "Project 'Soyuz' created");
        assert!(page.find(4).is_some());
    }
}
