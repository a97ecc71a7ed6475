//! Project detail page: project record, task list and AI panel.
//!
//! The project and its tasks load independently. Task loads are tagged with
//! a [`LoadTicket`]; every new load (and every project switch) bumps the
//! generation, and a result carrying an older ticket is dropped, so a slow
//! response for project A can never overwrite the list of project B.
//!
//! AI actions share one busy flag: while an action runs every other AI
//! action is refused. The flag is released when the action finishes or its
//! future is dropped. A page that follows the user's preferences also
//! refuses AI actions while `ai_suggestions` is off, picking up changes
//! published by the [`PreferenceStore`] before each action.
//!
//! A mutation whose reply carries no record still counts as done; the task
//! list is reloaded either way.

use super::{Feedback, LoadState};
use crate::api::{ApiClient, Transport};
use crate::error::{Error, Result};
use crate::model::{
    AiScope, EffortEstimate, Project, ProjectSummary, SelectionScope, Task, TaskDraft, TaskStatus,
    TaskUpdate,
};
use crate::prefs::{PreferenceStore, PreferenceWatcher};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Identifies one task-list load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub project_id: i64,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct ProjectDetail {
    project_id: i64,
    generation: u64,
    pub project: LoadState<Project>,
    pub tasks: LoadState<Vec<Task>>,
    busy: bool,
    selection: BTreeSet<i64>,
    feedback: Option<Feedback>,
    summary: Option<ProjectSummary>,
    preferences: Option<PreferenceWatcher>,
    ai_disabled: bool,
}

impl ProjectDetail {
    #[must_use]
    pub fn new(project_id: i64) -> Self {
        Self {
            project_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn selection(&self) -> &BTreeSet<i64> {
        &self.selection
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    #[must_use]
    pub fn summary(&self) -> Option<&ProjectSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn ai_enabled(&self) -> bool {
        !self.ai_disabled
    }

    /// Follow the preferences of `identity`. AI actions are refused while
    /// its `ai_suggestions` is off. Without an identity nothing is followed.
    ///
    /// # Errors
    ///
    /// Store errors.
    pub fn follow_preferences(&mut self, prefs: &PreferenceStore, identity: Option<&str>) -> Result<()> {
        // Subscribe before reading so no change slips in between
        self.preferences = prefs.watch(identity);
        if let Some(bundle) = prefs.load(identity)? {
            self.ai_disabled = !bundle.ai_suggestions;
        }
        Ok(())
    }

    fn sync_preferences(&mut self) {
        let Some(watcher) = self.preferences.as_mut() else {
            return;
        };
        match watcher.try_changed() {
            Ok(Some(bundle)) => {
                debug!(ai_suggestions = bundle.ai_suggestions, "Preferences changed");
                self.ai_disabled = !bundle.ai_suggestions;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Cannot re-read preferences"),
        }
    }

    /// Show another project. In-flight loads for the old one become stale.
    pub fn switch_project(&mut self, project_id: i64) {
        if project_id == self.project_id {
            return;
        }
        debug!(from = self.project_id, to = project_id, "Switching project");
        self.project_id = project_id;
        self.generation += 1;
        self.project = LoadState::Idle;
        self.tasks = LoadState::Idle;
        self.selection.clear();
        self.feedback = None;
        self.summary = None;
    }

    // ── Loading ──────────────────────────────────────────────

    /// Load the project record and its tasks.
    ///
    /// Both loads always run; a failing project lookup does not leave the
    /// task list idle.
    ///
    /// # Errors
    ///
    /// The first failure. Each outcome is recorded in its own state.
    pub async fn load<T: Transport>(&mut self, api: &ApiClient<T>) -> Result<()> {
        self.project = LoadState::Loading;
        let project_id = self.project_id;
        let result = api.projects().get(project_id).await.and_then(|project| {
            project.ok_or_else(|| Error::Other(format!("Project #{project_id} returned no data")))
        });
        let project = self.project.settle(result);
        let tasks = self.load_tasks(api).await;
        project.and(tasks)
    }

    /// Start a task-list load and get its ticket.
    pub fn begin_task_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.tasks = LoadState::Loading;
        LoadTicket {
            project_id: self.project_id,
            generation: self.generation,
        }
    }

    /// Apply the result of the load identified by `ticket`.
    ///
    /// Returns `Ok(false)` when the ticket is stale; the result (error or
    /// not) is then dropped without touching the state.
    ///
    /// # Errors
    ///
    /// The load error of a current ticket.
    pub fn apply_task_load(&mut self, ticket: LoadTicket, result: Result<Vec<Task>>) -> Result<bool> {
        if ticket.project_id != self.project_id || ticket.generation != self.generation {
            warn!(
                project_id = ticket.project_id,
                current = self.project_id,
                "Discarding stale task list"
            );
            return Ok(false);
        }
        self.tasks.settle(result)?;
        // Selection only holds tasks that still exist
        if let Some(tasks) = self.tasks.value() {
            self.selection.retain(|id| tasks.iter().any(|t| t.id == *id));
        }
        Ok(true)
    }

    /// Load (or reload) the task list.
    ///
    /// # Errors
    ///
    /// `Transport` / `Http`, also recorded as `LoadState::Error`.
    pub async fn load_tasks<T: Transport>(&mut self, api: &ApiClient<T>) -> Result<()> {
        let ticket = self.begin_task_load();
        let result = api.tasks().list_by_project(ticket.project_id).await;
        self.apply_task_load(ticket, result).map(|_| ())
    }

    // ── Task mutations ───────────────────────────────────────

    /// Create a task from the form, then reload the list.
    ///
    /// # Errors
    ///
    /// `RequiredField` for a blank title (nothing is sent), else the
    /// backend error.
    pub async fn create_task<T: Transport>(&mut self, api: &ApiClient<T>, draft: &TaskDraft) -> Result<Option<Task>> {
        let result = api.tasks().create(self.project_id, draft).await;
        let task = self.record(result, |t| match t {
            Some(t) => format!("Task '{}' created", t.title),
            None => "Task created".to_string(),
        })?;
        self.load_tasks(api).await?;
        Ok(task)
    }

    /// Patch a task, then reload the list.
    ///
    /// # Errors
    ///
    /// Validation or backend errors.
    pub async fn update_task<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        task_id: i64,
        patch: TaskUpdate,
    ) -> Result<Option<Task>> {
        let result = api.tasks().update(task_id, patch).await;
        let task = self.record(result, |_| format!("Task #{task_id} updated"))?;
        self.load_tasks(api).await?;
        Ok(task)
    }

    /// Move a task to `status`, then reload the list.
    ///
    /// # Errors
    ///
    /// Backend errors.
    pub async fn set_status<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Option<Task>> {
        let result = api.tasks().set_status(task_id, status).await;
        let task = self.record(result, |_| format!("Task #{task_id} is now {status}"))?;
        self.load_tasks(api).await?;
        Ok(task)
    }

    /// Delete a task, then reload the list.
    ///
    /// # Errors
    ///
    /// Backend errors.
    pub async fn delete_task<T: Transport>(&mut self, api: &ApiClient<T>, task_id: i64) -> Result<()> {
        let result = api.tasks().delete(task_id).await;
        self.record(result, |_| format!("Task #{task_id} deleted"))?;
        self.selection.remove(&task_id);
        self.load_tasks(api).await
    }

    // ── Selection ────────────────────────────────────────────

    /// Toggle a task in the selection; returns whether it is now selected.
    pub fn toggle_selected(&mut self, task_id: i64) -> bool {
        if self.selection.remove(&task_id) {
            false
        } else {
            self.selection.insert(task_id);
            true
        }
    }

    pub fn select(&mut self, ids: impl IntoIterator<Item = i64>) {
        self.selection.extend(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Resolve a selection mode against the current selection.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for `Selected` with nothing selected.
    pub fn scope(&self, mode: SelectionScope) -> Result<AiScope> {
        AiScope::for_selection(self.project_id, mode, &self.selection)
    }

    // ── AI panel ─────────────────────────────────────────────

    /// Generate a description for one task.
    ///
    /// # Errors
    ///
    /// Busy, or the backend error (also shown as feedback).
    pub async fn describe_task<T: Transport>(&mut self, api: &ApiClient<T>, task_id: i64) -> Result<Option<Task>> {
        self.begin_ai()?;
        let busy = BusyGuard(&mut self.busy);
        let result = api.tasks().generate_description(task_id).await;
        drop(busy);

        let task = self.record(result, |t| match t {
            Some(t) => format!("Description generated for '{}'", t.title),
            None => format!("Description generated for task #{task_id}"),
        })?;
        if let (Some(tasks), Some(task)) = (self.tasks.value_mut(), &task) {
            crate::model::merge_by_id(tasks, [task.clone()]);
        }
        Ok(task)
    }

    /// Generate descriptions for every task in `mode`.
    ///
    /// Returns how many loaded tasks were updated.
    ///
    /// # Errors
    ///
    /// Busy, an empty selection, or the backend error.
    pub async fn describe_scope<T: Transport>(&mut self, api: &ApiClient<T>, mode: SelectionScope) -> Result<usize> {
        let scope = self.scope(mode)?;
        self.begin_ai()?;
        let busy = BusyGuard(&mut self.busy);
        let result = api.tasks().generate_descriptions(&scope).await;
        drop(busy);

        let outcome = self.record(result, |o| format!("Generated descriptions for {} task(s)", o.len()))?;
        Ok(self.tasks.value_mut().map_or(0, |tasks| outcome.merge_into(tasks)))
    }

    /// Estimate one task.
    ///
    /// # Errors
    ///
    /// Busy, or the backend error (409 for a done task).
    pub async fn estimate_task<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        task_id: i64,
    ) -> Result<Option<EffortEstimate>> {
        self.begin_ai()?;
        let busy = BusyGuard(&mut self.busy);
        let result = api.tasks().estimate(task_id).await;
        drop(busy);

        let estimate = self.record(result, |e| match e {
            Some(e) => format!("Task #{} estimated at {} point(s)", e.task_id, e.story_points),
            None => format!("Task #{task_id} estimated"),
        })?;
        if let (Some(tasks), Some(estimate)) = (self.tasks.value_mut(), &estimate) {
            estimate.apply_to(tasks);
        }
        Ok(estimate)
    }

    /// Estimate every loaded task inside `mode`, one request per task.
    ///
    /// Failures are caught per task and leave that task unchanged. Returns
    /// the estimates that succeeded.
    ///
    /// # Errors
    ///
    /// Busy, an empty selection, or tasks not loaded.
    pub async fn estimate_scope<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        mode: SelectionScope,
    ) -> Result<Vec<EffortEstimate>> {
        let scope = self.scope(mode)?;
        let candidates: Vec<i64> = self
            .tasks
            .value()
            .ok_or_else(|| Error::Other("Tasks are not loaded yet".to_string()))?
            .iter()
            .filter(|t| scope.contains(t))
            .map(|t| t.id)
            .collect();

        if candidates.is_empty() {
            self.feedback = Some(Feedback::info("No tasks in scope"));
            return Ok(Vec::new());
        }

        self.begin_ai()?;
        let busy = BusyGuard(&mut self.busy);
        let mut estimates = Vec::with_capacity(candidates.len());
        let mut failed = 0usize;
        for task_id in &candidates {
            match api.tasks().estimate(*task_id).await {
                Ok(Some(estimate)) => {
                    if let Some(tasks) = self.tasks.value_mut() {
                        estimate.apply_to(tasks);
                    }
                    estimates.push(estimate);
                }
                Ok(None) => debug!(task_id, "Estimate reply had no body"),
                Err(e) => {
                    warn!(task_id, error = %e, "Estimate failed");
                    failed += 1;
                }
            }
        }
        drop(busy);

        self.feedback = Some(if failed == 0 {
            Feedback::success(format!("Estimated {} task(s)", estimates.len()))
        } else {
            Feedback::error(format!(
                "Estimated {} of {} task(s); {failed} failed",
                estimates.len(),
                candidates.len()
            ))
        });
        Ok(estimates)
    }

    /// Summarize the tasks in `mode`.
    ///
    /// # Errors
    ///
    /// Busy, an empty selection, or the backend error (503 when AI is off).
    pub async fn summarize<T: Transport>(
        &mut self,
        api: &ApiClient<T>,
        mode: SelectionScope,
    ) -> Result<Option<ProjectSummary>> {
        let scope = self.scope(mode)?;
        self.begin_ai()?;
        let busy = BusyGuard(&mut self.busy);
        let result = api.tasks().project_summary(&scope).await;
        drop(busy);

        let summary = self.record(result, |s| match s {
            Some(_) => "Summary ready".to_string(),
            None => "Summary came back empty".to_string(),
        })?;
        self.summary.clone_from(&summary);
        Ok(summary)
    }

    /// Mark the AI panel busy.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` while AI suggestions are turned off, `Other` when
    /// an AI action is already running.
    pub fn begin_ai(&mut self) -> Result<()> {
        self.sync_preferences();
        if self.ai_disabled {
            let message = "AI suggestions are turned off (deskctl prefs set ai_suggestions on)";
            self.feedback = Some(Feedback::error(message));
            return Err(Error::InvalidArgument(message.to_string()));
        }
        if self.busy {
            return Err(Error::Other("Another AI action is still running".to_string()));
        }
        self.busy = true;
        self.feedback = Some(Feedback::info("Working..."));
        Ok(())
    }

    /// Replace the feedback with the outcome of an action.
    ///
    /// Also releases the AI busy flag.
    fn record<R>(&mut self, result: Result<R>, describe: impl FnOnce(&R) -> String) -> Result<R> {
        self.busy = false;
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

/// Clears the busy flag when dropped, including when the action's future
/// is dropped mid-request.
struct BusyGuard<'a>(&'a mut bool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
