//! AI helper scopes and results.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::task::{Task, merge_by_id};

/// What an AI action operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiScope {
    /// One task.
    Task(i64),
    /// A project's tasks, optionally narrowed to explicit ids.
    Project {
        project_id: i64,
        task_ids: Option<Vec<i64>>,
        include_done: bool,
    },
}

impl AiScope {
    /// Project-wide scope from a selection mode and the current selection.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the mode is `Selected` but nothing is selected.
    pub fn for_selection(
        project_id: i64,
        mode: SelectionScope,
        selected: &BTreeSet<i64>,
    ) -> Result<Self> {
        match mode {
            SelectionScope::Open => Ok(Self::Project {
                project_id,
                task_ids: None,
                include_done: false,
            }),
            SelectionScope::All => Ok(Self::Project {
                project_id,
                task_ids: None,
                include_done: true,
            }),
            SelectionScope::Selected => {
                if selected.is_empty() {
                    return Err(Error::InvalidArgument(
                        "scope 'selected' needs at least one selected task".to_string(),
                    ));
                }
                Ok(Self::Project {
                    project_id,
                    task_ids: Some(selected.iter().copied().collect()),
                    include_done: true,
                })
            }
        }
    }

    /// Whether `task` falls inside this scope.
    #[must_use]
    pub fn contains(&self, task: &Task) -> bool {
        match self {
            Self::Task(id) => task.id == *id,
            Self::Project {
                project_id,
                task_ids,
                include_done,
            } => {
                task.project_id == *project_id
                    && (*include_done || !task.is_done())
                    && task_ids.as_ref().is_none_or(|ids| ids.contains(&task.id))
            }
        }
    }
}

/// Selection mode offered by the AI panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SelectionScope {
    /// Tasks that are not done
    #[default]
    Open,
    /// Every task in the project
    All,
    /// Only the selected task ids
    Selected,
}

/// Body of `POST /tasks/ai/generate-descriptions`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateDescriptionsRequest {
    pub project_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<Vec<i64>>,
    pub include_done: bool,
}

/// Body of `POST /tasks/ai/project-summary`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummaryRequest {
    pub project_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<Vec<i64>>,
    pub include_done: bool,
}

/// Body of `POST /projects/{id}/ai/summary` (project id is in the path).
#[derive(Debug, Clone, Serialize)]
pub struct ScopedSummaryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<Vec<i64>>,
    pub include_done: bool,
}

/// Body of `POST /tasks/{id}/estimate`.
#[derive(Debug, Clone, Serialize)]
pub struct EffortEstimateRequest {
    pub include_history: bool,
    pub max_history_tasks: u32,
}

impl Default for EffortEstimateRequest {
    fn default() -> Self {
        Self {
            include_history: true,
            max_history_tasks: 20,
        }
    }
}

/// Body of `POST /tasks/ai/estimate-effort`.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateEffortBatchRequest {
    pub project_id: i64,
    pub include_history: bool,
    pub max_history_tasks: u32,
}

/// Effort estimate for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortEstimate {
    pub task_id: i64,
    pub project_id: i64,
    pub story_points: i64,
    /// 0..1
    #[serde(default)]
    pub confidence: f64,
    /// openai | placeholder | local
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub rationale: String,
}

impl EffortEstimate {
    /// Apply this estimate to the matching task in `tasks`.
    pub fn apply_to(&self, tasks: &mut [Task]) -> bool {
        match tasks.iter_mut().find(|t| t.id == self.task_id) {
            Some(task) => {
                task.story_points = Some(self.story_points);
                task.ai_confidence = Some(self.confidence);
                task.source = Some(self.method.clone());
                true
            }
            None => false,
        }
    }
}

/// AI summary of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: i64,
    pub summary: String,
    #[serde(default)]
    pub method: String,
}

/// Result of an AI action: one updated task or a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum AiOutcome {
    Single(Task),
    Batch(Vec<Task>),
}

impl AiOutcome {
    /// Replace the matching entries of `tasks`; returns how many changed.
    pub fn merge_into(self, tasks: &mut [Task]) -> usize {
        match self {
            Self::Single(task) => merge_by_id(tasks, [task]),
            Self::Batch(batch) => merge_by_id(tasks, batch),
        }
    }

    /// Number of records returned by the backend.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(batch) => batch.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, status: &str) -> Task {
        serde_json::from_value(serde_json::json!({
            "id": id, "title": "t", "status": status, "project_id": 1
        }))
        .unwrap()
    }

    #[test]
    fn test_open_scope_excludes_done() {
        let scope = AiScope::for_selection(1, SelectionScope::Open, &BTreeSet::new()).unwrap();
        assert!(scope.contains(&task(1, "todo")));
        assert!(!scope.contains(&task(2, "done")));
    }

    #[test]
    fn test_selected_scope() {
        let selected: BTreeSet<i64> = [2].into_iter().collect();
        let scope = AiScope::for_selection(1, SelectionScope::Selected, &selected).unwrap();
        assert!(scope.contains(&task(2, "done")));
        assert!(!scope.contains(&task(3, "todo")));

        assert!(AiScope::for_selection(1, SelectionScope::Selected, &BTreeSet::new()).is_err());
    }

    #[test]
    fn test_estimate_apply() {
        let mut tasks = vec![task(1, "todo")];
        let estimate = EffortEstimate {
            task_id: 1,
            project_id: 1,
            story_points: 5,
            confidence: 0.7,
            method: "placeholder".to_string(),
            rationale: String::new(),
        };
        assert!(estimate.apply_to(&mut tasks));
        assert_eq!(tasks[0].story_points, Some(5));
    }

    #[test]
    fn test_outcome_merges_by_id() {
        let mut tasks = vec![task(1, "todo"), task(2, "todo")];
        let mut fresh = task(2, "todo");
        fresh.description = Some("generated".to_string());

        assert_eq!(AiOutcome::Batch(vec![fresh, task(9, "todo")]).merge_into(&mut tasks), 1);
        assert_eq!(tasks[1].description.as_deref(), Some("generated"));
        assert!(AiOutcome::Batch(Vec::new()).is_empty());
    }

    #[test]
    fn test_generate_request_omits_absent_ids() {
        let body = GenerateDescriptionsRequest {
            project_id: 1,
            task_ids: None,
            include_done: false,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"project_id": 1, "include_done": false})
        );
    }
}
