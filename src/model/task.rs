//! Task model.
//!
//! Records coming from the backend are normalized on deserialization:
//! status/priority/complexity are trimmed and lower-cased with unknown or
//! missing values replaced by their defaults (`todo`, `medium`), and
//! `story_points` is backfilled from `estimated_story_points`.

use crate::error::{Error, Result};
use crate::validate::{normalize_level, normalize_status};
use serde::{Deserialize, Serialize};

use super::trimmed;

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Lenient mapping for backend data: unknown or missing becomes `Todo`.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("in_progress") => Self::InProgress,
            Some("done") => Self::Done,
            _ => Self::Todo,
        }
    }

    /// Strict parse of user input, accepting synonyms (`wip`, `closed`, ...).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` with the closest suggestion when nothing matches.
    pub fn parse(input: &str) -> Result<Self> {
        normalize_status(input)
            .map(|canonical| Self::normalize(Some(&canonical)))
            .map_err(|(input, suggestion)| invalid("status", &input, suggestion))
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority / complexity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
}

impl Level {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Lenient mapping: unknown or missing becomes `Medium`.
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("low") => Self::Low,
            Some("high") => Self::High,
            _ => Self::Medium,
        }
    }

    /// Strict parse of user input. `what` names the field in errors.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the input is not a known level or synonym.
    pub fn parse(input: &str, what: &str) -> Result<Self> {
        normalize_level(input)
            .map(|canonical| Self::normalize(Some(&canonical)))
            .map_err(|(input, suggestion)| invalid(what, &input, suggestion))
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid(what: &str, input: &str, suggestion: Option<String>) -> Error {
    match suggestion {
        Some(s) => Error::InvalidArgument(format!("unknown {what} '{input}' (did you mean '{s}'?)")),
        None => Error::InvalidArgument(format!("unknown {what} '{input}'")),
    }
}

/// A task, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTask")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Level,
    pub complexity: Level,
    pub assignee: Option<String>,
    pub tags: Option<String>,
    /// Unified story points (either backend field)
    pub story_points: Option<i64>,
    pub ai_confidence: Option<f64>,
    pub ai_story: Option<String>,
    pub source: Option<String>,
    pub project_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl Task {
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// Wire shape accepted from the backend before normalization.
#[derive(Deserialize)]
struct RawTask {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    complexity: Option<String>,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    story_points: Option<i64>,
    #[serde(default)]
    estimated_story_points: Option<i64>,
    #[serde(default)]
    ai_confidence: Option<f64>,
    #[serde(default)]
    ai_story: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    project_id: i64,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<RawTask> for Task {
    fn from(raw: RawTask) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            status: TaskStatus::normalize(raw.status.as_deref()),
            priority: Level::normalize(raw.priority.as_deref()),
            complexity: Level::normalize(raw.complexity.as_deref()),
            assignee: raw.assignee,
            tags: raw.tags,
            story_points: raw.story_points.or(raw.estimated_story_points),
            ai_confidence: raw.ai_confidence,
            ai_story: raw.ai_story,
            source: raw.source,
            project_id: raw.project_id,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

/// Body of `POST /tasks/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskCreate {
    pub title: String,
    pub description: Option<String>,
    pub project_id: i64,
    pub priority: Level,
    pub complexity: Level,
    pub assignee: Option<String>,
    pub tags: Option<String>,
    pub source: String,
}

/// Body of `PATCH /tasks/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl TaskUpdate {
    /// Check the patch before sending it.
    ///
    /// # Errors
    ///
    /// `RequiredField` when a title is present but blank, `InvalidArgument`
    /// when nothing would change.
    pub fn validate(mut self) -> Result<Self> {
        if let Some(title) = self.title.as_deref() {
            let title = title.trim();
            if title.is_empty() {
                return Err(Error::RequiredField { field: "title" });
            }
            self.title = Some(title.to_string());
        }
        if self == Self::default() {
            return Err(Error::InvalidArgument("nothing to update".to_string()));
        }
        Ok(self)
    }
}

/// Raw task form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Level>,
    pub complexity: Option<Level>,
    pub assignee: Option<String>,
    pub tags: Option<String>,
}

impl TaskDraft {
    /// Validate and shape the form into a create payload for `project_id`.
    ///
    /// # Errors
    ///
    /// `RequiredField` when the title is blank.
    pub fn validate(&self, project_id: i64) -> Result<TaskCreate> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::RequiredField { field: "title" });
        }
        Ok(TaskCreate {
            title: title.to_string(),
            description: trimmed(self.description.as_deref()),
            project_id,
            priority: self.priority.unwrap_or_default(),
            complexity: self.complexity.unwrap_or_default(),
            assignee: trimmed(self.assignee.as_deref()),
            tags: trimmed(self.tags.as_deref()),
            source: "manual".to_string(),
        })
    }
}

/// Replace entries of `tasks` by id with the updated records.
///
/// Updates for ids not in the list are ignored; returns how many entries
/// were replaced.
pub fn merge_by_id(tasks: &mut [Task], updated: impl IntoIterator<Item = Task>) -> usize {
    let mut replaced = 0;
    for fresh in updated {
        if let Some(slot) = tasks.iter_mut().find(|t| t.id == fresh.id) {
            *slot = fresh;
            replaced += 1;
        }
    }
    replaced
}
