//! View state for the pages of the app.
//!
//! Each page owns its loaded data and the sequencing around it: load,
//! mutate, reload. None of them render anything; the CLI (or any other
//! front end) reads their state after each action.
//!
//! - [`projects`] - project list with create/update/confirmed delete
//! - [`project_detail`] - one project, its tasks and the AI panel
//! - [`notifications`] - notification bell with polling
//! - [`session`] - login, restore, logout

pub mod notifications;
pub mod project_detail;
pub mod projects;
pub mod session;

pub use notifications::NotificationBell;
pub use project_detail::{LoadTicket, ProjectDetail};
pub use projects::ProjectList;

use crate::error::Result;
use serde::Serialize;

/// Lifecycle of one piece of remote data.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> LoadState<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Record `result`, handing the error back to the caller.
    pub(crate) fn settle(&mut self, result: Result<T>) -> Result<()> {
        match result {
            Ok(value) => {
                *self = Self::Loaded(value);
                Ok(())
            }
            Err(e) => {
                *self = Self::Error(e.to_string());
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Message shown after a user action; the next action replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub severity: Severity,
    pub message: String,
}

impl Feedback {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_settle_records_both_outcomes() {
        let mut state: LoadState<i32> = LoadState::Loading;
        assert!(state.is_loading());
        state.settle(Ok(3)).unwrap();
        assert_eq!(state.value(), Some(&3));

        let err = state.settle(Err(Error::Other("boom".to_string()))).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(state.error(), Some("boom"));
        assert_eq!(state.value(), None);
    }
}
