//! Data models for deskctl.
//!
//! Client-side copies of backend entities plus the request payloads built
//! from user input. None of these copies are authoritative:
//! - User / login responses
//! - Project
//! - Task (normalized on read)
//! - Notification
//! - AI scopes and results
//! - Preference bundle (local only)

pub mod ai;
pub mod notification;
pub mod preferences;
pub mod project;
pub mod task;
pub mod user;

pub use ai::{AiOutcome, AiScope, EffortEstimate, ProjectSummary, SelectionScope};
pub use notification::{Notification, UnreadCount};
pub use preferences::PreferenceBundle;
pub use project::{Project, ProjectCreate, ProjectDraft, ProjectUpdate};
pub use task::{Level, Task, TaskCreate, TaskDraft, TaskStatus, TaskUpdate, merge_by_id};
pub use user::{LoginResponse, MessageResponse, User};

/// Trim a free-text field, mapping blank input to `None`.
pub(crate) fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Render a backend timestamp for humans.
///
/// The backend sends naive ISO datetimes (no offset) or RFC 3339; anything
/// else is shown as-is.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed() {
        assert_eq!(trimmed(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(trimmed(Some("   ")), None);
        assert_eq!(trimmed(None), None);
    }

    #[test]
    fn test_format_timestamp_variants() {
        assert_eq!(format_timestamp("2025-03-01T10:20:30.123456"), "2025-03-01 10:20");
        assert_eq!(format_timestamp("2025-03-01T10:20:30+00:00"), "2025-03-01 10:20");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
