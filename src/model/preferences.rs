//! Local-only preference bundle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user settings kept by the client only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceBundle {
    /// Preferred stack label, prefilled into new projects
    #[serde(default)]
    pub preferred_stack: String,

    #[serde(default = "default_true")]
    pub ai_suggestions: bool,

    #[serde(default = "default_true")]
    pub email_notifications: bool,

    /// When the bundle was first created for this user
    pub joined_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl PreferenceBundle {
    /// Defaults stamped with `joined_at`.
    #[must_use]
    pub fn new(joined_at: DateTime<Utc>) -> Self {
        Self {
            preferred_stack: String::new(),
            ai_suggestions: true,
            email_notifications: true,
            joined_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let now = Utc::now();
        let bundle = PreferenceBundle::new(now);
        assert!(bundle.ai_suggestions);
        assert!(bundle.email_notifications);
        assert!(bundle.preferred_stack.is_empty());
        assert_eq!(bundle.joined_at, now);
    }

    #[test]
    fn test_missing_toggles_default_on() {
        let bundle: PreferenceBundle =
            serde_json::from_str(r#"{"joined_at": "2025-01-01T00:00:00Z"}"#).unwrap();
        assert!(bundle.ai_suggestions);
    }
}
