//! Project model.
//!
//! Projects group tasks and carry the context (tech stack, infrastructure)
//! the AI helpers feed into their prompts.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::trimmed;

/// A project as returned by `/projects/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Free-form stack label (e.g. "Rust, Postgres")
    #[serde(default)]
    pub tech_stack: Option<String>,

    #[serde(default)]
    pub infrastructure: Option<String>,

    #[serde(default)]
    pub members_count: i64,

    #[serde(default)]
    pub start_date: String,

    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /projects/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCreate {
    pub name: String,
    pub description: Option<String>,
    pub tech_stack: Option<String>,
    pub infrastructure: Option<String>,
    pub members_count: i64,
    pub start_date: String,
}

/// Body of `PATCH`/`PUT /projects/{id}`. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

impl ProjectUpdate {
    /// True when no field would be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Full replacement body built from an existing project (used by PUT).
    #[must_use]
    pub fn replacing(project: &Project) -> Self {
        Self {
            name: Some(project.name.clone()),
            description: project.description.clone(),
            tech_stack: project.tech_stack.clone(),
            infrastructure: project.infrastructure.clone(),
            members_count: Some(project.members_count),
            start_date: Some(project.start_date.clone()).filter(|s| !s.is_empty()),
        }
    }
}

/// Raw project form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub name: String,
    pub description: Option<String>,
    pub tech_stack: Option<String>,
    pub infrastructure: Option<String>,
    /// Text as typed; blank means 0
    pub members_count: Option<String>,
    /// `YYYY-MM-DD`; blank means today
    pub start_date: Option<String>,
}

impl ProjectDraft {
    /// Validate and shape the form into a create payload.
    ///
    /// # Errors
    ///
    /// `RequiredField` for a blank name, `InvalidArgument` for a
    /// non-numeric member count or a malformed date.
    pub fn validate(&self) -> Result<ProjectCreate> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::RequiredField { field: "name" });
        }

        Ok(ProjectCreate {
            name: name.to_string(),
            description: trimmed(self.description.as_deref()),
            tech_stack: trimmed(self.tech_stack.as_deref()),
            infrastructure: trimmed(self.infrastructure.as_deref()),
            members_count: parse_members_count(self.members_count.as_deref())?.unwrap_or(0),
            start_date: parse_start_date(self.start_date.as_deref())?
                .unwrap_or_else(|| chrono::Local::now().date_naive())
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
                .unwrap_or_default(),
        })
    }
}

/// Coerce a members count typed as text.
///
/// # Errors
///
/// `InvalidArgument` when the text is not a non-negative integer.
pub fn parse_members_count(raw: Option<&str>) -> Result<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(n) if n >= 0 => Ok(Some(n)),
        _ => Err(Error::InvalidArgument(format!(
            "members count must be a non-negative number, got '{raw}'"
        ))),
    }
}

/// Parse a `YYYY-MM-DD` start date.
///
/// # Errors
///
/// `InvalidArgument` for anything that is not a calendar date.
pub fn parse_start_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Error::InvalidArgument(format!("start date must be YYYY-MM-DD, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> ProjectDraft {
        ProjectDraft {
            name: name.to_string(),
            ..ProjectDraft::default()
        }
    }

    #[test]
    fn test_validate_trims_and_defaults() {
        let mut d = draft("  Apollo ");
        d.description = Some("   ".to_string());
        d.tech_stack = Some(" Rust ".to_string());
        d.start_date = Some("2025-02-10".to_string());

        let body = d.validate().unwrap();
        assert_eq!(body.name, "Apollo");
        assert_eq!(body.description, None);
        assert_eq!(body.tech_stack.as_deref(), Some("Rust"));
        assert_eq!(body.members_count, 0);
        assert_eq!(body.start_date, "2025-02-10T00:00:00");
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        assert!(matches!(
            draft("  ").validate(),
            Err(Error::RequiredField { field: "name" })
        ));
    }

    #[test]
    fn test_members_count_coercion() {
        assert_eq!(parse_members_count(Some(" 4 ")).unwrap(), Some(4));
        assert_eq!(parse_members_count(Some("")).unwrap(), None);
        assert!(parse_members_count(Some("-1")).is_err());
        assert!(parse_members_count(Some("four")).is_err());
    }

    #[test]
    fn test_bad_start_date() {
        let mut d = draft("Apollo");
        d.start_date = Some("10/02/2025".to_string());
        assert!(matches!(d.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = ProjectUpdate {
            name: Some("New".to_string()),
            ..ProjectUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"name": "New"}));
        assert!(ProjectUpdate::default().is_empty());
    }

    #[test]
    fn test_project_parses_backend_shape() {
        let project: Project = serde_json::from_str(
            r#"{"id": 2, "name": "Apollo", "description": null, "tech_stack": "Rust",
                "infrastructure": null, "members_count": 3,
                "start_date": "2025-01-01T00:00:00", "created_at": "2025-01-01T09:00:00",
                "updated_at": null}"#,
        )
        .unwrap();
        assert_eq!(project.members_count, 3);
        assert_eq!(ProjectUpdate::replacing(&project).members_count, Some(3));
    }
}
