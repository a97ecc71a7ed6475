//! Local preference commands.
//!
//! Preferences never leave this machine; they are stored per user in the
//! state file.

use super::{Context, Globals, print_json};
use crate::cli::PrefsCommands;
use crate::error::{Error, Result};
use crate::model::PreferenceBundle;
use colored::Colorize;

/// Keys accepted by `deskctl prefs set`.
pub const PREFERENCE_KEYS: &[&str] = &["preferred_stack", "ai_suggestions", "email_notifications"];

/// One validated edit to a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    PreferredStack(String),
    AiSuggestions(bool),
    EmailNotifications(bool),
}

impl Edit {
    fn parse(key: &str, value: &str) -> Result<Self> {
        match key {
            "preferred_stack" => Ok(Self::PreferredStack(value.trim().to_string())),
            "ai_suggestions" => parse_toggle(key, value).map(Self::AiSuggestions),
            "email_notifications" => parse_toggle(key, value).map(Self::EmailNotifications),
            other => Err(Error::InvalidArgument(format!(
                "unknown preference '{other}' (expected one of: {})",
                PREFERENCE_KEYS.join(", ")
            ))),
        }
    }

    fn apply(self, bundle: &mut PreferenceBundle) {
        match self {
            Self::PreferredStack(stack) => bundle.preferred_stack = stack,
            Self::AiSuggestions(on) => bundle.ai_suggestions = on,
            Self::EmailNotifications(on) => bundle.email_notifications = on,
        }
    }
}

fn parse_toggle(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(Error::InvalidArgument(format!("{key} must be on or off, got '{value}'"))),
    }
}

/// Execute a preference command.
///
/// # Errors
///
/// `NotAuthenticated` when no user is known, `InvalidArgument` for a bad
/// key or value, store errors.
pub fn execute(command: &PrefsCommands, globals: &Globals<'_>) -> Result<()> {
    // Validate before touching the store
    let edit = match command {
        PrefsCommands::Set { key, value } => Some(Edit::parse(key, value)?),
        PrefsCommands::Show => None,
    };

    let ctx = Context::open(globals)?;
    let identity = ctx.api.session().identity_key()?;

    let bundle = match edit {
        Some(edit) => ctx.prefs.update(identity.as_deref(), |bundle| edit.apply(bundle))?,
        None => ctx.prefs.load(identity.as_deref())?,
    }
    .ok_or(Error::NotAuthenticated)?;

    if globals.json {
        return print_json(&bundle);
    }
    print_bundle(&bundle);
    Ok(())
}

fn print_bundle(bundle: &PreferenceBundle) {
    let toggle = |on: bool| if on { "on".green() } else { "off".red() };
    println!("{}", "Preferences".cyan().bold());
    let stack = if bundle.preferred_stack.is_empty() {
        "(none)"
    } else {
        bundle.preferred_stack.as_str()
    };
    println!("  preferred_stack:     {stack}");
    println!("  ai_suggestions:      {}", toggle(bundle.ai_suggestions));
    println!("  email_notifications: {}", toggle(bundle.email_notifications));
    println!("  Member since:        {}", bundle.joined_at.format("%Y-%m-%d"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_edits() {
        assert_eq!(
            Edit::parse("ai_suggestions", "OFF").unwrap(),
            Edit::AiSuggestions(false)
        );
        assert_eq!(
            Edit::parse("preferred_stack", "  Rust ").unwrap(),
            Edit::PreferredStack("Rust".to_string())
        );
        assert!(Edit::parse("email_notifications", "maybe").is_err());
        assert!(Edit::parse("theme", "dark").is_err());
    }

    #[test]
    fn test_apply_changes_one_field() {
        let mut bundle = PreferenceBundle::new(Utc::now());
        Edit::EmailNotifications(false).apply(&mut bundle);
        assert!(!bundle.email_notifications);
        assert!(bundle.ai_suggestions);
    }
}
