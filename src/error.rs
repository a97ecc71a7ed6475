//! Error types for deskctl.
//!
//! Every failure reaching a view or the CLI is one of these variants and
//! carries a display-ready message. On top of that it provides:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=auth, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for deskctl operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Auth (exit 2)
    NotAuthenticated,
    MissingIdentity,
    Unauthorized,

    // Not Found (exit 3)
    NotFound,

    // Validation (exit 4)
    RequiredField,
    InvalidArgument,
    Rejected,

    // Backend (exit 5)
    HttpError,
    AiUnavailable,

    // Transport (exit 6)
    TransportError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::MissingIdentity => "MISSING_IDENTITY",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Rejected => "REJECTED",
            Self::HttpError => "HTTP_ERROR",
            Self::AiUnavailable => "AI_UNAVAILABLE",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotAuthenticated | Self::MissingIdentity | Self::Unauthorized => 2,
            Self::NotFound => 3,
            Self::RequiredField | Self::InvalidArgument | Self::Rejected => 4,
            Self::HttpError | Self::AiUnavailable => 5,
            Self::TransportError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a caller should retry with corrected input.
    ///
    /// Nothing is retried automatically; this only tells the caller that
    /// fixing the input (or logging in again) can make the call succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RequiredField
                | Self::InvalidArgument
                | Self::Rejected
                | Self::NotAuthenticated
                | Self::MissingIdentity
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in deskctl operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No bearer token in the session store.
    #[error("Not logged in")]
    NotAuthenticated,

    /// A write needs `X-User-Id` but the session has no user id.
    #[error("Missing user identity for this action, please log in again")]
    MissingIdentity,

    /// Non-2xx response; `message` is the normalized backend message.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(String),

    #[error("{field} is required")]
    RequiredField { field: &'static str },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error at {path}: {message}")]
    Store { path: PathBuf, message: String },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotAuthenticated => ErrorCode::NotAuthenticated,
            Self::MissingIdentity => ErrorCode::MissingIdentity,
            Self::Http { status, .. } => match *status {
                401 | 403 => ErrorCode::Unauthorized,
                404 => ErrorCode::NotFound,
                400 | 409 | 422 => ErrorCode::Rejected,
                503 => ErrorCode::AiUnavailable,
                _ => ErrorCode::HttpError,
            },
            Self::Transport(_) => ErrorCode::TransportError,
            Self::RequiredField { .. } => ErrorCode::RequiredField,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) | Self::Store { .. } => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// HTTP status of a backend error, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotAuthenticated => {
                Some("Log in first: deskctl auth login --email <email>".to_string())
            }
            Self::MissingIdentity => Some(
                "The session has a token but no cached user id.\n  \
                 Re-authenticate: deskctl auth logout && deskctl auth login --email <email>"
                    .to_string(),
            ),
            Self::Http { status: 401 | 403, .. } => Some(
                "The session may have expired. Run `deskctl auth login --email <email>` again.".to_string(),
            ),
            Self::Http { status: 503, .. } => Some(
                "AI helpers are disabled on the backend (AI_ENABLED is not true).".to_string(),
            ),
            Self::Transport(_) => Some(
                "Check that the backend is running and `--api-url` (or DESKCTL_API_URL) points at it."
                    .to_string(),
            ),
            Self::InvalidArgument(msg) => {
                if msg.contains("status") {
                    Some("Valid statuses: todo, in_progress, done".to_string())
                } else if msg.contains("priority") || msg.contains("complexity") {
                    Some("Valid levels: low, medium, high".to_string())
                } else if msg.contains("scope") {
                    Some("Valid scopes: open, all, selected".to_string())
                } else {
                    None
                }
            }
            Self::Config(_) => Some("Inspect the settings with `deskctl config show`.".to_string()),
            Self::Http { .. }
            | Self::RequiredField { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Store { .. }
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(status) = self.status() {
            obj["error"]["status"] = serde_json::Value::from(status);
        }
        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
