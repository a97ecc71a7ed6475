//! deskctl - typed client and CLI for the project desk backend.
//!
//! # Architecture
//!
//! - [`api`] - Backend calls behind a swappable [`api::Transport`]
//! - [`session`] - Token and identity kept between runs, request headers
//! - [`store`] - Key/value persistence (file or memory)
//! - [`prefs`] - Per-user local preferences with change notification
//! - [`view`] - Page state: project list, project detail, notification bell
//! - [`model`] - Data types (User, Project, Task, Notification, AI results)
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod prefs;
pub mod session;
pub mod store;
pub mod validate;
pub mod view;

pub use error::{Error, Result};

/// Global CSV output flag (set when `--format csv`).
pub static CSV_OUTPUT: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if CSV output is requested.
#[inline]
pub fn is_csv() -> bool {
    CSV_OUTPUT.load(std::sync::atomic::Ordering::Relaxed)
}

/// Escape a value for CSV output (wrap in quotes if it contains commas, quotes, or newlines).
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
