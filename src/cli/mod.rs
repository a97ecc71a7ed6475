//! CLI definitions using clap.

use crate::model::SelectionScope;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// deskctl - projects, tasks and AI helpers from the terminal
#[derive(Parser, Debug)]
#[command(name = "deskctl", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (default: config.json, then http://localhost:8000)
    #[arg(long, global = true, env = "DESKCTL_API_URL")]
    pub api_url: Option<String>,

    /// State file (default: ~/.deskctl/state.json, `:memory:` for none)
    #[arg(long, global = true, env = "DESKCTL_STORE")]
    pub store: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in, sign up and password recovery
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Task management
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// AI helpers over a project's tasks
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },

    /// Notifications
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },

    /// Local per-user preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Client configuration (~/.deskctl/config.json)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Auth Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(short, long, env = "DESKCTL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Register(RegisterArgs),

    /// Request a password reset email
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password with a reset token
    ResetPassword(ResetPasswordArgs),

    /// Show the signed-in user (re-validates the stored session)
    Whoami,

    /// Forget the stored session
    Logout,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub email: String,

    #[arg(short, long, env = "DESKCTL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Repeat the password
    #[arg(long)]
    pub confirm: String,
}

#[derive(Args, Debug)]
pub struct ResetPasswordArgs {
    /// Token from the reset email
    #[arg(short, long)]
    pub token: String,

    #[arg(short, long, env = "DESKCTL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Repeat the password
    #[arg(long)]
    pub confirm: String,
}

// ============================================================================
// Project Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List all projects
    List,

    /// Show a project and its tasks
    Show {
        /// Project ID
        id: i64,
    },

    /// Create a new project
    Create(ProjectCreateArgs),

    /// Update a project
    Update(ProjectUpdateArgs),

    /// Delete a project (type its name to confirm)
    Delete {
        /// Project ID
        id: i64,

        /// Project name, typed back (prompted on stdin when omitted)
        #[arg(long)]
        confirm: Option<String>,
    },

    /// AI summary of the project's tasks
    Summary(ScopeArgs),
}

#[derive(Args, Debug)]
pub struct ProjectCreateArgs {
    /// Project name
    pub name: String,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Tech stack label (defaults to your preferred stack)
    #[arg(long)]
    pub tech_stack: Option<String>,

    #[arg(long)]
    pub infrastructure: Option<String>,

    /// Number of members
    #[arg(long)]
    pub members: Option<String>,

    /// Start date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub start_date: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProjectUpdateArgs {
    /// Project ID
    pub id: i64,

    #[arg(short, long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub tech_stack: Option<String>,

    #[arg(long)]
    pub infrastructure: Option<String>,

    #[arg(long)]
    pub members: Option<String>,

    /// YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<String>,

    /// Send a full replacement (PUT) instead of a patch
    #[arg(long)]
    pub replace: bool,
}

/// Which of a project's tasks an AI action covers.
#[derive(Args, Debug)]
pub struct ScopeArgs {
    /// Project ID
    pub project: i64,

    #[arg(long, value_enum, default_value_t)]
    pub scope: SelectionScope,

    /// Task IDs for `--scope selected` (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub select: Vec<i64>,
}

// ============================================================================
// Task Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List a project's tasks
    List {
        /// Project ID
        #[arg(short, long)]
        project: i64,

        /// Only tasks with this status
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Create a task
    Create(TaskCreateArgs),

    /// Update a task
    Update(TaskUpdateArgs),

    /// Move a task to another status
    Status {
        /// Task ID
        id: i64,

        /// todo | in_progress | done
        status: String,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
    },

    /// Generate a description for one task
    Describe {
        /// Task ID
        id: i64,
    },

    /// Estimate story points for one task
    Estimate {
        /// Task ID
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct TaskCreateArgs {
    /// Task title
    pub title: String,

    /// Project ID
    #[arg(short, long)]
    pub project: i64,

    #[arg(short, long)]
    pub description: Option<String>,

    /// low | medium | high
    #[arg(long)]
    pub priority: Option<String>,

    /// low | medium | high
    #[arg(long)]
    pub complexity: Option<String>,

    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Comma-separated tags
    #[arg(short, long)]
    pub tags: Option<String>,
}

#[derive(Args, Debug)]
pub struct TaskUpdateArgs {
    /// Task ID
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// todo | in_progress | done
    #[arg(short, long)]
    pub status: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub complexity: Option<String>,

    #[arg(short, long)]
    pub assignee: Option<String>,

    #[arg(short, long)]
    pub tags: Option<String>,
}

// ============================================================================
// AI Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum AiCommands {
    /// Generate descriptions for the tasks in scope
    Describe(ScopeArgs),

    /// Estimate story points for the tasks in scope
    Estimate {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Let the backend estimate every open task in one request
        #[arg(long, conflicts_with_all = ["scope", "select"])]
        batch: bool,
    },

    /// Summarize the tasks in scope
    Summary(ScopeArgs),
}

// ============================================================================
// Notification Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// Recent notifications
    List {
        #[arg(short, long, default_value_t = crate::api::notifications::DEFAULT_LIMIT)]
        limit: u32,
    },

    /// Unread count
    Count,

    /// Mark one notification read
    Read {
        /// Notification ID
        id: i64,
    },

    /// Mark every notification read
    ReadAll,

    /// Delete a notification
    Delete {
        /// Notification ID
        id: i64,
    },

    /// Poll and print new notifications until Ctrl-C
    Watch {
        /// Seconds between polls (default: config, then 30)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

// ============================================================================
// Preference Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum PrefsCommands {
    /// Show your preferences
    Show,

    /// Change one preference
    Set {
        /// preferred_stack | ai_suggestions | email_notifications
        key: String,

        value: String,
    },
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Set a config value
    Set {
        /// api_url | poll_interval_secs | connect_timeout_secs
        key: String,

        value: String,
    },
}
