//! AI helper commands over a project's tasks.
//!
//! Each command loads the project's tasks first, so the scope (open, all
//! or selected) is resolved against what the backend currently has.

use super::project::print_summary;
use super::task::{print_estimate, print_task_list};
use super::{Context, Globals, block_on, print_acknowledged, print_json};
use crate::cli::{AiCommands, ScopeArgs};
use crate::error::{Error, Result};
use crate::model::{EffortEstimate, SelectionScope, Task};
use crate::view::{ProjectDetail, Severity};
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct DescribeOutput<'a> {
    project_id: i64,
    updated: usize,
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
struct EstimateOutput<'a> {
    project_id: i64,
    estimates: &'a [EffortEstimate],
    count: usize,
}

/// Execute an AI command.
///
/// # Errors
///
/// An empty selection, backend errors (503 when AI is disabled), or store
/// errors.
pub fn execute(command: &AiCommands, globals: &Globals<'_>) -> Result<()> {
    let ctx = Context::open(globals)?;
    block_on(execute_async(command, &ctx, globals.json))?
}

async fn execute_async(command: &AiCommands, ctx: &Context, json: bool) -> Result<()> {
    match command {
        AiCommands::Describe(args) => describe(ctx, args, json).await,
        AiCommands::Estimate { scope, batch: true } => estimate_batch(ctx, scope.project, json).await,
        AiCommands::Estimate { scope, batch: false } => estimate(ctx, scope, json).await,
        AiCommands::Summary(args) => summary(ctx, args, json).await,
    }
}

/// Load the tasks of `args.project` and apply `--select`.
async fn prepare(ctx: &Context, args: &ScopeArgs) -> Result<ProjectDetail> {
    if args.scope == SelectionScope::Selected && args.select.is_empty() {
        return Err(Error::InvalidArgument(
            "scope 'selected' needs --select <id,...>".to_string(),
        ));
    }

    let mut detail = ProjectDetail::new(args.project);
    let identity = ctx.api.session().identity_key()?;
    detail.follow_preferences(&ctx.prefs, identity.as_deref())?;
    if !detail.ai_enabled() {
        return Err(Error::InvalidArgument(
            "AI suggestions are turned off (deskctl prefs set ai_suggestions on)".to_string(),
        ));
    }
    detail.select(args.select.iter().copied());
    // Loading drops selected ids that are not in the project
    detail.load_tasks(&ctx.api).await?;

    let missing: Vec<String> = args
        .select
        .iter()
        .filter(|id| !detail.selection().contains(*id))
        .map(ToString::to_string)
        .collect();
    if args.scope == SelectionScope::Selected && !missing.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "task(s) {} not in project #{}",
            missing.join(", "),
            args.project
        )));
    }
    Ok(detail)
}

async fn describe(ctx: &Context, args: &ScopeArgs, json: bool) -> Result<()> {
    let mut detail = prepare(ctx, args).await?;
    let updated = detail.describe_scope(&ctx.api, args.scope).await?;
    let scope = detail.scope(args.scope)?;
    let tasks: Vec<&Task> = detail
        .tasks
        .value()
        .map(|tasks| tasks.iter().filter(|t| scope.contains(t)).collect())
        .unwrap_or_default();

    if json {
        return print_json(&DescribeOutput {
            project_id: args.project,
            updated,
            tasks,
        });
    }
    print_feedback(&detail);
    println!();
    print_task_list(tasks);
    Ok(())
}

async fn estimate(ctx: &Context, args: &ScopeArgs, json: bool) -> Result<()> {
    let mut detail = prepare(ctx, args).await?;
    let estimates = detail.estimate_scope(&ctx.api, args.scope).await?;

    if json {
        return print_json(&EstimateOutput {
            project_id: args.project,
            estimates: &estimates,
            count: estimates.len(),
        });
    }
    print_feedback(&detail);
    for estimate in &estimates {
        print_estimate(estimate, false)?;
    }
    Ok(())
}

async fn estimate_batch(ctx: &Context, project_id: i64, json: bool) -> Result<()> {
    let estimates = ctx.api.tasks().estimate_effort_batch(project_id).await?;

    if json {
        return print_json(&EstimateOutput {
            project_id,
            estimates: &estimates,
            count: estimates.len(),
        });
    }
    if estimates.is_empty() {
        println!("No open tasks to estimate.");
    }
    for estimate in &estimates {
        print_estimate(estimate, false)?;
    }
    Ok(())
}

async fn summary(ctx: &Context, args: &ScopeArgs, json: bool) -> Result<()> {
    let mut detail = prepare(ctx, args).await?;
    match detail.summarize(&ctx.api, args.scope).await? {
        Some(summary) => print_summary(&summary, json),
        None => print_acknowledged("The backend returned an empty summary.", json),
    }
}

fn print_feedback(detail: &ProjectDetail) {
    let Some(feedback) = detail.feedback() else {
        return;
    };
    let line = match feedback.severity {
        Severity::Success => feedback.message.green(),
        Severity::Error => feedback.message.red(),
        Severity::Info => feedback.message.normal(),
    };
    println!("{line}");
}
