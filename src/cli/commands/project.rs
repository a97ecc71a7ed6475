//! Project management commands.
//!
//! - `deskctl project list` - List all projects
//! - `deskctl project show <id>` - Show a project with its tasks
//! - `deskctl project create <name>` - Create a project
//! - `deskctl project update <id>` - Patch (or replace) a project
//! - `deskctl project delete <id>` - Delete after typing the name back
//! - `deskctl project summary <id>` - AI summary of its tasks

use super::task::print_task_list;
use super::{Context, Globals, block_on, print_acknowledged, print_json, prompt_line, truncate};
use crate::cli::{ProjectCommands, ProjectCreateArgs, ProjectUpdateArgs, ScopeArgs};
use crate::error::{Error, Result};
use crate::model::{
    AiScope, Project, ProjectDraft, ProjectSummary, ProjectUpdate, Task, format_timestamp,
    project::{parse_members_count, parse_start_date},
};
use crate::view::{ProjectDetail, ProjectList};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Serialize)]
struct ProjectListOutput<'a> {
    projects: &'a [Project],
    count: usize,
}

#[derive(Serialize)]
struct ProjectWithTasks<'a> {
    #[serde(flatten)]
    project: &'a Project,
    tasks: &'a [Task],
}

#[derive(Serialize)]
struct DeletedOutput {
    id: i64,
    deleted: bool,
}

/// Execute a project command.
///
/// # Errors
///
/// Validation, backend or store errors.
pub fn execute(command: &ProjectCommands, globals: &Globals<'_>) -> Result<()> {
    let ctx = Context::open(globals)?;
    block_on(execute_async(command, &ctx, globals.json))?
}

async fn execute_async(command: &ProjectCommands, ctx: &Context, json: bool) -> Result<()> {
    match command {
        ProjectCommands::List => list(ctx, json).await,
        ProjectCommands::Show { id } => show(ctx, *id, json).await,
        ProjectCommands::Create(args) => create(ctx, args, json).await,
        ProjectCommands::Update(args) => update(ctx, args, json).await,
        ProjectCommands::Delete { id, confirm } => delete(ctx, *id, confirm.as_deref(), json).await,
        ProjectCommands::Summary(args) => summary(ctx, args, json).await,
    }
}

async fn list(ctx: &Context, json: bool) -> Result<()> {
    let mut page = ProjectList::new();
    page.load(&ctx.api).await?;
    let projects = page.projects.value().map_or(&[][..], Vec::as_slice);

    if crate::is_csv() {
        println!("id,name,tech_stack,members,start_date");
        for p in projects {
            println!(
                "{},{},{},{},{}",
                p.id,
                crate::csv_escape(&p.name),
                crate::csv_escape(p.tech_stack.as_deref().unwrap_or("")),
                p.members_count,
                p.start_date
            );
        }
    } else if json {
        print_json(&ProjectListOutput {
            projects,
            count: projects.len(),
        })?;
    } else if projects.is_empty() {
        println!("No projects found.");
        println!("\nCreate one with: deskctl project create <name>");
    } else {
        println!("Projects ({} found):", projects.len());
        println!();
        for p in projects {
            println!("  [{}] {}", p.id, p.name.bold());
            if let Some(desc) = &p.description {
                println!("        {}", truncate(desc, 60).dimmed());
            }
        }
    }
    Ok(())
}

async fn show(ctx: &Context, id: i64, json: bool) -> Result<()> {
    let mut detail = ProjectDetail::new(id);
    detail.load(&ctx.api).await?;
    let (Some(project), Some(tasks)) = (detail.project.value(), detail.tasks.value()) else {
        return Err(Error::Other(format!("Project #{id} did not load")));
    };

    if json {
        return print_json(&ProjectWithTasks { project, tasks });
    }

    print_project(project);
    println!();
    println!("{}", format!("Tasks ({})", tasks.len()).cyan().bold());
    if tasks.is_empty() {
        println!("  No tasks yet.");
    } else {
        print_task_list(tasks);
    }
    Ok(())
}

fn print_project(project: &Project) {
    println!("{} {}", format!("#{}", project.id).dimmed(), project.name.bold());
    if let Some(desc) = &project.description {
        println!("  {desc}");
    }
    if let Some(stack) = &project.tech_stack {
        println!("  Stack:          {stack}");
    }
    if let Some(infra) = &project.infrastructure {
        println!("  Infrastructure: {infra}");
    }
    println!("  Members:        {}", project.members_count);
    if !project.start_date.is_empty() {
        println!("  Started:        {}", format_timestamp(&project.start_date));
    }
    if !project.created_at.is_empty() {
        println!("  Created:        {}", format_timestamp(&project.created_at));
    }
}

async fn create(ctx: &Context, args: &ProjectCreateArgs, json: bool) -> Result<()> {
    // New projects start from the user's preferred stack
    let tech_stack = match &args.tech_stack {
        Some(stack) => Some(stack.clone()),
        None => {
            let identity = ctx.api.session().identity_key()?;
            ctx.prefs
                .load(identity.as_deref())?
                .map(|prefs| prefs.preferred_stack)
                .filter(|stack| !stack.trim().is_empty())
        }
    };

    let draft = ProjectDraft {
        name: args.name.clone(),
        description: args.description.clone(),
        tech_stack,
        infrastructure: args.infrastructure.clone(),
        members_count: args.members.clone(),
        start_date: args.start_date.clone(),
    };

    let mut page = ProjectList::new();
    let Some(project) = page.create(&ctx.api, &draft).await? else {
        return print_acknowledged(&format!("Created project: {}", draft.name.trim()), json);
    };

    if json {
        print_json(&project)
    } else {
        println!("Created project: {}", project.name);
        println!("  ID: {}", project.id);
        Ok(())
    }
}

async fn update(ctx: &Context, args: &ProjectUpdateArgs, json: bool) -> Result<()> {
    let patch = ProjectUpdate {
        name: args.name.as_deref().map(str::trim).map(ToString::to_string),
        description: args.description.clone(),
        tech_stack: args.tech_stack.clone(),
        infrastructure: args.infrastructure.clone(),
        members_count: parse_members_count(args.members.as_deref())?,
        start_date: parse_start_date(args.start_date.as_deref())?
            .map(|d| d.format("%Y-%m-%dT00:00:00").to_string()),
    };
    if patch.name.as_deref().is_some_and(str::is_empty) {
        return Err(Error::RequiredField { field: "name" });
    }

    let project = if args.replace {
        if patch.is_empty() {
            return Err(Error::InvalidArgument("nothing to update".to_string()));
        }
        let current = ctx
            .api
            .projects()
            .get(args.id)
            .await?
            .ok_or_else(|| Error::Other(format!("Project #{} returned no data", args.id)))?;
        let body = overlay(ProjectUpdate::replacing(&current), patch);
        ctx.api.projects().replace(args.id, &body).await?
    } else {
        let mut page = ProjectList::new();
        page.update(&ctx.api, args.id, &patch).await?
    };
    let Some(project) = project else {
        return print_acknowledged(&format!("Updated project #{}", args.id), json);
    };

    if json {
        print_json(&project)
    } else {
        println!("Updated project #{}: {}", project.id, project.name);
        Ok(())
    }
}

/// Fields set in `patch` replace those in `base`.
fn overlay(base: ProjectUpdate, patch: ProjectUpdate) -> ProjectUpdate {
    ProjectUpdate {
        name: patch.name.or(base.name),
        description: patch.description.or(base.description),
        tech_stack: patch.tech_stack.or(base.tech_stack),
        infrastructure: patch.infrastructure.or(base.infrastructure),
        members_count: patch.members_count.or(base.members_count),
        start_date: patch.start_date.or(base.start_date),
    }
}

async fn delete(ctx: &Context, id: i64, confirm: Option<&str>, json: bool) -> Result<()> {
    let mut page = ProjectList::new();
    let typed = match confirm {
        Some(name) => name.to_string(),
        None => {
            let project = ctx
                .api
                .projects()
                .get(id)
                .await?
                .ok_or_else(|| Error::Other(format!("Project #{id} returned no data")))?;
            prompt_line(&format!(
                "This deletes '{}' and all of its tasks. Type the project name to confirm: ",
                project.name
            ))?
        }
    };

    page.delete(&ctx.api, id, &typed).await?;

    if json {
        print_json(&DeletedOutput { id, deleted: true })
    } else {
        println!("Deleted project #{id}");
        Ok(())
    }
}

async fn summary(ctx: &Context, args: &ScopeArgs, json: bool) -> Result<()> {
    let selected: BTreeSet<i64> = args.select.iter().copied().collect();
    let scope = AiScope::for_selection(args.project, args.scope, &selected)?;
    match ctx.api.projects().summary(&scope).await? {
        Some(summary) => print_summary(&summary, json),
        None => print_acknowledged("The backend returned an empty summary.", json),
    }
}

pub(super) fn print_summary(summary: &ProjectSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    println!("{}", format!("Summary of project #{}", summary.project_id).cyan().bold());
    println!();
    println!("{}", summary.summary);
    if !summary.method.is_empty() {
        println!();
        println!("{}", format!("({})", summary.method).dimmed());
    }
    Ok(())
}
