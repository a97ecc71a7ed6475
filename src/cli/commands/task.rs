//! Task commands.

use super::{Context, Globals, block_on, print_acknowledged, print_json, truncate};
use crate::cli::{TaskCommands, TaskCreateArgs, TaskUpdateArgs};
use crate::error::Result;
use crate::model::{EffortEstimate, Level, Task, TaskDraft, TaskStatus, TaskUpdate};
use crate::view::ProjectDetail;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct TaskListOutput<'a> {
    project_id: i64,
    tasks: Vec<&'a Task>,
    count: usize,
}

#[derive(Serialize)]
struct DeletedOutput {
    id: i64,
    deleted: bool,
}

/// Execute a task command.
///
/// # Errors
///
/// Validation, backend or store errors.
pub fn execute(command: &TaskCommands, globals: &Globals<'_>) -> Result<()> {
    // Client-side validation runs before any state is opened
    let prepared = Prepared::from_command(command)?;
    let ctx = Context::open(globals)?;
    block_on(execute_async(command, prepared, &ctx, globals.json))?
}

/// Parsed user input, checked before anything is sent.
enum Prepared {
    None,
    Status(TaskStatus),
    Create(TaskDraft),
    Update(TaskUpdate),
}

impl Prepared {
    fn from_command(command: &TaskCommands) -> Result<Self> {
        Ok(match command {
            TaskCommands::List { status: Some(s), .. } | TaskCommands::Status { status: s, .. } => {
                Self::Status(TaskStatus::parse(s)?)
            }
            TaskCommands::Create(args) => Self::Create(draft_from(args)?),
            TaskCommands::Update(args) => Self::Update(patch_from(args)?),
            _ => Self::None,
        })
    }
}

fn draft_from(args: &TaskCreateArgs) -> Result<TaskDraft> {
    let draft = TaskDraft {
        title: args.title.clone(),
        description: args.description.clone(),
        priority: args.priority.as_deref().map(|p| Level::parse(p, "priority")).transpose()?,
        complexity: args.complexity.as_deref().map(|c| Level::parse(c, "complexity")).transpose()?,
        assignee: args.assignee.clone(),
        tags: args.tags.clone(),
    };
    draft.validate(args.project)?;
    Ok(draft)
}

fn patch_from(args: &TaskUpdateArgs) -> Result<TaskUpdate> {
    TaskUpdate {
        title: args.title.clone(),
        description: args.description.clone(),
        status: args.status.as_deref().map(TaskStatus::parse).transpose()?,
        priority: args.priority.as_deref().map(|p| Level::parse(p, "priority")).transpose()?,
        complexity: args.complexity.as_deref().map(|c| Level::parse(c, "complexity")).transpose()?,
        assignee: args.assignee.clone(),
        tags: args.tags.clone(),
    }
    .validate()
}

async fn execute_async(command: &TaskCommands, prepared: Prepared, ctx: &Context, json: bool) -> Result<()> {
    let api = &ctx.api;
    match (command, prepared) {
        (TaskCommands::List { project, .. }, prepared) => {
            let filter = match prepared {
                Prepared::Status(status) => Some(status),
                _ => None,
            };
            let mut detail = ProjectDetail::new(*project);
            detail.load_tasks(api).await?;
            let tasks: Vec<&Task> = detail
                .tasks
                .value()
                .map(|tasks| tasks.iter().filter(|t| filter.is_none_or(|s| t.status == s)).collect())
                .unwrap_or_default();
            list(*project, &tasks, json)
        }
        (TaskCommands::Create(args), Prepared::Create(draft)) => {
            let mut detail = ProjectDetail::new(args.project);
            match detail.create_task(api, &draft).await? {
                Some(task) => print_task(&task, "Created task", json),
                None => print_acknowledged(&format!("Created task: {}", draft.title), json),
            }
        }
        (TaskCommands::Update(args), Prepared::Update(patch)) => {
            match api.tasks().update(args.id, patch).await? {
                Some(task) => print_task(&task, "Updated task", json),
                None => print_acknowledged(&format!("Updated task #{}", args.id), json),
            }
        }
        (TaskCommands::Status { id, .. }, Prepared::Status(status)) => {
            match api.tasks().set_status(*id, status).await? {
                Some(task) => print_task(&task, "Updated task", json),
                None => print_acknowledged(&format!("Task #{id} is now {status}"), json),
            }
        }
        (TaskCommands::Delete { id }, _) => {
            api.tasks().delete(*id).await?;
            if json {
                print_json(&DeletedOutput { id: *id, deleted: true })
            } else {
                println!("Deleted task #{id}");
                Ok(())
            }
        }
        (TaskCommands::Describe { id }, _) => {
            let Some(task) = api.tasks().generate_description(*id).await? else {
                return print_acknowledged(&format!("Description requested for task #{id}"), json);
            };
            if json {
                print_json(&task)
            } else {
                println!("{}", format!("#{} {}", task.id, task.title).bold());
                println!();
                println!("{}", task.description.as_deref().unwrap_or("(no description)"));
                Ok(())
            }
        }
        (TaskCommands::Estimate { id }, _) => {
            match api.tasks().estimate(*id).await? {
                Some(estimate) => print_estimate(&estimate, json),
                None => print_acknowledged(&format!("Task #{id} estimated"), json),
            }
        }
        // Prepared always matches its command
        (_, _) => Ok(()),
    }
}

fn list(project_id: i64, tasks: &[&Task], json: bool) -> Result<()> {
    if crate::is_csv() {
        println!("id,title,status,priority,complexity,story_points,assignee");
        for t in tasks {
            println!(
                "{},{},{},{},{},{},{}",
                t.id,
                crate::csv_escape(&t.title),
                t.status,
                t.priority,
                t.complexity,
                t.story_points.map(|p| p.to_string()).unwrap_or_default(),
                crate::csv_escape(t.assignee.as_deref().unwrap_or(""))
            );
        }
    } else if json {
        print_json(&TaskListOutput {
            project_id,
            count: tasks.len(),
            tasks: tasks.to_vec(),
        })?;
    } else if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        println!("Tasks ({} found):", tasks.len());
        println!();
        print_task_list(tasks.iter().copied());
    }
    Ok(())
}

/// Print one line per task, with a short description underneath.
pub(super) fn print_task_list<'a>(tasks: impl IntoIterator<Item = &'a Task>) {
    for task in tasks {
        let status_icon = match task.status {
            TaskStatus::Todo => "○",
            TaskStatus::InProgress => "●",
            TaskStatus::Done => "✓",
        };
        let priority = match task.priority {
            Level::High => "!!",
            Level::Medium => "  ",
            Level::Low => "- ",
        };
        let points = task
            .story_points
            .map(|p| format!(" {}", format!("{p}sp").dimmed()))
            .unwrap_or_default();
        println!("{status_icon} [{}] {priority} {}{points}", task.id, task.title);
        if let Some(desc) = &task.description {
            println!("        {}", truncate(desc, 60).dimmed());
        }
    }
}

fn print_task(task: &Task, verb: &str, json: bool) -> Result<()> {
    if json {
        return print_json(task);
    }
    println!("{verb} #{}: {}", task.id, task.title);
    println!("  Status:   {}", task.status);
    println!("  Priority: {}", task.priority);
    Ok(())
}

pub(super) fn print_estimate(estimate: &EffortEstimate, json: bool) -> Result<()> {
    if json {
        return print_json(estimate);
    }
    println!(
        "Task #{}: {} story point(s) ({:.0}% confidence)",
        estimate.task_id,
        estimate.story_points.to_string().bold(),
        estimate.confidence * 100.0
    );
    if !estimate.rationale.is_empty() {
        println!("  {}", estimate.rationale.dimmed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn create_args(title: &str) -> TaskCreateArgs {
        TaskCreateArgs {
            title: title.to_string(),
            project: 1,
            description: None,
            priority: Some("HIGH".to_string()),
            complexity: None,
            assignee: None,
            tags: None,
        }
    }

    #[test]
    fn test_blank_title_fails_before_sending() {
        let err = draft_from(&create_args("   ")).unwrap_err();
        assert!(matches!(err, Error::RequiredField { field: "title" }));
    }

    #[test]
    fn test_draft_parses_levels() {
        let draft = draft_from(&create_args("Ship it")).unwrap();
        assert_eq!(draft.priority, Some(Level::High));
        assert_eq!(draft.complexity, None);
    }

    #[test]
    fn test_empty_update_is_rejected() {
        let args = TaskUpdateArgs {
            id: 1,
            title: None,
            description: None,
            status: None,
            priority: None,
            complexity: None,
            assignee: None,
            tags: None,
        };
        assert!(matches!(patch_from(&args), Err(Error::InvalidArgument(_))));
    }
}
