//! Notification commands.

use super::{Context, Globals, block_on, print_json};
use crate::cli::NotifyCommands;
use crate::error::{Error, Result};
use crate::model::{Notification, UnreadCount, format_timestamp};
use crate::view::NotificationBell;
use colored::Colorize;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

#[derive(Serialize)]
struct NotificationListOutput<'a> {
    notifications: &'a [Notification],
    unread: i64,
}

/// Execute a notification command.
///
/// # Errors
///
/// `NotAuthenticated` / `MissingIdentity` without a session, or backend
/// errors.
pub fn execute(command: &NotifyCommands, globals: &Globals<'_>) -> Result<()> {
    let ctx = Context::open(globals)?;
    block_on(execute_async(command, &ctx, globals.json))?
}

async fn execute_async(command: &NotifyCommands, ctx: &Context, json: bool) -> Result<()> {
    let api = &ctx.api;
    match command {
        NotifyCommands::List { limit } => {
            let mut bell = NotificationBell::new(*limit);
            bell.refresh(api).await?;
            print_bell(&bell, json)
        }
        NotifyCommands::Count => {
            let unread = api.notifications().unread_count().await?;
            if json {
                print_json(&UnreadCount { unread })
            } else {
                println!("{unread} unread");
                Ok(())
            }
        }
        NotifyCommands::Read { id } => {
            let mut bell = NotificationBell::default();
            bell.mark_read(api, *id).await?;
            print_bell(&bell, json)
        }
        NotifyCommands::ReadAll => {
            let mut bell = NotificationBell::default();
            bell.mark_all_read(api).await?;
            print_bell(&bell, json)
        }
        NotifyCommands::Delete { id } => {
            let mut bell = NotificationBell::default();
            bell.delete(api, *id).await?;
            print_bell(&bell, json)
        }
        NotifyCommands::Watch { interval } => {
            if *interval == Some(0) {
                return Err(Error::InvalidArgument("--interval must be at least 1 second".to_string()));
            }
            let every = interval.map_or_else(|| ctx.config.poll_interval(), Duration::from_secs);
            watch_feed(ctx, every, json).await
        }
    }
}

fn print_bell(bell: &NotificationBell, json: bool) -> Result<()> {
    let items = bell.items.value().map_or(&[][..], Vec::as_slice);
    if json {
        return print_json(&NotificationListOutput {
            notifications: items,
            unread: bell.unread(),
        });
    }

    println!("{}", format!("Notifications ({} unread)", bell.unread()).cyan().bold());
    if items.is_empty() {
        println!("  Nothing here.");
    }
    for n in items {
        print_notification(n);
    }
    Ok(())
}

fn print_notification(n: &Notification) {
    let marker = if n.is_read { " " } else { "•" };
    let title = if n.is_read { n.title.normal() } else { n.title.bold() };
    println!(
        "{marker} [{}] {title} {}",
        n.id,
        format_timestamp(&n.created_at).dimmed()
    );
    if let Some(message) = n.message.as_deref().filter(|m| !m.is_empty()) {
        println!("      {message}");
    }
}

/// Poll until Ctrl-C, printing each notification the first time it shows up.
async fn watch_feed(ctx: &Context, every: Duration, json: bool) -> Result<()> {
    if !ctx.api.session().is_authenticated()? {
        return Err(Error::NotAuthenticated);
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            return;
        }
        let _ = cancel_tx.send(true);
    });

    if !json {
        eprintln!("Watching notifications every {}s (Ctrl-C to stop)", every.as_secs());
    }

    let mut seen = HashSet::new();
    let mut bell = NotificationBell::default();
    bell.run_polling(&ctx.api, every, cancel_rx, |bell| {
        let Some(items) = bell.items.value() else {
            return;
        };
        // Oldest first, so output reads in arrival order
        for n in items.iter().rev().filter(|n| seen.insert(n.id)) {
            if json {
                match serde_json::to_string(n) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "Cannot encode notification"),
                }
            } else {
                print_notification(n);
            }
        }
    })
    .await;
    Ok(())
}
