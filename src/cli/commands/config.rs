//! Config commands: show and set `~/.deskctl/config.json`.

use super::{Globals, print_json};
use crate::cli::ConfigCommands;
use crate::config::{DeskConfig, load_config, resolve_api_url, resolve_store_path, save_config};
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Effective settings after flags, environment and file are merged.
#[derive(Serialize)]
struct EffectiveConfig {
    api_url: String,
    store: Option<String>,
    poll_interval_secs: u64,
    connect_timeout_secs: Option<u64>,
    file: DeskConfig,
}

/// Execute a config command.
///
/// # Errors
///
/// `InvalidArgument` for a bad key or value, `Config` for file errors.
pub fn execute(command: &ConfigCommands, globals: &Globals<'_>) -> Result<()> {
    match command {
        ConfigCommands::Show => show(globals),
        ConfigCommands::Set { key, value } => {
            let mut update = DeskConfig::default();
            update.set(key, value)?;
            let saved = save_config(update)?;
            if globals.json {
                print_json(&saved)
            } else {
                println!("Set {key}");
                Ok(())
            }
        }
    }
}

fn show(globals: &Globals<'_>) -> Result<()> {
    let file = load_config()?;
    let effective = EffectiveConfig {
        api_url: resolve_api_url(globals.api_url, &file),
        store: resolve_store_path(globals.store).map(|p| p.display().to_string()),
        poll_interval_secs: file.poll_interval().as_secs(),
        connect_timeout_secs: file.connect_timeout().map(|t| t.as_secs()),
        file,
    };

    if globals.json {
        return print_json(&effective);
    }

    println!("{}", "Configuration".cyan().bold());
    println!("  API URL:         {}", effective.api_url);
    println!(
        "  State file:      {}",
        effective.store.as_deref().unwrap_or("(unknown home directory)")
    );
    println!("  Poll interval:   {}s", effective.poll_interval_secs);
    match effective.connect_timeout_secs {
        Some(secs) => println!("  Connect timeout: {secs}s"),
        None => println!("  Connect timeout: none"),
    }
    Ok(())
}
