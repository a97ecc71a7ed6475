//! Command implementations.
//!
//! Every command is a sync `execute` that resolves the client state once
//! via [`Context`] and drives the async API on a fresh runtime.

pub mod ai;
pub mod auth;
pub mod completions;
pub mod config;
pub mod notify;
pub mod prefs;
pub mod project;
pub mod task;
pub mod version;

use crate::api::{ApiClient, ReqwestTransport};
use crate::config::{DeskConfig, load_config, resolve_api_url, resolve_store_path};
use crate::error::{Error, Result};
use crate::prefs::PreferenceStore;
use crate::session::SessionStore;
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Store path that keeps state in memory only.
const MEMORY_STORE: &str = ":memory:";

/// Global flags shared by the API-backed commands.
#[derive(Debug, Clone, Copy)]
pub struct Globals<'a> {
    pub api_url: Option<&'a str>,
    pub store: Option<&'a Path>,
    pub json: bool,
}

/// Resolved client state for one invocation.
pub struct Context {
    pub api: ApiClient<ReqwestTransport>,
    pub prefs: PreferenceStore,
    pub config: DeskConfig,
}

impl Context {
    /// Load the config, open the store and build the HTTP client.
    ///
    /// # Errors
    ///
    /// `Config` for a bad config file or API URL.
    pub fn open(globals: &Globals<'_>) -> Result<Self> {
        let config = load_config()?;
        let store = open_store(globals.store)?;
        let api_url = resolve_api_url(globals.api_url, &config);
        debug!(api_url, "Using backend");

        let transport = ReqwestTransport::new(&api_url, config.connect_timeout())?;
        Ok(Self {
            api: ApiClient::new(transport, SessionStore::new(Arc::clone(&store))),
            prefs: PreferenceStore::new(store),
            config,
        })
    }
}

fn open_store(explicit: Option<&Path>) -> Result<Arc<dyn KeyValueStore>> {
    if explicit.is_some_and(|p| p.as_os_str() == MEMORY_STORE) {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let path = resolve_store_path(explicit)
        .ok_or_else(|| Error::Config("Could not determine home directory".into()))?;
    Ok(Arc::new(FileStore::new(path)))
}

/// Run `future` to completion on a new multi-threaded runtime.
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    Ok(rt.block_on(future))
}

/// Print `value` as one line of JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[derive(Serialize)]
struct Acknowledged<'a> {
    ok: bool,
    message: &'a str,
}

/// Report an action whose reply carried no record to show.
pub(crate) fn print_acknowledged(message: &str, json: bool) -> Result<()> {
    if json {
        return print_json(&Acknowledged { ok: true, message });
    }
    println!("{message}");
    Ok(())
}

/// Read one line from stdin after showing `prompt` on stderr.
pub(crate) fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Cut `text` to `max` characters, marking the cut.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_memory_store_path() {
        let store = open_store(Some(Path::new(MEMORY_STORE))).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
