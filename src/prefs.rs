//! Per-user preferences with in-process change broadcast.
//!
//! Bundles live in the key/value store under `prefs:<identity>`, where the
//! identity is the user's numeric id or, failing that, their email. With no
//! identity every read returns `None` and every write is a no-op; there is
//! no shared default user.
//!
//! Writes publish a [`PreferenceChange`] on a broadcast channel. Any number
//! of [`PreferenceWatcher`]s can follow one key and re-read the stored
//! bundle when it changes.

use crate::error::Result;
use crate::model::PreferenceBundle;
use crate::store::{KeyValueStore, read_json, write_json};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 32;

/// Store key for `identity`, or `None` when there is no identity.
#[must_use]
pub fn preference_key(identity: Option<&str>) -> Option<String> {
    identity
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| format!("prefs:{id}"))
}

/// Published after every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceChange {
    pub key: String,
    pub bundle: PreferenceBundle,
}

/// Preference persistence plus the change subject.
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    sender: broadcast::Sender<PreferenceChange>,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("subscribers", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}

impl PreferenceStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { store, sender }
    }

    /// Bundle for `identity`, creating and persisting defaults on first use.
    ///
    /// # Errors
    ///
    /// Store errors only; a corrupt stored bundle is replaced by defaults.
    pub fn load(&self, identity: Option<&str>) -> Result<Option<PreferenceBundle>> {
        let Some(key) = preference_key(identity) else {
            return Ok(None);
        };
        load_or_init(self.store.as_ref(), &key).map(Some)
    }

    /// Apply `edit` to the bundle for `identity`, persist the whole bundle
    /// and publish the change. Returns the saved bundle.
    ///
    /// # Errors
    ///
    /// Store errors.
    pub fn update(
        &self,
        identity: Option<&str>,
        edit: impl FnOnce(&mut PreferenceBundle),
    ) -> Result<Option<PreferenceBundle>> {
        let Some(key) = preference_key(identity) else {
            debug!("No identity, preference update skipped");
            return Ok(None);
        };

        let mut bundle = load_or_init(self.store.as_ref(), &key)?;
        edit(&mut bundle);
        write_json(self.store.as_ref(), &key, &bundle)?;

        // No subscribers is fine: send only fails when nobody listens
        let _ = self.sender.send(PreferenceChange {
            key,
            bundle: bundle.clone(),
        });
        Ok(Some(bundle))
    }

    /// Raw subscription to every change.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.sender.subscribe()
    }

    /// Follow the bundle of one identity; `None` without an identity.
    #[must_use]
    pub fn watch(&self, identity: Option<&str>) -> Option<PreferenceWatcher> {
        preference_key(identity).map(|key| PreferenceWatcher {
            key,
            receiver: self.sender.subscribe(),
            store: Arc::clone(&self.store),
        })
    }
}

fn load_or_init(store: &dyn KeyValueStore, key: &str) -> Result<PreferenceBundle> {
    if let Some(bundle) = read_json(store, key)? {
        return Ok(bundle);
    }
    let bundle = PreferenceBundle::new(Utc::now());
    write_json(store, key, &bundle)?;
    debug!(key, "Initialized preferences");
    Ok(bundle)
}

/// Follows one preference key.
pub struct PreferenceWatcher {
    key: String,
    receiver: broadcast::Receiver<PreferenceChange>,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for PreferenceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceWatcher")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PreferenceWatcher {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Wait for the next change to this key and return the stored bundle.
    ///
    /// Changes to other keys are skipped. When the receiver lagged behind,
    /// the bundle is re-read from the store rather than lost. Returns
    /// `Ok(None)` once every [`PreferenceStore`] handle is dropped.
    ///
    /// # Errors
    ///
    /// Store errors while re-reading.
    pub async fn changed(&mut self) -> Result<Option<PreferenceBundle>> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.key == self.key => {
                    return load_or_init(self.store.as_ref(), &self.key).map(Some);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(key = %self.key, skipped, "Preference watcher lagged, re-reading");
                    return load_or_init(self.store.as_ref(), &self.key).map(Some);
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    /// Like [`changed`](Self::changed), but never waits: drains whatever is
    /// pending and returns the stored bundle if this key was among it.
    ///
    /// # Errors
    ///
    /// Store errors while re-reading.
    pub fn try_changed(&mut self) -> Result<Option<PreferenceBundle>> {
        let mut changed = false;
        loop {
            match self.receiver.try_recv() {
                Ok(change) => changed |= change.key == self.key,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(key = %self.key, skipped, "Preference watcher lagged, re-reading");
                    changed = true;
                }
                Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => break,
            }
        }
        if changed {
            load_or_init(self.store.as_ref(), &self.key).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn prefs() -> (PreferenceStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PreferenceStore::new(store.clone()), store)
    }

    #[test]
    fn test_first_load_persists_defaults() {
        let (prefs, store) = prefs();
        let first = prefs.load(Some("7")).unwrap().unwrap();
        assert!(first.ai_suggestions);
        assert!(store.get("prefs:7").unwrap().is_some());

        let again = prefs.load(Some("7")).unwrap().unwrap();
        assert_eq!(again.joined_at, first.joined_at);
    }

    #[test]
    fn test_round_trip() {
        let (prefs, _) = prefs();
        prefs
            .update(Some("7"), |b| {
                b.preferred_stack = "Rust".to_string();
                b.email_notifications = false;
            })
            .unwrap();

        let loaded = prefs.load(Some("7")).unwrap().unwrap();
        assert_eq!(loaded.preferred_stack, "Rust");
        assert!(!loaded.email_notifications);
    }

    #[test]
    fn test_accounts_are_isolated() {
        let (prefs, _) = prefs();
        prefs
            .update(Some("1"), |b| b.preferred_stack = "Go".to_string())
            .unwrap();
        let other = prefs.load(Some("bob@example.com")).unwrap().unwrap();
        assert!(other.preferred_stack.is_empty());
    }

    #[test]
    fn test_no_identity_suppresses_everything() {
        let (prefs, store) = prefs();
        let mut rx = prefs.subscribe();

        assert_eq!(prefs.load(None).unwrap(), None);
        assert_eq!(prefs.update(Some("  "), |b| b.ai_suggestions = false).unwrap(), None);
        assert!(store.get("prefs:").unwrap().is_none());
        assert!(rx.try_recv().is_err());
        assert!(prefs.watch(None).is_none());
    }

    #[test]
    fn test_update_publishes_change() {
        let (prefs, _) = prefs();
        let mut rx = prefs.subscribe();
        prefs.update(Some("7"), |b| b.ai_suggestions = false).unwrap();

        let change = rx.try_recv().unwrap();
        assert_eq!(change.key, "prefs:7");
        assert!(!change.bundle.ai_suggestions);
    }

    #[tokio::test]
    async fn test_watcher_skips_other_keys() {
        let (prefs, _) = prefs();
        let mut watcher = prefs.watch(Some("7")).unwrap();

        prefs.update(Some("8"), |b| b.preferred_stack = "other".to_string()).unwrap();
        prefs.update(Some("7"), |b| b.preferred_stack = "mine".to_string()).unwrap();

        let bundle = watcher.changed().await.unwrap().unwrap();
        assert_eq!(bundle.preferred_stack, "mine");
        assert_eq!(watcher.key(), "prefs:7");
    }

    #[test]
    fn test_try_changed_drains_without_waiting() {
        let (prefs, _) = prefs();
        let mut watcher = prefs.watch(Some("7")).unwrap();
        assert_eq!(watcher.try_changed().unwrap(), None);

        prefs.update(Some("8"), |b| b.ai_suggestions = false).unwrap();
        assert_eq!(watcher.try_changed().unwrap(), None);

        prefs.update(Some("7"), |b| b.ai_suggestions = false).unwrap();
        prefs.update(Some("7"), |b| b.preferred_stack = "Rust".to_string()).unwrap();
        let bundle = watcher.try_changed().unwrap().unwrap();
        assert!(!bundle.ai_suggestions);
        assert_eq!(bundle.preferred_stack, "Rust");
        assert_eq!(watcher.try_changed().unwrap(), None);
    }
}
