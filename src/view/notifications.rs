//! Notification bell: recent notifications plus the unread badge.

use super::LoadState;
use crate::api::notifications::DEFAULT_LIMIT;
use crate::api::{ApiClient, Transport};
use crate::error::Result;
use crate::model::Notification;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct NotificationBell {
    pub items: LoadState<Vec<Notification>>,
    unread: i64,
    limit: u32,
}

impl Default for NotificationBell {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

type Feed = (Vec<Notification>, i64);

async fn fetch_feed<T: Transport>(api: &ApiClient<T>, limit: u32) -> Result<Feed> {
    let items = api.notifications().list(limit).await?;
    let unread = api.notifications().unread_count().await?;
    Ok((items, unread))
}

impl NotificationBell {
    #[must_use]
    pub fn new(limit: u32) -> Self {
        Self {
            items: LoadState::Idle,
            unread: 0,
            limit,
        }
    }

    #[must_use]
    pub fn unread(&self) -> i64 {
        self.unread
    }

    fn apply(&mut self, result: Result<Feed>) -> Result<()> {
        match result {
            Ok((items, unread)) => {
                self.items = LoadState::Loaded(items);
                self.unread = unread;
                Ok(())
            }
            Err(e) => {
                self.items = LoadState::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the list and the unread count.
    ///
    /// # Errors
    ///
    /// `MissingIdentity` without a user id, `Transport` or `Http`.
    pub async fn refresh<T: Transport>(&mut self, api: &ApiClient<T>) -> Result<()> {
        if self.items.value().is_none() {
            self.items = LoadState::Loading;
        }
        let result = fetch_feed(api, self.limit).await;
        self.apply(result)
    }

    /// Mark one notification read, then refresh.
    ///
    /// # Errors
    ///
    /// Backend errors.
    pub async fn mark_read<T: Transport>(&mut self, api: &ApiClient<T>, id: i64) -> Result<()> {
        api.notifications().mark_read(id).await?;
        self.refresh(api).await
    }

    /// Mark everything read, then refresh.
    ///
    /// # Errors
    ///
    /// Backend errors.
    pub async fn mark_all_read<T: Transport>(&mut self, api: &ApiClient<T>) -> Result<()> {
        api.notifications().mark_all_read().await?;
        self.refresh(api).await
    }

    /// Delete one notification, then refresh.
    ///
    /// # Errors
    ///
    /// Backend errors.
    pub async fn delete<T: Transport>(&mut self, api: &ApiClient<T>, id: i64) -> Result<()> {
        api.notifications().delete(id).await?;
        self.refresh(api).await
    }

    /// Refresh every `every` until `cancel` becomes `true` (or its sender
    /// is dropped). `on_update` runs after each applied refresh.
    ///
    /// A fetch that completes after cancellation is dropped. Poll errors
    /// are logged and recorded; polling keeps going.
    pub async fn run_polling<T, F>(
        &mut self,
        api: &ApiClient<T>,
        every: Duration,
        mut cancel: watch::Receiver<bool>,
        mut on_update: F,
    ) where
        T: Transport,
        F: FnMut(&Self),
    {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *cancel.borrow() {
                break;
            }
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    let result = fetch_feed(api, self.limit).await;
                    if *cancel.borrow() {
                        debug!("Polling cancelled, dropping late result");
                        break;
                    }
                    if let Err(e) = self.apply(result) {
                        warn!(error = %e, "Notification poll failed");
                    }
                    on_update(&*self);
                }
            }
        }
        debug!("Notification polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::testing::{ScriptedTransport, client_with, signed_in_client};

    const ONE_UNREAD: &str = r#"[{"id": 1, "user_id": 5, "type": "info", "title": "Hello",
                                  "is_read": false, "created_at": "2025-01-01T00:00:00"}]"#;

    #[tokio::test]
    async fn test_refresh_loads_list_and_count() {
        let transport = ScriptedTransport::new()
            .route(Method::Get, "/notifications/", 200, ONE_UNREAD)
            .route(Method::Get, "/notifications/unread_count", 200, r#"{"unread": 1}"#);
        let (client, _) = signed_in_client(transport, 5);

        let mut bell = NotificationBell::default();
        bell.refresh(&client).await.unwrap();
        assert_eq!(bell.items.value().unwrap().len(), 1);
        assert_eq!(bell.unread(), 1);
    }

    #[tokio::test]
    async fn test_mark_all_read_refreshes() {
        let transport = ScriptedTransport::new()
            .route(Method::Post, "/notifications/read_all", 200, r#"{"ok": true}"#)
            .route(Method::Get, "/notifications/", 200, "[]")
            .route(Method::Get, "/notifications/unread_count", 200, r#"{"unread": 0}"#);
        let (client, transport) = signed_in_client(transport, 5);

        let mut bell = NotificationBell::default();
        bell.mark_all_read(&client).await.unwrap();
        assert_eq!(bell.unread(), 0);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_refresh_without_identity() {
        let (client, transport) = client_with(ScriptedTransport::new());
        let mut bell = NotificationBell::default();
        assert!(bell.refresh(&client).await.is_err());
        assert!(bell.items.error().is_some());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_polling_stops_on_cancel() {
        let transport = ScriptedTransport::new()
            .route(Method::Get, "/notifications/", 200, ONE_UNREAD)
            .route(Method::Get, "/notifications/unread_count", 200, r#"{"unread": 1}"#);
        let (client, transport) = signed_in_client(transport, 5);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let mut bell = NotificationBell::default();
        let mut ticks = 0;
        bell.run_polling(&client, Duration::from_millis(5), cancel_rx, |b| {
            ticks += 1;
            assert_eq!(b.unread(), 1);
            if ticks == 2 {
                cancel_tx.send(true).unwrap();
            }
        })
        .await;

        assert_eq!(ticks, 2);
        assert_eq!(transport.requests_to(Method::Get, "/notifications/").len(), 2);
    }

    #[tokio::test]
    async fn test_polling_never_starts_when_already_cancelled() {
        let (client, transport) = signed_in_client(ScriptedTransport::new(), 5);
        let (_cancel_tx, cancel_rx) = watch::channel(true);

        let mut bell = NotificationBell::default();
        bell.run_polling(&client, Duration::from_millis(5), cancel_rx, |_| {}).await;
        assert!(transport.requests().is_empty());
    }
}
