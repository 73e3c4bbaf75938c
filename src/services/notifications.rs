//! Notification center: the session's append-only alert feed.

use tracing::debug;

use crate::models::{Notification, NotificationKind};
use crate::state::StateStore;

/// Newest-first feed of user-facing alerts. Entries are never removed;
/// `mark_all_read` flips the read flag in place. The feed lives and dies
/// with the session.
#[derive(Clone)]
pub struct NotificationService {
    store: StateStore,
}

impl NotificationService {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Prepends a new alert to the feed and returns it.
    pub async fn push(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> Notification {
        let notification = Notification::new(kind, message);
        debug!(id = %notification.id, "notification pushed");
        self.store
            .write(|state| state.notifications.insert(0, notification.clone()))
            .await;
        notification
    }

    /// Marks every entry read. Removes nothing.
    pub async fn mark_all_read(&self) {
        self.store
            .write(|state| {
                for notification in &mut state.notifications {
                    notification.read = true;
                }
            })
            .await;
    }

    /// Number of unread entries, driving the badge.
    pub async fn unread_count(&self) -> usize {
        self.store
            .read(|state| state.notifications.iter().filter(|n| !n.read).count())
            .await
    }

    /// Read-only copy of the feed, newest first.
    pub async fn feed(&self) -> Vec<Notification> {
        self.store.read(|state| state.notifications.clone()).await
    }
}
