use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError, Weak},
    time::Duration,
};

use chrono::Utc;
use tokio::{sync::broadcast, time::Instant};
use uuid::Uuid;

use crate::models::{Notification, Severity};

pub const NOTIFICATIONS_UPDATED: &str = "notificationsUpdated";

struct Entry {
    notification: Notification,
    expires_at: Instant,
}

type Entries = Arc<Mutex<VecDeque<Entry>>>;

/// Newest-first list of short-lived user messages.
///
/// Each push schedules its own removal after `ttl`. Reads also hide entries
/// whose deadline has passed, so an expired message is never shown even if
/// its timer has not run yet.
pub struct NotificationQueue {
    entries: Entries,
    ttl: Duration,
    events_tx: broadcast::Sender<String>,
}

impl NotificationQueue {
    pub fn new(ttl: Duration, events_tx: broadcast::Sender<String>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            ttl,
            events_tx,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn push(&self, message: impl Into<String>, severity: Severity) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            created_at: Utc::now().timestamp(),
        };

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_front(Entry {
                notification: notification.clone(),
                expires_at: Instant::now() + self.ttl,
            });

        tracing::debug!(
            "notification {} [{}]: {}",
            notification.id,
            severity.as_str(),
            notification.message
        );

        self.schedule_expiry(notification.id);
        let _ = self.events_tx.send(NOTIFICATIONS_UPDATED.to_string());

        notification
    }

    /// Remove an entry now. Returns false if it was already gone.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let removed = remove_entry(&self.entries, id);
        if removed {
            let _ = self.events_tx.send(NOTIFICATIONS_UPDATED.to_string());
        }
        removed
    }

    pub fn list(&self) -> Vec<Notification> {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.expires_at > now)
            .map(|e| e.notification.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn schedule_expiry(&self, id: Uuid) {
        // Outside a runtime the read-side filter still hides the entry.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let entries: Weak<Mutex<VecDeque<Entry>>> = Arc::downgrade(&self.entries);
        let events_tx = self.events_tx.clone();
        let ttl = self.ttl;

        handle.spawn(async move {
            tokio::time::sleep(ttl).await;

            let Some(entries) = entries.upgrade() else {
                return;
            };
            if remove_entry(&entries, id) {
                let _ = events_tx.send(NOTIFICATIONS_UPDATED.to_string());
            }
        });
    }
}

fn remove_entry(entries: &Mutex<VecDeque<Entry>>, id: Uuid) -> bool {
    let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);
    let before = entries.len();
    entries.retain(|e| e.notification.id != id);
    entries.len() != before
}
