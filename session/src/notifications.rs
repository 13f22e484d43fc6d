//! Session-backed user notifications
//!
//! Status alerts queued during one request and shown on a later one. The
//! queue is a JSON array in the `"Notifications"` slot of its own store
//! region, so it survives as long as the session does.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::store::{SessionStore, StartMode};
use crate::transport::SessionTransportRef;

pub const NOTIFICATION_NAMESPACE: &str = "NotificationManager";
pub const NOTIFICATIONS_KEY: &str = "Notifications";
pub const DEFAULT_CLASS_NAME: &str = "notice";

/// A message plus the presentation class it should be rendered with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub class_name: String,
}

impl Notification {
    pub fn new(message: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class_name: class_name.into(),
        }
    }

    /// A notification with the default `"notice"` class
    pub fn notice(message: impl Into<String>) -> Self {
        Self::new(message, DEFAULT_CLASS_NAME)
    }
}

/// FIFO/LIFO queue of notifications kept in the session
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    store: SessionStore,
}

impl NotificationQueue {
    /// Start the session if needed and make sure the queue exists
    pub fn new(transport: SessionTransportRef) -> Self {
        let store =
            SessionStore::with_namespace(transport, StartMode::Always, NOTIFICATION_NAMESPACE);

        if !matches!(store.get(NOTIFICATIONS_KEY), Some(Value::Array(_))) {
            store.set(NOTIFICATIONS_KEY, Value::Array(Vec::new()));
        }

        Self { store }
    }

    /// Same as [`NotificationQueue::new`]; state lives in the session, not the value
    pub fn open(transport: SessionTransportRef) -> Self {
        Self::new(transport)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Append a notification to the end of the queue
    pub fn push(&self, message: impl Into<String>, class_name: impl Into<String>) -> &Self {
        self.push_notification(Notification::new(message, class_name))
    }

    /// Append a notification with the default class
    pub fn push_notice(&self, message: impl Into<String>) -> &Self {
        self.push_notification(Notification::notice(message))
    }

    pub fn push_notification(&self, notification: Notification) -> &Self {
        let mut items = self.load();
        items.push(notification);
        self.save(&items);
        self
    }

    /// Remove and return the most recent notification
    pub fn pop(&self) -> Option<Notification> {
        let mut items = self.load();
        let last = items.pop();
        self.save(&items);
        last
    }

    /// Remove and return the oldest notification
    pub fn shift(&self) -> Option<Notification> {
        let mut items = self.load();
        if items.is_empty() {
            self.save(&items);
            return None;
        }
        let first = items.remove(0);
        self.save(&items);
        Some(first)
    }

    /// Return every queued notification, oldest first, and empty the queue
    pub fn pop_all(&self) -> Vec<Notification> {
        let items = self.load();
        self.save(&[]);
        items
    }

    pub fn len(&self) -> usize {
        self.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(&self) -> Vec<Notification> {
        match self.store.get(NOTIFICATIONS_KEY) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match serde_json::from_value(item) {
                    Ok(notification) => Some(notification),
                    Err(e) => {
                        warn!("Dropping malformed notification: {}", e);
                        None
                    }
                })
                .collect(),
            Some(_) => {
                warn!("Notification queue is not a sequence, resetting");
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn save(&self, items: &[Notification]) {
        match serde_json::to_value(items) {
            Ok(value) => self.store.set(NOTIFICATIONS_KEY, value),
            Err(e) => warn!("Failed to encode notifications: {}", e),
        }
    }
}
