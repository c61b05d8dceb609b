//! Notification outbox.
//!
//! The settlement pushes a [`Notification`] for every rejected player
//! operation, dormant placement, milestone, and stratum unlock. The
//! presentation layer drains the outbox in FIFO order; nothing in the core
//! reads it back.

use std::collections::VecDeque;

use serde::Serialize;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A player operation was refused.
    Rejected,
    /// The operation succeeded with a caveat (e.g. placed dormant).
    Warning,
    /// A progression milestone (tier reached, stratum unlocked).
    Milestone,
}

/// A single toast message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Category used by the presentation layer for styling.
    pub kind: NotificationKind,
    /// Player-facing text.
    pub message: String,
}

impl Notification {
    /// A rejection toast.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Rejected,
            message: message.into(),
        }
    }

    /// A warning toast.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }

    /// A milestone toast.
    pub fn milestone(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Milestone,
            message: message.into(),
        }
    }
}

/// FIFO queue of undelivered notifications.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: VecDeque<Notification>,
}

impl Outbox {
    /// Create an empty outbox.
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Append a notification.
    pub fn push(&mut self, notification: Notification) {
        tracing::debug!(
            kind = ?notification.kind,
            message = %notification.message,
            "Notification queued"
        );
        self.queue.push_back(notification);
    }

    /// Remove and return every queued notification, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    /// Queued notifications, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter()
    }

    /// Number of queued notifications.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the outbox is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
