//! Notification state store
//!
//! Single source of truth for the notification panel: a newest-first list
//! plus a cached unread counter. Mutated only by the protocol dispatcher and
//! the explicit local actions; consumers read snapshots through the shared
//! handle.

use crate::api::NotificationPage;
use crate::models::Notification;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared handle to the store. Writes happen on the client task only.
pub type SharedStore = Arc<RwLock<NotificationStore>>;

/// Ordered notification list plus the cached unread counter.
///
/// The counter is maintained incrementally and corrected by authoritative
/// `unread_count` frames; as a `u64` it cannot go negative.
#[derive(Debug, Default)]
pub struct NotificationStore {
    notifications: Vec<Notification>,
    unread_count: u64,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a pushed notification.
    ///
    /// Duplicate ids (replays after a reconnect) are dropped. Returns whether
    /// the entry was actually inserted; the counter only moves on insert.
    pub fn add(&mut self, notification: Notification) -> bool {
        if self
            .notifications
            .iter()
            .any(|n| n.id == notification.id)
        {
            return false;
        }
        if !notification.is_read {
            self.unread_count += 1;
        }
        self.notifications.insert(0, notification);
        true
    }

    /// Mark one notification as read.
    ///
    /// Idempotent: the counter moves at most once per id, so a local
    /// optimistic mark and the server's echo cannot double-decrement.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.is_read => {
                n.is_read = true;
                self.unread_count = self.unread_count.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Mark every notification as read. Returns the number flipped.
    pub fn mark_all_read(&mut self) -> u64 {
        let mut flipped = 0;
        for n in self.notifications.iter_mut() {
            if !n.is_read {
                n.is_read = true;
                flipped += 1;
            }
        }
        self.unread_count = 0;
        flipped
    }

    /// Remove one notification. The counter decrements only when the removed
    /// entry was unread.
    pub fn remove(&mut self, id: Uuid) -> bool {
        match self.notifications.iter().position(|n| n.id == id) {
            Some(idx) => {
                let removed = self.notifications.remove(idx);
                if !removed.is_read {
                    self.unread_count = self.unread_count.saturating_sub(1);
                }
                true
            }
            None => false,
        }
    }

    /// Authoritative overwrite of the unread counter.
    pub fn replace_unread(&mut self, count: u64) {
        self.unread_count = count;
    }

    /// Drop everything. Used on workspace switches and local clear-all.
    pub fn clear(&mut self) {
        self.notifications.clear();
        self.unread_count = 0;
    }

    /// Replace list and counter from a fetched page.
    pub fn hydrate(&mut self, page: NotificationPage) {
        self.notifications = page.notifications;
        self.unread_count = page.unread_count;
    }

    /// Newest-first view of the list.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}
