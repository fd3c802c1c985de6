use crate::error::ClientResult;
use crate::models::Notification;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query options for fetching a page of notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NotificationFilter {
    /// Only return unread entries
    #[serde(default)]
    pub unread_only: bool,

    #[serde(default = "default_limit")]
    pub limit: i64,

    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Default for NotificationFilter {
    fn default() -> Self {
        Self {
            unread_only: false,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// One page of notifications plus the counters the UI renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: u64,
    pub unread_count: u64,
}

/// Persistence-side procedures of the notification backend.
///
/// The client only consumes this interface: it hydrates pages after
/// authentication and forwards local read/delete actions. Implementations
/// (HTTP, tRPC, in-memory fixtures) live with the embedding application.
#[async_trait]
pub trait NotificationsApi: Send + Sync {
    /// Fetch one page, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails; the client logs and
    /// keeps its current state.
    async fn get_notifications(&self, filter: NotificationFilter) -> ClientResult<NotificationPage>;

    /// Mark a single notification as read.
    async fn mark_as_read(&self, id: Uuid) -> ClientResult<()>;

    /// Mark every notification in the active workspace as read.
    /// Returns the number of entries updated.
    async fn mark_all_as_read(&self) -> ClientResult<u64>;

    /// Delete a single notification.
    async fn delete_notification(&self, id: Uuid) -> ClientResult<()>;

    /// Delete every notification in the active workspace.
    /// Returns the number of entries deleted.
    async fn delete_all_notifications(&self) -> ClientResult<u64>;
}
