//! Protocol dispatcher
//!
//! Parses one inbound frame and applies its store effects, returning what
//! the connection manager still has to do (phase transitions, alerts,
//! keepalive bookkeeping). Pure over `(&str, &mut NotificationStore)` so the
//! routing table is testable without sockets.

use crate::alerts::Alert;
use crate::store::NotificationStore;
use crate::websocket::messages::ServerFrame;
use tracing::{debug, warn};
use uuid::Uuid;

/// Outcome of routing one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Store effects (if any) are applied, nothing left for the manager
    Handled,
    /// `auth_success`: the connection is ready
    Authenticated,
    /// `auth_error`: record the message, do not auto-retry
    AuthFailed { message: String },
    /// `workspace_switched`: list cleared, counter replaced
    WorkspaceSwitched { workspace_id: Uuid },
    /// Hand this alert to the embedding application
    Notify(Alert),
    /// `pong`: record the liveness timestamp
    Pong,
    /// Frame was malformed or unknown and has been dropped
    Dropped,
}

/// Route one raw text frame.
///
/// Malformed input (non-JSON, unknown tag, schema violations) is logged and
/// dropped; the transport stays up and the store is untouched.
pub fn route(text: &str, store: &mut NotificationStore) -> Routed {
    let frame = match ServerFrame::from_json(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "Dropping malformed frame");
            return Routed::Dropped;
        }
    };

    match frame {
        ServerFrame::Connected => {
            debug!("Notification endpoint greeting received");
            Routed::Handled
        }
        ServerFrame::AuthSuccess => Routed::Authenticated,
        ServerFrame::AuthError { message } => Routed::AuthFailed { message },
        ServerFrame::NewNotification { notification } => {
            let alert = Alert::for_notification(&notification);
            if store.add(notification) {
                Routed::Notify(alert)
            } else {
                // Replay after a reconnect, already on screen
                Routed::Handled
            }
        }
        ServerFrame::NotificationRead { notification_id } => {
            store.mark_read(notification_id);
            Routed::Handled
        }
        ServerFrame::UnreadCount { count } => {
            store.replace_unread(count);
            Routed::Handled
        }
        ServerFrame::WorkspaceSwitched {
            workspace_id,
            unread_count,
        } => {
            store.clear();
            store.replace_unread(unread_count);
            Routed::WorkspaceSwitched { workspace_id }
        }
        ServerFrame::Error { message } => {
            warn!(message = %message, "Server reported an error");
            Routed::Notify(Alert::service_error(message))
        }
        ServerFrame::Pong => Routed::Pong,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::models::{Notification, Severity};

    fn notification_frame(n: &Notification) -> String {
        ServerFrame::NewNotification {
            notification: n.clone(),
        }
        .to_json()
        .unwrap()
    }

    #[test]
    fn test_new_notification_adds_and_notifies() {
        let mut store = NotificationStore::new();
        let n = Notification::new(Severity::Warning, "Connector degraded", "EDR feed is lagging");

        let routed = route(&notification_frame(&n), &mut store);

        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
        match routed {
            Routed::Notify(alert) => assert_eq!(alert.title, "Connector degraded"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_replayed_notification_is_silent() {
        let mut store = NotificationStore::new();
        let n = Notification::new(Severity::Info, "t", "m");
        let frame = notification_frame(&n);

        assert!(matches!(route(&frame, &mut store), Routed::Notify(_)));
        assert_eq!(route(&frame, &mut store), Routed::Handled);
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_notification_read_updates_store() {
        let mut store = NotificationStore::new();
        let n = Notification::new(Severity::Info, "t", "m");
        let id = n.id;
        store.add(n);

        let frame = ServerFrame::NotificationRead {
            notification_id: id,
        }
        .to_json()
        .unwrap();

        assert_eq!(route(&frame, &mut store), Routed::Handled);
        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications()[0].is_read);
    }

    #[test]
    fn test_notification_read_for_unknown_id() {
        let mut store = NotificationStore::new();
        store.add(Notification::new(Severity::Info, "t", "m"));

        let frame = ServerFrame::NotificationRead {
            notification_id: Uuid::new_v4(),
        }
        .to_json()
        .unwrap();

        assert_eq!(route(&frame, &mut store), Routed::Handled);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_unread_count_overwrites() {
        let mut store = NotificationStore::new();

        let routed = route(r#"{"type":"unread_count","count":12}"#, &mut store);

        assert_eq!(routed, Routed::Handled);
        assert_eq!(store.unread_count(), 12);
    }

    #[test]
    fn test_workspace_switched_clears_and_replaces() {
        let mut store = NotificationStore::new();
        store.add(Notification::new(Severity::Info, "t", "m"));
        store.add(Notification::new(Severity::Info, "t2", "m2"));
        let workspace_id = Uuid::new_v4();

        let frame = ServerFrame::WorkspaceSwitched {
            workspace_id,
            unread_count: 7,
        }
        .to_json()
        .unwrap();
        let routed = route(&frame, &mut store);

        assert_eq!(routed, Routed::WorkspaceSwitched { workspace_id });
        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 7);
    }

    #[test]
    fn test_auth_frames() {
        let mut store = NotificationStore::new();

        assert_eq!(
            route(r#"{"type":"auth_success"}"#, &mut store),
            Routed::Authenticated
        );
        assert_eq!(
            route(r#"{"type":"auth_error","message":"expired session"}"#, &mut store),
            Routed::AuthFailed {
                message: "expired session".to_string()
            }
        );
    }

    #[test]
    fn test_error_frame_notifies_without_state_change() {
        let mut store = NotificationStore::new();
        store.add(Notification::new(Severity::Info, "t", "m"));

        let routed = route(r#"{"type":"error","message":"subscription rejected"}"#, &mut store);

        match routed {
            Routed::Notify(alert) => {
                assert_eq!(alert.kind, AlertKind::Error);
                assert_eq!(alert.message, "subscription rejected");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let mut store = NotificationStore::new();
        store.add(Notification::new(Severity::Info, "t", "m"));

        assert_eq!(route("not json at all", &mut store), Routed::Dropped);
        assert_eq!(route(r#"{"type":"resync"}"#, &mut store), Routed::Dropped);
        assert_eq!(
            route(r#"{"type":"unread_count","count":"three"}"#, &mut store),
            Routed::Dropped
        );

        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_pong_and_connected() {
        let mut store = NotificationStore::new();

        assert_eq!(route(r#"{"type":"pong"}"#, &mut store), Routed::Pong);
        assert_eq!(route(r#"{"type":"connected"}"#, &mut store), Routed::Handled);
    }
}
