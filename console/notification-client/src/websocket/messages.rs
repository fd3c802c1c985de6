//! Wire frames for the notification endpoint
//!
//! Outbound frames are `{"type": ..., "payload": {...}}`; inbound frames
//! carry their fields next to the tag. Both directions use snake_case tags
//! and camelCase field names. Unknown inbound tags fail to parse and are
//! dropped by the dispatcher.

use crate::models::{Notification, Subscription};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames the client sends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientFrame {
    /// First frame after the transport opens
    Auth {
        #[serde(rename = "userId")]
        user_id: Uuid,
        #[serde(rename = "workspaceId")]
        workspace_id: Uuid,
    },

    /// Re-scope the subscription to another workspace
    Subscribe {
        #[serde(rename = "workspaceId")]
        workspace_id: Uuid,
    },

    /// Keepalive, sent every ping interval while ready
    Ping,
}

impl ClientFrame {
    /// Create an auth frame for a subscription context
    pub fn auth(subscription: Subscription) -> Self {
        ClientFrame::Auth {
            user_id: subscription.user_id,
            workspace_id: subscription.workspace_id,
        }
    }

    /// Create a subscribe frame
    pub fn subscribe(workspace_id: Uuid) -> Self {
        ClientFrame::Subscribe { workspace_id }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frames the server sends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Transport-level greeting, informational only
    Connected,

    /// Credentials accepted, pushes will follow
    AuthSuccess,

    /// Credentials rejected; the client must not auto-retry
    AuthError { message: String },

    /// A new notification for the subscribed workspace
    NewNotification { notification: Notification },

    /// A notification was read (possibly in another session)
    NotificationRead {
        #[serde(rename = "notificationId")]
        notification_id: Uuid,
    },

    /// Authoritative unread counter
    UnreadCount { count: u64 },

    /// Acknowledges a subscribe frame
    WorkspaceSwitched {
        #[serde(rename = "workspaceId")]
        workspace_id: Uuid,
        #[serde(rename = "unreadCount")]
        unread_count: u64,
    },

    /// Server-side failure that does not affect the connection
    Error { message: String },

    /// Keepalive response
    Pong,
}

impl ServerFrame {
    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use serde_json::json;

    #[test]
    fn test_auth_frame_wire_shape() {
        let user_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let frame = ClientFrame::auth(Subscription::new(user_id, workspace_id));

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "auth",
                "payload": { "userId": user_id, "workspaceId": workspace_id }
            })
        );
    }

    #[test]
    fn test_subscribe_frame_wire_shape() {
        let workspace_id = Uuid::new_v4();
        let frame = ClientFrame::subscribe(workspace_id);

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "subscribe",
                "payload": { "workspaceId": workspace_id }
            })
        );
    }

    #[test]
    fn test_ping_frame_has_no_payload() {
        let json = ClientFrame::Ping.to_json().unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
    }

    #[test]
    fn test_auth_success_parses() {
        let frame = ServerFrame::from_json(r#"{"type":"auth_success"}"#).unwrap();
        assert_eq!(frame, ServerFrame::AuthSuccess);
    }

    #[test]
    fn test_auth_error_parses() {
        let frame =
            ServerFrame::from_json(r#"{"type":"auth_error","message":"unknown user"}"#).unwrap();
        assert!(matches!(frame, ServerFrame::AuthError { message } if message == "unknown user"));
    }

    #[test]
    fn test_new_notification_parses_camel_case_payload() {
        let id = Uuid::new_v4();
        let raw = json!({
            "type": "new_notification",
            "notification": {
                "id": id,
                "type": "CRITICAL",
                "title": "Active incident",
                "message": "Ransomware behavior on fileserver-02",
                "link": "/incidents/17",
                "createdAt": "2026-08-25T09:30:00Z",
                "isRead": false
            }
        });

        let frame = ServerFrame::from_json(&raw.to_string()).unwrap();
        match frame {
            ServerFrame::NewNotification { notification } => {
                assert_eq!(notification.id, id);
                assert_eq!(notification.severity, Severity::Critical);
                assert_eq!(notification.link.as_deref(), Some("/incidents/17"));
                assert!(!notification.is_read);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_notification_defaults_for_optional_fields() {
        let raw = json!({
            "type": "new_notification",
            "notification": {
                "id": Uuid::new_v4(),
                "title": "Heads up",
                "message": "Connector re-synced",
                "createdAt": "2026-08-25T09:30:00Z"
            }
        });

        let frame = ServerFrame::from_json(&raw.to_string()).unwrap();
        match frame {
            ServerFrame::NewNotification { notification } => {
                assert_eq!(notification.severity, Severity::Info);
                assert!(notification.link.is_none());
                assert!(!notification.is_read);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_severity_falls_back_to_info() {
        let raw = json!({
            "type": "new_notification",
            "notification": {
                "id": Uuid::new_v4(),
                "type": "FATAL",
                "title": "t",
                "message": "m",
                "createdAt": "2026-08-25T09:30:00Z"
            }
        });

        let frame = ServerFrame::from_json(&raw.to_string()).unwrap();
        match frame {
            ServerFrame::NewNotification { notification } => {
                assert_eq!(notification.severity, Severity::Info);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_new_notification_frames_compare_by_payload() {
        let id = Uuid::new_v4();
        let raw = json!({
            "type": "new_notification",
            "notification": {
                "id": id,
                "type": "ERROR",
                "title": "Export failed",
                "message": "SIEM export job 42 failed",
                "link": "/exports/42",
                "createdAt": "2026-08-25T09:30:00Z",
                "isRead": false
            }
        })
        .to_string();

        let first = ServerFrame::from_json(&raw).unwrap();
        let second = ServerFrame::from_json(&raw).unwrap();
        assert_eq!(first, second);

        let reread = raw.replace("\"isRead\":false", "\"isRead\":true");
        assert_ne!(first, ServerFrame::from_json(&reread).unwrap());
    }

    #[test]
    fn test_notification_read_parses() {
        let id = Uuid::new_v4();
        let raw = json!({ "type": "notification_read", "notificationId": id });

        let frame = ServerFrame::from_json(&raw.to_string()).unwrap();
        assert_eq!(
            frame,
            ServerFrame::NotificationRead {
                notification_id: id
            }
        );
    }

    #[test]
    fn test_workspace_switched_parses() {
        let workspace_id = Uuid::new_v4();
        let raw = json!({
            "type": "workspace_switched",
            "workspaceId": workspace_id,
            "unreadCount": 7
        });

        let frame = ServerFrame::from_json(&raw.to_string()).unwrap();
        assert_eq!(
            frame,
            ServerFrame::WorkspaceSwitched {
                workspace_id,
                unread_count: 7
            }
        );
    }

    #[test]
    fn test_unread_count_parses() {
        let frame = ServerFrame::from_json(r#"{"type":"unread_count","count":3}"#).unwrap();
        assert_eq!(frame, ServerFrame::UnreadCount { count: 3 });
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(ServerFrame::from_json(r#"{"type":"resync"}"#).is_err());
        assert!(ServerFrame::from_json("not json at all").is_err());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let frame = ServerFrame::from_json(
            r#"{"type":"connected","serverId":"push-3","timestamp":1756114200}"#,
        )
        .unwrap();
        assert_eq!(frame, ServerFrame::Connected);

        let frame = ServerFrame::from_json(r#"{"type":"pong","timestamp":1756114200}"#).unwrap();
        assert_eq!(frame, ServerFrame::Pong);
    }
}
