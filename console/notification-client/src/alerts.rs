//! Side-effect bridge
//!
//! Translates inbound events into transient, dismissible alerts for the
//! embedding UI. Pure policy: nothing here reads or mutates notification
//! state.

use crate::models::{Notification, Severity};
use serde::{Deserialize, Serialize};

/// Visual styling of an alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    Info,
    Success,
    Warning,
    Error,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Info => "info",
            AlertKind::Success => "success",
            AlertKind::Warning => "warning",
            AlertKind::Error => "error",
        }
    }
}

/// Optional call-to-action attached to an alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertAction {
    pub label: String,
    pub link: String,
}

impl AlertAction {
    fn view(link: impl Into<String>) -> Self {
        Self {
            label: "View".to_string(),
            link: link.into(),
        }
    }
}

/// Transient alert handed to the embedding application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    /// How long the UI should keep the alert on screen.
    pub duration_ms: u64,
    pub action: Option<AlertAction>,
}

impl Alert {
    /// Alert for a freshly pushed notification.
    ///
    /// Urgent severities stay on screen longer and carry a "View" action
    /// when the notification has a deep link; SUCCESS and INFO never get an
    /// action even when a link is present.
    pub fn for_notification(notification: &Notification) -> Self {
        let (kind, duration_ms) = match notification.severity {
            Severity::Critical | Severity::Error => (AlertKind::Error, 6000),
            Severity::Warning => (AlertKind::Warning, 5000),
            Severity::Success => (AlertKind::Success, 4000),
            Severity::Info => (AlertKind::Info, 4000),
        };

        let actionable = matches!(
            notification.severity,
            Severity::Critical | Severity::Error | Severity::Warning
        );
        let action = match &notification.link {
            Some(link) if actionable => Some(AlertAction::view(link)),
            _ => None,
        };

        Self {
            kind,
            title: notification.title.clone(),
            message: notification.message.clone(),
            duration_ms,
            action,
        }
    }

    /// Notice for a server-reported error frame. The connection itself is
    /// unaffected, so this renders as a transient error without an action.
    pub fn service_error(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Error,
            title: "Notification service".to_string(),
            message: message.into(),
            duration_ms: 5000,
            action: None,
        }
    }
}
