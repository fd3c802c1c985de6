use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification severity (visual classification, not a workflow state)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational notice
    Info,
    /// Completed action (case closed, export finished)
    Success,
    /// Needs attention soon
    Warning,
    /// Failed action or degraded integration
    Error,
    /// Active incident, highest urgency
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// Maps a wire value to a severity; anything unrecognized is INFO.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "INFO" => Severity::Info,
            "SUCCESS" => Severity::Success,
            "WARNING" => Severity::Warning,
            "ERROR" => Severity::Error,
            "CRITICAL" => Severity::Critical,
            _ => Severity::Info,
        }
    }
}

fn default_severity() -> Severity {
    Severity::Info
}

fn lenient_severity<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(Severity::from_wire(&raw))
}

/// Core notification model, server-authoritative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,

    /// Severity; unrecognized values fall back to INFO
    #[serde(
        rename = "type",
        default = "default_severity",
        deserialize_with = "lenient_severity"
    )]
    pub severity: Severity,

    /// Short display title
    pub title: String,

    /// Display body
    pub message: String,

    /// Optional deep link into the dashboard (incident page, case page)
    pub link: Option<String>,

    /// Set server-side at creation
    pub created_at: DateTime<Utc>,

    /// Read status; mutated locally and confirmed by the server
    #[serde(default)]
    pub is_read: bool,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            severity,
            title: title.into(),
            message: message.into(),
            link: None,
            created_at: Utc::now(),
            is_read: false,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Which user/workspace pair the server should push notifications for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: Uuid,
    pub workspace_id: Uuid,
}

impl Subscription {
    pub fn new(user_id: Uuid, workspace_id: Uuid) -> Self {
        Self {
            user_id,
            workspace_id,
        }
    }
}
