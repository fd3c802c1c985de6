//! WebSocket notification client
//!
//! This module owns the persistent connection to the notification endpoint.
//!
//! Architecture:
//! 1. manager: connection lifecycle, bounded retry, keepalive pings
//! 2. dispatcher: routes inbound frames into the notification store
//! 3. messages: tagged frame types for both directions

pub mod dispatcher;
pub mod manager;
pub mod messages;

pub use manager::NotificationClient;
pub use messages::{ClientFrame, ServerFrame};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lifecycle phase of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Open,
    Authenticating,
    Ready,
    Closing,
}

impl ConnectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionPhase::Disconnected => "disconnected",
            ConnectionPhase::Connecting => "connecting",
            ConnectionPhase::Open => "open",
            ConnectionPhase::Authenticating => "authenticating",
            ConnectionPhase::Ready => "ready",
            ConnectionPhase::Closing => "closing",
        }
    }
}

impl Default for ConnectionPhase {
    fn default() -> Self {
        ConnectionPhase::Disconnected
    }
}

/// Process-local connection bookkeeping.
///
/// Written only by the client task; consumers read snapshots through the
/// shared handle to drive indicators like "reconnecting" badges.
#[derive(Debug, Default)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    /// Consecutive automatic retries since the last successful auth
    pub reconnect_attempts: u32,
    /// Last human-readable failure, cleared on successful connect
    pub last_error: Option<String>,
    /// When the last pong arrived. Bookkeeping only, never acted on.
    pub last_pong_at: Option<DateTime<Utc>>,
}

/// Shared handle to the connection state.
pub type SharedConnectionState = Arc<RwLock<ConnectionState>>;
