//! Real-time notification client for the operations console.
//!
//! Maintains a persistent WebSocket connection to the notification
//! endpoint, keeps a local newest-first notification list with an unread
//! counter, and emits transient alerts for incoming events. Connection
//! lifecycle (auth, bounded reconnects, keepalive, workspace switches,
//! teardown) is owned by a single client task; see [`websocket::manager`].

pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;
pub mod websocket;

pub use alerts::{Alert, AlertAction, AlertKind};
pub use api::{NotificationFilter, NotificationPage, NotificationsApi};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use models::{Notification, Severity, Subscription};
pub use store::{NotificationStore, SharedStore};
pub use websocket::{ConnectionPhase, ConnectionState, NotificationClient};
