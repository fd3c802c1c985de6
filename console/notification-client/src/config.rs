use crate::error::{ClientError, ClientResult};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Path of the notification endpoint on the dashboard host.
pub const WS_PATH: &str = "/ws/notifications";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full WebSocket URL of the notification endpoint.
    pub endpoint: String,
    /// Keepalive ping period while the connection is ready.
    pub ping_interval: Duration,
    /// Fixed delay between automatic reconnect attempts.
    pub reconnect_delay: Duration,
    /// Automatic reconnect attempts before giving up.
    pub max_reconnect_attempts: u32,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ping_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(3),
            max_reconnect_attempts: 5,
        }
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Derives the WebSocket endpoint from an HTTP origin, matching the
    /// page scheme: `https` origins get `wss`, `http` origins get `ws`.
    pub fn endpoint_for(origin: &str) -> ClientResult<String> {
        let origin = origin.trim_end_matches('/');
        if let Some(rest) = origin.strip_prefix("https://") {
            Ok(format!("wss://{rest}{WS_PATH}"))
        } else if let Some(rest) = origin.strip_prefix("http://") {
            Ok(format!("ws://{rest}{WS_PATH}"))
        } else {
            Err(ClientError::Config(format!(
                "origin must be http(s): {origin}"
            )))
        }
    }

    pub fn from_env() -> ClientResult<Self> {
        dotenv().ok();

        let endpoint = match env::var("NOTIFY_WS_URL") {
            Ok(url) => url,
            Err(_) => {
                let origin = env::var("NOTIFY_ORIGIN")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string());
                Self::endpoint_for(&origin)?
            }
        };

        let ping_secs = env::var("NOTIFY_PING_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);
        let delay_secs = env::var("NOTIFY_RECONNECT_DELAY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);
        let max_reconnect_attempts = env::var("NOTIFY_MAX_RECONNECT_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            endpoint,
            ping_interval: Duration::from_secs(ping_secs),
            reconnect_delay: Duration::from_secs(delay_secs),
            max_reconnect_attempts,
        })
    }
}
