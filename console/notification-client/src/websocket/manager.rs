//! Connection manager
//!
//! Owns the persistent connection to the notification endpoint.
//! Supports:
//! - Auth handshake on every new transport
//! - Bounded automatic reconnects with a fixed delay
//! - Keepalive pings while the connection is ready
//! - Workspace switches, deferred while not authenticated
//! - Graceful teardown with no timers or sockets left behind
//!
//! Everything with side effects runs on one task: inbound frames, timer
//! ticks, and handle commands are arms of the same `tokio::select!`, so
//! frames are applied in arrival order and teardown is a single channel
//! close.

use crate::alerts::Alert;
use crate::api::{NotificationFilter, NotificationPage, NotificationsApi};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::models::{Notification, Subscription};
use crate::store::{NotificationStore, SharedStore};
use crate::websocket::dispatcher::{self, Routed};
use crate::websocket::messages::ClientFrame;
use crate::websocket::{ConnectionPhase, ConnectionState, SharedConnectionState};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Surfaced once the automatic retry budget is exhausted.
const CONNECTION_LOST: &str = "connection lost, please refresh";

/// Commands the handle sends to the client task.
#[derive(Debug)]
enum Command {
    Reconnect,
    SwitchWorkspace(Uuid),
    MarkRead(Uuid),
    MarkAllRead,
    Remove(Uuid),
    ClearAll,
    Hydrated {
        workspace_id: Uuid,
        page: NotificationPage,
    },
    Shutdown,
}

/// What the client task does after the current connection attempt.
#[derive(Debug)]
enum Flow {
    /// Transport lost; retry within the budget
    Retry,
    /// Dial again immediately (explicit reconnect)
    Redial,
    /// Stay disconnected until an explicit command
    Hold,
    /// Tear down for good
    Shutdown,
}

/// Result of applying one handle command.
#[derive(Debug)]
enum CommandAction {
    Continue,
    Redial,
    /// The transport broke while acting on the command
    Lost,
    Shutdown,
}

/// Result of one inbound transport message.
#[derive(Debug)]
enum Inbound {
    Continue,
    Ready,
    AuthFailed(String),
    Lost,
}

/// Handle to the notification client.
///
/// Created with [`NotificationClient::connect`]; dropping it (or calling
/// [`NotificationClient::shutdown`]) tears the client task down. State reads
/// are snapshots and never block the connection.
pub struct NotificationClient {
    commands: mpsc::UnboundedSender<Command>,
    store: SharedStore,
    state: SharedConnectionState,
    task: JoinHandle<()>,
}

impl NotificationClient {
    /// Spawn the client task and start connecting immediately.
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint and timing configuration
    /// * `subscription` - User/workspace pair to authenticate as
    /// * `api` - Optional backend procedures; when present the client
    ///   hydrates pages after authentication and forwards local actions
    ///
    /// # Returns
    ///
    /// The handle plus the receiver for transient alerts.
    pub fn connect(
        config: ClientConfig,
        subscription: Subscription,
        api: Option<Arc<dyn NotificationsApi>>,
    ) -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (alert_tx, alert_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let store: SharedStore = Arc::new(RwLock::new(NotificationStore::new()));
        let state: SharedConnectionState = Arc::new(RwLock::new(ConnectionState::default()));

        let manager = ConnectionManager {
            config,
            subscription,
            api,
            store: store.clone(),
            state: state.clone(),
            alerts: alert_tx,
            command_tx: command_tx.downgrade(),
            pending_subscribe: None,
        };
        let task = tokio::spawn(manager.run(command_rx));

        (
            Self {
                commands: command_tx,
                store,
                state,
                task,
            },
            alert_rx,
        )
    }

    pub async fn phase(&self) -> ConnectionPhase {
        self.state.read().await.phase
    }

    pub async fn is_connected(&self) -> bool {
        self.phase().await == ConnectionPhase::Ready
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn reconnect_attempts(&self) -> u32 {
        self.state.read().await.reconnect_attempts
    }

    pub async fn last_pong_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_pong_at
    }

    /// Newest-first snapshot of the notification list.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.store.read().await.notifications().to_vec()
    }

    pub async fn unread_count(&self) -> u64 {
        self.store.read().await.unread_count()
    }

    /// Cancel any pending retry, close an existing transport, reset the
    /// retry counter, and dial immediately.
    pub fn reconnect(&self) {
        // Ignore send errors (task might be gone)
        let _ = self.commands.send(Command::Reconnect);
    }

    /// Re-scope the subscription to another workspace.
    ///
    /// While ready this sends a subscribe frame over the open transport;
    /// otherwise the switch is deferred until the next successful
    /// authentication. At most one target is queued, the latest wins.
    pub fn switch_workspace(&self, workspace_id: Uuid) {
        let _ = self.commands.send(Command::SwitchWorkspace(workspace_id));
    }

    /// Mark one notification as read, optimistically.
    pub fn mark_read(&self, id: Uuid) {
        let _ = self.commands.send(Command::MarkRead(id));
    }

    /// Mark everything as read, optimistically.
    pub fn mark_all_read(&self) {
        let _ = self.commands.send(Command::MarkAllRead);
    }

    /// Remove one notification locally and from the backend.
    pub fn remove(&self, id: Uuid) {
        let _ = self.commands.send(Command::Remove(id));
    }

    /// Drop all notifications locally and from the backend.
    pub fn clear_all(&self) {
        let _ = self.commands.send(Command::ClearAll);
    }

    /// Tear the client down: cancels timers, closes the transport, and
    /// waits for the task to finish. Safe to call at any phase.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

/// The client task. Owns socket, timers, and retry bookkeeping; nothing
/// else writes connection state.
struct ConnectionManager {
    config: ClientConfig,
    subscription: Subscription,
    api: Option<Arc<dyn NotificationsApi>>,
    store: SharedStore,
    state: SharedConnectionState,
    alerts: mpsc::UnboundedSender<Alert>,
    /// Weak so in-flight hydrations cannot keep the task alive
    command_tx: mpsc::WeakUnboundedSender<Command>,
    /// Deferred workspace switch, replayed after the next auth
    pending_subscribe: Option<Uuid>,
}

impl ConnectionManager {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            match self.connect_once(&mut commands).await {
                Flow::Redial => continue,
                Flow::Retry => {
                    self.transition(ConnectionPhase::Disconnected).await;
                    match self.delay_retry(&mut commands).await {
                        Flow::Shutdown => break,
                        Flow::Hold => match self.hold(&mut commands).await {
                            Flow::Shutdown => break,
                            _ => continue,
                        },
                        _ => continue,
                    }
                }
                Flow::Hold => {
                    self.transition(ConnectionPhase::Disconnected).await;
                    match self.hold(&mut commands).await {
                        Flow::Shutdown => break,
                        _ => continue,
                    }
                }
                Flow::Shutdown => break,
            }
        }

        self.transition(ConnectionPhase::Closing).await;
        self.transition(ConnectionPhase::Disconnected).await;
        debug!("Notification client task ended");
    }

    /// Dial the endpoint once and run the session on success.
    async fn connect_once(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) -> Flow {
        self.transition(ConnectionPhase::Connecting).await;
        info!(endpoint = %self.config.endpoint, "Connecting to notification endpoint");

        let dial = connect_async(self.config.endpoint.clone());
        tokio::pin!(dial);

        let ws = loop {
            tokio::select! {
                res = &mut dial => match res {
                    Ok((ws, _response)) => break ws,
                    Err(e) => {
                        warn!(error = %e, "Connection attempt failed");
                        return Flow::Retry;
                    }
                },
                cmd = commands.recv() => {
                    match self.handle_command(cmd, None).await {
                        CommandAction::Continue => {}
                        CommandAction::Redial => return Flow::Redial,
                        CommandAction::Lost => return Flow::Retry,
                        CommandAction::Shutdown => return Flow::Shutdown,
                    }
                }
            }
        };

        self.session(ws, commands).await
    }

    /// One established connection: auth handshake, then the ready loop.
    async fn session(
        &mut self,
        mut ws: Transport,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Flow {
        self.transition(ConnectionPhase::Open).await;

        let auth = ClientFrame::auth(self.subscription);
        if let Err(e) = self.send_frame(&mut ws, &auth).await {
            warn!(error = %e, "Failed to send auth frame");
            return Flow::Retry;
        }
        self.transition(ConnectionPhase::Authenticating).await;

        // Handshake: wait for the auth verdict. Workspace switches stay
        // deferred here so the subscribe frame never precedes auth_success.
        loop {
            tokio::select! {
                msg = ws.next() => match self.handle_message(msg).await {
                    Inbound::Continue => {}
                    Inbound::Ready => break,
                    Inbound::AuthFailed(message) => return self.auth_failed(ws, message).await,
                    Inbound::Lost => return Flow::Retry,
                },
                cmd = commands.recv() => {
                    match self.handle_command(cmd, None).await {
                        CommandAction::Continue => {}
                        CommandAction::Redial => {
                            let _ = ws.close(None).await;
                            return Flow::Redial;
                        }
                        CommandAction::Lost => return Flow::Retry,
                        CommandAction::Shutdown => {
                            let _ = ws.close(None).await;
                            return Flow::Shutdown;
                        }
                    }
                }
            }
        }

        self.became_ready().await;

        if let Some(workspace_id) = self.pending_subscribe.take() {
            debug!(workspace = %workspace_id, "Replaying deferred workspace switch");
            if let Err(e) = self
                .send_frame(&mut ws, &ClientFrame::subscribe(workspace_id))
                .await
            {
                warn!(error = %e, "Failed to replay workspace switch");
                self.pending_subscribe = Some(workspace_id);
                return Flow::Retry;
            }
        }
        self.spawn_hydrate(self.subscription.workspace_id);

        let mut ping = interval_at(
            Instant::now() + self.config.ping_interval,
            self.config.ping_interval,
        );
        ping.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ping.tick() => {
                    if let Err(e) = self.send_frame(&mut ws, &ClientFrame::Ping).await {
                        warn!(error = %e, "Keepalive failed");
                        return Flow::Retry;
                    }
                }
                msg = ws.next() => match self.handle_message(msg).await {
                    Inbound::Continue | Inbound::Ready => {}
                    Inbound::AuthFailed(message) => return self.auth_failed(ws, message).await,
                    Inbound::Lost => return Flow::Retry,
                },
                cmd = commands.recv() => {
                    match self.handle_command(cmd, Some(&mut ws)).await {
                        CommandAction::Continue => {}
                        CommandAction::Redial => {
                            let _ = ws.close(None).await;
                            return Flow::Redial;
                        }
                        CommandAction::Lost => return Flow::Retry,
                        CommandAction::Shutdown => {
                            let _ = ws.close(None).await;
                            return Flow::Shutdown;
                        }
                    }
                }
            }
        }
    }

    /// Fixed-delay wait before the next automatic dial. Commands received
    /// during the wait are applied; an explicit reconnect cancels the timer.
    async fn delay_retry(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) -> Flow {
        let attempts = self.state.read().await.reconnect_attempts;
        if attempts >= self.config.max_reconnect_attempts {
            warn!(
                attempts = attempts,
                "Reconnect budget exhausted, waiting for an explicit reconnect"
            );
            self.state.write().await.last_error = Some(CONNECTION_LOST.to_string());
            return Flow::Hold;
        }

        self.state.write().await.reconnect_attempts = attempts + 1;
        info!(
            attempt = attempts + 1,
            max_attempts = self.config.max_reconnect_attempts,
            delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "Scheduling reconnect"
        );

        let delay = sleep(self.config.reconnect_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return Flow::Redial,
                cmd = commands.recv() => {
                    match self.handle_command(cmd, None).await {
                        CommandAction::Continue => {}
                        CommandAction::Redial => return Flow::Redial,
                        CommandAction::Lost => return Flow::Retry,
                        CommandAction::Shutdown => return Flow::Shutdown,
                    }
                }
            }
        }
    }

    /// Disconnected with no pending timer. Only an explicit command moves
    /// the client out of here.
    async fn hold(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) -> Flow {
        loop {
            let cmd = commands.recv().await;
            match self.handle_command(cmd, None).await {
                CommandAction::Continue => {}
                CommandAction::Redial | CommandAction::Lost => return Flow::Redial,
                CommandAction::Shutdown => return Flow::Shutdown,
            }
        }
    }

    async fn handle_command(
        &mut self,
        cmd: Option<Command>,
        ws: Option<&mut Transport>,
    ) -> CommandAction {
        match cmd {
            Some(cmd) => self.apply_command(cmd, ws).await,
            // Handle dropped without shutdown
            None => CommandAction::Shutdown,
        }
    }

    async fn apply_command(&mut self, cmd: Command, ws: Option<&mut Transport>) -> CommandAction {
        match cmd {
            Command::Reconnect => {
                info!("Explicit reconnect requested");
                let mut st = self.state.write().await;
                st.reconnect_attempts = 0;
                st.last_error = None;
                CommandAction::Redial
            }
            Command::SwitchWorkspace(workspace_id) => {
                self.subscription.workspace_id = workspace_id;
                match ws {
                    Some(ws) => {
                        info!(workspace = %workspace_id, "Switching workspace");
                        if let Err(e) = self
                            .send_frame(ws, &ClientFrame::subscribe(workspace_id))
                            .await
                        {
                            warn!(error = %e, "Failed to send subscribe frame");
                            self.pending_subscribe = Some(workspace_id);
                            return CommandAction::Lost;
                        }
                    }
                    None => {
                        debug!(workspace = %workspace_id, "Deferring workspace switch");
                        self.pending_subscribe = Some(workspace_id);
                    }
                }
                CommandAction::Continue
            }
            Command::MarkRead(id) => {
                self.store.write().await.mark_read(id);
                if let Some(api) = &self.api {
                    let api = api.clone();
                    tokio::spawn(async move {
                        if let Err(e) = api.mark_as_read(id).await {
                            warn!(error = %e, "Failed to forward mark-as-read");
                        }
                    });
                }
                CommandAction::Continue
            }
            Command::MarkAllRead => {
                self.store.write().await.mark_all_read();
                if let Some(api) = &self.api {
                    let api = api.clone();
                    tokio::spawn(async move {
                        if let Err(e) = api.mark_all_as_read().await {
                            warn!(error = %e, "Failed to forward mark-all-as-read");
                        }
                    });
                }
                CommandAction::Continue
            }
            Command::Remove(id) => {
                self.store.write().await.remove(id);
                if let Some(api) = &self.api {
                    let api = api.clone();
                    tokio::spawn(async move {
                        if let Err(e) = api.delete_notification(id).await {
                            warn!(error = %e, "Failed to forward delete");
                        }
                    });
                }
                CommandAction::Continue
            }
            Command::ClearAll => {
                self.store.write().await.clear();
                if let Some(api) = &self.api {
                    let api = api.clone();
                    tokio::spawn(async move {
                        if let Err(e) = api.delete_all_notifications().await {
                            warn!(error = %e, "Failed to forward delete-all");
                        }
                    });
                }
                CommandAction::Continue
            }
            Command::Hydrated { workspace_id, page } => {
                if workspace_id == self.subscription.workspace_id {
                    debug!(count = page.notifications.len(), "Hydrated notification page");
                    self.store.write().await.hydrate(page);
                } else {
                    debug!("Dropping hydration result for a stale workspace");
                }
                CommandAction::Continue
            }
            Command::Shutdown => CommandAction::Shutdown,
        }
    }

    async fn handle_message(
        &mut self,
        msg: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>,
    ) -> Inbound {
        match msg {
            Some(Ok(Message::Text(text))) => self.route_text(text.as_str()).await,
            // Protocol-level ping replies are queued by tungstenite
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => Inbound::Continue,
            Some(Ok(Message::Close(_))) => {
                info!("Notification endpoint closed the connection");
                Inbound::Lost
            }
            Some(Ok(_)) => Inbound::Continue,
            Some(Err(e)) => {
                warn!(error = %e, "Transport error");
                Inbound::Lost
            }
            None => {
                info!("Notification stream ended");
                Inbound::Lost
            }
        }
    }

    async fn route_text(&mut self, text: &str) -> Inbound {
        let routed = {
            let mut store = self.store.write().await;
            dispatcher::route(text, &mut store)
        };

        match routed {
            Routed::Handled | Routed::Dropped => Inbound::Continue,
            Routed::Authenticated => Inbound::Ready,
            Routed::AuthFailed { message } => Inbound::AuthFailed(message),
            Routed::WorkspaceSwitched { workspace_id } => {
                info!(workspace = %workspace_id, "Workspace switch acknowledged");
                self.spawn_hydrate(workspace_id);
                Inbound::Continue
            }
            Routed::Notify(alert) => {
                // Ignore send errors (receiver might be gone)
                let _ = self.alerts.send(alert);
                Inbound::Continue
            }
            Routed::Pong => {
                self.state.write().await.last_pong_at = Some(Utc::now());
                Inbound::Continue
            }
        }
    }

    async fn became_ready(&self) {
        {
            let mut st = self.state.write().await;
            st.phase = ConnectionPhase::Ready;
            st.reconnect_attempts = 0;
            st.last_error = None;
        }
        info!("Notification stream ready");
    }

    /// Non-retryable credential failure: record it and hold. The retry
    /// counter is left untouched.
    async fn auth_failed(&mut self, mut ws: Transport, message: String) -> Flow {
        warn!(message = %message, "Authentication rejected");
        self.state.write().await.last_error = Some(message);
        let _ = ws.close(None).await;
        Flow::Hold
    }

    /// Fetch the first page in the background and route it back through the
    /// command queue, tagged with the workspace it was fetched for.
    fn spawn_hydrate(&self, workspace_id: Uuid) {
        let api = match &self.api {
            Some(api) => api.clone(),
            None => return,
        };
        let commands = self.command_tx.clone();
        tokio::spawn(async move {
            match api.get_notifications(NotificationFilter::default()).await {
                Ok(page) => {
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands.send(Command::Hydrated { workspace_id, page });
                    }
                }
                Err(e) => warn!(error = %e, "Failed to hydrate notifications"),
            }
        });
    }

    async fn send_frame(&self, ws: &mut Transport, frame: &ClientFrame) -> ClientResult<()> {
        let json = frame.to_json()?;
        ws.send(Message::text(json)).await?;
        Ok(())
    }

    async fn transition(&self, phase: ConnectionPhase) {
        let mut st = self.state.write().await;
        if st.phase != phase {
            debug!(from = st.phase.as_str(), to = phase.as_str(), "Connection phase change");
            st.phase = phase;
        }
    }
}
