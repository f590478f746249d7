//! The socket manager: one physical connection, many named subscriptions.
//!
//! All connection and subscription state is owned by a single actor task
//! and mutated only there; the [`SocketManager`] handle is a thin command
//! channel. Timers and the socket reader run as separate tasks but carry
//! the connection *generation* they were spawned for — the actor discards
//! their messages once a newer connection exists, so a callback from a
//! superseded socket can never touch the current one.
//!
//! Lifecycle: the socket is opened lazily on the first subscription
//! (obtaining a session cookie for the handshake), re-registers every
//! tracked topic after each reconnect, and is closed when the last
//! subscription is removed. While any subscription exists, reconnect
//! attempts continue forever on a fixed delay — the remote is assumed to
//! come back eventually.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use digit_auth::CookieSource;
use digit_core::{ChangeKind, EventListener, ObjectEvent, Topic};

use crate::errors::RealtimeError;
use crate::protocol::{InboundFrame, OutboundFrame};
use crate::subscription::{AckOutcome, RegisteredCallback, SubscriptionTable};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default keepalive interval in ms.
pub const DEFAULT_PING_INTERVAL_MS: u64 = 25_000;
/// Default wait before a reconnect attempt in ms.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
/// Default ceiling on how long a connect attempt may take in ms.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Socket manager timing parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeConfig {
    /// Keepalive ping interval in ms (default: 25000).
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// Fixed wait before each reconnect attempt in ms (default: 5000).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Ceiling on a single connect attempt in ms (default: 10000).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_ping_interval_ms() -> u64 {
    DEFAULT_PING_INTERVAL_MS
}
fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}
fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            ping_interval_ms: DEFAULT_PING_INTERVAL_MS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection state
// ─────────────────────────────────────────────────────────────────────────────

/// State of the single physical connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No socket exists.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The socket reported open and frames may be exchanged.
    Connected,
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

enum Command {
    Subscribe {
        topic: Topic,
        listener: Arc<dyn EventListener>,
        on_registered: Option<RegisteredCallback>,
        reply: oneshot::Sender<Result<(), RealtimeError>>,
    },
    Unsubscribe {
        topic: Topic,
        reply: oneshot::Sender<()>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<ConnectionStatus>,
    },
    Inbound {
        generation: u64,
        text: String,
    },
    StreamEnded {
        generation: u64,
    },
    PingTick {
        generation: u64,
    },
    Reconnect,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Handle to the socket manager actor.
///
/// Cheap to clone; all clones drive the same connection and subscription
/// table. Dropping every handle leaves the actor running until
/// [`SocketManager::disconnect`] — tear down explicitly.
#[derive(Clone, Debug)]
pub struct SocketManager {
    tx: mpsc::UnboundedSender<Command>,
}

impl SocketManager {
    /// Spawn the actor for `url`, drawing handshake cookies from `cookies`.
    ///
    /// No I/O happens until the first subscription.
    pub fn spawn(url: String, cookies: Arc<dyn CookieSource>, config: RealtimeConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Actor {
            url,
            cookies,
            config,
            tx: tx.clone(),
            status: ConnectionStatus::Disconnected,
            generation: 0,
            sink: None,
            ping_cancel: None,
            reconnect_pending: false,
            table: SubscriptionTable::new(),
        };
        drop(tokio::spawn(actor.run(rx)));
        Self { tx }
    }

    /// Register `listener` for `topic`, creating the subscription (and the
    /// connection, if this is the first subscription) as needed.
    ///
    /// When this call has to open the socket, it resolves only after the
    /// connect attempt finishes — a failed login or unreachable endpoint
    /// rejects the subscribe instead of leaving it hanging.
    pub async fn subscribe(
        &self,
        topic: Topic,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), RealtimeError> {
        self.subscribe_inner(topic, listener, None).await
    }

    /// Like [`SocketManager::subscribe`], with a one-shot callback fired
    /// when the server acknowledges the registration. If the topic is
    /// already subscribed the callback fires immediately.
    pub async fn subscribe_with_ack(
        &self,
        topic: Topic,
        listener: Arc<dyn EventListener>,
        on_registered: RegisteredCallback,
    ) -> Result<(), RealtimeError> {
        self.subscribe_inner(topic, listener, Some(on_registered))
            .await
    }

    async fn subscribe_inner(
        &self,
        topic: Topic,
        listener: Arc<dyn EventListener>,
        on_registered: Option<RegisteredCallback>,
    ) -> Result<(), RealtimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Subscribe {
                topic,
                listener,
                on_registered,
                reply,
            })
            .map_err(|_| RealtimeError::Closed)?;
        rx.await.map_err(|_| RealtimeError::Closed)?
    }

    /// Remove the subscription for `topic` (all its listeners). Closes the
    /// socket when this was the last subscription.
    pub async fn unsubscribe(&self, topic: &Topic) -> Result<(), RealtimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Unsubscribe {
                topic: topic.clone(),
                reply,
            })
            .map_err(|_| RealtimeError::Closed)?;
        rx.await.map_err(|_| RealtimeError::Closed)
    }

    /// Tear the socket manager down: drop every subscription, close the
    /// socket, and stop the actor. The handle is unusable afterwards.
    pub async fn disconnect(&self) -> Result<(), RealtimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Disconnect { reply })
            .map_err(|_| RealtimeError::Closed)?;
        rx.await.map_err(|_| RealtimeError::Closed)
    }

    /// Current connection state.
    pub async fn status(&self) -> Result<ConnectionStatus, RealtimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Status { reply })
            .map_err(|_| RealtimeError::Closed)?;
        rx.await.map_err(|_| RealtimeError::Closed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actor
// ─────────────────────────────────────────────────────────────────────────────

enum Flow {
    Continue,
    Shutdown,
}

struct Actor {
    url: String,
    cookies: Arc<dyn CookieSource>,
    config: RealtimeConfig,
    /// Self-addressed sender handed to reader and timer tasks.
    tx: mpsc::UnboundedSender<Command>,
    status: ConnectionStatus,
    /// Bumped on every successful connect; messages tagged with an older
    /// generation belong to a superseded socket and are discarded.
    generation: u64,
    sink: Option<WsSink>,
    ping_cancel: Option<CancellationToken>,
    reconnect_pending: bool,
    table: SubscriptionTable,
}

impl Actor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match self.handle(cmd).await {
                Flow::Continue => {}
                Flow::Shutdown => break,
            }
        }
        tracing::debug!("socket manager actor stopped");
    }

    async fn handle(&mut self, cmd: Command) -> Flow {
        match cmd {
            Command::Subscribe {
                topic,
                listener,
                on_registered,
                reply,
            } => {
                let result = self.subscribe(topic, listener, on_registered).await;
                let _ = reply.send(result);
            }
            Command::Unsubscribe { topic, reply } => {
                self.unsubscribe(&topic).await;
                let _ = reply.send(());
            }
            Command::Disconnect { reply } => {
                self.teardown_connection().await;
                self.table.clear();
                let _ = reply.send(());
                return Flow::Shutdown;
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status);
            }
            Command::Inbound { generation, text } => {
                if generation == self.generation {
                    self.dispatch(&text);
                }
            }
            Command::StreamEnded { generation } => {
                if generation == self.generation && self.status == ConnectionStatus::Connected {
                    tracing::warn!(generation, "socket closed");
                    self.teardown_connection().await;
                    if !self.table.is_empty() {
                        self.schedule_reconnect();
                    }
                }
            }
            Command::PingTick { generation } => {
                if generation == self.generation && self.status == ConnectionStatus::Connected {
                    self.emit(&OutboundFrame::Ping).await;
                }
            }
            Command::Reconnect => {
                self.reconnect_pending = false;
                if self.status == ConnectionStatus::Disconnected && !self.table.is_empty() {
                    if let Err(err) = self.connect_and_resubscribe().await {
                        tracing::warn!(error = %err, "reconnect attempt failed");
                        self.schedule_reconnect();
                    }
                }
            }
        }
        Flow::Continue
    }

    // -- subscription handling --

    async fn subscribe(
        &mut self,
        topic: Topic,
        listener: Arc<dyn EventListener>,
        on_registered: Option<RegisteredCallback>,
    ) -> Result<(), RealtimeError> {
        // Existing subscription: append the listener. Registration was
        // already requested, so the ack callback fires right away.
        if self.table.append_listener(&topic, &listener) {
            tracing::debug!(topic = %topic, "listener appended to existing subscription");
            if let Some(cb) = on_registered {
                cb();
            }
            return Ok(());
        }

        self.table.insert(topic.clone(), listener, on_registered);
        tracing::debug!(topic = %topic, "subscription created");

        match self.status {
            ConnectionStatus::Connected => {
                self.emit(&OutboundFrame::Registration {
                    names: vec![topic.as_str().to_string()],
                })
                .await;
                Ok(())
            }
            ConnectionStatus::Disconnected
                if self.table.len() == 1 && !self.reconnect_pending =>
            {
                // First subscription opens the socket; the caller waits for
                // the outcome so a bad login rejects instead of hanging.
                match self.connect_and_resubscribe().await {
                    Ok(()) => Ok(()),
                    Err(err) => {
                        let _ = self.table.remove(&topic);
                        Err(err)
                    }
                }
            }
            ConnectionStatus::Disconnected | ConnectionStatus::Connecting => {
                // A reconnect is pending (or other topics are tracked); its
                // resubscribe-all pass will register this topic too.
                Ok(())
            }
        }
    }

    async fn unsubscribe(&mut self, topic: &Topic) {
        if self.table.remove(topic).is_none() {
            tracing::debug!(topic = %topic, "unsubscribe for untracked topic");
            return;
        }
        if self.status == ConnectionStatus::Connected {
            self.emit(&OutboundFrame::Unregistration {
                names: vec![topic.as_str().to_string()],
            })
            .await;
        }
        if self.table.is_empty() {
            tracing::info!("last subscription removed, closing socket");
            self.teardown_connection().await;
        }
    }

    // -- connection lifecycle --

    async fn connect_and_resubscribe(&mut self) -> Result<(), RealtimeError> {
        self.status = ConnectionStatus::Connecting;

        let cookie = match self.cookies.active_cookie().await {
            Ok(cookie) => cookie,
            Err(err) => {
                self.status = ConnectionStatus::Disconnected;
                return Err(err.into());
            }
        };

        let request = match build_handshake_request(&self.url, cookie.header_value()) {
            Ok(request) => request,
            Err(err) => {
                self.status = ConnectionStatus::Disconnected;
                return Err(err);
            }
        };

        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let ws = match tokio::time::timeout(connect_timeout, connect_async(request)).await {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(err)) => {
                self.status = ConnectionStatus::Disconnected;
                return Err(RealtimeError::Connect {
                    message: err.to_string(),
                });
            }
            Err(_elapsed) => {
                self.status = ConnectionStatus::Disconnected;
                return Err(RealtimeError::Timeout);
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let (sink, stream) = ws.split();
        self.sink = Some(sink);
        self.status = ConnectionStatus::Connected;

        // Server ids from the previous connection are void.
        self.table.clear_acks();

        drop(tokio::spawn(read_loop(stream, generation, self.tx.clone())));

        let cancel = CancellationToken::new();
        self.ping_cancel = Some(cancel.clone());
        drop(tokio::spawn(ping_loop(
            Duration::from_millis(self.config.ping_interval_ms),
            generation,
            self.tx.clone(),
            cancel,
        )));

        tracing::info!(generation, url = %self.url, "socket connected");

        // Re-register every tracked topic, one frame per topic.
        for topic in self.table.topics() {
            self.emit(&OutboundFrame::Registration {
                names: vec![topic.as_str().to_string()],
            })
            .await;
        }
        Ok(())
    }

    async fn teardown_connection(&mut self) {
        if let Some(cancel) = self.ping_cancel.take() {
            cancel.cancel();
        }
        if let Some(mut sink) = self.sink.take() {
            let _ = sink.close().await;
        }
        self.status = ConnectionStatus::Disconnected;
        self.table.clear_acks();
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect_pending {
            return;
        }
        self.reconnect_pending = true;
        let delay = Duration::from_millis(self.config.reconnect_delay_ms);
        let tx = self.tx.clone();
        tracing::info!(delay_ms = self.config.reconnect_delay_ms, "scheduling reconnect");
        drop(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Command::Reconnect);
        }));
    }

    // -- frames --

    fn dispatch(&mut self, text: &str) {
        match InboundFrame::parse(text) {
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed frame");
            }
            Ok(InboundFrame::Pong(_)) => {
                tracing::trace!("pong");
            }
            Ok(InboundFrame::Ack(ack)) => {
                // A REGISTRATION that never produces an ack leaves its
                // subscription inert until the next reconnect re-sends it;
                // there is deliberately no ack timeout.
                for name in &ack.created {
                    match self.table.acknowledge(name, &ack.id) {
                        AckOutcome::Acknowledged(callback) => {
                            tracing::debug!(topic = %name, id = %ack.id, "subscription acknowledged");
                            if let Some(cb) = callback {
                                cb();
                            }
                        }
                        AckOutcome::UnknownTopic => {
                            tracing::warn!(topic = %name, "registration ack for untracked topic");
                        }
                    }
                }
            }
            Ok(InboundFrame::Event(delivery)) => {
                let Some(listeners) = self.table.listeners_by_server_id(&delivery.recipient.id)
                else {
                    // Expected race during reconnect windows: the id belongs
                    // to a subscription the previous connection registered.
                    tracing::warn!(id = %delivery.recipient.id, "event for unknown subscription id");
                    return;
                };
                for param in &delivery.params {
                    let event = ObjectEvent {
                        kind: ChangeKind::from_wire(&param.kind),
                        object_id: param.id.clone(),
                    };
                    for listener in &listeners {
                        listener.on_event(&event);
                    }
                }
            }
        }
    }

    async fn emit(&mut self, frame: &OutboundFrame) {
        if self.status != ConnectionStatus::Connected {
            tracing::error!(action = frame.action(), "cannot emit while disconnected, dropping frame");
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            tracing::error!(action = frame.action(), "no socket sink, dropping frame");
            return;
        };
        match serde_json::to_string(frame) {
            Ok(json) => {
                if let Err(err) = sink.send(Message::Text(json.into())).await {
                    // The reader will observe the closure and drive reconnect.
                    tracing::error!(action = frame.action(), error = %err, "socket send failed");
                }
            }
            Err(err) => {
                tracing::error!(action = frame.action(), error = %err, "frame serialization failed");
            }
        }
    }
}

/// Build the upgrade request for `url` with the session cookie attached.
fn build_handshake_request(
    url: &str,
    cookie: &str,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, RealtimeError> {
    let mut request = url
        .into_client_request()
        .map_err(|err| RealtimeError::Connect {
            message: err.to_string(),
        })?;
    let cookie_header =
        HeaderValue::from_str(cookie).map_err(|err| RealtimeError::Connect {
            message: err.to_string(),
        })?;
    let _ = request.headers_mut().insert(COOKIE, cookie_header);
    Ok(request)
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-connection tasks
// ─────────────────────────────────────────────────────────────────────────────

async fn read_loop(mut stream: WsStream, generation: u64, tx: mpsc::UnboundedSender<Command>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if tx
                    .send(Command::Inbound {
                        generation,
                        text: text.as_str().to_owned(),
                    })
                    .is_err()
                {
                    return;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {
                // Transport-level ping/pong and binary frames are not part
                // of the protocol; tungstenite answers pings itself.
            }
            Err(err) => {
                tracing::warn!(generation, error = %err, "socket read error");
                break;
            }
        }
    }
    let _ = tx.send(Command::StreamEnded { generation });
}

async fn ping_loop(
    interval: Duration,
    generation: u64,
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick is immediate; the connection is fresh, skip it.
    let _ = ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if tx.send(Command::PingTick { generation }).is_err() {
                    return;
                }
            }
            () = cancel.cancelled() => return,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_config_defaults() {
        let config = RealtimeConfig::default();
        assert_eq!(config.ping_interval_ms, 25_000);
        assert_eq!(config.reconnect_delay_ms, 5_000);
        assert_eq!(config.connect_timeout_ms, 10_000);
    }

    #[test]
    fn realtime_config_serde_defaults() {
        let config: RealtimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.ping_interval_ms, 25_000);
        assert_eq!(config.reconnect_delay_ms, 5_000);
    }

    #[test]
    fn status_equality() {
        assert_eq!(ConnectionStatus::Disconnected, ConnectionStatus::Disconnected);
        assert_ne!(ConnectionStatus::Connected, ConnectionStatus::Connecting);
    }

    #[test]
    fn handshake_request_carries_cookie() {
        let request = build_handshake_request("ws://localhost:9/ws", "JSESSIONID=abc").unwrap();
        assert_eq!(request.headers().get(COOKIE).unwrap(), "JSESSIONID=abc");
    }

    #[test]
    fn handshake_request_rejects_bad_url() {
        assert!(build_handshake_request("not a url", "c=1").is_err());
    }
}
