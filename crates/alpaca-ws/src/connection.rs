//! WebSocket connection management

use crate::endpoint::Endpoint;
use crate::events::{ConnectionEvent, DisconnectReason, Event, MarketEvent, SubscriptionEvent};
use crate::reconnect::ReconnectConfig;
use crate::subscription::SubscriptionMap;

use alpaca_types::{
    codec, AlpacaError, ChannelKind, Credentials, StreamErrorCode, StreamFrame, StreamResult,
    SubscribeRequest,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::{timeout, Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Connection lifecycle state
///
/// A single authoritative value per session, mutated only by the state
/// machine. Every transition is also published as
/// [`ConnectionEvent::StateChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnState {
    /// Created, never connected
    #[default]
    WaitingToConnect,
    /// Dialing the endpoint
    Connecting,
    /// Transport open and acknowledged, not yet authenticated
    Connected,
    /// Auth frame sent, awaiting verdict
    Authenticating,
    /// Fully authenticated; data flows
    Authenticated,
    /// Closed; terminal unless a reconnect is scheduled
    Disconnected,
    /// Waiting out the backoff delay before redialing
    WaitingToReconnect,
}

impl std::fmt::Display for ConnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::WaitingToConnect => "waiting_to_connect",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Disconnected => "disconnected",
            Self::WaitingToReconnect => "waiting_to_reconnect",
        };
        f.write_str(name)
    }
}

/// Configuration for one streaming connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Stream endpoint
    pub endpoint: Endpoint,
    /// API credentials
    pub credentials: Credentials,
    /// Reconnection settings
    pub reconnect: ReconnectConfig,
    /// Transport dial timeout
    pub connect_timeout: Duration,
    /// Handshake window: transport open to authenticated
    pub auth_timeout: Duration,
    /// Close the connection if no traffic (including pings) arrives within
    /// this window; sized above the server heartbeat interval
    pub liveness_timeout: Duration,
}

impl ConnectionConfig {
    /// Create a config with default timeouts
    pub fn new(endpoint: Endpoint, credentials: Credentials) -> Self {
        Self {
            endpoint,
            credentials,
            reconnect: ReconnectConfig::default(),
            connect_timeout: Duration::from_secs(10),
            auth_timeout: Duration::from_secs(10),
            liveness_timeout: Duration::from_secs(60),
        }
    }

    /// Set reconnection config
    pub fn with_reconnect(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }

    /// Disable automatic reconnection
    pub fn without_reconnect(mut self) -> Self {
        self.reconnect = ReconnectConfig::disabled();
        self
    }

    /// Set transport dial timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the handshake window
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Set the liveness window
    pub fn with_liveness_timeout(mut self, timeout: Duration) -> Self {
        self.liveness_timeout = timeout;
        self
    }
}

/// One streaming connection with auth, resubscription and reconnect
///
/// Owns the session's [`SubscriptionMap`] and [`ConnState`] exclusively;
/// facades mutate them only through the methods here.
pub struct DataStream {
    /// Configuration
    config: ConnectionConfig,
    /// Connection state
    state: Arc<RwLock<ConnState>>,
    /// Desired subscription state for this session
    subscriptions: Arc<RwLock<SubscriptionMap>>,
    /// Set once the first authentication succeeds; decides replay-vs-first
    ever_authenticated: AtomicBool,
    /// Accumulated reconnection attempts; cleared only by explicit disconnect
    attempt: AtomicU32,
    /// Shutdown flag; checked by the message loop and after backoff sleeps
    shutdown: AtomicBool,
    /// Wakes the message loop on explicit disconnect
    shutdown_notify: Notify,
    /// Event sender
    event_tx: mpsc::UnboundedSender<Event>,
    /// Event receiver (for public consumption)
    event_rx: RwLock<Option<mpsc::UnboundedReceiver<Event>>>,
    /// Outbound wire frames from subscribe/unsubscribe calls
    cmd_tx: mpsc::UnboundedSender<Value>,
    /// Consumed by the running message loop
    cmd_rx: Mutex<mpsc::UnboundedReceiver<Value>>,
}

impl DataStream {
    /// Create a new connection with the given configuration
    pub fn new(config: ConnectionConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        Self {
            config,
            state: Arc::new(RwLock::new(ConnState::WaitingToConnect)),
            subscriptions: Arc::new(RwLock::new(SubscriptionMap::new())),
            ever_authenticated: AtomicBool::new(false),
            attempt: AtomicU32::new(0),
            shutdown: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
            event_tx,
            event_rx: RwLock::new(Some(event_rx)),
            cmd_tx,
            cmd_rx: Mutex::new(cmd_rx),
        }
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnState {
        *self.state.read()
    }

    /// Check if fully authenticated
    pub fn is_connected(&self) -> bool {
        self.state() == ConnState::Authenticated
    }

    /// The endpoint this connection dials
    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    /// Take the event receiver (can only be called once)
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<Event>> {
        self.event_rx.write().take()
    }

    /// Snapshot of the tracked per-kind subscriptions
    pub fn subscriptions(&self) -> BTreeMap<ChannelKind, Vec<String>> {
        self.subscriptions.read().snapshot()
    }

    /// Subscribe to a channel kind for the given symbols
    ///
    /// Local state is updated optimistically and the wire message goes out
    /// immediately; the server's subscription ack later overwrites local
    /// state with whatever it actually accepted.
    pub fn subscribe(&self, kind: ChannelKind, symbols: Vec<String>) -> StreamResult<()> {
        self.check_supported(kind)?;
        self.subscriptions.write().add(kind, symbols.iter().cloned());
        self.send_request(SubscribeRequest::single("subscribe", kind, symbols))
    }

    /// Unsubscribe from a channel kind for the given symbols
    pub fn unsubscribe(&self, kind: ChannelKind, symbols: Vec<String>) -> StreamResult<()> {
        self.check_supported(kind)?;
        self.subscriptions
            .write()
            .remove(kind, symbols.iter().map(String::as_str));
        self.send_request(SubscribeRequest::single("unsubscribe", kind, symbols))
    }

    fn check_supported(&self, kind: ChannelKind) -> StreamResult<()> {
        if !self.config.endpoint.supports(kind) {
            return Err(AlpacaError::UnsupportedChannel {
                kind,
                feed: self.config.endpoint.name().to_string(),
            });
        }
        Ok(())
    }

    fn send_request(&self, request: SubscribeRequest) -> StreamResult<()> {
        let frame =
            serde_json::to_value(&request).map_err(|e| AlpacaError::Decode(e.to_string()))?;
        // Queued frames are drained by the running loop; while disconnected
        // they are subsumed by the replay on the next authentication.
        let _ = self.cmd_tx.send(frame);
        Ok(())
    }

    /// Connect and run until explicit disconnect or exhausted policy
    ///
    /// Reconnects with the configured backoff after every transport loss.
    /// The backoff counter carries across sessions, so a drop shortly after
    /// a successful reconnect still waits the accumulated delay; only an
    /// explicit disconnect clears it.
    pub async fn connect_and_run(&self) -> StreamResult<()> {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            self.set_state(ConnState::Connecting);
            self.emit(ConnectionEvent::Connecting);

            match self.connect_internal().await {
                Ok(()) => {
                    // Explicit disconnect closed the loop cleanly
                    break;
                }
                Err(e) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    if !self.config.reconnect.enabled {
                        self.set_state(ConnState::Disconnected);
                        return Err(e);
                    }

                    let attempt = self.attempt.fetch_add(1, Ordering::Relaxed);
                    let delay = self.config.reconnect.delay_with_jitter(attempt);
                    warn!(
                        "Connection lost, reconnecting in {:?} (attempt {}): {}",
                        delay,
                        attempt + 1,
                        e
                    );

                    self.set_state(ConnState::WaitingToReconnect);
                    self.emit(ConnectionEvent::Reconnecting {
                        attempt: attempt + 1,
                        delay,
                    });

                    tokio::time::sleep(delay).await;
                    // Re-checked at the top of the loop: a disconnect() that
                    // raced this sleep wins and no further dial happens.
                }
            }
        }

        if self.state() != ConnState::Disconnected {
            self.set_state(ConnState::Disconnected);
        }
        Ok(())
    }

    /// Request disconnect; safe to call in any state
    ///
    /// Clears reconnect intent, so a pending backoff wait never turns into
    /// another connection attempt.
    pub fn disconnect(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // notify_one stores a permit, so a loop that is not currently
        // parked in select still observes the wakeup
        self.shutdown_notify.notify_one();
        self.attempt.store(0, Ordering::Relaxed);
        self.set_state(ConnState::Disconnected);
        self.emit(ConnectionEvent::Disconnected {
            reason: DisconnectReason::Shutdown,
        });
    }

    /// Dial, authenticate, replay subscriptions and pump messages
    async fn connect_internal(&self) -> StreamResult<()> {
        let url = self.config.endpoint.url();
        info!("Connecting to {}", url);

        // tungstenite does not negotiate permessage-deflate: frames stay
        // uncompressed in both directions
        let connect_result = timeout(self.config.connect_timeout, connect_async(url.as_str())).await;
        let (ws_stream, _response) = match connect_result {
            Ok(Ok((stream, response))) => (stream, response),
            Ok(Err(e)) => {
                return Err(AlpacaError::ConnectionFailed {
                    url,
                    source: std::io::Error::other(e.to_string()),
                });
            }
            Err(_) => {
                return Err(AlpacaError::ConnectionTimeout {
                    url,
                    timeout: self.config.connect_timeout,
                });
            }
        };

        let (mut write, mut read) = ws_stream.split();

        // Transport open: authenticate
        self.set_state(ConnState::Authenticating);
        self.emit(ConnectionEvent::Authenticating);

        let auth = serde_json::to_value(self.config.credentials.auth_request())
            .map_err(|e| AlpacaError::Decode(e.to_string()))?;
        write
            .send(Message::Binary(encode_frame(&auth)?))
            .await
            .map_err(|e| AlpacaError::WebSocket(e.to_string()))?;

        match timeout(
            self.config.auth_timeout,
            self.await_authenticated(&mut write, &mut read),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(AlpacaError::ConnectionTimeout {
                    url: self.config.endpoint.url(),
                    timeout: self.config.auth_timeout,
                });
            }
        }

        self.set_state(ConnState::Authenticated);

        // First-ever authentication fires the user's connect handling; any
        // later one replays the accumulated desired state instead.
        let first = !self.ever_authenticated.swap(true, Ordering::Relaxed);
        self.emit(ConnectionEvent::Authenticated { first });

        if !first {
            let replay = self.subscriptions.read().replay_request();
            if let Some(request) = replay {
                let channels = request.channels.len();
                let frame = serde_json::to_value(&request)
                    .map_err(|e| AlpacaError::Decode(e.to_string()))?;
                write
                    .send(Message::Binary(encode_frame(&frame)?))
                    .await
                    .map_err(|e| AlpacaError::WebSocket(e.to_string()))?;
                info!("Replayed subscriptions for {} channel kinds", channels);
                self.emit(ConnectionEvent::SubscriptionsReplayed { channels });
            }
        }

        self.message_loop(&mut write, &mut read).await
    }

    /// Drive the handshake until the server confirms authentication
    async fn await_authenticated(
        &self,
        write: &mut WsSink,
        read: &mut WsSource,
    ) -> StreamResult<()> {
        while let Some(msg) = read.next().await {
            let payload = match msg {
                Ok(Message::Text(text)) => decode_text(&text),
                Ok(Message::Binary(bytes)) => decode_binary(&bytes),
                Ok(Message::Ping(data)) => {
                    let _ = write.send(Message::Pong(data)).await;
                    continue;
                }
                Ok(Message::Close(_)) => {
                    return Err(AlpacaError::WebSocket(
                        "connection closed during handshake".into(),
                    ));
                }
                Err(e) => return Err(AlpacaError::WebSocket(e.to_string())),
                Ok(_) => continue,
            };

            let value = match payload {
                Ok(value) => value,
                Err(e) => {
                    self.emit_stream_error(None, &e.to_string());
                    continue;
                }
            };

            for frame in StreamFrame::parse_all(&value) {
                match frame {
                    StreamFrame::Success { msg } if msg == "connected" => {
                        debug!("Transport acknowledged");
                        self.set_state(ConnState::Connected);
                        self.emit(ConnectionEvent::Connected);
                    }
                    StreamFrame::Success { msg } if msg == "authenticated" => {
                        info!("Authenticated on {}", self.config.endpoint.name());
                        return Ok(());
                    }
                    StreamFrame::Error { code, msg } => {
                        // Auth rejection: surface the error and keep reading;
                        // the server closes the transport shortly after and
                        // normal reconnect policy takes over from there.
                        error!("Stream error during handshake: {:?} {}", code, msg);
                        self.emit_stream_error(code, &msg);
                    }
                    other => {
                        debug!("Ignoring pre-auth frame: {:?}", other);
                    }
                }
            }
        }

        Err(AlpacaError::WebSocket(
            "connection closed during handshake".into(),
        ))
    }

    /// Pump inbound frames and outbound subscribe requests
    ///
    /// Returns `Ok(())` only on explicit disconnect; every other exit is an
    /// error that feeds the reconnect loop.
    async fn message_loop(&self, write: &mut WsSink, read: &mut WsSource) -> StreamResult<()> {
        let mut cmd_rx = self.cmd_rx.lock().await;
        let mut deadline = Instant::now() + self.config.liveness_timeout;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                let _ = write.send(Message::Close(None)).await;
                return Ok(());
            }

            tokio::select! {
                _ = self.shutdown_notify.notified() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(frame) => {
                            write
                                .send(Message::Binary(encode_frame(&frame)?))
                                .await
                                .map_err(|e| AlpacaError::WebSocket(e.to_string()))?;
                        }
                        None => return Err(AlpacaError::ChannelClosed),
                    }
                }
                msg = read.next() => {
                    // Any inbound traffic counts as liveness
                    deadline = Instant::now() + self.config.liveness_timeout;
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_payload(decode_text(&text));
                        }
                        Some(Ok(Message::Binary(bytes))) => {
                            self.handle_payload(decode_binary(&bytes));
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed connection");
                            self.emit(ConnectionEvent::Disconnected {
                                reason: DisconnectReason::ServerClosed,
                            });
                            return Err(AlpacaError::WebSocket("server closed connection".into()));
                        }
                        Some(Err(e)) => {
                            error!("WebSocket error: {}", e);
                            self.emit(ConnectionEvent::Disconnected {
                                reason: DisconnectReason::NetworkError(e.to_string()),
                            });
                            return Err(AlpacaError::WebSocket(e.to_string()));
                        }
                        Some(Ok(_)) => {}
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    warn!(
                        "No traffic for {:?}, terminating connection",
                        self.config.liveness_timeout
                    );
                    self.emit(ConnectionEvent::Disconnected {
                        reason: DisconnectReason::LivenessTimeout,
                    });
                    let _ = write.send(Message::Close(None)).await;
                    return Err(AlpacaError::WebSocket("liveness timeout".into()));
                }
            }
        }
    }

    /// Dispatch one decoded inbound message
    fn handle_payload(&self, payload: StreamResult<Value>) {
        let value = match payload {
            Ok(value) => value,
            Err(e) => {
                self.emit_stream_error(None, &e.to_string());
                return;
            }
        };

        for frame in StreamFrame::parse_all(&value) {
            match frame {
                StreamFrame::Data { kind, raw } => {
                    let record = codec::decode(kind, &raw);
                    self.emit(MarketEvent::from_record(kind, record));
                }
                StreamFrame::Subscription(ack) => {
                    self.subscriptions.write().replace_all(&ack);
                    self.emit(SubscriptionEvent::Updated(ack));
                }
                StreamFrame::Error { code, msg } => {
                    warn!("Stream error frame: {:?} {}", code, msg);
                    self.emit_stream_error(code, &msg);
                }
                StreamFrame::Success { msg } => {
                    debug!("Success frame mid-stream: {}", msg);
                }
                StreamFrame::Unknown { discriminator } => {
                    self.emit_stream_error(
                        None,
                        &format!("unknown message type: {discriminator:?}"),
                    );
                }
            }
        }
    }

    fn emit_stream_error(&self, code: Option<u16>, msg: &str) {
        self.emit(ConnectionEvent::StreamError {
            code: code.and_then(StreamErrorCode::from_code),
            message: alpaca_types::describe_code(code, msg),
        });
    }

    fn set_state(&self, next: ConnState) {
        *self.state.write() = next;
        let _ = self
            .event_tx
            .send(ConnectionEvent::StateChanged(next).into());
    }

    fn emit(&self, event: impl Into<Event>) {
        let _ = self.event_tx.send(event.into());
    }
}

// ============================================================================
// Wire envelope
// ============================================================================

/// Encode an outbound frame as msgpack
pub(crate) fn encode_frame(value: &Value) -> StreamResult<Vec<u8>> {
    rmp_serde::to_vec_named(value).map_err(|e| AlpacaError::Decode(e.to_string()))
}

/// Decode a binary msgpack message into a JSON value
pub(crate) fn decode_binary(bytes: &[u8]) -> StreamResult<Value> {
    let value = rmpv::decode::read_value(&mut &*bytes)
        .map_err(|e| AlpacaError::Decode(e.to_string()))?;
    serde_json::to_value(&value).map_err(|e| AlpacaError::Decode(e.to_string()))
}

/// Decode a text JSON message
pub(crate) fn decode_text(text: &str) -> StreamResult<Value> {
    serde_json::from_str(text).map_err(|e| AlpacaError::Decode(e.to_string()))
}
