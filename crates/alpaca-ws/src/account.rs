//! Account event stream (trade_updates)
//!
//! The trading API's stream speaks plain JSON text frames and uses a
//! listen-based protocol instead of per-symbol subscriptions: after auth the
//! client names the streams it wants and the server pushes envelopes tagged
//! with the stream name. Lifecycle, reconnect and liveness handling mirror
//! [`DataStream`](crate::connection::DataStream).

use crate::connection::{decode_binary, decode_text, ConnState};
use crate::events::{AccountEvent, ConnectionEvent, DisconnectReason, Event};
use crate::reconnect::ReconnectConfig;

use alpaca_types::{AccountEnvelope, AlpacaError, Credentials, ListenRequest, StreamResult};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::{timeout, Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Stream name carrying order lifecycle events
pub const TRADE_UPDATES: &str = "trade_updates";

/// Trading API environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountEndpoint {
    /// Live trading
    Live,
    /// Paper trading
    #[default]
    Paper,
}

impl AccountEndpoint {
    /// WebSocket URL for this environment
    pub fn url(&self) -> &'static str {
        match self {
            Self::Live => "wss://api.alpaca.markets/stream",
            Self::Paper => "wss://paper-api.alpaca.markets/stream",
        }
    }
}

/// Configuration for the account stream
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Trading environment
    pub endpoint: AccountEndpoint,
    /// API credentials
    pub credentials: Credentials,
    /// Reconnection settings
    pub reconnect: ReconnectConfig,
    /// Transport dial timeout
    pub connect_timeout: Duration,
    /// Handshake window: transport open to authorized
    pub auth_timeout: Duration,
    /// Close the connection if no traffic arrives within this window
    pub liveness_timeout: Duration,
}

impl AccountConfig {
    /// Create a config with default timeouts
    pub fn new(endpoint: AccountEndpoint, credentials: Credentials) -> Self {
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
}

/// Account event stream connection
pub struct AccountStream {
    config: AccountConfig,
    state: RwLock<ConnState>,
    /// Streams to (re-)listen on after every authentication
    streams: RwLock<BTreeSet<String>>,
    attempt: AtomicU32,
    shutdown: AtomicBool,
    shutdown_notify: Notify,
    event_tx: mpsc::UnboundedSender<Event>,
    event_rx: RwLock<Option<mpsc::UnboundedReceiver<Event>>>,
    cmd_tx: mpsc::UnboundedSender<Value>,
    cmd_rx: Mutex<mpsc::UnboundedReceiver<Value>>,
}

impl AccountStream {
    /// Create a new account stream
    pub fn new(config: AccountConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        Self {
            config,
            state: RwLock::new(ConnState::WaitingToConnect),
            streams: RwLock::new(BTreeSet::new()),
            attempt: AtomicU32::new(0),
            shutdown: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
            event_tx,
            event_rx: RwLock::new(Some(event_rx)),
            cmd_tx,
            cmd_rx: Mutex::new(cmd_rx),
        }
    }

    /// Stream against paper trading with default settings
    pub fn paper(credentials: Credentials) -> Self {
        Self::new(AccountConfig::new(AccountEndpoint::Paper, credentials))
    }

    /// Stream against live trading with default settings
    pub fn live(credentials: Credentials) -> Self {
        Self::new(AccountConfig::new(AccountEndpoint::Live, credentials))
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnState {
        *self.state.read()
    }

    /// Take the event receiver (can only be called once)
    pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<Event>> {
        self.event_rx.write().take()
    }

    /// Listen on order lifecycle events
    pub fn listen_trade_updates(&self) -> StreamResult<()> {
        self.listen(vec![TRADE_UPDATES.to_string()])
    }

    /// Listen on the given streams; repeated on every reconnect
    pub fn listen(&self, streams: Vec<String>) -> StreamResult<()> {
        self.streams.write().extend(streams);
        self.send_listen()
    }

    /// Stop listening on the given streams
    pub fn unlisten(&self, streams: &[String]) -> StreamResult<()> {
        {
            let mut desired = self.streams.write();
            for stream in streams {
                desired.remove(stream);
            }
        }
        self.send_listen()
    }

    fn send_listen(&self) -> StreamResult<()> {
        let request = ListenRequest::new(self.streams.read().iter().cloned().collect());
        let frame =
            serde_json::to_value(&request).map_err(|e| AlpacaError::Decode(e.to_string()))?;
        let _ = self.cmd_tx.send(frame);
        Ok(())
    }

    /// Request disconnect; clears reconnect intent
    pub fn disconnect(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.shutdown_notify.notify_one();
        self.attempt.store(0, Ordering::Relaxed);
        self.set_state(ConnState::Disconnected);
        self.emit(ConnectionEvent::Disconnected {
            reason: DisconnectReason::Shutdown,
        });
    }

    /// Connect and run until explicit disconnect or exhausted policy
    pub async fn connect_and_run(&self) -> StreamResult<()> {
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            self.set_state(ConnState::Connecting);
            self.emit(ConnectionEvent::Connecting);

            match self.connect_internal().await {
                Ok(()) => break,
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
                        "Account stream lost, reconnecting in {:?} (attempt {}): {}",
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
                }
            }
        }

        if self.state() != ConnState::Disconnected {
            self.set_state(ConnState::Disconnected);
        }
        Ok(())
    }

    async fn connect_internal(&self) -> StreamResult<()> {
        let url = self.config.endpoint.url();
        info!("Connecting to {}", url);

        let connect_result = timeout(self.config.connect_timeout, connect_async(url)).await;
        let ws_stream = match connect_result {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                return Err(AlpacaError::ConnectionFailed {
                    url: url.to_string(),
                    source: std::io::Error::other(e.to_string()),
                });
            }
            Err(_) => {
                return Err(AlpacaError::ConnectionTimeout {
                    url: url.to_string(),
                    timeout: self.config.connect_timeout,
                });
            }
        };

        let (mut write, mut read) = ws_stream.split();

        self.set_state(ConnState::Authenticating);
        self.emit(ConnectionEvent::Authenticating);

        let auth = serde_json::to_string(&self.config.credentials.auth_request())
            .map_err(|e| AlpacaError::Decode(e.to_string()))?;
        write
            .send(Message::Text(auth))
            .await
            .map_err(|e| AlpacaError::WebSocket(e.to_string()))?;

        let authorized = async {
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

                let envelope: AccountEnvelope =
                    serde_json::from_value(payload?).map_err(|e| AlpacaError::Decode(e.to_string()))?;
                if envelope.stream == "authorization" {
                    let status = envelope.data["status"].as_str().unwrap_or_default();
                    if status == "authorized" {
                        return Ok(());
                    }
                    return Err(AlpacaError::AuthenticationFailed {
                        reason: format!("authorization status: {status}"),
                    });
                }
                debug!("Ignoring pre-auth envelope: {}", envelope.stream);
            }
            Err(AlpacaError::WebSocket(
                "connection closed during handshake".into(),
            ))
        };

        match timeout(self.config.auth_timeout, authorized).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(AlpacaError::ConnectionTimeout {
                    url: url.to_string(),
                    timeout: self.config.auth_timeout,
                });
            }
        }

        info!("Account stream authorized");
        self.set_state(ConnState::Authenticated);
        self.emit(AccountEvent::Authorized);

        // Listen state does not survive a reconnect server-side; repeat the
        // desired set after every authorization
        let desired: Vec<String> = self.streams.read().iter().cloned().collect();
        if !desired.is_empty() {
            let listen = serde_json::to_string(&ListenRequest::new(desired))
                .map_err(|e| AlpacaError::Decode(e.to_string()))?;
            write
                .send(Message::Text(listen))
                .await
                .map_err(|e| AlpacaError::WebSocket(e.to_string()))?;
        }

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
                            let text = serde_json::to_string(&frame)
                                .map_err(|e| AlpacaError::Decode(e.to_string()))?;
                            write
                                .send(Message::Text(text))
                                .await
                                .map_err(|e| AlpacaError::WebSocket(e.to_string()))?;
                        }
                        None => return Err(AlpacaError::ChannelClosed),
                    }
                }
                msg = read.next() => {
                    deadline = Instant::now() + self.config.liveness_timeout;
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_payload(decode_text(&text)),
                        Some(Ok(Message::Binary(bytes))) => {
                            self.handle_payload(decode_binary(&bytes))
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed account stream");
                            self.emit(ConnectionEvent::Disconnected {
                                reason: DisconnectReason::ServerClosed,
                            });
                            return Err(AlpacaError::WebSocket("server closed connection".into()));
                        }
                        Some(Err(e)) => {
                            error!("Account stream error: {}", e);
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
                        "No traffic for {:?}, terminating account stream",
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

    fn handle_payload(&self, payload: StreamResult<Value>) {
        let value = match payload {
            Ok(value) => value,
            Err(e) => {
                warn!("Undecodable account frame: {}", e);
                return;
            }
        };

        let envelope: AccountEnvelope = match serde_json::from_value(value) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Malformed account envelope: {}", e);
                return;
            }
        };

        match envelope.stream.as_str() {
            "listening" => {
                let streams = envelope.data["streams"]
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect()
                    })
                    .unwrap_or_default();
                self.emit(AccountEvent::Listening { streams });
            }
            TRADE_UPDATES => {
                let event = envelope.data["event"].as_str().unwrap_or_default().to_string();
                self.emit(AccountEvent::OrderUpdate {
                    event,
                    data: envelope.data,
                });
            }
            "authorization" => {
                debug!("Authorization envelope mid-stream: {}", envelope.data);
            }
            other => {
                debug!("Ignoring envelope for unknown stream: {}", other);
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn test_stream() -> AccountStream {
        AccountStream::paper(Credentials::new("AK", "secret").unwrap())
    }

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            AccountEndpoint::Live.url(),
            "wss://api.alpaca.markets/stream"
        );
        assert_eq!(
            AccountEndpoint::Paper.url(),
            "wss://paper-api.alpaca.markets/stream"
        );
    }

    #[test]
    fn test_listen_state_accumulates() {
        let stream = test_stream();
        stream.listen_trade_updates().unwrap();
        stream.listen(vec!["account_updates".to_string()]).unwrap();
        assert_eq!(stream.streams.read().len(), 2);

        stream
            .unlisten(&["account_updates".to_string()])
            .unwrap();
        assert!(stream.streams.read().contains(TRADE_UPDATES));
        assert_eq!(stream.streams.read().len(), 1);
    }

    #[test]
    fn test_disconnect_marks_state() {
        let stream = test_stream();
        stream.disconnect();
        assert_eq!(stream.state(), ConnState::Disconnected);
    }

    #[test]
    fn test_trade_update_envelope_dispatch() {
        let stream = test_stream();
        let mut events = stream.take_event_receiver().unwrap();

        stream.handle_payload(decode_text(
            r#"{"stream":"trade_updates","data":{"event":"fill","order":{"id":"o-1"}}}"#,
        ));

        match events.try_recv().unwrap() {
            Event::Account(AccountEvent::OrderUpdate { event, data }) => {
                assert_eq!(event, "fill");
                assert_eq!(data["order"]["id"], "o-1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
