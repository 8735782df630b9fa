//! Connection state machine tests against an in-process WebSocket server
//!
//! Each test binds a local listener speaking the stream protocol and drives
//! a real `DataStream` session through it: handshake event order, auth
//! rejection, and subscription replay across a server-initiated drop.

use alpaca_ws::connection::{ConnState, ConnectionConfig, DataStream};
use alpaca_ws::endpoint::Endpoint;
use alpaca_ws::events::{ConnectionEvent, Event};
use alpaca_ws::reconnect::ReconnectConfig;

use alpaca_types::{ChannelKind, Credentials, StreamErrorCode};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

type ServerWs = WebSocketStream<TcpStream>;

fn credentials() -> Credentials {
    Credentials::new("AKTEST", "secret").unwrap()
}

fn pack(value: &Value) -> Message {
    Message::Binary(rmp_serde::to_vec_named(value).unwrap())
}

fn unpack(bytes: &[u8]) -> Value {
    let value = rmpv::decode::read_value(&mut &bytes[..]).unwrap();
    serde_json::to_value(&value).unwrap()
}

async fn accept(listener: &TcpListener) -> ServerWs {
    let (tcp, _) = listener.accept().await.unwrap();
    accept_async(tcp).await.unwrap()
}

async fn next_frame(ws: &mut ServerWs) -> Value {
    loop {
        match ws.next().await.expect("client hung up").unwrap() {
            Message::Binary(bytes) => return unpack(&bytes),
            _ => continue,
        }
    }
}

/// Drive the handshake from the server side; returns the client's auth frame
async fn authenticate(ws: &mut ServerWs) -> Value {
    ws.send(pack(&json!([{"T": "success", "msg": "connected"}])))
        .await
        .unwrap();
    let auth = next_frame(ws).await;
    assert_eq!(auth["action"], "auth");
    ws.send(pack(&json!([{"T": "success", "msg": "authenticated"}])))
        .await
        .unwrap();
    auth
}

/// Next connection event, skipping the StateChanged notifications
async fn next_connection_event(events: &mut UnboundedReceiver<Event>) -> ConnectionEvent {
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");
        match event {
            Event::Connection(ConnectionEvent::StateChanged(_)) => continue,
            Event::Connection(event) => return event,
            _ => continue,
        }
    }
}

async fn wait_authenticated(events: &mut UnboundedReceiver<Event>, expect_first: bool) {
    loop {
        if let ConnectionEvent::Authenticated { first } = next_connection_event(events).await {
            assert_eq!(first, expect_first);
            return;
        }
    }
}

async fn wait_reconnecting(events: &mut UnboundedReceiver<Event>) -> (u32, Duration) {
    loop {
        if let ConnectionEvent::Reconnecting { attempt, delay } =
            next_connection_event(events).await
        {
            return (attempt, delay);
        }
    }
}

#[tokio::test]
async fn test_connect_authenticates_in_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let auth = authenticate(&mut ws).await;
        // Hold the session open until the client closes
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
        auth
    });

    let config = ConnectionConfig::new(Endpoint::Custom(format!("ws://{addr}")), credentials())
        .without_reconnect();
    let stream = Arc::new(DataStream::new(config));
    let mut events = stream.take_event_receiver().unwrap();

    let runner = {
        let stream = Arc::clone(&stream);
        tokio::spawn(async move { stream.connect_and_run().await })
    };

    assert!(matches!(
        next_connection_event(&mut events).await,
        ConnectionEvent::Connecting
    ));
    assert!(matches!(
        next_connection_event(&mut events).await,
        ConnectionEvent::Authenticating
    ));
    assert!(matches!(
        next_connection_event(&mut events).await,
        ConnectionEvent::Connected
    ));
    match next_connection_event(&mut events).await {
        ConnectionEvent::Authenticated { first } => assert!(first),
        other => panic!("expected authenticated, got {other:?}"),
    }
    assert_eq!(stream.state(), ConnState::Authenticated);

    stream.disconnect();
    timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let auth = timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert_eq!(auth["key"], "AKTEST");
}

#[tokio::test]
async fn test_rejected_credentials_surface_auth_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        ws.send(pack(&json!([{"T": "success", "msg": "connected"}])))
            .await
            .unwrap();
        let auth = next_frame(&mut ws).await;
        assert_eq!(auth["action"], "auth");
        ws.send(pack(&json!([{"T": "error", "code": 402, "msg": "auth failed"}])))
            .await
            .unwrap();
        let _ = ws.close(None).await;
    });

    let config = ConnectionConfig::new(Endpoint::Custom(format!("ws://{addr}")), credentials())
        .without_reconnect();
    let stream = DataStream::new(config);
    let mut events = stream.take_event_receiver().unwrap();

    let result = timeout(Duration::from_secs(5), stream.connect_and_run())
        .await
        .unwrap();
    assert!(result.is_err());
    assert_eq!(stream.state(), ConnState::Disconnected);

    let mut saw_auth_error = false;
    while let Ok(event) = events.try_recv() {
        if let Event::Connection(ConnectionEvent::StreamError { code, message }) = event {
            assert_eq!(code, Some(StreamErrorCode::AuthFailed));
            assert_eq!(message, "auth failed");
            saw_auth_error = true;
        }
    }
    assert!(saw_auth_error, "auth rejection was not surfaced");
    timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_reconnect_replays_subscriptions_and_keeps_backoff() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        // First session: auth, consume the queued subscribe, then drop
        let mut ws = accept(&listener).await;
        authenticate(&mut ws).await;
        let queued = next_frame(&mut ws).await;
        assert_eq!(queued["action"], "subscribe");
        let _ = ws.close(None).await;

        // Second session: the replay frame arrives right after auth
        let mut ws = accept(&listener).await;
        authenticate(&mut ws).await;
        let replay = next_frame(&mut ws).await;
        let _ = ws.close(None).await;
        replay
    });

    let reconnect = ReconnectConfig::new()
        .with_initial_delay(Duration::from_millis(50))
        .with_increment(Duration::from_millis(50))
        .with_max_delay(Duration::from_secs(1));
    let config = ConnectionConfig::new(Endpoint::Custom(format!("ws://{addr}")), credentials())
        .with_reconnect(reconnect);
    let stream = Arc::new(DataStream::new(config));
    stream
        .subscribe(ChannelKind::Trades, vec!["AAPL".to_string()])
        .unwrap();
    let mut events = stream.take_event_receiver().unwrap();

    let runner = {
        let stream = Arc::clone(&stream);
        tokio::spawn(async move { stream.connect_and_run().await })
    };

    // First session comes up, then the server drops it
    wait_authenticated(&mut events, true).await;
    let (attempt, delay) = wait_reconnecting(&mut events).await;
    assert_eq!(attempt, 1);
    assert_eq!(delay, Duration::from_millis(50));

    // Second session replays the tracked subscriptions
    wait_authenticated(&mut events, false).await;
    match next_connection_event(&mut events).await {
        ConnectionEvent::SubscriptionsReplayed { channels } => assert_eq!(channels, 1),
        other => panic!("expected replay, got {other:?}"),
    }

    // The server drops again: the delay keeps growing, the successful
    // session in between did not reset it
    let (attempt, delay) = wait_reconnecting(&mut events).await;
    assert_eq!(attempt, 2);
    assert_eq!(delay, Duration::from_millis(100));

    stream.disconnect();
    let _ = timeout(Duration::from_secs(5), runner).await.unwrap().unwrap();

    let replay = timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert_eq!(replay["action"], "subscribe");
    assert_eq!(replay["trades"][0], "AAPL");
}
