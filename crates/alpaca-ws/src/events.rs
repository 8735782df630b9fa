//! Connection, subscription, market data and account events
//!
//! The stream surfaces everything through one closed [`Event`] enum consumed
//! from an mpsc receiver, so there are no stringly-typed event names: each
//! event kind is a variant with its own payload type.

use crate::connection::ConnState;
use alpaca_types::{ChannelKind, Record, StreamErrorCode, SubscriptionAck};
use serde_json::Value;
use std::time::Duration;

/// Reason for disconnection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Server closed the connection
    ServerClosed,
    /// Network error occurred
    NetworkError(String),
    /// No traffic within the liveness window
    LivenessTimeout,
    /// Client requested disconnect
    Shutdown,
}

/// Connection lifecycle events
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Generic notification emitted on every state transition
    StateChanged(ConnState),
    /// Dialing the endpoint
    Connecting,
    /// Transport-level ack received (pre-auth "connected" frame)
    Connected,
    /// Auth frame sent, waiting for the server's verdict
    Authenticating,
    /// Authentication succeeded
    Authenticated {
        /// True only on the first successful authentication of this
        /// session; reconnects set this to false and replay subscriptions
        /// instead of re-running first-connect callbacks
        first: bool,
    },
    /// Connection was lost or closed
    Disconnected {
        /// Reason for disconnection
        reason: DisconnectReason,
    },
    /// Waiting before the next reconnection attempt
    Reconnecting {
        /// Attempt number (1-indexed)
        attempt: u32,
        /// Delay before this attempt
        delay: Duration,
    },
    /// Tracked subscriptions replayed after a reconnect
    SubscriptionsReplayed {
        /// Number of channel kinds replayed
        channels: usize,
    },
    /// Server error frame or malformed inbound frame
    ///
    /// Not fatal by itself; the connection stays open unless the server
    /// closes it.
    StreamError {
        /// Parsed error code, if the frame carried a known one
        code: Option<StreamErrorCode>,
        /// Resolved human-readable message
        message: String,
    },
}

/// Subscription events
#[derive(Debug, Clone)]
pub enum SubscriptionEvent {
    /// Server ack applied: local state now equals exactly this echo
    Updated(SubscriptionAck),
}

/// Market data events, one variant per channel kind
#[derive(Debug, Clone)]
pub enum MarketEvent {
    /// Executed trade
    Trade(Record),
    /// NBBO quote
    Quote(Record),
    /// Minute bar
    Bar(Record),
    /// Correction to a previously emitted bar
    UpdatedBar(Record),
    /// Daily bar
    DailyBar(Record),
    /// Trading status change
    Status(Record),
    /// Limit-up / limit-down band
    Luld(Record),
    /// Trade cancel error
    CancelError(Record),
    /// Trade correction
    Correction(Record),
    /// Orderbook snapshot or delta
    Orderbook(Record),
    /// News article
    News(Record),
}

impl MarketEvent {
    /// Wrap a decoded record in the variant for its kind
    pub fn from_record(kind: ChannelKind, record: Record) -> Self {
        match kind {
            ChannelKind::Trades => Self::Trade(record),
            ChannelKind::Quotes => Self::Quote(record),
            ChannelKind::Bars => Self::Bar(record),
            ChannelKind::UpdatedBars => Self::UpdatedBar(record),
            ChannelKind::DailyBars => Self::DailyBar(record),
            ChannelKind::Statuses => Self::Status(record),
            ChannelKind::Lulds => Self::Luld(record),
            ChannelKind::CancelErrors => Self::CancelError(record),
            ChannelKind::Corrections => Self::Correction(record),
            ChannelKind::Orderbooks => Self::Orderbook(record),
            ChannelKind::News => Self::News(record),
        }
    }

    /// The decoded record regardless of kind
    pub fn record(&self) -> &Record {
        match self {
            Self::Trade(r)
            | Self::Quote(r)
            | Self::Bar(r)
            | Self::UpdatedBar(r)
            | Self::DailyBar(r)
            | Self::Status(r)
            | Self::Luld(r)
            | Self::CancelError(r)
            | Self::Correction(r)
            | Self::Orderbook(r)
            | Self::News(r) => r,
        }
    }
}

/// Account event stream (trade_updates) events
#[derive(Debug, Clone)]
pub enum AccountEvent {
    /// Auth accepted on the account stream
    Authorized,
    /// Listen request acknowledged
    Listening {
        /// Streams now being listened to
        streams: Vec<String>,
    },
    /// Order state changed
    OrderUpdate {
        /// Event name ("fill", "partial_fill", "canceled", ...)
        event: String,
        /// Raw payload including the order object
        data: Value,
    },
}

/// Combined event type for event streams
#[derive(Debug, Clone)]
pub enum Event {
    /// Connection-related event
    Connection(ConnectionEvent),
    /// Subscription-related event
    Subscription(SubscriptionEvent),
    /// Market data event
    Market(MarketEvent),
    /// Account stream event
    Account(AccountEvent),
}

impl From<ConnectionEvent> for Event {
    fn from(event: ConnectionEvent) -> Self {
        Event::Connection(event)
    }
}

impl From<SubscriptionEvent> for Event {
    fn from(event: SubscriptionEvent) -> Self {
        Event::Subscription(event)
    }
}

impl From<MarketEvent> for Event {
    fn from(event: MarketEvent) -> Self {
        Event::Market(event)
    }
}

impl From<AccountEvent> for Event {
    fn from(event: AccountEvent) -> Self {
        Event::Account(event)
    }
}
