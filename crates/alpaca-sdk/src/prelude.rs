//! Re-exports for convenience
//!
//! Import everything you need with:
//! ```
//! use alpaca_sdk::prelude::*;
//! ```

// Client
pub use crate::builder::{AlpacaClientBuilder, ConfigError};
pub use crate::client::AlpacaClient;

// Shared types
pub use alpaca_types::{
    AlpacaError, ChannelKind, Credentials, Feed, OptionsFeed, Record, StreamErrorCode,
    StreamFrame, StreamResult, SubscribeRequest, SubscriptionAck,
};

// Streaming types
pub use alpaca_ws::{
    AccountConfig, AccountEndpoint, AccountEvent, AccountStream, ConnState, ConnectionConfig,
    ConnectionEvent, CryptoStream, DataStream, DisconnectReason, Endpoint, Event, MarketEvent,
    NewsStream, OptionsStream, ReconnectConfig, StocksStream, SubscriptionEvent, SubscriptionMap,
};

// REST types
pub use alpaca_rest::{HistoryParams, NewsParams, Page, PageStream, RestClient, RestError, RestResult};

// Decimal for prices and sizes
pub use rust_decimal::Decimal;
