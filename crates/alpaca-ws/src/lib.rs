//! Native WebSocket client for the Alpaca streaming APIs
//!
//! This crate provides a production-ready WebSocket client for the market
//! data streams (stocks, crypto, options, news) and the account event
//! stream.
//!
//! # Features
//!
//! - Automatic reconnection with linear backoff
//! - Subscription management with replay after reconnect
//! - Short wire field codes decoded to long names on arrival
//! - Event-driven architecture with a closed event enum
//!
//! # Example
//!
//! ```no_run
//! use alpaca_ws::StocksStream;
//! use alpaca_types::{Credentials, Feed};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::from_env()?;
//!     let stream = StocksStream::new(Feed::Iex, credentials);
//!     stream.subscribe_trades(vec!["AAPL".to_string()])?;
//!
//!     let mut events = stream.take_event_receiver().unwrap();
//!
//!     // Spawn connection task
//!     tokio::spawn(async move {
//!         stream.connect_and_run().await
//!     });
//!
//!     // Process events
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod connection;
pub mod endpoint;
pub mod events;
pub mod feeds;
pub mod reconnect;
pub mod subscription;

// Re-export main types
pub use account::{AccountConfig, AccountEndpoint, AccountStream, TRADE_UPDATES};
pub use connection::{ConnState, ConnectionConfig, DataStream};
pub use endpoint::Endpoint;
pub use events::{
    AccountEvent, ConnectionEvent, DisconnectReason, Event, MarketEvent, SubscriptionEvent,
};
pub use feeds::{CryptoStream, NewsStream, OptionsStream, StocksStream};
pub use reconnect::ReconnectConfig;
pub use subscription::SubscriptionMap;
