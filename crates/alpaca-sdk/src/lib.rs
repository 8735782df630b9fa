//! High-level SDK for the Alpaca market data and streaming APIs
//!
//! This crate ties together the streaming clients (stocks, crypto, options,
//! news and account events) and the REST client for historical data, news
//! and snapshots, behind one credential-holding entry point.
//!
//! # Quick Start
//!
//! ```no_run
//! use alpaca_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials from APCA_API_KEY_ID / APCA_API_SECRET_KEY
//!     let client = AlpacaClient::builder().build()?;
//!
//!     // Live trades over the stream
//!     let stocks = client.stocks_stream();
//!     stocks.subscribe_trades(vec!["AAPL".to_string(), "MSFT".to_string()])?;
//!
//!     let mut events = stocks.take_event_receiver().unwrap();
//!     tokio::spawn(async move { stocks.connect_and_run().await });
//!
//!     while let Some(event) = events.recv().await {
//!         if let Event::Market(MarketEvent::Trade(trade)) = event {
//!             println!(
//!                 "{:?} @ {:?}",
//!                 trade.symbol(),
//!                 trade.decimal_field("Price")
//!             );
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **Simple API**: Builder pattern for configuration
//! - **Automatic Reconnection**: Linear backoff with subscription replay
//! - **Open Schema**: Wire field codes decoded to long names, unknown
//!   fields passed through
//! - **Lazy Pagination**: Historical fetchers follow cursors on demand

pub mod builder;
pub mod client;
pub mod prelude;

// Re-export main types
pub use builder::AlpacaClientBuilder;
pub use client::AlpacaClient;

// Re-export commonly used types from dependencies
pub use alpaca_rest::{HistoryParams, NewsParams, RestClient};
pub use alpaca_types::{AlpacaError, ChannelKind, Credentials, Feed, OptionsFeed, Record};
pub use alpaca_ws::{ConnState, Endpoint, Event, MarketEvent, ReconnectConfig};
