//! REST client for the Alpaca market data APIs
//!
//! Historical trades, quotes and bars for equities and crypto, news and
//! snapshots. Paginated endpoints return lazy streams that follow the
//! `next_page_token` cursor on demand.
//!
//! # Example
//!
//! ```no_run
//! use alpaca_rest::{HistoryParams, RestClient};
//! use alpaca_types::Credentials;
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::new(Credentials::from_env()?);
//!
//!     let mut trades = client.stock_trades(
//!         vec!["AAPL".to_string()],
//!         HistoryParams::new().with_limit(100),
//!     );
//!     while let Some(item) = trades.next().await {
//!         let (symbol, trade) = item?;
//!         println!("{symbol}: {:?}", trade.decimal_field("Price"));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod market_data;
pub mod pagination;

// Re-export main types
pub use client::{ClientConfig, RestClient, DATA_URL, SANDBOX_DATA_URL};
pub use error::{RestError, RestResult};
pub use market_data::{HistoryParams, NewsParams};
pub use pagination::{Page, PageStream, MAX_NEWS_PAGE_SIZE, MAX_PAGE_SIZE};
