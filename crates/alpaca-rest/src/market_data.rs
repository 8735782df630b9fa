//! Historical market data, news and snapshot endpoints
//!
//! Paginated endpoints return [`PageStream`]s; nothing is fetched until the
//! stream is polled. Multi-symbol responses arrive as `{symbol: [items]}`
//! maps and are demultiplexed into `(symbol, record)` pairs, preserving the
//! server's per-symbol ordering. Item payloads use the same short field
//! codes as the live stream and go through the same codec.

use crate::client::RestClient;
use crate::error::{RestError, RestResult};
use crate::pagination::{Page, PageStream, MAX_NEWS_PAGE_SIZE, MAX_PAGE_SIZE};

use alpaca_types::{codec, ChannelKind, Feed, Record};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

const STOCKS_PATH: &str = "/v2/stocks";
const CRYPTO_PATH: &str = "/v1beta3/crypto/us";
const NEWS_PATH: &str = "/v1beta1/news";

/// Parameters shared by the historical endpoints
#[derive(Debug, Clone, Default)]
pub struct HistoryParams {
    /// Inclusive range start
    pub start: Option<DateTime<Utc>>,
    /// Inclusive range end
    pub end: Option<DateTime<Utc>>,
    /// Total item cap across all pages; `None` streams everything
    pub limit: Option<usize>,
    /// Equities data feed override
    pub feed: Option<Feed>,
    /// Sort order ("asc" or "desc")
    pub sort: Option<String>,
}

impl HistoryParams {
    /// Empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive range start
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the inclusive range end
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Cap the total number of items
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Select the equities data feed
    pub fn with_feed(mut self, feed: Feed) -> Self {
        self.feed = Some(feed);
        self
    }

    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(start) = &self.start {
            query.push((
                "start".to_string(),
                start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ));
        }
        if let Some(end) = &self.end {
            query.push((
                "end".to_string(),
                end.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ));
        }
        if let Some(feed) = &self.feed {
            query.push(("feed".to_string(), feed.to_string()));
        }
        if let Some(sort) = &self.sort {
            query.push(("sort".to_string(), sort.clone()));
        }
        query
    }
}

/// Parameters for the news endpoint
#[derive(Debug, Clone, Default)]
pub struct NewsParams {
    /// Restrict to these symbols; empty means all
    pub symbols: Vec<String>,
    /// Inclusive range start
    pub start: Option<DateTime<Utc>>,
    /// Inclusive range end
    pub end: Option<DateTime<Utc>>,
    /// Total item cap across all pages
    pub limit: Option<usize>,
    /// Include full article content
    pub include_content: bool,
}

impl NewsParams {
    /// Empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given symbols
    pub fn with_symbols(mut self, symbols: Vec<String>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Cap the total number of articles
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if !self.symbols.is_empty() {
            query.push(("symbols".to_string(), self.symbols.join(",")));
        }
        if let Some(start) = &self.start {
            query.push((
                "start".to_string(),
                start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ));
        }
        if let Some(end) = &self.end {
            query.push((
                "end".to_string(),
                end.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ));
        }
        if self.include_content {
            query.push(("include_content".to_string(), "true".to_string()));
        }
        query
    }
}

impl RestClient {
    // ========================================================================
    // Historical equities data
    // ========================================================================

    /// Stream historical trades for the given symbols
    pub fn stock_trades(
        &self,
        symbols: Vec<String>,
        params: HistoryParams,
    ) -> PageStream<(String, Record)> {
        self.history_stream(STOCKS_PATH, "trades", ChannelKind::Trades, symbols, params)
    }

    /// Stream historical NBBO quotes for the given symbols
    pub fn stock_quotes(
        &self,
        symbols: Vec<String>,
        params: HistoryParams,
    ) -> PageStream<(String, Record)> {
        self.history_stream(STOCKS_PATH, "quotes", ChannelKind::Quotes, symbols, params)
    }

    /// Stream historical bars for the given symbols
    ///
    /// `timeframe` follows the API's notation, e.g. "1Min", "5Min", "1Day".
    pub fn stock_bars(
        &self,
        symbols: Vec<String>,
        timeframe: &str,
        params: HistoryParams,
    ) -> PageStream<(String, Record)> {
        self.bars_stream(STOCKS_PATH, symbols, timeframe, params)
    }

    /// Stream historical trades for one symbol
    ///
    /// Uses the per-symbol endpoint, so items arrive as bare records
    /// without the symbol demux step.
    pub fn stock_trades_for(&self, symbol: &str, params: HistoryParams) -> PageStream<Record> {
        let path = format!("{STOCKS_PATH}/{symbol}/trades");
        self.single_stream(path, "trades", ChannelKind::Trades, params.limit, params.to_query())
    }

    /// Stream historical quotes for one symbol
    pub fn stock_quotes_for(&self, symbol: &str, params: HistoryParams) -> PageStream<Record> {
        let path = format!("{STOCKS_PATH}/{symbol}/quotes");
        self.single_stream(path, "quotes", ChannelKind::Quotes, params.limit, params.to_query())
    }

    /// Stream historical bars for one symbol
    pub fn stock_bars_for(
        &self,
        symbol: &str,
        timeframe: &str,
        params: HistoryParams,
    ) -> PageStream<Record> {
        let path = format!("{STOCKS_PATH}/{symbol}/bars");
        let mut query = params.to_query();
        query.push(("timeframe".to_string(), timeframe.to_string()));
        self.single_stream(path, "bars", ChannelKind::Bars, params.limit, query)
    }

    // ========================================================================
    // Historical crypto data
    // ========================================================================

    /// Stream historical trades for the given pairs (e.g. "BTC/USD")
    pub fn crypto_trades(
        &self,
        symbols: Vec<String>,
        params: HistoryParams,
    ) -> PageStream<(String, Record)> {
        self.history_stream(CRYPTO_PATH, "trades", ChannelKind::Trades, symbols, params)
    }

    /// Stream historical quotes for the given pairs
    pub fn crypto_quotes(
        &self,
        symbols: Vec<String>,
        params: HistoryParams,
    ) -> PageStream<(String, Record)> {
        self.history_stream(CRYPTO_PATH, "quotes", ChannelKind::Quotes, symbols, params)
    }

    /// Stream historical bars for the given pairs
    pub fn crypto_bars(
        &self,
        symbols: Vec<String>,
        timeframe: &str,
        params: HistoryParams,
    ) -> PageStream<(String, Record)> {
        self.bars_stream(CRYPTO_PATH, symbols, timeframe, params)
    }

    // ========================================================================
    // News
    // ========================================================================

    /// Stream news articles, newest first
    pub fn news(&self, params: NewsParams) -> PageStream<Record> {
        let client = self.clone();
        let limit = params.limit;
        let query = params.to_query();

        PageStream::new(limit, MAX_NEWS_PAGE_SIZE, move |token, size| {
            let client = client.clone();
            let mut query = query.clone();
            query.push(("limit".to_string(), size.to_string()));
            if let Some(token) = token {
                query.push(("page_token".to_string(), token));
            }

            Box::pin(async move {
                let body = client.get_json(NEWS_PATH, &query).await?;
                Ok(Page {
                    items: decode_items(ChannelKind::News, &body, "news"),
                    next_page_token: next_token(&body),
                })
            })
        })
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Current snapshots (latest trade/quote plus bars) per equity symbol
    pub async fn stock_snapshots(
        &self,
        symbols: &[String],
    ) -> RestResult<BTreeMap<String, Record>> {
        let query = vec![("symbols".to_string(), symbols.join(","))];
        let body = self
            .get_json(&format!("{STOCKS_PATH}/snapshots"), &query)
            .await?;
        decode_snapshots(body.as_object().ok_or_else(|| {
            RestError::Parse("snapshot response is not an object".to_string())
        })?)
    }

    /// Current snapshots per crypto pair
    pub async fn crypto_snapshots(
        &self,
        symbols: &[String],
    ) -> RestResult<BTreeMap<String, Record>> {
        let query = vec![("symbols".to_string(), symbols.join(","))];
        let body = self
            .get_json(&format!("{CRYPTO_PATH}/snapshots"), &query)
            .await?;
        // Crypto nests the per-symbol map one level down
        let map = body
            .get("snapshots")
            .and_then(Value::as_object)
            .ok_or_else(|| RestError::Parse("missing snapshots object".to_string()))?;
        decode_snapshots(map)
    }

    // ========================================================================
    // Shared fetch plumbing
    // ========================================================================

    fn history_stream(
        &self,
        base: &str,
        resource: &str,
        kind: ChannelKind,
        symbols: Vec<String>,
        params: HistoryParams,
    ) -> PageStream<(String, Record)> {
        let path = format!("{base}/{resource}");
        let mut query = params.to_query();
        query.push(("symbols".to_string(), symbols.join(",")));
        self.demuxed_stream(path, resource.to_string(), kind, params.limit, query)
    }

    fn bars_stream(
        &self,
        base: &str,
        symbols: Vec<String>,
        timeframe: &str,
        params: HistoryParams,
    ) -> PageStream<(String, Record)> {
        let path = format!("{base}/bars");
        let mut query = params.to_query();
        query.push(("symbols".to_string(), symbols.join(",")));
        query.push(("timeframe".to_string(), timeframe.to_string()));
        self.demuxed_stream(path, "bars".to_string(), ChannelKind::Bars, params.limit, query)
    }

    fn single_stream(
        &self,
        path: String,
        payload_key: &'static str,
        kind: ChannelKind,
        limit: Option<usize>,
        query: Vec<(String, String)>,
    ) -> PageStream<Record> {
        let client = self.clone();

        PageStream::new(limit, MAX_PAGE_SIZE, move |token, size| {
            let client = client.clone();
            let path = path.clone();
            let mut query = query.clone();
            query.push(("limit".to_string(), size.to_string()));
            if let Some(token) = token {
                query.push(("page_token".to_string(), token));
            }

            Box::pin(async move {
                let body = client.get_json(&path, &query).await?;
                Ok(Page {
                    items: decode_items(kind, &body, payload_key),
                    next_page_token: next_token(&body),
                })
            })
        })
    }

    fn demuxed_stream(
        &self,
        path: String,
        payload_key: String,
        kind: ChannelKind,
        limit: Option<usize>,
        query: Vec<(String, String)>,
    ) -> PageStream<(String, Record)> {
        let client = self.clone();

        PageStream::new(limit, MAX_PAGE_SIZE, move |token, size| {
            let client = client.clone();
            let path = path.clone();
            let payload_key = payload_key.clone();
            let mut query = query.clone();
            query.push(("limit".to_string(), size.to_string()));
            if let Some(token) = token {
                query.push(("page_token".to_string(), token));
            }

            Box::pin(async move {
                let body = client.get_json(&path, &query).await?;
                let items = demux(kind, &body, &payload_key);
                Ok(Page {
                    items,
                    next_page_token: next_token(&body),
                })
            })
        })
    }
}

/// Cursor from a response body; absent or null means exhausted
fn next_token(body: &Value) -> Option<String> {
    body.get("next_page_token")
        .and_then(Value::as_str)
        .map(String::from)
}

/// Decode a flat `[items]` payload (per-symbol endpoints, news)
fn decode_items(kind: ChannelKind, body: &Value, key: &str) -> Vec<Record> {
    body.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| codec::decode_value(kind, item))
                .collect()
        })
        .unwrap_or_default()
}

/// Flatten a `{symbol: [items]}` payload into decoded `(symbol, record)`
/// pairs, preserving each symbol's server order
fn demux(kind: ChannelKind, body: &Value, key: &str) -> Vec<(String, Record)> {
    let mut out = Vec::new();
    let Some(per_symbol) = body.get(key).and_then(Value::as_object) else {
        return out;
    };
    for (symbol, items) in per_symbol {
        let Some(items) = items.as_array() else {
            continue;
        };
        for item in items {
            out.push((symbol.clone(), codec::decode_value(kind, item)));
        }
    }
    out
}

fn decode_snapshots(
    map: &serde_json::Map<String, Value>,
) -> RestResult<BTreeMap<String, Record>> {
    let mut out = BTreeMap::new();
    for (symbol, snapshot) in map {
        // Skip response metadata alongside the per-symbol objects
        if let Some(raw) = snapshot.as_object() {
            out.insert(symbol.clone(), codec::decode_snapshot(raw));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_demux_preserves_per_symbol_order() {
        let body = json!({
            "trades": {
                "AAPL": [
                    {"t": "2024-01-02T10:00:00Z", "p": 180.5, "s": 10},
                    {"t": "2024-01-02T10:00:01Z", "p": 180.6, "s": 5}
                ],
                "MSFT": [
                    {"t": "2024-01-02T10:00:00Z", "p": 390.0, "s": 7}
                ]
            },
            "next_page_token": "abc"
        });

        let items = demux(ChannelKind::Trades, &body, "trades");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].0, "AAPL");
        assert_eq!(items[1].0, "AAPL");
        assert_eq!(items[2].0, "MSFT");

        // Codec ran: short codes became long names
        assert_eq!(items[0].1.f64_field("Price"), Some(180.5));
        assert_eq!(items[0].1.u64_field("Size"), Some(10));
        assert!(items[0].1.get("p").is_none());

        assert_eq!(next_token(&body).as_deref(), Some("abc"));
    }

    #[test]
    fn test_decode_items_flat_payload() {
        let body = json!({
            "trades": [
                {"t": "2024-01-02T10:00:00Z", "p": 180.5, "s": 10, "x": "V"},
                {"t": "2024-01-02T10:00:01Z", "p": 180.6, "s": 5, "x": "N"}
            ],
            "symbol": "AAPL",
            "next_page_token": null
        });

        let items = decode_items(ChannelKind::Trades, &body, "trades");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].f64_field("Price"), Some(180.5));
        assert_eq!(items[1].str_field("Exchange"), Some("N"));

        // Missing payload key is an empty page, not an error
        assert!(decode_items(ChannelKind::Quotes, &body, "quotes").is_empty());
    }

    #[test]
    fn test_next_token_absent_or_null() {
        assert_eq!(next_token(&json!({"trades": {}})), None);
        assert_eq!(next_token(&json!({"next_page_token": null})), None);
    }

    #[test]
    fn test_decode_snapshots_dispatches_nested_records() {
        let map = json!({
            "AAPL": {
                "latestTrade": {"t": "2024-01-02T10:00:00Z", "p": 180.5, "s": 10},
                "latestQuote": {"bp": 180.4, "ap": 180.6},
                "dailyBar": {"o": 179.0, "h": 181.0, "l": 178.5, "c": 180.5, "v": 1000}
            }
        });

        let snapshots = decode_snapshots(map.as_object().unwrap()).unwrap();
        let aapl = &snapshots["AAPL"];
        let trade = aapl.sub_record("LatestTrade").unwrap();
        assert_eq!(trade.f64_field("Price"), Some(180.5));
        let bar = aapl.sub_record("DailyBar").unwrap();
        assert_eq!(bar.f64_field("OpenPrice"), Some(179.0));
    }
}
