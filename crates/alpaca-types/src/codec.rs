//! Frame codec: wire field-code to long-form name remapping
//!
//! Stream frames and REST payloads carry compact field codes (`p`, `s`,
//! `bp`, ...). Decoding is a pure structural transform: every key present in
//! the raw payload is copied through, renamed when the kind's table knows it
//! and passed through verbatim otherwise. Values are never validated here; a
//! missing field simply does not appear in the output.

use crate::enums::ChannelKind;
use crate::record::Record;
use serde_json::{Map, Value};

type RenameTable = &'static [(&'static str, &'static str)];

const TRADE_TABLE: RenameTable = &[
    ("S", "Symbol"),
    ("i", "ID"),
    ("x", "Exchange"),
    ("p", "Price"),
    ("s", "Size"),
    ("t", "Timestamp"),
    ("c", "Conditions"),
    ("z", "Tape"),
    ("tks", "TakerSide"),
];

const QUOTE_TABLE: RenameTable = &[
    ("S", "Symbol"),
    ("bx", "BidExchange"),
    ("bp", "BidPrice"),
    ("bs", "BidSize"),
    ("ax", "AskExchange"),
    ("ap", "AskPrice"),
    ("as", "AskSize"),
    ("t", "Timestamp"),
    ("c", "Conditions"),
    ("x", "Exchange"),
    ("z", "Tape"),
];

const BAR_TABLE: RenameTable = &[
    ("S", "Symbol"),
    ("o", "OpenPrice"),
    ("h", "HighPrice"),
    ("l", "LowPrice"),
    ("c", "ClosePrice"),
    ("v", "Volume"),
    ("t", "Timestamp"),
    ("vw", "VWAP"),
    ("n", "TradeCount"),
];

const STATUS_TABLE: RenameTable = &[
    ("S", "Symbol"),
    ("sc", "StatusCode"),
    ("sm", "StatusMessage"),
    ("rc", "ReasonCode"),
    ("rm", "ReasonMessage"),
    ("t", "Timestamp"),
    ("z", "Tape"),
];

const LULD_TABLE: RenameTable = &[
    ("S", "Symbol"),
    ("u", "LimitUpPrice"),
    ("d", "LimitDownPrice"),
    ("i", "Indicator"),
    ("t", "Timestamp"),
    ("z", "Tape"),
];

const CANCEL_ERROR_TABLE: RenameTable = &[
    ("S", "Symbol"),
    ("i", "ID"),
    ("x", "Exchange"),
    ("p", "Price"),
    ("s", "Size"),
    ("a", "CancelErrorAction"),
    ("z", "Tape"),
    ("t", "Timestamp"),
];

const CORRECTION_TABLE: RenameTable = &[
    ("S", "Symbol"),
    ("x", "Exchange"),
    ("oi", "OriginalID"),
    ("op", "OriginalPrice"),
    ("os", "OriginalSize"),
    ("oc", "OriginalConditions"),
    ("ci", "CorrectedID"),
    ("cp", "CorrectedPrice"),
    ("cs", "CorrectedSize"),
    ("cc", "CorrectedConditions"),
    ("z", "Tape"),
    ("t", "Timestamp"),
];

const ORDERBOOK_TABLE: RenameTable = &[
    ("S", "Symbol"),
    ("x", "Exchange"),
    ("t", "Timestamp"),
    ("b", "Bids"),
    ("a", "Asks"),
    ("r", "Reset"),
];

const NEWS_TABLE: RenameTable = &[
    ("id", "ID"),
    ("headline", "Headline"),
    ("summary", "Summary"),
    ("author", "Author"),
    ("created_at", "CreatedAt"),
    ("updated_at", "UpdatedAt"),
    ("url", "URL"),
    ("content", "Content"),
    ("symbols", "Symbols"),
    ("source", "Source"),
    ("images", "Images"),
];

/// Snapshot sub-records, each decoded with its own kind
const SNAPSHOT_NESTED: &[(&str, &str, ChannelKind)] = &[
    ("latestTrade", "LatestTrade", ChannelKind::Trades),
    ("latestQuote", "LatestQuote", ChannelKind::Quotes),
    ("minuteBar", "MinuteBar", ChannelKind::Bars),
    ("dailyBar", "DailyBar", ChannelKind::Bars),
    ("prevDailyBar", "PrevDailyBar", ChannelKind::Bars),
];

fn rename_table(kind: ChannelKind) -> RenameTable {
    match kind {
        ChannelKind::Trades => TRADE_TABLE,
        ChannelKind::Quotes => QUOTE_TABLE,
        ChannelKind::Bars | ChannelKind::UpdatedBars | ChannelKind::DailyBars => BAR_TABLE,
        ChannelKind::Statuses => STATUS_TABLE,
        ChannelKind::Lulds => LULD_TABLE,
        ChannelKind::CancelErrors => CANCEL_ERROR_TABLE,
        ChannelKind::Corrections => CORRECTION_TABLE,
        ChannelKind::Orderbooks => ORDERBOOK_TABLE,
        ChannelKind::News => NEWS_TABLE,
    }
}

fn long_name(table: RenameTable, key: &str) -> Option<&'static str> {
    table.iter().find(|(short, _)| *short == key).map(|(_, long)| *long)
}

/// Decode a raw record of the given kind
///
/// Known keys are renamed per the kind's table; unknown keys are copied
/// through unchanged (the schema is open and server additions must survive).
pub fn decode(kind: ChannelKind, raw: &Map<String, Value>) -> Record {
    let table = rename_table(kind);
    let mut out = Map::with_capacity(raw.len());
    for (key, value) in raw {
        match long_name(table, key) {
            Some(long) => out.insert(long.to_string(), value.clone()),
            None => out.insert(key.clone(), value.clone()),
        };
    }
    Record::new(out)
}

/// Decode a raw value of the given kind
///
/// Non-object values produce an empty record; the codec never fails.
pub fn decode_value(kind: ChannelKind, raw: &Value) -> Record {
    match raw.as_object() {
        Some(map) => decode(kind, map),
        None => Record::new(Map::new()),
    }
}

/// Decode a snapshot record
///
/// Embedded sub-records (`latestTrade`, `latestQuote`, `minuteBar`,
/// `dailyBar`, `prevDailyBar`) are recursively dispatched through the codec
/// with their own kinds; everything else passes through.
pub fn decode_snapshot(raw: &Map<String, Value>) -> Record {
    let mut out = Map::with_capacity(raw.len());
    for (key, value) in raw {
        if let Some((_, long, sub_kind)) =
            SNAPSHOT_NESTED.iter().find(|(short, _, _)| short == key)
        {
            out.insert(long.to_string(), decode_value(*sub_kind, value).into_value());
        } else if key == "symbol" {
            out.insert("Symbol".to_string(), value.clone());
        } else {
            out.insert(key.clone(), value.clone());
        }
    }
    Record::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object fixture")
    }

    #[test]
    fn test_decode_trade() {
        let raw = as_map(json!({
            "T": "t", "S": "AAPL", "p": 144.6, "s": 25,
            "t": "2021-06-09T19:59:59.898542039Z",
            "x": "Q", "c": ["@"], "z": "C", "i": 1532
        }));
        let record = decode(ChannelKind::Trades, &raw);

        assert_eq!(record.str_field("Symbol"), Some("AAPL"));
        assert_eq!(record.f64_field("Price"), Some(144.6));
        assert_eq!(record.u64_field("Size"), Some(25));
        assert_eq!(record.str_field("Exchange"), Some("Q"));
        assert_eq!(record.str_field("Tape"), Some("C"));
        assert_eq!(record.u64_field("ID"), Some(1532));
        assert_eq!(
            record.str_field("Timestamp"),
            Some("2021-06-09T19:59:59.898542039Z")
        );
        // short keys must be gone, unknown keys must survive
        assert!(record.get("p").is_none());
        assert!(record.get("S").is_none());
        assert_eq!(record.str_field("T"), Some("t"));
    }

    #[test]
    fn test_decode_quote_keeps_unknown_keys() {
        let raw = as_map(json!({
            "S": "MSFT", "bp": 310.1, "bs": 2, "ap": 310.2, "as": 1,
            "future_field": true
        }));
        let record = decode(ChannelKind::Quotes, &raw);

        assert_eq!(record.f64_field("BidPrice"), Some(310.1));
        assert_eq!(record.f64_field("AskPrice"), Some(310.2));
        assert_eq!(record.get("future_field"), Some(&json!(true)));
        assert!(record.get("bp").is_none());
    }

    #[test]
    fn test_updated_and_daily_bars_share_bar_table() {
        let raw = as_map(json!({"S": "SPY", "o": 1.0, "c": 2.0, "v": 100}));
        for kind in [ChannelKind::Bars, ChannelKind::UpdatedBars, ChannelKind::DailyBars] {
            let record = decode(kind, &raw);
            assert_eq!(record.f64_field("OpenPrice"), Some(1.0));
            assert_eq!(record.f64_field("ClosePrice"), Some(2.0));
            assert_eq!(record.u64_field("Volume"), Some(100));
        }
    }

    #[test]
    fn test_decode_missing_fields_do_not_appear() {
        let raw = as_map(json!({"S": "AAPL"}));
        let record = decode(ChannelKind::Trades, &raw);
        assert_eq!(record.str_field("Symbol"), Some("AAPL"));
        assert!(record.get("Price").is_none());
    }

    #[test]
    fn test_decode_snapshot_recurses() {
        let raw = as_map(json!({
            "symbol": "AAPL",
            "latestTrade": {"p": 145.0, "s": 10, "t": "2021-06-09T19:59:59Z"},
            "latestQuote": {"bp": 144.9, "ap": 145.1},
            "minuteBar": {"o": 144.0, "c": 145.0},
            "dailyBar": {"o": 140.0, "c": 145.0},
            "prevDailyBar": {"o": 139.0, "c": 140.0}
        }));
        let snapshot = decode_snapshot(&raw);

        assert_eq!(snapshot.str_field("Symbol"), Some("AAPL"));
        let trade = snapshot.sub_record("LatestTrade").unwrap();
        assert_eq!(trade.f64_field("Price"), Some(145.0));
        let quote = snapshot.sub_record("LatestQuote").unwrap();
        assert_eq!(quote.f64_field("BidPrice"), Some(144.9));
        let daily = snapshot.sub_record("DailyBar").unwrap();
        assert_eq!(daily.f64_field("OpenPrice"), Some(140.0));
        assert!(snapshot.get("latestTrade").is_none());
    }

    #[test]
    fn test_decode_value_non_object_is_empty() {
        let record = decode_value(ChannelKind::Trades, &json!(42));
        assert!(record.is_empty());
    }
}
