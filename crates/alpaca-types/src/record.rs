//! Decoded domain records
//!
//! A [`Record`] is the output of the frame codec: a flat, open map of
//! long-form field names to raw JSON values. The schema is deliberately
//! open so that server-side additions survive decoding; the typed accessors
//! below are conveniences over the common fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// A decoded domain record (trade, quote, bar, status, snapshot, ...)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Wrap a decoded field map
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Borrow the underlying field map
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the record, returning the field map as a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// True if the record carries no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The `Symbol` field, present on most record kinds
    pub fn symbol(&self) -> Option<&str> {
        self.str_field("Symbol")
    }

    /// A field as a string slice
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// A field as an unsigned integer
    pub fn u64_field(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }

    /// A field as an f64
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// A numeric field parsed into a [`Decimal`]
    ///
    /// Parses through the JSON source text, so values like `144.6` survive
    /// without binary-float rounding.
    pub fn decimal_field(&self, key: &str) -> Option<Decimal> {
        match self.fields.get(key)? {
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            Value::String(s) => Decimal::from_str(s).ok(),
            _ => None,
        }
    }

    /// An RFC 3339 timestamp field
    pub fn time_field(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.str_field(key)?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// A nested record field (snapshot sub-records)
    pub fn sub_record(&self, key: &str) -> Option<Record> {
        self.fields
            .get(key)
            .and_then(Value::as_object)
            .map(|map| Record::new(map.clone()))
    }

    // Named shortcuts for the fields shared by most record kinds.

    /// Trade price (`Price`)
    pub fn price(&self) -> Option<Decimal> {
        self.decimal_field("Price")
    }

    /// Trade size (`Size`)
    pub fn size(&self) -> Option<u64> {
        self.u64_field("Size")
    }

    /// Best bid price (`BidPrice`)
    pub fn bid_price(&self) -> Option<Decimal> {
        self.decimal_field("BidPrice")
    }

    /// Best ask price (`AskPrice`)
    pub fn ask_price(&self) -> Option<Decimal> {
        self.decimal_field("AskPrice")
    }

    /// Record timestamp (`Timestamp`)
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.time_field("Timestamp")
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::new(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_typed_accessors() {
        let r = record(json!({
            "Symbol": "AAPL",
            "Price": 144.6,
            "Size": 25,
            "Timestamp": "2021-06-09T19:59:59Z"
        }));

        assert_eq!(r.symbol(), Some("AAPL"));
        assert_eq!(r.decimal_field("Price"), Some(dec!(144.6)));
        assert_eq!(r.price(), Some(dec!(144.6)));
        assert_eq!(r.size(), Some(25));
        assert_eq!(r.u64_field("Size"), Some(25));
        let ts = r.time_field("Timestamp").unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-06-09T19:59:59+00:00");
    }

    #[test]
    fn test_accessors_tolerate_missing_and_mistyped() {
        let r = record(json!({"Conditions": ["@"]}));
        assert_eq!(r.symbol(), None);
        assert_eq!(r.decimal_field("Conditions"), None);
        assert_eq!(r.time_field("Conditions"), None);
    }

    #[test]
    fn test_decimal_from_string_value() {
        let r = record(json!({"Price": "99.95"}));
        assert_eq!(r.decimal_field("Price"), Some(dec!(99.95)));
    }
}
