//! Error types for the SDK

use crate::enums::ChannelKind;
use crate::error_codes::StreamErrorCode;
use std::time::Duration;
use thiserror::Error;

/// Main error type for streaming operations
#[derive(Error, Debug)]
pub enum AlpacaError {
    // === Connection Errors ===
    /// Failed to establish the websocket connection
    #[error("Failed to connect to {url}: {source}")]
    ConnectionFailed {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Connection attempt timed out
    #[error("Connection timeout after {timeout:?} to {url}")]
    ConnectionTimeout { url: String, timeout: Duration },

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    // === Protocol Errors ===
    /// Failed to decode an inbound frame (JSON or msgpack)
    #[error("Frame decode error: {0}")]
    Decode(String),

    /// Server error frame
    #[error("Stream error {code:?}: {message}")]
    Stream {
        /// Parsed error code, if recognized
        code: Option<StreamErrorCode>,
        /// Resolved human-readable message
        message: String,
    },

    // === Authentication Errors ===
    /// Credentials were rejected by the server
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    // === Subscription Errors ===
    /// The channel kind is not available on this feed
    #[error("Channel {kind} is not supported by the {feed} stream")]
    UnsupportedChannel { kind: ChannelKind, feed: String },

    // === Internal Errors ===
    /// Internal channel was closed unexpectedly
    #[error("Internal channel closed unexpectedly")]
    ChannelClosed,

    /// Client is shutting down
    #[error("Shutdown in progress")]
    ShuttingDown,

    /// Configuration error (missing credentials, bad URL)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AlpacaError {
    /// Create a stream error from a raw error frame
    pub fn from_error_frame(code: Option<u16>, server_msg: &str) -> Self {
        let parsed = code.and_then(StreamErrorCode::from_code);
        let message = crate::error_codes::describe_code(code, server_msg);
        Self::Stream {
            code: parsed,
            message,
        }
    }

    /// Returns true if this error is potentially recoverable via reconnect
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. }
            | Self::ConnectionTimeout { .. }
            | Self::WebSocket(_)
            | Self::ChannelClosed => true,
            Self::Stream { code, .. } => !code.is_some_and(|c| c.is_auth_failure()),
            _ => false,
        }
    }
}

/// Result type alias for streaming operations
pub type StreamResult<T> = Result<T, AlpacaError>;
