//! Numeric error codes carried by stream error frames
//!
//! The server reports protocol-level problems as `{"T":"error","code":N}`
//! frames. The code table is fixed; unknown codes are surfaced with the
//! server's own message text.

/// Known stream error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StreamErrorCode {
    /// 400 - message was not valid JSON/msgpack
    InvalidSyntax,
    /// 401 - action requires authentication
    NotAuthenticated,
    /// 402 - credentials rejected
    AuthFailed,
    /// 403 - auth sent twice on one connection
    AlreadyAuthenticated,
    /// 404 - no auth frame within the handshake window
    AuthTimeout,
    /// 405 - too many symbols subscribed
    SymbolLimitExceeded,
    /// 406 - too many concurrent connections for this account
    ConnectionLimitExceeded,
    /// 407 - client not keeping up with the feed
    SlowClient,
    /// 408 - account not enabled for this API version
    V2NotEnabled,
    /// 409 - data subscription does not cover the request
    InsufficientSubscription,
    /// 500 - server-side failure
    InternalError,
}

impl StreamErrorCode {
    /// Look up a known code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            400 => Some(Self::InvalidSyntax),
            401 => Some(Self::NotAuthenticated),
            402 => Some(Self::AuthFailed),
            403 => Some(Self::AlreadyAuthenticated),
            404 => Some(Self::AuthTimeout),
            405 => Some(Self::SymbolLimitExceeded),
            406 => Some(Self::ConnectionLimitExceeded),
            407 => Some(Self::SlowClient),
            408 => Some(Self::V2NotEnabled),
            409 => Some(Self::InsufficientSubscription),
            500 => Some(Self::InternalError),
            _ => None,
        }
    }

    /// The numeric wire code
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidSyntax => 400,
            Self::NotAuthenticated => 401,
            Self::AuthFailed => 402,
            Self::AlreadyAuthenticated => 403,
            Self::AuthTimeout => 404,
            Self::SymbolLimitExceeded => 405,
            Self::ConnectionLimitExceeded => 406,
            Self::SlowClient => 407,
            Self::V2NotEnabled => 408,
            Self::InsufficientSubscription => 409,
            Self::InternalError => 500,
        }
    }

    /// Human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidSyntax => "invalid syntax",
            Self::NotAuthenticated => "not authenticated",
            Self::AuthFailed => "auth failed",
            Self::AlreadyAuthenticated => "already authenticated",
            Self::AuthTimeout => "auth timeout",
            Self::SymbolLimitExceeded => "symbol limit exceeded",
            Self::ConnectionLimitExceeded => "connection limit exceeded",
            Self::SlowClient => "slow client",
            Self::V2NotEnabled => "v2 not enabled",
            Self::InsufficientSubscription => "insufficient subscription",
            Self::InternalError => "internal error",
        }
    }

    /// True if this code means the credentials themselves are bad
    ///
    /// The server closes the transport shortly after; reconnecting will fail
    /// the same way, so callers should stop the client on repeated auth
    /// failures.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailed | Self::NotAuthenticated | Self::AuthTimeout)
    }
}

/// Best-effort message for a raw code: table text for known codes, the
/// server's own message otherwise
pub fn describe_code(code: Option<u16>, server_msg: &str) -> String {
    match code.and_then(StreamErrorCode::from_code) {
        Some(known) => known.message().to_string(),
        None if !server_msg.is_empty() => server_msg.to_string(),
        None => format!("unknown error (code {:?})", code),
    }
}
