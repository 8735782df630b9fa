//! API credentials
//!
//! Secrets are held in `secrecy` wrappers which zeroize memory on drop and
//! keep the secret out of `Debug` output.

use crate::error::{AlpacaError, StreamResult};
use crate::messages::AuthRequest;
use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the API key id
pub const ENV_KEY_ID: &str = "APCA_API_KEY_ID";
/// Environment variable holding the API secret
pub const ENV_SECRET_KEY: &str = "APCA_API_SECRET_KEY";

/// Credentials for the streaming and REST APIs
pub enum Credentials {
    /// API key id + secret pair
    ApiKey {
        /// Key id (public)
        key_id: String,
        /// Secret (zeroized on drop)
        secret: SecretString,
    },
    /// OAuth bearer token (delegated-auth mode)
    Bearer {
        /// Token (zeroized on drop)
        token: SecretString,
    },
}

impl Credentials {
    /// Create key/secret credentials
    ///
    /// Missing credentials are a configuration error raised here, at
    /// construction, never later during connect.
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> StreamResult<Self> {
        let key_id = key_id.into();
        let secret = secret.into();
        if key_id.is_empty() || secret.is_empty() {
            return Err(AlpacaError::Configuration(
                "API key id and secret must be non-empty".to_string(),
            ));
        }
        Ok(Self::ApiKey {
            key_id,
            secret: SecretString::from(secret),
        })
    }

    /// Create bearer-token credentials
    pub fn bearer(token: impl Into<String>) -> StreamResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(AlpacaError::Configuration(
                "bearer token must be non-empty".to_string(),
            ));
        }
        Ok(Self::Bearer {
            token: SecretString::from(token),
        })
    }

    /// Read credentials from `APCA_API_KEY_ID` / `APCA_API_SECRET_KEY`
    pub fn from_env() -> StreamResult<Self> {
        let key_id = std::env::var(ENV_KEY_ID)
            .map_err(|_| AlpacaError::Configuration(format!("{ENV_KEY_ID} not set")))?;
        let secret = std::env::var(ENV_SECRET_KEY)
            .map_err(|_| AlpacaError::Configuration(format!("{ENV_SECRET_KEY} not set")))?;
        Self::new(key_id, secret)
    }

    /// The public key id, if key/secret credentials
    pub fn key_id(&self) -> Option<&str> {
        match self {
            Self::ApiKey { key_id, .. } => Some(key_id),
            Self::Bearer { .. } => None,
        }
    }

    /// Build the stream authentication frame
    pub fn auth_request(&self) -> AuthRequest {
        match self {
            Self::ApiKey { key_id, secret } => {
                AuthRequest::with_key(key_id.clone(), secret.expose_secret().to_string())
            }
            Self::Bearer { token } => AuthRequest::with_token(token.expose_secret().to_string()),
        }
    }

    /// Header name/value pairs for REST requests
    pub fn rest_headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::ApiKey { key_id, secret } => vec![
                ("APCA-API-KEY-ID", key_id.clone()),
                ("APCA-API-SECRET-KEY", secret.expose_secret().to_string()),
            ],
            Self::Bearer { token } => vec![(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            )],
        }
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        match self {
            Self::ApiKey { key_id, secret } => Self::ApiKey {
                key_id: key_id.clone(),
                secret: SecretString::from(secret.expose_secret().to_string()),
            },
            Self::Bearer { token } => Self::Bearer {
                token: SecretString::from(token.expose_secret().to_string()),
            },
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey { key_id, .. } => f
                .debug_struct("Credentials::ApiKey")
                .field("key_id", key_id)
                .field("secret", &"[REDACTED]")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Credentials::Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credentials_rejected_at_construction() {
        assert!(matches!(
            Credentials::new("", "secret"),
            Err(AlpacaError::Configuration(_))
        ));
        assert!(matches!(
            Credentials::new("key", ""),
            Err(AlpacaError::Configuration(_))
        ));
        assert!(matches!(
            Credentials::bearer(""),
            Err(AlpacaError::Configuration(_))
        ));
    }

    #[test]
    fn test_auth_request_shapes() {
        let creds = Credentials::new("AK", "shh").unwrap();
        let req = serde_json::to_value(creds.auth_request()).unwrap();
        assert_eq!(req["key"], "AK");
        assert_eq!(req["secret"], "shh");

        let creds = Credentials::bearer("tok").unwrap();
        let req = serde_json::to_value(creds.auth_request()).unwrap();
        assert_eq!(req["token"], "tok");
        assert!(req.get("key").is_none());
    }

    #[test]
    fn test_rest_headers() {
        let creds = Credentials::new("AK", "shh").unwrap();
        let headers = creds.rest_headers();
        assert!(headers.contains(&("APCA-API-KEY-ID", "AK".to_string())));

        let creds = Credentials::bearer("tok").unwrap();
        let headers = creds.rest_headers();
        assert_eq!(headers[0].0, "Authorization");
        assert_eq!(headers[0].1, "Bearer tok");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("AK", "super-secret").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("AK"));
        assert!(!debug.contains("super-secret"));
    }
}
