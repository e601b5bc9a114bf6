//! Client connection settings.
//!
//! A [`ClientConfig`] is always valid: it can only be produced by
//! [`ClientBuilder::build`], [`ClientConfig::from_url`] or deserialization,
//! all of which run the same validation.
//!
//! # Example
//!
//! ```
//! use ws_lifecycle_client::ClientConfig;
//!
//! let config = ClientConfig::from_url("ws://echo.example.com:8080/chat")?;
//! assert_eq!(config.host(), "echo.example.com");
//! assert_eq!(config.port(), 8080);
//! assert_eq!(config.endpoint(), "/chat");
//! # Ok::<(), ws_lifecycle_client::Error>(())
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use url::{Host, Url};

use crate::error::{Error, Result};

use super::builder::ClientBuilder;

// ============================================================================
// Constants
// ============================================================================

/// Port used when none is given (plain `ws://`).
pub const DEFAULT_PORT: u16 = 80;

/// Endpoint path used when none is given.
pub const DEFAULT_ENDPOINT: &str = "/";

// ============================================================================
// ClientConfig
// ============================================================================

/// Validated target and protocol limits for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClientConfig")]
pub struct ClientConfig {
    host: String,
    endpoint: String,
    port: u16,
    max_message_size: Option<usize>,
    max_frame_size: Option<usize>,
    nodelay: bool,
}

/// Unvalidated shape accepted by serde.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawClientConfig {
    host: String,
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    max_message_size: Option<usize>,
    #[serde(default)]
    max_frame_size: Option<usize>,
    #[serde(default = "default_nodelay")]
    nodelay: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_nodelay() -> bool {
    true
}

impl TryFrom<RawClientConfig> for ClientConfig {
    type Error = Error;

    fn try_from(raw: RawClientConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .host(raw.host)
            .endpoint(raw.endpoint)
            .port(raw.port)
            .nodelay(raw.nodelay);
        if let Some(size) = raw.max_message_size {
            builder = builder.max_message_size(size);
        }
        if let Some(size) = raw.max_frame_size {
            builder = builder.max_frame_size(size);
        }
        builder.build()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientConfig {
    /// Returns a new builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Parses a `ws://host[:port][/path][?query]` URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is malformed, uses a scheme other
    /// than `ws` (TLS is not supported), carries credentials or a fragment,
    /// or has no host.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|e| Error::config(format!("Invalid URL '{url}': {e}")))?;

        match parsed.scheme() {
            "ws" => {}
            "wss" => {
                return Err(Error::config(
                    "wss:// is not supported: this client speaks plain TCP only",
                ));
            }
            other => {
                return Err(Error::config(format!(
                    "Unsupported scheme '{other}', expected ws://"
                )));
            }
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(Error::config("Credentials in the URL are not supported"));
        }
        if parsed.fragment().is_some() {
            return Err(Error::config("WebSocket URLs must not contain a fragment"));
        }

        let host = match parsed.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(Error::config(format!("URL '{url}' has no host"))),
        };

        let mut endpoint = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            endpoint.push('?');
            endpoint.push_str(query);
        }

        ClientBuilder::new()
            .host(host)
            .endpoint(endpoint)
            .port(parsed.port().unwrap_or(DEFAULT_PORT))
            .build()
    }

    /// Parses a JSON document into a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(e.to_string()))
    }

    pub(super) fn from_parts(
        host: String,
        endpoint: String,
        port: u16,
        max_message_size: Option<usize>,
        max_frame_size: Option<usize>,
        nodelay: bool,
    ) -> Self {
        Self {
            host,
            endpoint,
            port,
            max_message_size,
            max_frame_size,
            nodelay,
        }
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl ClientConfig {
    /// Host name or IP literal to resolve.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Request target of the upgrade request (path and optional query).
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// TCP port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Maximum size of a reassembled incoming message, if overridden.
    #[inline]
    #[must_use]
    pub const fn max_message_size(&self) -> Option<usize> {
        self.max_message_size
    }

    /// Maximum size of a single incoming frame, if overridden.
    #[inline]
    #[must_use]
    pub const fn max_frame_size(&self) -> Option<usize> {
        self.max_frame_size
    }

    /// Whether `TCP_NODELAY` is set on the socket.
    #[inline]
    #[must_use]
    pub const fn nodelay(&self) -> bool {
        self.nodelay
    }

    /// Returns the URI sent in the upgrade request.
    ///
    /// Format: `ws://{host}:{port}{endpoint}` with IPv6 literals bracketed.
    #[must_use]
    pub fn request_uri(&self) -> String {
        if self.host.contains(':') {
            format!("ws://[{}]:{}{}", self.host, self.port, self.endpoint)
        } else {
            format!("ws://{}:{}{}", self.host, self.port, self.endpoint)
        }
    }

    /// Maps the configured limits onto tungstenite's protocol settings.
    pub(crate) fn websocket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        if let Some(size) = self.max_message_size {
            config = config.max_message_size(Some(size));
        }
        if let Some(size) = self.max_frame_size {
            config = config.max_frame_size(Some(size));
        }
        config
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_from_url_defaults() {
        let config = ClientConfig::from_url("ws://ws.ifelse.io").expect("valid url");
        assert_eq!(config.host(), "ws.ifelse.io");
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.endpoint(), "/");
        assert!(config.nodelay());
    }

    #[test]
    fn test_from_url_keeps_query() {
        let config = ClientConfig::from_url("ws://localhost:9000/feed?room=7").expect("valid url");
        assert_eq!(config.endpoint(), "/feed?room=7");
        assert_eq!(config.port(), 9000);
    }

    #[test]
    fn test_from_url_rejects_tls() {
        let err = ClientConfig::from_url("wss://example.com/").unwrap_err();
        assert!(err.to_string().contains("wss://"));
    }

    #[test]
    fn test_from_url_rejects_other_schemes() {
        assert!(ClientConfig::from_url("http://example.com/").is_err());
        assert!(ClientConfig::from_url("not a url").is_err());
    }

    #[test]
    fn test_from_url_rejects_fragment_and_credentials() {
        assert!(ClientConfig::from_url("ws://example.com/#frag").is_err());
        assert!(ClientConfig::from_url("ws://user:pw@example.com/").is_err());
    }

    #[test]
    fn test_ipv6_host_is_unbracketed_and_uri_rebracketed() {
        let config = ClientConfig::from_url("ws://[::1]:4000/x").expect("valid url");
        assert_eq!(config.host(), "::1");
        assert_eq!(config.request_uri(), "ws://[::1]:4000/x");
    }

    #[test]
    fn test_request_uri() {
        let config = ClientConfig::builder()
            .host("127.0.0.1")
            .port(8080)
            .endpoint("/echo")
            .build()
            .expect("valid config");
        assert_eq!(config.request_uri(), "ws://127.0.0.1:8080/echo");
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = ClientConfig::from_json(r#"{ "host": "localhost" }"#).expect("valid json");
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.max_message_size(), None);
    }

    #[test]
    fn test_from_json_validates() {
        let err = ClientConfig::from_json(r#"{ "host": "localhost", "endpoint": "echo" }"#)
            .unwrap_err();
        assert!(err.to_string().contains("endpoint"));
        assert!(ClientConfig::from_json(r#"{ "host": "h", "bogus": 1 }"#).is_err());
    }

    #[test]
    fn test_json_roundtrip_preserves_limits() {
        let config = ClientConfig::builder()
            .host("localhost")
            .max_message_size(1024)
            .build()
            .expect("valid config");
        let json = serde_json::to_string(&config).expect("serializable");
        assert_eq!(ClientConfig::from_json(&json).expect("valid json"), config);
    }

    proptest! {
        #[test]
        fn prop_from_url_recovers_parts(
            host in "[a-z][a-z0-9]{0,12}(\\.[a-z][a-z0-9]{0,8}){0,2}",
            port in 1u16..,
            path in "(/[a-z0-9_]{1,8}){0,3}",
        ) {
            let url = format!("ws://{host}:{port}{path}");
            let config = ClientConfig::from_url(&url).expect("generated url is valid");
            let expected_path = if path.is_empty() { "/".to_string() } else { path };
            prop_assert_eq!(config.host(), host.as_str());
            prop_assert_eq!(config.endpoint(), expected_path.as_str());
            prop_assert_eq!(config.port(), port);
        }
    }
}
