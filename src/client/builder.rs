//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```
//! use ws_lifecycle_client::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .host("ws.ifelse.io")
//!     .endpoint("/")
//!     .port_str("80")
//!     .build()?;
//! assert_eq!(config.port(), 80);
//! # Ok::<(), ws_lifecycle_client::Error>(())
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::Ipv6Addr;

use crate::error::{Error, Result};

use super::options::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_PORT};

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for a validated [`ClientConfig`].
///
/// Use [`ClientConfig::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    /// Target host.
    host: Option<String>,
    /// Upgrade request target.
    endpoint: Option<String>,
    /// Port as given by the caller (numeric ports are stored formatted).
    port: Option<String>,
    /// Incoming message limit.
    max_message_size: Option<usize>,
    /// Incoming frame limit.
    max_frame_size: Option<usize>,
    /// `TCP_NODELAY`.
    nodelay: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            host: None,
            endpoint: None,
            port: None,
            max_message_size: None,
            max_frame_size: None,
            nodelay: true,
        }
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with no host set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host name or IP literal.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the request target, e.g. `/echo`. Defaults to `/`.
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the port. Defaults to 80.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port.to_string());
        self
    }

    /// Sets the port from its textual form, e.g. `"80"`.
    ///
    /// Parsing happens in [`build`](Self::build).
    #[inline]
    #[must_use]
    pub fn port_str(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Limits the size of a reassembled incoming message.
    #[inline]
    #[must_use]
    pub fn max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }

    /// Limits the size of a single incoming frame.
    #[inline]
    #[must_use]
    pub fn max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = Some(bytes);
        self
    }

    /// Enables or disables `TCP_NODELAY`. Enabled by default.
    #[inline]
    #[must_use]
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.nodelay = enabled;
        self
    }

    /// Validates the settings and builds the config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is missing or malformed, the
    /// endpoint does not start with `/`, the port is not in `1..=65535`, or
    /// a frame limit exceeds the message limit.
    pub fn build(self) -> Result<ClientConfig> {
        let host = self.validate_host()?;
        let endpoint = self.validate_endpoint()?;
        let port = self.validate_port()?;
        self.validate_limits()?;

        Ok(ClientConfig::from_parts(
            host,
            endpoint,
            port,
            self.max_message_size,
            self.max_frame_size,
            self.nodelay,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    fn validate_host(&self) -> Result<String> {
        let host = self.host.clone().ok_or_else(|| {
            Error::config(
                "host is required. Use .host() to set it.\n\
                 Example: ClientConfig::builder().host(\"ws.ifelse.io\")",
            )
        })?;

        let host = match (host.starts_with('['), host.ends_with(']')) {
            (true, true) if host.len() >= 2 => {
                let inner = &host[1..host.len() - 1];
                if inner.parse::<Ipv6Addr>().is_err() {
                    return Err(Error::config(format!(
                        "host '{host}' is bracketed but not an IPv6 address"
                    )));
                }
                inner.to_string()
            }
            (false, false) => host,
            _ => {
                return Err(Error::config(format!("host '{host}' has unbalanced brackets")));
            }
        };

        if host.is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        if host.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(Error::config(format!(
                "host '{host}' must not contain whitespace or '/'"
            )));
        }
        // Only IPv6 literals may contain ':'; the port is set separately.
        if host.contains(':') && host.parse::<Ipv6Addr>().is_err() {
            return Err(Error::config(format!(
                "host '{host}' must not contain a port. Use .port() to set it."
            )));
        }

        Ok(host)
    }

    fn validate_endpoint(&self) -> Result<String> {
        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        if !endpoint.starts_with('/') {
            return Err(Error::config(format!(
                "endpoint '{endpoint}' must start with '/'"
            )));
        }
        if endpoint.chars().any(char::is_whitespace) {
            return Err(Error::config(format!(
                "endpoint '{endpoint}' must not contain whitespace"
            )));
        }

        Ok(endpoint)
    }

    fn validate_port(&self) -> Result<u16> {
        let Some(port) = self.port.as_deref() else {
            return Ok(DEFAULT_PORT);
        };

        match port.trim().parse::<u16>() {
            Ok(0) => Err(Error::config("port must be in 1..=65535")),
            Ok(port) => Ok(port),
            Err(e) => Err(Error::config(format!("invalid port '{port}': {e}"))),
        }
    }

    fn validate_limits(&self) -> Result<()> {
        if let (Some(message), Some(frame)) = (self.max_message_size, self.max_frame_size)
            && frame > message
        {
            return Err(Error::config(format!(
                "max_frame_size ({frame}) must not exceed max_message_size ({message})"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ClientBuilder::new();
        assert!(builder.host.is_none());
        assert!(builder.endpoint.is_none());
        assert!(builder.port.is_none());
        assert!(builder.nodelay);
    }

    #[test]
    fn test_build_fails_without_host() {
        let err = ClientBuilder::new().port(80).build().unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_build_applies_defaults() {
        let config = ClientBuilder::new().host("localhost").build().expect("valid");
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_port_str_is_parsed() {
        let config = ClientBuilder::new()
            .host("localhost")
            .port_str(" 8080 ")
            .build()
            .expect("valid");
        assert_eq!(config.port(), 8080);
    }

    #[test]
    fn test_bad_ports_are_rejected() {
        for port in ["0", "http", "70000", ""] {
            let result = ClientBuilder::new().host("localhost").port_str(port).build();
            assert!(result.is_err(), "port {port:?} should be rejected");
        }
    }

    #[test]
    fn test_endpoint_must_be_absolute() {
        let err = ClientBuilder::new()
            .host("localhost")
            .endpoint("echo")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_host_validation() {
        assert!(ClientBuilder::new().host("").build().is_err());
        assert!(ClientBuilder::new().host("bad host").build().is_err());
        assert!(ClientBuilder::new().host("a/b").build().is_err());
    }

    #[test]
    fn test_bracketed_ipv6_host_is_normalized() {
        let config = ClientBuilder::new().host("[::1]").build().expect("valid");
        assert_eq!(config.host(), "::1");
    }

    #[test]
    fn test_host_with_port_is_rejected() {
        let err = ClientBuilder::new()
            .host("example.com:8080")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must not contain a port"));
    }

    #[test]
    fn test_unbalanced_brackets_are_rejected() {
        for host in ["[::1", "::1]", "[]", "[example.com]"] {
            assert!(
                ClientBuilder::new().host(host).build().is_err(),
                "host {host:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_bare_ipv6_host_is_accepted() {
        let config = ClientBuilder::new().host("fe80::1").build().expect("valid");
        assert_eq!(config.host(), "fe80::1");
        assert_eq!(config.request_uri(), "ws://[fe80::1]:80/");
    }

    #[test]
    fn test_frame_limit_must_fit_message_limit() {
        let result = ClientBuilder::new()
            .host("localhost")
            .max_message_size(1024)
            .max_frame_size(4096)
            .build();
        assert!(result.is_err());

        let config = ClientBuilder::new()
            .host("localhost")
            .max_message_size(4096)
            .max_frame_size(1024)
            .build()
            .expect("valid");
        assert_eq!(config.max_frame_size(), Some(1024));
    }
}
