//! Client side of the HTTP Upgrade handshake (RFC 6455 Section 4).
//!
//! The wire exchange itself belongs to the transport engine. This module
//! gives the engine and the endpoint configurator a shared vocabulary: the
//! request the client intends to send, the response headers it received, and
//! a header map whose lookups ignore ASCII case.

pub mod listener;
pub(crate) mod signal;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};
use url::Url;

use crate::endpoint::EndpointConfig;
use crate::error::{Error, Result};
use crate::extensions::Extension;

pub use listener::HandshakeListener;

/// The WebSocket GUID used in the Sec-WebSocket-Accept calculation (RFC 6455).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// The only protocol version this client speaks.
pub const WS_VERSION: &str = "13";

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// The accept key is calculated as: Base64(SHA-1(key + GUID))
///
/// # Example
///
/// ```
/// use rsws_client::handshake::compute_accept_key;
///
/// let key = "dGhlIHNhbXBsZSBub25jZQ==";
/// assert_eq!(compute_accept_key(key), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Generate a fresh Sec-WebSocket-Key: 16 random bytes, Base64 encoded.
///
/// # Errors
///
/// Returns [`Error::KeyGeneration`] if the system random source fails.
pub fn generate_key() -> Result<String> {
    let mut nonce = [0u8; 16];
    getrandom::getrandom(&mut nonce)?;
    Ok(BASE64.encode(nonce))
}

/// Reject header values that would break the request framing.
fn validate_header_value(name: &str, value: &str) -> Result<()> {
    if value.contains('\r') || value.contains('\n') {
        return Err(Error::InvalidHeaderValue {
            header: name.to_string(),
            reason: "contains CR or LF characters".to_string(),
        });
    }
    Ok(())
}

/// Header name compared and ordered without regard to ASCII case.
///
/// The spelling of the first insertion is kept for display.
#[derive(Debug, Clone)]
struct HeaderName(String);

impl HeaderName {
    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for HeaderName {}

impl Ord for HeaderName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl PartialOrd for HeaderName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered, case-insensitive multimap of HTTP headers.
///
/// `Sec-WebSocket-Protocol`, `sec-websocket-protocol` and
/// `SEC-WEBSOCKET-PROTOCOL` all address the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: BTreeMap<HeaderName, Vec<String>>,
}

impl HeaderMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `name` with `value`, returning the old values.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<Vec<String>> {
        self.entries
            .insert(HeaderName(name.into()), vec![value.into()])
    }

    /// Add `value` after any existing values of `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        match self.entries.entry(HeaderName(name.into())) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value.into()),
            Entry::Vacant(entry) => {
                entry.insert(vec![value.into()]);
            }
        }
    }

    /// All values of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .get(&HeaderName(name.to_string()))
            .map(Vec::as_slice)
    }

    /// The first value of `name`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns `true` if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove `name`, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.remove(&HeaderName(name.to_string()))
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no header is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in case-insensitive name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.0.as_str(), values.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// The upgrade request a client sends to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    uri: Url,
    key: String,
    headers: HeaderMap,
}

impl HandshakeRequest {
    /// Build the request for `uri` from an endpoint configuration, with a fresh key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyGeneration`] if no key could be generated.
    pub fn new(uri: &Url, config: &EndpointConfig) -> Result<Self> {
        Ok(Self::with_key(uri, config, generate_key()?))
    }

    /// Build the request with a caller-supplied key.
    pub fn with_key(uri: &Url, config: &EndpointConfig, key: impl Into<String>) -> Self {
        let key = key.into();
        let mut headers = HeaderMap::new();

        let host = uri.host_str().unwrap_or_default();
        match uri.port() {
            Some(port) => headers.insert("Host", format!("{}:{}", host, port)),
            None => headers.insert("Host", host),
        };
        headers.insert("Upgrade", "websocket");
        headers.insert("Connection", "Upgrade");
        headers.insert("Sec-WebSocket-Key", key.as_str());
        headers.insert("Sec-WebSocket-Version", WS_VERSION);

        if !config.preferred_subprotocols().is_empty() {
            headers.insert(
                "Sec-WebSocket-Protocol",
                config.preferred_subprotocols().join(", "),
            );
        }
        if !config.extensions().is_empty() {
            headers.insert(
                "Sec-WebSocket-Extensions",
                Extension::to_header_value(config.extensions()),
            );
        }

        Self {
            uri: uri.clone(),
            key,
            headers,
        }
    }

    /// Target URI.
    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The Sec-WebSocket-Key sent with this request.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable request headers, as handed to `Configurator::before_request`.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The Sec-WebSocket-Accept value a conforming server answers with.
    #[must_use]
    pub fn expected_accept(&self) -> String {
        compute_accept_key(&self.key)
    }

    /// Check every header value for CR/LF injection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderValue`] for the first offending value.
    pub fn validate(&self) -> Result<()> {
        for (name, values) in self.headers.iter() {
            for value in values {
                validate_header_value(name, value)?;
            }
        }
        Ok(())
    }

    /// Write the HTTP request to a buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeaderValue`] if a header value contains CR/LF.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.validate()?;

        let target = match self.uri.query() {
            Some(query) => format!("{}?{}", self.uri.path(), query),
            None => self.uri.path().to_string(),
        };
        buf.extend_from_slice(format!("GET {} HTTP/1.1\r\n", target).as_bytes());
        for (name, values) in self.headers.iter() {
            for value in values {
                buf.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
            }
        }
        buf.extend_from_slice(b"\r\n");
        Ok(())
    }

    /// Check that a response answers this request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandshake`] if `Sec-WebSocket-Accept` is missing
    /// or does not match the request key.
    pub fn verify_response(&self, response: &HandshakeResponse) -> Result<()> {
        let accept = response
            .accept()
            .ok_or_else(|| Error::InvalidHandshake("Missing Sec-WebSocket-Accept header".into()))?;
        if accept != self.expected_accept() {
            return Err(Error::InvalidHandshake(format!(
                "Sec-WebSocket-Accept mismatch: {}",
                accept
            )));
        }
        Ok(())
    }
}

/// Headers of the server's handshake response, as seen by `Configurator::after_response`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeResponse {
    headers: HeaderMap,
}

impl HandshakeResponse {
    /// Wrap an already normalized header map.
    #[must_use]
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Normalize raw header pairs as received from the wire.
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect(),
        )
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The Sec-WebSocket-Accept value.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.headers.first("Sec-WebSocket-Accept").map(str::trim)
    }

    /// The subprotocol selected by the server, if any.
    #[must_use]
    pub fn subprotocol(&self) -> Option<&str> {
        self.headers
            .first("Sec-WebSocket-Protocol")
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Extensions accepted by the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if the header is malformed.
    pub fn extensions(&self) -> Result<Vec<Extension>> {
        match self.headers.get("Sec-WebSocket-Extensions") {
            Some(values) => Extension::parse_header(values.iter().map(String::as_str)),
            None => Ok(Vec::new()),
        }
    }
}
