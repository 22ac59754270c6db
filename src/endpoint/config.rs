//! Negotiable endpoint parameters.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::extensions::Extension;
use crate::handshake::{HandshakeResponse, HeaderMap};
use crate::message::Message;
use crate::properties::Properties;

/// Hooks that observe and adjust the opening handshake.
///
/// Both methods default to no-ops.
pub trait Configurator: Send + Sync {
    /// Called with the outgoing request headers before the engine is invoked.
    fn before_request(&self, _headers: &mut HeaderMap) {}

    /// Called with the server's response before `connect` returns.
    fn after_response(&self, _response: &HandshakeResponse) {}
}

/// Configurator that leaves the handshake untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConfigurator;

impl Configurator for DefaultConfigurator {}

/// Turns application values into messages.
pub trait Encoder: Send + Sync {
    /// Returns `true` if this encoder handles `value`.
    fn will_encode(&self, value: &dyn Any) -> bool;

    /// Encode `value`.
    fn encode(&self, value: &dyn Any) -> Result<Message, BoxError>;
}

/// Turns messages into application values.
pub trait Decoder: Send + Sync {
    /// Returns `true` if this decoder handles `message`.
    fn will_decode(&self, message: &Message) -> bool;

    /// Decode `message`.
    fn decode(&self, message: &Message) -> Result<Box<dyn Any + Send>, BoxError>;
}

struct ConfigInner {
    preferred_subprotocols: Vec<String>,
    extensions: Vec<Extension>,
    encoders: Vec<Arc<dyn Encoder>>,
    decoders: Vec<Arc<dyn Decoder>>,
    user_properties: Properties,
    configurator: Arc<dyn Configurator>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            preferred_subprotocols: Vec::new(),
            extensions: Vec::new(),
            encoders: Vec::new(),
            decoders: Vec::new(),
            user_properties: Properties::new(),
            configurator: Arc::new(DefaultConfigurator),
        }
    }
}

/// Immutable client endpoint configuration.
///
/// Cloning is cheap; all clones share the same user properties.
#[derive(Clone, Default)]
pub struct EndpointConfig {
    inner: Arc<ConfigInner>,
}

impl EndpointConfig {
    /// Start building a configuration.
    #[must_use]
    pub fn builder() -> EndpointConfigBuilder {
        EndpointConfigBuilder::default()
    }

    /// Subprotocols offered to the server, most preferred first.
    #[must_use]
    pub fn preferred_subprotocols(&self) -> &[String] {
        &self.inner.preferred_subprotocols
    }

    /// Extensions offered to the server.
    #[must_use]
    pub fn extensions(&self) -> &[Extension] {
        &self.inner.extensions
    }

    /// Registered encoders, in registration order.
    #[must_use]
    pub fn encoders(&self) -> &[Arc<dyn Encoder>] {
        &self.inner.encoders
    }

    /// Registered decoders, in registration order.
    #[must_use]
    pub fn decoders(&self) -> &[Arc<dyn Decoder>] {
        &self.inner.decoders
    }

    /// Application properties attached to this configuration.
    #[must_use]
    pub fn user_properties(&self) -> &Properties {
        &self.inner.user_properties
    }

    /// The handshake configurator.
    #[must_use]
    pub fn configurator(&self) -> &dyn Configurator {
        self.inner.configurator.as_ref()
    }

    /// First registered encoder that accepts `value`.
    pub fn encoder_for(&self, value: &dyn Any) -> Option<&Arc<dyn Encoder>> {
        self.inner.encoders.iter().find(|e| e.will_encode(value))
    }

    /// First registered decoder that accepts `message`.
    pub fn decoder_for(&self, message: &Message) -> Option<&Arc<dyn Decoder>> {
        self.inner.decoders.iter().find(|d| d.will_decode(message))
    }
}

impl fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("preferred_subprotocols", &self.inner.preferred_subprotocols)
            .field("extensions", &self.inner.extensions)
            .field("encoders", &self.inner.encoders.len())
            .field("decoders", &self.inner.decoders.len())
            .field("user_properties", &self.inner.user_properties)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EndpointConfig`].
#[derive(Default)]
pub struct EndpointConfigBuilder {
    inner: ConfigInner,
}

impl EndpointConfigBuilder {
    /// Set the offered subprotocols, most preferred first.
    #[must_use]
    pub fn preferred_subprotocols<I, S>(mut self, subprotocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.preferred_subprotocols = subprotocols.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the offered extensions.
    #[must_use]
    pub fn extensions(mut self, extensions: Vec<Extension>) -> Self {
        self.inner.extensions = extensions;
        self
    }

    /// Offer one more extension.
    #[must_use]
    pub fn extension(mut self, extension: Extension) -> Self {
        self.inner.extensions.push(extension);
        self
    }

    /// Register an encoder.
    #[must_use]
    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.inner.encoders.push(encoder);
        self
    }

    /// Register a decoder.
    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.inner.decoders.push(decoder);
        self
    }

    /// Use `configurator` for handshake hooks.
    #[must_use]
    pub fn configurator(mut self, configurator: Arc<dyn Configurator>) -> Self {
        self.inner.configurator = configurator;
        self
    }

    /// Use an existing property bag instead of a fresh one.
    #[must_use]
    pub fn user_properties(mut self, properties: Properties) -> Self {
        self.inner.user_properties = properties;
        self
    }

    #[must_use]
    pub fn build(self) -> EndpointConfig {
        EndpointConfig {
            inner: Arc::new(self.inner),
        }
    }
}

impl fmt::Debug for EndpointConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointConfigBuilder")
            .field("preferred_subprotocols", &self.inner.preferred_subprotocols)
            .field("extensions", &self.inner.extensions)
            .finish_non_exhaustive()
    }
}
