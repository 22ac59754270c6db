//! Endpoints declared through a [`ClientEndpoint`] marker.

use std::fmt;
use std::sync::Arc;

use super::config::{Configurator, Decoder, Encoder, EndpointConfig};
use super::Endpoint;
use crate::error::BoxError;
use crate::extensions::Extension;
use crate::message::{CloseReason, Message};
use crate::session::Session;

/// Handler type that may declare itself a client endpoint.
///
/// A type opts in by returning a marker from
/// [`client_endpoint`](Annotated::client_endpoint). Every callback defaults
/// to a no-op, so a handler only overrides what it cares about.
pub trait Annotated: Send + Sync + 'static {
    /// The declared client endpoint metadata, if any.
    fn client_endpoint() -> Option<ClientEndpoint>
    where
        Self: Sized,
    {
        None
    }

    /// The session has been opened.
    fn on_open(&self, _session: &Session, _config: &EndpointConfig) {}

    /// A message arrived.
    fn on_message(&self, _session: &Session, _message: &Message) {}

    /// The session has been closed.
    fn on_close(&self, _session: &Session, _reason: &CloseReason) {}

    /// The session reported an error.
    fn on_error(&self, _session: &Session, _error: &(dyn std::error::Error + Send + Sync)) {}
}

/// Declared client endpoint metadata.
///
/// The resolver derives the endpoint configuration from this marker.
#[derive(Clone, Default)]
pub struct ClientEndpoint {
    subprotocols: Vec<String>,
    extensions: Vec<Extension>,
    encoders: Vec<Arc<dyn Encoder>>,
    decoders: Vec<Arc<dyn Decoder>>,
    configurator: Option<Arc<dyn Configurator>>,
}

impl ClientEndpoint {
    /// A marker with no declared metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subprotocols<I, S>(mut self, subprotocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subprotocols = subprotocols.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    #[must_use]
    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoders.push(encoder);
        self
    }

    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoders.push(decoder);
        self
    }

    #[must_use]
    pub fn configurator(mut self, configurator: Arc<dyn Configurator>) -> Self {
        self.configurator = Some(configurator);
        self
    }

    /// Build the endpoint configuration this marker declares.
    #[must_use]
    pub fn to_config(&self) -> EndpointConfig {
        let mut builder = EndpointConfig::builder()
            .preferred_subprotocols(self.subprotocols.iter().cloned())
            .extensions(self.extensions.clone());
        for encoder in &self.encoders {
            builder = builder.encoder(Arc::clone(encoder));
        }
        for decoder in &self.decoders {
            builder = builder.decoder(Arc::clone(decoder));
        }
        if let Some(configurator) = &self.configurator {
            builder = builder.configurator(Arc::clone(configurator));
        }
        builder.build()
    }
}

impl fmt::Debug for ClientEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientEndpoint")
            .field("subprotocols", &self.subprotocols)
            .field("extensions", &self.extensions)
            .field("encoders", &self.encoders.len())
            .field("decoders", &self.decoders.len())
            .field("configurator", &self.configurator.is_some())
            .finish()
    }
}

type AnnotatedFactory = Arc<dyn Fn() -> Result<Arc<dyn Annotated>, BoxError> + Send + Sync>;

/// A handler type together with its marker and a way to construct it.
#[derive(Clone)]
pub struct AnnotatedClass {
    name: String,
    marker: Option<ClientEndpoint>,
    factory: AnnotatedFactory,
}

impl AnnotatedClass {
    /// Describe `T`, constructed through `Default`.
    #[must_use]
    pub fn of<T: Annotated + Default>() -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
            marker: T::client_endpoint(),
            factory: Arc::new(|| Ok::<_, BoxError>(Arc::new(T::default()) as Arc<dyn Annotated>)),
        }
    }

    /// Describe a handler type with an explicit marker and factory.
    pub fn with_factory<F>(
        name: impl Into<String>,
        marker: Option<ClientEndpoint>,
        factory: F,
    ) -> Self
    where
        F: Fn() -> Result<Arc<dyn Annotated>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            marker,
            factory: Arc::new(factory),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn marker(&self) -> Option<&ClientEndpoint> {
        self.marker.as_ref()
    }

    pub(crate) fn instantiate(&self) -> Result<Arc<dyn Annotated>, BoxError> {
        (self.factory)()
    }
}

impl fmt::Debug for AnnotatedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotatedClass")
            .field("name", &self.name)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

/// A live handler value together with its marker.
#[derive(Clone)]
pub struct AnnotatedInstance {
    name: String,
    marker: Option<ClientEndpoint>,
    handler: Arc<dyn Annotated>,
}

impl AnnotatedInstance {
    pub fn new<T: Annotated>(handler: T) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    pub fn from_arc<T: Annotated>(handler: Arc<T>) -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
            marker: T::client_endpoint(),
            handler,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn marker(&self) -> Option<&ClientEndpoint> {
        self.marker.as_ref()
    }

    pub(crate) fn handler(&self) -> Arc<dyn Annotated> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for AnnotatedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotatedInstance")
            .field("name", &self.name)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

/// Adapts an [`Annotated`] handler to the [`Endpoint`] contract.
pub(crate) struct AnnotatedEndpoint {
    handler: Arc<dyn Annotated>,
}

impl AnnotatedEndpoint {
    pub(crate) fn new(handler: Arc<dyn Annotated>) -> Self {
        Self { handler }
    }
}

impl Endpoint for AnnotatedEndpoint {
    fn on_open(&self, session: &Session, config: &EndpointConfig) {
        self.handler.on_open(session, config);
    }

    fn on_message(&self, session: &Session, message: &Message) {
        self.handler.on_message(session, message);
    }

    fn on_close(&self, session: &Session, reason: &CloseReason) {
        self.handler.on_close(session, reason);
    }

    fn on_error(&self, session: &Session, error: &(dyn std::error::Error + Send + Sync)) {
        self.handler.on_error(session, error);
    }
}
