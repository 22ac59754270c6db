//! Client endpoints and the shapes in which they can be handed to `connect`.
//!
//! An endpoint reaches the client in one of four shapes, captured by
//! [`EndpointInput`]:
//!
//! - a live [`Endpoint`] value,
//! - an [`EndpointClass`] that knows how to construct one,
//! - an [`AnnotatedClass`] whose type declares a [`ClientEndpoint`] marker,
//! - an [`AnnotatedInstance`], a live value of such a type.
//!
//! [`EndpointResolver`] turns any of them into an endpoint plus the
//! configuration to connect with.

mod annotated;
pub mod config;
mod resolver;
mod wrapper;

pub use annotated::{Annotated, AnnotatedClass, AnnotatedInstance, ClientEndpoint};
pub(crate) use annotated::AnnotatedEndpoint;
pub use config::{
    Configurator, Decoder, DefaultConfigurator, Encoder, EndpointConfig, EndpointConfigBuilder,
};
pub use resolver::{EndpointResolver, ResolvedEndpoint};
pub use wrapper::EndpointWrapper;

use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::message::{CloseReason, Message};
use crate::session::Session;

/// A programmatic client endpoint.
///
/// Only [`on_open`](Endpoint::on_open) is required.
pub trait Endpoint: Send + Sync + 'static {
    /// The session has been opened.
    fn on_open(&self, session: &Session, config: &EndpointConfig);

    /// A message arrived.
    fn on_message(&self, _session: &Session, _message: &Message) {}

    /// The session has been closed.
    fn on_close(&self, _session: &Session, _reason: &CloseReason) {}

    /// The session reported an error.
    fn on_error(&self, _session: &Session, _error: &(dyn std::error::Error + Send + Sync)) {}
}

type EndpointFactory = Arc<dyn Fn() -> Result<Arc<dyn Endpoint>, BoxError> + Send + Sync>;

/// An endpoint type and a way to construct it.
#[derive(Clone)]
pub struct EndpointClass {
    name: String,
    factory: EndpointFactory,
}

impl EndpointClass {
    /// Describe `T`, constructed through `Default`.
    #[must_use]
    pub fn of<T: Endpoint + Default>() -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
            factory: Arc::new(|| Ok::<_, BoxError>(Arc::new(T::default()) as Arc<dyn Endpoint>)),
        }
    }

    /// Describe an endpoint type constructed by `factory`.
    pub fn with_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Endpoint>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn instantiate(&self) -> Result<Arc<dyn Endpoint>, BoxError> {
        (self.factory)()
    }
}

impl fmt::Debug for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointClass")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Every shape in which an endpoint can be supplied to `connect`.
#[derive(Clone)]
pub enum EndpointInput {
    /// A live endpoint.
    Instance(Arc<dyn Endpoint>),
    /// An endpoint type to construct.
    Class(EndpointClass),
    /// A handler type that may carry a client endpoint marker.
    AnnotatedClass(AnnotatedClass),
    /// A live handler that may carry a client endpoint marker.
    AnnotatedInstance(AnnotatedInstance),
}

impl EndpointInput {
    /// Wrap a live endpoint.
    pub fn instance<T: Endpoint>(endpoint: T) -> Self {
        EndpointInput::Instance(Arc::new(endpoint))
    }

    /// Describe an endpoint type constructed through `Default`.
    #[must_use]
    pub fn class<T: Endpoint + Default>() -> Self {
        EndpointInput::Class(EndpointClass::of::<T>())
    }

    /// Describe a handler type constructed through `Default`.
    #[must_use]
    pub fn annotated<T: Annotated + Default>() -> Self {
        EndpointInput::AnnotatedClass(AnnotatedClass::of::<T>())
    }

    /// Wrap a live handler.
    pub fn annotated_instance<T: Annotated>(handler: T) -> Self {
        EndpointInput::AnnotatedInstance(AnnotatedInstance::new(handler))
    }

    /// Short name of the shape, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            EndpointInput::Instance(_) => "instance",
            EndpointInput::Class(_) => "class",
            EndpointInput::AnnotatedClass(_) => "annotated class",
            EndpointInput::AnnotatedInstance(_) => "annotated instance",
        }
    }
}

impl From<Arc<dyn Endpoint>> for EndpointInput {
    fn from(endpoint: Arc<dyn Endpoint>) -> Self {
        EndpointInput::Instance(endpoint)
    }
}

impl From<EndpointClass> for EndpointInput {
    fn from(class: EndpointClass) -> Self {
        EndpointInput::Class(class)
    }
}

impl From<AnnotatedClass> for EndpointInput {
    fn from(class: AnnotatedClass) -> Self {
        EndpointInput::AnnotatedClass(class)
    }
}

impl From<AnnotatedInstance> for EndpointInput {
    fn from(instance: AnnotatedInstance) -> Self {
        EndpointInput::AnnotatedInstance(instance)
    }
}

impl fmt::Debug for EndpointInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointInput::Instance(_) => f.write_str("Instance(..)"),
            EndpointInput::Class(class) => f.debug_tuple("Class").field(class).finish(),
            EndpointInput::AnnotatedClass(class) => {
                f.debug_tuple("AnnotatedClass").field(class).finish()
            }
            EndpointInput::AnnotatedInstance(instance) => {
                f.debug_tuple("AnnotatedInstance").field(instance).finish()
            }
        }
    }
}
