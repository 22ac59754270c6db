//! The boundary between the client and a transport engine.
//!
//! The client never touches the wire. It prepares an [`OpenRequest`] and hands
//! it to a [`TransportEngine`], which performs the opening handshake on its
//! own threads and reports the outcome through the request's
//! [`HandshakeListener`]. On success the engine opens the session through
//! [`EndpointWrapper::on_open`] and exposes it via [`ClientSocket::session`].

mod registry;

pub use registry::{EngineFactory, EngineRegistry};

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::endpoint::{EndpointConfig, EndpointWrapper};
use crate::error::BoxError;
use crate::handshake::{HandshakeListener, HandshakeRequest};
use crate::properties::Properties;
use crate::session::Session;

/// Everything a transport engine needs to open one client connection.
pub struct OpenRequest {
    /// Target URI.
    pub url: Url,
    /// Configuration the endpoint was resolved with.
    pub config: EndpointConfig,
    /// The endpoint, wrapped for lifecycle mediation.
    pub endpoint: Arc<EndpointWrapper>,
    /// Receives the handshake outcome. Must be called at most once.
    pub listener: Arc<dyn HandshakeListener>,
    /// Property bag scoped to this attempt.
    pub properties: Properties,
    /// The client's upgrade request, already passed through the configurator.
    pub handshake: HandshakeRequest,
    /// Cancelled when the client stops waiting for the outcome.
    pub cancellation: CancellationToken,
}

impl fmt::Debug for OpenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRequest")
            .field("url", &self.url.as_str())
            .field("config", &self.config)
            .field("handshake", &self.handshake)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// A pluggable transport engine.
pub trait TransportEngine: Send + Sync {
    /// Start opening a client connection.
    ///
    /// Must not block on the handshake. An error means the attempt could not
    /// be started at all; handshake failures go to the request's listener.
    fn open_client_socket(&self, request: OpenRequest) -> Result<Box<dyn ClientSocket>, BoxError>;
}

/// Engine-side handle for one client connection.
pub trait ClientSocket: Send + Sync {
    /// The session opened on this socket, once the handshake succeeded.
    fn session(&self) -> Option<Session>;

    /// Release the connection.
    fn close(&self) {}
}
