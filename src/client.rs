//! The client container: turns endpoints into connected sessions.

use std::fmt;
use std::sync::Arc;

use tracing::Instrument;
use url::Url;

use crate::collector::ErrorCollector;
use crate::config::ClientConfig;
use crate::endpoint::{
    Annotated, Endpoint, EndpointConfig, EndpointInput, EndpointResolver, EndpointWrapper,
    ResolvedEndpoint,
};
use crate::engine::{ClientSocket, EngineRegistry, OpenRequest, TransportEngine};
use crate::error::{Error, Result};
use crate::handshake::listener::{ClientHandshakeListener, HandshakeFailure};
use crate::handshake::signal::{HandshakeSignal, HandshakeWaiter, WaitOutcome, handshake_signal};
use crate::handshake::HandshakeRequest;
use crate::properties::Properties;
use crate::session::{Session, SessionSettings};

/// Schemes accepted by [`ClientManager::connect`]. Matched exactly.
const SCHEMES: [&str; 2] = ["ws", "wss"];

/// Connects client endpoints through a transport engine.
///
/// A manager is cheap to share: every call to [`connect`](Self::connect) runs
/// an independent attempt with its own error collector, completion signal and
/// property bag.
///
/// # Example
///
/// ```rust,ignore
/// use rsws_client::{ClientConfig, ClientManager, EndpointInput};
///
/// let manager = ClientManager::new(engine, ClientConfig::default());
/// let session = manager
///     .connect(EndpointInput::annotated::<Chat>(), None, "ws://localhost:8025/echo")
///     .await?;
/// ```
pub struct ClientManager {
    engine: Arc<dyn TransportEngine>,
    config: ClientConfig,
    properties: Properties,
    resolver: EndpointResolver,
}

impl ClientManager {
    /// Create a manager that connects through `engine`.
    pub fn new(engine: Arc<dyn TransportEngine>, config: ClientConfig) -> Self {
        Self {
            engine,
            config,
            properties: Properties::new(),
            resolver: EndpointResolver::new(),
        }
    }

    /// Create a manager using the provider named by `config.engine_provider`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aggregate`] holding an [`Error::ProviderLoad`] if the
    /// provider is unknown or fails to start.
    pub fn from_registry(registry: &EngineRegistry, config: ClientConfig) -> Result<Self> {
        let mut errors = ErrorCollector::new();
        match registry.load(&config.engine_provider, &mut errors) {
            Some(engine) => Ok(Self::new(engine, config)),
            None => Err(errors.compose_aggregate()),
        }
    }

    /// Container properties, copied into every attempt.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect `input` to `url`.
    ///
    /// `config` applies to programmatic endpoints; declared client endpoints
    /// derive their configuration from their marker.
    ///
    /// # Errors
    ///
    /// - [`Error::Aggregate`] for every problem found before the engine was
    ///   asked to connect (bad scheme or URI, unresolvable endpoint, invalid
    ///   request headers, engine refusal).
    /// - [`Error::Handshake`] if the engine reported a failure.
    /// - [`Error::HandshakeTimeout`] if no outcome arrived in time.
    /// - [`Error::HandshakeInterrupted`] if the engine abandoned the attempt.
    pub async fn connect(
        &self,
        input: impl Into<EndpointInput>,
        config: Option<EndpointConfig>,
        url: impl AsRef<str>,
    ) -> Result<Session> {
        let input = input.into();
        let url = url.as_ref();
        let span = tracing::debug_span!("connect", url = %url, endpoint = input.kind());
        self.attempt(&input, config, url).instrument(span).await
    }

    /// Connect a live programmatic endpoint.
    pub async fn connect_endpoint<E: Endpoint>(
        &self,
        endpoint: E,
        config: EndpointConfig,
        url: impl AsRef<str>,
    ) -> Result<Session> {
        self.connect(EndpointInput::instance(endpoint), Some(config), url).await
    }

    /// Construct and connect a programmatic endpoint type.
    pub async fn connect_class<E: Endpoint + Default>(
        &self,
        config: EndpointConfig,
        url: impl AsRef<str>,
    ) -> Result<Session> {
        self.connect(EndpointInput::class::<E>(), Some(config), url).await
    }

    /// Construct and connect a declared client endpoint type.
    pub async fn connect_annotated<T: Annotated + Default>(
        &self,
        url: impl AsRef<str>,
    ) -> Result<Session> {
        self.connect(EndpointInput::annotated::<T>(), None, url).await
    }

    /// Connect a live declared client endpoint.
    pub async fn connect_annotated_instance<T: Annotated>(
        &self,
        handler: T,
        url: impl AsRef<str>,
    ) -> Result<Session> {
        self.connect(EndpointInput::annotated_instance(handler), None, url).await
    }

    async fn attempt(
        &self,
        input: &EndpointInput,
        supplied: Option<EndpointConfig>,
        raw_url: &str,
    ) -> Result<Session> {
        let mut errors = ErrorCollector::new();
        let url = parse_uri(raw_url, &mut errors);
        let (signal, waiter) = handshake_signal();
        let resolved = self.resolver.resolve(input, supplied, &mut errors);

        let opened = match (url, resolved) {
            (Some(url), Some(resolved)) if errors.is_empty() => {
                self.open(url, resolved, signal, &waiter, &mut errors)
            }
            _ => None,
        };
        let Some((socket, properties)) = opened else {
            tracing::debug!(errors = errors.len(), "connection attempt rejected before hand-off");
            return Err(errors.compose_aggregate());
        };

        let timeout = self.config.timeouts.handshake;
        match waiter.wait(timeout).await {
            WaitOutcome::Signaled => {
                if let Some(cause) = HandshakeFailure::take(&properties) {
                    tracing::warn!(error = %cause, "handshake failed");
                    return Err(Error::Handshake(cause));
                }
                match socket.into_session() {
                    Some(session) => {
                        tracing::info!(session = session.id(), "connected");
                        Ok(session)
                    }
                    None => Err(Error::InvalidHandshake(
                        "engine reported success without opening a session".to_string(),
                    )),
                }
            }
            WaitOutcome::TimedOut => {
                tracing::warn!(?timeout, "handshake timed out");
                Err(Error::HandshakeTimeout(timeout))
            }
            WaitOutcome::Interrupted => {
                tracing::warn!("handshake listener dropped without an outcome");
                Err(Error::HandshakeInterrupted)
            }
        }
    }

    /// Hand the attempt to the engine. Returns `None` after recording why it could not start.
    fn open(
        &self,
        url: Url,
        resolved: ResolvedEndpoint,
        signal: HandshakeSignal,
        waiter: &HandshakeWaiter,
        errors: &mut ErrorCollector,
    ) -> Option<(PendingSocket, Properties)> {
        let ResolvedEndpoint { endpoint, config } = resolved;

        let handshake = match prepare_request(&url, &config) {
            Ok(handshake) => handshake,
            Err(e) => {
                errors.add(e);
                return None;
            }
        };

        let properties = self.properties.snapshot();
        let listener = Arc::new(ClientHandshakeListener::new(
            config.clone(),
            properties.clone(),
            signal,
        ));
        let wrapper = Arc::new(EndpointWrapper::new(
            endpoint,
            config.clone(),
            url.clone(),
            SessionSettings::from_config(&self.config),
        ));

        let request = OpenRequest {
            url,
            config,
            endpoint: wrapper,
            listener,
            properties: properties.clone(),
            handshake,
            cancellation: waiter.cancellation(),
        };
        tracing::debug!("handing connection attempt to transport engine");
        match self.engine.open_client_socket(request) {
            Ok(socket) => Some((PendingSocket::new(socket), properties)),
            Err(source) => {
                errors.add(Error::ConnectionFailed(source));
                None
            }
        }
    }
}

/// Engine socket owned by an attempt until its session is handed to the caller.
///
/// Dropped without handing over (failure, timeout, or the caller abandoning
/// `connect`), it closes the socket.
struct PendingSocket {
    socket: Box<dyn ClientSocket>,
    handed_over: bool,
}

impl PendingSocket {
    fn new(socket: Box<dyn ClientSocket>) -> Self {
        Self {
            socket,
            handed_over: false,
        }
    }

    fn into_session(mut self) -> Option<Session> {
        let session = self.socket.session();
        self.handed_over = session.is_some();
        session
    }
}

impl Drop for PendingSocket {
    fn drop(&mut self) {
        if !self.handed_over {
            tracing::debug!("closing engine socket of unfinished attempt");
            self.socket.close();
        }
    }
}

impl fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientManager")
            .field("config", &self.config)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// Check the raw scheme, then parse. Failures are recorded in `errors`.
fn parse_uri(raw: &str, errors: &mut ErrorCollector) -> Option<Url> {
    let scheme = raw.split_once(':').map(|(scheme, _)| scheme);
    if !scheme.is_some_and(|s| SCHEMES.contains(&s)) {
        errors.add(Error::Scheme {
            uri: raw.to_string(),
        });
        return None;
    }
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(source) => {
            errors.add(Error::UriSyntax {
                uri: raw.to_string(),
                source,
            });
            None
        }
    }
}

/// Build the upgrade request and let the configurator adjust it.
fn prepare_request(url: &Url, config: &EndpointConfig) -> Result<HandshakeRequest> {
    let mut request = HandshakeRequest::new(url, config)?;
    config.configurator().before_request(request.headers_mut());
    request.validate()?;
    Ok(request)
}
