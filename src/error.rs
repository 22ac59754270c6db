//! Error types for WebSocket client deployment and connection.
//!
//! Failures detected before the transport engine is involved (bad URI, an
//! endpoint that cannot be resolved or instantiated, a missing engine provider)
//! are collected and reported together as a single [`Error::Aggregate`].
//! Failures detected while waiting for the handshake are reported directly.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed foreign error used for causes raised by user code and engines.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while deploying a client endpoint or establishing a session.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The URI scheme is missing or is not one of `ws` / `wss`.
    #[error("Incorrect scheme in WebSocket endpoint URI: {uri}")]
    Scheme {
        /// The rejected URI, as supplied.
        uri: String,
    },

    /// The URI could not be parsed.
    #[error("Incorrect WebSocket endpoint URI {uri}: {source}")]
    UriSyntax {
        /// The rejected URI, as supplied.
        uri: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },

    /// None of the accepted endpoint shapes matched the input.
    #[error("Cannot resolve endpoint: {0}")]
    Resolution(String),

    /// A resolved endpoint type could not be instantiated.
    #[error("Cannot instantiate {type_name}: {source}")]
    Instantiation {
        /// Name of the type that failed to instantiate.
        type_name: String,
        /// Failure raised by the factory.
        #[source]
        source: BoxError,
    },

    /// The configured transport engine provider could not be loaded.
    #[error("Cannot load transport engine provider {provider}: {source}")]
    ProviderLoad {
        /// Provider name that was requested.
        provider: String,
        /// Why loading failed.
        #[source]
        source: BoxError,
    },

    /// The transport engine refused to start the connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] BoxError),

    /// A handshake header value is not a valid HTTP header value.
    #[error("Invalid value for header {header}: {reason}")]
    InvalidHeaderValue {
        /// Header name.
        header: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The handshake response does not match the request.
    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    /// An extension declaration could not be parsed.
    #[error("Invalid extension: {0}")]
    InvalidExtension(String),

    /// The handshake key could not be generated.
    #[error("Cannot generate Sec-WebSocket-Key: {0}")]
    KeyGeneration(#[from] getrandom::Error),

    /// A user property used a key from the reserved namespace.
    #[error("Property key {0} is reserved for internal use")]
    ReservedProperty(String),

    /// The engine reported an explicit handshake failure.
    #[error("Handshake error: {0}")]
    Handshake(#[source] BoxError),

    /// No handshake outcome was reported before the deadline.
    #[error("Handshake response not received within {0:?}")]
    HandshakeTimeout(Duration),

    /// The wait for the handshake outcome was abandoned before any outcome was reported.
    #[error("Handshake response not received: wait interrupted")]
    HandshakeInterrupted,

    /// One or more deployment errors collected before the transport hand-off.
    #[error(transparent)]
    Aggregate(AggregateError),
}

impl Error {
    /// Iterate over the individual failures carried by this error.
    ///
    /// For [`Error::Aggregate`] this yields every collected error in detection
    /// order; for any other variant it yields the error itself.
    pub fn causes(&self) -> impl Iterator<Item = &Error> {
        let slice = match self {
            Error::Aggregate(aggregate) => aggregate.errors(),
            other => std::slice::from_ref(other),
        };
        slice.iter()
    }

    /// Returns `true` if this error was raised after the transport hand-off.
    #[must_use]
    pub const fn is_handshake_failure(&self) -> bool {
        matches!(
            self,
            Error::Handshake(_) | Error::HandshakeTimeout(_) | Error::HandshakeInterrupted
        )
    }
}

/// Several deployment errors reported as one.
///
/// Every collected error is retained with its own `source()` chain; nothing
/// is flattened into text.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<Error>,
}

impl AggregateError {
    pub(crate) fn new(errors: Vec<Error>) -> Self {
        Self { errors }
    }

    /// The collected errors, in detection order.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if no error was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the aggregate and return the collected errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "Deployment failed"),
            [single] => write!(f, "Deployment failed: {}", single),
            errors => {
                write!(f, "Deployment failed with {} errors:", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    write!(f, " [{}] {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|err| err as &(dyn std::error::Error + 'static))
    }
}
