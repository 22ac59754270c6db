//! The callback contract between a transport engine and the client.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::endpoint::EndpointConfig;
use crate::error::BoxError;
use crate::handshake::HandshakeResponse;
use crate::handshake::signal::HandshakeSignal;
use crate::properties::{HANDSHAKE_ERROR_KEY, Properties};

/// Receives the outcome of one handshake.
///
/// A transport engine calls exactly one of these methods, exactly once, from
/// any thread. Calls after the first are ignored.
pub trait HandshakeListener: Send + Sync {
    /// The server's response headers arrived; the handshake succeeded.
    fn on_response_headers(&self, headers: &[(String, String)]);

    /// The handshake failed.
    fn on_error(&self, cause: BoxError);
}

/// A handshake failure parked in the attempt's property bag until the caller
/// picks it up.
pub(crate) struct HandshakeFailure {
    cause: Mutex<Option<BoxError>>,
}

impl HandshakeFailure {
    fn new(cause: BoxError) -> Self {
        Self {
            cause: Mutex::new(Some(cause)),
        }
    }

    /// Remove the failure parked in `properties`, if any.
    pub(crate) fn take(properties: &Properties) -> Option<BoxError> {
        properties
            .remove(HANDSHAKE_ERROR_KEY)?
            .downcast::<HandshakeFailure>()
            .ok()?
            .cause
            .lock()
            .take()
    }
}

/// Listener installed by [`ClientManager`](crate::ClientManager) for one attempt.
pub(crate) struct ClientHandshakeListener {
    config: EndpointConfig,
    properties: Properties,
    signal: HandshakeSignal,
}

impl ClientHandshakeListener {
    pub(crate) fn new(
        config: EndpointConfig,
        properties: Properties,
        signal: HandshakeSignal,
    ) -> Self {
        Self {
            config,
            properties,
            signal,
        }
    }
}

impl HandshakeListener for ClientHandshakeListener {
    fn on_response_headers(&self, headers: &[(String, String)]) {
        if !self.signal.claim() {
            tracing::debug!("handshake already completed, ignoring response headers");
            return;
        }
        let response = HandshakeResponse::from_pairs(headers);
        tracing::debug!(headers = response.headers().len(), "handshake response received");
        self.config.configurator().after_response(&response);
        self.signal.fire();
    }

    fn on_error(&self, cause: BoxError) {
        if !self.signal.claim() {
            tracing::debug!(error = %cause, "handshake already completed, ignoring error");
            return;
        }
        tracing::debug!(error = %cause, "handshake failed");
        self.properties
            .insert_reserved(HANDSHAKE_ERROR_KEY, Arc::new(HandshakeFailure::new(cause)));
        self.signal.fire();
    }
}

impl fmt::Debug for ClientHandshakeListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandshakeListener")
            .field("completed", &self.signal.is_claimed())
            .finish()
    }
}
