//! Lifecycle mediation between a transport engine and a user endpoint.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use super::{Endpoint, EndpointConfig};
use crate::message::{CloseReason, Message};
use crate::session::{Session, SessionSettings, SessionState};

/// Wraps a resolved endpoint for one connection attempt.
///
/// Transport engines drive the session lifecycle through this type rather
/// than calling the user endpoint directly, so container defaults and state
/// transitions are applied uniformly.
pub struct EndpointWrapper {
    endpoint: Arc<dyn Endpoint>,
    config: EndpointConfig,
    url: Url,
    defaults: SessionSettings,
    session: Mutex<Option<Session>>,
}

impl EndpointWrapper {
    pub(crate) fn new(
        endpoint: Arc<dyn Endpoint>,
        config: EndpointConfig,
        url: Url,
        defaults: SessionSettings,
    ) -> Self {
        Self {
            endpoint,
            config,
            url,
            defaults,
            session: Mutex::new(None),
        }
    }

    /// Target URI of the attempt.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Configuration the endpoint was resolved with.
    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// The currently open session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    /// Open `session`: apply container defaults, mark it open and notify the endpoint.
    ///
    /// Returns `false` without notifying the endpoint if the session cannot be opened.
    pub fn on_open(&self, session: Session) -> bool {
        session.apply_settings(self.defaults.clone());
        if !session.transition(SessionState::Open) {
            tracing::warn!(
                session = session.id(),
                state = %session.state(),
                "session cannot be opened"
            );
            return false;
        }
        tracing::info!(session = session.id(), url = %self.url, "session opened");
        *self.session.lock() = Some(session.clone());
        self.endpoint.on_open(&session, &self.config);
        true
    }

    /// Forward a message to the endpoint.
    pub fn on_message(&self, session: &Session, message: &Message) {
        tracing::trace!(session = session.id(), len = message.len(), "message received");
        self.endpoint.on_message(session, message);
    }

    /// Close `session` and notify the endpoint.
    pub fn on_close(&self, session: &Session, reason: &CloseReason) {
        if !session.transition(SessionState::Closed) {
            tracing::debug!(session = session.id(), "session already closed");
            return;
        }
        tracing::info!(session = session.id(), reason = %reason, "session closed");
        let mut current = self.session.lock();
        if current.as_ref().is_some_and(|s| s.id() == session.id()) {
            *current = None;
        }
        drop(current);
        self.endpoint.on_close(session, reason);
    }

    /// Forward an error to the endpoint.
    pub fn on_error(&self, session: &Session, error: &(dyn std::error::Error + Send + Sync)) {
        tracing::warn!(session = session.id(), error = %error, "session error");
        self.endpoint.on_error(session, error);
    }
}

impl fmt::Debug for EndpointWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointWrapper")
            .field("url", &self.url.as_str())
            .field("config", &self.config)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
