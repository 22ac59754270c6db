//! Sessions handed to the caller once a handshake succeeds.
//!
//! A [`Session`] is created by the transport engine, opened through the
//! endpoint wrapper and then owned by whoever called `connect`. Cloning a
//! session yields another handle to the same underlying state.

mod state;

pub use state::SessionState;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use url::Url;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::extensions::Extension;
use crate::handshake::HandshakeResponse;
use crate::properties::Properties;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Per-session limits, seeded from the container defaults when the session opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Idle timeout. `None` means the session never idles out.
    pub max_idle_timeout: Option<Duration>,
    /// Async send timeout. `None` means no timeout.
    pub async_send_timeout: Option<Duration>,
    /// Largest text message buffered, in bytes.
    pub max_text_message_buffer_size: usize,
    /// Largest binary message buffered, in bytes.
    pub max_binary_message_buffer_size: usize,
}

impl SessionSettings {
    /// Container defaults for new sessions.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_idle_timeout: config.timeouts.max_session_idle,
            async_send_timeout: config.timeouts.async_send,
            max_text_message_buffer_size: config.limits.max_text_message_buffer_size,
            max_binary_message_buffer_size: config.limits.max_binary_message_buffer_size,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

struct SessionInner {
    id: u64,
    request_uri: Url,
    subprotocol: Option<String>,
    extensions: Vec<Extension>,
    user_properties: Properties,
    state: Mutex<SessionState>,
    settings: Mutex<SessionSettings>,
}

/// A WebSocket session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

/// Builder used by transport engines to create sessions.
#[derive(Debug)]
pub struct SessionBuilder {
    request_uri: Url,
    subprotocol: Option<String>,
    extensions: Vec<Extension>,
    settings: SessionSettings,
}

impl SessionBuilder {
    /// Record the subprotocol the server selected.
    #[must_use]
    pub fn subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }

    /// Record the extensions the server accepted.
    #[must_use]
    pub fn extensions(mut self, extensions: Vec<Extension>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Initial settings. Usually replaced by the container defaults on open.
    #[must_use]
    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Create the session in the `Connecting` state.
    #[must_use]
    pub fn build(self) -> Session {
        Session {
            inner: Arc::new(SessionInner {
                id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
                request_uri: self.request_uri,
                subprotocol: self.subprotocol,
                extensions: self.extensions,
                user_properties: Properties::new(),
                state: Mutex::new(SessionState::Connecting),
                settings: Mutex::new(self.settings),
            }),
        }
    }
}

impl Session {
    /// Start building a session for `request_uri`.
    #[must_use]
    pub fn builder(request_uri: Url) -> SessionBuilder {
        SessionBuilder {
            request_uri,
            subprotocol: None,
            extensions: Vec::new(),
            settings: SessionSettings::default(),
        }
    }

    /// Create a session from the server's handshake response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`](crate::Error::InvalidExtension) if
    /// the negotiated extensions header is malformed.
    pub fn from_response(request_uri: Url, response: &HandshakeResponse) -> Result<Self> {
        let mut builder = Session::builder(request_uri).extensions(response.extensions()?);
        if let Some(subprotocol) = response.subprotocol() {
            builder = builder.subprotocol(subprotocol);
        }
        Ok(builder.build())
    }

    /// Process-unique session id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The URI this session was opened against.
    #[must_use]
    pub fn request_uri(&self) -> &Url {
        &self.inner.request_uri
    }

    /// Subprotocol selected by the server.
    #[must_use]
    pub fn negotiated_subprotocol(&self) -> Option<&str> {
        self.inner.subprotocol.as_deref()
    }

    /// Extensions accepted by the server.
    #[must_use]
    pub fn negotiated_extensions(&self) -> &[Extension] {
        &self.inner.extensions
    }

    /// Properties private to this session.
    #[must_use]
    pub fn user_properties(&self) -> &Properties {
        &self.inner.user_properties
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.lock()
    }

    /// Returns `true` while the session is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Snapshot of the current settings.
    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.inner.settings.lock().clone()
    }

    /// Change the idle timeout of this session.
    pub fn set_max_idle_timeout(&self, timeout: Option<Duration>) {
        self.inner.settings.lock().max_idle_timeout = timeout;
    }

    /// Change the async send timeout of this session.
    pub fn set_async_send_timeout(&self, timeout: Option<Duration>) {
        self.inner.settings.lock().async_send_timeout = timeout;
    }

    pub(crate) fn apply_settings(&self, settings: SessionSettings) {
        *self.inner.settings.lock() = settings;
    }

    /// Move to `next` if that is a legal step from the current state.
    pub(crate) fn transition(&self, next: SessionState) -> bool {
        let mut state = self.inner.state.lock();
        if state.can_transition_to(next) {
            *state = next;
            true
        } else {
            false
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("request_uri", &self.inner.request_uri.as_str())
            .field("subprotocol", &self.inner.subprotocol)
            .field("state", &self.state())
            .finish()
    }
}
