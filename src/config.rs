//! Container-level configuration for the client.

use std::time::Duration;

/// How long `connect` waits for the transport engine to report a handshake outcome.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider name looked up by [`ClientManager::from_registry`](crate::ClientManager::from_registry)
/// when none is configured.
pub const DEFAULT_ENGINE_PROVIDER: &str = "default";

/// Default message buffer limits applied to every new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Largest text message a session buffers, in bytes.
    ///
    /// Default: 64 KB (64 * 1024)
    pub max_text_message_buffer_size: usize,

    /// Largest binary message a session buffers, in bytes.
    ///
    /// Default: 64 KB (64 * 1024)
    pub max_binary_message_buffer_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_text_message_buffer_size: 64 * 1024,
            max_binary_message_buffer_size: 64 * 1024,
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(
        max_text_message_buffer_size: usize,
        max_binary_message_buffer_size: usize,
    ) -> Self {
        Self {
            max_text_message_buffer_size,
            max_binary_message_buffer_size,
        }
    }
}

/// Timeout policy for connection attempts and new sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    /// Bounded wait for the handshake outcome.
    ///
    /// Default: 10 seconds
    pub handshake: Duration,

    /// Default async send timeout for new sessions. `None` means no timeout.
    ///
    /// Default: None
    pub async_send: Option<Duration>,

    /// Default idle timeout for new sessions. `None` means sessions never idle out.
    ///
    /// Default: None
    pub max_session_idle: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            handshake: DEFAULT_HANDSHAKE_TIMEOUT,
            async_send: None,
            max_session_idle: None,
        }
    }
}

impl Timeouts {
    /// Create new timeouts with custom values.
    #[must_use]
    pub const fn new(
        handshake: Duration,
        async_send: Option<Duration>,
        max_session_idle: Option<Duration>,
    ) -> Self {
        Self {
            handshake,
            async_send,
            max_session_idle,
        }
    }
}

/// Client container configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Session buffer limits.
    pub limits: Limits,

    /// Timeout policy.
    pub timeouts: Timeouts,

    /// Name of the transport engine provider to load from an
    /// [`EngineRegistry`](crate::engine::EngineRegistry).
    ///
    /// Default: [`DEFAULT_ENGINE_PROVIDER`]
    pub engine_provider: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            timeouts: Timeouts::default(),
            engine_provider: DEFAULT_ENGINE_PROVIDER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the timeout policy.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set only the handshake timeout.
    #[must_use]
    pub const fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.handshake = timeout;
        self
    }

    /// Set the engine provider name.
    #[must_use]
    pub fn with_engine_provider(mut self, provider: impl Into<String>) -> Self {
        self.engine_provider = provider.into();
        self
    }
}
