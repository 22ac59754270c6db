//! # rsws-client - WebSocket client connection establishment
//!
//! `rsws-client` turns a client endpoint plus a `ws://` or `wss://` URI into a
//! live [`Session`]. The wire handshake is delegated to a pluggable
//! [`TransportEngine`]; this crate resolves the endpoint, prepares the
//! upgrade request, hands the attempt to the engine and waits, bounded by a
//! timeout, for the engine to report the outcome.
//!
//! ## Features
//!
//! - **Four endpoint shapes**: live endpoints, endpoint types, and handler
//!   types or values declared through a [`ClientEndpoint`] marker
//! - **Collected deployment errors** reported together as one [`Error::Aggregate`]
//! - **Single-fire handshake outcome** that tolerates misbehaving engines
//! - **Configurator hooks** over the request and response headers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rsws_client::{ClientConfig, ClientManager, EndpointConfig, EndpointInput};
//!
//! let manager = ClientManager::new(Arc::new(engine), ClientConfig::default());
//! let input = EndpointInput::instance(Echo);
//! let session = manager
//!     .connect(input, Some(EndpointConfig::default()), "ws://localhost:8025/echo")
//!     .await?;
//! ```

pub mod client;
pub mod collector;
pub mod config;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod extensions;
pub mod handshake;
pub mod message;
pub mod properties;
pub mod session;

pub use client::ClientManager;
pub use collector::ErrorCollector;
pub use config::{ClientConfig, Limits, Timeouts, DEFAULT_HANDSHAKE_TIMEOUT};
pub use endpoint::{
    Annotated, AnnotatedClass, AnnotatedInstance, ClientEndpoint, Configurator, Decoder, Encoder,
    Endpoint, EndpointClass, EndpointConfig, EndpointInput, EndpointWrapper,
};
pub use engine::{ClientSocket, EngineRegistry, OpenRequest, TransportEngine};
pub use error::{AggregateError, BoxError, Error, Result};
pub use extensions::Extension;
pub use handshake::{
    compute_accept_key, HandshakeListener, HandshakeRequest, HandshakeResponse, HeaderMap, WS_GUID,
};
pub use message::{CloseCode, CloseReason, Message};
pub use properties::Properties;
pub use session::{Session, SessionSettings, SessionState};
