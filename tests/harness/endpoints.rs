use std::sync::atomic::{AtomicUsize, Ordering};

use rsws_client::{Annotated, ClientEndpoint, Endpoint, EndpointConfig, Session};

/// Programmatic endpoint that counts how often it was opened.
#[derive(Debug, Default)]
pub struct CountingEndpoint {
    opened: AtomicUsize,
}

impl CountingEndpoint {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Endpoint for CountingEndpoint {
    fn on_open(&self, _session: &Session, _config: &EndpointConfig) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }
}

/// Declared client endpoint with no negotiation metadata.
#[derive(Debug, Default)]
pub struct DeclaredEcho;

impl Annotated for DeclaredEcho {
    fn client_endpoint() -> Option<ClientEndpoint> {
        Some(ClientEndpoint::new())
    }
}

/// Declared client endpoint offering the `chat` subprotocol.
#[derive(Debug, Default)]
pub struct DeclaredChat;

impl Annotated for DeclaredChat {
    fn client_endpoint() -> Option<ClientEndpoint> {
        Some(ClientEndpoint::new().subprotocols(["chat", "superchat"]))
    }
}

/// Neither an endpoint nor a declared client endpoint.
#[derive(Debug, Default)]
pub struct Undeclared;

impl Annotated for Undeclared {}
