use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rsws_client::{
    BoxError, ClientSocket, EndpointConfig, HandshakeListener, HandshakeResponse, HeaderMap,
    OpenRequest, Properties, Session, TransportEngine,
};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Handshake failure raised by the mock server.
#[derive(Debug, thiserror::Error)]
#[error("server rejected upgrade with status {status}")]
pub struct Rejected {
    pub status: u16,
}

/// What the mock engine does with each attempt.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Open a session and report these response headers.
    Respond(Vec<(String, String)>),
    /// Report success without opening a session.
    RespondWithoutSession,
    /// Report a [`Rejected`] failure.
    Fail(u16),
    /// Report a [`Rejected`] failure before returning the socket.
    FailImmediately(u16),
    /// Keep the listener and never call it.
    Silent,
    /// Drop the listener without calling it.
    DropListener,
    /// Report success, then a late failure.
    DoubleCallback,
    /// Refuse to start the attempt.
    Refuse(String),
}

/// What the engine saw on its most recent invocation.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub url: Url,
    pub config: EndpointConfig,
    pub headers: HeaderMap,
    pub properties: Properties,
    /// The upgrade request as it would go on the wire.
    pub wire: String,
}

/// Scriptable transport engine. Delayed callbacks run on a separate thread.
pub struct MockEngine {
    behavior: Behavior,
    delay: Duration,
    invocations: AtomicUsize,
    last: Mutex<Option<Recorded>>,
    held: Mutex<Vec<Arc<dyn HandshakeListener>>>,
    tokens: Mutex<Vec<CancellationToken>>,
    closed: Arc<AtomicUsize>,
}

impl MockEngine {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Self::with_delay(behavior, Duration::from_millis(5))
    }

    pub fn with_delay(behavior: Behavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            delay,
            invocations: AtomicUsize::new(0),
            last: Mutex::new(None),
            held: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
            closed: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Engine that accepts every upgrade with no negotiated parameters.
    pub fn accepting() -> Arc<Self> {
        Self::new(Behavior::Respond(Vec::new()))
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<Recorded> {
        self.last.lock().clone()
    }

    pub fn tokens(&self) -> Vec<CancellationToken> {
        self.tokens.lock().clone()
    }

    /// Number of sockets the client closed.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockSocket {
    session: Arc<Mutex<Option<Session>>>,
    closed: Arc<AtomicUsize>,
    released: AtomicBool,
}

impl ClientSocket for MockSocket {
    fn session(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    fn close(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl TransportEngine for MockEngine {
    fn open_client_socket(&self, request: OpenRequest) -> Result<Box<dyn ClientSocket>, BoxError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let mut wire = Vec::new();
        request.handshake.write(&mut wire)?;
        *self.last.lock() = Some(Recorded {
            url: request.url.clone(),
            config: request.config.clone(),
            headers: request.handshake.headers().clone(),
            properties: request.properties.clone(),
            wire: String::from_utf8(wire)?,
        });
        self.tokens.lock().push(request.cancellation.clone());

        let slot = Arc::new(Mutex::new(None));
        let socket = Box::new(MockSocket {
            session: slot.clone(),
            closed: self.closed.clone(),
            released: AtomicBool::new(false),
        });
        let delay = self.delay;

        match self.behavior.clone() {
            Behavior::Refuse(reason) => return Err(reason.into()),
            Behavior::Silent => self.held.lock().push(request.listener),
            Behavior::DropListener => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    drop(request);
                });
            }
            Behavior::Fail(status) => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    request.listener.on_error(Box::new(Rejected { status }));
                });
            }
            Behavior::FailImmediately(status) => {
                request.listener.on_error(Box::new(Rejected { status }));
            }
            Behavior::RespondWithoutSession => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    request.listener.on_response_headers(&[]);
                });
            }
            Behavior::Respond(headers) => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    respond(request, headers, &slot);
                });
            }
            Behavior::DoubleCallback => {
                thread::spawn(move || {
                    thread::sleep(delay);
                    let listener = request.listener.clone();
                    respond(request, Vec::new(), &slot);
                    listener.on_error(Box::new(Rejected { status: 500 }));
                });
            }
        }
        Ok(socket)
    }
}

/// Complete the handshake the way a real engine would: verify the accept
/// key, open the session, then notify the listener.
fn respond(
    request: OpenRequest,
    mut headers: Vec<(String, String)>,
    slot: &Mutex<Option<Session>>,
) {
    headers.push((
        "Sec-WebSocket-Accept".to_string(),
        request.handshake.expected_accept(),
    ));
    let response = HandshakeResponse::from_pairs(&headers);
    if let Err(e) = request.handshake.verify_response(&response) {
        request.listener.on_error(Box::new(e));
        return;
    }
    let session = match Session::from_response(request.url.clone(), &response) {
        Ok(session) => session,
        Err(e) => {
            request.listener.on_error(Box::new(e));
            return;
        }
    };
    request.endpoint.on_open(session.clone());
    *slot.lock() = Some(session);
    request.listener.on_response_headers(&headers);
}
