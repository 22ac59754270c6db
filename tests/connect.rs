//! End-to-end connection establishment against a scripted transport engine.

mod harness;

use std::sync::Arc;
use std::time::Duration;

use harness::{
    Behavior, CountingEndpoint, DeclaredChat, DeclaredEcho, ECHO_URL, MockEngine, Rejected,
    Undeclared,
};
use parking_lot::Mutex;
use rsws_client::{
    ClientConfig, ClientManager, Configurator, EndpointClass, EndpointConfig, EndpointInput,
    EngineRegistry, Error, HandshakeResponse, HeaderMap, Limits, SessionState, Timeouts,
    TransportEngine,
};

fn manager(engine: &Arc<MockEngine>) -> ClientManager {
    ClientManager::new(engine.clone(), ClientConfig::default())
}

fn single_cause(err: &Error) -> &Error {
    let causes: Vec<_> = err.causes().collect();
    assert_eq!(causes.len(), 1, "expected one cause, got {:?}", causes);
    causes[0]
}

#[tokio::test]
async fn test_annotated_class_connects() {
    let engine = MockEngine::accepting();
    let session = manager(&engine)
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap();

    assert_eq!(engine.invocations(), 1);
    let recorded = engine.last().unwrap();
    assert_eq!(recorded.url.as_str(), ECHO_URL);
    assert!(recorded.config.preferred_subprotocols().is_empty());
    assert!(recorded.config.extensions().is_empty());

    assert_eq!(session.state(), SessionState::Open);
    assert_eq!(session.request_uri().as_str(), ECHO_URL);
}

#[tokio::test]
async fn test_all_input_shapes_connect() {
    let engine = MockEngine::accepting();
    let manager = manager(&engine);
    let inputs = [
        EndpointInput::instance(CountingEndpoint::default()),
        EndpointInput::class::<CountingEndpoint>(),
        EndpointInput::annotated::<DeclaredEcho>(),
        EndpointInput::annotated_instance(DeclaredChat),
    ];

    for input in inputs {
        let session = manager.connect(input, None, ECHO_URL).await.unwrap();
        assert!(session.is_open());
    }
    assert_eq!(engine.invocations(), 4);
}

#[tokio::test]
async fn test_live_endpoint_is_opened() {
    let engine = MockEngine::accepting();
    let endpoint = Arc::new(CountingEndpoint::default());
    let input: Arc<dyn rsws_client::Endpoint> = endpoint.clone();

    manager(&engine).connect(input, None, ECHO_URL).await.unwrap();
    assert_eq!(endpoint.opened(), 1);
}

#[tokio::test]
async fn test_undeclared_class_rejected_without_engine() {
    let engine = MockEngine::accepting();
    let err = manager(&engine)
        .connect_annotated::<Undeclared>(ECHO_URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Aggregate(_)));
    assert!(matches!(single_cause(&err), Error::Resolution(_)));
    assert_eq!(engine.invocations(), 0);
}

#[tokio::test]
async fn test_bad_scheme_rejected_without_engine() {
    let engine = MockEngine::accepting();
    let err = manager(&engine)
        .connect_annotated::<DeclaredEcho>("http://localhost:8025/echo")
        .await
        .unwrap_err();

    assert!(matches!(single_cause(&err), Error::Scheme { .. }));
    assert_eq!(engine.invocations(), 0);
}

#[tokio::test]
async fn test_all_preflight_errors_reported_together() {
    let engine = MockEngine::accepting();
    let err = manager(&engine)
        .connect_annotated::<Undeclared>("WS://localhost/")
        .await
        .unwrap_err();

    let causes: Vec<_> = err.causes().collect();
    assert_eq!(causes.len(), 2);
    assert!(matches!(causes[0], Error::Scheme { .. }));
    assert!(matches!(causes[1], Error::Resolution(_)));
    assert!(err.to_string().starts_with("Deployment failed with 2 errors"));
    assert_eq!(engine.invocations(), 0);
}

#[tokio::test]
async fn test_uri_syntax_error() {
    let engine = MockEngine::accepting();
    let err = manager(&engine)
        .connect_annotated::<DeclaredEcho>("ws://")
        .await
        .unwrap_err();

    assert!(matches!(single_cause(&err), Error::UriSyntax { .. }));
    assert_eq!(engine.invocations(), 0);
}

#[tokio::test]
async fn test_instantiation_failure() {
    let engine = MockEngine::accepting();
    let class = EndpointClass::with_factory("Broken", || Err("missing constructor".into()));
    let err = manager(&engine)
        .connect(class, None, ECHO_URL)
        .await
        .unwrap_err();

    match single_cause(&err) {
        Error::Instantiation { type_name, source } => {
            assert_eq!(type_name, "Broken");
            assert_eq!(source.to_string(), "missing constructor");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(engine.invocations(), 0);
}

#[tokio::test]
async fn test_engine_error_surfaces_as_handshake_cause() {
    let engine = MockEngine::new(Behavior::Fail(403));
    let err = manager(&engine)
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap_err();

    let Error::Handshake(cause) = &err else {
        panic!("unexpected error: {:?}", err);
    };
    assert_eq!(cause.downcast_ref::<Rejected>().unwrap().status, 403);
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.is_handshake_failure());
    assert_eq!(engine.closed(), 1);
}

#[tokio::test]
async fn test_immediate_engine_error_surfaces_as_handshake_cause() {
    let engine = MockEngine::new(Behavior::FailImmediately(401));
    let err = manager(&engine)
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap_err();

    let Error::Handshake(cause) = &err else {
        panic!("unexpected error: {:?}", err);
    };
    assert_eq!(cause.downcast_ref::<Rejected>().unwrap().status, 401);
    assert_eq!(engine.invocations(), 1);
    assert_eq!(engine.closed(), 1);
}

#[tokio::test]
async fn test_handshake_failure_stays_in_attempt() {
    let engine = MockEngine::new(Behavior::Fail(403));
    let manager = manager(&engine);
    manager.properties().insert("tenant", "acme").unwrap();

    manager.connect_annotated::<DeclaredEcho>(ECHO_URL).await.unwrap_err();

    assert_eq!(manager.properties().keys(), ["tenant"]);
    let recorded = engine.last().unwrap();
    assert_eq!(recorded.properties.keys(), ["tenant"]);
}

#[tokio::test(start_paused = true)]
async fn test_silent_engine_times_out() {
    let engine = MockEngine::new(Behavior::Silent);
    let config = ClientConfig::new().with_handshake_timeout(Duration::from_secs(3));
    let manager = ClientManager::new(engine.clone(), config);

    let start = tokio::time::Instant::now();
    let err = manager
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, Error::HandshakeTimeout(d) if d == Duration::from_secs(3)));
    assert!(elapsed >= Duration::from_secs(3));
    assert!(elapsed < Duration::from_secs(4));
    assert!(engine.tokens()[0].is_cancelled());
    assert_eq!(engine.closed(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_connect_cancels_attempt() {
    let engine = MockEngine::new(Behavior::Silent);
    let manager = manager(&engine);

    let outer = tokio::time::timeout(
        Duration::from_secs(1),
        manager.connect_annotated::<DeclaredEcho>(ECHO_URL),
    )
    .await;

    assert!(outer.is_err());
    assert_eq!(engine.invocations(), 1);
    assert!(engine.tokens()[0].is_cancelled());
    assert_eq!(engine.closed(), 1);
}

#[tokio::test]
async fn test_connected_socket_stays_open() {
    let engine = MockEngine::accepting();
    manager(&engine)
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap();

    assert!(!engine.tokens()[0].is_cancelled());
    assert_eq!(engine.closed(), 0);
}

#[tokio::test]
async fn test_upgrade_request_on_the_wire() {
    let engine = MockEngine::accepting();
    manager(&engine)
        .connect_annotated::<DeclaredChat>("ws://localhost:8025/echo?room=1")
        .await
        .unwrap();

    let wire = engine.last().unwrap().wire;
    assert!(wire.starts_with("GET /echo?room=1 HTTP/1.1\r\n"));
    assert!(wire.contains("Host: localhost:8025\r\n"));
    assert!(wire.contains("Sec-WebSocket-Protocol: chat, superchat\r\n"));
    assert!(wire.contains("Sec-WebSocket-Version: 13\r\n"));
    assert!(wire.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_silent_engine_times_out_in_real_time() {
    let engine = MockEngine::new(Behavior::Silent);
    let timeout = Duration::from_millis(200);
    let config = ClientConfig::new().with_handshake_timeout(timeout);
    let manager = ClientManager::new(engine.clone(), config);

    let start = std::time::Instant::now();
    let err = manager
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HandshakeTimeout(_)));
    assert!(start.elapsed() >= timeout);
    assert!(start.elapsed() < timeout + Duration::from_secs(2));
}

#[tokio::test]
async fn test_dropped_listener_interrupts() {
    let engine = MockEngine::new(Behavior::DropListener);
    let err = manager(&engine)
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HandshakeInterrupted));
    assert!(!engine.tokens()[0].is_cancelled());
}

#[tokio::test]
async fn test_second_callback_has_no_effect() {
    let engine = MockEngine::new(Behavior::DoubleCallback);
    let session = manager(&engine)
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap();

    assert!(session.is_open());
    let recorded = engine.last().unwrap();
    assert!(recorded.properties.is_empty());
}

#[tokio::test]
async fn test_success_without_session() {
    let engine = MockEngine::new(Behavior::RespondWithoutSession);
    let err = manager(&engine)
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidHandshake(_)));
}

#[tokio::test]
async fn test_engine_refusal_is_collected() {
    let engine = MockEngine::new(Behavior::Refuse("connection refused".to_string()));
    let err = manager(&engine)
        .connect_annotated::<DeclaredEcho>(ECHO_URL)
        .await
        .unwrap_err();

    match single_cause(&err) {
        Error::ConnectionFailed(source) => assert_eq!(source.to_string(), "connection refused"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(engine.invocations(), 1);
}

#[tokio::test]
async fn test_negotiated_parameters_reach_session() {
    let engine = MockEngine::new(Behavior::Respond(vec![
        ("sec-websocket-protocol".to_string(), "chat".to_string()),
        (
            "SEC-WEBSOCKET-EXTENSIONS".to_string(),
            "permessage-deflate; client_max_window_bits=10".to_string(),
        ),
    ]));
    let session = manager(&engine)
        .connect_annotated::<DeclaredChat>(ECHO_URL)
        .await
        .unwrap();

    let recorded = engine.last().unwrap();
    assert_eq!(
        recorded.headers.first("Sec-WebSocket-Protocol"),
        Some("chat, superchat")
    );
    assert_eq!(session.negotiated_subprotocol(), Some("chat"));
    let extension = &session.negotiated_extensions()[0];
    assert_eq!(extension.name(), "permessage-deflate");
    assert_eq!(
        extension
            .parameter("client_max_window_bits")
            .and_then(|p| p.value.as_deref()),
        Some("10")
    );
}

#[derive(Default)]
struct Recording {
    requests: Mutex<Vec<Option<String>>>,
    responses: Mutex<Vec<Option<String>>>,
}

impl Configurator for Recording {
    fn before_request(&self, headers: &mut HeaderMap) {
        headers.insert("Origin", "http://localhost");
        self.requests
            .lock()
            .push(headers.first("sec-websocket-key").map(str::to_string));
    }

    fn after_response(&self, response: &HandshakeResponse) {
        self.responses
            .lock()
            .push(response.headers().first("x-served-by").map(str::to_string));
    }
}

#[tokio::test]
async fn test_configurator_sees_both_sides() {
    let engine = MockEngine::new(Behavior::Respond(vec![(
        "X-SERVED-BY".to_string(),
        "mock".to_string(),
    )]));
    let recording = Arc::new(Recording::default());
    let config = EndpointConfig::builder()
        .configurator(recording.clone())
        .build();

    manager(&engine)
        .connect_endpoint(CountingEndpoint::default(), config, ECHO_URL)
        .await
        .unwrap();

    assert!(recording.requests.lock()[0].is_some());
    assert_eq!(*recording.responses.lock(), [Some("mock".to_string())]);
    let recorded = engine.last().unwrap();
    assert_eq!(recorded.headers.first("origin"), Some("http://localhost"));
}

struct Injecting;

impl Configurator for Injecting {
    fn before_request(&self, headers: &mut HeaderMap) {
        headers.insert("X-Evil", "1\r\nX-Injected: 1");
    }
}

#[tokio::test]
async fn test_invalid_header_blocks_engine() {
    let engine = MockEngine::accepting();
    let config = EndpointConfig::builder().configurator(Arc::new(Injecting)).build();
    let err = manager(&engine)
        .connect_class::<CountingEndpoint>(config, ECHO_URL)
        .await
        .unwrap_err();

    assert!(matches!(single_cause(&err), Error::InvalidHeaderValue { .. }));
    assert_eq!(engine.invocations(), 0);
}

#[tokio::test]
async fn test_session_defaults_from_container() {
    let engine = MockEngine::accepting();
    let config = ClientConfig::new()
        .with_limits(Limits::new(1024, 2048))
        .with_timeouts(Timeouts::new(
            Duration::from_secs(5),
            Some(Duration::from_secs(1)),
            Some(Duration::from_secs(60)),
        ));
    let manager = ClientManager::new(engine.clone(), config);
    let session = manager.connect_annotated::<DeclaredEcho>(ECHO_URL).await.unwrap();

    let settings = session.settings();
    assert_eq!(settings.max_text_message_buffer_size, 1024);
    assert_eq!(settings.max_binary_message_buffer_size, 2048);
    assert_eq!(settings.async_send_timeout, Some(Duration::from_secs(1)));
    assert_eq!(settings.max_idle_timeout, Some(Duration::from_secs(60)));
}

#[tokio::test]
async fn test_reserved_properties_rejected() {
    let engine = MockEngine::accepting();
    let manager = manager(&engine);
    assert!(matches!(
        manager.properties().insert("rsws.client.handshake-error", 1u8),
        Err(Error::ReservedProperty(_))
    ));
}

#[tokio::test]
async fn test_registry_provider() {
    let mut registry = EngineRegistry::new();
    registry.register("mock", || Ok(MockEngine::accepting() as Arc<dyn TransportEngine>));

    let config = ClientConfig::new().with_engine_provider("mock");
    let manager = ClientManager::from_registry(&registry, config).unwrap();
    let session = manager.connect_annotated::<DeclaredEcho>(ECHO_URL).await.unwrap();
    assert!(session.is_open());
}

#[test]
fn test_registry_unknown_provider() {
    let registry = EngineRegistry::new();
    let err = ClientManager::from_registry(&registry, ClientConfig::default()).unwrap_err();

    match single_cause(&err) {
        Error::ProviderLoad { provider, .. } => assert_eq!(provider, "default"),
        other => panic!("unexpected error: {:?}", other),
    }
}
