use std::sync::{Arc, Mutex};
use std::time::Duration;

use hpcwatch_stream::{
    ConnectionState, Endpoint, EventSink, SseClient, StreamError, StreamEvent, StreamSettings,
    Subscription,
};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPIC: &str = "hpc-test";

const RELAY_BODY: &str = concat!(
    "event: open\n",
    "data: {\"id\":\"o1\",\"time\":1,\"event\":\"open\",\"topic\":\"hpc-test\"}\n\n",
    ": heartbeat\n\n",
    "event: message\n",
    "data: {\"id\":\"m1\",\"time\":2,\"event\":\"message\",\"topic\":\"hpc-test\",\"message\":\"🚀 Started: Job 12345 — python train.py\"}\n\n",
    "event: keepalive\n",
    "data: {\"id\":\"k1\",\"time\":3,\"event\":\"keepalive\",\"topic\":\"hpc-test\"}\n\n",
    "data: \n\n",
    "data: ❌ Failed (exit 1): Job 12345 — OOM killed\n\n",
);

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<StreamEvent>>,
}

impl TestSink {
    fn snapshot(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }

    fn messages(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter_map(|event| match event {
                StreamEvent::Message(message) => Some(message.text),
                StreamEvent::State(_) => None,
            })
            .collect()
    }

    fn count_state(&self, state: ConnectionState) -> usize {
        self.snapshot()
            .iter()
            .filter(|event| **event == StreamEvent::State(state))
            .count()
    }
}

#[async_trait::async_trait]
impl EventSink for TestSink {
    async fn emit(&self, event: StreamEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn fast_settings() -> StreamSettings {
    StreamSettings {
        connect_timeout: Duration::from_millis(500),
        handshake_timeout: Duration::from_millis(500),
        idle_timeout: Duration::from_secs(2),
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(40),
        channel_capacity: 8,
    }
}

fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

async fn wait_until(sink: &TestSink, mut done: impl FnMut(&TestSink) -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !done(sink) {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out; events so far: {:?}",
            sink.snapshot()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn spawn_run(
    client: SseClient,
    sink: Arc<TestSink>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { client.run(sink.as_ref(), &cancel).await })
}

#[tokio::test]
async fn delivers_messages_and_skips_heartbeats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hpc-test/sse"))
        .and(header("accept", "text/event-stream"))
        .respond_with(sse_response(RELAY_BODY))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(&server.uri(), TOPIC).unwrap();
    let client = SseClient::new(&endpoint, fast_settings()).unwrap();
    let sink = Arc::new(TestSink::default());
    let cancel = CancellationToken::new();
    let task = spawn_run(client, sink.clone(), cancel.clone());

    wait_until(&sink, |sink| sink.messages().len() >= 2).await;
    cancel.cancel();
    task.await.unwrap();

    let messages = sink.messages();
    assert_eq!(
        &messages[..2],
        &[
            "🚀 Started: Job 12345 — python train.py".to_string(),
            "❌ Failed (exit 1): Job 12345 — OOM killed".to_string(),
        ]
    );
    let events = sink.snapshot();
    assert_eq!(events[0], StreamEvent::State(ConnectionState::Connecting));
    assert_eq!(events[1], StreamEvent::State(ConnectionState::Connected));
}

#[tokio::test]
async fn recovers_after_consecutive_failures() {
    let failures = 3;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hpc-test/sse"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(failures)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hpc-test/sse"))
        .respond_with(sse_response("data: ✅ Finished: Job 12345 (took 2h 15m 3s)\n\n"))
        .with_priority(2)
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(&server.uri(), TOPIC).unwrap();
    let client = SseClient::new(&endpoint, fast_settings()).unwrap();
    let sink = Arc::new(TestSink::default());
    let cancel = CancellationToken::new();
    let task = spawn_run(client, sink.clone(), cancel.clone());

    wait_until(&sink, |sink| !sink.messages().is_empty()).await;
    cancel.cancel();
    task.await.unwrap();

    let events = sink.snapshot();
    let first_message = events
        .iter()
        .position(|event| matches!(event, StreamEvent::Message(_)))
        .unwrap();
    let disconnects_before = events[..first_message]
        .iter()
        .filter(|event| **event == StreamEvent::State(ConnectionState::Disconnected))
        .count();
    assert_eq!(disconnects_before, failures as usize);
    assert_eq!(
        events[first_message - 1],
        StreamEvent::State(ConnectionState::Connected)
    );
    assert_eq!(
        sink.messages()[0],
        "✅ Finished: Job 12345 (took 2h 15m 3s)"
    );
}

#[tokio::test]
async fn server_close_triggers_reconnect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hpc-test/sse"))
        .respond_with(sse_response("data: 🚀 Started: Job 1\n\n"))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(&server.uri(), TOPIC).unwrap();
    let client = SseClient::new(&endpoint, fast_settings()).unwrap();
    let sink = Arc::new(TestSink::default());
    let cancel = CancellationToken::new();
    let task = spawn_run(client, sink.clone(), cancel.clone());

    wait_until(&sink, |sink| sink.count_state(ConnectionState::Connected) >= 2).await;
    cancel.cancel();
    task.await.unwrap();

    assert!(sink.messages().len() >= 2);
    assert!(server.received_requests().await.unwrap().len() >= 2);
}

#[tokio::test]
async fn slow_handshake_is_treated_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hpc-test/sse"))
        .respond_with(sse_response("data: late\n\n").set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let settings = StreamSettings {
        handshake_timeout: Duration::from_millis(50),
        ..fast_settings()
    };
    let endpoint = Endpoint::new(&server.uri(), TOPIC).unwrap();
    let client = SseClient::new(&endpoint, settings).unwrap();

    let err = client.open().await.unwrap_err();
    assert_eq!(err, StreamError::HandshakeTimeout);

    let sink = Arc::new(TestSink::default());
    let cancel = CancellationToken::new();
    let task = spawn_run(client, sink.clone(), cancel.clone());
    wait_until(&sink, |sink| {
        sink.count_state(ConnectionState::Disconnected) >= 2
    })
    .await;
    cancel.cancel();
    task.await.unwrap();

    assert_eq!(sink.count_state(ConnectionState::Connected), 0);
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn open_reports_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hpc-test/sse"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(&server.uri(), TOPIC).unwrap();
    let client = SseClient::new(&endpoint, fast_settings()).unwrap();
    let err = client.open().await.unwrap_err();
    assert_eq!(err, StreamError::HttpStatus(404));
}

/// Serves one raw HTTP response that promises more body than it sends,
/// then either holds the socket open for `hold` or closes it.
async fn truncated_relay(body: &'static str, hold: Option<Duration>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();
        let head = concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Type: text/event-stream\r\n",
            "Content-Length: 4096\r\n",
            "\r\n",
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(body.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        if let Some(hold) = hold {
            tokio::time::sleep(hold).await;
        }
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn body_cut_short_is_a_network_error() {
    let server = truncated_relay("data: 🚀 Started: Job 7\n\n", None).await;
    let endpoint = Endpoint::new(&server, TOPIC).unwrap();
    let client = SseClient::new(&endpoint, fast_settings()).unwrap();
    let sink = TestSink::default();

    let response = client.open().await.unwrap();
    let err = client.pump(response, &sink).await.unwrap_err();

    assert!(matches!(err, StreamError::Network(_)), "got {err:?}");
    assert_eq!(sink.messages(), vec!["🚀 Started: Job 7".to_string()]);
}

#[tokio::test]
async fn silent_body_is_an_idle_timeout() {
    let server = truncated_relay(
        "data: 🚀 Started: Job 8\n\n",
        Some(Duration::from_secs(2)),
    )
    .await;
    let settings = StreamSettings {
        idle_timeout: Duration::from_millis(100),
        ..fast_settings()
    };
    let endpoint = Endpoint::new(&server, TOPIC).unwrap();
    let client = SseClient::new(&endpoint, settings).unwrap();
    let sink = TestSink::default();

    let response = client.open().await.unwrap();
    let err = client.pump(response, &sink).await.unwrap_err();

    assert_eq!(err, StreamError::IdleTimeout(Duration::from_millis(100)));
    assert_eq!(sink.messages(), vec!["🚀 Started: Job 8".to_string()]);
}

#[tokio::test]
async fn empty_stream_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hpc-test/sse"))
        .respond_with(sse_response(""))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(&server.uri(), TOPIC).unwrap();
    let client = SseClient::new(&endpoint, fast_settings()).unwrap();
    let sink = Arc::new(TestSink::default());
    let cancel = CancellationToken::new();
    let task = spawn_run(client, sink.clone(), cancel.clone());

    wait_until(&sink, |sink| {
        sink.count_state(ConnectionState::Connecting) >= 3
    })
    .await;
    cancel.cancel();
    task.await.unwrap();
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn cancellation_stops_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hpc-test/sse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(&server.uri(), TOPIC).unwrap();
    let client = SseClient::new(&endpoint, fast_settings()).unwrap();
    let sink = Arc::new(TestSink::default());
    let cancel = CancellationToken::new();
    let task = spawn_run(client, sink.clone(), cancel.clone());

    wait_until(&sink, |sink| {
        sink.count_state(ConnectionState::Disconnected) >= 2
    })
    .await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("run loop exits after cancel")
        .unwrap();

    let requests = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), requests);
}

#[test]
fn subscription_iterates_until_shutdown() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hpc-test/sse"))
            .respond_with(sse_response(RELAY_BODY))
            .mount(&server)
            .await;
        server
    });

    let endpoint = Endpoint::new(&server.uri(), TOPIC).unwrap();
    let mut subscription = Subscription::start(&endpoint, fast_settings()).unwrap();
    let stop = subscription.stop_handle();

    let first_message = subscription
        .by_ref()
        .find_map(|event| match event {
            StreamEvent::Message(message) => Some(message),
            StreamEvent::State(_) => None,
        })
        .unwrap();
    assert_eq!(first_message.text, "🚀 Started: Job 12345 — python train.py");

    stop.stop();
    assert!(stop.is_stopped());
    // Buffered events drain, then the sequence ends.
    subscription.by_ref().for_each(drop);
    assert_eq!(subscription.recv(), None);
    drop(subscription);
    drop(server);
}
