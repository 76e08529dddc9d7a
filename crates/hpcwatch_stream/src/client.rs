use std::time::Duration;

use chrono::Local;
use futures_util::StreamExt;
use hpcwatch_logging::{hpc_debug, hpc_info, hpc_warn};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::backoff::Backoff;
use crate::payload::interpret;
use crate::sse::SseDecoder;
use crate::{ConnectionState, Endpoint, StreamError, StreamEvent};

#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// TCP/TLS connect limit per attempt.
    pub connect_timeout: Duration,
    /// Limit for receiving response headers.
    pub handshake_timeout: Duration,
    /// Longest tolerated silence on an open stream. The relay sends
    /// keepalives well within this.
    pub idle_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub channel_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(15),
            idle_timeout: Duration::from_secs(120),
            initial_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
            channel_capacity: 64,
        }
    }
}

/// Receiver of stream events.
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: StreamEvent);
}

pub struct ChannelSink {
    tx: tokio::sync::mpsc::Sender<StreamEvent>,
}

impl ChannelSink {
    pub fn new(tx: tokio::sync::mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait::async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: StreamEvent) {
        let _ = self.tx.send(event).await;
    }
}

/// Server-sent-event client for one relay topic.
#[derive(Debug, Clone)]
pub struct SseClient {
    http: reqwest::Client,
    url: Url,
    settings: StreamSettings,
}

impl SseClient {
    pub fn new(endpoint: &Endpoint, settings: StreamSettings) -> Result<Self, StreamError> {
        // No overall request timeout: the response body is meant to stay open.
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| StreamError::Client(err.to_string()))?;
        Ok(Self {
            http,
            url: endpoint.sse_url()?,
            settings,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Performs the handshake and returns the open event-stream response.
    pub async fn open(&self) -> Result<reqwest::Response, StreamError> {
        let request = self
            .http
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send();

        let response = tokio::time::timeout(self.settings.handshake_timeout, request)
            .await
            .map_err(|_| StreamError::HandshakeTimeout)?
            .map_err(map_handshake_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }

    /// Reads frames from an open response until the server closes it.
    ///
    /// Returns `Ok(())` on a clean close; every other ending is an error.
    pub async fn pump(
        &self,
        response: reqwest::Response,
        sink: &dyn EventSink,
    ) -> Result<(), StreamError> {
        let idle_timeout = self.settings.idle_timeout;
        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();

        loop {
            let next = tokio::time::timeout(idle_timeout, body.next())
                .await
                .map_err(|_| StreamError::IdleTimeout(idle_timeout))?;
            let Some(chunk) = next else {
                return Ok(());
            };
            let chunk = chunk.map_err(|err| StreamError::Network(err.to_string()))?;

            let discarded_before = decoder.discarded();
            for frame in decoder.push(&chunk) {
                if let Some(message) = interpret(&frame, Local::now()) {
                    hpc_debug!("Received message ({} bytes)", message.text.len());
                    sink.emit(StreamEvent::Message(message)).await;
                }
            }
            if decoder.discarded() > discarded_before {
                hpc_warn!(
                    "Discarded {} undecodable frame(s) from {}",
                    decoder.discarded() - discarded_before,
                    self.url
                );
            }
        }
    }

    /// Keeps a subscription alive until `cancel` fires.
    ///
    /// Every failure, timeout and server-side close is followed by a backoff
    /// sleep and a fresh attempt; the loop never gives up on its own.
    pub async fn run(&self, sink: &dyn EventSink, cancel: &CancellationToken) {
        let mut backoff = Backoff::new(self.settings.initial_backoff, self.settings.max_backoff);

        loop {
            sink.emit(StreamEvent::State(ConnectionState::Connecting)).await;
            hpc_info!("Connecting to {} ...", self.url);

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.session(sink, &mut backoff) => outcome,
            };
            match outcome {
                Ok(()) => hpc_info!("Stream closed by server"),
                Err(err) => hpc_warn!("Stream interrupted: {}", err),
            }
            sink.emit(StreamEvent::State(ConnectionState::Disconnected))
                .await;

            let delay = backoff.next_delay();
            hpc_info!("Reconnecting in {:?}", delay);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        hpc_info!("Subscription to {} stopped", self.url);
    }

    async fn session(
        &self,
        sink: &dyn EventSink,
        backoff: &mut Backoff,
    ) -> Result<(), StreamError> {
        let response = self.open().await?;
        backoff.reset();
        hpc_info!("Connected to {}", self.url);
        sink.emit(StreamEvent::State(ConnectionState::Connected)).await;
        self.pump(response, sink).await
    }
}

/// Maps failures of the handshake request. Body read errors are always
/// `Network`; silence on the body is `IdleTimeout`.
fn map_handshake_error(err: reqwest::Error) -> StreamError {
    if err.is_timeout() {
        return StreamError::HandshakeTimeout;
    }
    StreamError::Network(err.to_string())
}
