use chrono::{DateTime, Local};

/// Connection state of the stream client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// A data-bearing message as received from the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub text: String,
    pub title: Option<String>,
    pub received_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    State(ConnectionState),
    Message(RawMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("failed to start stream worker: {0}")]
    Runtime(String),
    #[error("handshake timed out")]
    HandshakeTimeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("no data for {0:?}, connection presumed dead")]
    IdleTimeout(std::time::Duration),
}
