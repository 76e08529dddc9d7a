//! HPC watch stream: reconnecting server-sent-event subscription to a relay
//! topic.
mod backoff;
mod client;
mod endpoint;
mod payload;
mod sse;
mod subscription;
mod types;

pub use backoff::Backoff;
pub use client::{ChannelSink, EventSink, SseClient, StreamSettings};
pub use endpoint::{Endpoint, DEFAULT_SERVER};
pub use payload::interpret;
pub use sse::{SseDecoder, SseFrame};
pub use subscription::{StopHandle, Subscription};
pub use types::{ConnectionState, RawMessage, StreamError, StreamEvent};
