use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::sse::SseFrame;
use crate::RawMessage;

/// Relay event types that carry no job message.
const CONTROL_EVENTS: &[&str] = &["open", "keepalive", "poll_request"];

/// JSON envelope the relay wraps each published message in.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Extracts the message carried by `frame`, or `None` for heartbeats,
/// control events and empty frames.
pub fn interpret(frame: &SseFrame, received_at: DateTime<Local>) -> Option<RawMessage> {
    if let Some(event) = frame.event.as_deref() {
        if CONTROL_EVENTS.contains(&event) {
            return None;
        }
    }
    let data = frame.data.trim();
    if data.is_empty() {
        return None;
    }

    let (text, title) = match serde_json::from_str::<Envelope>(data) {
        Ok(envelope) => {
            if envelope.event != "message" {
                return None;
            }
            let text = envelope
                .message
                .map(|message| message.trim().to_string())
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "(no message)".to_string());
            let title = envelope
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty());
            (text, title)
        }
        Err(_) => (data.to_string(), None),
    };

    Some(RawMessage {
        text,
        title,
        received_at,
    })
}
