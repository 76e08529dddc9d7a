use url::Url;

use crate::StreamError;

pub const DEFAULT_SERVER: &str = "https://ntfy.sh";

/// Relay server plus topic. The topic acts as a shared secret and is not
/// validated beyond being usable as a single path segment; it is always
/// appended as one percent-encoded segment, never resolved as a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    server: Url,
    topic: String,
}

impl Endpoint {
    pub fn new(server: &str, topic: &str) -> Result<Self, StreamError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(StreamError::InvalidEndpoint("topic is empty".into()));
        }
        if topic
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#'))
        {
            return Err(StreamError::InvalidEndpoint(format!(
                "topic {topic:?} must be a single path segment"
            )));
        }
        if matches!(topic, "." | "..") {
            return Err(StreamError::InvalidEndpoint(format!(
                "topic {topic:?} is a relative path"
            )));
        }

        let mut server = Url::parse(server.trim())
            .map_err(|err| StreamError::InvalidEndpoint(format!("server url: {err}")))?;
        if !matches!(server.scheme(), "http" | "https") {
            return Err(StreamError::InvalidEndpoint(format!(
                "unsupported scheme {}",
                server.scheme()
            )));
        }
        if !server.path().ends_with('/') {
            let path = format!("{}/", server.path());
            server.set_path(&path);
        }
        server.set_query(None);
        server.set_fragment(None);

        let endpoint = Self {
            server,
            topic: topic.to_string(),
        };
        endpoint.sse_url()?;
        Ok(endpoint)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn server(&self) -> &Url {
        &self.server
    }

    /// `<server>/<topic>/sse`
    pub fn sse_url(&self) -> Result<Url, StreamError> {
        let mut url = self.server.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StreamError::InvalidEndpoint(format!("{} cannot carry a path", self.server))
            })?
            .pop_if_empty()
            .push(&self.topic)
            .push("sse");
        Ok(url)
    }
}
