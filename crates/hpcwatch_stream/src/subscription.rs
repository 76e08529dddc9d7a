use std::thread;

use hpcwatch_logging::hpc_error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::{ChannelSink, SseClient, StreamSettings};
use crate::{Endpoint, StreamError, StreamEvent};

/// Stops a running [`Subscription`] from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle(CancellationToken);

impl StopHandle {
    pub fn stop(&self) {
        self.0.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// A live relay subscription running on its own worker thread.
///
/// Iterating blocks until the next event. The sequence only ends after
/// [`Subscription::shutdown`] or a [`StopHandle::stop`]; dropping the
/// subscription stops the worker and waits for it, so no reconnect happens
/// after teardown.
pub struct Subscription {
    event_rx: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl Subscription {
    /// Starts a fresh subscription. Fails only if the client or its runtime
    /// cannot be built; connection problems are retried in the background.
    pub fn start(endpoint: &Endpoint, settings: StreamSettings) -> Result<Self, StreamError> {
        let capacity = settings.channel_capacity.max(1);
        let client = SseClient::new(endpoint, settings)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| StreamError::Runtime(err.to_string()))?;

        let (event_tx, event_rx) = mpsc::channel(capacity);
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let worker = thread::Builder::new()
            .name("hpcwatch-stream".to_string())
            .spawn(move || {
                let sink = ChannelSink::new(event_tx);
                runtime.block_on(client.run(&sink, &worker_cancel));
            })
            .map_err(|err| StreamError::Runtime(err.to_string()))?;

        Ok(Self {
            event_rx,
            cancel,
            worker: Some(worker),
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.cancel.clone())
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Blocks until the next event; `None` once the worker has stopped.
    ///
    /// Must not be called from inside an async runtime.
    pub fn recv(&mut self) -> Option<StreamEvent> {
        self.event_rx.blocking_recv()
    }
}

impl Iterator for Subscription {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        self.recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
        // Wakes a worker blocked on a full channel.
        self.event_rx.close();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                hpc_error!("Stream worker panicked");
            }
        }
    }
}
