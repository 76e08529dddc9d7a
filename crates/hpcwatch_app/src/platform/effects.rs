use std::io;
use std::ops::ControlFlow;
use std::sync::mpsc;
use std::thread;

use hpcwatch_core::{Effect, LinkState, Msg};
use hpcwatch_logging::{hpc_debug, hpc_error};
use hpcwatch_stream::{ConnectionState, StreamEvent, Subscription};

use super::presenter::{Presenter, PresenterError};

/// Applies effects to a presenter, in order. Presenter failures are logged
/// and never stop the pipeline.
pub struct EffectRunner<P: Presenter> {
    presenter: P,
}

impl<P: Presenter> EffectRunner<P> {
    pub fn new(presenter: P) -> Self {
        Self { presenter }
    }

    /// Returns `Break` once a shutdown effect has been seen.
    pub fn apply(&mut self, effects: Vec<Effect>) -> ControlFlow<()> {
        let mut flow = ControlFlow::Continue(());
        for effect in effects {
            match effect {
                Effect::UpdateTray { icon, tooltip } => {
                    report("tray update", self.presenter.update_tray(icon, &tooltip));
                }
                Effect::Notify(notification) => {
                    hpc_debug!("Notify '{}'", notification.title);
                    report("notification", self.presenter.notify(&notification));
                }
                Effect::ShowHistory(rows) => {
                    report("history display", self.presenter.show_history(&rows));
                }
                Effect::Shutdown => flow = ControlFlow::Break(()),
            }
        }
        flow
    }

    #[cfg(test)]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}

fn report(what: &str, result: Result<(), PresenterError>) {
    if let Err(err) = result {
        hpc_error!("{} failed: {}", what, err);
    }
}

/// Moves stream events onto the message channel until the subscription
/// ends or the receiver goes away. The subscription is dropped (and its
/// worker joined) on this thread.
pub fn spawn_stream_forwarder(
    subscription: Subscription,
    msg_tx: mpsc::Sender<Msg>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("hpcwatch-forward".to_string())
        .spawn(move || {
            for event in subscription {
                if msg_tx.send(map_event(event)).is_err() {
                    break;
                }
            }
        })
}

fn map_event(event: StreamEvent) -> Msg {
    match event {
        StreamEvent::State(state) => Msg::ConnectionChanged(map_state(state)),
        StreamEvent::Message(message) => Msg::MessageReceived {
            text: message.text,
            title: message.title,
            received_at: message.received_at,
        },
    }
}

fn map_state(state: ConnectionState) -> LinkState {
    match state {
        ConnectionState::Disconnected => LinkState::Disconnected,
        ConnectionState::Connecting => LinkState::Connecting,
        ConnectionState::Connected => LinkState::Connected,
    }
}
