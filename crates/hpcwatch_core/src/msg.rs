use chrono::{DateTime, Local};

use crate::LinkState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A data-bearing message arrived from the relay.
    MessageReceived {
        text: String,
        title: Option<String>,
        received_at: DateTime<Local>,
    },
    /// The stream client changed connection state.
    ConnectionChanged(LinkState),
    /// User asked to put the tray icon back to idle.
    ResetIconRequested,
    /// User asked to clear the history list.
    ClearHistoryRequested,
    /// User asked to see the history list.
    HistoryRequested,
    /// Shutdown was requested (menu, stdin or signal).
    QuitRequested,
    /// Fallback for unrecognised input.
    NoOp,
}
