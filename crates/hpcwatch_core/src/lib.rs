//! HPC watch core: job message classification, bounded history and the pure
//! presentation state machine.
mod classify;
mod effect;
mod history;
mod msg;
mod state;
mod update;
mod view_model;

pub use classify::{category_of, classify, classify_at, extract_job_id, Category, ClassifiedEvent};
pub use effect::{Effect, Expiry, Notification, Urgency, AUTO_DISMISS};
pub use history::{HistoryLog, HistoryRow, DEFAULT_HISTORY_CAPACITY};
pub use msg::Msg;
pub use state::{AggregateStatus, AppState, LinkState, TrayIcon};
pub use update::update;
pub use view_model::{AppViewModel, EMPTY_HISTORY_PLACEHOLDER};
