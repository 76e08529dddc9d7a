use crate::{HistoryRow, LinkState, TrayIcon};

pub const EMPTY_HISTORY_PLACEHOLDER: &str = "No events yet, waiting for jobs...";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub topic_header: Option<String>,
    pub icon: TrayIcon,
    pub tooltip: String,
    pub link: LinkState,
    /// Newest first.
    pub history: Vec<HistoryRow>,
}

impl AppViewModel {
    /// Text lines for a dropdown-style history listing.
    pub fn history_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.history.len() + 2);
        if let Some(header) = &self.topic_header {
            lines.push(header.clone());
        }
        if self.history.is_empty() {
            lines.push(EMPTY_HISTORY_PLACEHOLDER.to_string());
        } else {
            lines.push("Recent Events:".to_string());
            lines.extend(self.history.iter().map(|row| row.label.clone()));
        }
        lines
    }
}
