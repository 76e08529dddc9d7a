use crate::view_model::AppViewModel;
use crate::{Category, ClassifiedEvent, HistoryLog};

/// Tray icon state. `Idle` is the grey start-up state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrayIcon {
    #[default]
    Idle,
    Running,
    Finished,
    Failed,
}

impl TrayIcon {
    /// Icon for a category; `None` for [`Category::Unknown`], which keeps
    /// whatever icon is showing.
    pub fn for_category(category: Category) -> Option<Self> {
        match category {
            Category::Started => Some(TrayIcon::Running),
            Category::Finished => Some(TrayIcon::Finished),
            Category::Failed => Some(TrayIcon::Failed),
            Category::Unknown => None,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            TrayIcon::Idle => "grey",
            TrayIcon::Running => "blue",
            TrayIcon::Finished => "green",
            TrayIcon::Failed => "red",
        }
    }

    pub fn icon_name(self) -> &'static str {
        match self {
            TrayIcon::Idle => "hpc-idle",
            TrayIcon::Running => "hpc-started",
            TrayIcon::Finished => "hpc-finished",
            TrayIcon::Failed => "hpc-failed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrayIcon::Idle => "Idle",
            TrayIcon::Running => "Running",
            TrayIcon::Finished => "Finished",
            TrayIcon::Failed => "FAILED",
        }
    }
}

/// Connection state of the relay subscription, as far as display cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Current derived job state. `last_event` always holds the most recent
/// event; `icon` follows the most recent event with a known category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateStatus {
    pub icon: TrayIcon,
    pub last_event: Option<ClassifiedEvent>,
}

impl AggregateStatus {
    pub fn last_category(&self) -> Option<Category> {
        self.last_event.as_ref().map(|event| event.category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    topic: Option<String>,
    status: AggregateStatus,
    history: HistoryLog,
    link: LinkState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: HistoryLog::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Topic shown as the history header.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn status(&self) -> &AggregateStatus {
        &self.status
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn tooltip(&self) -> String {
        let mut tooltip = format!("HPC Job Monitor: {}", self.status.icon.label());
        if self.link != LinkState::Connected {
            tooltip.push_str(" (offline)");
        }
        tooltip
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            topic_header: self.topic.as_ref().map(|topic| format!("📡 Topic: {topic}")),
            icon: self.status.icon,
            tooltip: self.tooltip(),
            link: self.link,
            history: self.history.rows(),
        }
    }

    /// Records `event`: history first, then the aggregate status.
    pub(crate) fn record(&mut self, event: ClassifiedEvent) {
        self.history.push(event.clone());
        if let Some(icon) = TrayIcon::for_category(event.category) {
            self.status.icon = icon;
        }
        self.status.last_event = Some(event);
    }

    pub(crate) fn set_link(&mut self, link: LinkState) {
        self.link = link;
    }

    pub(crate) fn reset_icon(&mut self) {
        self.status.icon = TrayIcon::Idle;
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.clear();
    }
}
