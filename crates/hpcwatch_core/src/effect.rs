use std::time::Duration;

use crate::{Category, HistoryRow, TrayIcon};

/// How long non-failure notifications stay on screen.
pub const AUTO_DISMISS: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Recolor the tray icon and refresh its tooltip.
    UpdateTray { icon: TrayIcon, tooltip: String },
    /// Show a desktop notification.
    Notify(Notification),
    /// Present the current history, newest first.
    ShowHistory(Vec<HistoryRow>),
    /// Stop the subscription and leave the main loop.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    After(Duration),
    /// Stays visible until the user dismisses it.
    Persistent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
    pub expiry: Expiry,
    pub category: Category,
}

impl Notification {
    pub fn for_event(category: Category, job_id: Option<&str>, body: &str) -> Self {
        let base = match category {
            Category::Started => "Job Started",
            Category::Finished => "Job Finished",
            Category::Failed => "Job Failed!",
            Category::Unknown => "HPC Update",
        };
        let title = match job_id {
            Some(id) => format!("{base} (#{id})"),
            None => base.to_string(),
        };
        let (urgency, expiry) = match category {
            Category::Failed => (Urgency::Critical, Expiry::Persistent),
            Category::Started | Category::Finished | Category::Unknown => {
                (Urgency::Normal, Expiry::After(AUTO_DISMISS))
            }
        };
        Self {
            title,
            body: body.to_string(),
            urgency,
            expiry,
            category,
        }
    }

    pub fn auto_dismiss(&self) -> bool {
        matches!(self.expiry, Expiry::After(_))
    }
}
