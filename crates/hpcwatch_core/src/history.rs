use std::collections::VecDeque;

use crate::{Category, ClassifiedEvent};

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded, append-only log of classified events. Oldest entries are
/// evicted once the capacity is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLog {
    entries: VecDeque<ClassifiedEvent>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn push(&mut self, event: ClassifiedEvent) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in arrival order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &ClassifiedEvent> {
        self.entries.iter()
    }

    /// Entries newest first; this is the display order.
    pub fn newest_first(&self) -> impl Iterator<Item = &ClassifiedEvent> {
        self.entries.iter().rev()
    }

    pub fn rows(&self) -> Vec<HistoryRow> {
        self.newest_first().map(HistoryRow::from_event).collect()
    }
}

/// One display line of the history list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub time: String,
    pub label: String,
    pub category: Category,
    pub job_id: Option<String>,
}

impl HistoryRow {
    pub fn from_event(event: &ClassifiedEvent) -> Self {
        let time = event.received_at.format("%H:%M:%S").to_string();
        let label = format!("{} [{}] {}", event.category.badge(), time, event.summary());
        Self {
            time,
            label,
            category: event.category,
            job_id: event.job_id.clone(),
        }
    }
}
