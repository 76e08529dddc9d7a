use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;

/// Lifecycle category of a job message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Started,
    Finished,
    Failed,
    Unknown,
}

impl Category {
    /// Glyph used in front of history rows.
    pub fn badge(self) -> &'static str {
        match self {
            Category::Started => "🔵",
            Category::Finished => "🟢",
            Category::Failed => "🔴",
            Category::Unknown => "⚪",
        }
    }
}

/// Marker table, tested in order. Failed markers take precedence over
/// Finished, which take precedence over Started.
const MARKERS: &[(&str, Category)] = &[
    ("❌", Category::Failed),
    ("💥", Category::Failed),
    ("Failed", Category::Failed),
    ("FAILED", Category::Failed),
    ("Crashed", Category::Failed),
    ("Error", Category::Failed),
    ("Killed", Category::Failed),
    ("Timeout", Category::Failed),
    ("Aborted", Category::Failed),
    ("✅", Category::Finished),
    ("Finished", Category::Finished),
    ("Completed", Category::Finished),
    ("Done", Category::Finished),
    ("Success", Category::Finished),
    ("🚀", Category::Started),
    ("Started", Category::Started),
    ("Running", Category::Started),
    ("Launched", Category::Started),
    ("Queued", Category::Started),
    ("Beginning", Category::Started),
];

const SUMMARY_CHARS: usize = 60;

static JOB_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bjob\s+#?(\d[\w.\-]*)",
        r"(?i)\bjob_?id\s*[=:]\s*(\d[\w.\-]*)",
        r"(?i)\bslurm[_\s]job[_\s]id\s*[=:]\s*(\d[\w.\-]*)",
        r"#(\d{4,})",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// A message after classification. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub category: Category,
    pub job_id: Option<String>,
    pub text: String,
    pub received_at: DateTime<Local>,
}

impl ClassifiedEvent {
    /// Shortened text for one-line displays such as the history list.
    pub fn summary(&self) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(SUMMARY_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Classifies `raw_text`, stamping it with the current local time.
pub fn classify(raw_text: &str) -> ClassifiedEvent {
    classify_at(raw_text, None, Local::now())
}

/// Classifies `raw_text` received at `received_at`.
///
/// Never fails: text without a known marker becomes [`Category::Unknown`]
/// with the text kept as received. When the body carries no job id the
/// optional relay `title` is searched as well.
pub fn classify_at(
    raw_text: &str,
    title: Option<&str>,
    received_at: DateTime<Local>,
) -> ClassifiedEvent {
    let text = raw_text.trim();
    let job_id = extract_job_id(text).or_else(|| title.and_then(extract_job_id));
    ClassifiedEvent {
        category: category_of(text),
        job_id,
        text: text.to_string(),
        received_at,
    }
}

/// Returns the category of the first marker the trimmed text starts with.
pub fn category_of(text: &str) -> Category {
    let text = text.trim_start();
    MARKERS
        .iter()
        .find(|(marker, _)| text.starts_with(marker))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Unknown)
}

/// Finds a job identifier such as `Job 12345` or `job_id=12345`.
pub fn extract_job_id(text: &str) -> Option<String> {
    JOB_ID_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches(['.', '-']).to_string())
    })
}
