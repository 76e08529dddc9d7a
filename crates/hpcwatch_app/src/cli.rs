use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use hpcwatch_core::DEFAULT_HISTORY_CAPACITY;
use hpcwatch_stream::{StreamSettings, DEFAULT_SERVER};

use crate::platform::LogDestination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Desktop notifications via notify-send.
    NotifySend,
    /// Plain text on stdout.
    Terminal,
}

/// Watches a relay topic and turns HPC job messages into tray state and
/// desktop notifications.
#[derive(Debug, Parser)]
#[command(name = "hpc-watch", version, about)]
pub struct Cli {
    /// Secret relay topic the job wrapper publishes to.
    #[arg(short, long, env = "HPCWATCH_TOPIC")]
    pub topic: String,

    /// Relay server base URL.
    #[arg(short, long, env = "HPCWATCH_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Presentation backend.
    #[arg(long, value_enum, default_value_t = Backend::NotifySend)]
    pub backend: Backend,

    /// Number of events kept in the history list.
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY, value_parser = parse_history_size)]
    pub history_size: usize,

    /// Sound file played with every notification (needs paplay).
    #[arg(long)]
    pub sound: Option<PathBuf>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Log file used with `--log file` or `--log both`.
    #[arg(long, default_value = "hpc-watch.log")]
    pub log_file: PathBuf,

    /// First reconnect delay in seconds.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub retry_secs: u64,

    /// Upper bound for the reconnect delay in seconds.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_backoff_secs: u64,
}

impl Cli {
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            initial_backoff: Duration::from_secs(self.retry_secs),
            max_backoff: Duration::from_secs(self.max_backoff_secs.max(self.retry_secs)),
            ..StreamSettings::default()
        }
    }
}

fn parse_history_size(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("history size must be at least 1".to_string()),
        Ok(size) => Ok(size),
        Err(err) => Err(err.to_string()),
    }
}
