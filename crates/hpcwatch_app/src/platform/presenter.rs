//! Presentation backends: the only code that touches the desktop.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::thread;

use hpcwatch_core::{
    Expiry, HistoryRow, Notification, TrayIcon, Urgency, EMPTY_HISTORY_PLACEHOLDER,
};
use hpcwatch_logging::{hpc_info, hpc_warn};

const APP_NAME: &str = "HPC Job Monitor";
const NOTIFY_SEND: &str = "notify-send";
const PAPLAY: &str = "paplay";

#[derive(Debug, thiserror::Error)]
pub enum PresenterError {
    #[error("`{0}` was not found in PATH")]
    BackendMissing(&'static str),
    #[error("sound file {0:?} does not exist")]
    SoundMissing(PathBuf),
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Side-effect surface used by the effect runner.
pub trait Presenter {
    fn update_tray(&mut self, icon: TrayIcon, tooltip: &str) -> Result<(), PresenterError>;
    fn notify(&mut self, notification: &Notification) -> Result<(), PresenterError>;
    fn show_history(&mut self, rows: &[HistoryRow]) -> Result<(), PresenterError>;
}

/// Desktop notifications through libnotify's `notify-send`.
///
/// The tray surface itself lives outside this process; icon changes are
/// reported through the log.
pub struct NotifySendPresenter {
    program: PathBuf,
    sound: Option<(PathBuf, PathBuf)>,
}

impl NotifySendPresenter {
    /// Locates the tools up front so a missing backend fails at start-up.
    pub fn locate(sound: Option<PathBuf>) -> Result<Self, PresenterError> {
        let program =
            which::which(NOTIFY_SEND).map_err(|_| PresenterError::BackendMissing(NOTIFY_SEND))?;
        let sound = match sound {
            Some(file) => {
                if !file.is_file() {
                    return Err(PresenterError::SoundMissing(file));
                }
                let player =
                    which::which(PAPLAY).map_err(|_| PresenterError::BackendMissing(PAPLAY))?;
                Some((player, file))
            }
            None => None,
        };
        Ok(Self { program, sound })
    }

    fn launch(&self, program: &Path, args: &[String]) -> Result<(), PresenterError> {
        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(|source| PresenterError::Launch {
                program: program.display().to_string(),
                source,
            })?;
        reap(child, program.display().to_string());
        Ok(())
    }
}

impl Presenter for NotifySendPresenter {
    fn update_tray(&mut self, icon: TrayIcon, tooltip: &str) -> Result<(), PresenterError> {
        hpc_info!("Tray -> {} ({}): {}", icon.icon_name(), icon.color(), tooltip);
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), PresenterError> {
        self.launch(&self.program, &notify_send_args(notification))?;
        if let Some((player, file)) = &self.sound {
            self.launch(player, &[file.display().to_string()])?;
        }
        Ok(())
    }

    fn show_history(&mut self, rows: &[HistoryRow]) -> Result<(), PresenterError> {
        let body = if rows.is_empty() {
            EMPTY_HISTORY_PLACEHOLDER.to_string()
        } else {
            rows.iter()
                .map(|row| row.label.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };
        let args = vec![
            format!("--app-name={APP_NAME}"),
            "--urgency=low".to_string(),
            "--expire-time=15000".to_string(),
            "--".to_string(),
            "Recent Events".to_string(),
            body,
        ];
        self.launch(&self.program, &args)
    }
}

/// Arguments for one `notify-send` invocation.
pub fn notify_send_args(notification: &Notification) -> Vec<String> {
    let urgency = match notification.urgency {
        Urgency::Normal => "normal",
        Urgency::Critical => "critical",
    };
    // 0 means the server keeps it until dismissed.
    let expire_ms = match notification.expiry {
        Expiry::After(duration) => duration.as_millis(),
        Expiry::Persistent => 0,
    };
    let icon = match notification.urgency {
        Urgency::Critical => "dialog-error",
        Urgency::Normal => "dialog-information",
    };
    vec![
        format!("--app-name={APP_NAME}"),
        format!("--urgency={urgency}"),
        format!("--expire-time={expire_ms}"),
        format!("--icon={icon}"),
        "--".to_string(),
        notification.title.clone(),
        notification.body.clone(),
    ]
}

fn reap(mut child: Child, program: String) {
    let spawned = thread::Builder::new()
        .name("hpcwatch-reap".to_string())
        .spawn(move || match child.wait() {
            Ok(status) if !status.success() => hpc_warn!("{} exited with {}", program, status),
            Ok(_) => {}
            Err(err) => hpc_warn!("Failed to wait for {}: {}", program, err),
        });
    if let Err(err) = spawned {
        hpc_warn!("Could not spawn reaper thread: {}", err);
    }
}

/// Plain-text backend for terminals and headless hosts.
pub struct TerminalPresenter<W: Write> {
    out: W,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn update_tray(&mut self, icon: TrayIcon, tooltip: &str) -> Result<(), PresenterError> {
        writeln!(self.out, "[tray:{}] {}", icon.color(), tooltip)?;
        self.out.flush()?;
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), PresenterError> {
        let persistence = match notification.expiry {
            Expiry::After(duration) => format!("dismiss after {}s", duration.as_secs()),
            Expiry::Persistent => "until dismissed".to_string(),
        };
        let marker = match notification.urgency {
            Urgency::Critical => "!!",
            Urgency::Normal => "--",
        };
        writeln!(
            self.out,
            "{marker} {}: {} ({persistence})",
            notification.title, notification.body
        )?;
        self.out.flush()?;
        Ok(())
    }

    fn show_history(&mut self, rows: &[HistoryRow]) -> Result<(), PresenterError> {
        if rows.is_empty() {
            writeln!(self.out, "{EMPTY_HISTORY_PLACEHOLDER}")?;
        }
        for row in rows {
            writeln!(self.out, "{}", row.label)?;
        }
        self.out.flush()?;
        Ok(())
    }
}
