//! Line commands on stdin, standing in for the tray menu.

use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use hpcwatch_core::Msg;
use hpcwatch_logging::{hpc_debug, hpc_warn};

pub const HELP: &str = "commands: history (h), clear (c), reset (r), quit (q)";

pub fn parse_command(line: &str) -> Option<Msg> {
    match line.trim().to_ascii_lowercase().as_str() {
        "h" | "history" => Some(Msg::HistoryRequested),
        "c" | "clear" => Some(Msg::ClearHistoryRequested),
        "r" | "reset" => Some(Msg::ResetIconRequested),
        "q" | "quit" | "exit" => Some(Msg::QuitRequested),
        "" => Some(Msg::NoOp),
        _ => None,
    }
}

/// Reads commands until stdin closes. End of input does not quit, so the
/// monitor keeps running when started without a terminal.
pub fn spawn_command_reader(msg_tx: mpsc::Sender<Msg>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("hpcwatch-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                match parse_command(&line) {
                    Some(msg) => {
                        if msg_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    None => hpc_warn!("Unknown command {:?}; {}", line.trim(), HELP),
                }
            }
            hpc_debug!("stdin closed; command reader finished");
        })
}
