//! Line-oriented stdin input.

use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use carvote_client::carvote_types::VoteChoice;

const INPUT_CHANNEL_CAPACITY: usize = 64;

/// A parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Vote(VoteChoice),
    Restart,
    Quit,
    Help,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(choice) = trimmed.parse::<VoteChoice>() {
            return Some(Self::Vote(choice));
        }
        Some(match trimmed.to_ascii_lowercase().as_str() {
            "r" | "restart" => Self::Restart,
            "q" | "quit" | "exit" => Self::Quit,
            "?" | "help" => Self::Help,
            _ => Self::Unknown(trimmed.to_string()),
        })
    }
}

pub enum InputMsg {
    Line(String),
    /// Stdin reached end of file or failed.
    Closed,
}

/// Reads stdin lines on a dedicated thread and queues them for the tick loop.
///
/// The reader thread is detached; a read blocked on stdin must not hold up
/// runtime shutdown.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        thread::spawn(move || input_loop(&tx));
        Self { rx }
    }

    /// Next queued message, without waiting.
    pub fn try_recv(&mut self) -> Option<InputMsg> {
        match self.rx.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(InputMsg::Closed),
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        self.rx.close();
    }
}

fn input_loop(tx: &mpsc::Sender<InputMsg>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if tx.blocking_send(InputMsg::Line(line)).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
    let _ = tx.blocking_send(InputMsg::Closed);
}
