//! Applies parsed commands to the running session.

use carvote_client::CarBackend;
use carvote_engine::{PhaseTag, SessionController, VoteDispatch};

use crate::input::Command;

/// What the driver loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Voted(VoteDispatch),
    /// The failed session was torn down and replaced by a fresh one.
    Restarted,
    /// Restart was asked for outside `Failed`; the session is untouched.
    RestartRefused,
    Quit,
    Help,
    Unknown(String),
}

/// Apply `command` to `controller`.
///
/// `restart` builds the replacement session and is only called when the
/// current one has failed.
pub fn apply_command<B, F>(
    controller: &mut SessionController<B>,
    command: Command,
    restart: F,
) -> CommandOutcome
where
    B: CarBackend,
    F: FnOnce() -> SessionController<B>,
{
    match command {
        Command::Vote(choice) => CommandOutcome::Voted(controller.vote(choice)),
        Command::Restart => {
            if controller.phase().tag() != PhaseTag::Failed {
                tracing::debug!(phase = ?controller.phase().tag(), "Restart refused");
                return CommandOutcome::RestartRefused;
            }
            tracing::info!("Restarting session");
            controller.teardown();
            *controller = restart();
            CommandOutcome::Restarted
        }
        Command::Quit => {
            controller.teardown();
            CommandOutcome::Quit
        }
        Command::Help => CommandOutcome::Help,
        Command::Unknown(raw) => CommandOutcome::Unknown(raw),
    }
}
