//! Plain-text session view.

use std::fmt::Write;

use carvote_client::carvote_types::Car;
use carvote_engine::SessionPhase;

pub const COMMAND_HELP: &str = "Commands: [h]ot, [n]ot, [r]estart, [q]uit";

/// Render the session as a block of text, one line per fact.
pub fn render_view(phase: &SessionPhase, vote_pending: bool) -> String {
    let mut out = String::new();
    match phase {
        SessionPhase::Loading { previous: None } => {
            out.push_str("Loading a car...\n");
        }
        SessionPhase::Loading {
            previous: Some(car),
        } => {
            let _ = writeln!(out, "Loading the next car (you just rated the {car})...");
        }
        SessionPhase::Displaying { car } => {
            write_car(&mut out, car);
            if vote_pending {
                out.push_str("Recording your vote...\n");
            } else {
                let _ = writeln!(out, "Hot or not? {COMMAND_HELP}");
            }
        }
        SessionPhase::ShowingResult { car, result } => {
            let _ = writeln!(out, "{car}");
            let _ = writeln!(
                out,
                "{} hot after {} {}",
                result.hot_percentage,
                result.total_votes,
                votes_noun(result.total_votes)
            );
            let _ = writeln!(out, "{}", result.message);
        }
        SessionPhase::Failed { failure, last_car } => {
            if let Some(car) = last_car {
                let _ = writeln!(out, "Last car: {car}");
            }
            let _ = writeln!(out, "{}", failure.user_message());
            let _ = writeln!(out, "{} Type 'r' to restart or 'q' to quit.", failure.restart_hint());
        }
    }
    out
}

fn write_car(out: &mut String, car: &Car) {
    let _ = writeln!(out, "{car}");
    if car.image_url.trim().is_empty() {
        out.push_str("[no image]\n");
    } else {
        let _ = writeln!(out, "Image: {}", car.image_url);
    }
    if car.tally.has_votes() {
        let _ = writeln!(
            out,
            "Current score: {} hot ({} {})",
            car.tally.hot_percentage,
            car.tally.total_votes,
            votes_noun(car.tally.total_votes)
        );
    } else {
        out.push_str("No votes yet. Be the first!\n");
    }
}

fn votes_noun(count: u64) -> &'static str {
    if count == 1 { "vote" } else { "votes" }
}
