//! Core domain types for carvote.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod car;
mod ids;
mod vote;

pub use car::{Car, VoteTally};
pub use ids::CarId;
pub use vote::{
    HotPercentage, HotPercentageError, VoteChoice, VoteChoiceParseError, VoteResult,
};
