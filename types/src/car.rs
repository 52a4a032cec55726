//! The ratable item.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CarId, HotPercentage};

/// Vote counters as last reported by the backend.
///
/// The client never recomputes these; they are display-only snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub hot_votes: u64,
    pub not_votes: u64,
    pub total_votes: u64,
    pub hot_percentage: HotPercentage,
}

impl VoteTally {
    #[must_use]
    pub fn has_votes(&self) -> bool {
        self.total_votes > 0
    }
}

/// Immutable snapshot of a car, held for as long as it is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub make: String,
    pub model: String,
    pub year: i32,
    /// May be unreachable; renderers substitute a placeholder.
    pub image_url: String,
    #[serde(default)]
    pub tally: VoteTally,
}

impl Car {
    #[must_use]
    pub fn id(&self) -> &CarId {
        &self.id
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.year, self.make, self.model)
    }
}
