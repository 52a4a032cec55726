//! Vote choices and backend-computed vote results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CarId, VoteTally};

/// The user's binary verdict on a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Hot,
    Not,
}

impl VoteChoice {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("invalid vote '{0}'; expected 'hot' or 'not'")]
pub struct VoteChoiceParseError(String);

impl FromStr for VoteChoice {
    type Err = VoteChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" | "h" => Ok(Self::Hot),
            "not" | "n" => Ok(Self::Not),
            _ => Err(VoteChoiceParseError(s.to_string())),
        }
    }
}

/// Share of hot votes, in percent.
///
/// Rounding is owned by the backend; construction only rejects values that
/// cannot be a percentage.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct HotPercentage(f64);

#[derive(Debug, Error, PartialEq)]
#[error("hot percentage must be within 0..=100 (got {0})")]
pub struct HotPercentageError(f64);

impl HotPercentage {
    pub fn new(value: f64) -> Result<Self, HotPercentageError> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(HotPercentageError(value))
        }
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for HotPercentage {
    type Error = HotPercentageError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HotPercentage> for f64 {
    fn from(value: HotPercentage) -> Self {
        value.0
    }
}

impl fmt::Display for HotPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{:.0}%", self.0)
        } else {
            write!(f, "{:.1}%", self.0)
        }
    }
}

/// Aggregate returned by the backend after a vote. Authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteResult {
    pub car_id: CarId,
    pub hot_percentage: HotPercentage,
    pub total_votes: u64,
    pub message: String,
    /// Full counters after this vote was applied.
    pub tally: VoteTally,
}
