//! JSON shapes exchanged with the backend.

use serde::{Deserialize, Serialize};

use carvote_types::{Car, CarId, HotPercentage, VoteChoice, VoteResult, VoteTally};

#[derive(Debug, Deserialize)]
pub(crate) struct CarResponse {
    id: CarId,
    make: String,
    model: String,
    year: i32,
    image_url: String,
    #[serde(default)]
    hot_votes: u64,
    #[serde(default)]
    not_votes: u64,
    #[serde(default)]
    total_votes: u64,
    #[serde(default)]
    hot_percentage: HotPercentage,
}

impl From<CarResponse> for Car {
    fn from(raw: CarResponse) -> Self {
        Car {
            id: raw.id,
            make: raw.make,
            model: raw.model,
            year: raw.year,
            image_url: raw.image_url,
            tally: VoteTally {
                hot_votes: raw.hot_votes,
                not_votes: raw.not_votes,
                total_votes: raw.total_votes,
                hot_percentage: raw.hot_percentage,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VoteRequest<'a> {
    pub(crate) car_id: &'a CarId,
    pub(crate) vote_type: VoteChoice,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoteResponse {
    pub(crate) success: bool,
    pub(crate) car: CarResponse,
    pub(crate) message: String,
}

impl VoteResponse {
    pub(crate) fn into_result(self) -> VoteResult {
        let car = Car::from(self.car);
        VoteResult {
            car_id: car.id,
            hot_percentage: car.tally.hot_percentage,
            total_votes: car.tally.total_votes,
            message: self.message,
            tally: car.tally,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InitResponse {
    pub(crate) message: String,
    /// Absent on backends that only report success; treated as seeded.
    #[serde(default = "seeded_by_default")]
    pub(crate) initialized: bool,
    pub(crate) car_count: Option<u64>,
}

const fn seeded_by_default() -> bool {
    true
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Pull a readable detail out of an error body, falling back to the raw text.
pub(crate) fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(text),
        }) => text,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
