//! Vote submission.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use carvote_client::{ApiError, CarBackend};
use carvote_types::{CarId, VoteChoice, VoteResult};

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("failed to record vote for car {car_id}: {source}")]
    Recording {
        car_id: CarId,
        #[source]
        source: ApiError,
    },
    /// The backend answered for a different car than the one voted on.
    #[error("vote for car {requested} returned result for car {returned}")]
    Mismatch { requested: CarId, returned: CarId },
}

/// Submits one vote and hands back the backend's aggregate unmodified.
///
/// Votes are never retried: a lost vote surfaces as an error instead of
/// risking a double count.
#[derive(Debug)]
pub struct VoteRecorder<B> {
    backend: Arc<B>,
}

impl<B: CarBackend> VoteRecorder<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn submit(
        &self,
        car_id: CarId,
        choice: VoteChoice,
    ) -> impl Future<Output = Result<VoteResult, VoteError>> + Send + 'static + use<B> {
        let backend = Arc::clone(&self.backend);
        async move {
            let result = backend
                .submit_vote(&car_id, choice)
                .await
                .map_err(|source| VoteError::Recording {
                    car_id: car_id.clone(),
                    source,
                })?;

            if result.car_id != car_id {
                return Err(VoteError::Mismatch {
                    requested: car_id,
                    returned: result.car_id,
                });
            }

            tracing::info!(
                car_id = %car_id,
                choice = choice.as_str(),
                hot_percentage = %result.hot_percentage,
                total_votes = result.total_votes,
                "Vote recorded"
            );
            Ok(result)
        }
    }
}
