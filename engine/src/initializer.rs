//! Idempotent store seeding.

use std::future::Future;
use std::sync::Arc;

use carvote_client::{ApiError, CarBackend, InitAck};

/// How a successful initialization went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// The store was empty and has been seeded.
    Seeded {
        count: Option<u64>,
        message: String,
    },
    /// The store already held data; nothing was written.
    AlreadyPopulated { message: String },
}

/// Seeds the backend store on demand.
///
/// Safe to call any number of times, including concurrently: an
/// "already populated" answer from the backend is success.
#[derive(Debug)]
pub struct Initializer<B> {
    backend: Arc<B>,
}

impl<B: CarBackend> Initializer<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// The returned future owns its backend handle so it can be spawned.
    pub fn ensure_initialized(
        &self,
    ) -> impl Future<Output = Result<InitOutcome, ApiError>> + Send + 'static + use<B> {
        let backend = Arc::clone(&self.backend);
        async move {
            match backend.initialize().await {
                Ok(InitAck { message, car_count }) => {
                    tracing::info!(car_count = ?car_count, "Seeded car store");
                    Ok(InitOutcome::Seeded {
                        count: car_count,
                        message,
                    })
                }
                Err(ApiError::AlreadyInitialized { message }) => {
                    tracing::info!(%message, "Car store already populated");
                    Ok(InitOutcome::AlreadyPopulated { message })
                }
                Err(err) => Err(err),
            }
        }
    }
}
