//! Client for the car rating backend.
//!
//! # Architecture
//!
//! - [`CarBackend`] - the three operations the session consumes, as a trait so
//!   the engine can run against the HTTP client or an in-memory double
//! - [`ApiClient`] - stateless reqwest implementation; every call is independent
//!
//! # Endpoints
//!
//! | Operation | Request | Notable failure |
//! |-----------|---------|-----------------|
//! | [`CarBackend::initialize`] | `POST {base}/cars/initialize` | [`ApiError::AlreadyInitialized`] |
//! | [`CarBackend::random_car`] | `GET {base}/cars/random` | [`ApiError::StoreEmpty`] |
//! | [`CarBackend::submit_vote`] | `POST {base}/cars/{id}/vote` | any |
//!
//! # Error Handling
//!
//! The two recoverable conditions are decided structurally: a `404` from the
//! random endpoint is [`ApiError::StoreEmpty`]; a `409`, or a `200` carrying
//! `"initialized": false`, from the initialize endpoint is
//! [`ApiError::AlreadyInitialized`]. Nothing here retries; in particular a
//! vote is sent exactly once per call.

mod error;
mod wire;

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

pub use carvote_config::BackendUrl;
pub use carvote_types;
pub use error::{ApiError, Operation};

use carvote_types::{Car, CarId, VoteChoice, VoteResult};
use wire::{CarResponse, InitResponse, VoteRequest, VoteResponse, error_detail};

const CONNECT_TIMEOUT_SECS: u64 = 5;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 4;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Acknowledgement of a successful store initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitAck {
    pub message: String,
    /// Number of cars seeded, when the backend reports it.
    pub car_count: Option<u64>,
}

/// Backend operations consumed by a rating session.
pub trait CarBackend: Send + Sync + 'static {
    /// Seed the store with sample cars.
    fn initialize(&self) -> impl Future<Output = Result<InitAck, ApiError>> + Send;

    /// Fetch one car at random. Consecutive calls may return the same car.
    fn random_car(&self) -> impl Future<Output = Result<Car, ApiError>> + Send;

    /// Record one vote and return the backend's updated aggregate.
    fn submit_vote(
        &self,
        car_id: &CarId,
        choice: VoteChoice,
    ) -> impl Future<Output = Result<VoteResult, ApiError>> + Send;
}

fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
        .user_agent(concat!("carvote/", env!("CARGO_PKG_VERSION")))
}

/// HTTP implementation of [`CarBackend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: BackendUrl,
}

impl ApiClient {
    pub fn new(base: BackendUrl, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = client_builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }
}

impl CarBackend for ApiClient {
    async fn initialize(&self) -> Result<InitAck, ApiError> {
        let operation = Operation::Initialize;
        let url = self.base.endpoint(&["cars", "initialize"]);
        tracing::debug!(%url, "Requesting store initialization");

        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(ApiError::transport(operation))?;

        if response.status() == StatusCode::CONFLICT {
            let message = error_detail(&read_capped_error_body(response).await);
            return Err(ApiError::AlreadyInitialized { message });
        }

        let body: InitResponse = decode(response, operation).await?;
        if !body.initialized {
            return Err(ApiError::AlreadyInitialized {
                message: body.message,
            });
        }

        Ok(InitAck {
            message: body.message,
            car_count: body.car_count,
        })
    }

    async fn random_car(&self) -> Result<Car, ApiError> {
        let operation = Operation::RandomCar;
        let url = self.base.endpoint(&["cars", "random"]);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ApiError::transport(operation))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::StoreEmpty);
        }

        let car: CarResponse = decode(response, operation).await?;
        Ok(car.into())
    }

    async fn submit_vote(&self, car_id: &CarId, choice: VoteChoice) -> Result<VoteResult, ApiError> {
        let operation = Operation::SubmitVote;
        let url = self.base.endpoint(&["cars", car_id.as_str(), "vote"]);
        tracing::debug!(%car_id, %choice, "Submitting vote");

        let response = self
            .http
            .post(url)
            .json(&VoteRequest {
                car_id,
                vote_type: choice,
            })
            .send()
            .await
            .map_err(ApiError::transport(operation))?;

        let body: VoteResponse = decode(response, operation).await?;
        if !body.success {
            return Err(ApiError::invalid(
                operation,
                format!("backend did not confirm the vote: {}", body.message),
            ));
        }

        Ok(body.into_result())
    }
}

async fn decode<T>(response: Response, operation: Operation) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = read_capped_error_body(response).await;
        return Err(ApiError::Status {
            operation,
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(ApiError::transport(operation))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::invalid(operation, e.to_string()))
}

pub(crate) async fn read_capped_error_body(response: Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
