//! Shared test utilities and fixtures
//!
//! Mock backend routes and a tick driver for session tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use carvote_client::{ApiClient, BackendUrl};
use carvote_engine::{PhaseTag, SessionConfig, SessionController};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RANDOM_PATH: &str = "/api/cars/random";
pub const INIT_PATH: &str = "/api/cars/initialize";

pub fn base_url(server: &MockServer) -> BackendUrl {
    BackendUrl::parse(&format!("{}/api", server.uri())).expect("mock url")
}

pub fn client_for(server: &MockServer, timeout: Duration) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(base_url(server), timeout).expect("client"))
}

pub fn fast_session() -> SessionConfig {
    SessionConfig {
        advance_delay: Duration::from_millis(100),
        refetch_delay: Duration::from_millis(20),
    }
}

/// Backend `CarResponse` body.
pub fn car_json(id: &str, make: &str, model: &str, year: i32) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "make": make,
        "model": model,
        "year": year,
        "image_url": format!("https://images.example/{id}.jpg"),
        "hot_votes": 0,
        "not_votes": 0,
        "total_votes": 0,
        "hot_percentage": 0.0
    })
}

/// Serve `car` from the random endpoint for every request.
pub async fn mount_random_car(server: &MockServer, car: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(RANDOM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(car))
        .mount(server)
        .await;
}

/// Answer the next random request with the backend's empty-store 404.
///
/// Mount before any success mock so it is consulted first.
pub async fn mount_store_empty_once(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(RANDOM_PATH))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"detail": "No cars found in database"})),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
}

pub async fn mount_initialize(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(INIT_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Accept exactly one vote of `choice` for `car`, answering with `response`.
pub async fn mount_vote(
    server: &MockServer,
    car_id: &str,
    choice: &str,
    response: ResponseTemplate,
) {
    Mock::given(method("POST"))
        .and(path(format!("/api/cars/{car_id}/vote")))
        .and(body_json(
            serde_json::json!({"car_id": car_id, "vote_type": choice}),
        ))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// Tick `controller` until its phase is `tag`, yielding to the runtime in between.
pub async fn drive_to(controller: &mut SessionController<ApiClient>, tag: PhaseTag) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        controller.tick();
        if controller.phase().tag() == tag {
            return;
        }
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {tag:?}; phase = {:?}",
            controller.phase()
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
