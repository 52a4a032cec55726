//! Backend address resolution and HTTP contract checks.

use std::time::Duration;

use carvote_client::{ApiClient, ApiError, CarBackend};
use carvote_config::resolve_backend_url;
use carvote_types::{CarId, VoteChoice};
use wiremock::MockServer;

use crate::common::{car_json, mount_random_car, mount_vote};

#[tokio::test]
async fn env_address_reaches_mock_backend() {
    let server = MockServer::start().await;
    mount_random_car(&server, car_json("c-1", "Toyota", "Supra", 1994)).await;

    let raw = format!("{}/api", server.uri());
    let base = resolve_backend_url(Some(&raw), None).expect("url");
    let client = ApiClient::new(base, Duration::from_secs(5)).expect("client");

    let car = client.random_car().await.expect("car");
    assert_eq!(car.to_string(), "1994 Toyota Supra");
    assert!(!car.tally.has_votes());
}

#[tokio::test]
async fn vote_validation_error_keeps_detail() {
    let server = MockServer::start().await;
    mount_vote(
        &server,
        "c-9",
        "hot",
        wiremock::ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "detail": "Car not found"
        })),
    )
    .await;

    let base = resolve_backend_url(Some(&format!("{}/api", server.uri())), None).expect("url");
    let client = ApiClient::new(base, Duration::from_secs(5)).expect("client");
    let err = client
        .submit_vote(&CarId::new("c-9"), VoteChoice::Hot)
        .await
        .expect_err("404");

    assert!(matches!(
        err,
        ApiError::Status { status: 404, ref detail, .. } if detail == "Car not found"
    ));
}
