//! Full sessions against a mock backend over HTTP.

use std::time::Duration;

use carvote_engine::{FailureKind, PhaseTag, ScheduledKind, SessionController, VoteDispatch};
use carvote_types::{CarId, VoteChoice};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    INIT_PATH, RANDOM_PATH, car_json, client_for, drive_to, fast_session, mount_initialize,
    mount_random_car, mount_store_empty_once, mount_vote,
};

#[tokio::test]
async fn empty_store_is_initialized_and_first_car_displayed() {
    let server = MockServer::start().await;
    mount_store_empty_once(&server).await;
    mount_random_car(&server, car_json("c-1", "Lamborghini", "Countach", 1985)).await;
    mount_initialize(
        &server,
        200,
        serde_json::json!({
            "message": "Initialized 12 cars",
            "initialized": true,
            "car_count": 12
        }),
    )
    .await;

    let client = client_for(&server, Duration::from_secs(5));
    let mut controller = SessionController::start(client, fast_session());
    drive_to(&mut controller, PhaseTag::Displaying).await;

    assert!(controller.is_initialized());
    let car = controller.car().expect("car");
    assert_eq!(car.id, CarId::new("c-1"));
    assert_eq!(car.to_string(), "1985 Lamborghini Countach");
}

#[tokio::test]
async fn already_populated_store_is_absorbed() {
    let server = MockServer::start().await;
    mount_store_empty_once(&server).await;
    mount_random_car(&server, car_json("c-2", "BMW", "M3", 2008)).await;
    mount_initialize(
        &server,
        200,
        serde_json::json!({
            "message": "Database already has 12 cars",
            "initialized": false
        }),
    )
    .await;

    let client = client_for(&server, Duration::from_secs(5));
    let mut controller = SessionController::start(client, fast_session());
    drive_to(&mut controller, PhaseTag::Displaying).await;

    assert_eq!(controller.failure(), None);
    assert_eq!(controller.car().map(|c| c.id.as_str()), Some("c-2"));
}

#[tokio::test]
async fn init_server_error_fails_session() {
    let server = MockServer::start().await;
    mount_store_empty_once(&server).await;
    mount_initialize(
        &server,
        500,
        serde_json::json!({"detail": "Failed to initialize cars"}),
    )
    .await;

    let client = client_for(&server, Duration::from_secs(5));
    let mut controller = SessionController::start(client, fast_session());
    drive_to(&mut controller, PhaseTag::Failed).await;

    let failure = controller.failure().expect("failure");
    assert_eq!(failure.kind, FailureKind::Init);
    assert!(failure.detail.contains("Failed to initialize cars"));
}

#[tokio::test]
async fn vote_round_trip_then_advance_to_next_car() {
    let server = MockServer::start().await;
    mount_random_car(&server, car_json("c-3", "Mazda", "MX-5", 1990)).await;
    let mut voted = car_json("c-3", "Mazda", "MX-5", 1990);
    voted["hot_votes"] = 2.into();
    voted["not_votes"] = 1.into();
    voted["total_votes"] = 3.into();
    voted["hot_percentage"] = 66.7.into();
    mount_vote(
        &server,
        "c-3",
        "hot",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "car": voted,
            "message": "Vote recorded! This car is 66.7% hot."
        })),
    )
    .await;

    let client = client_for(&server, Duration::from_secs(5));
    let mut controller = SessionController::start(client, fast_session());
    drive_to(&mut controller, PhaseTag::Displaying).await;

    assert_eq!(controller.vote(VoteChoice::Hot), VoteDispatch::Submitted);
    drive_to(&mut controller, PhaseTag::ShowingResult).await;

    let result = controller.result().expect("result");
    assert_eq!(result.hot_percentage.to_string(), "66.7%");
    assert_eq!(result.total_votes, 3);
    assert_eq!(result.tally.not_votes, 1);
    assert_eq!(result.message, "Vote recorded! This car is 66.7% hot.");
    assert_eq!(
        controller.pending_task().map(|task| task.kind),
        Some(ScheduledKind::AutoAdvance)
    );

    drive_to(&mut controller, PhaseTag::Loading).await;
    drive_to(&mut controller, PhaseTag::Displaying).await;
    assert_eq!(controller.result(), None);
}

#[tokio::test]
async fn vote_timeout_fails_session_and_keeps_car() {
    let server = MockServer::start().await;
    mount_random_car(&server, car_json("c-4", "Fiat", "Multipla", 1998)).await;
    mount_vote(
        &server,
        "c-4",
        "not",
        ResponseTemplate::new(200).set_delay(Duration::from_secs(3)),
    )
    .await;

    let client = client_for(&server, Duration::from_millis(300));
    let mut controller = SessionController::start(client, fast_session());
    drive_to(&mut controller, PhaseTag::Displaying).await;

    controller.vote(VoteChoice::Not);
    drive_to(&mut controller, PhaseTag::Failed).await;

    assert_eq!(controller.failure().map(|f| f.kind), Some(FailureKind::Vote));
    assert_eq!(controller.car().map(|c| c.id.as_str()), Some("c-4"));
}

#[tokio::test]
async fn teardown_stops_all_backend_traffic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RANDOM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(car_json("c-5", "Volvo", "240", 1988))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(INIT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let mut controller = SessionController::start(client, fast_session());
    tokio::time::sleep(Duration::from_millis(20)).await;
    controller.teardown();

    tokio::time::sleep(Duration::from_millis(400)).await;
    controller.tick();
    assert_eq!(controller.phase().tag(), PhaseTag::Loading);
    assert_eq!(controller.car(), None);
}
