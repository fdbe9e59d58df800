// Integration tests for `Tracker` against a mocked vendor API.

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kippy_api::KippyClient;
use kippy_core::{ConnectionState, OperatingStatus, SubscriptionStatus, Tracker, TrackerConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn setup(server: &MockServer) -> Tracker {
    let api = KippyClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    let config = TrackerConfig {
        email: "user@example.com".into(),
        password: SecretString::from("pw".to_string()),
        // Keep the background pet-list task quiet during tests.
        device_update_interval_mins: 0,
        ..TrackerConfig::default()
    };
    Tracker::with_client(config, api)
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": 0,
            "app_code": "ac",
            "app_verification_code": "vc",
        })))
        .mount(server)
        .await;
}

async fn mount_pets(server: &MockServer, pets: Value) {
    Mock::given(method("POST"))
        .and(path("/v2/GetPetKippyList.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"return": 0, "data": pets})),
        )
        .mount(server)
        .await;
}

async fn mount_map(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/v2/kippymap_action.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_activities(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/vita/get_activities_cat.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": 0,
            "data": {"activities": [{"steps": 5}], "avg": [], "health": []},
        })))
        .mount(server)
        .await;
}

fn active_pet(pet_id: i64, kippy_id: i64) -> Value {
    json!({
        "petID": pet_id,
        "kippyID": kippy_id,
        "petName": "Rex",
        "petKind": "4",
        "expired_days": -30,
        "updateFrequency": 2,
        "gpsOnDefault": 1,
    })
}

fn map_body(status: i64) -> Value {
    json!({
        "return": 0,
        "data": {
            "lat": 45.07,
            "lng": 7.68,
            "radius": 15,
            "localization_tecnology": 2,
            "operating_status": status,
            "contact_time": 1_700_000_000,
        },
    })
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_populates_store() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_pets(
        &server,
        json!([
            active_pet(1, 10),
            {"petID": 2, "kippyID": 20, "petName": "Old", "expired_days": 3},
        ]),
    )
    .await;
    mount_map(&server, map_body(1)).await;
    mount_activities(&server).await;

    let tracker = setup(&server);
    tracker.connect().await.unwrap();
    assert_eq!(*tracker.connection_state().borrow(), ConnectionState::Connected);

    // Both pets visible, expired one flagged.
    let pets = tracker.pets_snapshot();
    assert_eq!(pets.len(), 2);
    assert_eq!(pets[1].subscription, SubscriptionStatus::Expired);

    // Only the active pet was polled.
    let map = tracker.map_snapshot(1).expect("map snapshot");
    assert_eq!(map.latitude, Some(45.07));
    assert_eq!(map.operating_status, Some(OperatingStatus::Idle));
    assert!(tracker.map_snapshot(2).is_none());

    let activities = tracker.activity_snapshot(1).expect("activities");
    assert_eq!(activities.activities, Some(json!([{"steps": 5}])));
    assert!(tracker.activity_snapshot(2).is_none());

    // The expired pet's device was never contacted.
    for request in server.received_requests().await.unwrap() {
        if request.url.path() == "/v2/kippymap_action.php" {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            assert_eq!(body["kippy_id"], 10);
        }
    }

    tracker.disconnect().await;
    assert_eq!(
        *tracker.connection_state().borrow(),
        ConnectionState::Disconnected
    );
}

#[tokio::test]
async fn test_failed_login_sets_failed_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"return": 108})))
        .mount(&server)
        .await;

    let tracker = setup(&server);
    let err = tracker.connect().await.unwrap_err();
    assert!(matches!(
        err,
        kippy_core::CoreError::AuthenticationFailed { .. }
    ));
    assert_eq!(*tracker.connection_state().borrow(), ConnectionState::Failed);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_live_tracking_optimistic_transition() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_pets(&server, json!([active_pet(1, 10)])).await;
    mount_activities(&server).await;
    // The device keeps reporting idle; the command response does too.
    mount_map(&server, map_body(1)).await;

    let tracker = setup(&server);
    tracker.connect().await.unwrap();

    tracker.set_live_tracking(1, true).await.unwrap();

    // The action request carried the on-code.
    let requests = server.received_requests().await.unwrap();
    let action_body: Value = requests
        .iter()
        .filter(|r| r.url.path() == "/v2/kippymap_action.php")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .find(|b: &Value| b.get("app_action").is_some())
        .expect("live tracking request");
    assert_eq!(action_body["app_action"], 1);

    // Idle response + enable => optimistic Live until the next poll.
    let map = tracker.map_snapshot(1).unwrap();
    assert_eq!(map.operating_status, Some(OperatingStatus::Live));

    tracker.disconnect().await;
}

#[tokio::test]
async fn test_live_tracking_rejected_in_energy_saving() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_pets(&server, json!([active_pet(1, 10)])).await;
    mount_activities(&server).await;
    mount_map(&server, map_body(18)).await;

    let tracker = setup(&server);
    tracker.connect().await.unwrap();

    // Energy-saving status mirrored into the pet record.
    assert!(tracker.pets_snapshot()[0].energy_saving);

    let err = tracker.set_live_tracking(1, true).await.unwrap_err();
    assert!(matches!(err, kippy_core::CoreError::Rejected { .. }));

    tracker.disconnect().await;
}

#[tokio::test]
async fn test_update_frequency_round_trip() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_map(&server, map_body(1)).await;
    mount_activities(&server).await;

    // First list: 2h cadence; after the settings change the server
    // reports 3h.
    Mock::given(method("POST"))
        .and(path("/v2/GetPetKippyList.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": 0,
            "data": [active_pet(1, 10)],
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/GetPetKippyList.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": 0,
            "data": [{
                "petID": 1,
                "kippyID": 10,
                "expired_days": -30,
                "updateFrequency": 3,
            }],
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/kippymap_modify_settings.php"))
        .and(body_partial_json(json!({
            "modify_kippy_id": 10,
            "update_frequency": 3.0,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"return": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = setup(&server);
    tracker.connect().await.unwrap();
    assert_eq!(tracker.pets_snapshot()[0].update_frequency_hours, Some(2.0));

    tracker.set_update_frequency(1, 3.0).await.unwrap();
    // Optimistic local update, confirmed by the next list refresh.
    assert_eq!(tracker.pets_snapshot()[0].update_frequency_hours, Some(3.0));

    tracker.refresh_pets().await.unwrap();
    assert_eq!(tracker.pets_snapshot()[0].update_frequency_hours, Some(3.0));

    tracker.disconnect().await;
}

#[tokio::test]
async fn test_gps_default_round_trip() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_map(&server, map_body(1)).await;
    mount_activities(&server).await;

    // The first list uses the legacy field name; after the settings
    // change the server reports the canonical one.
    Mock::given(method("POST"))
        .and(path("/v2/GetPetKippyList.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": 0,
            "data": [{
                "petID": 1,
                "kippyID": 10,
                "expired_days": -30,
                "updateFrequency": 2,
                "enableGPSOnDefault": "false",
            }],
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/GetPetKippyList.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "return": 0,
            "data": [{
                "petID": 1,
                "kippyID": 10,
                "expired_days": -30,
                "updateFrequency": 2,
                "gpsOnDefault": 1,
            }],
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/kippymap_modify_settings.php"))
        .and(body_partial_json(json!({"modify_kippy_id": 10, "gps_on_default": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"return": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = setup(&server);
    tracker.connect().await.unwrap();
    assert!(!tracker.pets_snapshot()[0].gps_on_default);

    tracker.set_gps_on_default(1, true).await.unwrap();
    assert!(tracker.pets_snapshot()[0].gps_on_default);

    tracker.refresh_pets().await.unwrap();
    assert!(tracker.pets_snapshot()[0].gps_on_default);

    tracker.disconnect().await;
}

#[tokio::test]
async fn test_refresh_settings_validation() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_pets(&server, json!([active_pet(1, 10)])).await;
    mount_map(&server, map_body(1)).await;
    mount_activities(&server).await;

    let tracker = setup(&server);
    tracker.connect().await.unwrap();

    tracker.set_idle_refresh(1, 120).await.unwrap();
    assert_eq!(tracker.store().refresh_settings(1).idle_seconds, 120);

    let err = tracker.set_live_refresh(1, 0).await.unwrap_err();
    assert!(matches!(
        err,
        kippy_core::CoreError::ValidationFailed { .. }
    ));

    let err = tracker.set_update_frequency(1, 0.0).await.unwrap_err();
    assert!(matches!(
        err,
        kippy_core::CoreError::ValidationFailed { .. }
    ));

    tracker.disconnect().await;
}
