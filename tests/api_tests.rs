use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use travels_api::build_app;
use travels_api::clients::memory::{MemoryStore, RecordingNotifier};
use travels_api::clients::Notifier;
use travels_api::config::EnvironmentConfig;
use travels_api::services::booking_id::is_valid_booking_id;
use travels_api::state::AppState;
use travels_api::utils::errors::{NotifyError, StoreError};

const SUBMIT: &str = "/.netlify/functions/travels-api?action=";

fn test_config() -> EnvironmentConfig {
    EnvironmentConfig::from_lookup(|key: &str| match key {
        "GOOGLE_SERVICE_ACCOUNT_EMAIL" => Some("svc@project.iam.gserviceaccount.com".to_string()),
        "GOOGLE_PRIVATE_KEY" => Some("test-key".to_string()),
        _ => None,
    })
    .unwrap()
}

fn create_test_app(store: Arc<MemoryStore>, notifier: Option<Arc<RecordingNotifier>>) -> Router {
    let notifier = notifier.map(|n| n as Arc<dyn Notifier>);
    build_app(AppState::new(test_config(), store, notifier))
}

fn submission_tables() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_tables(&["bookings", "contacts", "careers"]))
}

fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn booking_payload() -> Value {
    json!({
        "Customer_Name": "Asha",
        "Mobile_Number": "9876543210",
        "Pickup_City": "Chennai",
        "Drop_City": "Pondicherry",
        "Vehicle_Type": "Innova",
        "Journey_Type": "One Way"
    })
}

#[tokio::test]
async fn test_submit_booking_success() {
    let store = submission_tables();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = create_test_app(store.clone(), Some(notifier.clone()));

    let (status, body) = send(
        app,
        Method::POST,
        &format!("{}submitBooking", SUBMIT),
        Some(booking_payload()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let id = body["id"].as_str().unwrap();
    assert!(is_valid_booking_id(id), "{}", id);
    assert!(id.starts_with("ST-"));

    let rows = store.rows("bookings");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Booking_ID"], id);
    assert_eq!(rows[0]["Driver_Assigned"], "Pending");
    assert_eq!(rows[0]["Email"], "N/A");
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_each_channel_writes_its_table() {
    let store = submission_tables();
    let cases = [
        ("submitContact", json!({ "Name": "Ravi", "Phone": "9876543210", "Message": "Need a cab" }), "contacts", "STC-"),
        ("submitCareer", json!({ "Full_Name": "Kumar", "Phone_Number": "9000000001", "City_Area": "Tambaram" }), "careers", "STJ-"),
        ("submitLead", json!({ "Name": "Asha", "Mobile": "9876543210", "Pickup": "Chennai" }), "bookings", "STW-"),
    ];

    for (action, payload, table, prefix) in cases {
        let app = create_test_app(store.clone(), None);
        let (status, body) = send(app, Method::POST, &format!("{}{}", SUBMIT, action), Some(payload)).await;
        assert_eq!(status, StatusCode::OK, "{}: {}", action, body);
        assert!(body["id"].as_str().unwrap().starts_with(prefix));
        assert_eq!(store.rows(table).len(), 1, "{}", table);
    }
}

#[tokio::test]
async fn test_missing_mobile_is_rejected_before_any_call() {
    let store = submission_tables();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = create_test_app(store.clone(), Some(notifier.clone()));

    let (status, body) = send(
        app,
        Method::POST,
        &format!("{}submitBooking", SUBMIT),
        Some(json!({ "Customer_Name": "Asha", "Pickup_City": "Chennai" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "Mobile number is required" }));
    assert_eq!(store.append_calls(), 0);
    assert_eq!(notifier.calls(), 0);
}

#[tokio::test]
async fn test_notifier_failure_does_not_fail_submission() {
    let store = submission_tables();
    let notifier = Arc::new(RecordingNotifier::failing(NotifyError::Transport("connection refused".into())));
    let app = create_test_app(store.clone(), Some(notifier.clone()));

    let (status, body) = send(
        app,
        Method::POST,
        &format!("{}submitBooking", SUBMIT),
        Some(booking_payload()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(store.rows("bookings").len(), 1);
    assert_eq!(notifier.calls(), 1);
}

#[tokio::test]
async fn test_persistence_failure_returns_fallback_phone() {
    let store = submission_tables();
    store.fail_next(vec![StoreError::Auth("invalid_grant".into())]);
    let app = create_test_app(store.clone(), None);

    let (status, body) = send(
        app,
        Method::POST,
        &format!("{}submitBooking", SUBMIT),
        Some(booking_payload()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("+91 888 345 1668"));
    assert!(!message.contains("invalid_grant"));
}

#[tokio::test]
async fn test_invalid_action_and_body() {
    let store = submission_tables();

    let (status, body) = send(create_test_app(store.clone(), None), Method::GET, "/api/travels?action=dropTables", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": "Invalid Action" }));

    let (status, _) = send(create_test_app(store.clone(), None), Method::GET, "/api/travels", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        create_test_app(store.clone(), None),
        Method::POST,
        &format!("{}submitBooking", SUBMIT),
        Some(json!(["not", "an", "object"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.append_calls(), 0);
}

#[tokio::test]
async fn test_options_preflight() {
    let app = create_test_app(submission_tables(), None);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(format!("{}submitBooking", SUBMIT))
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_get_tariff_falls_back_to_builtin_card() {
    // No tariff tab in the store
    let app = create_test_app(submission_tables(), None);
    let (status, body) = send(app, Method::GET, &format!("{}getTariff", SUBMIT), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["local"].as_array().unwrap().len(), 4);
    assert_eq!(body["outstation"].as_array().unwrap().len(), 4);
    assert_eq!(body["local"][0]["mode"], "local");
    assert_eq!(body["local"][0]["baseFare"], 1300.0);
}

#[tokio::test]
async fn test_get_tariff_reads_store() {
    let store = submission_tables();
    store.seed(
        "tariff",
        vec![row(&[
            ("Id", "outstation-etios"),
            ("Name", "Etios"),
            ("Mode", "Outstation"),
            ("Rate_Per_Km", "12"),
            ("Driver_Bata", "600"),
            ("Min_Km_Per_Day", "250"),
        ])],
    );
    let app = create_test_app(store, None);
    let (_, body) = send(app, Method::GET, &format!("{}getTariff", SUBMIT), None).await;

    assert!(body["local"].as_array().unwrap().is_empty());
    assert_eq!(body["outstation"][0]["id"], "outstation-etios");
}

#[tokio::test]
async fn test_estimate_fare() {
    let store = submission_tables();

    let (status, body) = send(
        create_test_app(store.clone(), None),
        Method::POST,
        &format!("{}estimateFare", SUBMIT),
        Some(json!({ "vehicleId": "local-sedan", "extraKm": 10, "extraHr": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1700.0);
    assert_eq!(body["mode"], "local");
    let quotation = body["quotation"].as_str().unwrap();
    assert!(quotation.contains("Vehicle: 4+1 Sedan"));
    assert!(quotation.contains("*Estimated Total: ₹1,700*"));
    assert!(quotation.ends_with("Call to book: +91 888 345 1668"));

    let (_, body) = send(
        create_test_app(store.clone(), None),
        Method::POST,
        &format!("{}estimateFare", SUBMIT),
        Some(json!({ "vehicleId": "outstation-sedan", "days": 1, "distanceKm": 100 })),
    )
    .await;
    assert_eq!(body["total"], 4200.0);
    assert_eq!(body["chargedKm"], 250);
    assert_eq!(body["minChargeApplied"], true);

    let (_, body) = send(
        create_test_app(store.clone(), None),
        Method::POST,
        &format!("{}estimateFare", SUBMIT),
        Some(json!({ "vehicleId": "outstation-sedan", "days": 3, "distanceKm": 0 })),
    )
    .await;
    assert_eq!(body["total"], 0.0);
    assert_eq!(body["note"], "Enter trip days and kilometers.");

    let (status, _) = send(
        create_test_app(store.clone(), None),
        Method::POST,
        &format!("{}estimateFare", SUBMIT),
        Some(json!({ "vehicleId": "helicopter" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        create_test_app(store, None),
        Method::POST,
        &format!("{}estimateFare", SUBMIT),
        Some(json!({ "vehicleId": "local-sedan", "extraKm": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_routes_shapes() {
    let store = submission_tables();
    store.seed(
        "routes",
        vec![row(&[
            ("Origin", "Chennai"),
            ("Destination", "Tirupati"),
            ("Distance", "135"),
            ("Price_Sedan", "₹3,500"),
        ])],
    );

    let (status, body) = send(create_test_app(store.clone(), None), Method::GET, &format!("{}getRoutes", SUBMIT), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["slug"], "chennai-to-tirupati");

    let (_, body) = send(create_test_app(store, None), Method::GET, &format!("{}getAllRoutes", SUBMIT), None).await;
    assert_eq!(body["routes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_routes_unavailable() {
    let app = create_test_app(submission_tables(), None);
    let (status, body) = send(app, Method::GET, &format!("{}getRoutes", SUBMIT), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_legacy_submit_booking() {
    let store = submission_tables();
    let app = create_test_app(store.clone(), None);

    let (status, body) = send(
        app,
        Method::POST,
        "/.netlify/functions/submit-booking",
        Some(json!({ "name": "Asha", "phone": "9876543210", "pickup": "Chennai", "drop": "Vellore" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Success" }));
    let rows = store.rows("bookings");
    assert_eq!(rows[0]["Drop_City"], "Vellore");
    assert_eq!(rows[0]["Vehicle_Type"], "Sedan");
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app(submission_tables(), None);
    let (status, body) = send(app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
