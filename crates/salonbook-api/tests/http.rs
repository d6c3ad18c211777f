//! End-to-end HTTP tests against the in-memory application.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use salonbook_api::middleware::rate_limit::RateLimitConfig;
use salonbook_api::{app, AppConfig, AppState};

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_raw(app, method, uri, auth, body.map(|v| v.to_string())).await
}

/// Like [`send`], with the JSON body given verbatim.
async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<String>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(text) => builder
            .header("content-type", "application/json")
            .body(Body::from(text))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

fn in_hours(h: i64) -> String {
    (Utc::now() + Duration::hours(h)).to_rfc3339()
}

struct Marketplace {
    app: Router,
    hairdresser: String,
    hairdresser_id: Uuid,
    client: String,
    salon_id: String,
}

/// A hairdresser with a validated salon in central Lisbon, and a client.
async fn marketplace() -> Marketplace {
    let app = app(AppState::in_memory());
    let hairdresser_id = Uuid::new_v4();
    let hairdresser = format!("hairdresser:{hairdresser_id}");
    let client = format!("client:{}", Uuid::new_v4());

    let (status, body) = send(
        &app,
        "POST",
        "/v1/hairdressers",
        Some(&hairdresser),
        Some(json!({
            "user_id": Uuid::new_v4(),
            "base_price": 3000,
            "location": { "latitude": 38.7139, "longitude": -9.1394 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["id"], json!(hairdresser_id));

    let (status, body) = send(
        &app,
        "POST",
        "/v1/salons",
        Some(&hairdresser),
        Some(json!({
            "name": "Corte Fino",
            "location": { "address": "Rua Augusta 100", "latitude": 38.7100, "longitude": -9.1370 },
            "photos": ["https://img.example/1.jpg"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["validated"], json!(false));
    let salon_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/v1/salons/{salon_id}/validation"),
        Some(&format!("admin:{}", Uuid::new_v4())),
        Some(json!({ "validated": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    Marketplace {
        app,
        hairdresser,
        hairdresser_id,
        client,
        salon_id,
    }
}

fn salon_booking(salon_id: &str, scheduled_time: String) -> Value {
    json!({
        "service_type": "salon",
        "hairstyle_id": Uuid::new_v4(),
        "scheduled_time": scheduled_time,
        "estimated_duration_minutes": 60,
        "client_price": 4000,
        "salon_id": salon_id
    })
}

#[tokio::test]
async fn health_and_docs_are_public() {
    let app = app(AppState::in_memory());
    let (status, _) = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn salon_booking_lifecycle() {
    let m = marketplace().await;

    let (status, body) = send(
        &m.app,
        "POST",
        "/v1/bookings",
        Some(&m.client),
        Some(salon_booking(&m.salon_id, in_hours(2))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["hairdresser_id"], json!(m.hairdresser_id));
    assert_eq!(body["service_fee"], 400);
    assert_eq!(body["location"]["address"], "Rua Augusta 100");
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &m.app,
        "POST",
        &format!("/v1/bookings/{id}/respond"),
        Some(&m.hairdresser),
        Some(json!({ "decision": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    let (status, body) = send(
        &m.app,
        "POST",
        &format!("/v1/bookings/{id}/respond"),
        Some(&m.hairdresser),
        Some(json!({ "decision": "accept" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

    for (action, expected) in [("start", "in_progress"), ("complete", "completed")] {
        let (status, body) = send(
            &m.app,
            "POST",
            &format!("/v1/bookings/{id}/{action}"),
            Some(&m.hairdresser),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{action}: {body}");
        assert_eq!(body["status"], expected);
    }

    let (status, body) = send(
        &m.app,
        "POST",
        &format!("/v1/bookings/{id}/rating"),
        Some(&m.client),
        Some(json!({ "stars": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 5);
    assert_eq!(body["transitions"].as_array().unwrap().len(), 3);

    let (status, _) = send(
        &m.app,
        "POST",
        &format!("/v1/bookings/{id}/rating"),
        Some(&m.client),
        Some(json!({ "stars": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, profile) = send(
        &m.app,
        "GET",
        &format!("/v1/hairdressers/{}", m.hairdresser_id),
        Some(&m.client),
        None,
    )
    .await;
    assert_eq!(profile["total_jobs"], 1);
    assert_eq!(profile["average_rating"], 5.0);
    assert_eq!(profile["current_job_id"], Value::Null);
}

#[tokio::test]
async fn past_schedule_is_rejected() {
    let m = marketplace().await;
    let (status, body) = send(
        &m.app,
        "POST",
        "/v1/bookings",
        Some(&m.client),
        Some(salon_booking(&m.salon_id, in_hours(-1))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unparseable_body_is_bad_request() {
    let m = marketplace().await;
    let (status, body) = send_raw(
        &m.app,
        "POST",
        "/v1/bookings",
        Some(&m.client),
        Some(r#"{"service_type": "salon","#.to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn body_outside_the_schema_is_a_validation_error() {
    let m = marketplace().await;
    let mut unknown_type = salon_booking(&m.salon_id, in_hours(2));
    unknown_type["service_type"] = json!("mobile_van");
    let (status, body) = send(&m.app, "POST", "/v1/bookings", Some(&m.client), Some(unknown_type)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &m.app,
        "POST",
        "/v1/bookings",
        Some(&m.client),
        Some(json!({ "service_type": "salon" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_path_id_is_a_json_bad_request() {
    let m = marketplace().await;
    for uri in [
        "/v1/bookings/not-a-uuid",
        "/v1/hairdressers/42",
        "/v1/salons/salon-one",
    ] {
        let (status, body) = send(&m.app, "GET", uri, Some(&m.client), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
        assert_eq!(body["error"]["code"], "BAD_REQUEST", "{uri}");
    }

    let (status, body) = send(
        &m.app,
        "POST",
        "/v1/bookings/not-a-uuid/cancel",
        Some(&m.client),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn candidates_respect_radius() {
    let m = marketplace().await;
    let near = "/v1/candidates?latitude=38.7139&longitude=-9.1394&service_type=salon&radius_km=5";
    let (status, body) = send(&m.app, "GET", near, Some(&m.client), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["kind"], "salon");
    assert_eq!(list[0]["name"], "Corte Fino");

    // Porto is ~275 km away.
    let far = "/v1/candidates?latitude=41.1579&longitude=-8.6291&service_type=salon&radius_km=5";
    let (status, body) = send(&m.app, "GET", far, Some(&m.client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let bad = "/v1/candidates?latitude=38.7&longitude=-9.1&service_type=salon&radius_km=-1";
    let (status, _) = send(&m.app, "GET", bad, Some(&m.client), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn home_booking_without_hairdressers_nearby() {
    let app = app(AppState::in_memory());
    let client = format!("client:{}", Uuid::new_v4());
    let (status, body) = send(
        &app,
        "POST",
        "/v1/bookings",
        Some(&client),
        Some(json!({
            "service_type": "home",
            "hairstyle_id": Uuid::new_v4(),
            "scheduled_time": in_hours(3),
            "estimated_duration_minutes": 45,
            "client_price": 2500,
            "location": { "address": "Av. da Liberdade 1", "latitude": 38.72, "longitude": -9.14 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NO_CANDIDATES_FOUND");
    assert_eq!(body["error"]["message"], "no hairdresser available nearby");
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller() {
    let m = marketplace().await;
    for h in [3, 5] {
        let (status, _) = send(
            &m.app,
            "POST",
            "/v1/bookings",
            Some(&m.client),
            Some(salon_booking(&m.salon_id, in_hours(h))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&m.app, "GET", "/v1/bookings?order=asc", Some(&m.client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let items = body["items"].as_array().unwrap();
    assert!(items[0]["scheduled_time"].as_str() < items[1]["scheduled_time"].as_str());

    let (_, body) = send(&m.app, "GET", "/v1/bookings", Some(&m.hairdresser), None).await;
    assert_eq!(body["total"], 2);

    let stranger = format!("client:{}", Uuid::new_v4());
    let (_, body) = send(&m.app, "GET", "/v1/bookings", Some(&stranger), None).await;
    assert_eq!(body["total"], 0);

    let other = m.client.trim_start_matches("client:");
    let (status, _) = send(
        &m.app,
        "GET",
        &format!("/v1/bookings?actor_id={other}&role=client"),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&m.app, "GET", "/v1/bookings?status=archived", Some(&m.client), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn client_cancels_with_reason() {
    let m = marketplace().await;
    let (_, body) = send(
        &m.app,
        "POST",
        "/v1/bookings",
        Some(&m.client),
        Some(salon_booking(&m.salon_id, in_hours(4))),
    )
    .await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &m.app,
        "POST",
        &format!("/v1/bookings/{id}/cancel"),
        Some(&m.client),
        Some(json!({ "reason": "running late" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancellation_reason"], "running late");
    assert!(body["cancelled_at"].is_string());

    let (status, _) = send(
        &m.app,
        "POST",
        &format!("/v1/bookings/{id}/start"),
        Some(&m.hairdresser),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn only_admins_validate_salons() {
    let m = marketplace().await;
    let (status, body) = send(
        &m.app,
        "PUT",
        &format!("/v1/salons/{}/validation", m.salon_id),
        Some(&m.hairdresser),
        Some(json!({ "validated": false })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn configured_secret_is_enforced() {
    let config = AppConfig {
        auth_token: Some("s3cret".into()),
        ..AppConfig::default()
    };
    let state = AppState::new(
        std::sync::Arc::new(salonbook_booking::MemoryRepository::new()),
        std::sync::Arc::new(salonbook_booking::TracingNotifier),
        salonbook_booking::BookingConfig::default(),
        config,
    );
    let app = app(state);
    let client = Uuid::new_v4();

    let (status, _) = send(&app, "GET", "/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/bookings", Some(&format!("client:{client}:wrong")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/bookings", Some(&format!("system:{client}:s3cret")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/bookings", Some(&format!("client:{client}:s3cret")), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rate_limit_applies_per_caller() {
    let config = AppConfig {
        auth_token: None,
        rate_limit: RateLimitConfig {
            max_requests: 2,
            window: std::time::Duration::from_secs(60),
        },
    };
    let state = AppState::new(
        std::sync::Arc::new(salonbook_booking::MemoryRepository::new()),
        std::sync::Arc::new(salonbook_booking::TracingNotifier),
        salonbook_booking::BookingConfig::default(),
        config,
    );
    let app = app(state);
    let a = format!("client:{}", Uuid::new_v4());
    let b = format!("client:{}", Uuid::new_v4());

    for _ in 0..2 {
        let (status, _) = send(&app, "GET", "/v1/bookings", Some(&a), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app, "GET", "/v1/bookings", Some(&a), None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");

    let (status, _) = send(&app, "GET", "/v1/bookings", Some(&b), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app(AppState::in_memory());
    let (status, body) = send(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/bookings/{id}/respond"].is_object());
}
