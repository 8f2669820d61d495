use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use companion_api::{build_app, ApiConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const API_KEY: &str = "dev-companion-key";

async fn app() -> Router {
    build_app(ApiConfig::default())
        .await
        .expect("app should build")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, parsed)
}

fn hotel_item() -> Value {
    json!({
        "type": "hotel",
        "data": {
            "id": "1",
            "name": "Taj Hotel",
            "location": "Mumbai",
            "price": 8500,
            "rating": 4.8
        }
    })
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn routes_require_api_key() {
    let app = app().await;

    let request = Request::builder()
        .uri("/v1/mood/questions")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn mood_check_scores_and_persists() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post(
            "/v1/mood/check",
            json!({"uid": "student-7", "answers": [1, 2, 1, 2, 1, 2]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "stressed");
    assert_eq!(body["score"], 1.5);
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 4);

    let (status, body) = send(&app, get("/v1/mood/latest?uid=student-7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latest"]["record"]["moodLabel"], "stressed");
    assert!(body["quote"].as_str().is_some());
}

#[tokio::test]
async fn mood_check_rejects_bad_answers() {
    let app = app().await;

    let (status, _) = send(&app, post("/v1/mood/check", json!({"answers": [3, 3, 3]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post("/v1/mood/check", json!({"answers": [3, 3, 3, 3, 3, 9]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_routes_career_questions() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post(
            "/v1/chat",
            json!({"text": "I want to learn to become a doctor"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "career");
    assert_eq!(body["parameter"], "doctor");
    assert!(!body["videos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn intent_endpoint_classifies_without_side_effects() {
    let app = app().await;

    let (status, body) = send(&app, post("/v1/intent", json!({"text": "gyms near me"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "places");
    assert_eq!(body["parameter"], "gym");
}

#[tokio::test]
async fn flights_need_both_cities() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/travel/flights?from=Delhi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please enter both From and To cities");

    let (status, body) = send(&app, get("/v1/travel/flights?from=Delhi&to=Goa")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn hotels_default_to_mumbai() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/travel/hotels")).await;

    assert_eq!(status, StatusCode::OK);
    let hotels = body.as_array().unwrap();
    assert_eq!(hotels.len(), 3);
    assert!(hotels.iter().all(|hotel| hotel["location"] == "Mumbai"));
}

#[tokio::test]
async fn payment_order_is_created() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post("/v1/payment/create-order", json!({"amount": 10030})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "INR");

    let (status, _) = send(&app, post("/v1/payment/create-order", json!({"amount": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn booking_validation_and_close() {
    let app = app().await;

    let (status, body) = send(&app, post("/v1/bookings", json!({"item": hotel_item()}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["state"], "review");
    assert_eq!(body["pricing"]["taxes"], 1530);
    assert_eq!(body["pricing"]["total"], 10030);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, post(&format!("/v1/bookings/{}/process", id), json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Please fill in all required fields");

    let (status, body) = send(&app, get(&format!("/v1/bookings/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "review");

    let (status, body) = send(
        &app,
        post(
            &format!("/v1/bookings/{}/passenger", id),
            json!({"name": "Ravi", "age": "22", "email": "ravi@example.com", "phone": "9000000000"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passenger"]["gender"], "male");

    let (status, body) = send(&app, post(&format!("/v1/bookings/{}/process", id), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "processing");
    assert_eq!(body["timer"], 15);

    let (status, body) = send(&app, post(&format!("/v1/bookings/{}/close", id), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "none");

    let (status, _) = send(&app, get(&format!("/v1/bookings/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_confirms_with_boarding_pass() {
    let app = build_app(ApiConfig {
        booking_tick: Duration::from_millis(5),
        ..ApiConfig::default()
    })
    .await
    .expect("app should build");

    let (_, body) = send(&app, post("/v1/bookings", json!({"item": hotel_item()}))).await;
    let id = body["id"].as_str().unwrap().to_string();
    send(
        &app,
        post(
            &format!("/v1/bookings/{}/passenger", id),
            json!({"name": "Asha", "age": "30", "email": "asha@example.com", "phone": "9111111111"}),
        ),
    )
    .await;
    send(&app, post(&format!("/v1/bookings/{}/process", id), json!({}))).await;

    let mut confirmed = Value::Null;
    for _ in 0..200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let (_, body) = send(&app, get(&format!("/v1/bookings/{}", id))).await;
        if body["state"] == "success" {
            confirmed = body;
            break;
        }
    }

    assert_eq!(confirmed["state"], "success");
    let pass = &confirmed["boardingPass"];
    assert!(pass["gate"].as_str().unwrap().starts_with('A'));
    assert!(pass["seat"].as_str().unwrap().ends_with('F'));
}

#[tokio::test]
async fn unknown_booking_is_not_found() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/bookings/bk_missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

async fn open_hotel(app: &Router, price: u64) -> (StatusCode, Value) {
    let mut item = hotel_item();
    item["data"]["price"] = json!(price);
    send(app, post("/v1/bookings", json!({"item": item}))).await
}

fn passenger() -> Value {
    json!({"name": "Ravi", "age": "22", "email": "ravi@example.com", "phone": "9000000000"})
}

#[tokio::test]
async fn booking_price_overflowing_total_is_rejected() {
    let app = app().await;

    let (status, body) = open_hotel(&app, u64::from(u32::MAX)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["open_bookings"], 0);
}

#[tokio::test]
async fn payment_amount_above_ceiling_is_rejected() {
    let app = app().await;

    let (status, _) = send(
        &app,
        post(
            "/v1/payment/create-order",
            json!({"amount": u64::MAX / 10}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn processing_booking_rejects_reprocess_and_passenger_edits() {
    let app = app().await;

    let (_, body) = open_hotel(&app, 8500).await;
    let id = body["id"].as_str().unwrap().to_string();
    send(&app, post(&format!("/v1/bookings/{}/passenger", id), passenger())).await;
    let (status, _) = send(&app, post(&format!("/v1/bookings/{}/process", id), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post(&format!("/v1/bookings/{}/process", id), json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state");

    let (status, body) = send(
        &app,
        post(
            &format!("/v1/bookings/{}/passenger", id),
            json!({"name": "Someone Else", "age": "40", "email": "x@example.com", "phone": "1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "passenger details are frozen once processing starts"
    );

    let (_, body) = send(&app, get(&format!("/v1/bookings/{}", id))).await;
    assert_eq!(body["passenger"]["name"], "Ravi");
}

#[tokio::test]
async fn open_bookings_are_capped() {
    let app = build_app(ApiConfig {
        max_open_bookings: 1,
        ..ApiConfig::default()
    })
    .await
    .expect("app should build");

    let (status, first) = open_hotel(&app, 8500).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = open_hotel(&app, 8500).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "bookings_full");

    let id = first["id"].as_str().unwrap();
    send(&app, post(&format!("/v1/bookings/{}/close", id), json!({}))).await;

    let (status, _) = open_hotel(&app, 8500).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn idle_bookings_are_evicted_when_full() {
    let app = build_app(ApiConfig {
        max_open_bookings: 1,
        booking_idle_ttl: Duration::ZERO,
        ..ApiConfig::default()
    })
    .await
    .expect("app should build");

    let (_, first) = open_hotel(&app, 8500).await;
    let (status, _) = open_hotel(&app, 9500).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = first["id"].as_str().unwrap();
    let (status, _) = send(&app, get(&format!("/v1/bookings/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_booking_tick_still_confirms() {
    let app = build_app(ApiConfig {
        booking_tick: Duration::ZERO,
        ..ApiConfig::default()
    })
    .await
    .expect("app should build");

    let (_, body) = open_hotel(&app, 8500).await;
    let id = body["id"].as_str().unwrap().to_string();
    send(&app, post(&format!("/v1/bookings/{}/passenger", id), passenger())).await;
    send(&app, post(&format!("/v1/bookings/{}/process", id), json!({}))).await;

    let mut state = Value::Null;
    for _ in 0..200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let (_, body) = send(&app, get(&format!("/v1/bookings/{}", id))).await;
        state = body["state"].clone();
        if state == "success" {
            break;
        }
    }
    assert_eq!(state, "success");
}
