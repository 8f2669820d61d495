mod bookings;
pub mod clients;
pub mod config;
mod error;
mod rate_limit;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Json, Path, Query, State};
use axum::http::{header, HeaderName, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use companion_agents::{BookingSession, Collaborators, CompanionAgent, MoodSummary};
use companion_core::{
    mood, BookingItem, BookingSnapshot, ChatInput, ChatReply, Flight, Hotel, Intent, MoodAnswers,
    MoodRecord, MoodResult, PassengerDetails, PaymentOrder, MOOD_QUESTIONS,
};
use companion_observability::{AppMetrics, MetricsSnapshot};
use companion_storage::Store;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::bookings::BookingRegistry;
use crate::clients::{ChatCompletionsLlm, HttpHotelCatalog, HttpPaymentGateway};
pub use crate::config::ApiConfig;
pub use crate::error::ApiError;
use crate::rate_limit::ClientRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<CompanionAgent<Store>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub store_backend: &'static str,
    allowed_origins: Arc<Vec<String>>,
    limiter: ClientRateLimiter,
    bookings: BookingRegistry,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    store: &'static str,
    open_bookings: usize,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct QuestionsResponse {
    questions: Vec<&'static str>,
    min: u8,
    max: u8,
    default_answers: MoodAnswers,
}

#[derive(Debug, Deserialize)]
struct MoodCheckRequest {
    uid: Option<String>,
    answers: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct MoodCheckResponse {
    #[serde(flatten)]
    result: MoodResult,
    emoji: &'static str,
}

#[derive(Debug, Deserialize)]
struct UidQuery {
    uid: String,
}

#[derive(Debug, Serialize)]
struct LatestMoodResponse {
    latest: Option<MoodSummary>,
    quote: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    text: String,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IntentRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct IntentResponse {
    intent: Intent,
    parameter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlightQuery {
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HotelQuery {
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentOrderRequest {
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct OpenBookingRequest {
    item: BookingItem,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    id: String,
    #[serde(flatten)]
    snapshot: BookingSnapshot,
}

pub async fn build_app(config: ApiConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();

    let store = match config.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };
    let store_backend = store.backend_name();

    let http_client = Client::builder()
        .connect_timeout(std::time::Duration::from_secs(6))
        .timeout(config.http_timeout)
        .build()
        .context("failed to build HTTP client")?;
    let collaborators = build_collaborators(&config, &http_client);

    let agent = Arc::new(
        CompanionAgent::new(Arc::new(store), collaborators, metrics.clone())
            .with_booking_tick(config.booking_tick),
    );

    let state = ApiState {
        agent,
        metrics,
        api_key: config.api_key.clone(),
        store_backend,
        allowed_origins: Arc::new(config.allowed_origins.clone()),
        limiter: ClientRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        bookings: BookingRegistry::new(config.max_open_bookings, config.booking_idle_ttl),
    };

    info!(
        store = store_backend,
        remote_hotels = config.hotels_base_url.is_some(),
        remote_payments = config.payment_base_url.is_some(),
        remote_llm = config.llm.is_some(),
        "companion api configured"
    );

    Ok(build_router(state))
}

fn build_collaborators(config: &ApiConfig, http_client: &Client) -> Collaborators {
    let mut collaborators = Collaborators::offline();

    if let Some(base_url) = config.hotels_base_url.as_deref() {
        collaborators.hotels = Arc::new(HttpHotelCatalog::new(http_client.clone(), base_url));
    }
    if let Some(base_url) = config.payment_base_url.as_deref() {
        collaborators.payments = Arc::new(HttpPaymentGateway::new(http_client.clone(), base_url));
    }
    if let Some(llm) = config.llm.clone() {
        collaborators.llm = Arc::new(ChatCompletionsLlm::new(http_client.clone(), llm));
    }

    collaborators
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/mood/questions", get(mood_questions))
        .route("/v1/mood/check", post(mood_check))
        .route("/v1/mood/latest", get(mood_latest))
        .route("/v1/mood/history", get(mood_history))
        .route("/v1/chat", post(chat))
        .route("/v1/intent", post(classify))
        .route("/v1/travel/flights", get(search_flights))
        .route("/v1/travel/hotels", get(list_hotels))
        .route("/v1/payment/create-order", post(create_payment_order))
        .route("/v1/bookings", post(open_booking))
        .route("/v1/bookings/:id", get(get_booking))
        .route("/v1/bookings/:id/passenger", post(update_passenger))
        .route("/v1/bookings/:id/process", post(process_booking))
        .route("/v1/bookings/:id/close", post(close_booking))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(32 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-api-key")])
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        store: state.store_backend,
        open_bookings: state.bookings.len(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn mood_questions() -> Json<QuestionsResponse> {
    Json(QuestionsResponse {
        questions: MOOD_QUESTIONS.to_vec(),
        min: mood::MIN_ANSWER,
        max: mood::MAX_ANSWER,
        default_answers: MoodAnswers::default(),
    })
}

async fn mood_check(
    State(state): State<ApiState>,
    Json(request): Json<MoodCheckRequest>,
) -> Result<Json<MoodCheckResponse>, ApiError> {
    let answers = MoodAnswers::from_slice(&request.answers)?;
    let result = state
        .agent
        .submit_mood_check(request.uid.as_deref(), answers)
        .await;

    Ok(Json(MoodCheckResponse {
        emoji: mood::mood_emoji(result.label.as_str()),
        result,
    }))
}

async fn mood_latest(
    State(state): State<ApiState>,
    Query(query): Query<UidQuery>,
) -> Result<Json<LatestMoodResponse>, ApiError> {
    let latest = state.agent.latest_mood(query.uid.trim()).await?;
    let seed = chrono::Utc::now().timestamp() as usize / 86_400;

    Ok(Json(LatestMoodResponse {
        latest,
        quote: mood::daily_quote(seed),
    }))
}

async fn mood_history(
    State(state): State<ApiState>,
    Query(query): Query<UidQuery>,
) -> Result<Json<Vec<MoodRecord>>, ApiError> {
    Ok(Json(state.agent.mood_history(query.uid.trim()).await?))
}

async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state
        .agent
        .handle_chat(ChatInput {
            text: request.text,
            user_id: request.user_id,
        })
        .await?;
    Ok(Json(reply))
}

async fn classify(Json(request): Json<IntentRequest>) -> Json<IntentResponse> {
    let text = companion_core::normalize_text(&request.text);
    let (intent, route) = companion_core::route_message(&text);
    Json(IntentResponse {
        intent,
        parameter: route.parameter().map(ToString::to_string),
    })
}

async fn search_flights(
    State(state): State<ApiState>,
    Query(query): Query<FlightQuery>,
) -> Result<Json<Vec<Flight>>, ApiError> {
    let flights = state
        .agent
        .search_flights(&query.from, &query.to, query.date.as_deref())
        .await?;
    Ok(Json(flights))
}

async fn list_hotels(
    State(state): State<ApiState>,
    Query(query): Query<HotelQuery>,
) -> Result<Json<Vec<Hotel>>, ApiError> {
    Ok(Json(state.agent.fetch_hotels(query.city.as_deref()).await?))
}

async fn create_payment_order(
    State(state): State<ApiState>,
    Json(request): Json<PaymentOrderRequest>,
) -> Result<Json<PaymentOrder>, ApiError> {
    Ok(Json(state.agent.create_payment_order(request.amount).await?))
}

async fn open_booking(
    State(state): State<ApiState>,
    Json(request): Json<OpenBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let session = state.agent.new_booking_session();
    let id = session.id().to_string();
    state.bookings.insert(session.clone()).map_err(|full| {
        ApiError::Unavailable(format!(
            "too many open bookings (limit {}), try again later",
            full.capacity
        ))
    })?;

    let snapshot = match session.open(request.item) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            state.bookings.remove(&id);
            return Err(err.into());
        }
    };

    Ok((StatusCode::CREATED, Json(BookingResponse { id, snapshot })))
}

async fn get_booking(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let session = find_booking(&state, &id)?;
    Ok(Json(BookingResponse {
        snapshot: session.snapshot(),
        id,
    }))
}

async fn update_passenger(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(details): Json<PassengerDetails>,
) -> Result<Json<BookingResponse>, ApiError> {
    let session = find_booking(&state, &id)?;
    let snapshot = session.update_passenger(details)?;
    Ok(Json(BookingResponse { id, snapshot }))
}

async fn process_booking(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let session = find_booking(&state, &id)?;
    let snapshot = session.process()?;
    Ok(Json(BookingResponse { id, snapshot }))
}

async fn close_booking(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let session = state
        .bookings
        .remove(&id)
        .ok_or_else(|| ApiError::NotFound(format!("booking {} not found", id)))?;
    let snapshot = session.close();
    Ok(Json(BookingResponse { id, snapshot }))
}

fn find_booking(state: &ApiState, id: &str) -> Result<BookingSession, ApiError> {
    state
        .bookings
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("booking {} not found", id)))
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health")
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if header_key != state.api_key {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "unauthorized",
                "message": "missing or invalid x-api-key"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if !state.limiter.allow(&ip) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "rate_limited",
                "message": "rate limit exceeded for this IP"
            })),
        )
            .into_response();
    }

    next.run(request).await
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}
