pub mod booking;
pub mod collaborators;

use std::sync::Arc;
use std::time::{Duration, Instant};

use companion_core::{
    compose_chat_reply, compute_mood, failure_reply, mood_emoji, normalize_text, replies,
    route_message, ChatInput, ChatReply, ChatRoute, Flight, Hotel, MoodAnswers, MoodRecord,
    MoodResult, PaymentOrder,
};
use companion_observability::AppMetrics;
use companion_storage::MoodRepository;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub use booking::{BookingSession, MIN_BOOKING_TICK};
pub use collaborators::{
    hotels_from_value, Collaborators, FlightSearch, HotelCatalog, LlmClient, PaymentGateway,
    PlacesSearch, VideoSearch, DEFAULT_HOTEL_CITY,
};

pub const DEFAULT_BOOKING_TICK: Duration = Duration::from_secs(1);
/// Largest order amount accepted; matches the largest bookable total.
pub const MAX_PAYMENT_AMOUNT: u64 = u32::MAX as u64;
const MOOD_HISTORY_LIMIT: usize = 30;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    Validation(String),
    #[error("{context}")]
    External {
        context: &'static str,
        cause: anyhow::Error,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AgentError {
    fn external(context: &'static str, cause: anyhow::Error) -> Self {
        Self::External { context, cause }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoodSummary {
    pub record: MoodRecord,
    pub emoji: &'static str,
}

#[derive(Clone)]
pub struct CompanionAgent<S>
where
    S: MoodRepository,
{
    store: Arc<S>,
    collaborators: Collaborators,
    metrics: Arc<AppMetrics>,
    booking_tick: Duration,
}

impl<S> CompanionAgent<S>
where
    S: MoodRepository,
{
    pub fn new(store: Arc<S>, collaborators: Collaborators, metrics: Arc<AppMetrics>) -> Self {
        Self {
            store,
            collaborators,
            metrics,
            booking_tick: DEFAULT_BOOKING_TICK,
        }
    }

    pub fn with_booking_tick(mut self, tick: Duration) -> Self {
        self.booking_tick = tick;
        self
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    /// Scores a questionnaire and, when a user is known, appends the result
    /// to the mood history. A failed append is logged and otherwise ignored.
    #[instrument(skip(self, answers))]
    pub async fn submit_mood_check(&self, uid: Option<&str>, answers: MoodAnswers) -> MoodResult {
        self.metrics.inc_request();
        self.metrics.inc_mood_check();

        let result = compute_mood(&answers);

        if let Some(uid) = uid.map(str::trim).filter(|uid| !uid.is_empty()) {
            let record = MoodRecord {
                uid: uid.to_string(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                answers: answers.values().to_vec(),
                mood_score: result.score,
                mood_label: result.label.as_str().to_string(),
            };

            if let Err(err) = self.store.append_mood(&record).await {
                self.metrics.inc_mood_persist_failure();
                warn!(uid = %uid, error = %err, "mood entry not saved");
            }
        }

        info!(score = result.score, label = result.label.as_str(), "mood scored");
        result
    }

    pub async fn latest_mood(&self, uid: &str) -> Result<Option<MoodSummary>, AgentError> {
        let record = self.store.latest_mood(uid).await?;
        Ok(record.map(|record| MoodSummary {
            emoji: mood_emoji(&record.mood_label),
            record,
        }))
    }

    pub async fn mood_history(&self, uid: &str) -> Result<Vec<MoodRecord>, AgentError> {
        Ok(self.store.mood_history(uid, MOOD_HISTORY_LIMIT).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn handle_chat(&self, input: ChatInput) -> Result<ChatReply, AgentError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let normalized = normalize_text(&input.text);
        if normalized.is_empty() {
            return Err(AgentError::Validation("message text is empty".to_string()));
        }
        self.metrics.inc_chat();

        let (intent, route) = route_message(&normalized);
        let reply = match self.answer(&normalized, &route).await {
            Ok((reply_text, videos, places)) => {
                compose_chat_reply(intent, &route, reply_text, videos, places)
            }
            Err(err) => {
                self.metrics.inc_external_failure();
                warn!(intent = intent.as_str(), error = %err, "chat collaborator failed");
                failure_reply(intent)
            }
        };

        self.metrics.observe_latency(started.elapsed());
        info!(
            intent = intent.as_str(),
            parameter = reply.parameter.as_deref().unwrap_or(""),
            videos = reply.videos.len(),
            places = reply.places.len(),
            "chat handled"
        );

        Ok(reply)
    }

    async fn answer(
        &self,
        text: &str,
        route: &ChatRoute,
    ) -> anyhow::Result<(String, Vec<companion_core::VideoResult>, Vec<companion_core::Place>)>
    {
        match route {
            ChatRoute::NearbyPlaces { place_type } => {
                let places = self.collaborators.places.nearby(place_type).await?;
                Ok((
                    replies::places_reply(place_type, places.len()),
                    Vec::new(),
                    places,
                ))
            }
            ChatRoute::CareerVideos { career, query } => {
                let videos = self.collaborators.videos.search(query).await?;
                Ok((replies::career_reply(career), videos, Vec::new()))
            }
            ChatRoute::SkillVideos { skill, query } => {
                let videos = self.collaborators.videos.search(query).await?;
                Ok((replies::skill_reply(skill), videos, Vec::new()))
            }
            ChatRoute::ExamVideos { query } => {
                let videos = self.collaborators.videos.search(query).await?;
                Ok((replies::EXAM_REPLY.to_string(), videos, Vec::new()))
            }
            ChatRoute::Llm => {
                let text = self.collaborators.llm.complete(text).await?;
                Ok((text, Vec::new(), Vec::new()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn search_flights(
        &self,
        from: &str,
        to: &str,
        date: Option<&str>,
    ) -> Result<Vec<Flight>, AgentError> {
        self.metrics.inc_request();
        if from.trim().is_empty() || to.trim().is_empty() {
            return Err(AgentError::Validation(
                "Please enter both From and To cities".to_string(),
            ));
        }

        let date = date.map(str::trim).filter(|date| !date.is_empty());
        self.collaborators
            .flights
            .search(from.trim(), to.trim(), date)
            .await
            .map_err(|err| {
                self.metrics.inc_external_failure();
                warn!(error = %err, "flight search failed");
                AgentError::external("Failed to fetch flights. Please try again.", err)
            })
    }

    #[instrument(skip(self))]
    pub async fn fetch_hotels(&self, city: Option<&str>) -> Result<Vec<Hotel>, AgentError> {
        self.metrics.inc_request();
        let city = city
            .map(str::trim)
            .filter(|city| !city.is_empty())
            .unwrap_or(DEFAULT_HOTEL_CITY);

        self.collaborators
            .hotels
            .hotels_in(city)
            .await
            .map_err(|err| {
                self.metrics.inc_external_failure();
                warn!(city = %city, error = %err, "hotel fetch failed");
                AgentError::external("Failed to fetch hotels. Please try again.", err)
            })
    }

    #[instrument(skip(self))]
    pub async fn create_payment_order(&self, amount: u64) -> Result<PaymentOrder, AgentError> {
        self.metrics.inc_request();
        if amount == 0 {
            return Err(AgentError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if amount > MAX_PAYMENT_AMOUNT {
            return Err(AgentError::Validation(format!(
                "amount must not exceed {}",
                MAX_PAYMENT_AMOUNT
            )));
        }

        self.collaborators
            .payments
            .create_order(amount)
            .await
            .map_err(|err| {
                self.metrics.inc_external_failure();
                warn!(amount, error = %err, "payment order creation failed");
                AgentError::external("Failed to initiate payment.", err)
            })
    }

    pub fn new_booking_session(&self) -> BookingSession {
        BookingSession::new(
            format!("bk_{}", Uuid::new_v4().simple()),
            self.booking_tick,
            self.metrics.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use companion_core::{Intent, MoodLabel, Place, VideoResult};
    use companion_storage::{MemoryStore, Store};

    use super::*;

    struct FailingVideos;

    #[async_trait]
    impl VideoSearch for FailingVideos {
        async fn search(&self, _query: &str) -> Result<Vec<VideoResult>> {
            Err(anyhow!("quota exceeded"))
        }
    }

    struct FailingHotels;

    #[async_trait]
    impl HotelCatalog for FailingHotels {
        async fn hotels_in(&self, _city: &str) -> Result<Vec<Hotel>> {
            Err(anyhow!("503 from listing service"))
        }
    }

    struct CountingPlaces;

    #[async_trait]
    impl PlacesSearch for CountingPlaces {
        async fn nearby(&self, place_type: &str) -> Result<Vec<Place>> {
            Ok((0..3)
                .map(|index| Place {
                    name: format!("{} {}", place_type, index),
                    place_type: place_type.to_string(),
                    rating: Some(4.0),
                    address: "Main Road".to_string(),
                    maps_url: "https://maps.example/".to_string(),
                })
                .collect())
        }
    }

    fn agent() -> CompanionAgent<Store> {
        CompanionAgent::new(
            Arc::new(Store::memory()),
            Collaborators::offline(),
            AppMetrics::shared(),
        )
    }

    fn chat(text: &str) -> ChatInput {
        ChatInput {
            text: text.to_string(),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn mood_check_persists_for_known_user() {
        let agent = agent();
        let answers = MoodAnswers::new([5, 4, 5, 4, 5, 4]).unwrap();

        let result = agent.submit_mood_check(Some("student-1"), answers).await;
        assert_eq!(result.label, MoodLabel::Motivated);

        let latest = agent.latest_mood("student-1").await.unwrap().unwrap();
        assert_eq!(latest.record.mood_label, "motivated");
        assert_eq!(latest.record.answers, vec![5, 4, 5, 4, 5, 4]);
        assert_eq!(latest.emoji, "🔥");
        assert!(latest.record.timestamp.ends_with('Z'));
    }

    #[tokio::test]
    async fn anonymous_mood_check_is_not_persisted() {
        let store = Arc::new(MemoryStore::new());
        let agent = CompanionAgent::new(store.clone(), Collaborators::offline(), AppMetrics::shared());

        agent.submit_mood_check(None, MoodAnswers::default()).await;
        agent.submit_mood_check(Some("  "), MoodAnswers::default()).await;

        assert!(store.mood_history("", 10).await.unwrap().is_empty());
        assert_eq!(agent.metrics().snapshot().mood_checks_total, 2);
    }

    #[tokio::test]
    async fn chat_routes_places_through_collaborator() {
        let mut collaborators = Collaborators::offline();
        collaborators.places = Arc::new(CountingPlaces);
        let agent = CompanionAgent::new(Arc::new(Store::memory()), collaborators, AppMetrics::shared());

        let reply = agent.handle_chat(chat("gyms near me")).await.unwrap();
        assert_eq!(reply.intent, Intent::Places);
        assert_eq!(reply.reply_text, "Found 3 gyms near you:");
        assert_eq!(reply.places.len(), 3);
    }

    #[tokio::test]
    async fn chat_career_uses_captured_word() {
        let reply = agent()
            .handle_chat(chat("I want to learn to become a doctor"))
            .await
            .unwrap();
        assert_eq!(reply.intent, Intent::Career);
        assert_eq!(reply.parameter.as_deref(), Some("doctor"));
        assert_eq!(
            reply.reply_text,
            "Here are some great resources to become a doctor:"
        );
        assert!(!reply.videos.is_empty());
    }

    #[tokio::test]
    async fn chat_collaborator_failure_becomes_apology() {
        let mut collaborators = Collaborators::offline();
        collaborators.videos = Arc::new(FailingVideos);
        let agent = CompanionAgent::new(Arc::new(Store::memory()), collaborators, AppMetrics::shared());

        let reply = agent
            .handle_chat(chat("how to crack the CAT exam"))
            .await
            .unwrap();
        assert_eq!(reply.intent, Intent::Exam);
        assert_eq!(reply.reply_text, replies::FAILURE_REPLY);
        assert_eq!(agent.metrics().snapshot().external_failures_total, 1);
    }

    #[tokio::test]
    async fn empty_chat_is_rejected() {
        let err = agent().handle_chat(chat("   ")).await.unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[tokio::test]
    async fn flight_search_requires_both_cities() {
        let agent = agent();
        let err = agent.search_flights("Delhi", " ", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter both From and To cities");

        let flights = agent.search_flights("Delhi", "Goa", Some("")).await.unwrap();
        assert_eq!(flights.len(), 3);
    }

    #[tokio::test]
    async fn hotel_failure_is_external() {
        let mut collaborators = Collaborators::offline();
        collaborators.hotels = Arc::new(FailingHotels);
        let agent = CompanionAgent::new(Arc::new(Store::memory()), collaborators, AppMetrics::shared());

        let err = agent.fetch_hotels(None).await.unwrap_err();
        assert!(matches!(err, AgentError::External { .. }));
        assert_eq!(err.to_string(), "Failed to fetch hotels. Please try again.");
    }

    #[tokio::test]
    async fn payment_rejects_zero_amount() {
        let agent = agent();
        assert!(matches!(
            agent.create_payment_order(0).await,
            Err(AgentError::Validation(_))
        ));
        let order = agent.create_payment_order(8500).await.unwrap();
        assert_eq!(order.currency, "INR");
    }

    #[tokio::test]
    async fn payment_rejects_amount_above_ceiling() {
        let agent = agent();
        assert!(matches!(
            agent.create_payment_order(MAX_PAYMENT_AMOUNT + 1).await,
            Err(AgentError::Validation(_))
        ));
        assert!(matches!(
            agent.create_payment_order(u64::MAX / 10).await,
            Err(AgentError::Validation(_))
        ));

        let order = agent.create_payment_order(MAX_PAYMENT_AMOUNT).await.unwrap();
        assert_eq!(order.amount, MAX_PAYMENT_AMOUNT * 100);
    }
}
