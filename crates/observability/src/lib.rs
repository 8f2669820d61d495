use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    mood_checks_total: AtomicU64,
    mood_persist_failures_total: AtomicU64,
    chats_total: AtomicU64,
    external_failures_total: AtomicU64,
    bookings_opened_total: AtomicU64,
    bookings_completed_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub mood_checks_total: u64,
    pub mood_persist_failures_total: u64,
    pub chats_total: u64,
    pub external_failures_total: u64,
    pub bookings_opened_total: u64,
    pub bookings_completed_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_mood_check(&self) {
        self.mood_checks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_mood_persist_failure(&self) {
        self.mood_persist_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_chat(&self) {
        self.chats_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_external_failure(&self) {
        self.external_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_booking_opened(&self) {
        self.bookings_opened_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_booking_completed(&self) {
        self.bookings_completed_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            mood_checks_total: self.mood_checks_total.load(Ordering::Relaxed),
            mood_persist_failures_total: self.mood_persist_failures_total.load(Ordering::Relaxed),
            chats_total: self.chats_total.load(Ordering::Relaxed),
            external_failures_total: self.external_failures_total.load(Ordering::Relaxed),
            bookings_opened_total: self.bookings_opened_total.load(Ordering::Relaxed),
            bookings_completed_total: self.bookings_completed_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,companion_api=info,companion_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
