use std::sync::Arc;
use std::time::Duration;

use companion_core::{
    BookingController, BookingError, BookingItem, BookingSnapshot, BookingState, ItemType,
    PassengerDetails, TickOutcome,
};
use companion_observability::AppMetrics;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

/// Shortest countdown period; shorter requests are raised to it.
pub const MIN_BOOKING_TICK: Duration = Duration::from_millis(1);

/// Async owner of one [`BookingController`].
///
/// While the booking is processing a single countdown task ticks the
/// controller once per `tick` period. The task is aborted when the booking is
/// closed and replaced whenever processing restarts.
#[derive(Clone)]
pub struct BookingSession {
    id: String,
    controller: Arc<Mutex<BookingController>>,
    countdown: Arc<Mutex<Option<JoinHandle<()>>>>,
    state_rx: watch::Receiver<BookingState>,
    tick: Duration,
    metrics: Arc<AppMetrics>,
}

impl BookingSession {
    pub fn new(id: impl Into<String>, tick: Duration, metrics: Arc<AppMetrics>) -> Self {
        let (state_tx, state_rx) = watch::channel(BookingState::None);
        let mut controller = BookingController::new();
        controller.on_state_change(move |_, next| {
            state_tx.send_replace(next);
        });

        Self {
            id: id.into(),
            controller: Arc::new(Mutex::new(controller)),
            countdown: Arc::new(Mutex::new(None)),
            state_rx,
            tick: tick.max(MIN_BOOKING_TICK),
            metrics,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn state(&self) -> BookingState {
        self.controller.lock().state()
    }

    pub fn snapshot(&self) -> BookingSnapshot {
        self.controller.lock().snapshot()
    }

    /// Receives every state the booking enters.
    pub fn subscribe(&self) -> watch::Receiver<BookingState> {
        self.state_rx.clone()
    }

    pub fn open(&self, item: BookingItem) -> Result<BookingSnapshot, BookingError> {
        let item_type: ItemType = item.item_type();
        let mut controller = self.controller.lock();
        controller.open_booking(item, item_type)?;
        self.metrics.inc_booking_opened();
        info!(booking_id = %self.id, item_type = ?item_type, "booking opened");
        Ok(controller.snapshot())
    }

    pub fn update_passenger(
        &self,
        details: PassengerDetails,
    ) -> Result<BookingSnapshot, BookingError> {
        let mut controller = self.controller.lock();
        controller.update_passenger(details)?;
        Ok(controller.snapshot())
    }

    pub fn process(&self) -> Result<BookingSnapshot, BookingError> {
        let (attempt, snapshot) = {
            let mut controller = self.controller.lock();
            controller.process_booking()?;
            (controller.active_attempt(), controller.snapshot())
        };

        if let Some(attempt) = attempt {
            let handle = self.spawn_countdown(attempt);
            if let Some(previous) = self.countdown.lock().replace(handle) {
                previous.abort();
            }
            info!(booking_id = %self.id, attempt, "booking processing");
        }

        Ok(snapshot)
    }

    pub fn close(&self) -> BookingSnapshot {
        if let Some(handle) = self.countdown.lock().take() {
            handle.abort();
        }

        let mut controller = self.controller.lock();
        controller.close_booking();
        info!(booking_id = %self.id, "booking closed");
        controller.snapshot()
    }

    fn spawn_countdown(&self, attempt: u64) -> JoinHandle<()> {
        let controller = self.controller.clone();
        let metrics = self.metrics.clone();
        let booking_id = self.id.clone();
        let period = self.tick;

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let outcome = controller.lock().tick_attempt(attempt);
                match outcome {
                    TickOutcome::Counting(remaining) => {
                        debug!(booking_id = %booking_id, remaining, "countdown tick");
                    }
                    TickOutcome::Completed => {
                        metrics.inc_booking_completed();
                        info!(booking_id = %booking_id, attempt, "booking confirmed");
                        break;
                    }
                    TickOutcome::Ignored => break,
                }
            }
        })
    }
}

impl Drop for BookingSession {
    fn drop(&mut self) {
        // clones share the handle; only the last one tears the task down
        if Arc::strong_count(&self.countdown) == 1 {
            if let Some(handle) = self.countdown.lock().take() {
                handle.abort();
            }
        }
    }
}
