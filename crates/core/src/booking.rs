use std::fmt;

use chrono::{Local, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::models::{
    BoardingPass, BookingItem, BookingSelection, BookingState, ItemType, PassengerDetails,
    PriceBreakdown,
};

pub const COUNTDOWN_START: u32 = 15;
const TAX_RATE_PERCENT: u64 = 18;
const GATE_RANGE: std::ops::RangeInclusive<u32> = 1..=20;
const SEAT_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

/// 18% tax rounded half-up to the nearest whole unit.
pub fn taxes(price: u32) -> u32 {
    ((u64::from(price) * TAX_RATE_PERCENT + 50) / 100) as u32
}

/// Price plus taxes, or `None` when the sum does not fit a `u32`.
pub fn checked_total(price: u32) -> Option<u32> {
    price.checked_add(taxes(price))
}

pub fn total(price: u32) -> u32 {
    price.saturating_add(taxes(price))
}

pub fn price_breakdown(price: u32) -> PriceBreakdown {
    PriceBreakdown {
        price,
        taxes: taxes(price),
        total: total(price),
    }
}

pub fn airport_code(city: &str) -> String {
    city.trim().chars().take(3).collect::<String>().to_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "remaining")]
pub enum TickOutcome {
    Ignored,
    Counting(u32),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Countdown {
    attempt: u64,
    remaining: u32,
}

pub type StateListener = Box<dyn FnMut(BookingState, BookingState) + Send>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSnapshot {
    pub state: BookingState,
    pub selection: Option<BookingSelection>,
    pub passenger: PassengerDetails,
    pub timer: u32,
    pub pricing: Option<PriceBreakdown>,
    pub boarding_pass: Option<BoardingPass>,
}

/// Drives one purchase from item selection to boarding pass.
///
/// All transitions go through the methods below. The countdown is armed on
/// entry to `processing` and disarmed on close, so ticks delivered after a
/// close (or for an earlier attempt) never reach `success`.
pub struct BookingController {
    state: BookingState,
    selection: Option<BookingSelection>,
    passenger: PassengerDetails,
    timer: u32,
    countdown: Option<Countdown>,
    attempts: u64,
    boarding_pass: Option<BoardingPass>,
    listeners: Vec<StateListener>,
}

impl Default for BookingController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BookingController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingController")
            .field("state", &self.state)
            .field("selection", &self.selection)
            .field("passenger", &self.passenger)
            .field("timer", &self.timer)
            .field("countdown", &self.countdown)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl BookingController {
    pub fn new() -> Self {
        Self {
            state: BookingState::None,
            selection: None,
            passenger: PassengerDetails::default(),
            timer: COUNTDOWN_START,
            countdown: None,
            attempts: 0,
            boarding_pass: None,
            listeners: Vec::new(),
        }
    }

    pub fn on_state_change<F>(&mut self, listener: F)
    where
        F: FnMut(BookingState, BookingState) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> BookingState {
        self.state
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn selection(&self) -> Option<&BookingSelection> {
        self.selection.as_ref()
    }

    pub fn passenger(&self) -> &PassengerDetails {
        &self.passenger
    }

    pub fn boarding_pass(&self) -> Option<&BoardingPass> {
        self.boarding_pass.as_ref()
    }

    /// Attempt number of the armed countdown, if any.
    pub fn active_attempt(&self) -> Option<u64> {
        self.countdown.map(|countdown| countdown.attempt)
    }

    pub fn pricing(&self) -> Option<PriceBreakdown> {
        self.selection
            .as_ref()
            .map(|selection| price_breakdown(selection.price))
    }

    pub fn snapshot(&self) -> BookingSnapshot {
        BookingSnapshot {
            state: self.state,
            selection: self.selection.clone(),
            passenger: self.passenger.clone(),
            timer: self.timer,
            pricing: self.pricing(),
            boarding_pass: self.boarding_pass.clone(),
        }
    }

    pub fn open_booking(&mut self, item: BookingItem, item_type: ItemType) -> Result<(), BookingError> {
        if self.state != BookingState::None {
            return Err(BookingError::InvalidTransition {
                action: "open booking",
                state: self.state,
            });
        }

        let price = item.price();
        if checked_total(price).is_none() {
            return Err(BookingError::InvalidPrice(price));
        }

        self.selection = Some(BookingSelection {
            item_type,
            item,
            price,
        });
        self.passenger = PassengerDetails::default();
        self.boarding_pass = None;
        self.timer = COUNTDOWN_START;
        self.countdown = None;
        self.transition(BookingState::Review);
        Ok(())
    }

    pub fn update_passenger(&mut self, details: PassengerDetails) -> Result<(), BookingError> {
        match self.state {
            BookingState::Review => {
                self.passenger = details;
                Ok(())
            }
            BookingState::None => Err(BookingError::InvalidTransition {
                action: "edit passenger details",
                state: self.state,
            }),
            BookingState::Processing | BookingState::Success => Err(BookingError::PassengerFrozen),
        }
    }

    pub fn process_booking(&mut self) -> Result<(), BookingError> {
        if self.state != BookingState::Review {
            return Err(BookingError::InvalidTransition {
                action: "process booking",
                state: self.state,
            });
        }

        let missing = self.passenger.missing_required();
        if !missing.is_empty() {
            return Err(BookingError::MissingFields(missing));
        }

        self.attempts += 1;
        self.timer = COUNTDOWN_START;
        self.countdown = Some(Countdown {
            attempt: self.attempts,
            remaining: COUNTDOWN_START,
        });
        self.transition(BookingState::Processing);
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.tick_with(&mut rand::rng(), Local::now().date_naive())
    }

    /// Tick on behalf of a specific countdown. Ticks for any attempt other
    /// than the armed one are dropped.
    pub fn tick_attempt(&mut self, attempt: u64) -> TickOutcome {
        if self.active_attempt() != Some(attempt) {
            return TickOutcome::Ignored;
        }
        self.tick()
    }

    pub fn tick_with<R: Rng>(&mut self, rng: &mut R, today: NaiveDate) -> TickOutcome {
        let Some(countdown) = self.countdown.as_mut() else {
            return TickOutcome::Ignored;
        };

        countdown.remaining = countdown.remaining.saturating_sub(1);
        self.timer = countdown.remaining;
        if countdown.remaining > 0 {
            return TickOutcome::Counting(countdown.remaining);
        }

        self.countdown = None;
        self.boarding_pass = self
            .selection
            .as_ref()
            .map(|selection| issue_boarding_pass(selection, &self.passenger, today, rng));
        self.transition(BookingState::Success);
        TickOutcome::Completed
    }

    pub fn close_booking(&mut self) {
        self.countdown = None;
        self.selection = None;
        self.passenger = PassengerDetails::default();
        self.boarding_pass = None;
        self.timer = COUNTDOWN_START;
        if self.state != BookingState::None {
            self.transition(BookingState::None);
        }
    }

    fn transition(&mut self, next: BookingState) {
        let previous = self.state;
        self.state = next;
        for listener in self.listeners.iter_mut() {
            listener(previous, next);
        }
    }
}

pub fn issue_boarding_pass<R: Rng>(
    selection: &BookingSelection,
    passenger: &PassengerDetails,
    today: NaiveDate,
    rng: &mut R,
) -> BoardingPass {
    let date = passenger
        .date
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

    let mut pass = BoardingPass {
        passenger_name: passenger.name.trim().to_string(),
        date,
        gate: format!("A{}", rng.random_range(GATE_RANGE)),
        seat: format!("{}F", rng.random_range(SEAT_RANGE)),
        meal_preference: passenger.meal_preference.clone(),
        item_type: selection.item_type,
        title: selection.item.title(),
        departure: None,
        arrival: None,
        from_code: None,
        to_code: None,
    };

    if let BookingItem::Flight(flight) = &selection.item {
        pass.departure = Some(flight.departure.clone());
        pass.arrival = Some(flight.arrival.clone());
        pass.from_code = Some(airport_code(&flight.from));
        pass.to_code = Some(airport_code(&flight.to));
    }

    pass
}
