pub mod booking;
pub mod error;
pub mod intent;
pub mod models;
pub mod mood;
pub mod replies;

pub use booking::{
    airport_code, checked_total, issue_boarding_pass, price_breakdown, taxes, total, BookingController,
    BookingSnapshot, TickOutcome, COUNTDOWN_START,
};
pub use error::{BookingError, MoodError};
pub use intent::{classify_intent, detect_place_type, extract_career, extract_skill, normalize_text};
pub use models::*;
pub use mood::{compute_mood, mood_emoji, MoodAnswers, MOOD_QUESTIONS};
pub use replies::{compose_chat_reply, failure_reply, route_message, ChatRoute};
