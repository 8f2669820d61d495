use thiserror::Error;

use crate::models::BookingState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoodError {
    #[error("expected {expected} answers, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("answer {index} is {value}, must be between 1 and 5")]
    OutOfRange { index: usize, value: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("cannot {action} while booking is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: BookingState,
    },
    #[error("Please fill in all required fields")]
    MissingFields(Vec<&'static str>),
    #[error("passenger details are frozen once processing starts")]
    PassengerFrozen,
    #[error("price {0} is too large to book")]
    InvalidPrice(u32),
}
