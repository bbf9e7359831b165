use chrono::NaiveDate;

use crate::model::{BookingNumber, RoomType};

#[derive(Debug)]
pub enum EngineError {
    InvalidInput(String),
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    NightUnavailable(NaiveDate),
    RoomUnavailable(u32),
    NoRoomAvailable(RoomType),
    InvalidBookingNumber(String),
    DuplicateBookingNumber(BookingNumber),
    NotFound(BookingNumber),
    UnknownHotel(String),
    LimitExceeded(&'static str),
    Storage(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EngineError::InvalidRange {
                check_in,
                check_out,
            } => {
                write!(
                    f,
                    "check-in {check_in} is not strictly before check-out {check_out}"
                )
            }
            EngineError::NightUnavailable(date) => write!(f, "night of {date} is not available"),
            EngineError::RoomUnavailable(num) => {
                write!(f, "room {num} is not available for the requested dates")
            }
            EngineError::NoRoomAvailable(room_type) => {
                write!(f, "no {room_type} room is available for the requested dates")
            }
            EngineError::InvalidBookingNumber(raw) => {
                write!(f, "booking number must be exactly 13 digits: {raw:?}")
            }
            EngineError::DuplicateBookingNumber(num) => {
                write!(f, "booking number {num} is already issued")
            }
            EngineError::NotFound(num) => write!(f, "no reservation with booking number {num}"),
            EngineError::UnknownHotel(name) => write!(f, "unknown hotel: {name}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Storage(e.to_string())
    }
}
