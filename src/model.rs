use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::engine::{Calendar, EngineError};

/// 13-digit booking identifier, unique across every hotel in a running system.
pub type BookingNumber = u64;

pub const MIN_BOOKING_NUMBER: BookingNumber = 1_000_000_000_000;
pub const MAX_BOOKING_NUMBER: BookingNumber = 9_999_999_999_999;

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ── Gregorian helpers ────────────────────────────────────────────

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-based). Zero for a month outside 1..=12.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn month_abbreviation(month: u32) -> Option<&'static str> {
    MONTH_ABBREVIATIONS.get(month.checked_sub(1)? as usize).copied()
}

pub fn month_from_abbreviation(abbrev: &str) -> Option<u32> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == abbrev)
        .map(|i| i as u32 + 1)
}

// ── Stay ─────────────────────────────────────────────────────────

/// Half-open night range `[check_in, check_out)`. The check-out day is
/// neither occupied nor billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, EngineError> {
        if check_in >= check_out {
            return Err(EngineError::InvalidRange { check_in, check_out });
        }
        Ok(Self { check_in, check_out })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Every occupied night, check-in first.
    pub fn iter_nights(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.check_out;
        self.check_in.iter_days().take_while(move |d| *d < end)
    }

    /// True if at least one night of the stay falls in the given month.
    pub fn touches_month(&self, year: i32, month: u32) -> bool {
        let last_night = self.check_out.pred_opt().unwrap_or(self.check_out);
        let first = (self.check_in.year(), self.check_in.month());
        let last = (last_night.year(), last_night.month());
        first <= (year, month) && (year, month) <= last
    }
}

// ── Rooms ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RoomType {
    Twin,
    Double,
    Queen,
    King,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [RoomType::Twin, RoomType::Double, RoomType::Queen, RoomType::King];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Twin => "Twin",
            RoomType::Double => "Double",
            RoomType::Queen => "Queen",
            RoomType::King => "King",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RoomType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown room type: {wanted:?}")))
    }
}

/// The immutable part of a room: what a reservation remembers about it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoomSummary {
    pub room_type: RoomType,
    pub room_num: u32,
    pub price: f64,
}

impl fmt::Display for RoomSummary {
    /// Roster line form, e.g. `Room 237,Twin,99.99`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Room {},{},{}", self.room_num, self.room_type, format_price(self.price))
    }
}

/// Plain decimal, never exponent form, with at least one fractional digit:
/// `80.0`, `99.99`, `0.00001`.
pub fn format_price(price: f64) -> String {
    let mut out = price.to_string();
    if !out.contains('.') {
        out.push_str(".0");
    }
    out
}

#[derive(Debug, Clone)]
pub struct Room {
    pub room_type: RoomType,
    pub room_num: u32,
    /// Price per night.
    pub price: f64,
    pub calendar: Calendar,
}

impl Room {
    pub fn new(room_type: RoomType, room_num: i64, price: f64) -> Result<Self, EngineError> {
        if room_num <= 0 {
            return Err(EngineError::InvalidInput(format!(
                "room number must be positive, got {room_num}"
            )));
        }
        let room_num = u32::try_from(room_num)
            .map_err(|_| EngineError::InvalidInput(format!("room number too large: {room_num}")))?;
        if !price.is_finite() || price < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "price must be a non-negative number, got {price}"
            )));
        }
        Ok(Self {
            room_type,
            room_num,
            price,
            calendar: Calendar::new(),
        })
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_type: self.room_type,
            room_num: self.room_num,
            price: self.price,
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.summary(), f)
    }
}

// ── Reservations ─────────────────────────────────────────────────

/// A booking of one room for a stay. Only `Reservation::create` builds one,
/// and building it is what marks the nights occupied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservation {
    pub(crate) booking_number: BookingNumber,
    pub(crate) name: String,
    pub(crate) room: RoomSummary,
    pub(crate) stay: Stay,
}

impl Reservation {
    pub fn booking_number(&self) -> BookingNumber {
        self.booking_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room(&self) -> &RoomSummary {
        &self.room
    }

    pub fn room_num(&self) -> u32 {
        self.room.room_num
    }

    pub fn stay(&self) -> Stay {
        self.stay
    }

    pub fn check_in(&self) -> NaiveDate {
        self.stay.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.stay.check_out
    }

    /// Whole nights times the room's nightly price.
    pub fn cost(&self) -> f64 {
        self.stay.nights() as f64 * self.room.price
    }
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Booking number: {}", self.booking_number)?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Room reserved: {}", self.room)?;
        writeln!(f, "Check-in date: {}", self.stay.check_in)?;
        write!(f, "Check-out date: {}", self.stay.check_out)
    }
}
