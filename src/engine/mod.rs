mod authority;
mod calendar;
mod error;
mod mutations;
mod queries;
mod reservation;
#[cfg(test)]
mod tests;

pub use authority::{validate_booking_number, BookingAuthority};
pub use calendar::{Calendar, YearMonth};
pub use error::EngineError;
pub use reservation::{group_rows_into_reservations, parse_short_form, NightCell, SHORT_FORM_SEPARATOR};

use std::collections::{BTreeMap, HashSet};

use crate::limits::*;
use crate::model::*;

/// One hotel: its rooms (each with a calendar) and the reservations made
/// against them. Every reservation key equals the reservation's own booking
/// number, and every reservation points at a room of this hotel.
#[derive(Debug, Clone)]
pub struct Hotel {
    name: String,
    rooms: Vec<Room>,
    reservations: BTreeMap<BookingNumber, Reservation>,
}

impl Hotel {
    pub fn new(name: impl Into<String>, rooms: Vec<Room>) -> Result<Self, EngineError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::InvalidInput("hotel name must not be empty".into()));
        }
        if name.len() > MAX_HOTEL_NAME_LEN {
            return Err(EngineError::LimitExceeded("hotel name too long"));
        }
        if name.contains(['\n', '\r', '/', '\\']) {
            return Err(EngineError::InvalidInput(format!(
                "hotel name may not contain line breaks or path separators: {name:?}"
            )));
        }
        if matches!(folder_name(&name).as_str(), "." | "..") {
            return Err(EngineError::InvalidInput(format!(
                "hotel name {name:?} does not name a folder"
            )));
        }
        if rooms.len() > MAX_ROOMS_PER_HOTEL {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        let mut seen = HashSet::with_capacity(rooms.len());
        for room in &rooms {
            if !seen.insert(room.room_num) {
                return Err(EngineError::InvalidInput(format!(
                    "room number {} appears more than once",
                    room.room_num
                )));
            }
        }
        Ok(Self {
            name,
            rooms,
            reservations: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory name this hotel persists under.
    pub fn folder_name(&self) -> String {
        folder_name(&self.name)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, room_num: u32) -> Option<&Room> {
        self.rooms.iter().find(|r| r.room_num == room_num)
    }

    pub(crate) fn room_mut(&mut self, room_num: u32) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.room_num == room_num)
    }

    /// Reservations in booking-number order.
    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    pub fn contains_reservation(&self, number: BookingNumber) -> bool {
        self.reservations.contains_key(&number)
    }
}

/// Lowercase, spaces replaced with underscores.
pub fn folder_name(hotel_name: &str) -> String {
    hotel_name.to_lowercase().replace(' ', "_")
}
