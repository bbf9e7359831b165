use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::model::*;

use super::{EngineError, Hotel, YearMonth};

impl Hotel {
    /// Best-effort total: unknown booking numbers contribute nothing.
    pub fn get_receipt(&self, numbers: &[BookingNumber]) -> f64 {
        numbers
            .iter()
            .filter_map(|n| self.reservations.get(n))
            .map(Reservation::cost)
            .sum()
    }

    pub fn get_reservation(&self, number: BookingNumber) -> Result<&Reservation, EngineError> {
        self.reservations
            .get(&number)
            .ok_or(EngineError::NotFound(number))
    }

    /// Distinct room types in roster order of first appearance.
    pub fn available_room_types(&self) -> Vec<RoomType> {
        let mut types = Vec::new();
        for room in &self.rooms {
            if !types.contains(&room.room_type) {
                types.push(room.room_type);
            }
        }
        types
    }

    /// Look a reservation up by its details, for guests who lost their
    /// booking number. The guest name matches case-insensitively.
    pub fn find_reservation(
        &self,
        guest: &str,
        room_num: u32,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Option<&Reservation> {
        self.reservations.values().find(|r| {
            r.room_num() == room_num
                && r.check_in() == check_in
                && r.check_out() == check_out
                && r.name().to_lowercase() == guest.to_lowercase()
        })
    }

    /// Months in which any room has at least one occupied night.
    pub fn occupied_months(&self) -> BTreeSet<YearMonth> {
        self.rooms
            .iter()
            .flat_map(|room| {
                room.calendar
                    .months()
                    .filter(move |&(y, m)| room.calendar.has_occupancy(y, m))
            })
            .collect()
    }

    /// Reservations with at least one night in the given month.
    pub fn reservations_in_month(&self, year: i32, month: u32) -> impl Iterator<Item = &Reservation> {
        self.reservations
            .values()
            .filter(move |r| r.stay().touches_month(year, month))
    }
}
