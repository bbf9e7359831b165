use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::model::*;
use crate::observability::*;

use super::reservation::{group_rows_into_reservations, validate_guest_name, NightCell};
use super::{BookingAuthority, EngineError, Hotel, YearMonth};

impl Hotel {
    /// Provision the given months on every room, overwriting existing ones.
    pub fn provision(&mut self, year_months: &[YearMonth]) {
        for room in &mut self.rooms {
            room.calendar.provision(year_months.iter().copied());
        }
    }

    /// Make every month of `year` bookable on every room without touching
    /// months that are already provisioned. Returns the number of room-months
    /// added.
    pub fn open_season(&mut self, year: i32) -> usize {
        let added: usize = self
            .rooms
            .iter_mut()
            .map(|room| room.calendar.provision_missing((1..=12).map(|m| (year, m))))
            .sum();
        info!(hotel = %self.name, year, added, "season opened");
        added
    }

    /// Book the first room of `room_type`, in roster order, that is free for
    /// the whole stay.
    pub fn make_reservation(
        &mut self,
        guest: &str,
        room_type: RoomType,
        check_in: NaiveDate,
        check_out: NaiveDate,
        authority: &BookingAuthority,
    ) -> Result<BookingNumber, EngineError> {
        let result = self.reserve_first_free(guest, room_type, check_in, check_out, authority);
        let status = if result.is_ok() { "ok" } else { "rejected" };
        metrics::counter!(RESERVATIONS_TOTAL, "status" => status).increment(1);
        result
    }

    fn reserve_first_free(
        &mut self,
        guest: &str,
        room_type: RoomType,
        check_in: NaiveDate,
        check_out: NaiveDate,
        authority: &BookingAuthority,
    ) -> Result<BookingNumber, EngineError> {
        let stay = Stay::new(check_in, check_out)?;
        validate_guest_name(guest)?;

        let Some(room) = self
            .rooms
            .iter_mut()
            .find(|r| r.room_type == room_type && r.calendar.is_stay_free(&stay))
        else {
            debug!(hotel = %self.name, %room_type, %check_in, %check_out, "no room available");
            return Err(EngineError::NoRoomAvailable(room_type));
        };

        let reservation = Reservation::create(guest, room, stay, None, authority)?;
        let number = reservation.booking_number();
        info!(
            hotel = %self.name,
            booking_number = number,
            room = reservation.room_num(),
            %check_in,
            %check_out,
            "reservation made"
        );
        self.reservations.insert(number, reservation);
        Ok(number)
    }

    /// Free the reservation's nights and forget it. Unknown numbers are a
    /// no-op and return `None`.
    pub fn cancel_reservation(&mut self, number: BookingNumber) -> Option<Reservation> {
        let reservation = self.reservations.remove(&number)?;
        let room_num = reservation.room_num();
        match self.rooms.iter_mut().find(|r| r.room_num == room_num) {
            Some(room) => {
                for night in reservation.stay().iter_nights() {
                    room.calendar.free(night);
                }
            }
            None => warn!(
                hotel = %self.name,
                booking_number = number,
                room = room_num,
                "cancelled reservation refers to a room this hotel does not have"
            ),
        }
        info!(hotel = %self.name, booking_number = number, "reservation cancelled");
        metrics::counter!(CANCELLATIONS_TOTAL).increment(1);
        Some(reservation)
    }

    /// Rebuild one room's reservations from stored night cells. The room's
    /// calendar must already show those nights as free.
    pub(crate) fn restore_room_reservations(
        &mut self,
        room_num: u32,
        cells: &[NightCell],
        authority: &BookingAuthority,
    ) -> Result<usize, EngineError> {
        let room = self
            .room_mut(room_num)
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown room number {room_num}")))?;
        let restored = group_rows_into_reservations(room, cells, authority)?;
        let count = restored.len();
        for reservation in restored {
            self.reservations.insert(reservation.booking_number(), reservation);
        }
        Ok(count)
    }
}
