use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::limits::*;
use crate::model::*;

use super::{BookingAuthority, EngineError};

/// Separates the booking number from the guest name in an occupancy cell.
pub const SHORT_FORM_SEPARATOR: &str = "--";

/// One day of one room as read from an occupancy file. `text` is empty for a
/// free night and a short form for an occupied one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightCell {
    pub date: NaiveDate,
    pub text: String,
}

pub(crate) fn validate_guest_name(name: &str) -> Result<(), EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::InvalidInput("guest name must not be empty".into()));
    }
    if name.len() > MAX_GUEST_NAME_LEN {
        return Err(EngineError::LimitExceeded("guest name too long"));
    }
    if name.contains([',', '\n', '\r']) {
        return Err(EngineError::InvalidInput(format!(
            "guest name may not contain commas or line breaks: {name:?}"
        )));
    }
    Ok(())
}

impl Reservation {
    /// Book `room` for `stay`. All-or-nothing: every check runs before the
    /// first night is occupied.
    pub fn create(
        name: &str,
        room: &mut Room,
        stay: Stay,
        explicit_number: Option<BookingNumber>,
        authority: &BookingAuthority,
    ) -> Result<Self, EngineError> {
        validate_guest_name(name)?;
        if !room.calendar.is_stay_free(&stay) {
            return Err(EngineError::RoomUnavailable(room.room_num));
        }

        let booking_number = match explicit_number {
            Some(number) => {
                authority.claim(number)?;
                number
            }
            None => authority.issue(),
        };

        for night in stay.iter_nights() {
            if let Err(e) = room.calendar.occupy(night) {
                panic!(
                    "room {}: night {night} passed the range check but could not be occupied: {e}",
                    room.room_num
                );
            }
        }

        Ok(Self {
            booking_number,
            name: name.to_string(),
            room: room.summary(),
            stay,
        })
    }

    /// `"<booking_number>--<name>"`
    pub fn to_short_form(&self) -> String {
        format!("{}{SHORT_FORM_SEPARATOR}{}", self.booking_number, self.name)
    }

    /// Rebuild a reservation from its short form, re-occupying its nights.
    pub fn from_short_form(
        text: &str,
        stay: Stay,
        room: &mut Room,
        authority: &BookingAuthority,
    ) -> Result<Self, EngineError> {
        let (number, name) = parse_short_form(text)?;
        Self::create(name, room, stay, Some(number), authority)
    }
}

/// Split a short form on the first separator into booking number and name.
pub fn parse_short_form(text: &str) -> Result<(BookingNumber, &str), EngineError> {
    let (number, name) = text.split_once(SHORT_FORM_SEPARATOR).ok_or_else(|| {
        EngineError::InvalidInput(format!("malformed reservation cell: {text:?}"))
    })?;
    let number = number
        .parse::<BookingNumber>()
        .map_err(|_| EngineError::InvalidBookingNumber(number.to_string()))?;
    Ok((number, name))
}

struct CellGroup<'a> {
    text: &'a str,
    first_night: NaiveDate,
    last_night: NaiveDate,
}

/// Rebuild the reservations of one room from its stored night cells.
///
/// Cells are grouped by booking number; each group becomes one stay from its
/// earliest night to the night after its latest. A booking whose cells have
/// gaps is restored as the outer bounding stay.
pub fn group_rows_into_reservations(
    room: &mut Room,
    cells: &[NightCell],
    authority: &BookingAuthority,
) -> Result<Vec<Reservation>, EngineError> {
    let mut groups: BTreeMap<BookingNumber, CellGroup<'_>> = BTreeMap::new();
    for cell in cells.iter().filter(|c| !c.text.is_empty()) {
        let (number, _) = parse_short_form(&cell.text)?;
        groups
            .entry(number)
            .and_modify(|g| {
                g.first_night = g.first_night.min(cell.date);
                g.last_night = g.last_night.max(cell.date);
            })
            .or_insert(CellGroup {
                text: &cell.text,
                first_night: cell.date,
                last_night: cell.date,
            });
    }

    let mut ordered: Vec<CellGroup<'_>> = groups.into_values().collect();
    ordered.sort_by_key(|g| g.first_night);

    let mut reservations = Vec::with_capacity(ordered.len());
    for group in ordered {
        let check_out = group
            .last_night
            .succ_opt()
            .ok_or(EngineError::LimitExceeded("date out of range"))?;
        let stay = Stay::new(group.first_night, check_out)?;
        reservations.push(Reservation::from_short_form(group.text, stay, room, authority)?);
    }
    Ok(reservations)
}
