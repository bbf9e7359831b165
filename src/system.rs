use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use crate::codec;
use crate::engine::{folder_name, BookingAuthority, EngineError, Hotel};
use crate::limits::*;
use crate::model::*;

/// Every hotel of one data directory plus the booking-number authority they
/// share. Hotels are keyed by folder name; a `DashMap` shard lock is held for
/// the whole check-then-occupy sequence of a reservation.
#[derive(Debug)]
pub struct BookingSystem {
    hotels: DashMap<String, Hotel>,
    authority: BookingAuthority,
    data_dir: PathBuf,
}

impl BookingSystem {
    /// An empty system that will save into `data_dir`.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            hotels: DashMap::new(),
            authority: BookingAuthority::new(),
            data_dir,
        }
    }

    /// Load every hotel folder (a sub-directory holding a roster file) under
    /// `data_dir`. A missing directory yields an empty system.
    pub fn load_all(data_dir: PathBuf) -> Result<Self, EngineError> {
        let started = Instant::now();
        let system = Self::new(data_dir);

        let entries = match std::fs::read_dir(&system.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(system),
            Err(e) => return Err(e.into()),
        };

        let mut folders = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.join(codec::ROSTER_FILE).is_file() {
                folders.push(path);
            }
        }
        folders.sort();

        for folder in folders {
            let hotel = codec::load_hotel(&folder, &system.authority)?;
            system.insert_hotel(hotel, |_| Ok(()))?;
        }

        metrics::gauge!(crate::observability::HOTELS_LOADED).set(system.hotels.len() as f64);
        metrics::histogram!(crate::observability::LOAD_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        info!(
            hotels = system.hotels.len(),
            booking_numbers = system.authority.len(),
            data_dir = %system.data_dir.display(),
            "booking system loaded"
        );
        Ok(system)
    }

    /// Write every hotel back to the data directory.
    pub fn save_all(&self) -> Result<(), EngineError> {
        let started = Instant::now();
        std::fs::create_dir_all(&self.data_dir)?;
        for entry in self.hotels.iter() {
            codec::save_hotel(entry.value(), &self.data_dir)?;
        }
        metrics::histogram!(crate::observability::SAVE_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        info!(hotels = self.hotels.len(), "booking system saved");
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn authority(&self) -> &BookingAuthority {
        &self.authority
    }

    /// Add a hotel. Booking numbers of any reservations it already carries
    /// are registered with the shared authority.
    pub fn add_hotel(&self, hotel: Hotel) -> Result<(), EngineError> {
        let authority = &self.authority;
        self.insert_hotel(hotel, |h| {
            h.reservations()
                .try_for_each(|r| authority.claim(r.booking_number()))
        })
    }

    /// `before_insert` runs while the hotel's slot is reserved, so a second
    /// hotel with the same folder name can never slip in between.
    fn insert_hotel(
        &self,
        hotel: Hotel,
        before_insert: impl FnOnce(&Hotel) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        if self.hotels.len() >= MAX_HOTELS {
            return Err(EngineError::LimitExceeded("too many hotels"));
        }
        match self.hotels.entry(hotel.folder_name()) {
            Entry::Occupied(_) => {
                return Err(EngineError::InvalidInput(format!(
                    "hotel {:?} already exists",
                    hotel.name()
                )));
            }
            Entry::Vacant(slot) => {
                before_insert(&hotel)?;
                slot.insert(hotel);
            }
        }
        metrics::gauge!(crate::observability::HOTELS_LOADED).set(self.hotels.len() as f64);
        Ok(())
    }

    /// Display names, sorted.
    pub fn hotel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hotels.iter().map(|e| e.value().name().to_string()).collect();
        names.sort();
        names
    }

    /// Run `f` against a hotel given by display name or folder name.
    pub fn with_hotel<T>(&self, hotel: &str, f: impl FnOnce(&Hotel) -> T) -> Result<T, EngineError> {
        let entry = self
            .hotels
            .get(&folder_name(hotel))
            .ok_or_else(|| EngineError::UnknownHotel(hotel.to_string()))?;
        Ok(f(entry.value()))
    }

    fn with_hotel_mut<T>(&self, hotel: &str, f: impl FnOnce(&mut Hotel) -> T) -> Result<T, EngineError> {
        let mut entry = self
            .hotels
            .get_mut(&folder_name(hotel))
            .ok_or_else(|| EngineError::UnknownHotel(hotel.to_string()))?;
        Ok(f(entry.value_mut()))
    }

    pub fn list_hotel_types(&self, hotel: &str) -> Result<Vec<RoomType>, EngineError> {
        self.with_hotel(hotel, Hotel::available_room_types)
    }

    pub fn open_season(&self, hotel: &str, year: i32) -> Result<usize, EngineError> {
        self.with_hotel_mut(hotel, |h| h.open_season(year))
    }

    /// Open every year that `[check_in, check_out)` has a night in. Only
    /// occupied months are persisted, so a freshly loaded hotel needs this
    /// before it can take a booking in a month it has no file for.
    pub fn open_stay(&self, hotel: &str, check_in: NaiveDate, check_out: NaiveDate) -> Result<usize, EngineError> {
        let stay = Stay::new(check_in, check_out)?;
        let last_night = stay.check_out.pred_opt().unwrap_or(stay.check_in);
        let (first, last) = (stay.check_in.year(), last_night.year());
        if (last - first) as usize >= MAX_STAY_YEARS {
            return Err(EngineError::LimitExceeded("stay spans too many years"));
        }
        self.with_hotel_mut(hotel, |h| (first..=last).map(|year| h.open_season(year)).sum())
    }

    pub fn make_reservation(
        &self,
        hotel: &str,
        guest: &str,
        room_type: RoomType,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<BookingNumber, EngineError> {
        let authority = &self.authority;
        self.with_hotel_mut(hotel, |h| {
            h.make_reservation(guest, room_type, check_in, check_out, authority)
        })?
    }

    /// Cancel in whichever hotel holds the number. `None` if no hotel does.
    pub fn cancel_reservation(&self, number: BookingNumber) -> Option<(String, Reservation)> {
        for mut entry in self.hotels.iter_mut() {
            if let Some(reservation) = entry.value_mut().cancel_reservation(number) {
                return Some((entry.value().name().to_string(), reservation));
            }
        }
        None
    }

    /// The reservation and the display name of its hotel.
    pub fn get_reservation(&self, number: BookingNumber) -> Result<(String, Reservation), EngineError> {
        self.hotels
            .iter()
            .find_map(|entry| {
                let hotel = entry.value();
                hotel
                    .get_reservation(number)
                    .ok()
                    .map(|r| (hotel.name().to_string(), r.clone()))
            })
            .ok_or(EngineError::NotFound(number))
    }

    /// Best-effort total over every hotel; unknown numbers add nothing.
    pub fn get_receipt(&self, numbers: &[BookingNumber]) -> f64 {
        self.hotels
            .iter()
            .map(|entry| entry.value().get_receipt(numbers))
            .sum()
    }

    pub fn find_reservation(
        &self,
        hotel: &str,
        guest: &str,
        room_num: u32,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Option<Reservation>, EngineError> {
        self.with_hotel(hotel, |h| {
            h.find_reservation(guest, room_num, check_in, check_out).cloned()
        })
    }

    pub fn reservation_count(&self) -> usize {
        self.hotels.iter().map(|e| e.value().reservation_count()).sum()
    }
}
