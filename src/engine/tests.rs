use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn room(room_type: RoomType, num: i64, price: f64) -> Room {
    Room::new(room_type, num, price).unwrap()
}

/// Queen 105, Twin 101, Queen 107, provisioned for May and June 2021.
fn secret_nugget() -> Hotel {
    let mut hotel = Hotel::new(
        "Secret Nugget Hotel",
        vec![
            room(RoomType::Queen, 105, 80.0),
            room(RoomType::Twin, 101, 55.0),
            room(RoomType::Queen, 107, 80.0),
        ],
    )
    .unwrap();
    hotel.provision(&[(2021, 5), (2021, 6)]);
    hotel
}

// ── Construction ─────────────────────────────────────────

#[test]
fn hotel_rejects_duplicate_room_numbers() {
    let err = Hotel::new(
        "Dup",
        vec![room(RoomType::Queen, 105, 80.0), room(RoomType::King, 105, 120.0)],
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[test]
fn hotel_rejects_blank_name() {
    assert!(matches!(Hotel::new("  ", vec![]), Err(EngineError::InvalidInput(_))));
    assert!(matches!(Hotel::new("a\nb", vec![]), Err(EngineError::InvalidInput(_))));
}

#[test]
fn hotel_rejects_names_that_leave_the_data_dir() {
    for name in [".", "..", "Overlook/..", "..\\up"] {
        assert!(
            matches!(Hotel::new(name, vec![]), Err(EngineError::InvalidInput(_))),
            "{name:?}"
        );
    }
    assert!(Hotel::new("Dot. Hotel", vec![]).is_ok());
    assert!(Hotel::new("...And Justice", vec![]).is_ok());
}

#[test]
fn folder_name_is_lowercase_with_underscores() {
    let hotel = secret_nugget();
    assert_eq!(hotel.folder_name(), "secret_nugget_hotel");
    assert_eq!(folder_name("The Great Northern Hotel"), "the_great_northern_hotel");
}

#[test]
fn room_types_in_first_seen_order() {
    let hotel = secret_nugget();
    assert_eq!(hotel.available_room_types(), vec![RoomType::Queen, RoomType::Twin]);
}

// ── make_reservation ─────────────────────────────────────

#[test]
fn reservation_uses_first_free_room_of_type() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let n = hotel
        .make_reservation("Mrs. Santos", RoomType::Queen, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    let r = hotel.get_reservation(n).unwrap();
    assert_eq!(r.room_num(), 105);
    assert_eq!(r.booking_number(), n);
    assert!(hotel.room(105).unwrap().calendar.is_occupied(date(2021, 5, 5)));
    assert!(hotel.room(107).unwrap().calendar.is_free(date(2021, 5, 5)));
}

#[test]
fn overlapping_reservation_moves_to_next_room_then_fails() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    hotel
        .make_reservation("A", RoomType::Queen, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    let second = hotel
        .make_reservation("B", RoomType::Queen, date(2021, 5, 3), date(2021, 6, 5), &authority)
        .unwrap();
    assert_eq!(hotel.get_reservation(second).unwrap().room_num(), 107);

    let before: Vec<Calendar> = hotel.rooms().iter().map(|r| r.calendar.clone()).collect();
    let err = hotel
        .make_reservation("C", RoomType::Queen, date(2021, 5, 9), date(2021, 5, 12), &authority)
        .unwrap_err();
    assert!(matches!(err, EngineError::NoRoomAvailable(RoomType::Queen)));
    let after: Vec<Calendar> = hotel.rooms().iter().map(|r| r.calendar.clone()).collect();
    assert_eq!(before, after);
    assert_eq!(hotel.reservation_count(), 2);
}

#[test]
fn reservation_outside_provisioned_months_fails() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let err = hotel
        .make_reservation("A", RoomType::Twin, date(2021, 6, 28), date(2021, 7, 2), &authority)
        .unwrap_err();
    assert!(matches!(err, EngineError::NoRoomAvailable(RoomType::Twin)));
}

#[test]
fn reservation_for_missing_type_fails() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let err = hotel
        .make_reservation("A", RoomType::King, date(2021, 5, 3), date(2021, 5, 4), &authority)
        .unwrap_err();
    assert!(matches!(err, EngineError::NoRoomAvailable(RoomType::King)));
}

#[test]
fn reservation_with_inverted_dates_fails() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let err = hotel
        .make_reservation("A", RoomType::Queen, date(2021, 5, 10), date(2021, 5, 3), &authority)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRange { .. }));
}

#[test]
fn booking_numbers_are_unique_across_hotels() {
    let authority = BookingAuthority::new();
    let mut a = secret_nugget();
    let mut b = secret_nugget();
    let mut seen = std::collections::HashSet::new();
    for day in 1..=28 {
        for hotel in [&mut a, &mut b] {
            let n = hotel
                .make_reservation("G", RoomType::Twin, date(2021, 5, day), date(2021, 5, day + 1), &authority)
                .unwrap();
            assert_eq!(n.to_string().len(), 13);
            assert!(seen.insert(n));
        }
    }
    assert_eq!(authority.len(), 56);
}

/// Counters keyed by `name{label=value,...}`; gauges and histograms dropped.
#[derive(Default)]
struct CountingRecorder {
    counters: Mutex<HashMap<String, Arc<AtomicU64>>>,
}

impl CountingRecorder {
    fn count(&self, key: &str) -> u64 {
        self.counters
            .lock()
            .unwrap()
            .get(key)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }
}

impl Recorder for CountingRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        let labels: Vec<String> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let name = format!("{}{{{}}}", key.name(), labels.join(","));
        let counter = self.counters.lock().unwrap().entry(name).or_default().clone();
        Counter::from_arc(counter)
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

#[test]
fn every_reservation_outcome_is_counted() {
    let recorder = CountingRecorder::default();
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();

    metrics::with_local_recorder(&recorder, || {
        hotel
            .make_reservation("A", RoomType::Twin, date(2021, 5, 3), date(2021, 5, 5), &authority)
            .unwrap();
        // Inverted range, blank guest, no room of the type.
        assert!(hotel
            .make_reservation("A", RoomType::Twin, date(2021, 5, 9), date(2021, 5, 3), &authority)
            .is_err());
        assert!(hotel
            .make_reservation(" ", RoomType::Twin, date(2021, 5, 10), date(2021, 5, 11), &authority)
            .is_err());
        assert!(hotel
            .make_reservation("B", RoomType::King, date(2021, 5, 10), date(2021, 5, 11), &authority)
            .is_err());
    });

    assert_eq!(recorder.count("innkeeper_reservations_total{status=ok}"), 1);
    assert_eq!(recorder.count("innkeeper_reservations_total{status=rejected}"), 3);
}

// ── cancel_reservation ───────────────────────────────────

#[test]
fn cancel_frees_nights_and_removes_entry() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let pristine = hotel.room(105).unwrap().calendar.clone();
    let n = hotel
        .make_reservation("Mrs. Los Santos", RoomType::Queen, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    assert!(hotel.room(105).unwrap().calendar.is_occupied(date(2021, 5, 5)));

    let cancelled = hotel.cancel_reservation(n).unwrap();
    assert_eq!(cancelled.booking_number(), n);
    assert!(!hotel.contains_reservation(n));
    assert_eq!(hotel.room(105).unwrap().calendar, pristine);
}

#[test]
fn cancel_unknown_number_is_a_no_op() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    hotel
        .make_reservation("A", RoomType::Queen, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    let before = hotel.reservation_count();
    assert!(hotel.cancel_reservation(1234567890123).is_none());
    assert_eq!(hotel.reservation_count(), before);
}

#[test]
fn cancelled_range_can_be_booked_again() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let n = hotel
        .make_reservation("A", RoomType::Twin, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    hotel.cancel_reservation(n);
    let m = hotel
        .make_reservation("B", RoomType::Twin, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    assert_eq!(hotel.get_reservation(m).unwrap().room_num(), 101);
}

// ── Receipts and lookups ─────────────────────────────────

#[test]
fn receipt_for_single_booking() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let n = hotel
        .make_reservation("Mrs. Santos", RoomType::Queen, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    assert_eq!(hotel.get_receipt(&[n]), 560.0);
}

#[test]
fn receipt_is_additive_and_skips_unknown() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let a = hotel
        .make_reservation("Mrs. Santos", RoomType::Queen, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    let b = hotel
        .make_reservation("Mrs. Santos", RoomType::Twin, date(2021, 5, 3), date(2021, 6, 5), &authority)
        .unwrap();
    assert_eq!(hotel.get_receipt(&[a, b]), 2375.0);
    assert_eq!(hotel.get_receipt(&[a, b]), hotel.get_receipt(&[a]) + hotel.get_receipt(&[b]));
    assert_eq!(hotel.get_receipt(&[a, 123]), hotel.get_receipt(&[a]));
    assert_eq!(hotel.get_receipt(&[123]), 0.0);
    assert_eq!(hotel.get_receipt(&[]), 0.0);
}

#[test]
fn get_unknown_reservation_is_not_found() {
    let hotel = secret_nugget();
    assert!(matches!(
        hotel.get_reservation(1234567890123),
        Err(EngineError::NotFound(1234567890123))
    ));
}

#[test]
fn find_reservation_by_details() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let n = hotel
        .make_reservation("Dale Cooper", RoomType::Twin, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    let found = hotel
        .find_reservation("dale cooper", 101, date(2021, 5, 3), date(2021, 5, 10))
        .unwrap();
    assert_eq!(found.booking_number(), n);
    assert!(hotel
        .find_reservation("dale cooper", 101, date(2021, 5, 3), date(2021, 5, 11))
        .is_none());
    assert!(hotel
        .find_reservation("dale cooper", 105, date(2021, 5, 3), date(2021, 5, 10))
        .is_none());
}

// ── Provisioning and month views ─────────────────────────

#[test]
fn open_season_keeps_existing_occupancy() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    hotel
        .make_reservation("A", RoomType::Twin, date(2021, 5, 3), date(2021, 5, 10), &authority)
        .unwrap();
    let added = hotel.open_season(2021);
    assert_eq!(added, 3 * 10);
    assert!(hotel.room(101).unwrap().calendar.is_occupied(date(2021, 5, 3)));
    assert!(hotel.room(101).unwrap().calendar.is_free(date(2021, 12, 31)));
    assert_eq!(hotel.open_season(2021), 0);
}

#[test]
fn occupied_months_and_month_reservations() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    hotel.open_season(2021);
    let n = hotel
        .make_reservation("Jack", RoomType::Twin, date(2021, 10, 30), date(2021, 12, 23), &authority)
        .unwrap();
    let months: Vec<_> = hotel.occupied_months().into_iter().collect();
    assert_eq!(months, vec![(2021, 10), (2021, 11), (2021, 12)]);
    let in_nov: Vec<_> = hotel.reservations_in_month(2021, 11).map(|r| r.booking_number()).collect();
    assert_eq!(in_nov, vec![n]);
    assert_eq!(hotel.reservations_in_month(2021, 9).count(), 0);

    hotel.cancel_reservation(n);
    assert!(hotel.occupied_months().is_empty());
}

#[test]
fn restore_room_reservations_rebuilds_from_cells() {
    let authority = BookingAuthority::new();
    let mut hotel = secret_nugget();
    let cells: Vec<NightCell> = (3..=4)
        .map(|d| NightCell {
            date: date(2021, 5, d),
            text: "1953400675629--Jack".into(),
        })
        .collect();
    let restored = hotel.restore_room_reservations(101, &cells, &authority).unwrap();
    assert_eq!(restored, 1);
    let r = hotel.get_reservation(1953400675629).unwrap();
    assert_eq!(r.check_out(), date(2021, 5, 5));
    assert_eq!(r.room().room_type, RoomType::Twin);

    let err = hotel.restore_room_reservations(999, &cells, &authority).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}
