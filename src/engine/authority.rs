use dashmap::DashSet;
use rand::Rng;

use crate::model::{BookingNumber, MAX_BOOKING_NUMBER, MIN_BOOKING_NUMBER};

use super::EngineError;

/// Issues booking numbers and remembers every number handed out, across all
/// hotels of one system. `DashSet::insert` is the single point that decides
/// whether a number is taken, so concurrent draws never hand out the same one.
#[derive(Debug, Default)]
pub struct BookingAuthority {
    issued: DashSet<BookingNumber>,
}

impl BookingAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a fresh 13-digit number, resampling on collision.
    pub fn issue(&self) -> BookingNumber {
        self.issue_with(&mut rand::thread_rng())
    }

    pub fn issue_with<R: Rng>(&self, rng: &mut R) -> BookingNumber {
        loop {
            let candidate = rng.gen_range(MIN_BOOKING_NUMBER..=MAX_BOOKING_NUMBER);
            if self.issued.insert(candidate) {
                return candidate;
            }
        }
    }

    /// Register a caller-supplied number (the reload path).
    pub fn claim(&self, number: BookingNumber) -> Result<(), EngineError> {
        validate_booking_number(number)?;
        if !self.issued.insert(number) {
            return Err(EngineError::DuplicateBookingNumber(number));
        }
        Ok(())
    }

    pub fn is_issued(&self, number: BookingNumber) -> bool {
        self.issued.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

pub fn validate_booking_number(number: BookingNumber) -> Result<(), EngineError> {
    if !(MIN_BOOKING_NUMBER..=MAX_BOOKING_NUMBER).contains(&number) {
        return Err(EngineError::InvalidBookingNumber(number.to_string()));
    }
    Ok(())
}
