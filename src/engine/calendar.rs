use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::model::{days_in_month, Stay};

use super::EngineError;

/// `(year, month)` with a 1-based month.
pub type YearMonth = (i32, u32);

/// Per-room night occupancy, one slot vector per provisioned month.
///
/// Each vector has a leading sentinel (`None`) so that day `n` lives at
/// index `n`. `Some(true)` is a free night, `Some(false)` an occupied one.
/// Months missing from the map are not provisioned and read as unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calendar {
    months: BTreeMap<YearMonth, Vec<Option<bool>>>,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an all-free month for each `(year, month)`. Re-provisioning a
    /// month overwrites whatever occupancy it held. Months outside 1..=12 are
    /// skipped.
    pub fn provision(&mut self, year_months: impl IntoIterator<Item = YearMonth>) {
        for (year, month) in year_months {
            if let Some(slots) = fresh_month(year, month) {
                self.months.insert((year, month), slots);
            }
        }
    }

    /// Like `provision`, but leaves already provisioned months untouched.
    /// Returns how many months were added.
    pub fn provision_missing(&mut self, year_months: impl IntoIterator<Item = YearMonth>) -> usize {
        let mut added = 0;
        for (year, month) in year_months {
            if self.months.contains_key(&(year, month)) {
                continue;
            }
            if let Some(slots) = fresh_month(year, month) {
                self.months.insert((year, month), slots);
                added += 1;
            }
        }
        added
    }

    pub fn is_provisioned(&self, year: i32, month: u32) -> bool {
        self.months.contains_key(&(year, month))
    }

    /// Provisioned months in chronological order.
    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.months.keys().copied()
    }

    /// The raw slot vector for a month, sentinel included.
    pub fn slots(&self, year: i32, month: u32) -> Option<&[Option<bool>]> {
        self.months.get(&(year, month)).map(Vec::as_slice)
    }

    fn slot(&self, date: NaiveDate) -> Option<bool> {
        self.months
            .get(&(date.year(), date.month()))?
            .get(date.day() as usize)
            .copied()
            .flatten()
    }

    fn slot_mut(&mut self, date: NaiveDate) -> Option<&mut Option<bool>> {
        self.months
            .get_mut(&(date.year(), date.month()))?
            .get_mut(date.day() as usize)
    }

    /// True only for a provisioned, free night.
    pub fn is_free(&self, date: NaiveDate) -> bool {
        self.slot(date) == Some(true)
    }

    /// True only for a provisioned, occupied night.
    pub fn is_occupied(&self, date: NaiveDate) -> bool {
        self.slot(date) == Some(false)
    }

    /// Scan `[from, to)` one night at a time. Any unprovisioned month or
    /// occupied night makes the range unavailable.
    pub fn is_range_free(&self, from: NaiveDate, to: NaiveDate) -> Result<bool, EngineError> {
        let stay = Stay::new(from, to)?;
        Ok(self.is_stay_free(&stay))
    }

    pub fn is_stay_free(&self, stay: &Stay) -> bool {
        stay.iter_nights().all(|night| self.is_free(night))
    }

    /// Mark one night occupied. Fails if the night is already occupied or
    /// its month is not provisioned.
    pub fn occupy(&mut self, date: NaiveDate) -> Result<(), EngineError> {
        match self.slot_mut(date) {
            Some(slot) if *slot == Some(true) => {
                *slot = Some(false);
                Ok(())
            }
            _ => Err(EngineError::NightUnavailable(date)),
        }
    }

    /// Mark one night free. Idempotent, and a no-op on unprovisioned months.
    pub fn free(&mut self, date: NaiveDate) {
        if let Some(slot) = self.slot_mut(date)
            && slot.is_some()
        {
            *slot = Some(true);
        }
    }

    pub fn has_occupancy(&self, year: i32, month: u32) -> bool {
        self.months
            .get(&(year, month))
            .is_some_and(|slots| slots.contains(&Some(false)))
    }

    /// Days (1-based) occupied in the given month.
    pub fn occupied_days(&self, year: i32, month: u32) -> Vec<u32> {
        self.months
            .get(&(year, month))
            .map(|slots| {
                slots
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| **s == Some(false))
                    .map(|(day, _)| day as u32)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn fresh_month(year: i32, month: u32) -> Option<Vec<Option<bool>>> {
    let days = days_in_month(year, month) as usize;
    if days == 0 {
        return None;
    }
    let mut slots = vec![Some(true); days + 1];
    slots[0] = None;
    Some(slots)
}
