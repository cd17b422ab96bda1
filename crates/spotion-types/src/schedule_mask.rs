// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SpotION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Two-day on/off bitmaps for device schedules

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::period::PERIODS_PER_DAY;

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleMaskError {
    #[error("period index {0} out of range")]
    PeriodOutOfRange(usize),
    #[error("day mask must cover {expected} periods, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Which of the two covered days an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleDay {
    Today,
    Tomorrow,
}

/// On/off state for every period of today and tomorrow
///
/// Both day masks always hold exactly 96 slots. At midnight the tomorrow
/// mask becomes today and a fresh all-off tomorrow takes its place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMask {
    today: Vec<bool>,
    tomorrow: Vec<bool>,
}

impl Default for ScheduleMask {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleMask {
    /// All periods off on both days
    pub fn new() -> Self {
        Self {
            today: vec![false; PERIODS_PER_DAY],
            tomorrow: vec![false; PERIODS_PER_DAY],
        }
    }

    /// Rebuild a mask from previously persisted day vectors
    pub fn from_days(today: Vec<bool>, tomorrow: Vec<bool>) -> Result<Self, ScheduleMaskError> {
        for day in [&today, &tomorrow] {
            if day.len() != PERIODS_PER_DAY {
                return Err(ScheduleMaskError::WrongLength {
                    expected: PERIODS_PER_DAY,
                    actual: day.len(),
                });
            }
        }
        Ok(Self { today, tomorrow })
    }

    pub fn day(&self, day: ScheduleDay) -> &[bool] {
        match day {
            ScheduleDay::Today => &self.today,
            ScheduleDay::Tomorrow => &self.tomorrow,
        }
    }

    fn day_mut(&mut self, day: ScheduleDay) -> &mut Vec<bool> {
        match day {
            ScheduleDay::Today => &mut self.today,
            ScheduleDay::Tomorrow => &mut self.tomorrow,
        }
    }

    /// On/off state of one period, off when the index is out of range
    pub fn is_on(&self, day: ScheduleDay, period: usize) -> bool {
        self.day(day).get(period).copied().unwrap_or(false)
    }

    /// Switch a single period on or off
    pub fn set(&mut self, day: ScheduleDay, period: usize, on: bool) -> Result<(), ScheduleMaskError> {
        match self.day_mut(day).get_mut(period) {
            Some(slot) => {
                *slot = on;
                Ok(())
            }
            None => Err(ScheduleMaskError::PeriodOutOfRange(period)),
        }
    }

    /// Replace the full mask of one day
    pub fn set_full_day(&mut self, day: ScheduleDay, mask: &[bool]) -> Result<(), ScheduleMaskError> {
        if mask.len() != PERIODS_PER_DAY {
            return Err(ScheduleMaskError::WrongLength {
                expected: PERIODS_PER_DAY,
                actual: mask.len(),
            });
        }
        self.day_mut(day).copy_from_slice(mask);
        Ok(())
    }

    /// Midnight transition: tomorrow becomes today, tomorrow resets to all-off
    pub fn rollover(&mut self) {
        std::mem::swap(&mut self.today, &mut self.tomorrow);
        self.tomorrow.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mask_is_all_off() {
        let mask = ScheduleMask::new();
        assert!(mask.day(ScheduleDay::Today).iter().all(|on| !on));
        assert!(mask.day(ScheduleDay::Tomorrow).iter().all(|on| !on));
    }

    #[test]
    fn test_set_and_read_back() {
        let mut mask = ScheduleMask::new();
        mask.set(ScheduleDay::Tomorrow, 42, true).unwrap();
        assert!(mask.is_on(ScheduleDay::Tomorrow, 42));
        assert!(!mask.is_on(ScheduleDay::Today, 42));

        mask.set(ScheduleDay::Tomorrow, 42, false).unwrap();
        assert!(!mask.is_on(ScheduleDay::Tomorrow, 42));
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let mut mask = ScheduleMask::new();
        assert_eq!(
            mask.set(ScheduleDay::Today, 96, true).unwrap_err(),
            ScheduleMaskError::PeriodOutOfRange(96)
        );
        // Out-of-range reads are simply off
        assert!(!mask.is_on(ScheduleDay::Today, 200));
    }

    #[test]
    fn test_set_full_day_requires_96_slots() {
        let mut mask = ScheduleMask::new();
        let short = vec![true; 24];
        assert_eq!(
            mask.set_full_day(ScheduleDay::Today, &short).unwrap_err(),
            ScheduleMaskError::WrongLength {
                expected: 96,
                actual: 24
            }
        );

        let mut full = vec![false; 96];
        full[10] = true;
        mask.set_full_day(ScheduleDay::Today, &full).unwrap();
        assert!(mask.is_on(ScheduleDay::Today, 10));
    }

    #[test]
    fn test_rollover_promotes_tomorrow() {
        let mut mask = ScheduleMask::new();
        mask.set(ScheduleDay::Today, 1, true).unwrap();
        mask.set(ScheduleDay::Tomorrow, 7, true).unwrap();

        mask.rollover();

        assert!(mask.is_on(ScheduleDay::Today, 7));
        assert!(!mask.is_on(ScheduleDay::Today, 1));
        assert!(mask.day(ScheduleDay::Tomorrow).iter().all(|on| !on));
    }
}
