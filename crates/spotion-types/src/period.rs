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

//! Quarter-hour period arithmetic
//!
//! A day is divided into 96 periods of 15 minutes each. Period 0 covers
//! 00:00-00:15, period 95 covers 23:45-24:00.

use chrono::{NaiveTime, Timelike};

/// Number of 15-minute periods in one day
pub const PERIODS_PER_DAY: usize = 96;

/// Number of periods in one hour
pub const PERIODS_PER_HOUR: usize = 4;

/// Length of one period in minutes
pub const PERIOD_MINUTES: u32 = 15;

/// Period index (0-95) containing the given wall-clock time
pub fn period_of(time: NaiveTime) -> usize {
    time.hour() as usize * PERIODS_PER_HOUR + time.minute() as usize / PERIOD_MINUTES as usize
}

/// Index of the first full period after the given time
///
/// Returns `PERIODS_PER_DAY` during the last period of the day, meaning
/// the first period of the following day.
pub fn period_after(time: NaiveTime) -> usize {
    period_of(time) + 1
}

/// Wall-clock start of a period index, `None` when out of range
pub fn period_start(period: usize) -> Option<NaiveTime> {
    if period >= PERIODS_PER_DAY {
        return None;
    }
    let hour = (period / PERIODS_PER_HOUR) as u32;
    let minute = (period % PERIODS_PER_HOUR) as u32 * PERIOD_MINUTES;
    NaiveTime::from_hms_opt(hour, minute, 0)
}
