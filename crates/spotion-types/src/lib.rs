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

//! Shared domain types for SpotION
//!
//! Quarter-hour period arithmetic, per-day price tables and the two-day
//! on/off masks used by device schedules. Everything here is plain data
//! that embeds in ECS components and serializes to disk.

pub mod period;
pub mod prices;
pub mod schedule_mask;

pub use period::{
    PERIOD_MINUTES, PERIODS_PER_DAY, PERIODS_PER_HOUR, period_after, period_of, period_start,
};
pub use prices::{DayPrices, PriceTableError};
pub use schedule_mask::{ScheduleDay, ScheduleMask, ScheduleMaskError};
