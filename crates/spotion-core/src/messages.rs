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

//! Notification messages emitted by the scheduling systems
//!
//! Interested systems subscribe with a `MessageReader`; nothing in the
//! engine depends on anyone listening.

use bevy_ecs::prelude::*;

/// The cached price picture changed: a day rolled over, tomorrow's prices
/// turned up in the store, or a fetch landed
#[derive(Message, Debug, Clone)]
pub struct PricesChanged;

/// A provider fetch delivered prices that were not cached before
#[derive(Message, Debug, Clone)]
pub struct NewPricesAvailable;

/// A schedule's mask, settings or enablement changed
#[derive(Message, Debug, Clone)]
pub struct ScheduleChanged {
    /// Name of the schedule that changed
    pub schedule: String,
}

/// The wall clock crossed into a new quarter-hour period
#[derive(Message, Debug, Clone)]
pub struct PeriodChanged {
    /// Name of the schedule tracking the boundary
    pub schedule: String,
    /// The period just entered (0-95)
    pub period: usize,
}

/// A device sink was attached to a schedule
#[derive(Message, Debug, Clone)]
pub struct DeviceAssociated {
    pub schedule: String,
    pub device: String,
}
