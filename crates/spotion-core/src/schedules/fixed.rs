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

//! Fixed-time on/off schedule
//!
//! Switches its devices on at a configured wall-clock time and back off
//! after a configured run time, counted in whole elapsed minutes on the
//! monotonic clock.

use std::sync::Arc;
use std::time::Instant;

use bevy_ecs::prelude::*;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{DailyTrigger, SettingsError};
use crate::persist::StateStore;
use crate::resources::FixedScheduleSetup;
use crate::traits::DeviceSink;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Persisted snapshot of a fixed schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedScheduleState {
    pub hour_on: u32,
    pub minute_on: u32,
    pub duration_minutes: u32,
    pub repeat_daily: bool,
    pub enabled: bool,
    pub command: bool,
}

/// What one tick changed
#[derive(Debug, Default, PartialEq)]
pub struct FixedTick {
    pub turned_on: bool,
    pub turned_off: bool,
}

/// Clock-triggered schedule with a fixed run time
#[derive(Component)]
pub struct FixedSchedule {
    name: String,
    hour_on: u32,
    minute_on: u32,
    duration_minutes: u32,
    repeat_daily: bool,
    enabled: bool,
    command: bool,
    trigger: DailyTrigger,
    turned_on_at: Option<Instant>,
    devices: Vec<Arc<dyn DeviceSink>>,
}

impl FixedSchedule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hour_on: 6,
            minute_on: 45,
            duration_minutes: 15,
            repeat_daily: true,
            enabled: false,
            command: false,
            trigger: DailyTrigger::new(NaiveTime::default()),
            turned_on_at: None,
            devices: Vec::new(),
        }
    }

    /// Build a schedule from configuration, letting saved state win
    /// over the configured values after a restart
    pub fn from_setup(
        setup: &FixedScheduleSetup,
        store: &StateStore,
        today: NaiveDate,
        now: NaiveTime,
    ) -> Self {
        let mut schedule = Self::new(&setup.name);
        schedule.hour_on = setup.hour_on.min(23);
        schedule.minute_on = setup.minute_on.min(59);
        schedule.duration_minutes = setup.duration_minutes.clamp(1, MINUTES_PER_DAY - 1);
        schedule.repeat_daily = setup.repeat_daily;
        schedule.enabled = setup.enabled;

        if let Some(state) = store.load::<FixedScheduleState>(&schedule.name) {
            schedule.hour_on = state.hour_on;
            schedule.minute_on = state.minute_on;
            schedule.duration_minutes = state.duration_minutes;
            schedule.repeat_daily = state.repeat_daily;
            schedule.enabled = state.enabled;
            schedule.command = state.command;
        }
        if schedule.enabled {
            schedule.arm(today, now);
        }
        schedule
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current on/off command
    pub fn command(&self) -> bool {
        self.command
    }

    /// Attach a device sink; it starts receiving commands next tick
    pub fn add_device(&mut self, device: Arc<dyn DeviceSink>) {
        info!("🔌 Device {} attached to schedule {}", device.name(), self.name);
        self.devices.push(device);
    }

    fn trigger_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour_on, self.minute_on, 0).unwrap_or_default()
    }

    fn arm(&mut self, today: NaiveDate, now: NaiveTime) {
        self.trigger.set_time(self.trigger_time(), today, now);
    }

    /// Update the switch-on time and run time
    ///
    /// Each field is validated on its own: valid fields apply, the
    /// first invalid one is reported and its previous value kept.
    pub fn set_settings(
        &mut self,
        store: &StateStore,
        today: NaiveDate,
        now: NaiveTime,
        hour_on: u32,
        minute_on: u32,
        duration_minutes: u32,
    ) -> Result<(), SettingsError> {
        let mut first_error = None;

        if hour_on <= 23 {
            self.hour_on = hour_on;
        } else {
            warn!("⚠️ {}: hour {} rejected", self.name, hour_on);
            first_error.get_or_insert(SettingsError::InvalidHour(hour_on));
        }
        if minute_on <= 59 {
            self.minute_on = minute_on;
        } else {
            warn!("⚠️ {}: minute {} rejected", self.name, minute_on);
            first_error.get_or_insert(SettingsError::InvalidMinute(minute_on));
        }
        if duration_minutes >= 1 && duration_minutes < MINUTES_PER_DAY {
            self.duration_minutes = duration_minutes;
        } else {
            warn!("⚠️ {}: run time {} min rejected", self.name, duration_minutes);
            first_error.get_or_insert(SettingsError::InvalidDuration(duration_minutes));
        }

        if self.enabled {
            self.arm(today, now);
        }
        self.persist(store);
        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    pub fn set_repeat_daily(&mut self, store: &StateStore, repeat: bool) {
        self.repeat_daily = repeat;
        self.persist(store);
    }

    /// Arm the daily trigger; when today's switch-on time has already
    /// passed, the first run happens tomorrow
    pub fn enable(&mut self, store: &StateStore, today: NaiveDate, now: NaiveTime) {
        self.enabled = true;
        self.arm(today, now);
        self.persist(store);
        info!(
            "⏰ {} armed for {:02}:{:02}, {} minutes",
            self.name, self.hour_on, self.minute_on, self.duration_minutes
        );
    }

    pub fn disable(&mut self, store: &StateStore) {
        self.enabled = false;
        self.persist(store);
    }

    fn persist(&self, store: &StateStore) {
        let state = FixedScheduleState {
            hour_on: self.hour_on,
            minute_on: self.minute_on,
            duration_minutes: self.duration_minutes,
            repeat_daily: self.repeat_daily,
            enabled: self.enabled,
            command: self.command,
        };
        if let Err(e) = store.save(&self.name, &state) {
            error!("❌ Failed to save schedule {}: {:#}", self.name, e);
        }
    }

    fn run_time_expired(&self, mono_now: Instant) -> bool {
        match self.turned_on_at {
            Some(started) => {
                let minutes = mono_now.duration_since(started).as_secs() / 60;
                minutes >= u64::from(self.duration_minutes)
            }
            // Restored mid-run; the elapsed time is unknown
            None => true,
        }
    }

    /// Fire the trigger when due, end the run when its time is up, and
    /// push the current command to every associated device
    pub fn tick(
        &mut self,
        store: &StateStore,
        today: NaiveDate,
        now: NaiveTime,
        mono_now: Instant,
    ) -> FixedTick {
        let mut outcome = FixedTick::default();

        if self.enabled && self.trigger.should_fire(today, now) {
            self.command = true;
            self.turned_on_at = Some(mono_now);
            outcome.turned_on = true;
            info!(
                "🔛 {} switching on for {} minutes",
                self.name, self.duration_minutes
            );
            if !self.repeat_daily {
                // One-shot run, the schedule stands down afterwards
                self.enabled = false;
            }
            self.persist(store);
        }

        if self.command && !outcome.turned_on && self.run_time_expired(mono_now) {
            self.command = false;
            self.turned_on_at = None;
            outcome.turned_off = true;
            info!("⏱️ {} run time over, switching off", self.name);
            self.persist(store);
        }

        for device in &self.devices {
            device.set_auto_run(self.command);
        }
        outcome
    }
}
