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

//! Device schedules
//!
//! Three cooperating pieces: the periodic schedule holds the two-day
//! on/off mask and drives its devices every tick, the fixed schedule
//! switches on at a set time for a set run time, and the auto creator
//! rebuilds a periodic schedule from prices once a day.

pub mod auto_creator;
pub mod fixed;
pub mod periodic;

pub use auto_creator::{ALLOWED_WINDOW_SIZES, AutoCreatorState, AutoScheduleCreator};
pub use fixed::{FixedSchedule, FixedScheduleState};
pub use periodic::{PeriodicSchedule, PeriodicScheduleState, PeriodicTick};

use bevy_ecs::prelude::*;
use chrono::{Local, NaiveDate, NaiveTime};
use spotion_types::ScheduleDay;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::messages::{DeviceAssociated, PeriodChanged, PricesChanged, ScheduleChanged};
use crate::resources::{DeviceSinkRegistry, PriceStoreResource, SchedulerConfig, StateStoreResource};

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("hour {0} is out of range")]
    InvalidHour(u32),
    #[error("minute {0} is out of range")]
    InvalidMinute(u32),
    #[error("run time of {0} minutes is out of range")]
    InvalidDuration(u32),
    #[error("window size {0} is not usable")]
    InvalidWindowSize(usize),
    #[error("cost ceiling {0} is not usable")]
    InvalidCostCeiling(f32),
    #[error("run bounds min {min} / max {max} are inconsistent")]
    InvalidRunBounds { min: usize, max: usize },
}

/// Once-a-day trigger at a fixed local time
///
/// Arming while today's trigger time is already past schedules the
/// first fire for tomorrow.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTrigger {
    at: NaiveTime,
    last_fired: Option<NaiveDate>,
}

impl DailyTrigger {
    pub fn new(at: NaiveTime) -> Self {
        Self {
            at,
            last_fired: None,
        }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// Arm relative to the current moment
    pub fn arm(&mut self, today: NaiveDate, now: NaiveTime) {
        self.last_fired = if now >= self.at { Some(today) } else { None };
    }

    /// Move the trigger time and re-arm
    pub fn set_time(&mut self, at: NaiveTime, today: NaiveDate, now: NaiveTime) {
        self.at = at;
        self.arm(today, now);
    }

    /// True at most once per day, once the trigger time has passed
    pub fn should_fire(&mut self, today: NaiveDate, now: NaiveTime) -> bool {
        if self.last_fired == Some(today) || now < self.at {
            return false;
        }
        self.last_fired = Some(today);
        true
    }
}

// ============= Schedule systems =============

/// Spawn the configured schedule entities (Startup)
pub fn initialize_schedules_system(
    mut commands: Commands,
    config: Res<SchedulerConfig>,
    state: Res<StateStoreResource>,
    registry: Res<DeviceSinkRegistry>,
    existing: Query<&PeriodicSchedule>,
    mut associated: MessageWriter<DeviceAssociated>,
) {
    if !existing.is_empty() {
        return;
    }
    let now = Local::now();
    let (today, time) = (now.date_naive(), now.time());

    for setup in &config.periodic_schedules {
        let mut schedule = PeriodicSchedule::restore(&setup.name, &state.0, today, time);
        for device in &setup.devices {
            match registry.get(device) {
                Some(sink) => {
                    schedule.add_device(sink);
                    associated.write(DeviceAssociated {
                        schedule: setup.name.clone(),
                        device: device.clone(),
                    });
                }
                None => warn!(
                    "⚠️ Unknown device sink {} for schedule {}",
                    device, setup.name
                ),
            }
        }
        match &setup.auto_plan {
            Some(plan) => {
                let creator =
                    AutoScheduleCreator::from_setup(&setup.name, plan, &state.0, today, time);
                commands.spawn((schedule, creator));
            }
            None => {
                commands.spawn(schedule);
            }
        }
        info!("📋 Schedule {} ready", setup.name);
    }

    for setup in &config.fixed_schedules {
        let mut schedule = FixedSchedule::from_setup(setup, &state.0, today, time);
        for device in &setup.devices {
            match registry.get(device) {
                Some(sink) => {
                    schedule.add_device(sink);
                    associated.write(DeviceAssociated {
                        schedule: setup.name.clone(),
                        device: device.clone(),
                    });
                }
                None => warn!(
                    "⚠️ Unknown device sink {} for schedule {}",
                    device, setup.name
                ),
            }
        }
        commands.spawn(schedule);
        info!("⏰ Fixed schedule {} ready", setup.name);
    }
}

/// Advance periodic schedules and push commands to their devices (Update)
pub fn periodic_schedule_system(
    mut schedules: Query<&mut PeriodicSchedule>,
    state: Res<StateStoreResource>,
    mut schedule_changed: MessageWriter<ScheduleChanged>,
    mut period_changed: MessageWriter<PeriodChanged>,
) {
    let now = Local::now();
    for mut schedule in &mut schedules {
        let outcome = schedule.tick(&state.0, now.date_naive(), now.time());
        if outcome.rolled_over {
            schedule_changed.write(ScheduleChanged {
                schedule: schedule.name().to_string(),
            });
        }
        if let Some(period) = outcome.entered_period {
            period_changed.write(PeriodChanged {
                schedule: schedule.name().to_string(),
                period,
            });
        }
    }
}

/// Advance fixed schedules (Update)
pub fn fixed_schedule_system(
    mut schedules: Query<&mut FixedSchedule>,
    state: Res<StateStoreResource>,
    mut schedule_changed: MessageWriter<ScheduleChanged>,
) {
    let now = Local::now();
    let mono_now = Instant::now();
    for mut schedule in &mut schedules {
        let outcome = schedule.tick(&state.0, now.date_naive(), now.time(), mono_now);
        if outcome.turned_on || outcome.turned_off {
            schedule_changed.write(ScheduleChanged {
                schedule: schedule.name().to_string(),
            });
        }
    }
}

/// Rebuild auto-planned schedules at their calculation time (Update)
pub fn auto_plan_system(
    mut schedules: Query<(&mut AutoScheduleCreator, &mut PeriodicSchedule)>,
    store: Res<PriceStoreResource>,
    state: Res<StateStoreResource>,
    mut schedule_changed: MessageWriter<ScheduleChanged>,
) {
    let now = Local::now();
    let (today, time) = (now.date_naive(), now.time());
    for (mut creator, mut schedule) in &mut schedules {
        if !creator.due(today, time) {
            continue;
        }
        info!("🤖 Computing schedule {} from prices", schedule.name());
        let (today_prices, tomorrow_prices) = store.0.read_today_tomorrow(today);
        let (today_mask, tomorrow_mask) = creator.plan(&today_prices, &tomorrow_prices, time);

        let mut updated = true;
        if let Err(e) = schedule.set_full_day(&state.0, ScheduleDay::Today, &today_mask) {
            warn!("⚠️ Could not apply today's mask to {}: {}", schedule.name(), e);
            updated = false;
        }
        if let Err(e) = schedule.set_full_day(&state.0, ScheduleDay::Tomorrow, &tomorrow_mask) {
            warn!(
                "⚠️ Could not apply tomorrow's mask to {}: {}",
                schedule.name(),
                e
            );
            updated = false;
        }
        if updated {
            schedule_changed.write(ScheduleChanged {
                schedule: schedule.name().to_string(),
            });
            info!("✅ Schedule {} updated from prices", schedule.name());
        }
    }
}

/// Log price notifications as they pass by (Update)
///
/// Keeps an audit trail of cache changes in the log without anyone
/// having to subscribe.
pub fn log_price_notifications_system(
    mut prices_changed: MessageReader<PricesChanged>,
    mut schedule_changed: MessageReader<ScheduleChanged>,
) {
    for _ in prices_changed.read() {
        info!("📢 Price picture changed");
    }
    for message in schedule_changed.read() {
        info!("📢 Schedule {} changed", message.schedule);
    }
}
