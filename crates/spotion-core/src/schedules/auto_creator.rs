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

//! Daily price-driven schedule planning

use bevy_ecs::prelude::*;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use spotion_types::{DayPrices, PERIODS_PER_DAY};
use tracing::{error, info, warn};

use super::{DailyTrigger, SettingsError};
use crate::optimizer::{RunWindowParams, plan_two_day_schedule};
use crate::persist::StateStore;
use crate::resources::AutoPlanSetup;

/// Window sizes the planner accepts, in periods
pub const ALLOWED_WINDOW_SIZES: [usize; 4] = [24, 32, 48, 96];

/// Persisted snapshot of an auto schedule creator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCreatorState {
    pub window_size: usize,
    pub max_total_cost: f32,
    pub max_slots: usize,
    pub min_slots: usize,
    pub calc_hour: u32,
    pub calc_minute: u32,
    pub enabled: bool,
    pub horizon_periods: usize,
}

/// Once-a-day planner that rebuilds a periodic schedule from prices
///
/// Lives on the same entity as the [`super::PeriodicSchedule`] it
/// plans for.
#[derive(Component)]
pub struct AutoScheduleCreator {
    state_name: String,
    params: RunWindowParams,
    calc_hour: u32,
    calc_minute: u32,
    enabled: bool,
    horizon_periods: usize,
    trigger: DailyTrigger,
}

impl AutoScheduleCreator {
    /// Planner with default tuning, disabled, for the named schedule
    pub fn new(schedule_name: &str) -> Self {
        Self {
            state_name: format!("{schedule_name}_auto"),
            params: RunWindowParams::default(),
            calc_hour: 16,
            calc_minute: 50,
            enabled: false,
            horizon_periods: PERIODS_PER_DAY,
            trigger: DailyTrigger::new(NaiveTime::default()),
        }
    }

    /// Build a planner from configuration, letting saved state win over
    /// the configured values after a restart
    pub fn from_setup(
        schedule_name: &str,
        setup: &AutoPlanSetup,
        store: &StateStore,
        today: NaiveDate,
        now: NaiveTime,
    ) -> Self {
        let mut creator = Self::new(schedule_name);
        creator.params = RunWindowParams {
            window_size: setup.window_size,
            max_total_cost: setup.max_total_cost,
            max_slots: setup.max_slots,
            min_slots: setup.min_slots,
        };
        creator.calc_hour = setup.calc_hour.min(23);
        creator.calc_minute = setup.calc_minute.min(59);
        creator.enabled = setup.enabled;

        if let Some(state) = store.load::<AutoCreatorState>(&creator.state_name) {
            creator.params = RunWindowParams {
                window_size: state.window_size,
                max_total_cost: state.max_total_cost,
                max_slots: state.max_slots,
                min_slots: state.min_slots,
            };
            creator.calc_hour = state.calc_hour;
            creator.calc_minute = state.calc_minute;
            creator.enabled = state.enabled;
            creator.horizon_periods = state.horizon_periods;
        }
        if creator.enabled {
            creator.arm(today, now);
        }
        creator
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn params(&self) -> &RunWindowParams {
        &self.params
    }

    fn calc_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.calc_hour, self.calc_minute, 0).unwrap_or_default()
    }

    fn arm(&mut self, today: NaiveDate, now: NaiveTime) {
        self.snap_window_size();
        self.trigger.set_time(self.calc_time(), today, now);
    }

    /// Snap the window size to the closest allowed value
    fn snap_window_size(&mut self) {
        let current = self.params.window_size;
        if ALLOWED_WINDOW_SIZES.contains(&current) {
            return;
        }
        let mut closest = ALLOWED_WINDOW_SIZES[0];
        for allowed in ALLOWED_WINDOW_SIZES {
            if allowed.abs_diff(current) < closest.abs_diff(current) {
                closest = allowed;
            }
        }
        warn!(
            "⚠️ Window size {} is not allowed, using {}",
            current, closest
        );
        self.params.window_size = closest;
    }

    /// Replace the planning parameters
    ///
    /// The whole set is validated up front; any bad value rejects the
    /// call and keeps everything as it was.
    pub fn set_parameters(
        &mut self,
        store: &StateStore,
        today: NaiveDate,
        now: NaiveTime,
        params: RunWindowParams,
        calc_hour: u32,
        calc_minute: u32,
    ) -> Result<(), SettingsError> {
        if params.window_size == 0 {
            return Err(SettingsError::InvalidWindowSize(params.window_size));
        }
        if !params.max_total_cost.is_finite() || params.max_total_cost < 0.0 {
            return Err(SettingsError::InvalidCostCeiling(params.max_total_cost));
        }
        if params.min_slots > params.max_slots {
            return Err(SettingsError::InvalidRunBounds {
                min: params.min_slots,
                max: params.max_slots,
            });
        }
        if calc_hour > 23 {
            return Err(SettingsError::InvalidHour(calc_hour));
        }
        if calc_minute > 59 {
            return Err(SettingsError::InvalidMinute(calc_minute));
        }

        self.params = params;
        self.calc_hour = calc_hour;
        self.calc_minute = calc_minute;
        if self.enabled {
            self.arm(today, now);
        }
        self.persist(store);
        Ok(())
    }

    /// Turn daily planning on or off
    pub fn set_enabled(&mut self, store: &StateStore, today: NaiveDate, now: NaiveTime, on: bool) {
        self.enabled = on;
        if on {
            self.arm(today, now);
            info!(
                "🤖 Daily planning armed for {:02}:{:02}",
                self.calc_hour, self.calc_minute
            );
        }
        self.persist(store);
    }

    /// True once per day at the calculation time, while enabled
    pub fn due(&mut self, today: NaiveDate, now: NaiveTime) -> bool {
        self.enabled && self.trigger.should_fire(today, now)
    }

    /// Run the optimizer over the cached price tables
    pub fn plan(
        &self,
        today_prices: &DayPrices,
        tomorrow_prices: &DayPrices,
        now: NaiveTime,
    ) -> (Vec<bool>, Vec<bool>) {
        plan_two_day_schedule(
            today_prices,
            tomorrow_prices,
            &self.params,
            now,
            self.horizon_periods,
        )
    }

    fn persist(&self, store: &StateStore) {
        let state = AutoCreatorState {
            window_size: self.params.window_size,
            max_total_cost: self.params.max_total_cost,
            max_slots: self.params.max_slots,
            min_slots: self.params.min_slots,
            calc_hour: self.calc_hour,
            calc_minute: self.calc_minute,
            enabled: self.enabled,
            horizon_periods: self.horizon_periods,
        };
        if let Err(e) = store.save(&self.state_name, &state) {
            error!("❌ Failed to save planner state {}: {:#}", self.state_name, e);
        }
    }
}
