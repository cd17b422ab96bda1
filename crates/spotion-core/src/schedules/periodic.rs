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

//! Two-day periodic on/off schedule

use std::sync::Arc;

use bevy_ecs::prelude::*;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use spotion_types::{ScheduleDay, ScheduleMask, ScheduleMaskError, period_of};
use tracing::{error, info, warn};

use crate::persist::StateStore;
use crate::traits::DeviceSink;

/// Persisted snapshot of a periodic schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicScheduleState {
    /// The local date the today mask belongs to
    pub date: NaiveDate,
    pub today: Vec<bool>,
    pub tomorrow: Vec<bool>,
}

/// What one tick changed
#[derive(Debug, Default, PartialEq)]
pub struct PeriodicTick {
    /// The date changed and the mask rolled over
    pub rolled_over: bool,
    /// The clock crossed into this period
    pub entered_period: Option<usize>,
}

/// On/off schedule over the 96 quarter-hour periods of two days
///
/// Every tick the current period's command goes out to all associated
/// devices, so a sink that missed a command converges on the next tick.
#[derive(Component)]
pub struct PeriodicSchedule {
    name: String,
    mask: ScheduleMask,
    seen_date: NaiveDate,
    current_period: usize,
    devices: Vec<Arc<dyn DeviceSink>>,
}

impl PeriodicSchedule {
    /// Fresh all-off schedule anchored to the given moment
    pub fn new(name: impl Into<String>, today: NaiveDate, now: NaiveTime) -> Self {
        Self {
            name: name.into(),
            mask: ScheduleMask::new(),
            seen_date: today,
            current_period: period_of(now),
            devices: Vec::new(),
        }
    }

    /// Restore a schedule from the state store
    ///
    /// Saved masks only apply when they were saved for the current
    /// date; anything older starts fresh.
    pub fn restore(name: impl Into<String>, store: &StateStore, today: NaiveDate, now: NaiveTime) -> Self {
        let mut schedule = Self::new(name, today, now);
        let Some(state) = store.load::<PeriodicScheduleState>(&schedule.name) else {
            return schedule;
        };
        if state.date != today {
            info!(
                "ℹ️ Saved schedule {} is from {}, starting fresh",
                schedule.name, state.date
            );
            return schedule;
        }
        match ScheduleMask::from_days(state.today, state.tomorrow) {
            Ok(mask) => {
                schedule.mask = mask;
                info!("📋 Restored schedule {} for {}", schedule.name, today);
            }
            Err(e) => warn!(
                "⚠️ Saved masks for {} are unusable, starting fresh: {}",
                schedule.name, e
            ),
        }
        schedule
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mask(&self) -> &ScheduleMask {
        &self.mask
    }

    /// Period the schedule currently considers active
    pub fn current_period(&self) -> usize {
        self.current_period
    }

    /// Attach a device sink; it starts receiving commands next tick
    pub fn add_device(&mut self, device: Arc<dyn DeviceSink>) {
        info!("🔌 Device {} attached to schedule {}", device.name(), self.name);
        self.devices.push(device);
    }

    /// Switch a single period on or off, persisting the result
    pub fn set_slot(
        &mut self,
        store: &StateStore,
        day: ScheduleDay,
        period: usize,
        on: bool,
    ) -> Result<(), ScheduleMaskError> {
        self.mask.set(day, period, on).inspect_err(|e| {
            error!("❌ Rejected slot update on {}: {}", self.name, e);
        })?;
        self.persist(store);
        Ok(())
    }

    /// Replace one day's full mask, persisting the result
    pub fn set_full_day(
        &mut self,
        store: &StateStore,
        day: ScheduleDay,
        mask: &[bool],
    ) -> Result<(), ScheduleMaskError> {
        self.mask.set_full_day(day, mask).inspect_err(|e| {
            error!("❌ Rejected day mask on {}: {}", self.name, e);
        })?;
        self.persist(store);
        Ok(())
    }

    fn persist(&self, store: &StateStore) {
        let state = PeriodicScheduleState {
            date: self.seen_date,
            today: self.mask.day(ScheduleDay::Today).to_vec(),
            tomorrow: self.mask.day(ScheduleDay::Tomorrow).to_vec(),
        };
        if let Err(e) = store.save(&self.name, &state) {
            error!("❌ Failed to save schedule {}: {:#}", self.name, e);
        }
    }

    /// Advance date and period tracking, then push the current command
    /// to every associated device
    pub fn tick(&mut self, store: &StateStore, today: NaiveDate, now: NaiveTime) -> PeriodicTick {
        let mut outcome = PeriodicTick::default();

        if today != self.seen_date {
            self.mask.rollover();
            self.seen_date = today;
            self.persist(store);
            outcome.rolled_over = true;
            info!("🌙 Schedule {} rolled over to {}", self.name, today);
        }

        let period = period_of(now);
        if period != self.current_period {
            self.current_period = period;
            outcome.entered_period = Some(period);
        }

        let on = self.mask.is_on(ScheduleDay::Today, self.current_period);
        for device in &self.devices {
            device.set_auto_run(on);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct RecordingSink {
        name: String,
        commands: Mutex<Vec<bool>>,
    }

    impl RecordingSink {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                commands: Mutex::new(Vec::new()),
            })
        }

        fn last(&self) -> Option<bool> {
            self.commands.lock().last().copied()
        }
    }

    impl DeviceSink for RecordingSink {
        fn set_auto_run(&self, on: bool) {
            self.commands.lock().push(on);
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn test_store() -> (StateStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (StateStore::new(dir.path()), dir)
    }

    #[test]
    fn test_tick_drives_devices_with_current_period() {
        let (store, _dir) = test_store();
        let today = date(2025, 3, 10);
        let sink = RecordingSink::new("boiler");

        let mut schedule = PeriodicSchedule::new("heating", today, time(8, 0));
        schedule.add_device(sink.clone());
        schedule
            .set_slot(&store, ScheduleDay::Today, 32, true)
            .unwrap();

        // 08:05 is period 32
        schedule.tick(&store, today, time(8, 5));
        assert_eq!(sink.last(), Some(true));

        schedule.tick(&store, today, time(8, 15));
        assert_eq!(sink.last(), Some(false));
    }

    #[test]
    fn test_period_boundary_reported_once() {
        let (store, _dir) = test_store();
        let today = date(2025, 3, 10);
        let mut schedule = PeriodicSchedule::new("heating", today, time(8, 0));

        let outcome = schedule.tick(&store, today, time(8, 10));
        assert_eq!(outcome.entered_period, None);

        let outcome = schedule.tick(&store, today, time(8, 16));
        assert_eq!(outcome.entered_period, Some(33));

        let outcome = schedule.tick(&store, today, time(8, 20));
        assert_eq!(outcome.entered_period, None);
    }

    #[test]
    fn test_rollover_happens_once_per_date_change() {
        let (store, _dir) = test_store();
        let mut schedule = PeriodicSchedule::new("heating", date(2025, 3, 10), time(23, 50));
        schedule
            .set_slot(&store, ScheduleDay::Tomorrow, 2, true)
            .unwrap();

        let next_day = date(2025, 3, 11);
        let outcome = schedule.tick(&store, next_day, time(0, 1));
        assert!(outcome.rolled_over);
        assert!(schedule.mask().is_on(ScheduleDay::Today, 2));

        let outcome = schedule.tick(&store, next_day, time(0, 2));
        assert!(!outcome.rolled_over);
        assert!(schedule.mask().day(ScheduleDay::Tomorrow).iter().all(|on| !on));
    }

    #[test]
    fn test_restore_same_day_keeps_mask() {
        let (store, _dir) = test_store();
        let today = date(2025, 3, 10);

        let mut schedule = PeriodicSchedule::new("heating", today, time(9, 0));
        let mut full = vec![false; 96];
        full[40] = true;
        schedule
            .set_full_day(&store, ScheduleDay::Today, &full)
            .unwrap();
        drop(schedule);

        let restored = PeriodicSchedule::restore("heating", &store, today, time(9, 30));
        assert!(restored.mask().is_on(ScheduleDay::Today, 40));
    }

    #[test]
    fn test_restore_discards_stale_state() {
        let (store, _dir) = test_store();
        let saved_day = date(2025, 3, 10);

        let mut schedule = PeriodicSchedule::new("heating", saved_day, time(9, 0));
        schedule
            .set_slot(&store, ScheduleDay::Today, 40, true)
            .unwrap();
        drop(schedule);

        let restored = PeriodicSchedule::restore("heating", &store, date(2025, 3, 12), time(9, 0));
        assert!(!restored.mask().is_on(ScheduleDay::Today, 40));
    }

    #[test]
    fn test_out_of_range_slot_rejected() {
        let (store, _dir) = test_store();
        let mut schedule = PeriodicSchedule::new("heating", date(2025, 3, 10), time(9, 0));
        assert!(
            schedule
                .set_slot(&store, ScheduleDay::Today, 96, true)
                .is_err()
        );
    }
}
