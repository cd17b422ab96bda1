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

// Test: configured schedules come up at startup and survive restarts
// Scenario: SchedulerConfig -> spawned schedule entities -> device wiring,
// with saved state taking precedence over configured values

use std::sync::Arc;

use bevy_app::App;
use bevy_ecs::message::Messages;
use bevy_ecs::system::RunSystemOnce;
use chrono::{NaiveDate, NaiveTime};
use parking_lot::Mutex;

use spotion_core::StateStore;
use spotion_core::messages::{DeviceAssociated, PeriodChanged, ScheduleChanged};
use spotion_core::resources::{
    AutoPlanSetup, DeviceSinkRegistry, FixedScheduleSetup, PeriodicScheduleSetup, SchedulerConfig,
    StateStoreResource,
};
use spotion_core::schedules::{
    AutoScheduleCreator, FixedSchedule, FixedScheduleState, PeriodicSchedule,
    fixed_schedule_system, initialize_schedules_system, periodic_schedule_system,
};
use spotion_core::traits::DeviceSink;
use spotion_types::ScheduleDay;

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

fn two_schedule_config() -> SchedulerConfig {
    SchedulerConfig {
        periodic_schedules: vec![PeriodicScheduleSetup {
            name: "water_heater".to_string(),
            devices: vec!["plug_1".to_string()],
            auto_plan: Some(AutoPlanSetup::default()),
        }],
        fixed_schedules: vec![FixedScheduleSetup {
            name: "alarm_clock".to_string(),
            devices: vec!["plug_2".to_string()],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn test_app(config: SchedulerConfig, state_dir: &std::path::Path, registry: DeviceSinkRegistry) -> App {
    let mut app = App::new();
    app.add_message::<DeviceAssociated>();
    app.add_message::<ScheduleChanged>();
    app.add_message::<PeriodChanged>();
    app.insert_resource(config);
    app.insert_resource(StateStoreResource(StateStore::new(state_dir)));
    app.insert_resource(registry);
    app
}

#[test]
fn test_startup_spawns_configured_schedules() {
    let state_dir = tempfile::tempdir().unwrap();
    let plug_1 = RecordingSink::new("plug_1");
    let plug_2 = RecordingSink::new("plug_2");
    let mut registry = DeviceSinkRegistry::default();
    registry.insert(plug_1.clone());
    registry.insert(plug_2.clone());

    let mut app = test_app(two_schedule_config(), state_dir.path(), registry);
    app.world_mut()
        .run_system_once(initialize_schedules_system)
        .expect("Failed to run startup system");

    println!("\n=== Startup from configuration ===");
    let periodic_count = app
        .world_mut()
        .query::<&PeriodicSchedule>()
        .iter(app.world())
        .count();
    let creator_count = app
        .world_mut()
        .query::<&AutoScheduleCreator>()
        .iter(app.world())
        .count();
    let fixed_count = app
        .world_mut()
        .query::<&FixedSchedule>()
        .iter(app.world())
        .count();
    println!("Spawned: {periodic_count} periodic, {creator_count} planners, {fixed_count} fixed");

    assert_eq!(periodic_count, 1);
    assert_eq!(creator_count, 1, "Configured auto plan should attach a planner");
    assert_eq!(fixed_count, 1);

    let associations: Vec<DeviceAssociated> = app
        .world_mut()
        .resource_mut::<Messages<DeviceAssociated>>()
        .drain()
        .collect();
    assert_eq!(associations.len(), 2);
    assert_eq!(associations[0].schedule, "water_heater");
    assert_eq!(associations[0].device, "plug_1");

    // Both schedules start all-off, the first tick already commands the plugs
    app.world_mut()
        .run_system_once(periodic_schedule_system)
        .expect("Failed to run periodic system");
    app.world_mut()
        .run_system_once(fixed_schedule_system)
        .expect("Failed to run fixed system");
    assert_eq!(plug_1.last(), Some(false));
    assert_eq!(plug_2.last(), Some(false));

    // A second startup pass must not duplicate the entities
    app.world_mut()
        .run_system_once(initialize_schedules_system)
        .expect("Failed to re-run startup system");
    let periodic_count = app
        .world_mut()
        .query::<&PeriodicSchedule>()
        .iter(app.world())
        .count();
    assert_eq!(periodic_count, 1, "Startup must be idempotent");
}

#[test]
fn test_unknown_device_is_skipped() {
    let state_dir = tempfile::tempdir().unwrap();
    let config = SchedulerConfig {
        periodic_schedules: vec![PeriodicScheduleSetup {
            name: "water_heater".to_string(),
            devices: vec!["ghost_plug".to_string()],
            auto_plan: None,
        }],
        ..Default::default()
    };

    let mut app = test_app(config, state_dir.path(), DeviceSinkRegistry::default());
    app.world_mut()
        .run_system_once(initialize_schedules_system)
        .expect("Failed to run startup system");

    // The schedule still exists, just with nothing attached
    let periodic_count = app
        .world_mut()
        .query::<&PeriodicSchedule>()
        .iter(app.world())
        .count();
    assert_eq!(periodic_count, 1);
    assert!(
        app.world()
            .resource::<Messages<DeviceAssociated>>()
            .is_empty(),
        "An unknown device must not be reported as associated"
    );
}

#[test]
fn test_saved_fixed_state_wins_over_config() {
    let state_dir = tempfile::tempdir().unwrap();
    let state = StateStore::new(state_dir.path());

    // A previous process left the alarm enabled and mid-run
    state
        .save(
            "alarm_clock",
            &FixedScheduleState {
                hour_on: 7,
                minute_on: 15,
                duration_minutes: 30,
                repeat_daily: true,
                enabled: true,
                command: true,
            },
        )
        .unwrap();

    let plug_2 = RecordingSink::new("plug_2");
    let mut registry = DeviceSinkRegistry::default();
    registry.insert(plug_2.clone());
    let mut app = test_app(two_schedule_config(), state_dir.path(), registry);

    app.world_mut()
        .run_system_once(initialize_schedules_system)
        .expect("Failed to run startup system");

    {
        let mut query = app.world_mut().query::<&FixedSchedule>();
        let schedule = query.iter(app.world()).next().unwrap();
        assert!(
            schedule.is_enabled(),
            "Saved enablement beats the disabled config default"
        );
        assert!(schedule.command(), "The saved run is still active");
    }

    // The run start did not survive the restart, so the first tick ends it
    app.world_mut()
        .run_system_once(fixed_schedule_system)
        .expect("Failed to run fixed system");
    assert_eq!(plug_2.last(), Some(false));
    assert!(
        !app.world().resource::<Messages<ScheduleChanged>>().is_empty(),
        "Ending the run must announce a schedule change"
    );
}

#[test]
fn test_planned_mask_survives_restart() {
    let state_dir = tempfile::tempdir().unwrap();
    let state = StateStore::new(state_dir.path());
    let today = date(2026, 1, 20);

    let mut schedule = PeriodicSchedule::new("water_heater", today, time(9, 0));
    let mut mask = vec![false; 96];
    mask[40] = true;
    schedule
        .set_full_day(&state, ScheduleDay::Today, &mask)
        .unwrap();
    drop(schedule);

    println!("\n=== Restart on the same day ===");
    let sink = RecordingSink::new("plug_1");
    let mut restored = PeriodicSchedule::restore("water_heater", &state, today, time(9, 30));
    restored.add_device(sink.clone());

    // 10:05 sits in period 40, the slot planned before the restart
    restored.tick(&state, today, time(10, 5));
    assert_eq!(sink.last(), Some(true), "Restored mask should still drive the plug");

    // A restart days later starts from a clean mask instead
    let stale = PeriodicSchedule::restore("water_heater", &state, date(2026, 1, 23), time(9, 0));
    assert!(
        !stale.mask().is_on(ScheduleDay::Today, 40),
        "Stale saved masks must not be reused"
    );
}
