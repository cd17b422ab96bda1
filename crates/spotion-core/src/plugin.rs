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

//! Core plugin wiring

use bevy_app::{App, Plugin, Startup, Update};
use bevy_ecs::prelude::*;

use crate::async_systems;
use crate::messages::{
    DeviceAssociated, NewPricesAvailable, PeriodChanged, PricesChanged, ScheduleChanged,
};
use crate::schedules;
use crate::sync::{self, PriceSync, SyncPollTicker};

/// Registers the scheduling engine
///
/// The embedding binary inserts the configured [`crate::resources::SchedulerConfig`],
/// [`crate::resources::PriceStoreResource`], [`crate::resources::StateStoreResource`],
/// [`crate::resources::PriceProviderResource`] and
/// [`crate::resources::DeviceSinkRegistry`] before adding this plugin.
pub struct SpotionCorePlugin;

impl Plugin for SpotionCorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PriceSync>()
            .init_resource::<SyncPollTicker>()
            .add_message::<PricesChanged>()
            .add_message::<NewPricesAvailable>()
            .add_message::<ScheduleChanged>()
            .add_message::<PeriodChanged>()
            .add_message::<DeviceAssociated>()
            .add_systems(
                Startup,
                (
                    async_systems::setup_price_fetch_channel,
                    schedules::initialize_schedules_system,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    sync::price_sync_system,
                    async_systems::poll_price_fetch_results,
                    schedules::periodic_schedule_system,
                    schedules::fixed_schedule_system,
                    schedules::auto_plan_system,
                    schedules::log_price_notifications_system,
                ),
            );
    }
}
