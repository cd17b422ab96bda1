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

//! Shared ECS resources
//!
//! The embedding binary builds these from its configuration and inserts
//! them before the core plugin's systems start running.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::persist::StateStore;
use crate::price_store::PriceStore;
use crate::traits::{DeviceSink, PriceProvider};

/// Engine configuration: paths, sync timing and schedule instances
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Directory holding the cached price files
    #[serde(default = "default_price_dir")]
    pub price_dir: PathBuf,
    /// Directory holding persisted schedule state
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Seconds between price cache checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Minimum seconds between provider fetch attempts
    #[serde(default = "default_fetch_spacing_secs")]
    pub fetch_spacing_secs: u64,
    /// Local hour after which tomorrow's prices may be published
    #[serde(default = "default_publish_hour")]
    pub publish_hour: u32,
    #[serde(default = "default_publish_minute")]
    pub publish_minute: u32,
    #[serde(default)]
    pub periodic_schedules: Vec<PeriodicScheduleSetup>,
    #[serde(default)]
    pub fixed_schedules: Vec<FixedScheduleSetup>,
}

fn default_price_dir() -> PathBuf {
    PathBuf::from("data/price_lists")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("data/state")
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_fetch_spacing_secs() -> u64 {
    900
}

fn default_publish_hour() -> u32 {
    15
}

fn default_publish_minute() -> u32 {
    55
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            price_dir: default_price_dir(),
            state_dir: default_state_dir(),
            poll_interval_secs: default_poll_interval_secs(),
            fetch_spacing_secs: default_fetch_spacing_secs(),
            publish_hour: default_publish_hour(),
            publish_minute: default_publish_minute(),
            periodic_schedules: Vec::new(),
            fixed_schedules: Vec::new(),
        }
    }
}

/// One configured periodic schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicScheduleSetup {
    pub name: String,
    /// Device sinks to drive, by registry name
    #[serde(default)]
    pub devices: Vec<String>,
    /// Attach a daily price-driven planner
    #[serde(default)]
    pub auto_plan: Option<AutoPlanSetup>,
}

/// Initial planner tuning for a periodic schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPlanSetup {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_max_total_cost")]
    pub max_total_cost: f32,
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
    #[serde(default = "default_min_slots")]
    pub min_slots: usize,
    #[serde(default = "default_calc_hour")]
    pub calc_hour: u32,
    #[serde(default = "default_calc_minute")]
    pub calc_minute: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_window_size() -> usize {
    24
}

fn default_max_total_cost() -> f32 {
    300.0
}

fn default_max_slots() -> usize {
    20
}

fn default_min_slots() -> usize {
    8
}

fn default_calc_hour() -> u32 {
    16
}

fn default_calc_minute() -> u32 {
    50
}

fn default_enabled() -> bool {
    true
}

impl Default for AutoPlanSetup {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            max_total_cost: default_max_total_cost(),
            max_slots: default_max_slots(),
            min_slots: default_min_slots(),
            calc_hour: default_calc_hour(),
            calc_minute: default_calc_minute(),
            enabled: default_enabled(),
        }
    }
}

/// One configured fixed-time schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedScheduleSetup {
    pub name: String,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default = "default_hour_on")]
    pub hour_on: u32,
    #[serde(default = "default_minute_on")]
    pub minute_on: u32,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default = "default_enabled")]
    pub repeat_daily: bool,
    #[serde(default)]
    pub enabled: bool,
}

fn default_hour_on() -> u32 {
    6
}

fn default_minute_on() -> u32 {
    45
}

fn default_duration_minutes() -> u32 {
    15
}

impl Default for FixedScheduleSetup {
    fn default() -> Self {
        Self {
            name: String::new(),
            devices: Vec::new(),
            hour_on: default_hour_on(),
            minute_on: default_minute_on(),
            duration_minutes: default_duration_minutes(),
            repeat_daily: default_enabled(),
            enabled: false,
        }
    }
}

/// Shared price table cache
#[derive(Resource, Clone)]
pub struct PriceStoreResource(pub PriceStore);

/// Shared schedule state persistence
#[derive(Resource, Clone)]
pub struct StateStoreResource(pub StateStore);

/// The configured day-ahead price source
#[derive(Resource, Clone)]
pub struct PriceProviderResource(pub Arc<dyn PriceProvider>);

/// Device sinks by name, as wired up at startup
#[derive(Resource, Default)]
pub struct DeviceSinkRegistry {
    sinks: HashMap<String, Arc<dyn DeviceSink>>,
}

impl DeviceSinkRegistry {
    pub fn insert(&mut self, sink: Arc<dyn DeviceSink>) {
        self.sinks.insert(sink.name().to_string(), sink);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DeviceSink>> {
        self.sinks.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
