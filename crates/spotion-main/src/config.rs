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

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use spotion_core::resources::{
    AutoPlanSetup, FixedScheduleSetup, PeriodicScheduleSetup, SchedulerConfig,
};
use spotion_types::PERIODS_PER_DAY;

/// Main application configuration - SpotION
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Day-ahead price provider
    pub provider: ProviderConfig,

    /// Price and state file locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Price cache polling and provider fetch timing
    #[serde(default)]
    pub sync: SyncConfig,

    /// Host loop settings
    #[serde(default)]
    pub system: SystemConfig,

    /// Configured schedule instances
    #[serde(default)]
    pub schedules: SchedulesConfig,
}

/// Day-ahead price provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the day-ahead price endpoint
    pub endpoint: String,

    /// Request timeout (seconds)
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_timeout_secs() -> u64 {
    30
}

/// File locations for the price cache and persisted schedule state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one price file per cached day
    pub price_dir: String,

    /// Directory holding per-schedule state files
    pub state_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            price_dir: "data/price_lists".to_string(),
            state_dir: "data/state".to_string(),
        }
    }
}

/// Price synchronization timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between price cache checks
    pub poll_interval_secs: u64,

    /// Minimum seconds between provider fetch attempts
    pub fetch_spacing_secs: u64,

    /// Local time after which tomorrow's list may be published
    pub publish_hour: u32,
    pub publish_minute: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            fetch_spacing_secs: 900,
            publish_hour: 15,
            publish_minute: 55,
        }
    }
}

/// Host loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// ECS tick interval (milliseconds)
    pub tick_interval_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

/// Configured schedule instances
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchedulesConfig {
    #[serde(default)]
    pub periodic: Vec<PeriodicConfig>,
    #[serde(default)]
    pub fixed: Vec<FixedConfig>,
}

/// One two-day on/off schedule, optionally driven by a price planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicConfig {
    /// Schedule name, also the key of its state file
    pub name: String,

    /// Devices to drive, by sink name
    #[serde(default)]
    pub devices: Vec<String>,

    /// Attach a daily price-driven planner
    #[serde(default)]
    pub auto_plan: Option<AutoPlanConfig>,
}

/// Planner tuning for a periodic schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPlanConfig {
    /// Sub-window length in periods (day divides into window_size chunks)
    pub window_size: usize,

    /// Cost ceiling per sub-window
    pub max_total_cost: f32,

    /// Most slots the planner may switch on per sub-window
    pub max_slots: usize,

    /// Fewest slots the planner keeps on per sub-window
    pub min_slots: usize,

    /// Local time of the daily planning run
    pub calc_hour: u32,
    pub calc_minute: u32,

    pub enabled: bool,
}

impl Default for AutoPlanConfig {
    fn default() -> Self {
        Self {
            window_size: 24,
            max_total_cost: 300.0,
            max_slots: 20,
            min_slots: 8,
            calc_hour: 16,
            calc_minute: 50,
            enabled: true,
        }
    }
}

/// One fixed-time daily schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedConfig {
    /// Schedule name, also the key of its state file
    pub name: String,

    /// Devices to drive, by sink name
    #[serde(default)]
    pub devices: Vec<String>,

    /// Local switch-on time
    #[serde(default = "default_hour_on")]
    pub hour_on: u32,
    #[serde(default = "default_minute_on")]
    pub minute_on: u32,

    /// Run length in whole minutes
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    /// Fire every day instead of a single shot
    #[serde(default = "default_repeat_daily")]
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

fn default_repeat_daily() -> bool {
    true
}

impl Default for AppConfig {
    /// Default configuration: one auto-planned water heater schedule
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                endpoint: "http://marketdata.local:8400".to_string(),
                timeout_secs: default_provider_timeout_secs(),
            },
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
            system: SystemConfig::default(),
            schedules: SchedulesConfig {
                periodic: vec![PeriodicConfig {
                    name: "water_heater".to_string(),
                    devices: vec!["plug_1".to_string()],
                    auto_plan: Some(AutoPlanConfig::default()),
                }],
                fixed: Vec::new(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from an explicit path or the working directory
    pub fn load() -> Result<Self> {
        // Explicit config path wins (SPOTION_CONFIG env var)
        if let Ok(path) = std::env::var("SPOTION_CONFIG") {
            let config_str = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {path}"))?;
            let config: AppConfig = if path.ends_with(".json") {
                serde_json::from_str(&config_str)
                    .with_context(|| format!("Failed to parse {path}"))?
            } else {
                toml::from_str(&config_str).with_context(|| format!("Failed to parse {path}"))?
            };
            info!("✅ Loaded configuration from {}", path);
            config.validate()?;
            return Ok(config);
        }

        // Try config.toml for development
        if let Ok(config_str) = std::fs::read_to_string("config.toml") {
            let config: AppConfig =
                toml::from_str(&config_str).context("Failed to parse config.toml")?;
            info!("✅ Loaded configuration from config.toml");
            config.validate()?;
            return Ok(config);
        }

        // Try config.json for development
        if let Ok(config_str) = std::fs::read_to_string("config.json") {
            let config: AppConfig =
                serde_json::from_str(&config_str).context("Failed to parse config.json")?;
            info!("✅ Loaded configuration from config.json");
            config.validate()?;
            return Ok(config);
        }

        // Fall back to defaults with environment variable overrides
        warn!("No configuration file found, using defaults with environment overrides");
        let config = Self::from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables (development/testing)
    fn from_env() -> Self {
        let mut config = Self::default();

        // Override provider endpoint
        if let Ok(endpoint) = std::env::var("PRICE_ENDPOINT") {
            config.provider.endpoint = endpoint;
        }

        // Override file locations
        if let Ok(dir) = std::env::var("PRICE_DIR") {
            config.storage.price_dir = dir;
        }
        if let Ok(dir) = std::env::var("STATE_DIR") {
            config.storage.state_dir = dir;
        }

        // Override poll interval
        if let Ok(interval) = std::env::var("POLL_INTERVAL_SECS")
            && let Ok(secs) = interval.parse::<u64>()
        {
            config.sync.poll_interval_secs = secs;
        }

        // Override tick interval
        if let Ok(interval) = std::env::var("TICK_INTERVAL_MS")
            && let Ok(ms) = interval.parse::<u64>()
        {
            config.system.tick_interval_ms = ms;
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Validate provider
        if self.provider.endpoint.is_empty() {
            anyhow::bail!("provider.endpoint cannot be empty");
        }
        if self.provider.timeout_secs == 0 {
            anyhow::bail!("provider.timeout_secs must be at least 1 second");
        }

        // Validate storage locations
        if self.storage.price_dir.is_empty() {
            anyhow::bail!("storage.price_dir cannot be empty");
        }
        if self.storage.state_dir.is_empty() {
            anyhow::bail!("storage.state_dir cannot be empty");
        }

        // Validate sync timing
        if self.sync.poll_interval_secs == 0 {
            anyhow::bail!("sync.poll_interval_secs must be at least 1 second");
        }
        if self.sync.poll_interval_secs > 600 {
            warn!(
                "sync.poll_interval_secs is very high ({}s), consider reducing",
                self.sync.poll_interval_secs
            );
        }
        if self.sync.publish_hour > 23 || self.sync.publish_minute > 59 {
            anyhow::bail!(
                "sync publish time {:02}:{:02} is not a valid time of day",
                self.sync.publish_hour,
                self.sync.publish_minute
            );
        }
        if self.sync.fetch_spacing_secs < self.sync.poll_interval_secs {
            warn!(
                "sync.fetch_spacing_secs ({}) is below the poll interval, provider may be hit on every poll",
                self.sync.fetch_spacing_secs
            );
        }

        // Validate host loop
        if self.system.tick_interval_ms == 0 {
            anyhow::bail!("system.tick_interval_ms must be at least 1 millisecond");
        }

        // Schedule names key the state files, so they must be unique
        let mut names: Vec<&str> = Vec::new();
        for schedule in &self.schedules.periodic {
            if schedule.name.is_empty() {
                anyhow::bail!("Periodic schedule has empty name");
            }
            if names.contains(&schedule.name.as_str()) {
                anyhow::bail!("Duplicate schedule name: '{}'", schedule.name);
            }
            names.push(schedule.name.as_str());

            if let Some(plan) = &schedule.auto_plan {
                if plan.window_size == 0 || plan.window_size > PERIODS_PER_DAY {
                    anyhow::bail!(
                        "Schedule '{}': auto_plan.window_size must be between 1 and {}, got {}",
                        schedule.name,
                        PERIODS_PER_DAY,
                        plan.window_size
                    );
                }
                if plan.min_slots == 0 {
                    anyhow::bail!(
                        "Schedule '{}': auto_plan.min_slots must be at least 1",
                        schedule.name
                    );
                }
                if plan.min_slots > plan.max_slots {
                    anyhow::bail!(
                        "Schedule '{}': auto_plan.min_slots ({}) exceeds max_slots ({})",
                        schedule.name,
                        plan.min_slots,
                        plan.max_slots
                    );
                }
                if plan.max_slots > plan.window_size {
                    anyhow::bail!(
                        "Schedule '{}': auto_plan.max_slots ({}) exceeds window_size ({})",
                        schedule.name,
                        plan.max_slots,
                        plan.window_size
                    );
                }
                if plan.calc_hour > 23 || plan.calc_minute > 59 {
                    anyhow::bail!(
                        "Schedule '{}': auto_plan time {:02}:{:02} is not a valid time of day",
                        schedule.name,
                        plan.calc_hour,
                        plan.calc_minute
                    );
                }
            }
        }
        for schedule in &self.schedules.fixed {
            if schedule.name.is_empty() {
                anyhow::bail!("Fixed schedule has empty name");
            }
            if names.contains(&schedule.name.as_str()) {
                anyhow::bail!("Duplicate schedule name: '{}'", schedule.name);
            }
            names.push(schedule.name.as_str());

            if schedule.hour_on > 23 || schedule.minute_on > 59 {
                anyhow::bail!(
                    "Schedule '{}': switch-on time {:02}:{:02} is not a valid time of day",
                    schedule.name,
                    schedule.hour_on,
                    schedule.minute_on
                );
            }
            if schedule.duration_minutes == 0 {
                anyhow::bail!(
                    "Schedule '{}': duration_minutes must be at least 1",
                    schedule.name
                );
            }
        }

        Ok(())
    }

    /// Every device name referenced by a schedule, deduplicated
    pub fn device_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let periodic_devices = self.schedules.periodic.iter().flat_map(|s| &s.devices);
        let fixed_devices = self.schedules.fixed.iter().flat_map(|s| &s.devices);
        for device in periodic_devices.chain(fixed_devices) {
            if !names.contains(device) {
                names.push(device.clone());
            }
        }
        names
    }

    /// Save current configuration to file
    ///
    /// Currently used in tests to verify serialization/deserialization
    #[allow(dead_code)]
    pub fn save(&self, path: &str) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        info!("Configuration saved to {}", path);
        Ok(())
    }

    /// Get ECS tick interval as Duration
    #[allow(dead_code)]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.system.tick_interval_ms)
    }
}

/// Convert AppConfig to the engine's SchedulerConfig resource
impl From<AppConfig> for SchedulerConfig {
    fn from(app_config: AppConfig) -> Self {
        SchedulerConfig {
            price_dir: PathBuf::from(app_config.storage.price_dir),
            state_dir: PathBuf::from(app_config.storage.state_dir),
            poll_interval_secs: app_config.sync.poll_interval_secs,
            fetch_spacing_secs: app_config.sync.fetch_spacing_secs,
            publish_hour: app_config.sync.publish_hour,
            publish_minute: app_config.sync.publish_minute,
            periodic_schedules: app_config
                .schedules
                .periodic
                .iter()
                .map(|schedule| PeriodicScheduleSetup {
                    name: schedule.name.clone(),
                    devices: schedule.devices.clone(),
                    auto_plan: schedule.auto_plan.as_ref().map(|plan| AutoPlanSetup {
                        window_size: plan.window_size,
                        max_total_cost: plan.max_total_cost,
                        max_slots: plan.max_slots,
                        min_slots: plan.min_slots,
                        calc_hour: plan.calc_hour,
                        calc_minute: plan.calc_minute,
                        enabled: plan.enabled,
                    }),
                })
                .collect(),
            fixed_schedules: app_config
                .schedules
                .fixed
                .iter()
                .map(|schedule| FixedScheduleSetup {
                    name: schedule.name.clone(),
                    devices: schedule.devices.clone(),
                    hour_on: schedule.hour_on,
                    minute_on: schedule.minute_on,
                    duration_minutes: schedule.duration_minutes,
                    repeat_daily: schedule.repeat_daily,
                    enabled: schedule.enabled,
                })
                .collect(),
        }
    }
}
