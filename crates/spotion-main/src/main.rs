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

mod config;

use anyhow::{Context, Result};
use bevy_app::{ScheduleRunnerPlugin, TaskPoolPlugin, prelude::*};
use chrono::NaiveTime;
use std::{fs, sync::Arc, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use spotion_adapters::{HttpPriceProvider, LoggingDeviceSink};
use spotion_core::{
    DeviceSinkRegistry, PriceProviderResource, PriceStore, PriceStoreResource, PriceSync,
    SpotionCorePlugin, StateStore, StateStoreResource, storage::FsPriceStorage,
    traits::PriceProvider,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    // Handle command line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                println!("SpotION - Price-Aware Appliance Scheduling");
                println!("Version: {VERSION}");
                println!();
                println!("Usage: spotion [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help    Print this help message");
                println!("  -v, --version Print version");
                return Ok(());
            }
            "--version" | "-v" => {
                println!("{VERSION}");
                return Ok(());
            }
            _ => {
                // Continue to normal execution for other args or no args
            }
        }
    }

    // Create tokio runtime for async HTTP operations
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    // Run Bevy app in a blocking task so tokio can keep running async tasks
    runtime.block_on(async {
        tokio::task::spawn_blocking(initialize_and_run)
            .await
            .expect("Bevy task panicked")
    })
}

fn initialize_and_run() -> Result<()> {
    // Initialize tracing with env filter support
    // Respects RUST_LOG environment variable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // Load configuration
    let config = config::AppConfig::load()?;

    info!("🚀 Starting SpotION - Price-Aware Appliance Scheduling");
    info!("📋 Configuration Summary:");
    info!("   Price endpoint: {}", config.provider.endpoint);
    info!("   Price cache: {}", config.storage.price_dir);
    info!("   State files: {}", config.storage.state_dir);
    info!("   Poll interval: {}s", config.sync.poll_interval_secs);
    info!(
        "   Publish cutoff: {:02}:{:02}, fetch spacing {}s",
        config.sync.publish_hour, config.sync.publish_minute, config.sync.fetch_spacing_secs
    );
    info!(
        "   Periodic schedules: {}",
        config.schedules.periodic.len()
    );
    for schedule in &config.schedules.periodic {
        info!(
            "     - {} ({} devices, auto plan: {})",
            schedule.name,
            schedule.devices.len(),
            schedule
                .auto_plan
                .as_ref()
                .map(|plan| if plan.enabled { "on" } else { "off" })
                .unwrap_or("none")
        );
    }
    info!("   Fixed schedules: {}", config.schedules.fixed.len());
    for schedule in &config.schedules.fixed {
        info!(
            "     - {} at {:02}:{:02} for {}min ({} devices, enabled: {})",
            schedule.name,
            schedule.hour_on,
            schedule.minute_on,
            schedule.duration_minutes,
            schedule.devices.len(),
            schedule.enabled
        );
    }

    // Price files land here, the storage backend expects the directory to exist
    fs::create_dir_all(&config.storage.price_dir).with_context(|| {
        format!(
            "Failed to create price directory: {}",
            config.storage.price_dir
        )
    })?;

    let price_store = PriceStore::new(Arc::new(FsPriceStorage::new(&config.storage.price_dir)));
    let state_store = StateStore::new(&config.storage.state_dir);

    // Create the day-ahead price provider
    let provider: Arc<dyn PriceProvider> = Arc::new(HttpPriceProvider::with_timeout(
        &config.provider.endpoint,
        Duration::from_secs(config.provider.timeout_secs),
    )?);
    info!("💰 Price provider: {}", provider.name());

    // Register a sink per configured device
    let mut sinks = DeviceSinkRegistry::default();
    for name in config.device_names() {
        info!("🔌 Registering device sink: {}", name);
        sinks.insert(Arc::new(LoggingDeviceSink::new(name)));
    }
    if sinks.is_empty() {
        warn!("⚠️ No devices configured, schedules will compute but drive nothing");
    }

    let publish_time =
        NaiveTime::from_hms_opt(config.sync.publish_hour, config.sync.publish_minute, 0)
            .context("Invalid publish time")?;
    let price_sync = PriceSync::new(
        Duration::from_secs(config.sync.fetch_spacing_secs),
        publish_time,
    );

    // Convert AppConfig to SchedulerConfig for ECS
    let scheduler_config = spotion_core::SchedulerConfig::from(config.clone());

    // Create Bevy app with full configuration
    info!("🎮 Starting ECS application...");

    let mut app = App::new();
    app
        // Add TaskPoolPlugin to initialize async task pools
        .add_plugins(TaskPoolPlugin::default())
        // Add ScheduleRunnerPlugin for headless operation
        .add_plugins(ScheduleRunnerPlugin::run_loop(Duration::from_millis(
            config.system.tick_interval_ms,
        )))
        .add_plugins(SpotionCorePlugin)
        .insert_resource(scheduler_config)
        .insert_resource(price_sync)
        .insert_resource(PriceStoreResource(price_store))
        .insert_resource(StateStoreResource(state_store))
        .insert_resource(PriceProviderResource(provider))
        .insert_resource(sinks);

    info!("✅ Starting main loop...");

    // Run the app with Bevy's built-in runner
    // This properly handles all schedules (Startup, Update, etc.)
    app.run();

    Ok(())
}
