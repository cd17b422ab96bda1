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

// Test: a provider delivery travels the whole path into the cache
// Scenario: fetch result -> channel -> poll system -> price files -> notifications
// The 96 provider prices must split 92/4 across the local day boundary

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bevy_app::App;
use bevy_ecs::message::Messages;
use bevy_ecs::system::RunSystemOnce;
use chrono::{Local, NaiveDate, NaiveTime};

use spotion_core::async_systems::{
    PriceFetchSender, poll_price_fetch_results, request_price_fetch, setup_price_fetch_channel,
};
use spotion_core::messages::{NewPricesAvailable, PricesChanged};
use spotion_core::storage::MemoryPriceStorage;
use spotion_core::traits::{PriceProvider, ProviderDayPrices, ProviderError};
use spotion_core::{PriceStore, PriceStoreResource, PriceSync};
use spotion_types::PERIODS_PER_DAY;

struct StaticProvider {
    payload: ProviderDayPrices,
}

#[async_trait]
impl PriceProvider for StaticProvider {
    async fn fetch_day_ahead(&self) -> Result<ProviderDayPrices, ProviderError> {
        Ok(self.payload.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

fn test_app() -> App {
    let mut app = App::new();
    app.add_message::<PricesChanged>();
    app.add_message::<NewPricesAvailable>();
    app.insert_resource(PriceStoreResource(PriceStore::new(Arc::new(
        MemoryPriceStorage::new(),
    ))));
    app.insert_resource(PriceSync::new(
        Duration::from_secs(900),
        NaiveTime::from_hms_opt(15, 55, 0).unwrap(),
    ));
    app.world_mut()
        .run_system_once(setup_price_fetch_channel)
        .expect("Failed to set up fetch channel");
    app
}

fn ramp_payload(date: NaiveDate) -> ProviderDayPrices {
    ProviderDayPrices {
        date,
        prices: (0..PERIODS_PER_DAY).map(|i| i as f32 * 0.5).collect(),
    }
}

#[test]
fn test_delivery_lands_in_cache_and_notifies() {
    let mut app = test_app();
    let today = Local::now().date_naive();
    let tomorrow = today.succ_opt().unwrap();
    let day_after = tomorrow.succ_opt().unwrap();

    let sender = app.world().resource::<PriceFetchSender>().clone();
    sender.0.send(Ok(ramp_payload(tomorrow))).unwrap();

    app.world_mut()
        .run_system_once(poll_price_fetch_results)
        .expect("Failed to run poll system");

    println!("\n=== Delivery for {tomorrow} ===");
    let store = &app.world().resource::<PriceStoreResource>().0;
    let nominal = store.read(tomorrow);
    let sliver = store.read(day_after);
    println!(
        "Nominal day: {} periods, sliver day: {} periods",
        nominal.period_count(),
        sliver.period_count()
    );

    // First 92 provider prices fill the nominal date from period 4
    assert_eq!(nominal.period_count(), 92);
    assert_eq!(nominal.price(3), None);
    assert_eq!(nominal.price(4), Some(0.0));
    assert_eq!(nominal.price(95), Some(45.5));

    // Last 4 become the early morning of the day after
    assert_eq!(sliver.period_count(), 4);
    assert_eq!(sliver.price(0), Some(46.0));
    assert_eq!(sliver.price(3), Some(47.5));
    assert_eq!(sliver.price(4), None);

    assert!(
        app.world().resource::<PriceSync>().tomorrow_available(),
        "Sync should consider tomorrow covered after the delivery"
    );
    assert!(!app.world().resource::<Messages<PricesChanged>>().is_empty());
    assert!(
        !app.world()
            .resource::<Messages<NewPricesAvailable>>()
            .is_empty()
    );
}

#[test]
fn test_unpublished_day_leaves_cache_untouched() {
    let mut app = test_app();
    let tomorrow = Local::now().date_naive().succ_opt().unwrap();

    let sender = app.world().resource::<PriceFetchSender>().clone();
    sender.0.send(Err(ProviderError::NotYetPublished)).unwrap();

    app.world_mut()
        .run_system_once(poll_price_fetch_results)
        .expect("Failed to run poll system");

    let store = &app.world().resource::<PriceStoreResource>().0;
    assert!(store.read(tomorrow).is_empty());
    assert!(!app.world().resource::<PriceSync>().tomorrow_available());
    assert!(
        app.world()
            .resource::<Messages<NewPricesAvailable>>()
            .is_empty(),
        "An unpublished day must not announce new prices"
    );
}

#[test]
fn test_short_delivery_is_rejected() {
    let mut app = test_app();
    let tomorrow = Local::now().date_naive().succ_opt().unwrap();

    let sender = app.world().resource::<PriceFetchSender>().clone();
    sender
        .0
        .send(Ok(ProviderDayPrices {
            date: tomorrow,
            prices: vec![1.0; 24],
        }))
        .unwrap();

    app.world_mut()
        .run_system_once(poll_price_fetch_results)
        .expect("Failed to run poll system");

    let store = &app.world().resource::<PriceStoreResource>().0;
    assert!(store.read(tomorrow).is_empty());
    assert!(!app.world().resource::<PriceSync>().tomorrow_available());
}

#[tokio::test]
async fn test_provider_task_feeds_the_poll_loop() {
    let mut app = test_app();
    let today = Local::now().date_naive();
    let tomorrow = today.succ_opt().unwrap();

    let provider: Arc<dyn PriceProvider> = Arc::new(StaticProvider {
        payload: ramp_payload(tomorrow),
    });
    let sender = app.world().resource::<PriceFetchSender>().clone();
    request_price_fetch(provider, sender.0);

    // The fetch runs as a tokio task; poll until its result drains
    let mut cached = 0;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        app.world_mut()
            .run_system_once(poll_price_fetch_results)
            .expect("Failed to run poll system");
        cached = app
            .world()
            .resource::<PriceStoreResource>()
            .0
            .read(tomorrow)
            .period_count();
        if cached > 0 {
            break;
        }
    }

    println!("=== Task delivery cached {cached} periods ===");
    assert_eq!(cached, 92, "Expected the nominal day in the cache");
    assert!(app.world().resource::<PriceSync>().tomorrow_available());
}
