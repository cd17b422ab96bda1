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

//! Off-thread provider fetches
//!
//! Provider calls run as tokio tasks so a slow or hung fetch never
//! stalls the tick loop. Results come back over a bounded channel that
//! the ECS side drains once per frame.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use chrono::Local;
use crossbeam_channel::{Receiver, Sender};
use tracing::{info, warn};

use crate::messages::{NewPricesAvailable, PricesChanged};
use crate::resources::PriceStoreResource;
use crate::sync::PriceSync;
use crate::traits::{PriceProvider, ProviderDayPrices, ProviderError};

pub type FetchOutcome = Result<ProviderDayPrices, ProviderError>;

/// Marker for the entity holding the fetch result channel
#[derive(Component)]
pub struct PriceFetcher;

/// Receiving end of the fetch result channel
#[derive(Component)]
pub struct PriceFetchChannel {
    pub receiver: Receiver<FetchOutcome>,
}

/// Sender cloned into every fetch task
#[derive(Resource, Clone)]
pub struct PriceFetchSender(pub Sender<FetchOutcome>);

/// Create the fetch channel endpoints (Startup)
pub fn setup_price_fetch_channel(mut commands: Commands) {
    let (sender, receiver) = crossbeam_channel::bounded(10);
    commands.spawn((PriceFetcher, PriceFetchChannel { receiver }));
    commands.insert_resource(PriceFetchSender(sender));
}

/// Start one provider fetch on the runtime
pub fn request_price_fetch(provider: Arc<dyn PriceProvider>, sender: Sender<FetchOutcome>) {
    info!("💰 Requesting day-ahead prices from {}", provider.name());
    tokio::spawn(async move {
        let outcome = provider.fetch_day_ahead().await;
        if sender.try_send(outcome).is_err() {
            warn!("⚠️ Fetch result channel full, dropping a result");
        }
    });
}

/// Drain fetch results into the cache (Update)
pub fn poll_price_fetch_results(
    channel: Query<&PriceFetchChannel, With<PriceFetcher>>,
    mut sync: ResMut<PriceSync>,
    store: Res<PriceStoreResource>,
    mut prices_changed: MessageWriter<PricesChanged>,
    mut new_prices: MessageWriter<NewPricesAvailable>,
) {
    let Ok(channel) = channel.single() else {
        return;
    };
    while let Ok(outcome) = channel.receiver.try_recv() {
        match outcome {
            Ok(payload) => {
                let today = Local::now().date_naive();
                if sync.apply_fetch(&store.0, today, &payload) {
                    prices_changed.write(PricesChanged);
                    new_prices.write(NewPricesAvailable);
                }
            }
            Err(ProviderError::NotYetPublished) => {
                info!("💤 Day-ahead prices are not published yet");
            }
            Err(e) => {
                warn!("⚠️ Price fetch failed: {}", e);
            }
        }
    }
}
