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

//! Price cache synchronization
//!
//! Watches the local date and keeps tomorrow's prices coming: prune on
//! rollover, check the cache after the publish time, and fall back to a
//! provider fetch, rate limited on the monotonic clock.

use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use chrono::{Local, NaiveDate, NaiveTime};
use spotion_types::PERIODS_PER_DAY;
use tracing::{info, warn};

use crate::async_systems::{PriceFetchSender, request_price_fetch};
use crate::messages::PricesChanged;
use crate::price_store::PriceStore;
use crate::resources::{PriceProviderResource, PriceStoreResource, SchedulerConfig};
use crate::traits::ProviderDayPrices;

/// Periods by which the provider day boundary trails local midnight
pub const PROVIDER_OFFSET_PERIODS: usize = 4;

/// Default local time after which tomorrow's prices may be published
pub const DEFAULT_PUBLISH_HOUR: u32 = 15;
pub const DEFAULT_PUBLISH_MINUTE: u32 = 55;

/// Default minimum spacing between provider fetch attempts
pub const DEFAULT_FETCH_SPACING: Duration = Duration::from_secs(900);

/// Outcome of one tomorrow-acquisition check
#[derive(Debug, PartialEq, Eq)]
pub enum TomorrowCheck {
    /// Nothing to do: already available, or the publish window is not
    /// open yet
    Idle,
    /// Tomorrow's prices were already sitting in the cache
    FoundInStore,
    /// Too soon after the previous fetch attempt
    RateLimited,
    /// A provider fetch should start now
    FetchDue,
}

/// Synchronizer state
///
/// All clock inputs come in as parameters, so the whole decision chain
/// runs deterministically under test.
#[derive(Resource)]
pub struct PriceSync {
    last_seen_date: Option<NaiveDate>,
    tomorrow_available: bool,
    last_fetch_attempt: Option<Instant>,
    fetch_spacing: Duration,
    publish_time: NaiveTime,
    offset_periods: usize,
}

impl Default for PriceSync {
    fn default() -> Self {
        let publish_time = NaiveTime::from_hms_opt(DEFAULT_PUBLISH_HOUR, DEFAULT_PUBLISH_MINUTE, 0)
            .unwrap_or_default();
        Self::new(DEFAULT_FETCH_SPACING, publish_time)
    }
}

impl PriceSync {
    pub fn new(fetch_spacing: Duration, publish_time: NaiveTime) -> Self {
        Self {
            last_seen_date: None,
            tomorrow_available: false,
            last_fetch_attempt: None,
            fetch_spacing,
            publish_time,
            offset_periods: PROVIDER_OFFSET_PERIODS,
        }
    }

    /// Whether tomorrow's prices are known to be complete
    pub fn tomorrow_available(&self) -> bool {
        self.tomorrow_available
    }

    /// Date bookkeeping for one tick
    ///
    /// On the first call and on every change of the local date this
    /// prunes the cache and reports true, telling listeners to re-read
    /// their price picture.
    pub fn check_new_day(&mut self, store: &PriceStore, today: NaiveDate) -> bool {
        if self.last_seen_date == Some(today) {
            return false;
        }
        if let Some(previous) = self.last_seen_date {
            info!("🌙 Day rolled over from {} to {}", previous, today);
            self.tomorrow_available = false;
        }
        store.prune(today);
        self.last_seen_date = Some(today);
        true
    }

    /// Decide the next step toward having tomorrow's prices
    pub fn check_tomorrow(
        &mut self,
        store: &PriceStore,
        today: NaiveDate,
        now: NaiveTime,
        mono_now: Instant,
    ) -> TomorrowCheck {
        if self.tomorrow_available {
            return TomorrowCheck::Idle;
        }
        if now < self.publish_time {
            return TomorrowCheck::Idle;
        }
        let Some(tomorrow) = today.succ_opt() else {
            return TomorrowCheck::Idle;
        };

        // The last few periods of tomorrow arrive with the day after,
        // so a complete nominal delivery covers all but the offset
        let needed = PERIODS_PER_DAY - self.offset_periods;
        if store.read(tomorrow).period_count() >= needed {
            info!("📊 Tomorrow's prices found in the cache");
            self.tomorrow_available = true;
            return TomorrowCheck::FoundInStore;
        }

        if let Some(last) = self.last_fetch_attempt
            && mono_now.duration_since(last) < self.fetch_spacing
        {
            return TomorrowCheck::RateLimited;
        }
        self.last_fetch_attempt = Some(mono_now);
        TomorrowCheck::FetchDue
    }

    /// Fold a delivered provider day into the cache
    ///
    /// The first 92 prices land on the nominal date from period 4, the
    /// last 4 become periods 0-3 of the day after. Reports whether the
    /// delivery was usable.
    pub fn apply_fetch(
        &mut self,
        store: &PriceStore,
        today: NaiveDate,
        payload: &ProviderDayPrices,
    ) -> bool {
        if payload.prices.len() != PERIODS_PER_DAY {
            warn!(
                "⚠️ Provider delivered {} prices for {}, expected {}",
                payload.prices.len(),
                payload.date,
                PERIODS_PER_DAY
            );
            return false;
        }

        store.prune(today);
        // Before the full day lands, the nominal file may hold at most
        // the early-morning sliver from the previous delivery
        store.validate(payload.date, self.offset_periods);

        let split = PERIODS_PER_DAY - self.offset_periods;
        let nominal: Vec<(usize, f32)> = payload.prices[..split]
            .iter()
            .enumerate()
            .map(|(i, price)| (i + self.offset_periods, *price))
            .collect();
        store.write(payload.date, &nominal);

        if let Some(next_day) = payload.date.succ_opt() {
            let sliver: Vec<(usize, f32)> = payload.prices[split..]
                .iter()
                .enumerate()
                .map(|(i, price)| (i, *price))
                .collect();
            store.write(next_day, &sliver);
        }

        self.tomorrow_available = true;
        info!("✅ Stored provider prices for {}", payload.date);
        true
    }
}

/// Gate so the cache checks do not run every frame
#[derive(Resource, Default)]
pub struct SyncPollTicker(pub Option<Instant>);

/// Keep the two-day price picture current (Update)
pub fn price_sync_system(
    mut sync: ResMut<PriceSync>,
    mut ticker: ResMut<SyncPollTicker>,
    store: Res<PriceStoreResource>,
    provider: Option<Res<PriceProviderResource>>,
    sender: Option<Res<PriceFetchSender>>,
    config: Res<SchedulerConfig>,
    mut prices_changed: MessageWriter<PricesChanged>,
) {
    let mono_now = Instant::now();
    if let Some(last) = ticker.0
        && mono_now.duration_since(last) < Duration::from_secs(config.poll_interval_secs)
    {
        return;
    }
    ticker.0 = Some(mono_now);

    let now = Local::now();
    let today = now.date_naive();

    if sync.check_new_day(&store.0, today) {
        prices_changed.write(PricesChanged);
    }

    match sync.check_tomorrow(&store.0, today, now.time(), mono_now) {
        TomorrowCheck::FoundInStore => {
            prices_changed.write(PricesChanged);
        }
        TomorrowCheck::FetchDue => {
            let (Some(provider), Some(sender)) = (provider, sender) else {
                warn!("⚠️ No price provider wired up, cannot fetch tomorrow's prices");
                return;
            };
            request_price_fetch(provider.0.clone(), sender.0.clone());
        }
        TomorrowCheck::Idle | TomorrowCheck::RateLimited => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryPriceStorage;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn sync_under_test() -> (PriceSync, PriceStore) {
        let store = PriceStore::new(Arc::new(MemoryPriceStorage::new()));
        (PriceSync::default(), store)
    }

    fn full_payload(nominal: NaiveDate, price: f32) -> ProviderDayPrices {
        ProviderDayPrices {
            date: nominal,
            prices: vec![price; PERIODS_PER_DAY],
        }
    }

    #[test]
    fn test_first_tick_reports_a_fresh_day() {
        let (mut sync, store) = sync_under_test();
        let today = date(2025, 3, 10);

        assert!(sync.check_new_day(&store, today));
        assert!(!sync.check_new_day(&store, today));
        assert!(sync.check_new_day(&store, date(2025, 3, 11)));
    }

    #[test]
    fn test_rollover_resets_tomorrow_availability() {
        let (mut sync, store) = sync_under_test();
        let today = date(2025, 3, 10);
        sync.check_new_day(&store, today);
        sync.apply_fetch(&store, today, &full_payload(date(2025, 3, 11), 2.0));
        assert!(sync.tomorrow_available());

        sync.check_new_day(&store, date(2025, 3, 11));
        assert!(!sync.tomorrow_available());
    }

    #[test]
    fn test_no_check_before_publish_time() {
        let (mut sync, store) = sync_under_test();
        let today = date(2025, 3, 10);
        sync.check_new_day(&store, today);

        let check = sync.check_tomorrow(&store, today, time(15, 54), Instant::now());
        assert_eq!(check, TomorrowCheck::Idle);
    }

    #[test]
    fn test_cached_tomorrow_is_found_without_fetch() {
        let (mut sync, store) = sync_under_test();
        let today = date(2025, 3, 10);
        sync.check_new_day(&store, today);

        // 92 periods from period 4 is a complete nominal delivery
        let entries: Vec<(usize, f32)> = (4..PERIODS_PER_DAY).map(|p| (p, 1.0)).collect();
        store.write(date(2025, 3, 11), &entries);

        let check = sync.check_tomorrow(&store, today, time(16, 0), Instant::now());
        assert_eq!(check, TomorrowCheck::FoundInStore);
        assert!(sync.tomorrow_available());

        // Once available the checks go quiet
        let check = sync.check_tomorrow(&store, today, time(16, 5), Instant::now());
        assert_eq!(check, TomorrowCheck::Idle);
    }

    #[test]
    fn test_incomplete_cache_triggers_fetch() {
        let (mut sync, store) = sync_under_test();
        let today = date(2025, 3, 10);
        sync.check_new_day(&store, today);

        // Only the early-morning sliver is cached, not enough
        store.write(date(2025, 3, 11), &[(0, 1.0), (1, 1.0), (2, 1.0), (3, 1.0)]);

        let check = sync.check_tomorrow(&store, today, time(16, 0), Instant::now());
        assert_eq!(check, TomorrowCheck::FetchDue);
    }

    #[test]
    fn test_fetch_attempts_are_rate_limited() {
        let (mut sync, store) = sync_under_test();
        let today = date(2025, 3, 10);
        sync.check_new_day(&store, today);
        let t0 = Instant::now();

        assert_eq!(
            sync.check_tomorrow(&store, today, time(16, 0), t0),
            TomorrowCheck::FetchDue
        );
        assert_eq!(
            sync.check_tomorrow(&store, today, time(16, 5), t0 + Duration::from_secs(899)),
            TomorrowCheck::RateLimited
        );
        assert_eq!(
            sync.check_tomorrow(&store, today, time(16, 20), t0 + Duration::from_secs(900)),
            TomorrowCheck::FetchDue
        );
    }

    #[test]
    fn test_apply_fetch_splits_across_the_day_boundary() {
        let (mut sync, store) = sync_under_test();
        let today = date(2025, 3, 10);
        let tomorrow = date(2025, 3, 11);
        sync.check_new_day(&store, today);

        let mut prices = vec![1.0; PERIODS_PER_DAY];
        for price in &mut prices[92..] {
            *price = 9.0;
        }
        assert!(sync.apply_fetch(&store, today, &ProviderDayPrices {
            date: tomorrow,
            prices,
        }));

        let nominal = store.read(tomorrow);
        assert_eq!(nominal.period_count(), 92);
        assert_eq!(nominal.price(3), None);
        assert_eq!(nominal.price(4), Some(1.0));
        assert_eq!(nominal.price(95), Some(1.0));

        let day_after = store.read(date(2025, 3, 12));
        assert_eq!(day_after.period_count(), 4);
        assert_eq!(day_after.price(0), Some(9.0));
        assert_eq!(day_after.price(3), Some(9.0));
        assert_eq!(day_after.price(4), None);
    }

    #[test]
    fn test_sliver_completes_tomorrow_after_rollover() {
        let (mut sync, store) = sync_under_test();
        let first_day = date(2025, 3, 10);
        sync.check_new_day(&store, first_day);

        // Day one: fetch for March 11 leaves a sliver for March 12
        sync.apply_fetch(&store, first_day, &full_payload(date(2025, 3, 11), 1.0));
        // Day two: fetch for March 12 fills in the rest
        let second_day = date(2025, 3, 11);
        sync.check_new_day(&store, second_day);
        sync.apply_fetch(&store, second_day, &full_payload(date(2025, 3, 12), 2.0));

        let completed = store.read(date(2025, 3, 12));
        assert_eq!(completed.period_count(), PERIODS_PER_DAY);
        // The sliver from day one was written first and stays
        assert_eq!(completed.price(0), Some(1.0));
        assert_eq!(completed.price(4), Some(2.0));
    }

    #[test]
    fn test_apply_fetch_rejects_short_payload() {
        let (mut sync, store) = sync_under_test();
        let today = date(2025, 3, 10);
        let payload = ProviderDayPrices {
            date: date(2025, 3, 11),
            prices: vec![1.0; 24],
        };
        assert!(!sync.apply_fetch(&store, today, &payload));
        assert!(!sync.tomorrow_available());
    }
}
