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

//! Cost-minimizing run window selection
//!
//! Pure functions from price series to on/off masks. A selection is one
//! contiguous run, or two runs separated by at least two off periods, so
//! devices are not toggled more than twice across a window.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use spotion_types::{DayPrices, PERIODS_PER_DAY, period_after};
use tracing::warn;

/// Tuning for run selection within one optimization window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWindowParams {
    /// Periods per optimization window; the horizon is split into
    /// windows of this size and each is optimized on its own
    pub window_size: usize,
    /// Cost ceiling for the selected slots of one window
    pub max_total_cost: f32,
    /// Upper bound on selected slots per window
    pub max_slots: usize,
    /// Lower bound on selected slots per window, kept even when the
    /// cost ceiling cannot be met
    pub min_slots: usize,
}

impl Default for RunWindowParams {
    fn default() -> Self {
        Self {
            window_size: 24,
            max_total_cost: 300.0,
            max_slots: 20,
            min_slots: 8,
        }
    }
}

/// The `n` cheapest slots arranged as one run, or two runs separated by
/// at least two off slots
///
/// Returns ascending slot indices and their prices. Ties prefer the
/// earliest single run. Empty when `n` is zero or exceeds the series.
pub fn find_cheapest_slot_runs(prices: &[f32], n: usize) -> (Vec<usize>, Vec<f32>) {
    let len = prices.len();
    if n == 0 || n > len {
        return (Vec::new(), Vec::new());
    }

    let mut prefix = vec![0.0f32; len + 1];
    for (i, price) in prices.iter().enumerate() {
        prefix[i + 1] = prefix[i] + price;
    }
    let span_cost = |start: usize, span: usize| prefix[start + span] - prefix[start];

    let mut best_cost = f32::INFINITY;
    let mut best: Option<(usize, usize, usize, usize)> = None;

    // Single run
    for start in 0..=(len - n) {
        let cost = span_cost(start, n);
        if cost < best_cost {
            best_cost = cost;
            best = Some((start, n, 0, 0));
        }
    }

    // Two runs with a gap of at least two slots between them
    for first_len in 1..n {
        let second_len = n - first_len;
        for first_start in 0..=(len - first_len) {
            let first_cost = span_cost(first_start, first_len);
            let first_end = first_start + first_len;
            for second_start in (first_end + 2)..=(len.saturating_sub(second_len)) {
                let cost = first_cost + span_cost(second_start, second_len);
                if cost < best_cost {
                    best_cost = cost;
                    best = Some((first_start, first_len, second_start, second_len));
                }
            }
        }
    }

    let Some((first_start, first_len, second_start, second_len)) = best else {
        return (Vec::new(), Vec::new());
    };
    let indices: Vec<usize> = (first_start..first_start + first_len)
        .chain(second_start..second_start + second_len)
        .collect();
    let values = indices.iter().map(|i| prices[*i]).collect();
    (indices, values)
}

/// Pick run slots for one window under the cost ceiling
///
/// Starts from the cheapest `max_slots`-slot arrangement and drops the
/// most expensive selected slot until the total fits `max_total_cost`
/// or the selection is down to `min_slots`. An infeasible window comes
/// back all-off.
pub fn select_slots_within_budget(
    prices: &[f32],
    max_total_cost: f32,
    max_slots: usize,
    min_slots: usize,
) -> Vec<bool> {
    let mut mask = vec![false; prices.len()];
    let slots = max_slots.min(prices.len());
    let (mut indices, mut values) = find_cheapest_slot_runs(prices, slots);

    let mut remaining = slots;
    while remaining > 0 {
        let total: f32 = values.iter().sum();
        if total <= max_total_cost || remaining == min_slots {
            for index in &indices {
                mask[*index] = true;
            }
            return mask;
        }
        let most_expensive = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let Some(position) = values.iter().position(|v| *v == most_expensive) else {
            break;
        };
        indices.remove(position);
        values.remove(position);
        remaining -= 1;
    }
    mask
}

/// Split a price series into equal windows and pick run slots in each
///
/// A trailing partial window stays off. The mask has the same length as
/// the series.
pub fn select_run_slots(prices: &[f32], params: &RunWindowParams) -> Vec<bool> {
    let mut window_size = params.window_size;
    if window_size > PERIODS_PER_DAY {
        warn!(
            "⚠️ Window size {} is larger than a day, clamping to {}",
            window_size, PERIODS_PER_DAY
        );
        window_size = PERIODS_PER_DAY;
    }

    let mut mask = vec![false; prices.len()];
    if window_size == 0 {
        return mask;
    }
    let windows = prices.len() / window_size;
    for window in 0..windows {
        let start = window * window_size;
        let end = start + window_size;
        let selected = select_slots_within_budget(
            &prices[start..end],
            params.max_total_cost,
            params.max_slots,
            params.min_slots,
        );
        mask[start..end].copy_from_slice(&selected);
    }
    mask
}

/// Price series from the next full period out to the horizon
///
/// Returns the series start period and the prices, today's remainder
/// first and tomorrow after it. Missing prices read as 0.0.
pub fn upcoming_price_series(
    today: &DayPrices,
    tomorrow: &DayPrices,
    now: NaiveTime,
    periods_ahead: usize,
) -> (usize, Vec<f32>) {
    let start = period_after(now);
    let from_today = periods_ahead.min(PERIODS_PER_DAY - start);
    let from_tomorrow = (periods_ahead - from_today).min(PERIODS_PER_DAY);

    let mut series = Vec::with_capacity(from_today + from_tomorrow);
    for period in start..start + from_today {
        series.push(today.price_or_zero(period));
    }
    for period in 0..from_tomorrow {
        series.push(tomorrow.price_or_zero(period));
    }
    (start, series)
}

/// Distribute a run list starting at `start` across two day masks
///
/// Slots past the end of tomorrow are discarded.
pub fn day_masks_from_run_list(run_list: &[bool], start: usize) -> (Vec<bool>, Vec<bool>) {
    let mut today = vec![false; PERIODS_PER_DAY];
    let mut tomorrow = vec![false; PERIODS_PER_DAY];

    let for_today = run_list.len().min(PERIODS_PER_DAY.saturating_sub(start));
    for (offset, on) in run_list[..for_today].iter().enumerate() {
        today[start + offset] = *on;
    }
    for (offset, on) in run_list[for_today..].iter().enumerate() {
        if offset >= PERIODS_PER_DAY {
            break;
        }
        tomorrow[offset] = *on;
    }
    (today, tomorrow)
}

/// Build today/tomorrow run masks from the cached price tables
///
/// Either table empty clears the whole schedule; a device without a
/// price picture does not run.
pub fn plan_two_day_schedule(
    today: &DayPrices,
    tomorrow: &DayPrices,
    params: &RunWindowParams,
    now: NaiveTime,
    periods_ahead: usize,
) -> (Vec<bool>, Vec<bool>) {
    if today.is_empty() || tomorrow.is_empty() {
        warn!("⚠️ Price data incomplete, produced an all-off schedule");
        return (vec![false; PERIODS_PER_DAY], vec![false; PERIODS_PER_DAY]);
    }
    let (start, series) = upcoming_price_series(today, tomorrow, now, periods_ahead);
    let run_list = select_run_slots(&series, params);
    day_masks_from_run_list(&run_list, start)
}
