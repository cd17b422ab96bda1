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

//! HTTP day-ahead price provider
//!
//! Fetches one nominal provider day of quarter-hour prices from a plain
//! JSON endpoint. The market publishes tomorrow's list in the afternoon;
//! until then the endpoint answers 404 or fills the list with its
//! "not published" sentinel, both of which surface as
//! [`ProviderError::NotYetPublished`] so the caller retries later.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use spotion_core::traits::{PriceProvider, ProviderDayPrices, ProviderError};
use spotion_types::PERIODS_PER_DAY;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire form of the day-ahead document
///
/// Prices are nullable because JSON has no infinity literal: upstreams
/// that mark unpublished entries with non-finite floats end up encoding
/// them as `null`.
#[derive(Debug, Deserialize)]
struct DayAheadPayload {
    date: NaiveDate,
    prices: Vec<Option<f64>>,
}

/// Day-ahead price provider backed by an HTTP endpoint
///
/// Expects `GET <base_url>/day-ahead` to return
/// `{"date": "YYYY-MM-DD", "prices": [...]}` with one price per
/// quarter-hour period of the provider's nominal day.
pub struct HttpPriceProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPriceProvider {
    /// Create a provider against the given endpoint base URL
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a provider with an explicit request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for price provider")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn day_ahead_url(&self) -> String {
        format!("{}/day-ahead", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PriceProvider for HttpPriceProvider {
    async fn fetch_day_ahead(&self) -> Result<ProviderDayPrices, ProviderError> {
        let url = self.day_ahead_url();
        debug!("💰 [PROVIDER] Requesting day-ahead prices: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach price endpoint: {url}"))?;

        // The endpoint answers 404 until the market publishes the day
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("💰 [PROVIDER] Endpoint has no day-ahead list yet (404)");
            return Err(ProviderError::NotYetPublished);
        }
        if !response.status().is_success() {
            return Err(ProviderError::Other(anyhow::anyhow!(
                "price endpoint returned HTTP {}",
                response.status()
            )));
        }

        let payload: DayAheadPayload = response
            .json()
            .await
            .context("Failed to decode day-ahead payload")?;

        let mut prices = Vec::with_capacity(payload.prices.len());
        for value in &payload.prices {
            match value {
                Some(v) if v.is_finite() => prices.push(*v as f32),
                // Sentinel entry: the list exists but is not published yet
                _ => {
                    debug!(
                        "💰 [PROVIDER] Day-ahead list for {} still carries the unpublished sentinel",
                        payload.date
                    );
                    return Err(ProviderError::NotYetPublished);
                }
            }
        }

        if prices.len() != PERIODS_PER_DAY {
            return Err(ProviderError::Malformed(format!(
                "expected {} prices, got {}",
                PERIODS_PER_DAY,
                prices.len()
            )));
        }

        info!(
            "✅ [PROVIDER] Fetched {} day-ahead prices for {}",
            prices.len(),
            payload.date
        );

        Ok(ProviderDayPrices {
            date: payload.date,
            prices,
        })
    }

    fn name(&self) -> &str {
        "DayAheadHttp"
    }
}
