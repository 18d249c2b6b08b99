// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Evohaus Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::store::MetricStore;
use crate::traits::PortalDataSource;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Drives refresh cycles: fetch a snapshot, then project every metric
pub struct RefreshCoordinator {
    source: Arc<dyn PortalDataSource>,
    store: Arc<MetricStore>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("source", &self.source.name())
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    pub fn new(source: Arc<dyn PortalDataSource>, store: Arc<MetricStore>) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &Arc<MetricStore> {
        &self.store
    }

    /// Run one refresh cycle; returns whether it succeeded
    ///
    /// On failure every metric keeps its last value.
    pub async fn refresh_once(&self) -> bool {
        match self.source.fetch_snapshot().await {
            Ok(snapshot) => {
                let with_value = self.store.apply(&snapshot);
                info!(
                    "📊 Published {}/{} metrics from {}",
                    with_value,
                    self.store.definitions().len(),
                    self.source.name()
                );
                true
            }
            Err(e) => {
                error!("❌ Refresh from {} failed: {:#}", self.source.name(), e);
                self.store.mark_failed(Utc::now(), format!("{e:#}"));
                false
            }
        }
    }

    /// Refresh forever on a fixed period, starting immediately
    ///
    /// Ticks missed while a slow refresh is running are skipped.
    pub async fn run(&self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.refresh_once().await;
        }
    }
}
