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

use crate::chart::ChartSeries;
use crate::meter_table::MeterTable;
use crate::traffic::TrafficPriceSnapshot;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything one refresh cycle fetched from the portal
///
/// The meter table is always present. Traffic and chart data are left out
/// when their endpoint failed during the cycle.
#[derive(Debug, Clone)]
pub struct PortalSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub meter_table: Arc<MeterTable>,
    pub traffic: Option<TrafficPriceSnapshot>,
    /// Chart series keyed by category (`mClass`)
    pub charts: BTreeMap<String, ChartSeries>,
}

impl PortalSnapshot {
    pub fn new(fetched_at: DateTime<Utc>, meter_table: Arc<MeterTable>) -> Self {
        Self {
            fetched_at,
            meter_table,
            traffic: None,
            charts: BTreeMap::new(),
        }
    }

    pub fn with_traffic(mut self, traffic: TrafficPriceSnapshot) -> Self {
        self.traffic = Some(traffic);
        self
    }

    pub fn with_chart(mut self, category: impl Into<String>, series: ChartSeries) -> Self {
        self.charts.insert(category.into(), series);
        self
    }

    pub fn chart(&self, category: &str) -> Option<&ChartSeries> {
        self.charts.get(category)
    }
}
