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

use crate::metrics::MetricDefinition;
use crate::projector::{ProjectionSettings, PublishedMetric, project};
use crate::snapshot::PortalSnapshot;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

/// Outcome of the most recent refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshStatus {
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Whether the latest refresh succeeded
    pub healthy: bool,
}

/// Last-known-good published metrics
///
/// Values survive failed refreshes; a failure only updates [`RefreshStatus`].
#[derive(Debug)]
pub struct MetricStore {
    definitions: Vec<MetricDefinition>,
    settings: ProjectionSettings,
    metrics: RwLock<HashMap<&'static str, PublishedMetric>>,
    status: RwLock<RefreshStatus>,
}

impl MetricStore {
    pub fn new(definitions: Vec<MetricDefinition>, settings: ProjectionSettings) -> Self {
        let metrics = definitions
            .iter()
            .map(|def| (def.key, PublishedMetric::unknown(def)))
            .collect();
        Self {
            definitions,
            settings,
            metrics: RwLock::new(metrics),
            status: RwLock::new(RefreshStatus::default()),
        }
    }

    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Project every metric from `snapshot`, returning how many carry a value
    pub fn apply(&self, snapshot: &PortalSnapshot) -> usize {
        let mut metrics = self.metrics.write();
        for def in &self.definitions {
            let next = project(def, snapshot, metrics.get(def.key), &self.settings);
            metrics.insert(def.key, next);
        }
        drop(metrics);

        let mut status = self.status.write();
        status.last_success = Some(snapshot.fetched_at);
        status.last_error = None;
        status.healthy = true;
        drop(status);

        self.metrics.read().values().filter(|m| m.value.is_some()).count()
    }

    /// Record a failed refresh; published values are kept
    pub fn mark_failed(&self, at: DateTime<Utc>, error: impl Into<String>) {
        let mut status = self.status.write();
        status.last_failure = Some(at);
        status.last_error = Some(error.into());
        status.healthy = false;
    }

    pub fn get(&self, key: &str) -> Option<PublishedMetric> {
        self.metrics.read().get(key).cloned()
    }

    /// All metrics in catalog order
    pub fn all(&self) -> Vec<PublishedMetric> {
        let metrics = self.metrics.read();
        self.definitions
            .iter()
            .filter_map(|def| metrics.get(def.key).cloned())
            .collect()
    }

    pub fn status(&self) -> RefreshStatus {
        self.status.read().clone()
    }
}
