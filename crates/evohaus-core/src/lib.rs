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

//! Evohaus/Enocoo portal client: login, scraping, and metric projection

pub mod cache;
pub mod chart;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod markup;
pub mod meter_table;
pub mod metrics;
pub mod projector;
pub mod residence;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod traffic;
pub mod traits;

pub use chart::{ChartSeries, HourlyRollup};
pub use client::{CHART_CATEGORIES, EvohausClient};
pub use config::PortalConfig;
pub use coordinator::RefreshCoordinator;
pub use errors::{PortalError, PortalResult};
pub use meter_table::{MeterReading, MeterTable, ParkingMeterReading};
pub use metrics::{
    AccumulationPolicy, DeviceClass, MetricDefinition, MetricSource, default_metrics, find_metric,
};
pub use projector::{MetricValue, ProjectionSettings, PublishedMetric, project};
pub use residence::Residence;
pub use session::{Session, SessionManager};
pub use snapshot::PortalSnapshot;
pub use store::{MetricStore, RefreshStatus};
pub use traffic::{TrafficLight, TrafficPriceSnapshot};
pub use traits::PortalDataSource;
