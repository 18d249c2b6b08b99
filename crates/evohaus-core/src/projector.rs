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

//! Turns a portal snapshot into published metric values

use crate::chart::ChartSeries;
use crate::meter_table::MeterReading;
use crate::metrics::{
    AccumulationPolicy, ChartAggregate, DeviceClass, MetricDefinition, MetricSource, PriceUnit,
};
use crate::snapshot::PortalSnapshot;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub const ATTR_UPDATE_TIME: &str = "updateTime";
pub const ATTR_METER_NO: &str = "meter_no";
pub const ATTR_TRAFFIC_LIGHT: &str = "traffic_light";
pub const ATTR_PRICE: &str = "price";
pub const ATTR_PARKING_SLOT_CODE: &str = "parking_slot_code";
pub const ATTR_PARKING_TENANT_NUMBER: &str = "parking_tenant_number";
pub const ATTR_TOTAL_COST_TODAY: &str = "total_cost_today";
pub const ATTR_TOTAL_CONSUMPTION_TODAY: &str = "total_consumption_today";
pub const ATTR_CURRENT_CONSUMPTION: &str = "current_consumption";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

/// A metric as the host sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedMetric {
    pub key: String,
    pub name: String,
    pub icon: String,
    /// `None` until the first accepted reading
    pub value: Option<MetricValue>,
    pub unit: Option<String>,
    pub device_class: Option<DeviceClass>,
    pub accumulation: AccumulationPolicy,
    pub attributes: BTreeMap<String, Value>,
}

impl PublishedMetric {
    /// Metric with no value yet
    pub fn unknown(definition: &MetricDefinition) -> Self {
        Self {
            key: definition.key.to_owned(),
            name: definition.name.to_owned(),
            icon: definition.icon.to_owned(),
            value: None,
            unit: definition.unit.map(str::to_owned),
            device_class: definition.device_class,
            accumulation: definition.accumulation,
            attributes: BTreeMap::new(),
        }
    }

    pub fn number(&self) -> Option<f64> {
        self.value.as_ref().and_then(MetricValue::as_number)
    }

    pub fn update_time(&self) -> Option<&str> {
        self.attributes.get(ATTR_UPDATE_TIME).and_then(Value::as_str)
    }

    fn set_attr(&mut self, name: &str, value: impl Into<Value>) {
        self.attributes.insert(name.to_owned(), value.into());
    }
}

/// Settings shared by every projection
#[derive(Debug, Clone, Copy)]
pub struct ProjectionSettings {
    pub timezone: Tz,
    /// Added to the dynamic energy price (ct/kWh)
    pub price_surcharge_cents: f64,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Berlin,
            price_surcharge_cents: 0.0,
        }
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

fn local_time_label(now: DateTime<Utc>, timezone: Tz) -> String {
    now.with_timezone(&timezone).format("%H:%M").to_string()
}

/// Whether a monotonic meter may move from `previous` to `candidate`
pub fn accepts_monotonic(previous: Option<f64>, candidate: f64) -> bool {
    candidate > 0.0 && previous.is_none_or(|prev| candidate > prev)
}

/// Project one metric from a snapshot
///
/// When the snapshot lacks the metric's source the previous metric is
/// returned unchanged, keeping its stale `updateTime`.
pub fn project(
    definition: &MetricDefinition,
    snapshot: &PortalSnapshot,
    previous: Option<&PublishedMetric>,
    settings: &ProjectionSettings,
) -> PublishedMetric {
    let mut metric = previous
        .cloned()
        .unwrap_or_else(|| PublishedMetric::unknown(definition));
    let now_label = local_time_label(snapshot.fetched_at, settings.timezone);

    match definition.source {
        MetricSource::MeterRow { description } => {
            let reading = snapshot.meter_table.extract(description);
            apply_meter_reading(&mut metric, definition, &reading);
            metric.set_attr(ATTR_UPDATE_TIME, now_label);
        }
        MetricSource::ParkingMeter => {
            if let Some(parking) = snapshot.meter_table.extract_parking() {
                apply_meter_reading(&mut metric, definition, &parking.reading);
                metric.name = format!("{} {}", definition.name, parking.parking_slot_code);
                metric.set_attr(ATTR_PARKING_SLOT_CODE, parking.parking_slot_code);
                metric.set_attr(ATTR_PARKING_TENANT_NUMBER, parking.tenant_number);
            } else {
                debug!("No parking meter row in meter table");
            }
            metric.set_attr(ATTR_UPDATE_TIME, now_label);
        }
        MetricSource::EnergyPrice(unit) => {
            let Some(traffic) = &snapshot.traffic else {
                return metric;
            };
            let cents = traffic.current_energy_price_cents + settings.price_surcharge_cents;
            let value = match unit {
                PriceUnit::Cents => round_to(cents, 2),
                PriceUnit::Euro => round_to(cents / 100.0, 2),
            };
            metric.value = Some(MetricValue::Number(value));
            metric.set_attr(ATTR_TRAFFIC_LIGHT, traffic.color.as_str());
            metric.set_attr(ATTR_UPDATE_TIME, now_label);
        }
        MetricSource::TrafficLight => {
            let Some(traffic) = &snapshot.traffic else {
                return metric;
            };
            let cents = traffic.current_energy_price_cents + settings.price_surcharge_cents;
            metric.value = Some(MetricValue::Text(traffic.color.as_str().to_owned()));
            metric.set_attr(ATTR_PRICE, round_to(cents, 2));
            metric.set_attr(ATTR_UPDATE_TIME, now_label);
        }
        MetricSource::Chart {
            category,
            aggregate,
        } => {
            let Some(series) = snapshot.chart(category) else {
                return metric;
            };
            apply_chart(&mut metric, series, aggregate, settings);
            // the hourly figure is stamped with the boundary that closed its hour
            let label = match aggregate {
                ChartAggregate::LatestHour => series.latest_hour().map(|rollup| rollup.label),
                ChartAggregate::DailyTotal | ChartAggregate::HourWithDailyTotal => {
                    series.latest_sample_label()
                }
            };
            metric.set_attr(ATTR_UPDATE_TIME, label.unwrap_or(now_label));
        }
    }

    metric
}

fn apply_meter_reading(
    metric: &mut PublishedMetric,
    definition: &MetricDefinition,
    reading: &MeterReading,
) {
    let accepted = match definition.accumulation {
        AccumulationPolicy::Instantaneous => true,
        AccumulationPolicy::MonotonicIncreasing => accepts_monotonic(metric.number(), reading.value),
    };

    if accepted {
        metric.value = Some(MetricValue::Number(reading.value));
    } else {
        debug!(
            "Keeping {} at {:?}, rejected reading {}",
            definition.key,
            metric.number(),
            reading.value
        );
    }

    if !reading.meter_number.is_empty() {
        metric.set_attr(ATTR_METER_NO, reading.meter_number.as_str());
    }
}

fn apply_chart(
    metric: &mut PublishedMetric,
    series: &ChartSeries,
    aggregate: ChartAggregate,
    settings: &ProjectionSettings,
) {
    let latest_hour = series.latest_hour().map_or(0.0, |rollup| rollup.value);
    let daily_total = series.daily_total();

    match aggregate {
        ChartAggregate::LatestHour => {
            metric.value = Some(MetricValue::Number(round_to(latest_hour, 3)));
        }
        ChartAggregate::DailyTotal => {
            metric.value = Some(MetricValue::Number(round_to(daily_total, 3)));
            if series.has_prices() {
                let cost = series.total_cost_cents(settings.price_surcharge_cents);
                metric.set_attr(ATTR_TOTAL_COST_TODAY, round_to(cost, 2));
            }
        }
        ChartAggregate::HourWithDailyTotal => {
            metric.value = Some(MetricValue::Number(round_to(latest_hour, 3)));
            metric.set_attr(ATTR_TOTAL_CONSUMPTION_TODAY, round_to(daily_total, 3));
            metric.set_attr(ATTR_CURRENT_CONSUMPTION, round_to(latest_hour, 3));
        }
    }
}
