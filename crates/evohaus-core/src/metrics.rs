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

//! Static metric catalog
//!
//! Every published sensor is one [`MetricDefinition`]; the projector reads
//! the [`MetricSource`] to decide which part of a snapshot feeds it.

use crate::chart::{COLD_WATER_CATEGORY, ELECTRICITY_CATEGORY, WARM_WATER_CATEGORY};
use serde::Serialize;
use std::fmt;

pub const UNIT_KWH: &str = "kWh";
pub const UNIT_CUBIC_METERS: &str = "m³";
pub const UNIT_CENT_PER_KWH: &str = "ct/kWh";
pub const UNIT_EURO_PER_KWH: &str = "€/kWh";

/// How successive values of a metric relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationPolicy {
    /// Every refresh replaces the value
    Instantaneous,
    /// Cumulative counter: only positive, strictly increasing values are accepted
    MonotonicIncreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Energy,
    Water,
    Monetary,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Water => "water",
            Self::Monetary => "monetary",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceUnit {
    Cents,
    Euro,
}

/// Which figure of a chart series a metric publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartAggregate {
    /// Consumption of the latest completed hour
    LatestHour,
    /// Today's total, with `total_cost_today` when the series carries prices
    DailyTotal,
    /// Latest hour as value, plus `total_consumption_today` and `current_consumption`
    HourWithDailyTotal,
}

/// Where in a snapshot a metric's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Meter table row matched by its normalized description
    MeterRow { description: &'static str },
    /// First electricity row carrying a parking slot code and tenant number
    ParkingMeter,
    /// Current dynamic price from the traffic light endpoint
    EnergyPrice(PriceUnit),
    /// Traffic light colour
    TrafficLight,
    /// Daily chart series of a category
    Chart {
        category: &'static str,
        aggregate: ChartAggregate,
    },
}

impl MetricSource {
    /// Chart category this source needs, if any
    pub fn chart_category(&self) -> Option<&'static str> {
        match self {
            Self::Chart { category, .. } => Some(*category),
            Self::MeterRow { .. }
            | Self::ParkingMeter
            | Self::EnergyPrice(_)
            | Self::TrafficLight => None,
        }
    }
}

/// Static description of one published metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub unit: Option<&'static str>,
    pub device_class: Option<DeviceClass>,
    pub accumulation: AccumulationPolicy,
    pub source: MetricSource,
}

const fn meter(
    key: &'static str,
    name: &'static str,
    icon: &'static str,
    description: &'static str,
    unit: &'static str,
    device_class: DeviceClass,
) -> MetricDefinition {
    MetricDefinition {
        key,
        name,
        icon,
        unit: Some(unit),
        device_class: Some(device_class),
        accumulation: AccumulationPolicy::MonotonicIncreasing,
        source: MetricSource::MeterRow { description },
    }
}

const fn chart(
    key: &'static str,
    name: &'static str,
    icon: &'static str,
    category: &'static str,
    aggregate: ChartAggregate,
    unit: &'static str,
    device_class: DeviceClass,
) -> MetricDefinition {
    MetricDefinition {
        key,
        name,
        icon,
        unit: Some(unit),
        device_class: Some(device_class),
        accumulation: AccumulationPolicy::Instantaneous,
        source: MetricSource::Chart {
            category,
            aggregate,
        },
    }
}

/// All metrics published for a residence
pub fn default_metrics() -> Vec<MetricDefinition> {
    vec![
        MetricDefinition {
            key: "electricity_price",
            name: "Electricity Price",
            icon: "mdi:currency-eur",
            unit: Some(UNIT_CENT_PER_KWH),
            device_class: Some(DeviceClass::Monetary),
            accumulation: AccumulationPolicy::Instantaneous,
            source: MetricSource::EnergyPrice(PriceUnit::Cents),
        },
        MetricDefinition {
            key: "electricity_price_euro",
            name: "Electricity Price Euro",
            icon: "mdi:currency-eur",
            unit: Some(UNIT_EURO_PER_KWH),
            device_class: Some(DeviceClass::Monetary),
            accumulation: AccumulationPolicy::Instantaneous,
            source: MetricSource::EnergyPrice(PriceUnit::Euro),
        },
        MetricDefinition {
            key: "traffic_light",
            name: "Traffic Light",
            icon: "mdi:traffic-light",
            unit: None,
            device_class: None,
            accumulation: AccumulationPolicy::Instantaneous,
            source: MetricSource::TrafficLight,
        },
        meter(
            "electricity_meter",
            "Electricity Meter",
            "mdi:meter-electric-outline",
            "Verbrauch Strom",
            UNIT_KWH,
            DeviceClass::Energy,
        ),
        MetricDefinition {
            key: "parking_electricity_meter",
            name: "Parking Electricity Meter",
            icon: "mdi:car-electric",
            unit: Some(UNIT_KWH),
            device_class: Some(DeviceClass::Energy),
            accumulation: AccumulationPolicy::MonotonicIncreasing,
            source: MetricSource::ParkingMeter,
        },
        meter(
            "cold_water_bathroom_meter",
            "Cold Water Bathroom Meter",
            "mdi:faucet",
            "Verbrauch Kaltwasser Bad",
            UNIT_CUBIC_METERS,
            DeviceClass::Water,
        ),
        meter(
            "cold_water_kitchen_meter",
            "Cold Water Kitchen Meter",
            "mdi:countertop-outline",
            "Verbrauch Kaltwasser Küche",
            UNIT_CUBIC_METERS,
            DeviceClass::Water,
        ),
        meter(
            "cold_water_wash_meter",
            "Cold Water Washing Machine Meter",
            "mdi:washing-machine",
            "Verbrauch Kaltwasser Waschmaschine",
            UNIT_CUBIC_METERS,
            DeviceClass::Water,
        ),
        meter(
            "warm_water_bathroom_meter",
            "Warm Water Bathroom Meter",
            "mdi:shower-head",
            "Verbrauch Warmwasser Bad",
            UNIT_CUBIC_METERS,
            DeviceClass::Water,
        ),
        meter(
            "warm_water_kitchen_meter",
            "Warm Water Kitchen Meter",
            "mdi:countertop",
            "Verbrauch Warmwasser Küche",
            UNIT_CUBIC_METERS,
            DeviceClass::Water,
        ),
        chart(
            "electricity_consumption",
            "Electricity Consumption",
            "mdi:solar-power",
            ELECTRICITY_CATEGORY,
            ChartAggregate::LatestHour,
            UNIT_KWH,
            DeviceClass::Energy,
        ),
        chart(
            "total_electricity_consumption",
            "Total Electricity Consumption",
            "mdi:solar-power",
            ELECTRICITY_CATEGORY,
            ChartAggregate::DailyTotal,
            UNIT_KWH,
            DeviceClass::Energy,
        ),
        chart(
            "cold_water_consumption",
            "Cold Water Consumption",
            "mdi:water",
            COLD_WATER_CATEGORY,
            ChartAggregate::HourWithDailyTotal,
            UNIT_CUBIC_METERS,
            DeviceClass::Water,
        ),
        chart(
            "warm_water_consumption",
            "Warm Water Consumption",
            "mdi:shower-head",
            WARM_WATER_CATEGORY,
            ChartAggregate::HourWithDailyTotal,
            UNIT_CUBIC_METERS,
            DeviceClass::Water,
        ),
    ]
}

/// Look up a catalog entry by key
pub fn find_metric(key: &str) -> Option<MetricDefinition> {
    default_metrics().into_iter().find(|def| def.key == key)
}
