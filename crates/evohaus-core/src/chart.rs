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

//! Daily chart series in 15-minute resolution
//!
//! `getMeterDataWithParam.php` answers with an array of arrays:
//! row 0 holds the consumption per 15-minute slot (null for slots not yet
//! measured), row 1 the hour label of each slot and, for electricity, row 2
//! the energy price per slot in ct/kWh.

use crate::errors::{PortalError, PortalResult};
use serde::Serialize;
use serde_json::Value;

pub const CHART_DATA_PATH: &str = "/php/getMeterDataWithParam.php";

pub const ELECTRICITY_CATEGORY: &str = "Stromverbrauch";
pub const COLD_WATER_CATEGORY: &str = "Kaltwasser";
pub const WARM_WATER_CATEGORY: &str = "Warmwasser";

/// Samples per hour
const SLOTS_PER_HOUR: usize = 4;

/// Consumption summed over one completed hour
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRollup {
    /// Index of the boundary sample that closed the hour
    pub index: usize,
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    samples: Vec<Option<f64>>,
    hours: Vec<String>,
    prices: Vec<Option<f64>>,
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

fn as_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

impl ChartSeries {
    pub fn new(samples: Vec<Option<f64>>, hours: Vec<String>, prices: Vec<Option<f64>>) -> Self {
        Self {
            samples,
            hours,
            prices,
        }
    }

    /// Decode the portal's JSON body; a null or empty series is an upstream data error
    pub fn from_json(body: &str) -> PortalResult<Self> {
        let rows: Option<Vec<Vec<Value>>> = serde_json::from_str(body)?;
        let rows = rows.ok_or_else(|| PortalError::UpstreamData("chart data is null".to_owned()))?;

        let mut rows = rows.into_iter();
        let samples: Vec<Option<f64>> = rows
            .next()
            .unwrap_or_default()
            .iter()
            .map(as_number)
            .collect();
        if samples.is_empty() {
            return Err(PortalError::UpstreamData("chart series is empty".to_owned()));
        }
        let hours = rows
            .next()
            .unwrap_or_default()
            .iter()
            .map(as_label)
            .collect();
        let prices = rows
            .next()
            .unwrap_or_default()
            .iter()
            .map(as_number)
            .collect();

        Ok(Self::new(samples, hours, prices))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// "HH:MM" label of a sample
    pub fn label(&self, index: usize) -> String {
        let hour = self.hours.get(index).map_or("", String::as_str);
        let minute = index.rem_euclid(SLOTS_PER_HOUR) * 15;
        format!("{hour}:{minute:02}")
    }

    /// Sum of every measured sample of the day
    pub fn daily_total(&self) -> f64 {
        self.samples.iter().flatten().sum()
    }

    /// Rollups computed at each hour boundary that has a measured sample
    ///
    /// The rollup at index `i` sums the four preceding slots; unmeasured
    /// slots count as zero.
    pub fn hourly_rollups(&self) -> Vec<HourlyRollup> {
        (SLOTS_PER_HOUR..self.samples.len())
            .step_by(SLOTS_PER_HOUR)
            .filter(|&i| self.samples[i].is_some())
            .map(|i| HourlyRollup {
                index: i,
                label: self.label(i),
                value: self.samples[i - SLOTS_PER_HOUR..i].iter().flatten().sum(),
            })
            .collect()
    }

    /// Consumption of the most recently completed hour
    pub fn latest_hour(&self) -> Option<HourlyRollup> {
        self.hourly_rollups().pop()
    }

    /// Label of the newest measured sample
    pub fn latest_sample_label(&self) -> Option<String> {
        self.samples
            .iter()
            .rposition(Option::is_some)
            .map(|i| self.label(i))
    }

    /// Cost of today's consumption in ct: sum of sample x (slot price + surcharge)
    ///
    /// Slots without a price are not billed.
    pub fn total_cost_cents(&self, surcharge_cents: f64) -> f64 {
        self.samples
            .iter()
            .zip(self.prices.iter())
            .filter_map(|(sample, price)| Some(sample.as_ref()? * (price.as_ref()? + surcharge_cents)))
            .sum()
    }

    pub fn has_prices(&self) -> bool {
        self.prices.iter().any(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(n: usize) -> Vec<String> {
        (0..n).map(|i| (i / SLOTS_PER_HOUR).to_string()).collect()
    }

    #[test]
    fn test_from_json() {
        let series =
            ChartSeries::from_json(r#"[[0.1, 0.2, null], [0, 0, 0], [30.0, 31.5, 29.0]]"#).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.has_prices());
        assert_eq!(series.label(1), "0:15");
    }

    #[test]
    fn test_null_and_empty_are_upstream_errors() {
        assert!(matches!(
            ChartSeries::from_json("null"),
            Err(PortalError::UpstreamData(_))
        ));
        assert!(matches!(
            ChartSeries::from_json("[[], []]"),
            Err(PortalError::UpstreamData(_))
        ));
        assert!(matches!(
            ChartSeries::from_json("[]"),
            Err(PortalError::UpstreamData(_))
        ));
    }

    #[test]
    fn test_daily_total_skips_missing_samples() {
        let series = ChartSeries::new(
            vec![Some(1.0), None, Some(2.0), Some(0.5), None],
            hours(5),
            vec![],
        );
        assert!((series.daily_total() - 3.5).abs() < 1e-9);
        assert_eq!(series.latest_sample_label().as_deref(), Some("0:45"));
    }

    #[test]
    fn test_hourly_rollups_at_boundaries() {
        let samples = vec![
            Some(1.0),
            Some(1.0),
            Some(1.0),
            Some(1.0),
            Some(2.0),
            None,
            Some(2.0),
            Some(2.0),
            Some(0.0),
            None,
            None,
            None,
        ];
        let series = ChartSeries::new(samples, hours(12), vec![]);

        let rollups = series.hourly_rollups();
        assert_eq!(rollups.len(), 2);
        assert_eq!(rollups[0].index, 4);
        assert!((rollups[0].value - 4.0).abs() < 1e-9);
        assert_eq!(rollups[0].label, "1:00");
        assert_eq!(rollups[1].index, 8);
        assert!((rollups[1].value - 6.0).abs() < 1e-9);

        let latest = series.latest_hour().unwrap();
        assert_eq!(latest.label, "2:00");
    }

    #[test]
    fn test_no_rollup_without_boundary_sample() {
        let series = ChartSeries::new(
            vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0), None],
            hours(5),
            vec![],
        );
        assert!(series.latest_hour().is_none());
    }

    #[test]
    fn test_total_cost() {
        let series = ChartSeries::new(
            vec![Some(1.0), Some(2.0), None, Some(4.0)],
            hours(4),
            vec![Some(30.0), Some(20.0), Some(10.0), None],
        );
        // 1 * (30 + 5) + 2 * (20 + 5)
        assert!((series.total_cost_cents(5.0) - 85.0).abs() < 1e-9);
    }
}
