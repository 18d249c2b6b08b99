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

//! Traffic light status and current dynamic energy price

use crate::errors::{PortalError, PortalResult};
use crate::meter_table::parse_decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const TRAFFIC_LIGHT_PATH: &str = "/php/getTrafficLightStatus.php";

/// Price tier indicator shown by the portal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
    /// Any colour string the portal adds later
    Other(String),
}

impl TrafficLight {
    pub fn from_portal(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "green" | "gruen" | "grün" => Self::Green,
            "yellow" | "gelb" | "orange" => Self::Yellow,
            "red" | "rot" => Self::Red,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Other(raw) => raw,
        }
    }
}

impl Serialize for TrafficLight {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire format of `getTrafficLightStatus.php`
#[derive(Debug, Deserialize)]
struct RawTrafficStatus {
    color: Option<String>,
    #[serde(rename = "currentEnergyprice")]
    current_energy_price: Option<Value>,
}

/// Current traffic light colour and energy price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficPriceSnapshot {
    pub color: TrafficLight,
    /// Dynamic energy price in euro cents per kWh
    pub current_energy_price_cents: f64,
}

impl TrafficPriceSnapshot {
    /// Decode the portal's JSON body
    ///
    /// A `null` body or missing fields are upstream data errors. The price
    /// may be sent either as a number or as a (possibly German-formatted) string.
    pub fn from_json(body: &str) -> PortalResult<Self> {
        let raw: Option<RawTrafficStatus> = serde_json::from_str(body)?;
        let raw = raw.ok_or_else(|| {
            PortalError::UpstreamData("traffic light status is null".to_owned())
        })?;

        let color = raw
            .color
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| PortalError::UpstreamData("traffic light colour missing".to_owned()))?;

        let price = match raw.current_energy_price {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().or_else(|| parse_decimal(&s)),
            Some(Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_)) | None => None,
        }
        .ok_or_else(|| PortalError::UpstreamData("current energy price missing".to_owned()))?;

        Ok(Self {
            color: TrafficLight::from_portal(&color),
            current_energy_price_cents: price,
        })
    }
}
