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

//! Meter table parsing
//!
//! The portal renders one `<tr>` per meter with the cells
//! `unit | description | meter number | reading date | reading`.
//! Readings use German number formatting (`12.345,6`).

use crate::markup;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace, warn};

pub const METER_TABLE_PATH: &str = "/php/newMeterTable.php";

/// Description prefix of electricity meter rows
pub const ELECTRICITY_LABEL: &str = "Verbrauch Strom";

/// Token marking a parking-slot sub-meter in the unit column
pub const PARKING_MARKER: &str = "stpl";

const UNIT_COLUMN: usize = 0;
const DESCRIPTION_COLUMN: usize = 1;
const METER_NUMBER_COLUMN: usize = 2;
const VALUE_COLUMN: usize = 4;

static SLOT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)stpl[\s.:#_-]*(\d+)").expect("valid slot regex"));
static TENANT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^a-z])tn[\s.:#_-]*(\d+)").expect("valid tenant regex"));

/// One raw row of the meter table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterRow {
    pub unit_label: String,
    pub description: String,
    pub meter_number: String,
    pub raw_value: String,
}

impl MeterRow {
    /// Description with the trailing unit removed, e.g. "Verbrauch Strom kWh" -> "Verbrauch Strom"
    pub fn normalized_description(&self) -> &str {
        let unit = self.unit_label.trim();
        if unit.is_empty() {
            return self.description.trim();
        }
        self.description
            .trim()
            .strip_suffix(unit)
            .map_or(self.description.trim(), str::trim_end)
    }

    pub fn is_parking(&self) -> bool {
        self.unit_label.to_lowercase().contains(PARKING_MARKER)
    }

    fn reading(&self) -> MeterReading {
        let value = parse_decimal(&self.raw_value).unwrap_or_else(|| {
            warn!(
                "Could not parse meter value '{}' for '{}', using 0",
                self.raw_value, self.description
            );
            0.0
        });
        MeterReading {
            description: self.normalized_description().to_owned(),
            value,
            meter_number: self.meter_number.clone(),
        }
    }
}

/// A single meter reading keyed by its portal description
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeterReading {
    pub description: String,
    pub value: f64,
    pub meter_number: String,
}

/// Electricity sub-meter of a parking slot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParkingMeterReading {
    pub reading: MeterReading,
    pub parking_slot_code: String,
    pub tenant_number: String,
}

/// Parsed meter table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeterTable {
    rows: Vec<MeterRow>,
}

impl MeterTable {
    /// Parse the meter table markup; rows with too few cells are skipped
    pub fn parse(html: &str) -> Self {
        let rows: Vec<MeterRow> = markup::table_rows(html)
            .filter_map(|row_html| {
                let cells = markup::row_cells(row_html);
                if cells.len() <= VALUE_COLUMN {
                    trace!("Skipping table row with {} cells", cells.len());
                    return None;
                }
                Some(MeterRow {
                    unit_label: cells[UNIT_COLUMN].clone(),
                    description: cells[DESCRIPTION_COLUMN].clone(),
                    meter_number: cells[METER_NUMBER_COLUMN].clone(),
                    raw_value: cells[VALUE_COLUMN].clone(),
                })
            })
            .collect();

        debug!("Parsed meter table with {} rows", rows.len());
        Self { rows }
    }

    pub fn rows(&self) -> &[MeterRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First non-parking row whose normalized description equals `description`
    pub fn find(&self, description: &str) -> Option<MeterReading> {
        self.rows
            .iter()
            .filter(|row| !row.is_parking())
            .find(|row| row.normalized_description() == description)
            .map(MeterRow::reading)
    }

    /// Reading for `description`, or a zero reading with no meter number
    pub fn extract(&self, description: &str) -> MeterReading {
        self.find(description).unwrap_or_else(|| {
            debug!("No meter row matches '{}'", description);
            MeterReading {
                description: description.to_owned(),
                ..MeterReading::default()
            }
        })
    }

    /// First electricity row whose unit label carries both a slot code and a tenant number
    pub fn extract_parking(&self) -> Option<ParkingMeterReading> {
        self.rows
            .iter()
            .filter(|row| row.description.contains(ELECTRICITY_LABEL))
            .find_map(|row| {
                let (parking_slot_code, tenant_number) = parse_parking_label(&row.unit_label)?;
                Some(ParkingMeterReading {
                    reading: row.reading(),
                    parking_slot_code,
                    tenant_number,
                })
            })
    }
}

/// Parse a German-formatted number: `.` groups thousands, `,` is the decimal separator
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let normalized: String = raw
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Slot code and tenant number from a label such as "Stpl038 Tn136"
///
/// Both parts are required; leading zeros are kept.
pub fn parse_parking_label(label: &str) -> Option<(String, String)> {
    let slot = SLOT_CODE.captures(label)?.get(1)?.as_str().to_owned();
    let tenant = TENANT_NUMBER.captures(label)?.get(1)?.as_str().to_owned();
    Some((slot, tenant))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(unit: &str, description: &str, meter_no: &str, value: &str) -> String {
        format!(
            "<tr><td>{unit}</td><td>{description}</td><td>{meter_no}</td><td>01.10.2025</td><td>{value}</td></tr>"
        )
    }

    fn table(rows: &[String]) -> MeterTable {
        MeterTable::parse(&format!(
            "<table><tr><th>Einheit</th><th>Bezeichnung</th></tr>{}</table>",
            rows.concat()
        ))
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("12.345,6"), Some(12345.6));
        assert_eq!(parse_decimal("1.234.567,8"), Some(1234567.8));
        assert_eq!(parse_decimal("0,5"), Some(0.5));
        assert_eq!(parse_decimal(" 42 "), Some(42.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("n/a"), None);
    }

    #[test]
    fn test_extract_cold_water_row() {
        let table = table(&[
            row("kWh", "Verbrauch Strom kWh", "E-1", "4.321,0"),
            row("m³", "Verbrauch Kaltwasser Bad m³", "123", "12.345,6"),
        ]);

        let reading = table.extract("Verbrauch Kaltwasser Bad");
        assert_eq!(reading.value, 12345.6);
        assert_eq!(reading.meter_number, "123");
        assert_eq!(reading.description, "Verbrauch Kaltwasser Bad");
    }

    #[test]
    fn test_description_without_unit_suffix_matches() {
        let table = table(&[row("m&sup3;", "Verbrauch Kaltwasser Bad", "123", "12.345,6")]);
        assert_eq!(table.extract("Verbrauch Kaltwasser Bad").meter_number, "123");
    }

    #[test]
    fn test_unknown_key_returns_default() {
        let table = table(&[row("m³", "Verbrauch Kaltwasser Bad m³", "123", "1,0")]);

        let reading = table.extract("Verbrauch Warmwasser Küche");
        assert_eq!(reading.value, 0.0);
        assert_eq!(reading.meter_number, "");
        assert!(table.find("Verbrauch Warmwasser Küche").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let table = table(&[
            row("kWh", "Verbrauch Strom kWh", "first", "1,0"),
            row("kWh", "Verbrauch Strom kWh", "second", "2,0"),
        ]);
        assert_eq!(table.extract("Verbrauch Strom").meter_number, "first");
    }

    #[test]
    fn test_parking_rows_excluded_from_ordinary_lookup() {
        let table = table(&[
            row("Stpl038 Tn136", "Verbrauch Strom", "P-1", "99,0"),
            row("kWh", "Verbrauch Strom kWh", "E-1", "4.321,0"),
        ]);

        let reading = table.extract("Verbrauch Strom");
        assert_eq!(reading.meter_number, "E-1");
        assert_eq!(reading.value, 4321.0);
    }

    #[test]
    fn test_parse_parking_label() {
        assert_eq!(
            parse_parking_label("Stpl038 Tn136"),
            Some(("038".to_owned(), "136".to_owned()))
        );
        assert_eq!(
            parse_parking_label("kWh STPL-12, tn.7"),
            Some(("12".to_owned(), "7".to_owned()))
        );
        assert_eq!(
            parse_parking_label("Stpl038Tn136"),
            Some(("038".to_owned(), "136".to_owned()))
        );
        assert_eq!(parse_parking_label("Stpl038"), None);
        assert_eq!(parse_parking_label("Tn136"), None);
        assert_eq!(parse_parking_label("kWh"), None);
    }

    #[test]
    fn test_extract_parking() {
        let table = table(&[
            row("kWh", "Verbrauch Strom kWh", "E-1", "4.321,0"),
            row("Stpl038", "Verbrauch Strom", "P-0", "1,0"),
            row("Stpl038 Tn136", "Verbrauch Strom", "P-1", "1.099,5"),
            row("Stpl039 Tn137", "Verbrauch Strom", "P-2", "7,0"),
        ]);

        let parking = table.extract_parking().unwrap();
        assert_eq!(parking.parking_slot_code, "038");
        assert_eq!(parking.tenant_number, "136");
        assert_eq!(parking.reading.meter_number, "P-1");
        assert_eq!(parking.reading.value, 1099.5);
    }

    #[test]
    fn test_extract_parking_requires_electricity_row() {
        let table = table(&[row("Stpl038 Tn136", "Verbrauch Kaltwasser Bad", "W-1", "1,0")]);
        assert!(table.extract_parking().is_none());
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let table = MeterTable::parse("<table><tr><td>kWh</td><td>Verbrauch Strom</td></tr></table>");
        assert!(table.is_empty());
    }

    #[test]
    fn test_unparseable_value_reads_as_zero() {
        let table = table(&[row("kWh", "Verbrauch Strom kWh", "E-1", "---")]);
        let reading = table.extract("Verbrauch Strom");
        assert_eq!(reading.value, 0.0);
        assert_eq!(reading.meter_number, "E-1");
    }
}
