use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use tabled::Tabled;

use crate::error::{ReportError, ReportResult};
use crate::util::parse_timestamp;

/// Everything needed to build one report. Assembled by the data layer and
/// never mutated by the engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRequest {
    pub title: String,
    pub period: Period,
    pub selection: Selection,
    pub consumption_data: Vec<ConsumptionRecord>,
    pub chart_data: ChartSeries,
    pub export_data: ExportSummary,
    pub building_groups: Vec<GroupRow>,
    pub buildings: Vec<BuildingRow>,
    pub apartments: Vec<ApartmentRow>,
}

/// Raw period bounds as supplied by the caller. Parsed lazily so that a
/// missing or malformed bound surfaces as [`ReportError::InvalidPeriod`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Period {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Period {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
        }
    }

    pub fn resolve(&self) -> ReportResult<ResolvedPeriod> {
        let from = resolve_bound("from", self.from.as_deref())?;
        let to = resolve_bound("to", self.to.as_deref())?;
        if from > to {
            return Err(ReportError::InvalidPeriod(format!(
                "start {} is after end {}",
                from.to_rfc3339(),
                to.to_rfc3339()
            )));
        }
        Ok(ResolvedPeriod { from, to })
    }
}

fn resolve_bound(name: &str, raw: Option<&str>) -> ReportResult<DateTime<Utc>> {
    let raw = raw.ok_or_else(|| ReportError::InvalidPeriod(format!("period.{} is missing", name)))?;
    parse_timestamp(raw)
        .ok_or_else(|| ReportError::InvalidPeriod(format!("period.{} is not a date: {:?}", name, raw)))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Selection {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub details: Option<SelectionDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectionDetails {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub tenant: Option<String>,
}

impl SelectionDetails {
    /// `street, city zip` with empty parts dropped; `None` when all are empty.
    pub fn address(&self) -> Option<String> {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let street = clean(&self.street);
        let locality: Vec<String> = [clean(&self.city), clean(&self.zip)]
            .into_iter()
            .flatten()
            .collect();
        let mut parts: Vec<String> = street.into_iter().collect();
        if !locality.is_empty() {
            parts.push(locality.join(" "));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// One metered reading, in liters. Order is not significant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConsumptionRecord {
    pub date: String,
    pub consumption: f64,
}

impl ConsumptionRecord {
    pub fn new(date: impl Into<String>, consumption: f64) -> Self {
        Self {
            date: date.into(),
            consumption,
        }
    }
}

/// Chart input. `labels` and `values` are expected to be the same length.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_consistent(&self) -> bool {
        self.labels.len() == self.values.len()
    }
}

/// A precomputed scalar from the data layer, either text or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Headline figures computed upstream; only displayed, never recomputed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSummary {
    pub today: Option<Scalar>,
    pub yesterday: Option<Scalar>,
    pub this_week: Option<Scalar>,
    pub this_month: Option<Scalar>,
    pub this_year: Option<Scalar>,
    pub last_year: Option<Scalar>,
    pub water_cost_last_month: Option<Scalar>,
}

impl ExportSummary {
    /// The seven headline statistics in display order, `"N/A"` when absent.
    pub fn entries(&self) -> [(&'static str, String); 7] {
        let show = |v: &Option<Scalar>| v.as_ref().map_or_else(|| "N/A".to_string(), Scalar::to_string);
        [
            ("Today", show(&self.today)),
            ("Yesterday", show(&self.yesterday)),
            ("This Week", show(&self.this_week)),
            ("This Month", show(&self.this_month)),
            ("This Year", show(&self.this_year)),
            ("Last Year", show(&self.last_year)),
            ("Water Cost (Last Month)", show(&self.water_cost_last_month)),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupRow {
    pub id: Option<Scalar>,
    pub name: String,
    pub building_count: u32,
    pub apartment_count: u32,
    pub device_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildingRow {
    pub id: Option<Scalar>,
    pub name: String,
    pub group_name: Option<String>,
    pub address: Option<String>,
    pub apartment_count: u32,
    pub device_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApartmentRow {
    pub id: Option<Scalar>,
    pub number: String,
    pub building_name: Option<String>,
    pub floor: Option<i32>,
    pub apartment_type: Option<String>,
    pub size: Option<f64>,
    pub tenant: Option<String>,
    pub device_count: u32,
}

impl ApartmentRow {
    /// Occupied means a tenant is recorded and it is not the `"Vacant"` marker.
    pub fn is_occupied(&self) -> bool {
        matches!(self.tenant.as_deref(), Some(t) if t != "Vacant")
    }
}

/// A finished output file: bytes plus the name the caller should save it under.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// One line of the console preview printed by the driver.
#[derive(Debug, Clone, Tabled)]
pub struct MetricPreviewRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_camel_case() {
        let json = r#"{
            "title": "Monthly Report",
            "period": {"from": "2025-01-01", "to": "2025-01-31T00:00:00Z"},
            "selection": {"type": "building", "name": "Harbor View", "details": {"street": "Pier 4", "city": "Kiel", "zip": "24103"}},
            "consumptionData": [{"date": "2025-01-02", "consumption": 140.5}],
            "chartData": {"labels": ["Jan 2"], "values": [140.5]},
            "exportData": {"today": "12 L", "waterCostLastMonth": 41.2},
            "buildings": [{"id": 7, "name": "Harbor View", "apartmentCount": 12, "deviceCount": 14}],
            "apartments": [{"id": "a-1", "number": "1A", "tenant": "Vacant"}]
        }"#;
        let req: ReportRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.selection.kind, "building");
        assert_eq!(req.consumption_data.len(), 1);
        assert_eq!(req.export_data.water_cost_last_month, Some(Scalar::Number(41.2)));
        assert_eq!(req.buildings[0].id, Some(Scalar::Number(7.0)));
        assert!(!req.apartments[0].is_occupied());
        assert!(req.building_groups.is_empty());
        assert_eq!(
            req.selection.details.unwrap().address().as_deref(),
            Some("Pier 4, Kiel 24103")
        );
    }

    #[test]
    fn test_period_resolve_errors() {
        assert!(matches!(Period::default().resolve(), Err(ReportError::InvalidPeriod(_))));
        assert!(matches!(
            Period::new("2025-01-01", "yesterday").resolve(),
            Err(ReportError::InvalidPeriod(_))
        ));
        assert!(matches!(
            Period::new("2025-02-01", "2025-01-01").resolve(),
            Err(ReportError::InvalidPeriod(_))
        ));
        assert!(Period::new("2025-01-05T10:00:00Z", "2025-02-01").resolve().is_ok());
    }

    #[test]
    fn test_address_omits_empty_parts() {
        let details = SelectionDetails {
            street: Some("  ".into()),
            city: Some("Kiel".into()),
            ..Default::default()
        };
        assert_eq!(details.address().as_deref(), Some("Kiel"));
        assert_eq!(SelectionDetails::default().address(), None);
    }

    #[test]
    fn test_export_entries_default_to_na() {
        let entries = ExportSummary::default().entries();
        assert_eq!(entries.len(), 7);
        assert!(entries.iter().all(|(_, v)| v == "N/A"));
        assert_eq!(entries[6].0, "Water Cost (Last Month)");
    }
}
