use crate::config::ReportConfig;
use crate::error::ReportResult;
use crate::types::ReportRequest;
use crate::util::parse_timestamp;
use std::path::Path;
use tracing::{debug, info};

/// What a loaded request contains, for the driver's load message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub consumption_records: usize,
    pub invalid_dates: usize,
    pub chart_points: usize,
    pub building_groups: usize,
    pub buildings: usize,
    pub apartments: usize,
}

impl LoadReport {
    pub fn of(request: &ReportRequest) -> Self {
        Self {
            consumption_records: request.consumption_data.len(),
            // Kept in the request; these render as "Invalid Date".
            invalid_dates: request
                .consumption_data
                .iter()
                .filter(|r| parse_timestamp(&r.date).is_none())
                .count(),
            chart_points: request.chart_data.values.len(),
            building_groups: request.building_groups.len(),
            buildings: request.buildings.len(),
            apartments: request.apartments.len(),
        }
    }
}

pub fn parse_request(json: &str) -> ReportResult<(ReportRequest, LoadReport)> {
    let request: ReportRequest = serde_json::from_str(json)?;
    let report = LoadReport::of(&request);
    Ok((request, report))
}

pub fn load_request(path: impl AsRef<Path>) -> ReportResult<(ReportRequest, LoadReport)> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let (request, report) = parse_request(&raw)?;
    info!(
        path = %path.display(),
        records = report.consumption_records,
        invalid_dates = report.invalid_dates,
        "report request loaded"
    );
    Ok((request, report))
}

/// A missing config file means defaults; a malformed one is an error.
pub fn load_config(path: impl AsRef<Path>) -> ReportResult<ReportConfig> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ReportConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    #[test]
    fn test_parse_request_counts_rows() {
        let json = r#"{
            "consumptionData": [
                {"date": "2025-01-02", "consumption": 120},
                {"date": "not a date", "consumption": 80}
            ],
            "chartData": {"labels": ["a", "b"], "values": [1, 2]},
            "buildings": [{"name": "North", "apartmentCount": 4, "deviceCount": 4}]
        }"#;
        let (request, report) = parse_request(json).unwrap();
        assert_eq!(request.buildings[0].name, "North");
        assert_eq!(
            report,
            LoadReport {
                consumption_records: 2,
                invalid_dates: 1,
                chart_points: 2,
                buildings: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_malformed_request_is_json_error() {
        assert!(matches!(parse_request("{"), Err(ReportError::Json(_))));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let cfg = load_config("definitely/not/here/report_config.json").unwrap();
        assert_eq!(cfg.min_chart_space_mm, ReportConfig::default().min_chart_space_mm);
    }
}
