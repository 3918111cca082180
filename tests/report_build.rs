use std::io::{Cursor, Read};

use rstest::{fixture, rstest};
use water_report::util::parse_timestamp;
use water_report::workbook::SHEET_NAMES;
use water_report::{PdfReportBuilder, ReportConfig, ReportError, ReportRequest, WorkbookBuilder};

const REQUEST: &str = r#"{
    "title": "January Report",
    "period": {"from": "2025-01-05T10:00:00Z", "to": "2025-02-01"},
    "selection": {
        "type": "apartment",
        "name": "Apt 4B",
        "details": {"street": "Elm Street 4", "city": "Springfield", "zip": "12345", "tenant": "J. Doe"}
    },
    "consumptionData": [
        {"date": "2025-01-06", "consumption": 180},
        {"date": "2025-01-07", "consumption": 240.5},
        {"date": "2025-01-08", "consumption": 35}
    ],
    "chartData": {"labels": ["Jan 6", "Jan 7", "Jan 8"], "values": [180, 240.5, 35]},
    "exportData": {"today": 35, "yesterday": "240.5 L", "waterCostLastMonth": "€12.40"},
    "buildingGroups": [{"name": "East", "buildingCount": 2, "apartmentCount": 24, "deviceCount": 30}],
    "buildings": [
        {"name": "Elm 4", "groupName": "East", "apartmentCount": 12, "deviceCount": 14},
        {"name": "Elm 6", "groupName": "East", "apartmentCount": 12, "deviceCount": 16}
    ],
    "apartments": [
        {"number": "4B", "buildingName": "Elm 4", "floor": 4, "apartmentType": "2BR", "size": 64.5, "tenant": "J. Doe", "deviceCount": 2},
        {"number": "4C", "buildingName": "Elm 4", "floor": 4, "apartmentType": "1BR", "size": 41, "tenant": "Vacant", "deviceCount": 1}
    ]
}"#;

#[fixture]
fn request() -> ReportRequest {
    serde_json::from_str(REQUEST).unwrap()
}

fn sheet_names(xlsx: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(xlsx)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("xl/workbook.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml.split("<sheet ")
        .skip(1)
        .filter_map(|tag| {
            let start = tag.find("name=\"")? + 6;
            let end = start + tag[start..].find('"')?;
            Some(tag[start..end].to_string())
        })
        .collect()
}

#[rstest]
fn workbook_has_six_sheets_in_order(request: ReportRequest) {
    let artifact = WorkbookBuilder::new(ReportConfig::default()).build(&request).unwrap();
    assert_eq!(sheet_names(&artifact.bytes), SHEET_NAMES.to_vec());
}

#[rstest]
fn empty_request_still_yields_six_sheets() {
    let mut request = ReportRequest::default();
    request.period = serde_json::from_str(r#"{"from": "2025-03-01", "to": "2025-03-31"}"#).unwrap();
    let artifact = WorkbookBuilder::new(ReportConfig::default()).build(&request).unwrap();
    assert_eq!(sheet_names(&artifact.bytes), SHEET_NAMES.to_vec());
}

#[rstest]
fn artifacts_are_named_after_the_period(request: ReportRequest) {
    let config = ReportConfig::default();
    let at = parse_timestamp("2025-02-02T09:00:00Z").unwrap();
    let pdf = PdfReportBuilder::new(config.clone()).build_at(&request, at).unwrap();
    let xlsx = WorkbookBuilder::new(config).build_at(&request, at).unwrap();
    assert_eq!(pdf.filename, "water-consumption-analytics-2025-01-05-to-2025-02-01.pdf");
    assert_eq!(xlsx.filename, "water-consumption-analytics-2025-01-05-to-2025-02-01.xlsx");
}

#[rstest]
fn pdf_is_a_pdf_document(request: ReportRequest) {
    let pdf = PdfReportBuilder::new(ReportConfig::default()).build(&request).unwrap();
    assert!(pdf.bytes.starts_with(b"%PDF"));
    assert!(pdf.bytes.len() > 1000);
}

#[rstest]
fn pdf_survives_inconsistent_chart_data(mut request: ReportRequest) {
    request.chart_data.values.pop();
    let pdf = PdfReportBuilder::new(ReportConfig::default()).build(&request).unwrap();
    assert!(pdf.bytes.starts_with(b"%PDF"));
}

#[rstest]
#[case(r#"{}"#)]
#[case(r#"{"from": "2025-01-01"}"#)]
#[case(r#"{"from": "yesterday", "to": "2025-01-31"}"#)]
#[case(r#"{"from": "2025-02-01", "to": "2025-01-01"}"#)]
fn invalid_period_fails_both_builders(#[case] period: &str) {
    let mut request = ReportRequest::default();
    request.period = serde_json::from_str(period).unwrap();
    let config = ReportConfig::default();
    assert!(matches!(
        PdfReportBuilder::new(config.clone()).build(&request),
        Err(ReportError::InvalidPeriod(_))
    ));
    assert!(matches!(
        WorkbookBuilder::new(config).build(&request),
        Err(ReportError::InvalidPeriod(_))
    ));
}
