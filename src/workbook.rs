// Six-sheet XLSX export.
//
// Sheets are first assembled as plain `Sheet` values (easy to inspect
// in tests) and then written with `rust_xlsxwriter`. Sheet order is part
// of the output contract.
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use tracing::info;

use crate::config::ReportConfig;
use crate::error::ReportResult;
use crate::stats::{
    building_efficiency_label, building_occupancy_label, consumption_level, consumption_note,
    group_efficiency_label, AnalyticsSummary,
};
use crate::types::{ReportArtifact, ReportRequest, ResolvedPeriod};
use crate::util::{artifact_filename, format_date, format_date_value, format_datetime};

pub const SHEET_NAMES: [&str; 6] = [
    "Summary",
    "Consumption Data",
    "Building Groups",
    "Buildings",
    "Apartments",
    "Analytics",
];

pub const DATA_COLUMN_WIDTH: f64 = 20.0;
pub const HEADER_ROW_HEIGHT: f64 = 20.0;
pub const TITLE_ROW_HEIGHT: f64 = 24.0;
pub const NO_CONSUMPTION_DATA: &str = "No consumption data available for the selected period";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bold(String),
    Empty,
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    fn count(n: impl Into<f64>) -> Self {
        Cell::Number(n.into())
    }

    fn opt_text(s: Option<&str>) -> Self {
        s.map_or(Cell::Empty, |s| Cell::Text(s.to_string()))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) | Cell::Bold(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: &'static str,
    pub rows: Vec<Vec<Cell>>,
    pub column_widths: Vec<f64>,
    /// Row styled as a header, with its fixed height.
    pub header: Option<(u32, f64)>,
}

impl Sheet {
    /// Plain data sheet: one header row, uniform column widths.
    fn data(name: &'static str, headers: &[&str], body: Vec<Vec<Cell>>) -> Self {
        let mut rows = Vec::with_capacity(body.len() + 1);
        rows.push(headers.iter().map(|h| Cell::text(*h)).collect());
        rows.extend(body);
        Self {
            name,
            rows,
            column_widths: vec![DATA_COLUMN_WIDTH; headers.len()],
            header: Some((0, HEADER_ROW_HEIGHT)),
        }
    }
}

fn pair(label: &str, value: impl Into<String>) -> Vec<Cell> {
    vec![Cell::text(label), Cell::Text(value.into())]
}

pub fn summary_sheet(
    request: &ReportRequest,
    period: &ResolvedPeriod,
    generated_at: DateTime<Utc>,
) -> Sheet {
    let mut rows = vec![
        vec![Cell::Bold("Water Consumption Analytics Report".into())],
        pair("Report Title", request.title.as_str()),
        pair("Generated", format_datetime(&generated_at)),
        pair(
            "Period",
            format!(
                "{} - {}",
                format_date_value(&period.from),
                format_date_value(&period.to)
            ),
        ),
        pair("Selection Type", request.selection.kind.as_str()),
        pair("Selection Name", request.selection.name.as_str()),
        vec![],
        vec![Cell::Bold("Consumption Statistics".into())],
    ];
    rows.extend(
        request
            .export_data
            .entries()
            .into_iter()
            .map(|(label, value)| pair(label, value)),
    );
    rows.push(vec![]);
    rows.push(vec![Cell::Bold("Record Counts".into())]);
    let counts = [
        ("Consumption Records", request.consumption_data.len()),
        ("Building Groups", request.building_groups.len()),
        ("Buildings", request.buildings.len()),
        ("Apartments", request.apartments.len()),
    ];
    for (label, n) in counts {
        rows.push(vec![Cell::text(label), Cell::Number(n as f64)]);
    }

    Sheet {
        name: SHEET_NAMES[0],
        rows,
        column_widths: vec![30.0, 45.0],
        header: Some((0, TITLE_ROW_HEIGHT)),
    }
}

pub fn consumption_sheet(request: &ReportRequest) -> Sheet {
    let headers = ["Date", "Consumption", "Period", "Level", "Notes"];
    if request.consumption_data.is_empty() {
        return Sheet {
            name: SHEET_NAMES[1],
            rows: vec![vec![Cell::text(NO_CONSUMPTION_DATA)]],
            column_widths: vec![DATA_COLUMN_WIDTH; headers.len()],
            header: None,
        };
    }
    let body = request
        .consumption_data
        .iter()
        .map(|r| {
            vec![
                Cell::Text(format_date(&r.date)),
                Cell::Number(r.consumption),
                Cell::text(request.selection.kind.as_str()),
                Cell::text(consumption_level(r.consumption)),
                Cell::text(consumption_note(r.consumption)),
            ]
        })
        .collect();
    Sheet::data(SHEET_NAMES[1], &headers, body)
}

pub fn groups_sheet(request: &ReportRequest) -> Sheet {
    let body = request
        .building_groups
        .iter()
        .map(|g| {
            vec![
                Cell::text(g.name.as_str()),
                Cell::count(g.building_count),
                Cell::count(g.apartment_count),
                Cell::count(g.device_count),
                Cell::text(group_efficiency_label(g)),
            ]
        })
        .collect();
    Sheet::data(
        SHEET_NAMES[2],
        &["Name", "Buildings", "Apartments", "Devices", "Efficiency"],
        body,
    )
}

pub fn buildings_sheet(request: &ReportRequest) -> Sheet {
    let body = request
        .buildings
        .iter()
        .map(|b| {
            vec![
                Cell::text(b.name.as_str()),
                Cell::opt_text(b.group_name.as_deref()),
                Cell::opt_text(b.address.as_deref()),
                Cell::count(b.apartment_count),
                Cell::count(b.device_count),
                Cell::text(building_occupancy_label(b)),
                Cell::text(building_efficiency_label(b)),
            ]
        })
        .collect();
    Sheet::data(
        SHEET_NAMES[3],
        &[
            "Name",
            "Group",
            "Address",
            "Apartments",
            "Devices",
            "Occupancy",
            "Efficiency",
        ],
        body,
    )
}

pub fn apartments_sheet(request: &ReportRequest) -> Sheet {
    let body = request
        .apartments
        .iter()
        .map(|a| {
            vec![
                Cell::text(a.number.as_str()),
                Cell::opt_text(a.building_name.as_deref()),
                a.floor.map_or(Cell::Empty, Cell::count),
                Cell::opt_text(a.apartment_type.as_deref()),
                a.size.map_or(Cell::Empty, Cell::Number),
                Cell::opt_text(a.tenant.as_deref()),
                Cell::text(if a.is_occupied() { "Occupied" } else { "Vacant" }),
                Cell::count(a.device_count),
            ]
        })
        .collect();
    Sheet::data(
        SHEET_NAMES[4],
        &[
            "Number",
            "Building",
            "Floor",
            "Type",
            "Size (m²)",
            "Tenant",
            "Status",
            "Devices",
        ],
        body,
    )
}

pub fn analytics_sheet(summary: &AnalyticsSummary) -> Sheet {
    let mut rows = vec![vec![Cell::text("Metric"), Cell::text("Value")]];
    rows.extend(summary.entries().into_iter().map(|(k, v)| pair(k, v)));
    Sheet {
        name: SHEET_NAMES[5],
        rows,
        column_widths: vec![32.0, 40.0],
        header: Some((0, HEADER_ROW_HEIGHT)),
    }
}

pub struct WorkbookBuilder {
    config: ReportConfig,
}

impl WorkbookBuilder {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, request: &ReportRequest) -> ReportResult<ReportArtifact> {
        self.build_at(request, Utc::now())
    }

    pub fn build_at(&self, request: &ReportRequest, generated_at: DateTime<Utc>) -> ReportResult<ReportArtifact> {
        let period = request.period.resolve()?;
        let sheets = self.sheets(request, &period, generated_at);
        let bytes = write_xlsx(&sheets)?;
        let filename = artifact_filename(&self.config.artifact_prefix, &period.from, &period.to, "xlsx");
        info!(file = %filename, bytes = bytes.len(), sheets = sheets.len(), "workbook built");
        Ok(ReportArtifact { filename, bytes })
    }

    /// All six sheets in their fixed order.
    pub fn sheets(
        &self,
        request: &ReportRequest,
        period: &ResolvedPeriod,
        generated_at: DateTime<Utc>,
    ) -> Vec<Sheet> {
        let summary = AnalyticsSummary::compute(request);
        vec![
            summary_sheet(request, period, generated_at),
            consumption_sheet(request),
            groups_sheet(request),
            buildings_sheet(request),
            apartments_sheet(request),
            analytics_sheet(&summary),
        ]
    }
}

pub fn write_xlsx(sheets: &[Sheet]) -> ReportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xE8F0FE))
        .set_border(FormatBorder::Thin);
    let bold = Format::new().set_bold();

    for sheet in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet.name)?;
        for (col, width) in sheet.column_widths.iter().enumerate() {
            ws.set_column_width(col as u16, *width)?;
        }
        if let Some((row, height)) = sheet.header {
            ws.set_row_height(row, height)?;
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            let r = r as u32;
            let is_header = sheet.header.is_some_and(|(h, _)| h == r);
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell {
                    Cell::Text(s) if is_header => {
                        ws.write_string_with_format(r, c, s, &header_format)?;
                    }
                    Cell::Text(s) => {
                        ws.write_string(r, c, s)?;
                    }
                    Cell::Bold(s) => {
                        ws.write_string_with_format(r, c, s, &bold)?;
                    }
                    Cell::Number(n) => {
                        ws.write_number(r, c, *n)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }
    Ok(workbook.save_to_buffer()?)
}
