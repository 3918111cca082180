// Report engine for water-metering analytics: a one-page PDF summary with
// an embedded consumption chart and a six-sheet XLSX workbook, both built
// from one JSON-shaped `ReportRequest`.
pub mod chart;
pub mod config;
pub mod error;
pub mod layout;
pub mod loader;
pub mod output;
pub mod pdf;
pub mod stats;
pub mod types;
pub mod util;
pub mod workbook;

pub use config::{ChartKind, ChartOptions, ReportConfig};
pub use error::{ChartError, ReportError, ReportResult};
pub use pdf::PdfReportBuilder;
pub use stats::AnalyticsSummary;
pub use types::{ReportArtifact, ReportRequest};
pub use workbook::WorkbookBuilder;
