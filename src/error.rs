use thiserror::Error;

/// Result alias used by every fallible report-building call.
pub type ReportResult<T> = Result<T, ReportError>;

/// Failures raised while synthesizing a chart raster.
///
/// These never abort a PDF build; the builder swaps in a placeholder.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Invalid chart dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Series mismatch: {labels} labels for {values} values")]
    SeriesMismatch { labels: usize, values: usize },

    #[error("PNG encode error: {0}")]
    Encode(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
