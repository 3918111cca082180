// Single-page PDF report.
//
// `PdfReportBuilder` lays the page out with `LayoutEngine`, asks the
// chart rasterizer for a picture, then replays the layout onto a
// `PageCanvas`. Chart failures degrade to a marked placeholder and
// never fail the build.
use chrono::{DateTime, Utc};
use image::DynamicImage;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Rect,
    path::PaintMode,
};
use tracing::{info, warn};

use crate::chart::{ChartRasterizer, RasterImage};
use crate::config::ReportConfig;
use crate::error::ReportResult;
use crate::layout::{
    stats_box_height, FontStyle, LayoutBox, LayoutElement, LayoutEngine, PageLayout, Rgb,
    PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use crate::stats::AnalyticsSummary;
use crate::types::{ChartSeries, ReportArtifact, ReportRequest, ResolvedPeriod};
use crate::util::{artifact_filename, format_date_value, format_datetime};

pub const DEFAULT_TITLE: &str = "Water Consumption Analytics Report";
pub const CHART_PLACEHOLDER: &str = "Chart data unavailable for PDF export";
const IMAGE_DPI: f32 = 300.0;

/// Drawing surface for a laid-out page. Coordinates are millimetres from
/// the top-left corner; text `y` is the baseline.
pub trait PageCanvas {
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, style: FontStyle, color: Rgb);
    fn rect(&mut self, rect: &LayoutBox, stroke: Option<Rgb>, fill: Option<Rgb>);
    fn image(&mut self, image: &RasterImage, rect: &LayoutBox);
    fn next_page(&mut self);
}

/// Replay a finished layout onto `canvas`. Chart slots stay empty when no
/// raster is supplied.
pub fn render_layout<C: PageCanvas>(layout: &PageLayout, chart: Option<&RasterImage>, canvas: &mut C) {
    for (i, page) in layout.pages.iter().enumerate() {
        if i > 0 {
            canvas.next_page();
        }
        for element in page {
            match element {
                LayoutElement::Text {
                    text,
                    x,
                    y,
                    size,
                    style,
                    color,
                } => canvas.text(text, *x, *y, *size, *style, *color),
                LayoutElement::Rect { rect, stroke, fill } => canvas.rect(rect, *stroke, *fill),
                LayoutElement::Chart { rect } => {
                    if let Some(img) = chart {
                        canvas.image(img, rect);
                    }
                }
            }
        }
    }
}

fn pdf_color(c: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f32::from(c.0) / 255.0,
        f32::from(c.1) / 255.0,
        f32::from(c.2) / 255.0,
        None,
    ))
}

/// [`PageCanvas`] writing A4 pages through `printpdf` with the built-in
/// Helvetica faces.
pub struct PdfCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl PdfCanvas {
    pub fn new(title: &str) -> ReportResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let italic = doc.add_builtin_font(BuiltinFont::HelveticaOblique)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            italic,
        })
    }

    pub fn finish(self) -> ReportResult<Vec<u8>> {
        Ok(self.doc.save_to_bytes()?)
    }

    fn font(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

impl PageCanvas for PdfCanvas {
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, style: FontStyle, color: Rgb) {
        self.layer.set_fill_color(pdf_color(color));
        let font = self.font(style).clone();
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT_MM - y), &font);
    }

    fn rect(&mut self, rect: &LayoutBox, stroke: Option<Rgb>, fill: Option<Rgb>) {
        let mode = match (stroke, fill) {
            (Some(_), Some(_)) => PaintMode::FillStroke,
            (Some(_), None) => PaintMode::Stroke,
            (None, Some(_)) => PaintMode::Fill,
            (None, None) => return,
        };
        if let Some(c) = stroke {
            self.layer.set_outline_color(pdf_color(c));
            self.layer.set_outline_thickness(0.5);
        }
        if let Some(c) = fill {
            self.layer.set_fill_color(pdf_color(c));
        }
        let shape = Rect::new(
            Mm(rect.x),
            Mm(PAGE_HEIGHT_MM - rect.bottom()),
            Mm(rect.right()),
            Mm(PAGE_HEIGHT_MM - rect.y),
        )
        .with_mode(mode);
        self.layer.add_rect(shape);
    }

    fn image(&mut self, image: &RasterImage, rect: &LayoutBox) {
        let natural_w = image.width as f32 / IMAGE_DPI * 25.4;
        let natural_h = image.height as f32 / IMAGE_DPI * 25.4;
        let picture = Image::from_dynamic_image(&DynamicImage::ImageRgb8(image.to_rgb_image()));
        picture.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(rect.x)),
                translate_y: Some(Mm(PAGE_HEIGHT_MM - rect.bottom())),
                scale_x: Some(rect.width / natural_w),
                scale_y: Some(rect.height / natural_h),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }

    fn next_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
    }
}

/// Scope lines in display order; optional lines are left out entirely
/// when their data is missing.
pub fn scope_lines(request: &ReportRequest, period: &ResolvedPeriod) -> Vec<String> {
    let selection = &request.selection;
    let kind = capitalize(selection.kind.trim());
    let mut lines = vec![
        if kind.is_empty() {
            format!("Selection: {}", selection.name)
        } else {
            format!("Selection: {} - {}", kind, selection.name)
        },
        format!(
            "Period: {} - {}",
            format_date_value(&period.from),
            format_date_value(&period.to)
        ),
    ];
    if let Some(details) = &selection.details {
        if let Some(address) = details.address() {
            lines.push(format!("Address: {}", address));
        }
        if let Some(tenant) = details.tenant.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            lines.push(format!("Tenant: {}", tenant));
        }
    }
    if let Some(cost) = &request.export_data.water_cost_last_month {
        lines.push(format!("Water Cost (Last Month): {}", cost));
    }
    lines
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn highlight_entries(summary: &AnalyticsSummary) -> Vec<(&'static str, String)> {
    vec![
        ("Avg Daily", summary.average_consumption.clone()),
        ("Peak Day", summary.peak_day.clone()),
        ("Lowest Day", summary.lowest_day.clone()),
        ("Occupancy", summary.occupancy_rate.clone()),
        ("Top Building", summary.most_efficient_building.clone()),
        ("Efficiency", summary.system_efficiency_score.clone()),
    ]
}

pub struct PdfReportBuilder {
    config: ReportConfig,
    rasterizer: ChartRasterizer,
}

impl PdfReportBuilder {
    pub fn new(config: ReportConfig) -> Self {
        let rasterizer = ChartRasterizer::new(config.chart.clone());
        Self { config, rasterizer }
    }

    pub fn build(&self, request: &ReportRequest) -> ReportResult<ReportArtifact> {
        self.build_at(request, Utc::now())
    }

    /// Build with an explicit generation time, for reproducible output.
    pub fn build_at(&self, request: &ReportRequest, generated_at: DateTime<Utc>) -> ReportResult<ReportArtifact> {
        let period = request.period.resolve()?;
        let (layout, chart) = self.layout(request, &period, generated_at);

        let mut canvas = PdfCanvas::new(self.title(request))?;
        render_layout(&layout, chart.as_ref(), &mut canvas);
        let bytes = canvas.finish()?;

        let filename = artifact_filename(&self.config.artifact_prefix, &period.from, &period.to, "pdf");
        info!(file = %filename, bytes = bytes.len(), pages = layout.page_count(), "pdf report built");
        Ok(ReportArtifact { filename, bytes })
    }

    fn title<'a>(&self, request: &'a ReportRequest) -> &'a str {
        let title = request.title.trim();
        if title.is_empty() {
            DEFAULT_TITLE
        } else {
            title
        }
    }

    /// Compute the page geometry and, when it gets a slot, the chart raster.
    pub fn layout(
        &self,
        request: &ReportRequest,
        period: &ResolvedPeriod,
        generated_at: DateTime<Utc>,
    ) -> (PageLayout, Option<RasterImage>) {
        let summary = AnalyticsSummary::compute(request);
        let mut engine = LayoutEngine::new();

        engine.header(
            self.title(request),
            &format!("Generated: {}", format_datetime(&generated_at)),
        );
        engine.scope_box("Analysis Scope", &scope_lines(request, period));
        engine.statistics_grid("Consumption Statistics", &request.export_data.entries());
        let chart = self.place_chart(&mut engine, &request.chart_data);

        let highlights = highlight_entries(&summary);
        if engine.remaining_height() >= stats_box_height(highlights.len()) {
            engine.statistics_grid("Highlights", &highlights);
        }

        (engine.finish(&self.config.attribution), chart)
    }

    fn place_chart(&self, engine: &mut LayoutEngine, series: &ChartSeries) -> Option<RasterImage> {
        let opts = &self.config.chart;
        let slot = engine.chart_slot(
            "Consumption Trend",
            opts.width,
            opts.height,
            self.config.min_chart_space_mm,
        )?;
        if series.is_empty() {
            engine.placeholder(slot, CHART_PLACEHOLDER);
            return None;
        }
        match self.rasterizer.render(series, opts.width, opts.height) {
            Ok(image) => {
                engine.chart(slot);
                Some(image)
            }
            Err(e) => {
                warn!(error = %e, "chart rendering failed, using placeholder");
                engine.placeholder(slot, CHART_PLACEHOLDER);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExportSummary, Period, Scalar, Selection, SelectionDetails};

    #[derive(Default)]
    struct RecordingCanvas {
        texts: Vec<(String, FontStyle)>,
        rects: usize,
        images: Vec<LayoutBox>,
        pages: usize,
    }

    impl PageCanvas for RecordingCanvas {
        fn text(&mut self, text: &str, _x: f32, _y: f32, _size: f32, style: FontStyle, _color: Rgb) {
            self.texts.push((text.to_string(), style));
        }
        fn rect(&mut self, _rect: &LayoutBox, _stroke: Option<Rgb>, _fill: Option<Rgb>) {
            self.rects += 1;
        }
        fn image(&mut self, _image: &RasterImage, rect: &LayoutBox) {
            self.images.push(*rect);
        }
        fn next_page(&mut self) {
            self.pages += 1;
        }
    }

    fn request() -> ReportRequest {
        ReportRequest {
            title: "Harbor View - January".into(),
            period: Period::new("2025-01-05T10:00:00Z", "2025-02-01T00:00:00Z"),
            selection: Selection {
                kind: "building".into(),
                name: "Harbor View".into(),
                details: None,
            },
            chart_data: ChartSeries {
                labels: vec!["Jan 5".into(), "Jan 6".into(), "Jan 7".into()],
                values: vec![120.0, 95.5, 210.0],
            },
            ..Default::default()
        }
    }

    fn generated() -> DateTime<Utc> {
        crate::util::parse_timestamp("2025-02-01T08:30:00Z").unwrap()
    }

    fn replay(req: &ReportRequest) -> RecordingCanvas {
        let builder = PdfReportBuilder::new(ReportConfig::default());
        let period = req.period.resolve().unwrap();
        let (layout, chart) = builder.layout(req, &period, generated());
        let mut canvas = RecordingCanvas::default();
        render_layout(&layout, chart.as_ref(), &mut canvas);
        canvas
    }

    #[test]
    fn test_scope_lines_minimal() {
        let req = request();
        let lines = scope_lines(&req, &req.period.resolve().unwrap());
        assert_eq!(
            lines,
            vec![
                "Selection: Building - Harbor View".to_string(),
                "Period: Jan 5, 2025 - Feb 1, 2025".to_string(),
            ]
        );
    }

    #[test]
    fn test_scope_lines_with_optional_fields() {
        let mut req = request();
        req.selection.details = Some(SelectionDetails {
            street: Some("Pier 4".into()),
            city: Some("Kiel".into()),
            zip: None,
            tenant: Some("M. Jansen".into()),
        });
        req.export_data = ExportSummary {
            water_cost_last_month: Some(Scalar::Text("41.20 EUR".into())),
            ..Default::default()
        };
        let lines = scope_lines(&req, &req.period.resolve().unwrap());
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], "Address: Pier 4, Kiel");
        assert_eq!(lines[3], "Tenant: M. Jansen");
        assert_eq!(lines[4], "Water Cost (Last Month): 41.20 EUR");
    }

    #[test]
    fn test_chart_is_embedded() {
        let canvas = replay(&request());
        assert_eq!(canvas.images.len(), 1);
        assert!(!canvas.texts.iter().any(|(t, _)| t == CHART_PLACEHOLDER));
        assert!(canvas.texts.iter().any(|(t, _)| t == "Page 1 of 1"));
        assert_eq!(canvas.pages, 0);
    }

    #[test]
    fn test_broken_chart_degrades_to_placeholder() {
        let mut req = request();
        req.chart_data.labels.pop();
        let canvas = replay(&req);
        assert!(canvas.images.is_empty());
        assert!(canvas
            .texts
            .iter()
            .any(|(t, style)| t == CHART_PLACEHOLDER && *style == FontStyle::Italic));
    }

    #[test]
    fn test_empty_series_uses_placeholder() {
        let mut req = request();
        req.chart_data = ChartSeries::default();
        let canvas = replay(&req);
        assert!(canvas.images.is_empty());
        assert!(canvas.texts.iter().any(|(t, _)| t == CHART_PLACEHOLDER));
    }

    #[test]
    fn test_statistics_show_na_for_missing_values() {
        let canvas = replay(&request());
        assert!(canvas.texts.iter().any(|(t, _)| t == "Yesterday:"));
        assert!(canvas.texts.iter().filter(|(t, _)| t == "N/A").count() >= 7);
    }

    #[test]
    fn test_build_writes_pdf() {
        let builder = PdfReportBuilder::new(ReportConfig::default());
        let artifact = builder.build_at(&request(), generated()).unwrap();
        assert_eq!(
            artifact.filename,
            "water-consumption-analytics-2025-01-05-to-2025-02-01.pdf"
        );
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_period_is_fatal() {
        let mut req = request();
        req.period.to = None;
        let builder = PdfReportBuilder::new(ReportConfig::default());
        assert!(matches!(
            builder.build(&req),
            Err(crate::error::ReportError::InvalidPeriod(_))
        ));
    }
}
