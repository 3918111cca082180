// Page geometry for the PDF report.
//
// The engine walks a cursor down a fixed A4 page, sizing each box from
// its content, and records what to draw as `LayoutElement`s. Nothing
// here touches a PDF backend; the builder replays the result onto a
// page canvas.

pub mod metrics;

use tracing::debug;

use crate::util::{truncate, ELLIPSIS, STAT_VALUE_MAX};
pub use metrics::text_width_mm;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 15.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
/// Space kept free at the bottom of every page for the footer.
pub const FOOTER_RESERVE_MM: f32 = 20.0;
pub const SECTION_GAP_MM: f32 = 6.0;

pub const BOX_HEADER_HEIGHT: f32 = 8.0;
pub const BOX_PADDING: f32 = 4.0;
pub const SCOPE_LINE_HEIGHT: f32 = 4.0;
/// Offset of scope values from their labels, wide enough for the longest label.
pub const SCOPE_LABEL_WIDTH: f32 = 42.0;

pub const STAT_COLUMNS: usize = 3;
pub const STAT_HEADER_HEIGHT: f32 = 10.0;
pub const STAT_ROW_HEIGHT: f32 = 5.0;
pub const STAT_FOOTER_PADDING: f32 = 6.0;
pub const LABEL_GAP_MM: f32 = 2.0;
/// The value never starts later than this far before the column edge.
pub const MIN_VALUE_SPACE_MM: f32 = 10.0;
const CELL_GUTTER_MM: f32 = 2.0;

pub const TITLE_SIZE: f32 = 18.0;
pub const HEADING_SIZE: f32 = 11.0;
pub const BODY_SIZE: f32 = 9.0;
pub const STAT_SIZE: f32 = 8.0;
pub const FOOTER_SIZE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const TEXT: Rgb = Rgb(33, 37, 41);
    pub const MUTED: Rgb = Rgb(108, 117, 125);
    pub const BORDER: Rgb = Rgb(206, 212, 218);
    pub const HEADER_FILL: Rgb = Rgb(232, 240, 254);
    pub const ACCENT: Rgb = Rgb(13, 110, 253);
}

/// A rectangle on the page, in millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutBox {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutElement {
    /// `x` is the left edge after alignment; `y` is the baseline.
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        style: FontStyle,
        color: Rgb,
    },
    Rect {
        rect: LayoutBox,
        stroke: Option<Rgb>,
        fill: Option<Rgb>,
    },
    /// Slot filled with the rendered chart raster.
    Chart { rect: LayoutBox },
}

/// Finished geometry, one element list per page.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    pub pages: Vec<Vec<LayoutElement>>,
}

impl PageLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn elements(&self) -> impl Iterator<Item = &LayoutElement> {
        self.pages.iter().flatten()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements().filter_map(|e| match e {
            LayoutElement::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Placement of one label/value pair in the statistics grid.
#[derive(Debug, Clone, PartialEq)]
pub struct StatCell {
    pub label: String,
    pub label_x: f32,
    pub value: String,
    pub value_x: f32,
    pub value_max_width: f32,
}

/// Distance from a label's x to its value's x: just past the measured
/// label, but never closer than [`MIN_VALUE_SPACE_MM`] to the column edge.
pub fn value_offset(label_width: f32, column_width: f32) -> f32 {
    (label_width + LABEL_GAP_MM).min(column_width - MIN_VALUE_SPACE_MM)
}

/// Shorten `text` with a trailing ellipsis until it fits `max_width`.
pub fn fit_to_width(text: &str, max_width: f32, size: f32, style: FontStyle) -> String {
    if text_width_mm(text, size, style) <= max_width {
        return text.to_string();
    }
    // Widths are additive per char, so the longest fitting prefix is found
    // in one forward pass.
    let ellipsis = metrics::char_units(ELLIPSIS, style);
    if metrics::units_to_mm(ellipsis, size) > max_width {
        return String::new();
    }
    let mut units = ellipsis;
    let mut out = String::new();
    for c in text.chars() {
        units += metrics::char_units(c, style);
        if metrics::units_to_mm(units, size) > max_width {
            break;
        }
        out.push(c);
    }
    out.push(ELLIPSIS);
    out
}

/// Statistic values that overflow are first cut to 24 characters, then
/// shortened further if the column is narrower than that.
pub fn fit_value(value: &str, max_width: f32, size: f32, style: FontStyle) -> String {
    if text_width_mm(value, size, style) <= max_width {
        return value.to_string();
    }
    fit_to_width(&truncate(value, STAT_VALUE_MAX), max_width, size, style)
}

pub fn place_stat_cell(label: &str, value: &str, column_x: f32, column_width: f32) -> StatCell {
    let label = format!("{}:", label);
    let label_width = text_width_mm(&label, STAT_SIZE, FontStyle::Bold);
    let offset = value_offset(label_width, column_width);
    let value_max_width = (column_width - offset - CELL_GUTTER_MM).max(0.0);
    StatCell {
        label: fit_to_width(&label, offset - LABEL_GAP_MM / 2.0, STAT_SIZE, FontStyle::Bold),
        label_x: column_x,
        value: fit_value(value, value_max_width, STAT_SIZE, FontStyle::Regular),
        value_x: column_x + offset,
        value_max_width,
    }
}

/// Split `"Label: value"` at the first colon, keeping the colon on the label.
pub fn split_scope_line(line: &str) -> (String, String) {
    match line.split_once(':') {
        Some((label, value)) => (format!("{}:", label), value.trim().to_string()),
        None => (line.to_string(), String::new()),
    }
}

pub fn scope_box_height(lines: usize) -> f32 {
    BOX_HEADER_HEIGHT + BOX_PADDING + lines as f32 * SCOPE_LINE_HEIGHT + BOX_PADDING
}

pub fn stats_box_height(entries: usize) -> f32 {
    let rows = entries.div_ceil(STAT_COLUMNS);
    STAT_HEADER_HEIGHT + rows as f32 * STAT_ROW_HEIGHT + STAT_FOOTER_PADDING
}

pub fn stat_column_width() -> f32 {
    (CONTENT_WIDTH_MM - 2.0 * BOX_PADDING) / STAT_COLUMNS as f32
}

pub struct LayoutEngine {
    elements: Vec<LayoutElement>,
    cursor: f32,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            cursor: MARGIN_MM,
        }
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    /// Vertical space left above the footer reserve.
    pub fn remaining_height(&self) -> f32 {
        PAGE_HEIGHT_MM - FOOTER_RESERVE_MM - self.cursor
    }

    #[allow(clippy::too_many_arguments)]
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, style: FontStyle, color: Rgb, align: Align) {
        let width = text_width_mm(text, size, style);
        let x = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };
        self.elements.push(LayoutElement::Text {
            text: text.to_string(),
            x,
            y,
            size,
            style,
            color,
        });
    }

    fn rect(&mut self, rect: LayoutBox, stroke: Option<Rgb>, fill: Option<Rgb>) {
        self.elements.push(LayoutElement::Rect { rect, stroke, fill });
    }

    /// Centered title with the generation timestamp beneath it.
    pub fn header(&mut self, title: &str, subtitle: &str) {
        let center = PAGE_WIDTH_MM / 2.0;
        let title = fit_to_width(title, CONTENT_WIDTH_MM, TITLE_SIZE, FontStyle::Bold);
        let y = self.cursor + 6.0;
        self.text(&title, center, y, TITLE_SIZE, FontStyle::Bold, Rgb::ACCENT, Align::Center);
        self.text(subtitle, center, y + 7.0, BODY_SIZE, FontStyle::Regular, Rgb::MUTED, Align::Center);
        self.cursor = y + 7.0 + SECTION_GAP_MM;
    }

    fn box_heading(&mut self, frame: LayoutBox, heading: &str) {
        self.rect(frame, Some(Rgb::BORDER), None);
        let band = LayoutBox {
            height: BOX_HEADER_HEIGHT,
            ..frame
        };
        self.rect(band, None, Some(Rgb::HEADER_FILL));
        self.text(
            heading,
            frame.x + BOX_PADDING,
            frame.y + 5.5,
            HEADING_SIZE,
            FontStyle::Bold,
            Rgb::TEXT,
            Align::Left,
        );
    }

    /// Box of `"Label: value"` lines with values aligned in one column.
    pub fn scope_box(&mut self, heading: &str, lines: &[String]) -> LayoutBox {
        let frame = LayoutBox {
            x: MARGIN_MM,
            y: self.cursor,
            width: CONTENT_WIDTH_MM,
            height: scope_box_height(lines.len()),
        };
        self.box_heading(frame, heading);

        let label_x = frame.x + BOX_PADDING;
        let value_x = label_x + SCOPE_LABEL_WIDTH;
        let value_max = frame.right() - BOX_PADDING - value_x;
        for (i, line) in lines.iter().enumerate() {
            let (label, value) = split_scope_line(line);
            let y = frame.y + BOX_HEADER_HEIGHT + BOX_PADDING + i as f32 * SCOPE_LINE_HEIGHT + 3.0;
            let label = fit_to_width(&label, SCOPE_LABEL_WIDTH - 1.0, BODY_SIZE, FontStyle::Bold);
            let value = fit_to_width(&value, value_max, BODY_SIZE, FontStyle::Regular);
            self.text(&label, label_x, y, BODY_SIZE, FontStyle::Bold, Rgb::TEXT, Align::Left);
            self.text(&value, value_x, y, BODY_SIZE, FontStyle::Regular, Rgb::TEXT, Align::Left);
        }

        self.cursor = frame.bottom() + SECTION_GAP_MM;
        debug!(cursor = self.cursor, lines = lines.len(), "scope box placed");
        frame
    }

    /// Three-column grid of statistics, values placed after their measured labels.
    pub fn statistics_grid(&mut self, heading: &str, entries: &[(&str, String)]) -> LayoutBox {
        let frame = LayoutBox {
            x: MARGIN_MM,
            y: self.cursor,
            width: CONTENT_WIDTH_MM,
            height: stats_box_height(entries.len()),
        };
        self.rect(frame, Some(Rgb::BORDER), None);
        self.text(
            heading,
            frame.x + BOX_PADDING,
            frame.y + 6.5,
            HEADING_SIZE,
            FontStyle::Bold,
            Rgb::TEXT,
            Align::Left,
        );

        let column_width = stat_column_width();
        for (i, (label, value)) in entries.iter().enumerate() {
            let row = i / STAT_COLUMNS;
            let col = i % STAT_COLUMNS;
            let column_x = frame.x + BOX_PADDING + col as f32 * column_width;
            let y = frame.y + STAT_HEADER_HEIGHT + row as f32 * STAT_ROW_HEIGHT + 4.0;
            let cell = place_stat_cell(label, value, column_x, column_width);
            self.text(&cell.label, cell.label_x, y, STAT_SIZE, FontStyle::Bold, Rgb::MUTED, Align::Left);
            self.text(&cell.value, cell.value_x, y, STAT_SIZE, FontStyle::Regular, Rgb::TEXT, Align::Left);
        }

        self.cursor = frame.bottom() + SECTION_GAP_MM;
        debug!(cursor = self.cursor, entries = entries.len(), "statistics grid placed");
        frame
    }

    /// Reserve a full-width slot for a `px_width` x `px_height` raster.
    ///
    /// Returns `None` (and places nothing) unless more than `min_space`
    /// millimetres remain. The slot keeps the raster's aspect ratio and is
    /// shrunk when the full-width height would run into the footer.
    pub fn chart_slot(&mut self, heading: &str, px_width: u32, px_height: u32, min_space: f32) -> Option<LayoutBox> {
        if self.remaining_height() <= min_space || px_width == 0 || px_height == 0 {
            debug!(remaining = self.remaining_height(), "no room for chart");
            return None;
        }
        self.text(heading, MARGIN_MM, self.cursor + 5.0, HEADING_SIZE, FontStyle::Bold, Rgb::TEXT, Align::Left);
        let top = self.cursor + 8.0;
        let available = PAGE_HEIGHT_MM - FOOTER_RESERVE_MM - top;
        let aspect = px_height as f32 / px_width as f32;
        let (mut width, mut height) = (CONTENT_WIDTH_MM, CONTENT_WIDTH_MM * aspect);
        if height > available {
            height = available;
            width = height / aspect;
        }
        let slot = LayoutBox {
            x: MARGIN_MM + (CONTENT_WIDTH_MM - width) / 2.0,
            y: top,
            width,
            height,
        };
        self.cursor = slot.bottom() + SECTION_GAP_MM;
        Some(slot)
    }

    pub fn chart(&mut self, slot: LayoutBox) {
        self.elements.push(LayoutElement::Chart { rect: slot });
    }

    /// Marked stand-in for a section that could not be rendered.
    pub fn placeholder(&mut self, slot: LayoutBox, message: &str) {
        self.rect(slot, Some(Rgb::BORDER), None);
        let y = slot.y + slot.height / 2.0;
        self.text(
            message,
            slot.x + slot.width / 2.0,
            y,
            BODY_SIZE + 1.0,
            FontStyle::Italic,
            Rgb::MUTED,
            Align::Center,
        );
    }

    /// Close the layout, stamping every page with the attribution and a
    /// `Page X of N` counter that uses the final page count.
    pub fn finish(self, attribution: &str) -> PageLayout {
        let mut layout = PageLayout {
            pages: vec![self.elements],
        };
        let total = layout.page_count();
        for (i, page) in layout.pages.iter_mut().enumerate() {
            let mut footer = LayoutEngine::new();
            let rule_y = PAGE_HEIGHT_MM - MARGIN_MM;
            footer.rect(
                LayoutBox {
                    x: MARGIN_MM,
                    y: rule_y,
                    width: CONTENT_WIDTH_MM,
                    height: 0.2,
                },
                None,
                Some(Rgb::BORDER),
            );
            let y = rule_y + 5.0;
            footer.text(attribution, MARGIN_MM, y, FOOTER_SIZE, FontStyle::Regular, Rgb::MUTED, Align::Left);
            footer.text(
                &format!("Page {} of {}", i + 1, total),
                PAGE_WIDTH_MM - MARGIN_MM,
                y,
                FOOTER_SIZE,
                FontStyle::Regular,
                Rgb::MUTED,
                Align::Right,
            );
            page.extend(footer.elements);
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_scope_box_height_grows_per_line() {
        assert_eq!(scope_box_height(2), 8.0 + 4.0 + 8.0 + 4.0);
        assert_eq!(scope_box_height(5), 8.0 + 4.0 + 20.0 + 4.0);
    }

    #[test]
    fn test_stats_box_height_for_seven_entries() {
        assert_eq!(stats_box_height(7), 10.0 + 3.0 * 5.0 + 6.0);
    }

    #[rstest]
    #[case("Selection: Building - Harbor View", "Selection:", "Building - Harbor View")]
    #[case("Period: Jan 1, 2025 - Jan 31, 2025", "Period:", "Jan 1, 2025 - Jan 31, 2025")]
    #[case("Water Cost (Last Month): 12:30", "Water Cost (Last Month):", "12:30")]
    #[case("No colon here", "No colon here", "")]
    fn test_split_scope_line(#[case] line: &str, #[case] label: &str, #[case] value: &str) {
        assert_eq!(split_scope_line(line), (label.to_string(), value.to_string()));
    }

    #[test]
    fn test_scope_values_share_one_column() {
        let mut engine = LayoutEngine::new();
        let lines = vec![
            "Selection: Building - Harbor View".to_string(),
            "Water Cost (Last Month): 41.20 EUR".to_string(),
        ];
        engine.scope_box("Analysis Scope", &lines);
        let layout = engine.finish("test");
        let value_xs: Vec<f32> = layout
            .elements()
            .filter_map(|e| match e {
                LayoutElement::Text { text, x, .. } if text == "Building - Harbor View" || text == "41.20 EUR" => Some(*x),
                _ => None,
            })
            .collect();
        assert_eq!(value_xs.len(), 2);
        assert_eq!(value_xs[0], value_xs[1]);
    }

    #[test]
    fn test_short_label_value_follows_label() {
        let column_width = stat_column_width();
        let cell = place_stat_cell("Today", "12 L", 20.0, column_width);
        let label_width = text_width_mm("Today:", STAT_SIZE, FontStyle::Bold);
        assert!((cell.value_x - (20.0 + label_width + LABEL_GAP_MM)).abs() < 1e-4);
        assert_eq!(cell.value, "12 L");
    }

    #[test]
    fn test_long_label_offset_is_clamped() {
        let column_width = stat_column_width();
        let label = "Average Consumption Per Apartment During The Previous Quarter";
        let label_width = text_width_mm(&format!("{}:", label), STAT_SIZE, FontStyle::Bold);
        assert!(label_width + LABEL_GAP_MM > column_width - MIN_VALUE_SPACE_MM);

        let cell = place_stat_cell(label, "123,456,789.00 liters of water", 19.0, column_width);
        assert!((cell.value_x - (19.0 + column_width - MIN_VALUE_SPACE_MM)).abs() < 1e-4);
        let value_width = text_width_mm(&cell.value, STAT_SIZE, FontStyle::Regular);
        assert!(cell.value_x + value_width <= 19.0 + column_width);
        assert!(cell.value.ends_with('…'));
    }

    #[test]
    fn test_fit_value_truncates_to_24_first() {
        let long = "abcdefghijklmnopqrstuvwxyzABC";
        let fitted = fit_value(long, 1000.0, STAT_SIZE, FontStyle::Regular);
        assert_eq!(fitted, long);
        let roomy = text_width_mm(&truncate(long, 24), STAT_SIZE, FontStyle::Regular);
        let fitted = fit_value(long, roomy, STAT_SIZE, FontStyle::Regular);
        assert_eq!(fitted, "abcdefghijklmnopqrstuvwx…");
    }

    #[test]
    fn test_fit_to_width_keeps_longest_prefix() {
        let max = text_width_mm("Harbor…", BODY_SIZE, FontStyle::Regular);
        assert_eq!(fit_to_width("Harbor View", max, BODY_SIZE, FontStyle::Regular), "Harbor…");
        assert_eq!(fit_to_width("Harbor View", 0.5, BODY_SIZE, FontStyle::Regular), "");
        assert_eq!(fit_to_width("Pier", 100.0, BODY_SIZE, FontStyle::Regular), "Pier");
    }

    #[test]
    fn test_very_long_title_is_cut_in_one_pass() {
        let title = "W".repeat(200_000);
        let fitted = fit_to_width(&title, CONTENT_WIDTH_MM, TITLE_SIZE, FontStyle::Bold);
        assert!(fitted.ends_with(ELLIPSIS));
        assert!(text_width_mm(&fitted, TITLE_SIZE, FontStyle::Bold) <= CONTENT_WIDTH_MM);
        let one_more = format!("W{}", fitted);
        assert!(text_width_mm(&one_more, TITLE_SIZE, FontStyle::Bold) > CONTENT_WIDTH_MM);

        let mut engine = LayoutEngine::new();
        engine.header(&title, "Generated: Feb 1, 2025 08:30 UTC");
        let layout = engine.finish("attribution");
        assert!(layout.texts().any(|t| t == fitted));
    }

    #[test]
    fn test_chart_slot_requires_min_space() {
        let mut engine = LayoutEngine::new();
        engine.cursor = PAGE_HEIGHT_MM - FOOTER_RESERVE_MM - 80.0;
        assert!(engine.chart_slot("Trend", 800, 400, 80.0).is_none());

        let mut engine = LayoutEngine::new();
        engine.cursor = 100.0;
        let slot = engine.chart_slot("Trend", 800, 400, 80.0).unwrap();
        assert_eq!(slot.width, CONTENT_WIDTH_MM);
        assert_eq!(slot.height, CONTENT_WIDTH_MM / 2.0);
        assert!(slot.bottom() <= PAGE_HEIGHT_MM - FOOTER_RESERVE_MM);
    }

    #[test]
    fn test_chart_slot_shrinks_to_fit() {
        let mut engine = LayoutEngine::new();
        engine.cursor = 190.0;
        let slot = engine.chart_slot("Trend", 800, 400, 80.0).unwrap();
        assert!(slot.width < CONTENT_WIDTH_MM);
        assert!((slot.width / slot.height - 2.0).abs() < 1e-4);
        assert!((slot.bottom() - (PAGE_HEIGHT_MM - FOOTER_RESERVE_MM)).abs() < 1e-3);
    }

    #[test]
    fn test_footer_counts_pages() {
        let layout = LayoutEngine::new().finish("Attribution");
        assert_eq!(layout.page_count(), 1);
        let texts: Vec<&str> = layout.texts().collect();
        assert!(texts.contains(&"Page 1 of 1"));
        assert!(texts.contains(&"Attribution"));
    }
}
