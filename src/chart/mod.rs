// Raster chart synthesis.
//
// Charts are drawn from primitives on a `RasterSurface`; no plotting
// library is involved. `PixmapSurface` is the software backend.

pub mod glyphs;
pub mod surface;

use image::{Rgb, RgbImage};
use tracing::debug;

use crate::config::{ChartKind, ChartOptions};
use crate::error::ChartError;
use crate::types::ChartSeries;
use crate::util::{format_fixed, truncate, AXIS_LABEL_MAX};

pub use surface::{PixmapSurface, RasterSurface, Rgba, TextAlign};

pub const RIGHT_MARGIN: f32 = 20.0;
pub const BOTTOM_MARGIN: f32 = 50.0;
/// Fraction of each x step covered by a bar.
pub const BAR_FILL: f32 = 0.7;
/// Tallest bar reaches this fraction of the plot height.
pub const HEADROOM: f32 = 0.9;
pub const MAX_AXIS_LABELS: usize = 10;

/// A finished chart: RGBA pixels (premultiplied, as drawn) plus PNG bytes.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub png: Vec<u8>,
}

impl RasterImage {
    /// Drop alpha for embedding; transparent pixels become white.
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut img = RgbImage::new(self.width, self.height);
        for (i, pixel) in img.pixels_mut().enumerate() {
            let offset = i * 4;
            let a = f32::from(self.rgba[offset + 3]) / 255.0;
            *pixel = if a > 0.0 {
                Rgb([
                    (f32::from(self.rgba[offset]) / a).min(255.0) as u8,
                    (f32::from(self.rgba[offset + 1]) / a).min(255.0) as u8,
                    (f32::from(self.rgba[offset + 2]) / a).min(255.0) as u8,
                ])
            } else {
                Rgb([255, 255, 255])
            };
        }
        img
    }
}

/// Inner plot rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlotArea {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Position and size of one bar inside its x step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Indices at a stride of `max(1, n / 10)`, plus the last point. The
/// stride is floored, so 11..=19 points label every index and 30 points
/// get eleven labels.
pub fn label_indices(n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let step = (n / MAX_AXIS_LABELS).max(1);
    let mut indices: Vec<usize> = (0..n).step_by(step).collect();
    if indices.last() != Some(&(n - 1)) {
        indices.push(n - 1);
    }
    indices
}

/// Largest value, with zero, negative and NaN maxima treated as 1.
pub fn scale_max(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

pub fn bar_geometry(values: &[f64], plot: &PlotArea) -> Vec<Bar> {
    if values.is_empty() {
        return Vec::new();
    }
    let max = scale_max(values);
    let step_x = plot.width / values.len() as f32;
    let bar_width = step_x * BAR_FILL;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let height = ((v / max).max(0.0) as f32) * plot.height * HEADROOM;
            Bar {
                x: plot.x + i as f32 * step_x + (step_x - bar_width) / 2.0,
                y: plot.bottom() - height,
                width: bar_width,
                height,
            }
        })
        .collect()
}

pub struct ChartRasterizer {
    options: ChartOptions,
}

impl ChartRasterizer {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    pub fn plot_area(&self, width: u32, height: u32) -> Result<PlotArea, ChartError> {
        let left = self.options.left_margin as f32;
        let top = self.options.top_margin as f32;
        let plot = PlotArea {
            x: left,
            y: top,
            width: width as f32 - left - RIGHT_MARGIN,
            height: height as f32 - top - BOTTOM_MARGIN,
        };
        if plot.width <= 0.0 || plot.height <= 0.0 {
            return Err(ChartError::InvalidDimensions { width, height });
        }
        Ok(plot)
    }

    /// Render `series` into a `width` x `height` image.
    ///
    /// An empty series yields the bare plot frame; the caller decides
    /// whether to show it or a text placeholder instead.
    pub fn render(&self, series: &ChartSeries, width: u32, height: u32) -> Result<RasterImage, ChartError> {
        if !series.is_consistent() {
            return Err(ChartError::SeriesMismatch {
                labels: series.labels.len(),
                values: series.values.len(),
            });
        }
        let plot = self.plot_area(width, height)?;
        let mut surface = PixmapSurface::new(width, height)?;
        self.draw(&mut surface, series, &plot);
        debug!(width, height, points = series.values.len(), "chart rasterized");
        Ok(RasterImage {
            width,
            height,
            rgba: surface.data().to_vec(),
            png: surface.encode_png()?,
        })
    }

    /// Draw onto any surface; `render` uses the tiny-skia backend.
    pub fn draw<S: RasterSurface>(&self, surface: &mut S, series: &ChartSeries, plot: &PlotArea) {
        let (w, h) = (surface.width() as f32, surface.height() as f32);
        surface.fill_rect(0.0, 0.0, w, h, Rgba::BACKGROUND);
        surface.fill_rect(plot.x, plot.y, plot.width, plot.height, Rgba::WHITE);
        surface.stroke_rect(plot.x, plot.y, plot.width, plot.height, Rgba::BORDER, 1.0);

        if series.is_empty() {
            return;
        }

        match self.options.kind {
            ChartKind::Bar => {
                for bar in bar_geometry(&series.values, plot) {
                    surface.fill_rect(bar.x, bar.y, bar.width, bar.height, Rgba::SERIES);
                }
            }
            ChartKind::Line => {
                let points: Vec<(f32, f32)> = bar_geometry(&series.values, plot)
                    .iter()
                    .map(|b| (b.x + b.width / 2.0, b.y))
                    .collect();
                surface.polyline(&points, Rgba::SERIES, 2.0);
                for (x, y) in &points {
                    surface.fill_rect(x - 2.0, y - 2.0, 4.0, 4.0, Rgba::SERIES);
                }
            }
        }

        self.draw_axes(surface, series, plot);
    }

    fn draw_axes<S: RasterSurface>(&self, surface: &mut S, series: &ChartSeries, plot: &PlotArea) {
        let n = series.values.len();
        let step_x = plot.width / n as f32;

        // y scale: top tick at the headroom line, zero at the baseline.
        let max = scale_max(&series.values);
        let top_tick = plot.bottom() - plot.height * HEADROOM;
        surface.text(&format_fixed(max, 0), plot.x - 4.0, top_tick - 3.0, 1.0, TextAlign::Right, Rgba::AXIS);
        surface.text("0", plot.x - 4.0, plot.bottom() - 3.0, 1.0, TextAlign::Right, Rgba::AXIS);

        for i in label_indices(n) {
            let label = series.labels.get(i).map(String::as_str).unwrap_or_default();
            let x = plot.x + i as f32 * step_x + step_x / 2.0;
            surface.fill_rect(x, plot.bottom(), 1.0, 4.0, Rgba::AXIS);
            surface.text(
                &truncate(label, AXIS_LABEL_MAX),
                x,
                plot.bottom() + 8.0,
                1.0,
                TextAlign::Center,
                Rgba::AXIS,
            );
        }

        let h = surface.height() as f32;
        let w = surface.width() as f32;
        surface.text(&self.options.x_axis_title, plot.x + plot.width / 2.0, h - 16.0, 1.0, TextAlign::Center, Rgba::TEXT);

        surface.save();
        surface.translate(10.0, plot.y + plot.height / 2.0);
        surface.rotate(-std::f32::consts::FRAC_PI_2);
        surface.text(&self.options.metric_name, 0.0, -3.0, 1.0, TextAlign::Center, Rgba::TEXT);
        surface.restore();

        let title_scale = 2.0;
        let title_y = ((plot.y - glyphs::text_height(title_scale)) / 2.0).max(0.0);
        surface.text(&self.options.title, w / 2.0, title_y, title_scale, TextAlign::Center, Rgba::TEXT);
    }
}
