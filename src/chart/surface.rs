use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use super::glyphs;
use crate::error::ChartError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const BACKGROUND: Rgba = Rgba(248, 249, 250, 255);
    pub const BORDER: Rgba = Rgba(206, 212, 218, 255);
    pub const AXIS: Rgba = Rgba(73, 80, 87, 255);
    pub const TEXT: Rgba = Rgba(33, 37, 41, 255);
    pub const SERIES: Rgba = Rgba(13, 110, 253, 255);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Drawing primitives the chart rasterizer needs. Coordinates are pixels
/// with the origin at the top-left; `rotate`/`translate` compose onto the
/// current transform and `save`/`restore` push and pop it.
pub trait RasterSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);
    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba, line_width: f32);
    fn polyline(&mut self, points: &[(f32, f32)], color: Rgba, line_width: f32);
    fn save(&mut self);
    fn restore(&mut self);
    fn rotate(&mut self, radians: f32);
    fn translate(&mut self, dx: f32, dy: f32);

    /// Draw `text` with the built-in bitmap font; `y` is the top of the
    /// glyph cells. Implemented on top of `fill_rect`, so transforms apply.
    fn text(&mut self, text: &str, x: f32, y: f32, scale: f32, align: TextAlign, color: Rgba) {
        let width = glyphs::text_width(text, scale);
        let start = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let advance = glyphs::GLYPH_ADVANCE as f32 * scale;
        for (i, c) in text.chars().enumerate() {
            let origin = start + i as f32 * advance;
            for (col, row) in glyphs::lit_pixels(c) {
                self.fill_rect(
                    origin + col as f32 * scale,
                    y + row as f32 * scale,
                    scale,
                    scale,
                    color,
                );
            }
        }
    }
}

/// [`RasterSurface`] backed by a `tiny-skia` pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    transform: Transform,
    stack: Vec<Transform>,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, ChartError> {
        let pixmap = Pixmap::new(width, height).ok_or(ChartError::InvalidDimensions { width, height })?;
        Ok(Self {
            pixmap,
            transform: Transform::identity(),
            stack: Vec::new(),
        })
    }

    fn paint(color: Rgba, anti_alias: bool) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.0, color.1, color.2, color.3);
        paint.anti_alias = anti_alias;
        paint
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixmap
            .fill(Color::from_rgba8(color.0, color.1, color.2, color.3));
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, ChartError> {
        self.pixmap
            .encode_png()
            .map_err(|e| ChartError::Encode(e.to_string()))
    }

    /// Premultiplied RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }
}

impl RasterSurface for PixmapSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        // Zero-area rects are silently skipped. Fills are axis-aligned, so
        // they go through the aliased rasterizer: tiny-skia's anti-aliased
        // hairline path asserts on 1px rects at fractional offsets.
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            self.pixmap
                .fill_rect(rect, &Self::paint(color, false), self.transform, None);
        }
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba, line_width: f32) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: line_width,
            line_join: LineJoin::Miter,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &Self::paint(color, true), &stroke, self.transform, None);
    }

    fn polyline(&mut self, points: &[(f32, f32)], color: Rgba, line_width: f32) {
        let mut iter = points.iter();
        let Some(&(x0, y0)) = iter.next() else {
            return;
        };
        let mut pb = PathBuilder::new();
        pb.move_to(x0, y0);
        for &(x, y) in iter {
            pb.line_to(x, y);
        }
        let stroke = Stroke {
            width: line_width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        if let Some(path) = pb.finish() {
            self.pixmap
                .stroke_path(&path, &Self::paint(color, true), &stroke, self.transform, None);
        }
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn rotate(&mut self, radians: f32) {
        self.transform = self.transform.pre_rotate(radians.to_degrees());
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.pre_translate(dx, dy);
    }
}
