//! # Raster Surfaces
//!
//! A [`Surface`] is a page-sized pixel buffer with a device-pixel-ratio
//! scale applied to everything drawn on it: callers work in CSS pixels and
//! the backing pixmap is `ceil(width * dpr) x ceil(height * dpr)` pixels.
//!
//! Also home of [`RasterSink`], the layout sink that turns placed words into
//! filled glyph outlines.

use tiny_skia::{
    FillRule, GradientStop, LineCap, LinearGradient, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Point, RadialGradient, Rect, Shader, SpreadMode, Stroke, Transform,
};
use ttf_parser::{GlyphId, OutlineBuilder};

use crate::error::{Result, ScribeError};
use crate::font::{FaceData, FontContext, FontData};
use crate::layout::{LayoutSink, PlacedWord};
use crate::style::Color;
use crate::text::shaping;

/// Horizontal shear applied to synthesized italics.
const SYNTHETIC_ITALIC_SKEW: f32 = 0.2;

/// A gradient stop: offset in 0.0 - 1.0 and colour.
pub type Stop = (f32, Color);

/// A drawable page.
pub struct Surface {
    pixmap: Pixmap,
    width: f64,
    height: f64,
    dpr: f64,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dpr", &self.dpr)
            .field("pixels", &(self.pixmap.width(), self.pixmap.height()))
            .finish()
    }
}

impl Surface {
    /// Allocate a transparent surface of `width x height` CSS pixels.
    pub fn new(width: f64, height: f64, dpr: f64) -> Result<Self> {
        let pw = device_pixels(width, dpr);
        let ph = device_pixels(height, dpr);
        let pixmap = Pixmap::new(pw, ph).ok_or(ScribeError::SurfaceUnavailable {
            width: pw,
            height: ph,
        })?;
        Ok(Self {
            pixmap,
            width,
            height,
            dpr,
        })
    }

    /// Allocate a surface of exactly `pixel_width x pixel_height` device
    /// pixels. The CSS size is derived from `dpr`.
    pub fn from_pixels(pixel_width: u32, pixel_height: u32, dpr: f64) -> Result<Self> {
        let pixmap = Pixmap::new(pixel_width, pixel_height).ok_or(ScribeError::SurfaceUnavailable {
            width: pixel_width,
            height: pixel_height,
        })?;
        Ok(Self {
            pixmap,
            width: pixel_width as f64 / dpr,
            height: pixel_height as f64 / dpr,
            dpr,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// CSS pixels to device pixels.
    pub fn transform(&self) -> Transform {
        Transform::from_scale(self.dpr as f32, self.dpr as f32)
    }

    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Color) {
        self.fill_rect_shader(x, y, w, h, Shader::SolidColor(color.to_skia()));
    }

    /// Fill a rectangle with a vertical or diagonal linear gradient running
    /// from `start` to `end`.
    pub fn fill_rect_linear(
        &mut self,
        rect: (f64, f64, f64, f64),
        start: (f64, f64),
        end: (f64, f64),
        stops: &[Stop],
    ) {
        let Some(shader) = LinearGradient::new(
            point(start),
            point(end),
            gradient_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        let (x, y, w, h) = rect;
        self.fill_rect_shader(x, y, w, h, shader);
    }

    /// Fill a rectangle with a radial gradient centred on `center`.
    pub fn fill_rect_radial(
        &mut self,
        rect: (f64, f64, f64, f64),
        center: (f64, f64),
        radius: f64,
        stops: &[Stop],
    ) {
        let Some(shader) = RadialGradient::new(
            point(center),
            point(center),
            radius as f32,
            gradient_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        let (x, y, w, h) = rect;
        self.fill_rect_shader(x, y, w, h, shader);
    }

    fn fill_rect_shader(&mut self, x: f64, y: f64, w: f64, h: f64, shader: Shader) {
        let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
            return;
        };
        let paint = Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        };
        let ts = self.transform();
        self.pixmap.fill_rect(rect, &paint, ts, None);
    }

    pub fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0 as f32, from.1 as f32);
        pb.line_to(to.0 as f32, to.1 as f32);
        if let Some(path) = pb.finish() {
            self.stroke_path(&path, width, color);
        }
    }

    pub fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, width: f64, color: Color) {
        if let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) {
            self.stroke_path(&PathBuilder::from_rect(rect), width, color);
        }
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Color) {
        if r <= 0.0 {
            return;
        }
        if let Some(path) = PathBuilder::from_circle(cx as f32, cy as f32, r as f32) {
            self.fill_path(&path, color, Transform::identity());
        }
    }

    /// Fill a path given in CSS pixels, after applying `local`.
    pub fn fill_path(&mut self, path: &Path, color: Color, local: Transform) {
        let paint = solid(color);
        let ts = self.transform().pre_concat(local);
        self.pixmap.fill_path(path, &paint, FillRule::Winding, ts, None);
    }

    pub fn stroke_path(&mut self, path: &Path, width: f64, color: Color) {
        let paint = solid(color);
        let stroke = Stroke {
            width: width as f32,
            line_cap: LineCap::Butt,
            ..Stroke::default()
        };
        let ts = self.transform();
        self.pixmap.stroke_path(path, &paint, &stroke, ts, None);
    }

    /// Copy another surface's pixels in at a device-pixel offset.
    pub fn draw_surface(&mut self, other: &Surface, x: i32, y: i32) {
        self.pixmap.draw_pixmap(
            x,
            y,
            other.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Demultiplied RGBA of a device pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    /// Demultiplied RGBA bytes, row-major.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixmap.data().len());
        for p in self.pixmap.pixels() {
            let c = p.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    /// Whether every pixel is fully opaque.
    pub fn is_opaque(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 255)
    }

    /// Lossless PNG encoding of the device pixels.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        use image::ImageEncoder;

        let rgba = self.to_rgba();
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        encoder
            .write_image(
                &rgba,
                self.pixel_width(),
                self.pixel_height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| ScribeError::Encode(format!("png encode failed: {}", e)))?;
        Ok(buf)
    }
}

fn device_pixels(css: f64, dpr: f64) -> u32 {
    let px = (css * dpr).ceil();
    if px.is_finite() && px >= 1.0 {
        px.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

fn point((x, y): (f64, f64)) -> Point {
    Point::from_xy(x as f32, y as f32)
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn gradient_stops(stops: &[Stop]) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|(offset, color)| GradientStop::new(*offset, color.to_skia()))
        .collect()
}

// ── Glyph painting ──────────────────────────────────────────────────

/// Collects a glyph outline (font units, y up) into a path in CSS pixels
/// (y down), positioned at a baseline origin.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
    skew: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32, skew: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
            skew,
        }
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.origin_x + (x + y * self.skew) * self.scale,
            self.origin_y - y * self.scale,
        )
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Paints each placed word onto a surface in a single ink colour.
pub struct RasterSink<'a> {
    surface: &'a mut Surface,
    fonts: &'a FontContext,
    ink: Color,
    /// Words that could not be painted for lack of an outline font.
    pub skipped: usize,
}

impl<'a> RasterSink<'a> {
    pub fn new(surface: &'a mut Surface, fonts: &'a FontContext, ink: Color) -> Self {
        Self {
            surface,
            fonts,
            ink,
            skipped: 0,
        }
    }

    fn draw_glyphs(&mut self, word: &PlacedWord, face: &FaceData, bold: bool, italic: bool) {
        let glyphs = shaping::shape_text(&word.text, face.shaper());
        let outlines = face.outlines();
        let scale = (word.font.size / face.units_per_em as f64) as f32;
        let baseline = (word.y + face.ascent_px(word.font.size)) as f32;
        let skew = if italic { SYNTHETIC_ITALIC_SKEW } else { 0.0 };
        let embolden = word.font.size / 24.0;

        for (glyph_id, gx, gy) in shaping::glyph_origins(&glyphs) {
            let mut builder = GlyphPathBuilder::new(
                word.x as f32 + gx as f32 * scale,
                baseline - gy as f32 * scale,
                scale,
                skew,
            );
            if outlines.outline_glyph(GlyphId(glyph_id), &mut builder).is_none() {
                continue;
            }
            let Some(path) = builder.finish() else {
                continue;
            };
            self.surface.fill_path(&path, self.ink, Transform::identity());
            if bold {
                self.surface.stroke_path(&path, embolden, self.ink);
            }
        }
    }

    fn underline(&mut self, word: &PlacedWord) {
        let y = word.y + word.font.size * 1.1;
        let thickness = (word.font.size / 16.0).max(1.0);
        self.surface
            .stroke_line((word.x, y), (word.x + word.width, y), thickness, self.ink);
    }
}

impl LayoutSink for RasterSink<'_> {
    fn word(&mut self, word: &PlacedWord) {
        let painted = match self.fonts.resolve(&word.font) {
            FontData::Custom {
                face,
                synthetic_bold,
                synthetic_italic,
            } => {
                self.draw_glyphs(word, &face, synthetic_bold, synthetic_italic);
                true
            }
            FontData::Standard(_) => false,
        };
        if !painted {
            self.skipped += 1;
        }
        if word.underline {
            self.underline(word);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FontSpec;

    #[test]
    fn test_surface_scales_by_dpr() {
        let s = Surface::new(100.0, 50.5, 2.0).unwrap();
        assert_eq!((s.pixel_width(), s.pixel_height()), (200, 101));
        assert_eq!((s.width(), s.height()), (100.0, 50.5));
    }

    #[test]
    fn test_from_pixels_keeps_exact_size() {
        let s = Surface::from_pixels(201, 403, 2.0).unwrap();
        assert_eq!((s.pixel_width(), s.pixel_height()), (201, 403));
        assert_eq!((s.width(), s.height()), (100.5, 201.5));
        assert!(Surface::from_pixels(0, 10, 1.0).is_err());
    }

    #[test]
    fn test_zero_sized_surface_is_unavailable() {
        let err = Surface::new(0.0, 10.0, 1.0).unwrap_err();
        assert!(matches!(err, ScribeError::SurfaceUnavailable { width: 0, .. }));
    }

    #[test]
    fn test_fill_rect_in_css_pixels() {
        let mut s = Surface::new(10.0, 10.0, 2.0).unwrap();
        s.fill(Color::WHITE);
        s.fill_rect(0.0, 0.0, 5.0, 5.0, Color::BLACK);
        assert_eq!(s.pixel(4, 4), Some([0, 0, 0, 255]));
        assert_eq!(s.pixel(15, 15), Some([255, 255, 255, 255]));
        assert!(s.is_opaque());
    }

    #[test]
    fn test_draw_surface_offsets() {
        let mut dst = Surface::new(4.0, 8.0, 1.0).unwrap();
        let mut src = Surface::new(4.0, 4.0, 1.0).unwrap();
        src.fill(Color::rgb(1.0, 0.0, 0.0));
        dst.draw_surface(&src, 0, 4);
        assert_eq!(dst.pixel(0, 3), Some([0, 0, 0, 0]));
        assert_eq!(dst.pixel(0, 4), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_encode_png_signature() {
        let mut s = Surface::new(3.0, 2.0, 1.0).unwrap();
        s.fill(Color::WHITE);
        let png = s.encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_underline_painted_without_outline_font() {
        let fonts = FontContext::new();
        let mut s = Surface::new(100.0, 80.0, 1.0).unwrap();
        s.fill(Color::WHITE);
        let word = PlacedWord {
            text: "under".to_string(),
            x: 10.0,
            y: 0.0,
            width: 50.0,
            font: FontSpec::new("Nope", 48.0),
            underline: true,
            marker: false,
        };
        let mut sink = RasterSink::new(&mut s, &fonts, Color::BLACK);
        sink.word(&word);
        assert_eq!(sink.skipped, 1);
        // Underline centred at y + 52.8, 3px thick.
        assert_eq!(s.pixel(30, 52), Some([0, 0, 0, 255]));
        assert_eq!(s.pixel(30, 5), Some([255, 255, 255, 255]));
    }
}
