//! # Page Compositor & Exporter
//!
//! Turns documents into finished artifacts:
//!
//! 1. [`measure_page`] runs the dry layout pass to find how tall a page
//!    must be.
//! 2. [`render_page`] allocates a surface of that height, paints the paper
//!    texture and then paints the text with the same layout traversal.
//! 3. [`export_stitched_image`] stacks every page into one tall PNG;
//!    [`export_paged_document`] writes one PDF page per surface.
//!
//! Pages are independent units of work and are rendered on the rayon pool.
//! A page that fails to render is logged and left out; an export with no
//! surviving pages produces nothing.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Result, ScribeError};
use crate::font::FontContext;
use crate::layout::{LayoutEngine, MeasureSink};
use crate::model::{Document, RenderConfig};
use crate::pdf::{PdfMetadata, PdfWriter};
use crate::raster::{RasterSink, Surface};
use crate::text;
use crate::texture::{self, TextureParams};

pub const STITCHED_FILE_NAME: &str = "scribblecraft.png";
pub const PAGED_FILE_NAME: &str = "scribblecraft.pdf";

/// A finished export, ready to hand to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub file_name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Write the artifact into `dir` under its file name.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        log::info!("wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Dry pass: the height a page of `width` CSS pixels needs for `document`.
pub fn measure_page(document: &Document, config: &RenderConfig, fonts: &FontContext, width: f64) -> f64 {
    LayoutEngine::from_config(config, width).measure(document, fonts)
}

/// Render one page at the configured page width.
///
/// The surface is `max(measured height, min_height)` tall; texture first,
/// text on top.
pub fn render_page(
    document: &Document,
    config: &RenderConfig,
    fonts: &FontContext,
    min_height: f64,
) -> Result<Surface> {
    let width = config.page_width;
    let engine = LayoutEngine::from_config(config, width);
    let items = text::walk(document);
    let measured = engine.required_height(engine.run(&items, fonts, &mut MeasureSink));
    let height = measured
        .max(min_height)
        .max(config.min_page_height);
    log::debug!("page {}x{} css px at dpr {}", width, height, config.dpr());

    let mut surface = Surface::new(width, height, config.dpr())?;
    let params = TextureParams::new(width, height, config.margin, config.font_size_px);
    texture::render(
        &mut surface,
        &params,
        config.background_variant,
        config.display_mode,
    );

    let mut sink = RasterSink::new(&mut surface, fonts, config.ink_color());
    engine.run(&items, fonts, &mut sink);
    if sink.skipped > 0 {
        log::warn!(
            "{} words left unpainted: no outline font for {:?}",
            sink.skipped,
            config.font_family
        );
    }
    Ok(surface)
}

/// Render every page in parallel, keeping input order. Failed pages are
/// logged and dropped.
pub fn render_pages(documents: &[Document], config: &RenderConfig, fonts: &FontContext) -> Vec<Surface> {
    documents
        .par_iter()
        .enumerate()
        .map(|(i, doc)| {
            render_page(doc, config, fonts, 0.0)
                .map_err(|e| log::warn!("page {} failed to render: {}", i + 1, e))
                .ok()
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Stack surfaces top to bottom into one surface as wide as the widest
/// page and as tall as all of them together.
///
/// Sizes are summed in device pixels: each page keeps every row of its own
/// pixmap, even when its CSS height is fractional.
pub fn stitch(pages: &[Surface]) -> Result<Surface> {
    let dpr = pages.first().map(|p| p.dpr()).unwrap_or(1.0);
    let pixel_width = pages.iter().map(|p| p.pixel_width()).max().unwrap_or(0);
    let pixel_height = pages
        .iter()
        .try_fold(0u32, |sum, p| sum.checked_add(p.pixel_height()))
        .unwrap_or(u32::MAX);
    let mut out = Surface::from_pixels(pixel_width, pixel_height, dpr)?;
    let mut offset: u32 = 0;
    for page in pages {
        let y = i32::try_from(offset).map_err(|_| ScribeError::SurfaceUnavailable {
            width: pixel_width,
            height: pixel_height,
        })?;
        out.draw_surface(page, 0, y);
        offset += page.pixel_height();
    }
    Ok(out)
}

/// Render, stitch and PNG-encode. `None` when nothing could be rendered.
pub fn export_stitched_image(
    documents: &[Document],
    config: &RenderConfig,
    fonts: &FontContext,
) -> Option<Artifact> {
    let pages = render_pages(documents, config, fonts);
    stitched_artifact(&pages)
        .map_err(|e| log::warn!("stitched export failed: {}", e))
        .ok()
        .flatten()
}

/// Render and write one PDF page per document. `None` when nothing could
/// be rendered.
pub fn export_paged_document(
    documents: &[Document],
    config: &RenderConfig,
    fonts: &FontContext,
) -> Option<Artifact> {
    let pages = render_pages(documents, config, fonts);
    paged_artifact(&pages)
        .map_err(|e| log::warn!("paged export failed: {}", e))
        .ok()
        .flatten()
}

/// PNG artifact for already-rendered pages.
pub fn stitched_artifact(pages: &[Surface]) -> Result<Option<Artifact>> {
    if pages.is_empty() {
        log::warn!("no pages to export");
        return Ok(None);
    }
    let bytes = stitch(pages)?.encode_png()?;
    Ok(Some(Artifact {
        file_name: STITCHED_FILE_NAME.to_string(),
        mime_type: "image/png".to_string(),
        bytes,
    }))
}

/// PDF artifact for already-rendered pages.
pub fn paged_artifact(pages: &[Surface]) -> Result<Option<Artifact>> {
    if pages.is_empty() {
        log::warn!("no pages to export");
        return Ok(None);
    }
    let metadata = PdfMetadata {
        title: Some("ScribbleCraft".to_string()),
        author: None,
    };
    let bytes = PdfWriter::new().write(pages, &metadata)?;
    Ok(Some(Artifact {
        file_name: PAGED_FILE_NAME.to_string(),
        mime_type: "application/pdf".to_string(),
        bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Inline};
    use crate::style::Color;

    fn solid(w: f64, h: f64, c: Color) -> Surface {
        let mut s = Surface::new(w, h, 1.0).unwrap();
        s.fill(c);
        s
    }

    #[test]
    fn test_stitch_sizes_and_offsets() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        let out = stitch(&[solid(800.0, 500.0, red), solid(600.0, 700.0, blue)]).unwrap();
        assert_eq!((out.pixel_width(), out.pixel_height()), (800, 1200));
        assert_eq!(out.pixel(10, 499), Some([255, 0, 0, 255]));
        assert_eq!(out.pixel(10, 500), Some([0, 0, 255, 255]));
        // Right of the narrower page stays transparent.
        assert_eq!(out.pixel(700, 600), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_stitch_keeps_every_row_of_fractional_pages() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        let a = solid(100.0, 100.5, red);
        let b = solid(100.0, 100.5, blue);
        assert_eq!(a.pixel_height(), 101);
        let out = stitch(&[a, b]).unwrap();
        assert_eq!(out.pixel_height(), 202);
        assert_eq!(out.pixel(50, 100), Some([255, 0, 0, 255]));
        assert_eq!(out.pixel(50, 101), Some([0, 0, 255, 255]));
        assert_eq!(out.pixel(50, 201), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_stitch_at_high_dpr_sums_device_rows() {
        let pages: Vec<Surface> = [43.2, 237.5, 64.8]
            .iter()
            .map(|&h| {
                let mut s = Surface::new(80.0, h, 2.0).unwrap();
                s.fill(Color::WHITE);
                s
            })
            .collect();
        let rows: u32 = pages.iter().map(|p| p.pixel_height()).sum();
        let out = stitch(&pages).unwrap();
        assert_eq!((out.pixel_width(), out.pixel_height()), (160, rows));
        assert_eq!(out.pixel(0, rows - 1), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_render_page_height_is_measured_height() {
        let config = RenderConfig {
            system_fonts: false,
            ..Default::default()
        };
        let fonts = FontContext::new();
        let doc = Document::new(vec![Block::paragraph(vec![Inline::text("hello there")])]);
        let measured = measure_page(&doc, &config, &fonts, config.page_width);
        let page = render_page(&doc, &config, &fonts, 0.0).unwrap();
        assert_eq!(page.height(), measured);
        assert_eq!(page.pixel_width(), 800);
    }

    #[test]
    fn test_min_height_wins_when_larger() {
        let config = RenderConfig::default();
        let fonts = FontContext::new();
        let page = render_page(&Document::default(), &config, &fonts, 1131.2).unwrap();
        assert_eq!(page.height(), 1131.2);
    }

    #[test]
    fn test_empty_exports_are_none() {
        let config = RenderConfig::default();
        let fonts = FontContext::new();
        assert!(export_stitched_image(&[], &config, &fonts).is_none());
        assert!(export_paged_document(&[], &config, &fonts).is_none());
    }

    #[test]
    fn test_save_to_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact {
            file_name: STITCHED_FILE_NAME.to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let path = artifact.save_to(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "scribblecraft.png");
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
