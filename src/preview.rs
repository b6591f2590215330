//! Live preview of a single page.
//!
//! Holds the current document, configuration and container width, and
//! re-renders the whole page whenever any of them changes. The page is never
//! shorter than a portrait sheet of the container's width
//! (`max(500, width * 1.414)`).

use crate::compose;
use crate::font::FontContext;
use crate::model::{Document, RenderConfig};
use crate::raster::Surface;

const MIN_PREVIEW_HEIGHT: f64 = 500.0;
const PORTRAIT_RATIO: f64 = 1.414;

pub struct Preview {
    document: Document,
    config: RenderConfig,
    fonts: FontContext,
    container_width: f64,
    surface: Option<Surface>,
    renders: usize,
}

impl Preview {
    pub fn new(document: Document, config: RenderConfig, fonts: FontContext, container_width: f64) -> Self {
        let mut preview = Self {
            document,
            config,
            fonts,
            container_width,
            surface: None,
            renders: 0,
        };
        preview.redraw();
        preview
    }

    pub fn set_document(&mut self, document: Document) {
        self.document = document;
        self.redraw();
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
        self.redraw();
    }

    /// The container was resized.
    pub fn resize(&mut self, container_width: f64) {
        if container_width == self.container_width {
            return;
        }
        self.container_width = container_width;
        self.redraw();
    }

    /// The most recent render, if it succeeded.
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Number of full re-renders so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn min_height(&self) -> f64 {
        MIN_PREVIEW_HEIGHT.max(self.container_width * PORTRAIT_RATIO)
    }

    fn redraw(&mut self) {
        let config = RenderConfig {
            page_width: self.container_width,
            ..self.config.clone()
        };
        self.renders += 1;
        self.surface = compose::render_page(&self.document, &config, &self.fonts, self.min_height())
            .map_err(|e| log::warn!("preview render failed: {}", e))
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Inline};

    fn preview(width: f64) -> Preview {
        let doc = Document::new(vec![Block::paragraph(vec![Inline::text("draft")])]);
        Preview::new(doc, RenderConfig::default(), FontContext::new(), width)
    }

    #[test]
    fn test_minimum_height_is_portrait() {
        let p = preview(600.0);
        let surface = p.surface().unwrap();
        assert!((surface.height() - 848.4).abs() < 1e-9);
        assert_eq!(surface.width(), 600.0);
    }

    #[test]
    fn test_small_container_uses_floor() {
        let p = preview(200.0);
        assert_eq!(p.min_height(), 500.0);
    }

    #[test]
    fn test_changes_trigger_redraw() {
        let mut p = preview(600.0);
        assert_eq!(p.render_count(), 1);
        p.resize(700.0);
        assert_eq!(p.surface().unwrap().width(), 700.0);
        p.resize(700.0);
        assert_eq!(p.render_count(), 2);
        p.set_document(Document::default());
        p.set_config(RenderConfig {
            font_size_px: 20.0,
            ..Default::default()
        });
        assert_eq!(p.render_count(), 4);
    }

    #[test]
    fn test_zero_width_leaves_no_surface() {
        let mut p = preview(600.0);
        p.resize(0.0);
        assert!(p.surface().is_none());
    }
}
