//! # ScribbleCraft
//!
//! A hand-lettered page renderer. Rich text (headings, bold, italic,
//! underline, lists) is word-wrapped in a handwriting font onto a textured
//! sheet of paper, one raster surface per page, and exported either as a
//! single stitched PNG or as a paged PDF.
//!
//! Page height is never guessed. Every page is laid out twice with the same
//! traversal: a dry pass that only measures, then a paint pass onto a
//! surface sized from the measurement.
//!
//! ## Architecture
//!
//! ```text
//! Input (ExportRequest JSON)
//!       ↓
//!   [html]     Editor markup to document model
//!       ↓
//!   [text]     Styled-run walker: document to flow items
//!       ↓
//!   [layout]   Greedy line wrapping, measured with [font]
//!       ↓
//!   [texture]  Paper background      [raster]  Glyph painting
//!       ↓
//!   [compose]  Stitch to PNG  /  [pdf] one page per surface
//! ```

pub mod compose;
pub mod error;
pub mod font;
pub mod html;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod preview;
pub mod raster;
pub mod style;
pub mod text;
pub mod texture;

pub use compose::Artifact;
pub use error::{Result, ScribeError};
pub use model::{Document, ExportRequest, RenderConfig};

use font::FontContext;
use raster::Surface;

/// Render every page of a request, in order. Pages that fail are skipped.
pub fn render_request(request: &ExportRequest) -> Vec<Surface> {
    let fonts = FontContext::for_request(&request.fonts, request.config.system_fonts);
    let documents = request.documents();
    compose::render_pages(&documents, &request.config, &fonts)
}

/// Render a request into one tall PNG.
pub fn export_stitched_image(request: &ExportRequest) -> Option<Artifact> {
    let fonts = FontContext::for_request(&request.fonts, request.config.system_fonts);
    compose::export_stitched_image(&request.documents(), &request.config, &fonts)
}

/// Render a request into a PDF with one page per document.
pub fn export_paged_document(request: &ExportRequest) -> Option<Artifact> {
    let fonts = FontContext::for_request(&request.fonts, request.config.system_fonts);
    compose::export_paged_document(&request.documents(), &request.config, &fonts)
}

/// Parse a request from JSON and export it as a stitched PNG.
pub fn render_json(json: &str) -> Result<Option<Artifact>> {
    let request = ExportRequest::from_json(json)?;
    Ok(export_stitched_image(&request))
}
