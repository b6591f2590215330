//! # Document Model
//!
//! The input representation for the engine. A document is a flat list of
//! blocks (paragraphs, headings, lists) whose leaves are inline text with
//! bold/italic/underline spans. This is what the rich-text editor produces,
//! after [`crate::html::parse_fragment`] has turned its markup into types.
//!
//! The export request that travels with the pages lives here too: it is the
//! whole contract with the host UI, so it is (de)serializable as camelCase
//! JSON the same way the host sends it.

use serde::{Deserialize, Serialize};

use crate::style::{Color, InlineStyle};
use crate::texture::{DisplayMode, PaperVariant};

/// Default ink on the dark palettes.
pub const DARK_MODE_INK: &str = "#e8e6e3";

/// A rich-text document for a single page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A block-level node. Blocks always start a new line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph { content: Vec<Inline> },
    Heading { level: u8, content: Vec<Inline> },
    List { ordered: bool, items: Vec<ListItem> },
}

impl Block {
    pub fn paragraph(content: Vec<Inline>) -> Self {
        Block::Paragraph { content }
    }

    /// Headings are clamped to levels 1-3.
    pub fn heading(level: u8, content: Vec<Inline>) -> Self {
        Block::Heading {
            level: level.clamp(1, 3),
            content,
        }
    }

    pub fn list(ordered: bool, items: Vec<ListItem>) -> Self {
        Block::List { ordered, items }
    }
}

/// One item of a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub children: Vec<ItemNode>,
}

impl ListItem {
    /// An item holding only inline content.
    pub fn text(content: Vec<Inline>) -> Self {
        Self {
            children: content.into_iter().map(ItemNode::Inline).collect(),
        }
    }
}

/// A list item may mix inline content with nested blocks, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemNode {
    Inline(Inline),
    Block(Block),
}

/// An inline node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text { text: String },
    Styled { style: InlineStyle, children: Vec<Inline> },
    LineBreak,
}

impl Inline {
    pub fn text(text: &str) -> Self {
        Inline::Text {
            text: text.to_string(),
        }
    }

    pub fn styled(style: InlineStyle, children: Vec<Inline>) -> Self {
        Inline::Styled { style, children }
    }
}

/// A custom font to register with the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// Font family name as used in `fontFamily` (e.g. "Caveat").
    pub family: String,
    /// Base64-encoded font data, or a data URI (e.g. "data:font/ttf;base64,...").
    pub src: String,
    /// Font weight (100-900). Defaults to 400.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Whether this is an italic variant.
    #[serde(default)]
    pub italic: bool,
}

fn default_weight() -> u32 {
    400
}

/// Rendering settings shared by every page of an export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// CSS-style family list, e.g. `'Caveat', cursive`.
    pub font_family: String,
    /// Base font size in CSS pixels.
    pub font_size_px: f64,
    /// Ink colour. When unset, black on light papers and a pale grey on
    /// the dark palettes.
    pub ink_color_hex: Option<String>,
    pub background_variant: PaperVariant,
    pub display_mode: DisplayMode,
    /// Page width in CSS pixels.
    pub page_width: f64,
    pub device_pixel_ratio: f64,
    /// Uniform page margin in CSS pixels.
    pub margin: f64,
    /// Pages are never shorter than this, in CSS pixels.
    pub min_page_height: f64,
    /// Look up fonts in the platform font directories.
    pub system_fonts: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: "'Shadows Into Light', cursive".to_string(),
            font_size_px: 42.0,
            ink_color_hex: None,
            background_variant: PaperVariant::WhitePaper,
            display_mode: DisplayMode::Light,
            page_width: 800.0,
            device_pixel_ratio: 1.0,
            margin: 40.0,
            min_page_height: 0.0,
            system_fonts: true,
        }
    }
}

impl RenderConfig {
    /// The ink actually used on the page. Inherently dark papers override
    /// the selected ink with white.
    pub fn ink_color(&self) -> Color {
        if let Some(forced) = self.background_variant.forced_ink() {
            return forced;
        }
        match &self.ink_color_hex {
            Some(hex) => Color::hex(hex),
            None if self.display_mode == DisplayMode::Dark
                && self.background_variant.is_mode_aware() =>
            {
                Color::hex(DARK_MODE_INK)
            }
            None => Color::BLACK,
        }
    }

    /// DPR used for surfaces; non-positive or non-finite values mean 1.
    pub fn dpr(&self) -> f64 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }
}

/// Everything the host sends for an export: the pre-split pages plus the
/// shared rendering configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// One rich-text (HTML subset) fragment per page, in order.
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(flatten)]
    pub config: RenderConfig,
    /// Custom fonts to register before layout.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
}

impl ExportRequest {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse every page fragment into a document.
    pub fn documents(&self) -> Vec<Document> {
        self.pages
            .iter()
            .map(|page| crate::html::parse_fragment(page))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_json_uses_defaults() {
        let req = ExportRequest::from_json(
            r##"{
                "pages": ["<p>Hello</p>"],
                "fontFamily": "'Caveat', cursive",
                "fontSizePx": 24,
                "inkColorHex": "#0000FF",
                "backgroundVariant": "graph-paper",
                "displayMode": "dark"
            }"##,
        )
        .unwrap();
        assert_eq!(req.pages.len(), 1);
        assert_eq!(req.config.font_size_px, 24.0);
        assert_eq!(req.config.background_variant, PaperVariant::GraphPaper);
        assert_eq!(req.config.display_mode, DisplayMode::Dark);
        assert_eq!(req.config.margin, 40.0);
        assert_eq!(req.config.font_family, "'Caveat', cursive");
        assert!(req.fonts.is_empty());
    }

    #[test]
    fn test_unknown_variant_falls_back_to_white_paper() {
        let req =
            ExportRequest::from_json(r#"{"pages": [], "backgroundVariant": "napkin"}"#).unwrap();
        assert_eq!(req.config.background_variant, PaperVariant::WhitePaper);
    }

    #[test]
    fn test_dark_paper_forces_white_ink() {
        let config = RenderConfig {
            ink_color_hex: Some("#FF0000".to_string()),
            background_variant: PaperVariant::Blackboard,
            ..Default::default()
        };
        assert_eq!(config.ink_color(), Color::WHITE);

        let config = RenderConfig {
            ink_color_hex: Some("#FF0000".to_string()),
            ..Default::default()
        };
        assert_eq!(config.ink_color(), Color::rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_bad_json_is_a_parse_error() {
        let err = ExportRequest::from_json("{\"pages\": [").unwrap_err();
        assert!(matches!(err, crate::error::ScribeError::Parse { .. }));
    }

    #[test]
    fn test_unset_ink_follows_display_mode() {
        let dark = RenderConfig {
            background_variant: PaperVariant::NotebookPaper,
            display_mode: DisplayMode::Dark,
            ..Default::default()
        };
        assert_eq!(dark.ink_color(), Color::hex(DARK_MODE_INK));

        // Fixed materials keep their light palette, so black ink stays.
        let parchment = RenderConfig {
            background_variant: PaperVariant::Parchment,
            ..dark.clone()
        };
        assert_eq!(parchment.ink_color(), Color::BLACK);

        let chosen = RenderConfig {
            ink_color_hex: Some("#112233".to_string()),
            ..dark
        };
        assert_eq!(chosen.ink_color(), Color::hex("#112233"));
        assert_eq!(RenderConfig::default().ink_color(), Color::BLACK);
    }
}
